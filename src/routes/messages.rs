use crate::error::AppError;
use crate::models::{EditMessageRequest, Message, MessagesQuery, SendMessageRequest, UserType};
use crate::state::AppState;
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{delete, get, post, put, State};

use super::ClientIp;

#[post("/api/channels/<channel_id>/messages", format = "json", data = "<body>")]
pub fn send_message(
    state: &State<AppState>,
    ip: ClientIp,
    channel_id: &str,
    body: Json<SendMessageRequest>,
) -> Result<(Status, Json<Message>), AppError> {
    if !state
        .rate_limiter
        .check(&format!("send_message:{}", ip.0), state.rate_limit_config.messages_max, state.rate_limit_config.messages_window_secs)
    {
        return Err(AppError::Validation("rate limited: too many messages".to_string()));
    }

    let sender_name = body.sender_name.trim();
    if sender_name.is_empty() || sender_name.len() > 100 {
        return Err(AppError::Validation("sender_name must be 1-100 characters".to_string()));
    }
    let content = body.content.trim();
    if content.is_empty() || content.len() > 10_000 {
        return Err(AppError::Validation("content must be 1-10000 characters".to_string()));
    }

    let channel = state
        .store
        .find_channel_by_id(channel_id)?
        .ok_or_else(|| AppError::NotFound("channel not found".to_string()))?;
    let sender_id = match state.store.find_agent_by_name(sender_name)? {
        Some(agent) => agent.user_id,
        None => state.store.find_or_create_user(sender_name, UserType::Human)?.id,
    };

    let message = state.router.send(
        &channel.id,
        &channel.name,
        &sender_id,
        sender_name,
        content,
        body.mentions.clone().unwrap_or_default(),
        body.reply_to.as_deref(),
    )?;
    Ok((Status::Created, Json(message)))
}

#[get("/api/channels/<channel_id>/messages?<limit>&<before>")]
pub fn get_messages(
    state: &State<AppState>,
    channel_id: &str,
    limit: Option<i64>,
    before: Option<&str>,
) -> Result<Json<Vec<Message>>, AppError> {
    let limit = limit.unwrap_or(50).clamp(1, 200);
    Ok(Json(state.router.channel_messages(channel_id, limit, before)?))
}

#[put("/api/channels/<_channel_id>/messages/<message_id>", format = "json", data = "<body>")]
pub fn edit_message(
    state: &State<AppState>,
    _channel_id: &str,
    message_id: &str,
    body: Json<EditMessageRequest>,
) -> Result<Json<Message>, AppError> {
    Ok(Json(state.router.edit(message_id, &body.sender_name, &body.content)?))
}

#[delete("/api/channels/<_channel_id>/messages/<message_id>?<sender_name>")]
pub fn delete_message(
    state: &State<AppState>,
    _channel_id: &str,
    message_id: &str,
    sender_name: &str,
) -> Result<Json<serde_json::Value>, AppError> {
    state.router.delete(message_id, sender_name)?;
    Ok(Json(serde_json::json!({"deleted": true})))
}
