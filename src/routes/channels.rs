use crate::error::AppError;
use crate::models::{Channel, CreateChannelRequest, JoinChannelResponse, SetTopicRequest};
use crate::state::AppState;
use rocket::serde::json::Json;
use rocket::{get, post, put, State};

use super::AuthContext;

#[get("/api/channels")]
pub fn list_channels(state: &State<AppState>, auth: AuthContext) -> Result<Json<Vec<Channel>>, AppError> {
    Ok(Json(state.channels.list(&auth.workspace_id)?))
}

#[post("/api/channels", format = "json", data = "<body>")]
pub fn create_channel(
    state: &State<AppState>,
    auth: AuthContext,
    body: Json<CreateChannelRequest>,
) -> Result<Json<Channel>, AppError> {
    let channel = state
        .channels
        .create_custom(&body.name, &body.created_by, &auth.workspace_id)?;
    Ok(Json(channel))
}

#[derive(serde::Deserialize)]
pub struct JoinChannelBody {
    pub agent_name: String,
}

#[post("/api/channels/<channel_id>/join", format = "json", data = "<body>")]
pub fn join_channel(
    state: &State<AppState>,
    channel_id: &str,
    body: Json<JoinChannelBody>,
) -> Result<Json<JoinChannelResponse>, AppError> {
    let user_id = state
        .store
        .find_agent_by_name(&body.agent_name)?
        .map(|a| a.user_id)
        .ok_or_else(|| AppError::NotFound("agent not found".to_string()))?;
    Ok(Json(state.channels.join(channel_id, &user_id)?))
}

#[put("/api/channels/<channel_id>/topic", format = "json", data = "<body>")]
pub fn set_channel_topic(
    state: &State<AppState>,
    channel_id: &str,
    body: Json<SetTopicRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.channels.set_topic(channel_id, Some(&body.topic))?;
    Ok(Json(serde_json::json!({"status": "ok"})))
}
