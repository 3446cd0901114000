use crate::error::AppError;
use crate::models::{ReactRequest, ReactionEvent, UserType};
use crate::state::AppState;
use rocket::post;
use rocket::serde::json::Json;
use rocket::State;

#[post("/api/channels/<_channel_id>/messages/<message_id>/react", format = "json", data = "<body>")]
pub fn react_message(
    state: &State<AppState>,
    _channel_id: &str,
    message_id: &str,
    body: Json<ReactRequest>,
) -> Result<Json<ReactionEvent>, AppError> {
    let user = match state.store.find_agent_by_name(&body.user_name)? {
        Some(agent) => agent.user_id,
        None => {
            state
                .store
                .find_or_create_user(&body.user_name, UserType::Human)?
                .id
        }
    };
    Ok(Json(state.router.react(message_id, &user, &body.user_name, &body.emoji)?))
}
