use crate::error::AppError;
use crate::models::Message;
use crate::state::AppState;
use rocket::put;
use rocket::serde::json::Json;
use rocket::{get, State};

#[put("/api/channels/<_channel_id>/messages/<message_id>/pin?<pinned>&<pinned_by>")]
pub fn set_pin(
    state: &State<AppState>,
    _channel_id: &str,
    message_id: &str,
    pinned: bool,
    pinned_by: Option<&str>,
) -> Result<Json<Message>, AppError> {
    Ok(Json(state.router.set_pinned(message_id, pinned, pinned_by)?))
}

#[get("/api/channels/<channel_id>/pins")]
pub fn list_pins(state: &State<AppState>, channel_id: &str) -> Result<Json<Vec<Message>>, AppError> {
    Ok(Json(state.router.list_pinned(channel_id)?))
}
