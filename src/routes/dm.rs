use crate::error::AppError;
use crate::models::{Channel, CreateDmRequest, UserType};
use crate::state::AppState;
use rocket::post;
use rocket::serde::json::Json;
use rocket::State;

use super::AuthContext;

/// Ensures the `#dm-{agentName}` channel exists and both parties are members
/// (spec §4.4 DM provisioning). The human side is resolved/created from
/// `created_by`; the agent must already be registered.
#[post("/api/dm", format = "json", data = "<body>")]
pub fn create_dm(
    state: &State<AppState>,
    auth: AuthContext,
    body: Json<CreateDmRequest>,
) -> Result<Json<Channel>, AppError> {
    let agent = state
        .store
        .find_agent_by_name(&body.agent_name)?
        .ok_or_else(|| AppError::NotFound(format!("agent {} not found", body.agent_name)))?;

    let human = state
        .store
        .find_or_create_user(&body.created_by, UserType::Human)?;

    let channel = state.channels.ensure_dm_channel(
        &body.agent_name,
        &human.id,
        &agent.user_id,
        &body.created_by,
        &auth.workspace_id,
    )?;
    Ok(Json(channel))
}
