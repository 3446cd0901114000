use crate::error::AppError;
use crate::models::{Agent, AgentView, RegisterRequest, RegisterResponse, UpdateProfileRequest};
use crate::state::AppState;
use rocket::serde::json::Json;
use rocket::{get, post, put, State};

use super::AuthContext;

#[derive(serde::Deserialize)]
pub struct DisconnectBody {
    pub agent_name: String,
}

#[derive(serde::Deserialize)]
pub struct HeartbeatBody {
    pub agent_name: String,
}

#[post("/api/agents/register", format = "json", data = "<body>")]
pub fn register_agent(
    state: &State<AppState>,
    body: Json<RegisterRequest>,
) -> Result<Json<RegisterResponse>, AppError> {
    Ok(Json(state.registry.register_or_connect(&body)?))
}

#[post("/api/agents/disconnect", format = "json", data = "<body>")]
pub fn disconnect_agent(
    state: &State<AppState>,
    body: Json<DisconnectBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.registry.disconnect(&body.agent_name)?;
    Ok(Json(serde_json::json!({"status": "disconnected"})))
}

#[post("/api/agents/heartbeat", format = "json", data = "<body>")]
pub fn heartbeat_agent(
    state: &State<AppState>,
    body: Json<HeartbeatBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.registry.heartbeat(&body.agent_name)?;
    Ok(Json(serde_json::json!({"status": "ok"})))
}

#[put("/api/agents/<agent_name>/profile", format = "json", data = "<body>")]
pub fn update_agent_profile(
    state: &State<AppState>,
    agent_name: &str,
    body: Json<UpdateProfileRequest>,
) -> Result<Json<Agent>, AppError> {
    Ok(Json(state.registry.update_profile(
        agent_name,
        body.description.as_deref(),
        body.personality.as_deref(),
        body.current_task.as_deref(),
        body.gender.as_deref(),
    )?))
}

#[get("/api/agents")]
pub fn agent_list(state: &State<AppState>, auth: AuthContext) -> Result<Json<Vec<AgentView>>, AppError> {
    let agents = state.registry.list(&auth.workspace_id)?;
    let views = agents
        .into_iter()
        .map(|a| {
            let is_ghost = state.registry.ghost_cache.is_ghost(&a.agent_name);
            let invocable = a.is_invocable();
            AgentView {
                agent: a,
                is_ghost,
                invocable,
            }
        })
        .collect();
    Ok(Json(views))
}
