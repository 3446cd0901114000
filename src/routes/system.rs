use rocket::serde::json::Json;
use rocket::{get, State};

use crate::state::AppState;
use crate::store::DEFAULT_WORKSPACE_ID;

#[get("/api/health")]
pub fn health(state: &State<AppState>) -> Json<serde_json::Value> {
    let agent_count = state
        .registry
        .list(DEFAULT_WORKSPACE_ID)
        .map(|a| a.len())
        .unwrap_or(0);
    let channel_count = state
        .channels
        .list(DEFAULT_WORKSPACE_ID)
        .map(|c| c.len())
        .unwrap_or(0);
    Json(serde_json::json!({
        "status": "ok",
        "service": "agent-hub",
        "version": env!("CARGO_PKG_VERSION"),
        "agents": agent_count,
        "channels": channel_count,
    }))
}

#[rocket::catch(429)]
pub fn too_many_requests() -> Json<serde_json::Value> {
    Json(serde_json::json!({"error": "Too many requests"}))
}

#[rocket::catch(404)]
pub fn not_found() -> Json<serde_json::Value> {
    Json(serde_json::json!({"error": "Not found"}))
}
