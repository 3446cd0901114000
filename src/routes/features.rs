use crate::error::{AppError, AppResult};
use crate::events::HubEvent;
use crate::models::{CreateFeatureRequest, FeatureRequest, FeatureStatus, UserType, VoteFeatureRequest};
use crate::state::AppState;
use rocket::serde::json::Json;
use rocket::{delete, get, post, put, State};

fn publish_update(state: &AppState, feature_id: &str) -> AppResult<()> {
    if let Some(feature) = state.store.find_feature(feature_id)? {
        state.events.publish(HubEvent::FeatureUpdate(feature));
    }
    Ok(())
}

#[get("/api/features")]
pub fn list_features(state: &State<AppState>) -> Result<Json<Vec<FeatureRequest>>, AppError> {
    Ok(Json(state.store.list_features()?))
}

#[post("/api/features", format = "json", data = "<body>")]
pub fn create_feature(
    state: &State<AppState>,
    body: Json<CreateFeatureRequest>,
) -> Result<Json<FeatureRequest>, AppError> {
    let feature = state
        .store
        .create_feature_request(&body.title, &body.description, &body.created_by)?;
    state.events.publish(HubEvent::FeatureUpdate(feature.clone()));
    Ok(Json(feature))
}

#[post("/api/features/<feature_id>/vote", format = "json", data = "<body>")]
pub fn vote_feature(
    state: &State<AppState>,
    feature_id: &str,
    body: Json<VoteFeatureRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    if body.vote != 1 && body.vote != -1 {
        return Err(AppError::Validation("vote must be +1 or -1".to_string()));
    }
    let user_id = match state.store.find_agent_by_name(&body.user_name)? {
        Some(agent) => agent.user_id,
        None => {
            state
                .store
                .find_or_create_user(&body.user_name, UserType::Human)?
                .id
        }
    };
    state.store.vote_feature(feature_id, &user_id, body.vote)?;
    publish_update(state, feature_id)?;
    Ok(Json(serde_json::json!({"status": "ok"})))
}

#[derive(serde::Deserialize)]
pub struct UpdateStatusBody {
    pub status: String,
    #[serde(default)]
    pub reason: Option<String>,
}

#[put("/api/features/<feature_id>/status", format = "json", data = "<body>")]
pub fn update_feature_status(
    state: &State<AppState>,
    feature_id: &str,
    body: Json<UpdateStatusBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    let status = FeatureStatus::parse(&body.status)
        .ok_or_else(|| AppError::Validation(format!("unknown status {}", body.status)))?;
    state
        .store
        .set_feature_status(feature_id, status, body.reason.as_deref())?;
    publish_update(state, feature_id)?;
    Ok(Json(serde_json::json!({"status": "ok"})))
}

#[delete("/api/features/<feature_id>")]
pub fn delete_feature(state: &State<AppState>, feature_id: &str) -> Result<Json<serde_json::Value>, AppError> {
    state.store.delete_feature(feature_id)?;
    Ok(Json(serde_json::json!({"deleted": true})))
}
