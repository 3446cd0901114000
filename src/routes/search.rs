use crate::error::AppError;
use crate::models::SearchResponse;
use crate::state::AppState;
use rocket::get;
use rocket::serde::json::Json;
use rocket::State;

#[get("/api/search?<q>&<channel>&<sender>&<after>&<before>&<limit>")]
#[allow(clippy::too_many_arguments)]
pub fn search_messages(
    state: &State<AppState>,
    q: &str,
    channel: Option<&str>,
    sender: Option<&str>,
    after: Option<&str>,
    before: Option<&str>,
    limit: Option<i64>,
) -> Result<Json<SearchResponse>, AppError> {
    if q.trim().is_empty() {
        return Err(AppError::Validation("q is required".to_string()));
    }
    let channel_id = match channel {
        Some(name) => state
            .channels
            .find_by_name(crate::store::DEFAULT_WORKSPACE_ID, name)?
            .map(|c| c.id),
        None => None,
    };
    let results = state
        .router
        .search(q, channel_id.as_deref(), sender, after, before, limit)?;
    Ok(Json(SearchResponse {
        query: q.to_string(),
        count: results.len(),
        results,
    }))
}
