//! Home routes: the delete-with-cascade surface.
//!
//! Deleting a home removes every automation under it first; one unresolved
//! engine delete aborts the whole operation.

use axum::{
    extract::{Query, State},
    response::Json,
    routing::delete,
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::app_state::AppState;
use super::error::ApiError;
use crate::models::ErrorCode;

/// Create the home router.
pub fn home_router() -> Router<AppState> {
    Router::new().route("/home", delete(delete_home))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteHomeQuery {
    pub id: String,
    pub user_id: String,
    pub app_code: String,
}

/// DELETE /home/v1/home - Delete a home the caller owns, cascading through
/// its automations.
async fn delete_home(
    State(state): State<AppState>,
    Query(query): Query<DeleteHomeQuery>,
) -> Result<Json<Value>, ApiError> {
    let service = state.automation_service();
    service
        .delete_home(&query.id, &query.user_id, &query.app_code)
        .await?;
    Ok(Json(json!({ "code": ErrorCode::Success })))
}
