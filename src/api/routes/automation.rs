//! Automation routes: the `/home/v1/automation` surface.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

use super::app_state::AppState;
use super::error::ApiError;
use crate::models::requests::{CreateAutomationRequest, UpdateAutomationRequest};
use crate::models::ErrorCode;
use crate::services::ListParams;

/// Create the automation router.
pub fn automation_router() -> Router<AppState> {
    Router::new().route(
        "/automation",
        get(list_automations)
            .post(create_automation)
            .put(update_automation)
            .delete(delete_automation),
    )
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListAutomationsQuery {
    pub home_id: String,
    pub user_id: String,
    pub app_code: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub input_id: Option<String>,
    #[serde(default)]
    pub output_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteAutomationQuery {
    pub id: String,
    pub home_id: String,
    pub user_id: String,
    pub app_code: String,
}

/// GET /home/v1/automation - List automations with resolved references.
///
/// Any failure surfaces as 400; the success body is the denormalized array.
async fn list_automations(
    State(state): State<AppState>,
    Query(query): Query<ListAutomationsQuery>,
) -> Result<Json<Value>, ApiError> {
    let service = state.automation_service();
    let params = ListParams {
        home_id: query.home_id,
        user_id: query.user_id,
        app_code: query.app_code,
        id: query.id,
        name: query.name,
        input_id: query.input_id,
        output_id: query.output_id,
    };

    match service.list(params).await {
        Ok(views) => Ok(Json(serde_json::to_value(views).unwrap_or(json!([])))),
        Err(e) => {
            warn!(error = %e, "automation list failed");
            let mut err = ApiError::from(e);
            err.status = StatusCode::BAD_REQUEST;
            Err(err)
        }
    }
}

/// POST /home/v1/automation - Create an automation.
async fn create_automation(
    State(state): State<AppState>,
    Json(request): Json<CreateAutomationRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let service = state.automation_service();
    let view = service.create(request).await?;
    Ok((
        StatusCode::CREATED,
        Json(serde_json::to_value(&view).unwrap_or(json!({}))),
    ))
}

/// PUT /home/v1/automation - Update an automation.
async fn update_automation(
    State(state): State<AppState>,
    Json(request): Json<UpdateAutomationRequest>,
) -> Result<Json<Value>, ApiError> {
    let service = state.automation_service();
    let view = service.update(request).await?;
    Ok(Json(serde_json::to_value(&view).unwrap_or(json!({}))))
}

/// DELETE /home/v1/automation - Delete an automation.
async fn delete_automation(
    State(state): State<AppState>,
    Query(query): Query<DeleteAutomationQuery>,
) -> Result<Json<Value>, ApiError> {
    let service = state.automation_service();
    service
        .delete(&query.id, &query.user_id, &query.home_id, &query.app_code)
        .await?;
    Ok(Json(json!({ "code": ErrorCode::Success })))
}
