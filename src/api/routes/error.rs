//! API error handling utilities.
//!
//! Every failure maps to an HTTP status plus a structured `{code, data?}`
//! body; stack traces never leak to clients.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::models::ErrorCode;
use crate::services::ServiceError;

/// API error response.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: ErrorCode,
    pub data: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(status: StatusCode, code: ErrorCode) -> Self {
        Self {
            status,
            code,
            data: None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = json!({ "code": self.code });
        if let Some(data) = self.data {
            body["data"] = data;
        }
        (self.status, axum::Json(body)).into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::UserNotFound => {
                ApiError::new(StatusCode::NOT_FOUND, ErrorCode::UserNotFound)
            }
            ServiceError::HomeNotFound => {
                ApiError::new(StatusCode::NOT_FOUND, ErrorCode::HomeNotFound)
            }
            ServiceError::AutomationNotFound => {
                ApiError::new(StatusCode::NOT_FOUND, ErrorCode::AutomationNotFound)
            }
            ServiceError::NotOwner => {
                ApiError::new(StatusCode::UNAUTHORIZED, ErrorCode::NotOwner)
            }
            ServiceError::InvalidReferences(failures) => {
                // The complete batch is reported so the client can correct
                // every reference in one pass.
                let code = failures
                    .first()
                    .map(|f| f.code)
                    .unwrap_or(ErrorCode::EntityNotFound);
                ApiError {
                    status: StatusCode::NOT_FOUND,
                    code,
                    data: serde_json::to_value(failures).ok(),
                }
            }
            ServiceError::NothingChanged => {
                ApiError::new(StatusCode::BAD_REQUEST, ErrorCode::NothingChanged)
            }
            ServiceError::Engine(_) => {
                ApiError::new(StatusCode::BAD_REQUEST, ErrorCode::EngineFailed)
            }
            ServiceError::Storage(_) => ApiError::new(StatusCode::BAD_REQUEST, ErrorCode::Unknown),
        }
    }
}
