//! API routes module - organizes all route handlers.

pub mod app_state;
pub mod automation;
pub mod error;
pub mod home;

use axum::Router;

pub use app_state::AppState;
pub use error::ApiError;

/// Create the main API router combining all route modules.
///
/// State is applied by callers (e.g. TestServer); for production use, call
/// `.with_state(app_state)` after creating the router.
pub fn create_api_router() -> Router<AppState> {
    let v1 = Router::new()
        .merge(automation::automation_router())
        .merge(home::home_router());
    Router::new().nest("/home/v1", v1)
}

/// Create the application state from environment configuration.
pub async fn create_app_state() -> Result<AppState, crate::storage::StorageError> {
    AppState::from_env().await
}
