//! API endpoints.

mod auth;
pub mod health;
mod notifications;
mod options;
mod polls;

use axum::Router;

use crate::middleware::AppState;

/// Create the `/api` router.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/polls", polls::router())
        .nest("/options", options::router())
        .nest("/notifications", notifications::router())
}
