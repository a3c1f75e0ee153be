//! HTTP API layer for votebox.
//!
//! - **Endpoints**: auth, polls, votes, voters, notifications
//! - **Extractors**: authenticated user, JSON bodies and path ids that
//!   reject with the standard `{"error": ...}` body
//! - **Middleware**: bearer token authentication
//!
//! Built on Axum 0.8.

pub mod endpoints;
pub mod extractors;
pub mod middleware;

use axum::{Router, middleware::from_fn_with_state};

pub use endpoints::router;
pub use middleware::AppState;

/// Build the complete application: `/api` routes behind authentication plus
/// the unauthenticated health check.
pub fn app(state: AppState) -> Router {
    Router::new()
        .nest("/api", router())
        .merge(endpoints::health::router())
        .layer(from_fn_with_state(state.clone(), middleware::auth_middleware))
        .with_state(state)
}
