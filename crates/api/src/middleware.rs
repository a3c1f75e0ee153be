//! API middleware.

#![allow(missing_docs)]

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::Response,
};
use sea_orm::DatabaseConnection;
use votebox_core::{NotificationService, PollService, TokenService, UserService, VoteService};
use votebox_db::repositories::{NotificationRepository, UserRepository};

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub user_service: UserService,
    pub poll_service: PollService,
    pub vote_service: VoteService,
    pub notification_service: NotificationService,
}

impl AppState {
    /// Wire every service onto one connection pool.
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>, tokens: TokenService) -> Self {
        Self {
            user_service: UserService::new(UserRepository::new(Arc::clone(&db)), tokens),
            poll_service: PollService::new(Arc::clone(&db)),
            vote_service: VoteService::new(Arc::clone(&db)),
            notification_service: NotificationService::new(NotificationRepository::new(db)),
        }
    }
}

/// Authentication middleware.
///
/// Resolves a bearer token to its user and stores the user in the request
/// extensions. Requests without a valid token pass through unauthenticated;
/// endpoints that need a user reject them via [`crate::extractors::AuthUser`].
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(auth_header) = req.headers().get(header::AUTHORIZATION)
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        match state.user_service.authenticate(token.trim()).await {
            Ok(user) => {
                req.extensions_mut().insert(user);
            }
            Err(e) if e.is_server_error() => {
                tracing::error!(error = %e, "Failed to authenticate request");
            }
            Err(_) => {}
        }
    }

    next.run(req).await
}
