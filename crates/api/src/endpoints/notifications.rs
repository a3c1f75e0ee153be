//! Notification endpoints.

use axum::{
    Json, Router,
    extract::State,
    routing::{get, put},
};
use serde::Serialize;
use votebox_common::AppResult;
use votebox_core::NotificationView;

use crate::{
    extractors::{ApiPath, AuthUser},
    middleware::AppState,
};

/// Unread count response.
#[derive(Debug, Serialize)]
pub struct UnreadCountResponse {
    pub count: u64,
}

/// Acknowledgement response.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// Create the notifications router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/unread-count", get(unread_count))
        .route("/read-all", put(mark_all_read))
        .route("/{id}/read", put(mark_read))
}

async fn list(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> AppResult<Json<Vec<NotificationView>>> {
    Ok(Json(state.notification_service.list(user.id).await?))
}

async fn unread_count(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> AppResult<Json<UnreadCountResponse>> {
    let count = state.notification_service.unread_count(user.id).await?;
    Ok(Json(UnreadCountResponse { count }))
}

async fn mark_read(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiPath(id): ApiPath<i32>,
) -> AppResult<Json<MessageResponse>> {
    state.notification_service.mark_as_read(user.id, id).await?;
    Ok(Json(MessageResponse {
        message: "Notification marked as read",
    }))
}

async fn mark_all_read(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> AppResult<Json<MessageResponse>> {
    state.notification_service.mark_all_as_read(user.id).await?;
    Ok(Json(MessageResponse {
        message: "All notifications marked as read",
    }))
}
