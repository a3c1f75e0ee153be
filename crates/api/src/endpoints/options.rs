//! Option endpoints.

use axum::{Json, Router, extract::State, routing::get};
use votebox_common::AppResult;
use votebox_core::UserView;

use crate::{
    extractors::{ApiPath, AuthUser},
    middleware::AppState,
};

/// Create the options router.
pub fn router() -> Router<AppState> {
    Router::new().route("/{id}/voters", get(voters))
}

async fn voters(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    ApiPath(id): ApiPath<i32>,
) -> AppResult<Json<Vec<UserView>>> {
    Ok(Json(state.vote_service.voters(id).await?))
}
