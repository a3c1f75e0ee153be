//! Poll and vote endpoints.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use serde::Deserialize;
use votebox_common::AppResult;
use votebox_core::{CreatePollInput, PollView, UpdatePollInput};

use crate::{
    extractors::{ApiJson, ApiPath, AuthUser},
    middleware::AppState,
};

/// Vote request.
#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    pub option_id: i32,
}

/// Create the polls router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", get(show).put(update).delete(delete))
        .route("/{id}/vote", post(vote).delete(clear_vote))
}

async fn list(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> AppResult<Json<Vec<PollView>>> {
    Ok(Json(state.poll_service.list(user.id).await?))
}

async fn create(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(input): ApiJson<CreatePollInput>,
) -> AppResult<(StatusCode, Json<PollView>)> {
    let poll = state.poll_service.create(user.id, input).await?;
    Ok((StatusCode::CREATED, Json(poll)))
}

async fn show(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiPath(id): ApiPath<i32>,
) -> AppResult<Json<PollView>> {
    Ok(Json(state.poll_service.get(id, user.id).await?))
}

async fn update(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiPath(id): ApiPath<i32>,
    ApiJson(input): ApiJson<UpdatePollInput>,
) -> AppResult<Json<PollView>> {
    Ok(Json(state.poll_service.update(user.id, id, input).await?))
}

async fn delete(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiPath(id): ApiPath<i32>,
) -> AppResult<StatusCode> {
    state.poll_service.delete(user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn vote(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiPath(id): ApiPath<i32>,
    ApiJson(req): ApiJson<VoteRequest>,
) -> AppResult<Json<PollView>> {
    Ok(Json(state.vote_service.cast(user.id, id, req.option_id).await?))
}

async fn clear_vote(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiPath(id): ApiPath<i32>,
) -> AppResult<Json<PollView>> {
    Ok(Json(state.vote_service.clear(user.id, id).await?))
}
