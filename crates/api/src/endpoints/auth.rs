//! Authentication endpoints.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use serde::Serialize;
use votebox_common::AppResult;
use votebox_core::{LoginInput, Session, SignupInput, UserView};

use crate::{
    extractors::{ApiJson, AuthUser},
    middleware::AppState,
};

/// Token and user returned by signup and login.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserView,
}

impl From<Session> for AuthResponse {
    fn from(session: Session) -> Self {
        Self {
            token: session.token,
            user: session.user.into(),
        }
    }
}

/// Create the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/me", get(me))
}

async fn signup(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<SignupInput>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    let session = state.user_service.signup(input).await?;
    Ok((StatusCode::CREATED, Json(session.into())))
}

async fn login(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<LoginInput>,
) -> AppResult<Json<AuthResponse>> {
    let session = state.user_service.login(input).await?;
    Ok(Json(session.into()))
}

async fn me(AuthUser(user): AuthUser) -> Json<UserView> {
    Json(user.into())
}
