//! User service.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::Utc;
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;
use votebox_common::{AppError, AppResult};
use votebox_db::{entities::user, repositories::UserRepository};

use super::token::TokenService;

/// User service for business logic.
#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    tokens: TokenService,
}

/// Input for creating a new user.
#[derive(Debug, Deserialize, Validate)]
pub struct SignupInput {
    #[validate(length(min = 1, max = 64))]
    pub username: String,

    #[validate(email)]
    pub email: String,

    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

/// Input for logging in.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginInput {
    #[validate(length(min = 1))]
    pub email: String,

    #[validate(length(min = 1))]
    pub password: String,
}

/// A freshly issued token and the user it belongs to.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub user: user::Model,
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub const fn new(user_repo: UserRepository, tokens: TokenService) -> Self {
        Self { user_repo, tokens }
    }

    /// Register a new user and issue a token.
    pub async fn signup(&self, input: SignupInput) -> AppResult<Session> {
        input.validate()?;

        let username = input.username.trim();
        if username.is_empty() {
            return Err(AppError::Validation("Username cannot be empty".to_string()));
        }

        let password_hash = hash_password(&input.password)?;
        let model = user::ActiveModel {
            username: Set(username.to_string()),
            email: Set(input.email.trim().to_string()),
            password_hash: Set(password_hash),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };

        let user = self.user_repo.create(model).await?;
        tracing::info!(user_id = user.id, username = %user.username, "User signed up");

        let token = self.tokens.issue(user.id)?;
        Ok(Session { token, user })
    }

    /// Authenticate by email and password.
    pub async fn login(&self, input: LoginInput) -> AppResult<Session> {
        input.validate()?;

        let invalid = || AppError::Unauthorized;
        let user = self
            .user_repo
            .find_by_email(input.email.trim())
            .await?
            .ok_or_else(invalid)?;

        if !verify_password(&input.password, &user.password_hash)? {
            return Err(invalid());
        }

        let token = self.tokens.issue(user.id)?;
        Ok(Session { token, user })
    }

    /// Resolve a bearer token to its user.
    ///
    /// A valid token whose user no longer exists is [`AppError::Unauthorized`].
    pub async fn authenticate(&self, token: &str) -> AppResult<user::Model> {
        let user_id = self.tokens.verify(token)?;
        self.user_repo
            .find_by_id(user_id)
            .await?
            .ok_or(AppError::Unauthorized)
    }

    /// Get a user by ID.
    pub async fn get(&self, id: i32) -> AppResult<user::Model> {
        self.user_repo.get_by_id(id).await
    }
}

/// Hash a password using Argon2.
fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| AppError::Internal(format!("Invalid hash: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
