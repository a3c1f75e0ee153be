//! Bearer token issuing and verification.

use std::sync::Arc;

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use votebox_common::{AppError, AppResult, config::AuthConfig};

/// Claims carried by a bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i32,
    pub iat: i64,
    pub exp: i64,
}

/// HS256 token service.
///
/// Built once at startup; the keys never change afterwards.
#[derive(Clone)]
pub struct TokenService {
    encoding: Arc<EncodingKey>,
    decoding: Arc<DecodingKey>,
    ttl: Duration,
}

impl TokenService {
    /// Create a token service from auth configuration.
    pub fn new(config: &AuthConfig) -> AppResult<Self> {
        if config.jwt_secret.is_empty() {
            return Err(AppError::Config("auth.jwt_secret must not be empty".to_string()));
        }
        if config.token_ttl_hours <= 0 {
            return Err(AppError::Config(
                "auth.token_ttl_hours must be positive".to_string(),
            ));
        }

        let secret = config.jwt_secret.as_bytes();
        Ok(Self {
            encoding: Arc::new(EncodingKey::from_secret(secret)),
            decoding: Arc::new(DecodingKey::from_secret(secret)),
            ttl: Duration::hours(config.token_ttl_hours),
        })
    }

    /// Issue a token for a user.
    pub fn issue(&self, user_id: i32) -> AppResult<String> {
        let now = Utc::now();
        let claims = Claims {
            user_id,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("Failed to sign token: {e}")))
    }

    /// Verify a token and return the user it was issued for.
    ///
    /// Any malformed, forged or expired token is [`AppError::Unauthorized`].
    pub fn verify(&self, token: &str) -> AppResult<i32> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims.user_id)
            .map_err(|e| {
                tracing::debug!(error = %e, "Rejected bearer token");
                AppError::Unauthorized
            })
    }
}
