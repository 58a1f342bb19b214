use crate::core::config::AuthConfig;
use crate::core::error::{AppError, Result};
use crate::features::auth::model::{AuthenticatedUser, SessionClaims};
use jsonwebtoken::{encode, EncodingKey, Header};
use std::time::Duration;

/// A freshly signed session token
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_in: i64,
}

/// Signs HS256 session tokens for authenticated users
pub struct TokenService {
    encoding_key: EncodingKey,
    ttl: Duration,
}

impl TokenService {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            ttl: config.token_ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, user: &AuthenticatedUser) -> Result<IssuedToken> {
        let now = chrono::Utc::now().timestamp().max(0) as u64;
        let claims = SessionClaims {
            sub: user.user_id,
            email: user.email.clone(),
            role: user.role,
            iat: now,
            exp: now + self.ttl.as_secs(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!("Failed to sign session token: {}", e);
            AppError::Internal(format!("Failed to sign session token: {}", e))
        })?;

        tracing::debug!("Issued session token for user {}", user.user_id);

        Ok(IssuedToken {
            token,
            expires_in: self.ttl.as_secs() as i64,
        })
    }
}
