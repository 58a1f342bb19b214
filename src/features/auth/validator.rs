use super::model::{AuthenticatedUser, SessionClaims};
use crate::core::config::AuthConfig;
use crate::core::error::AppError;
use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, DecodingKey, Validation};

/// Verifies session tokens issued by [`super::TokenService`]
pub struct JwtValidator {
    decoding_key: DecodingKey,
    leeway: u64,
    cookie_name: String,
}

impl JwtValidator {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            leeway: config.jwt_leeway.as_secs(),
            cookie_name: config.cookie_name.clone(),
        }
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    pub fn validate_token(&self, token: &str) -> Result<AuthenticatedUser, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = self.leeway;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let token_data =
            decode::<SessionClaims>(token, &self.decoding_key, &validation).map_err(|e| {
                match e.kind() {
                    ErrorKind::ExpiredSignature => {
                        AppError::Unauthorized("Session expired".to_string())
                    }
                    _ => {
                        tracing::debug!("Rejected session token: {}", e);
                        AppError::Unauthorized("Invalid session token".to_string())
                    }
                }
            })?;

        Ok(token_data.claims.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::auth::model::UserRole;
    use crate::shared::test_helpers::{test_auth_config, test_token_service};
    use jsonwebtoken::{encode, EncodingKey, Header};
    use uuid::Uuid;

    fn user(role: UserRole) -> AuthenticatedUser {
        AuthenticatedUser {
            user_id: Uuid::new_v4(),
            email: "radiologist@example.com".to_string(),
            role,
        }
    }

    #[test]
    fn test_validate_issued_token_roundtrip_keeps_role() {
        let validator = JwtValidator::new(&test_auth_config());
        let original = user(UserRole::Admin);
        let issued = test_token_service().issue(&original).unwrap();

        let decoded = validator.validate_token(&issued.token).unwrap();
        assert_eq!(decoded.user_id, original.user_id);
        assert_eq!(decoded.role, UserRole::Admin);
        assert!(decoded.is_admin());
    }

    #[test]
    fn test_token_signed_with_other_secret_rejected() {
        let validator = JwtValidator::new(&test_auth_config());
        let claims = SessionClaims {
            sub: Uuid::new_v4(),
            email: "x@example.com".to_string(),
            role: UserRole::Admin,
            iat: 0,
            exp: u64::MAX / 2,
        };
        let forged = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"some-other-secret-that-is-long-enough!!"),
        )
        .unwrap();

        assert!(matches!(
            validator.validate_token(&forged),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_expired_token_rejected() {
        let config = test_auth_config();
        let validator = JwtValidator::new(&config);
        let now = chrono::Utc::now().timestamp() as u64;
        let claims = SessionClaims {
            sub: Uuid::new_v4(),
            email: "x@example.com".to_string(),
            role: UserRole::User,
            iat: now - 7200,
            exp: now - 3600,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
        )
        .unwrap();

        match validator.validate_token(&token) {
            Err(AppError::Unauthorized(msg)) => assert_eq!(msg, "Session expired"),
            other => panic!("expected expired error, got {:?}", other),
        }
    }
}
