use crate::core::config::AuthConfig;
use crate::core::error::{AppError, Result};
use crate::features::auth::dtos::{AuthResponseDto, LoginRequestDto, RegisterRequestDto};
use crate::features::auth::model::{AuthenticatedUser, UserRole};
use crate::features::auth::services::password::{
    hash_password, verify_password, verify_unknown_account,
};
use crate::features::auth::services::token_service::TokenService;
use crate::features::users::dtos::UserResponseDto;
use crate::features::users::models::{NewUser, User};
use crate::features::users::UserService;
use std::sync::Arc;

const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Check `password` against the looked-up account.
///
/// A missing account and a wrong password give the same 401 after the same bcrypt work.
pub async fn check_credentials(user: Option<User>, password: String) -> Result<User> {
    let Some(user) = user else {
        verify_unknown_account(password).await?;
        tracing::debug!("Login attempt for unknown email");
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    };

    if !verify_password(password, user.password_hash.clone()).await? {
        tracing::info!("Failed login for user {}", user.id);
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    }

    Ok(user)
}

/// Credential-based sign-in backed by the `users` table
pub struct AuthService {
    users: Arc<UserService>,
    tokens: Arc<TokenService>,
    cookie_name: String,
    cookie_secure: bool,
}

impl AuthService {
    pub fn new(users: Arc<UserService>, tokens: Arc<TokenService>, config: &AuthConfig) -> Self {
        Self {
            users,
            tokens,
            cookie_name: config.cookie_name.clone(),
            cookie_secure: config.cookie_secure,
        }
    }

    /// Register a new user with role USER and sign them in
    pub async fn register(&self, dto: RegisterRequestDto) -> Result<AuthResponseDto> {
        if self.users.find_by_email(&dto.email).await?.is_some() {
            return Err(AppError::Conflict("Email is already registered".to_string()));
        }

        let password_hash = hash_password(dto.password).await?;
        let user = self
            .users
            .create(NewUser {
                name: dto.name,
                email: dto.email,
                password_hash,
                role: UserRole::User,
            })
            .await?;

        self.session_for(user)
    }

    /// Login with email and password
    pub async fn login(&self, dto: LoginRequestDto) -> Result<AuthResponseDto> {
        let found = self.users.find_by_email(&dto.email).await?;
        let user = check_credentials(found, dto.password).await?;

        tracing::info!("User {} signed in", user.id);
        self.session_for(user)
    }

    /// Current user profile, read fresh from the database
    pub async fn get_current_user(&self, user: &AuthenticatedUser) -> Result<UserResponseDto> {
        let record = self.users.get_by_id(user.user_id).await.map_err(|e| match e {
            // Token outlived the account
            AppError::NotFound(_) => AppError::Unauthorized("Account no longer exists".to_string()),
            other => other,
        })?;
        Ok(record.into())
    }

    fn session_for(&self, user: User) -> Result<AuthResponseDto> {
        let issued = self.tokens.issue(&user.identity())?;
        Ok(AuthResponseDto {
            access_token: issued.token,
            token_type: "Bearer".to_string(),
            expires_in: issued.expires_in,
            user: user.into(),
        })
    }

    /// `Set-Cookie` value carrying the session token
    pub fn session_cookie(&self, token: &str) -> String {
        self.cookie(token, self.tokens.ttl().as_secs())
    }

    /// `Set-Cookie` value that clears the session cookie
    pub fn expired_cookie(&self) -> String {
        self.cookie("", 0)
    }

    fn cookie(&self, value: &str, max_age: u64) -> String {
        let mut cookie = format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            self.cookie_name, value, max_age
        );
        if self.cookie_secure {
            cookie.push_str("; Secure");
        }
        cookie
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::{lazy_pool, test_auth_config};
    use chrono::Utc;
    use uuid::Uuid;

    async fn account(password: &str) -> User {
        User {
            id: Uuid::new_v4(),
            name: "Dr Who".to_string(),
            email: "who@example.com".to_string(),
            password_hash: hash_password(password.to_string()).await.unwrap(),
            role: UserRole::User,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn unauthorized_message(result: Result<User>) -> String {
        match result {
            Err(AppError::Unauthorized(msg)) => msg,
            other => panic!("expected 401, got {:?}", other.map(|u| u.id)),
        }
    }

    #[tokio::test]
    async fn test_unknown_email_and_wrong_password_fail_alike() {
        let unknown = unauthorized_message(check_credentials(None, "secret123".to_string()).await);
        let wrong = unauthorized_message(
            check_credentials(Some(account("secret123").await), "secret124".to_string()).await,
        );
        assert_eq!(unknown, wrong);
        assert_eq!(unknown, INVALID_CREDENTIALS);
    }

    #[tokio::test]
    async fn test_correct_password_returns_account() {
        let user = account("secret123").await;
        let id = user.id;
        let checked = check_credentials(Some(user), "secret123".to_string())
            .await
            .unwrap();
        assert_eq!(checked.id, id);
    }

    fn service(secure: bool) -> AuthService {
        let mut config = test_auth_config();
        config.cookie_secure = secure;
        AuthService::new(
            Arc::new(UserService::new(lazy_pool())),
            Arc::new(TokenService::new(&config)),
            &config,
        )
    }

    #[tokio::test]
    async fn test_session_cookie_attributes() {
        let cookie = service(false).session_cookie("tok");
        assert!(cookie.starts_with("medreport_session=tok;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains(&format!("Max-Age={}", test_auth_config().token_ttl.as_secs())));
        assert!(!cookie.contains("Secure"));
    }

    #[tokio::test]
    async fn test_expired_cookie_is_secure_when_configured() {
        let cookie = service(true).expired_cookie();
        assert!(cookie.starts_with("medreport_session=;"));
        assert!(cookie.contains("Max-Age=0"));
        assert!(cookie.ends_with("; Secure"));
    }
}
