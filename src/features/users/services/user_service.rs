use sqlx::PgPool;
use uuid::Uuid;

use crate::core::database::{constraint_violation, ConstraintViolation};
use crate::core::error::{AppError, Result};
use crate::features::auth::model::UserRole;
use crate::features::users::dtos::{UserQueryParams, UserResponseDto};
use crate::features::users::models::{NewUser, User};
use crate::shared::types::contains_pattern;

const USER_COLUMNS: &str = "id, name, email, password_hash, role, created_at, updated_at";

/// Emails are compared and stored lowercase
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub struct UserService {
    pool: PgPool,
}

impl UserService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let query = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);
        sqlx::query_as::<_, User>(&query)
            .bind(normalize_email(email))
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<User> {
        let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }

    pub async fn create(&self, data: NewUser) -> Result<User> {
        let query = format!(
            r#"
            INSERT INTO users (name, email, password_hash, role)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            USER_COLUMNS
        );

        let user = sqlx::query_as::<_, User>(&query)
            .bind(data.name.trim())
            .bind(normalize_email(&data.email))
            .bind(&data.password_hash)
            .bind(data.role)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match constraint_violation(&e) {
                Some(ConstraintViolation::Unique(_)) => {
                    AppError::Conflict("Email is already registered".to_string())
                }
                _ => AppError::Database(e),
            })?;

        tracing::info!("Created user {} with role {}", user.id, user.role);
        Ok(user)
    }

    pub async fn update_name(&self, id: Uuid, name: &str) -> Result<User> {
        let query = format!(
            "UPDATE users SET name = $1, updated_at = NOW() WHERE id = $2 RETURNING {}",
            USER_COLUMNS
        );
        sqlx::query_as::<_, User>(&query)
            .bind(name.trim())
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }

    /// Change a user's role. Admins may not demote themselves.
    pub async fn update_role(&self, actor_id: Uuid, id: Uuid, role: UserRole) -> Result<User> {
        if actor_id == id && role != UserRole::Admin {
            return Err(AppError::BadRequest(
                "Admins cannot remove their own admin role".to_string(),
            ));
        }

        let query = format!(
            "UPDATE users SET role = $1, updated_at = NOW() WHERE id = $2 RETURNING {}",
            USER_COLUMNS
        );
        let user = sqlx::query_as::<_, User>(&query)
            .bind(role)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))?;

        tracing::info!("User {} role changed to {} by {}", id, role, actor_id);
        Ok(user)
    }

    pub async fn list(&self, params: &UserQueryParams) -> Result<(Vec<UserResponseDto>, i64)> {
        let search = contains_pattern(params.search.as_deref());

        // $1 is NULL when there is no search term
        let where_clause = "WHERE ($1::text IS NULL OR name ILIKE $1 OR email ILIKE $1)";

        let total: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM users {}", where_clause))
                .bind(&search)
                .fetch_one(&self.pool)
                .await
                .map_err(AppError::Database)?;

        let query = format!(
            "SELECT {} FROM users {} ORDER BY created_at DESC LIMIT $2 OFFSET $3",
            USER_COLUMNS, where_clause
        );
        let users = sqlx::query_as::<_, User>(&query)
            .bind(&search)
            .bind(params.limit())
            .bind(params.offset())
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)?;

        Ok((users.into_iter().map(UserResponseDto::from).collect(), total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::lazy_pool;

    #[tokio::test]
    async fn test_admin_cannot_demote_self() {
        let service = UserService::new(lazy_pool());
        let id = Uuid::new_v4();

        let result = service.update_role(id, id, UserRole::User).await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Dr.House@Example.COM "), "dr.house@example.com");
    }
}
