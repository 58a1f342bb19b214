use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::features::auth::model::{AuthenticatedUser, UserRole};

/// Database model for an account. Never serialized directly: it carries the password hash.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn identity(&self) -> AuthenticatedUser {
        AuthenticatedUser {
            user_id: self.id,
            email: self.email.clone(),
            role: self.role,
        }
    }
}

/// Data for inserting a new account
#[derive(Debug)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
}
