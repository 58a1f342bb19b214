use crate::core::config::DatabaseConfig;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;

pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
        .connect(&config.url)
        .await
}

/// Apply the embedded schema migrations (users, prompts, reports)
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

/// Map unique/foreign-key violations to caller-supplied messages.
///
/// Returns `None` for every other database error so the caller can fall back
/// to the generic `AppError::Database`.
pub fn constraint_violation(e: &sqlx::Error) -> Option<ConstraintViolation> {
    if let sqlx::Error::Database(db_err) = e {
        let constraint = db_err.constraint().map(str::to_string);
        match db_err.code().as_deref() {
            Some("23505") => return Some(ConstraintViolation::Unique(constraint)),
            Some("23503") => return Some(ConstraintViolation::ForeignKey(constraint)),
            _ => {}
        }
    }
    None
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstraintViolation {
    Unique(Option<String>),
    ForeignKey(Option<String>),
}
