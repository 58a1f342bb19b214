//! Who may read and change which prompt.
//!
//! Unreadable prompts surface as 404 so their existence is not revealed;
//! readable-but-protected (system) prompts surface as 403.

use crate::core::error::{AppError, Result};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::prompts::models::Prompt;

pub fn can_read(user: &AuthenticatedUser, prompt: &Prompt) -> bool {
    match prompt.user_id {
        None => prompt.is_system,
        Some(owner) => user.can_access_owned(owner),
    }
}

pub fn ensure_readable(user: &AuthenticatedUser, prompt: &Prompt) -> Result<()> {
    if can_read(user, prompt) {
        Ok(())
    } else {
        Err(not_found(prompt))
    }
}

pub fn ensure_modifiable(user: &AuthenticatedUser, prompt: &Prompt) -> Result<()> {
    ensure_readable(user, prompt)?;
    if prompt.is_system && !user.is_admin() {
        return Err(AppError::Forbidden(
            "Only admins can modify system prompts".to_string(),
        ));
    }
    Ok(())
}

pub fn ensure_can_create(user: &AuthenticatedUser, is_system: bool) -> Result<()> {
    if is_system && !user.is_admin() {
        return Err(AppError::Forbidden(
            "Only admins can create system prompts".to_string(),
        ));
    }
    Ok(())
}

fn not_found(prompt: &Prompt) -> AppError {
    AppError::NotFound(format!("Prompt with id {} not found", prompt.id))
}
