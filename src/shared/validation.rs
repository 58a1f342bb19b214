use lazy_static::lazy_static;
use regex::Regex;

use crate::features::specialties::registry;

lazy_static! {
    /// Specialty keys are lowercase snake_case
    /// - Valid: "cardiology", "emergency_medicine"
    /// - Invalid: "Cardiology", "emergency-medicine", "_general"
    pub static ref SPECIALTY_KEY_REGEX: Regex = Regex::new(r"^[a-z]+(?:_[a-z]+)*$").unwrap();
}

/// `validator` custom check: the key must name a registered specialty
pub fn validate_specialty(key: &str) -> Result<(), validator::ValidationError> {
    if SPECIALTY_KEY_REGEX.is_match(key) && registry::is_known(key) {
        Ok(())
    } else {
        let mut err = validator::ValidationError::new("unknown_specialty");
        err.message = Some(format!("Unknown specialty '{}'", key).into());
        Err(err)
    }
}

/// `validator` custom check for strings that must contain non-whitespace
pub fn validate_not_blank(value: &str) -> Result<(), validator::ValidationError> {
    if value.trim().is_empty() {
        let mut err = validator::ValidationError::new("blank");
        err.message = Some("Must not be blank".into());
        Err(err)
    } else {
        Ok(())
    }
}
