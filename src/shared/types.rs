use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::shared::constants::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub meta: Option<Meta>,
    pub errors: Option<Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Meta {
    pub total: i64,
}

/// Clamp a 1-indexed page request into SQL `(limit, offset)`
pub fn page_window(page: i64, page_size: i64) -> (i64, i64) {
    let limit = page_size.clamp(1, MAX_PAGE_SIZE);
    (limit, (page.max(1) - 1).saturating_mul(limit))
}

/// Trimmed, non-empty filter value
pub fn non_blank(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

/// `ILIKE` pattern matching `raw` anywhere, with `%`, `_` and `\` taken literally
pub fn contains_pattern(raw: Option<&str>) -> Option<String> {
    non_blank(raw).map(|s| {
        let escaped = s
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        format!("%{}%", escaped)
    })
}

pub fn default_page() -> i64 {
    1
}

pub fn default_page_size() -> i64 {
    DEFAULT_PAGE_SIZE
}

impl<T> ApiResponse<T> {
    pub fn success(data: Option<T>, message: Option<String>, meta: Option<Meta>) -> Self {
        Self {
            success: true,
            data,
            message,
            meta,
            errors: None,
        }
    }

    pub fn error(message: Option<String>, errors: Option<Vec<String>>) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            message,
            meta: None,
            errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_window_clamps() {
        assert_eq!(page_window(1, 10), (10, 0));
        assert_eq!(page_window(3, 20), (20, 40));
        assert_eq!(page_window(0, 0), (1, 0));
        assert_eq!(page_window(2, 1000), (MAX_PAGE_SIZE, MAX_PAGE_SIZE));
    }

    #[test]
    fn test_page_window_huge_page_saturates() {
        assert_eq!(page_window(i64::MAX, 10), (10, i64::MAX));
        assert_eq!(page_window(i64::MIN, 10), (10, 0));
        let (_, offset) = page_window(i64::MAX / 2, MAX_PAGE_SIZE);
        assert!(offset > 0);
    }

    #[test]
    fn test_contains_pattern() {
        assert_eq!(contains_pattern(Some("  ct head ")), Some("%ct head%".to_string()));
        assert_eq!(contains_pattern(Some("   ")), None);
        assert_eq!(contains_pattern(None), None);
        assert_eq!(contains_pattern(Some("50%_x")), Some(r"%50\%\_x%".to_string()));
        assert_eq!(non_blank(Some(" radiology ")), Some("radiology"));
    }

    #[test]
    fn test_error_envelope_shape() {
        let body = serde_json::to_value(ApiResponse::<()>::error(
            Some("Nope".to_string()),
            None,
        ))
        .unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Nope");
        assert!(body["data"].is_null());
    }
}
