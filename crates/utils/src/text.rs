//! Small text helpers used by search filters.

/// Trim and lowercase a user-entered query. Returns `None` for blank input.
pub fn normalize_query(query: &str) -> Option<String> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}
