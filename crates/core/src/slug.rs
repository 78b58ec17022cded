//! Slug validation for section addressing.
//!
//! Slugs are the path segments of a section address, so they must be
//! non-empty and must never contain the `/` separator.

use crate::error::CoreError;

/// Longest slug accepted for a section.
pub const MAX_SLUG_LEN: usize = 128;

/// Validate a section slug (non-empty, lowercase alphanumeric, `-` and `_`).
pub fn validate_slug(slug: &str) -> Result<(), CoreError> {
    if slug.is_empty() {
        return Err(CoreError::Validation("Slug must not be empty".into()));
    }
    if slug.len() > MAX_SLUG_LEN {
        return Err(CoreError::Validation(format!(
            "Slug must be at most {MAX_SLUG_LEN} characters"
        )));
    }
    if !slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
    {
        return Err(CoreError::Validation(format!(
            "Slug '{slug}' must contain only lowercase alphanumeric characters, hyphens and underscores"
        )));
    }
    Ok(())
}
