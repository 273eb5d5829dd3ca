//! Identifier and path validation for SQL interpolation.
//!
//! Table, column and source names end up inside double-quoted identifiers,
//! and file paths inside single-quoted string literals. Both are checked
//! here before any statement is built, so that nothing supplied by a caller
//! can close a quote, start a comment or chain a second statement.
//!
//! # Example
//! ```rust
//! use detective_core::validation::{validate_identifier, validate_path};
//!
//! assert_eq!(validate_identifier("  users ", "table").unwrap(), "users");
//! assert!(validate_identifier("users; DROP TABLE users", "table").is_err());
//! assert!(validate_path("./data/*.parquet", "path").is_ok());
//! ```

use crate::{DetectiveError, Result};
use regex::Regex;
use std::sync::OnceLock;


/// Pre-compiled patterns shared by all validators.
struct ValidationPatterns {
    /// Letters, digits, underscores, whitespace, hyphens and dots
    safe_identifier: Regex,
    /// Comment sequences the base pattern would otherwise allow
    dangerous_identifier: Regex,
}

impl ValidationPatterns {
    fn instance() -> &'static Self {
        static PATTERNS: OnceLock<ValidationPatterns> = OnceLock::new();
        PATTERNS.get_or_init(Self::compile)
    }

    fn compile() -> Self {
        Self {
            safe_identifier: Regex::new(r"^[\w][\w\s\-.]*$").expect("Invalid identifier pattern"),
            dangerous_identifier: Regex::new(r"--|/\*|\*/").expect("Invalid comment pattern"),
        }
    }
}

/// Validates that a value is safe to use as a SQL identifier.
///
/// Allows letters, digits, underscores, hyphens, spaces and dots, and
/// rejects anything that could be used for injection (semicolons, quotes,
/// parentheses, comment sequences).
///
/// # Arguments
/// * `value` - The identifier to validate
/// * `label` - Human-readable name used in error messages (e.g. "table")
///
/// # Returns
/// The identifier with surrounding whitespace removed.
///
/// # Errors
/// Returns `DetectiveError::InvalidInput` if the identifier is empty or
/// contains disallowed characters or sequences.
pub fn validate_identifier(value: &str, label: &str) -> Result<String> {
    let stripped = value.trim();
    if stripped.is_empty() {
        return Err(DetectiveError::invalid_input(label, "must not be empty."));
    }

    let patterns = ValidationPatterns::instance();
    if !patterns.safe_identifier.is_match(stripped) {
        return Err(DetectiveError::invalid_input(
            label,
            format!(
                "'{stripped}' contains disallowed characters. Only letters, digits, \
                 underscores, hyphens, spaces, and dots are allowed."
            ),
        ));
    }
    if patterns.dangerous_identifier.is_match(stripped) {
        return Err(DetectiveError::invalid_input(
            label,
            format!("'{stripped}' contains disallowed character sequences."),
        ));
    }

    Ok(stripped.to_string())
}

/// Validates an optional identifier, passing `None` through untouched.
pub fn validate_optional_identifier(value: Option<&str>, label: &str) -> Result<Option<String>> {
    value.map(|v| validate_identifier(v, label)).transpose()
}

/// Validates that a file path is safe to place inside a single-quoted SQL literal.
///
/// Globs such as `./data/*.parquet` are allowed; quotes, semicolons and the
/// `--` comment sequence are not.
///
/// # Errors
/// Returns `DetectiveError::InvalidInput` for blank paths or paths
/// containing disallowed characters.
pub fn validate_path(value: &str, label: &str) -> Result<String> {
    if value.trim().is_empty() {
        return Err(DetectiveError::invalid_input(label, "must not be empty."));
    }
    if value.contains(['\'', '"', ';']) {
        return Err(DetectiveError::invalid_input(
            label,
            format!("'{value}' contains disallowed characters (quotes or semicolons)."),
        ));
    }
    if value.contains("--") {
        return Err(DetectiveError::invalid_input(
            label,
            format!("'{value}' contains disallowed character sequences."),
        ));
    }
    Ok(value.to_string())
}
