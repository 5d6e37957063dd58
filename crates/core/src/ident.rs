//! SQL identifier validation and quoting.
//!
//! Table and column names arrive from callers at runtime and are interpolated
//! into dynamically built statements. This module is the sole injection
//! defense for identifiers; *values* must always travel as bound parameters.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::CoreError;

/// Maximum identifier length accepted (matches the store's own limit).
pub const MAX_IDENTIFIER_LEN: usize = 128;

fn identifier_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("static regex"))
}

/// Whether `name` is safe to interpolate into a SQL fragment as an identifier.
///
/// Accepts only `^[A-Za-z_][A-Za-z0-9_]*$` of at most [`MAX_IDENTIFIER_LEN`]
/// characters. Anything containing quotes, semicolons, backslashes, or
/// whitespace is rejected.
pub fn is_valid_identifier(name: &str) -> bool {
    !name.is_empty() && name.len() <= MAX_IDENTIFIER_LEN && identifier_pattern().is_match(name)
}

/// Validate `name`, returning it unchanged or a [`CoreError::Validation`].
pub fn validate_identifier(name: &str) -> Result<&str, CoreError> {
    if is_valid_identifier(name) {
        Ok(name)
    } else {
        Err(CoreError::Validation(format!(
            "Invalid identifier: '{name}'"
        )))
    }
}

/// Double-quote a *previously validated* identifier for interpolation.
///
/// The accepted character class cannot contain `"`, so no escaping is needed.
pub fn quote_ident(name: &str) -> String {
    format!("\"{name}\"")
}
