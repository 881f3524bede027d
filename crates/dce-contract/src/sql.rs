//! Read-only SQL guard
//!
//! A coarse, lexical check run before a dry-run. It is not a SQL parser:
//! keywords inside string literals or quoted identifiers still count.

use dce_model::ValidationResult;
use once_cell::sync::Lazy;
use regex::Regex;

/// Statements a draft query may not contain
pub const FORBIDDEN_KEYWORDS: [&str; 9] = [
    "DROP", "TRUNCATE", "ALTER", "CREATE", "GRANT", "REVOKE", "INSERT", "UPDATE", "DELETE",
];

static TRAILING_SEMICOLONS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r";[\s;]*$").expect("valid trailing semicolon regex"));

static FORBIDDEN: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    FORBIDDEN_KEYWORDS
        .iter()
        .map(|kw| (*kw, Regex::new(&format!(r"(?i)\b{kw}\b")).expect("valid keyword regex")))
        .collect()
});

/// Check that `query` is a single read-only statement
#[must_use]
pub fn validate_sql(query: &str) -> ValidationResult {
    let mut result = ValidationResult::pass();

    let trimmed = query.trim();
    if trimmed.is_empty() {
        result.error("SQL query is empty");
        return result;
    }

    let stripped = TRAILING_SEMICOLONS.replace(trimmed, "");
    if stripped.len() != trimmed.len() {
        result.warn("Trailing semicolon is ignored");
    }

    let statements: Vec<&str> = stripped
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    match statements.first() {
        None => {
            result.error("SQL query is empty");
            return result;
        }
        Some(first) => {
            if statements.len() > 1 {
                result.error("Only a single statement is allowed");
            }
            let head = first.to_uppercase();
            if !(head.starts_with("SELECT") || head.starts_with("WITH")) {
                result.error("Only SELECT or WITH statements are allowed");
            }
        }
    }

    for (keyword, pattern) in FORBIDDEN.iter() {
        if pattern.is_match(&stripped) {
            result.error(format!("{keyword} not allowed"));
        }
    }

    result
}
