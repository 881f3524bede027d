//! Validation outcome shared by the guards

use serde::{Deserialize, Serialize};

/// Ordered errors and warnings from a validation pass
///
/// `ok` is true exactly when `errors` is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub ok: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    /// Passing result with no messages
    #[inline]
    #[must_use]
    pub fn pass() -> Self {
        Self {
            ok: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Result holding a single error
    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        let mut out = Self::pass();
        out.error(message);
        out
    }

    /// Record an error
    pub fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
        self.ok = false;
    }

    /// Record a warning
    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// Append another result's messages
    pub fn merge(&mut self, other: Self) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
        self.ok = self.errors.is_empty();
    }

    /// Drop all messages
    pub fn clear(&mut self) {
        *self = Self::pass();
    }
}
