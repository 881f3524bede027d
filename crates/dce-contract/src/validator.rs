//! Contract validation of assistant responses

use crate::candidates::parse_candidates;
use crate::error::{ContractError, ContractViolation, ParseError};
use dce_model::ContractExpectation;
use serde_json::Value;

/// Outcome of a contract check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractCheck {
    /// Whether the response satisfies the contract
    pub ok: bool,
    /// Why it does not, for display
    pub reason: Option<String>,
    failure: Option<ContractError>,
}

impl ContractCheck {
    fn passed() -> Self {
        Self {
            ok: true,
            reason: None,
            failure: None,
        }
    }

    fn failed(error: ContractError) -> Self {
        Self {
            ok: false,
            reason: Some(error.to_string()),
            failure: Some(error),
        }
    }

    /// Typed error behind a failed check
    #[inline]
    #[must_use]
    pub fn error(&self) -> Option<&ContractError> {
        self.failure.as_ref()
    }

    /// Convert into a `Result`
    ///
    /// # Errors
    /// Returns the parse failure or contract violation that failed the check
    pub fn into_result(self) -> Result<(), ContractError> {
        self.failure.map_or(Ok(()), Err)
    }
}

impl From<Result<(), ContractError>> for ContractCheck {
    fn from(result: Result<(), ContractError>) -> Self {
        match result {
            Ok(()) => Self::passed(),
            Err(error) => Self::failed(error),
        }
    }
}

/// Check `text` against `contract`
///
/// No contract means anything goes.
#[must_use]
pub fn validate_contract(contract: Option<ContractExpectation>, text: &str) -> ContractCheck {
    let Some(expected) = contract else {
        return ContractCheck::passed();
    };
    let values = parse_candidates(text);
    tracing::debug!(contract = %expected, candidates = values.len(), "validating contract");
    validate_values(expected, &values).into()
}

/// Check already-parsed values against `expected`
///
/// # Errors
/// Returns [`ParseError::NoJson`] when `values` is empty, otherwise a
/// [`ContractViolation`] when no value satisfies the contract
pub fn validate_values(expected: ContractExpectation, values: &[Value]) -> Result<(), ContractError> {
    if values.is_empty() {
        return Err(ParseError::NoJson { expected }.into());
    }

    if expected.is_patch() {
        return if values.iter().any(is_patch_list) {
            Ok(())
        } else {
            Err(ContractViolation::NotAPatch { expected }.into())
        };
    }

    if values.iter().any(|value| type_label(value) == Some(expected.as_str())) {
        return Ok(());
    }

    let mut found: Vec<String> = Vec::new();
    for label in values.iter().filter_map(type_label) {
        if !found.iter().any(|f| f == label) {
            found.push(label.to_string());
        }
    }
    Err(ContractViolation::TypeMismatch { expected, found }.into())
}

fn is_patch_list(value: &Value) -> bool {
    value.is_array() || value.get("patch").is_some_and(Value::is_array)
}

fn type_label(value: &Value) -> Option<&str> {
    value.as_object()?.get("type")?.as_str()
}
