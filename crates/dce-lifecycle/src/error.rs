//! Error types for the draft lifecycle
//!
//! Provides error handling for:
//! - Lifecycle misuse (illegal transitions, in-flight guards, save gate)
//! - Persistence and configuration failures
//! - Collaborator (dry-run, save) failures
//! - The engine-wide taxonomy surfaced to users, [`EngineError`]

use crate::state_machine::LifecycleState;
use dce_contract::{ContractError, NormalizeError, ParseError, ShapeError};
use dce_delta::PatchError;
use serde_json::Value;

/// Every failure the engine reports against a draft
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// No JSON could be extracted from the response
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// JSON found, but it does not satisfy the contract
    #[error("contract violation: {0}")]
    ContractViolation(String),

    /// Draft is missing a required field or has the wrong shape
    #[error("invalid draft: {0}")]
    ShapeValidation(#[from] ShapeError),

    /// Query failed the read-only guard
    #[error("unsafe SQL: {}", .0.join("; "))]
    SqlSafety(Vec<String>),

    /// Patch could not be applied
    #[error("patch failed: {0}")]
    PatchApplication(#[from] PatchError),

    /// Dry-run or save request failed
    #[error("network error: {0}")]
    Network(#[from] CollaboratorError),
}

impl EngineError {
    /// Whether the engine recovers without user action
    ///
    /// Only network failures qualify: a failed save lands in the local
    /// store, a failed test keeps the draft.
    #[inline]
    #[must_use]
    pub fn is_locally_recovered(&self) -> bool {
        matches!(self, Self::Network(_))
    }

    /// Whether the error may be shown while a response is still streaming
    ///
    /// Text-derived errors are meaningless until the response is complete.
    #[inline]
    #[must_use]
    pub fn surfaces_while_streaming(&self) -> bool {
        matches!(self, Self::Network(_))
    }

    /// Messages recorded in the controller report
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        match self {
            Self::SqlSafety(errors) => errors.clone(),
            other => vec![other.to_string()],
        }
    }
}

impl From<ContractError> for EngineError {
    fn from(value: ContractError) -> Self {
        match value {
            ContractError::Parse(e) => Self::Parse(e),
            ContractError::Violation(e) => Self::ContractViolation(e.to_string()),
        }
    }
}

impl From<NormalizeError> for EngineError {
    fn from(value: NormalizeError) -> Self {
        match value {
            NormalizeError::Patch(e) => Self::PatchApplication(e),
            NormalizeError::Shape(e) => Self::ShapeValidation(e),
            other => Self::ContractViolation(other.to_string()),
        }
    }
}

/// Illegal lifecycle transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum StateMachineError {
    /// Target state is not reachable from the current one
    #[error("illegal transition: {from} -> {to}")]
    IllegalTransition {
        /// State the controller was in
        from: LifecycleState,
        /// Requested state
        to: LifecycleState,
    },
}

/// Persistence failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Backend could not be read or written
    #[error("storage backend failed: {0}")]
    Backend(String),

    /// Stored data could not be decoded
    #[error("stored data is corrupt: {0}")]
    Corrupt(String),
}

impl StoreError {
    /// Create backend error
    #[inline]
    pub fn backend(error: impl std::fmt::Display) -> Self {
        Self::Backend(error.to_string())
    }
}

/// Configuration loading failures
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// Config file is not valid TOML for the engine
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Dry-run or save collaborator failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CollaboratorError {
    /// Request never produced a response
    #[error("request failed: {0}")]
    Network(String),

    /// Server answered with an error envelope
    #[error("{message}")]
    Rejected {
        /// HTTP status, when known
        status: Option<u16>,
        /// Server-provided reason
        message: String,
    },
}

impl CollaboratorError {
    /// Create network error
    #[inline]
    pub fn network(reason: impl Into<String>) -> Self {
        Self::Network(reason.into())
    }

    /// Read an error envelope, preferring `message` over `detail`
    #[must_use]
    pub fn from_envelope(status: Option<u16>, envelope: &Value) -> Self {
        let message = ["message", "detail"]
            .iter()
            .filter_map(|field| envelope.get(*field))
            .find_map(|value| match value {
                Value::Null => None,
                Value::String(s) if s.trim().is_empty() => None,
                Value::String(s) => Some(s.clone()),
                other => Some(other.to_string()),
            })
            .unwrap_or_else(|| match status {
                Some(code) => format!("request failed with status {code}"),
                None => "request failed".to_string(),
            });
        Self::Rejected { status, message }
    }
}

/// Lifecycle controller errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LifecycleError {
    /// Transition refused by the lifecycle table
    #[error(transparent)]
    Transition(#[from] StateMachineError),

    /// Operation needs a current draft
    #[error("no current draft")]
    NoDraft,

    /// Operation not available in the current state
    #[error("cannot {action} while {state}")]
    InvalidState {
        /// What was attempted
        action: &'static str,
        /// State it was attempted in
        state: LifecycleState,
    },

    /// A dry-run is still outstanding
    #[error("a test is already running")]
    TestInFlight,

    /// A save is still outstanding
    #[error("a save is already running")]
    SaveInFlight,

    /// Save gate: the current draft has no passing dry-run
    #[error("save requires a passing test of the current draft")]
    TestRequired,

    /// Draft failed validation before a test
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Draft store failed
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Draft could not be serialized
    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl LifecycleError {
    /// Create invalid-state error
    #[inline]
    pub fn invalid_state(action: &'static str, state: LifecycleState) -> Self {
        Self::InvalidState { action, state }
    }
}

impl From<serde_json::Error> for LifecycleError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dce_model::ContractExpectation;
    use serde_json::json;

    #[test]
    fn envelope_prefers_message() {
        let err = CollaboratorError::from_envelope(
            Some(400),
            &json!({"message": "bad query", "detail": "ignored"}),
        );
        assert_eq!(err.to_string(), "bad query");
    }

    #[test]
    fn envelope_falls_back_to_detail() {
        let err = CollaboratorError::from_envelope(Some(422), &json!({"detail": [{"loc": ["body"]}]}));
        assert_eq!(err.to_string(), r#"[{"loc":["body"]}]"#);

        let err = CollaboratorError::from_envelope(Some(500), &json!({"message": ""}));
        assert_eq!(err.to_string(), "request failed with status 500");
    }

    #[test]
    fn contract_errors_split_into_taxonomy() {
        let parse: EngineError = ContractError::from(ParseError::NoJson {
            expected: ContractExpectation::ApiDraft,
        })
        .into();
        assert!(matches!(parse, EngineError::Parse(_)));

        let shape: EngineError = NormalizeError::Shape(ShapeError::MissingQuery).into();
        assert_eq!(shape, EngineError::ShapeValidation(ShapeError::MissingQuery));

        let mode: EngineError = NormalizeError::UnknownMode("merge".into()).into();
        assert!(matches!(mode, EngineError::ContractViolation(_)));
    }

    #[test]
    fn classification() {
        let network = EngineError::Network(CollaboratorError::network("timeout"));
        assert!(network.is_locally_recovered());
        assert!(network.surfaces_while_streaming());

        let sql = EngineError::SqlSafety(vec!["DROP not allowed".into()]);
        assert!(!sql.is_locally_recovered());
        assert!(!sql.surfaces_while_streaming());
        assert_eq!(sql.messages(), vec!["DROP not allowed"]);
    }

    #[test]
    fn transition_error_display() {
        let err = StateMachineError::IllegalTransition {
            from: LifecycleState::Saved,
            to: LifecycleState::Testing,
        };
        assert_eq!(err.to_string(), "illegal transition: saved -> testing");
    }
}
