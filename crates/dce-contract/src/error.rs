//! Error types for the contract boundary
//!
//! Provides error handling for:
//! - Contract checks (text → expected JSON shape), split into parse
//!   failures and contract violations
//! - Shape validation (JSON → typed draft)
//! - Normalization (payload → replace or patch draft)

use dce_delta::PatchError;
use dce_model::ContractExpectation;

/// Nothing usable could be extracted from a response
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// Nothing in the response parsed as JSON
    #[error("no JSON found in response (expected contract: {expected})")]
    NoJson { expected: ContractExpectation },
}

/// JSON was found but none of it satisfies the contract
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContractViolation {
    /// No patch list among the parsed values
    #[error("expected a patch array or an object with a \"patch\" array for contract {expected}")]
    NotAPatch { expected: ContractExpectation },

    /// JSON objects found, none with the expected `type`
    #[error("expected type \"{expected}\" but {}", found_types(.found))]
    TypeMismatch {
        /// Contract that was required
        expected: ContractExpectation,
        /// `type` values seen, in order of first appearance
        found: Vec<String>,
    },
}

/// Either way a contract check can fail
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContractError {
    /// Nothing parsable
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Parsed, but not the expected shape
    #[error(transparent)]
    Violation(#[from] ContractViolation),
}

impl ContractError {
    /// Whether the failure is a parse failure rather than a contract violation
    #[inline]
    #[must_use]
    pub fn is_parse_failure(&self) -> bool {
        matches!(self, Self::Parse(_))
    }
}

fn found_types(found: &[String]) -> String {
    if found.is_empty() {
        "no \"type\" field was found".to_string()
    } else {
        format!("found: {}", found.join(", "))
    }
}

/// A required draft field is missing or malformed
///
/// One requirement per variant; validation reports the first failure only.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShapeError {
    /// Draft is not a JSON object
    #[error("draft must be a JSON object")]
    NotAnObject,

    /// `api_name` is blank
    #[error("api_name is required")]
    MissingApiName,

    /// `method` is missing or blank
    #[error("method is required")]
    MissingMethod,

    /// `endpoint` is blank
    #[error("endpoint is required")]
    MissingEndpoint,

    /// Deployment only accepts SQL logic
    #[error("logic.type must be \"sql\"")]
    SqlLogicRequired,

    /// `logic.type` is not allowed for the configured variant
    #[error("logic.type must be \"sql\" or \"http\" (found: {0})")]
    UnsupportedLogic(String),

    /// SQL logic without a query
    #[error("logic.query is required")]
    MissingQuery,

    /// HTTP logic without a URL
    #[error("logic.spec.url is required")]
    MissingHttpUrl,

    /// HTTP logic without a method
    #[error("logic.spec.method is required")]
    MissingHttpMethod,

    /// Required fields present, but typed conversion failed
    #[error("draft does not match the expected shape: {0}")]
    Invalid(String),
}

/// Errors turning an `api_draft` payload into a draft
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NormalizeError {
    /// Payload `type` is not `api_draft`
    #[error("payload type must be \"api_draft\" (found: {})", .0.as_deref().unwrap_or("none"))]
    NotApiDraft(Option<String>),

    /// `mode` is neither `replace` nor `patch`
    #[error("unsupported mode: '{0}' (expected \"replace\" or \"patch\")")]
    UnknownMode(String),

    /// Replace payload without a `draft` object
    #[error("replace payload requires a \"draft\" object")]
    MissingDraft,

    /// Patch payload without a `patch` array
    #[error("patch payload requires a \"patch\" array")]
    MissingPatch,

    /// Patch entries are not patch operations
    #[error("invalid patch operations: {0}")]
    InvalidPatch(String),

    /// Patch could not be applied
    #[error("patch application failed: {0}")]
    Patch(#[from] PatchError),

    /// Resulting draft failed shape validation
    #[error("{0}")]
    Shape(#[from] ShapeError),
}
