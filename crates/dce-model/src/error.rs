//! Error types for the draft model

/// Errors raised while converting into model types
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// Contract label not recognised
    #[error("unknown contract: '{0}'")]
    UnknownContract(String),

    /// Method outside GET/POST/PUT/DELETE
    #[error("unsupported method: '{0}' (expected GET, POST, PUT or DELETE)")]
    UnknownMethod(String),

    /// Value does not describe a draft
    #[error("invalid draft: {0}")]
    InvalidDraft(String),

    /// Serialization failed
    #[error("serialization failed: {0}")]
    Serialization(String),
}
