//! DCE Draft Model
//!
//! Typed drafts, output contracts and patch operations shared by every
//! stage of the engine.
//!
//! # Core Concepts
//!
//! - [`Draft`]: Candidate API definition with a tagged [`Logic`] body
//! - [`ContractExpectation`]: Shape an assistant response must satisfy
//! - [`PatchOperation`]: Minimal JSON-Patch-like edit addressed by a [`PatchPath`]
//! - [`ValidationResult`]: Ordered errors and warnings from a guard
//!
//! # Example
//!
//! ```rust,ignore
//! use dce_model::{Draft, PatchOperation};
//!
//! let draft: Draft = serde_json::from_str(raw)?;
//! let op = PatchOperation::replace("/logic/query", serde_json::json!("SELECT 2"));
//! assert_eq!(op.target().len(), 2);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
mod contract;
mod draft;
mod error;
mod patch;
mod validation;

// Re-exports
pub use contract::ContractExpectation;
pub use draft::{Draft, HttpMethod, HttpSpec, Logic, LogicKind, LogicVariant};
pub use error::ModelError;
pub use patch::{PatchOperation, PatchPath, Segment, REPLACE_OP};
pub use validation::ValidationResult;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
