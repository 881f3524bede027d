//! DCE Contract Boundary
//!
//! The trusted boundary between free-form assistant output and typed drafts.
//!
//! # Pipeline
//!
//! ```text
//! assistant text → scanner → candidates → validator → normalize → Draft
//!                                                        ↑
//!                                              base Draft + patch
//! ```
//!
//! [`sql::validate_sql`] is the separate read-only guard run before a
//! dry-run.
//!
//! # Example
//!
//! ```rust,ignore
//! use dce_contract::prelude::*;
//!
//! let check = validate_contract(Some(ContractExpectation::ApiDraft), text);
//! check.into_result()?;
//! for value in parse_candidates(text) {
//!     if let Ok(out) = normalize(&value, &base, LogicVariant::Extended) {
//!         return Ok(out.draft);
//!     }
//! }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod candidates;
pub mod error;
pub mod normalize;
pub mod scanner;
pub mod sql;
pub mod validator;

pub use candidates::{parse_candidates, strip_code_fences, try_parse_json};
pub use error::{ContractError, ContractViolation, NormalizeError, ParseError, ShapeError};
pub use normalize::{normalize, validate_draft, validate_shape, DraftMode, NormalizedDraft};
pub use scanner::extract_candidates;
pub use sql::validate_sql;
pub use validator::{validate_contract, validate_values, ContractCheck};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the contract boundary
    pub use crate::candidates::parse_candidates;
    pub use crate::error::{ContractError, NormalizeError, ShapeError};
    pub use crate::normalize::{normalize, DraftMode, NormalizedDraft};
    pub use crate::sql::validate_sql;
    pub use crate::validator::{validate_contract, ContractCheck};
    pub use dce_model::{ContractExpectation, Draft, LogicVariant};
}
