//! DCE Delta
//!
//! Incremental edits and change reports for drafts.
//!
//! # Core Concepts
//!
//! - [`apply_patch`]: Replace-only patch application on a deep clone
//! - [`diff`]: Ordered, human-readable field differences between two drafts
//!
//! # Example
//!
//! ```rust,ignore
//! use dce_delta::{apply_to_draft, diff};
//!
//! let patched = apply_to_draft(&baseline, &ops)?;
//! let draft = Draft::from_value(patched)?;
//! for line in diff(&draft, &baseline) {
//!     println!("{line}");
//! }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod apply;
mod diff;
mod error;

// Re-exports
pub use apply::{apply_patch, apply_to_draft};
pub use diff::{describe, diff, NO_CHANGES};
pub use error::PatchError;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
