//! Error types for patch application

use dce_model::ModelError;

/// Errors during patch application
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatchError {
    /// Path had no segments after discarding empty ones
    #[error("patch operation #{index} has an empty path: '{path}'")]
    EmptyPath {
        /// Position of the operation in the patch
        index: usize,
        /// Path as written
        path: String,
    },

    /// Array index lies past the end of its array
    #[error("patch operation #{index} at '{path}' addresses index {position} of an array of length {len}")]
    IndexOutOfRange {
        /// Position of the operation in the patch
        index: usize,
        /// Path as written
        path: String,
        /// Offending array index
        position: usize,
        /// Length of the array at that point
        len: usize,
    },

    /// Draft could not be converted to or from JSON
    #[error("draft conversion failed: {0}")]
    Model(#[from] ModelError),
}

impl PatchError {
    /// Create empty-path error for operation `index`
    pub fn empty_path(index: usize, path: impl Into<String>) -> Self {
        Self::EmptyPath {
            index,
            path: path.into(),
        }
    }

    /// Create out-of-range error for operation `index`
    pub fn index_out_of_range(
        index: usize,
        path: impl Into<String>,
        position: usize,
        len: usize,
    ) -> Self {
        Self::IndexOutOfRange {
            index,
            path: path.into(),
            position,
            len,
        }
    }
}
