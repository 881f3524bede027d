//! Dry-run and save collaborator boundaries
//!
//! The engine never performs I/O itself; it hands requests to these traits
//! and interprets the results.

use crate::error::CollaboratorError;
use async_trait::async_trait;
use dce_model::{Draft, LogicKind};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Request for a read-only trial execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DryRunRequest {
    /// Kind of logic under test
    pub logic_type: LogicKind,
    /// SQL text, or the HTTP spec as compact JSON
    pub logic_body: String,
    /// Parameters bound for the run; `{}` when none
    pub params: Value,
    /// Draft runtime policy, passed through
    pub runtime_policy: Value,
    /// Per-run timeout from the logic, if set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

impl DryRunRequest {
    /// Build a request for `draft` with caller-supplied parameters
    ///
    /// `null` parameters are sent as an empty object.
    #[must_use]
    pub fn for_draft(draft: &Draft, params: Value) -> Self {
        let params = if params.is_null() {
            Value::Object(Map::new())
        } else {
            params
        };
        Self {
            logic_type: draft.logic.kind(),
            logic_body: draft.logic.body(),
            params,
            runtime_policy: draft.runtime_policy.clone(),
            timeout_ms: draft.logic.timeout_ms(),
        }
    }
}

/// Rows returned by a dry-run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DryRunResponse {
    /// Column names in result order
    pub columns: Vec<String>,
    /// Returned rows
    pub rows: Vec<Value>,
    /// Total rows produced
    pub row_count: usize,
    /// Server-side run time
    pub duration_ms: u64,
}

/// Executes dry-runs
#[async_trait]
pub trait DryRunner: Send + Sync {
    /// Run `request` without side effects
    async fn run(&self, request: &DryRunRequest) -> Result<DryRunResponse, CollaboratorError>;
}

/// Body sent to the save endpoint
///
/// The draft's fields are flattened into the top level; `id` is present only
/// when an existing entity is being updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalizedPayload {
    /// Entity id when updating an existing item
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Finalized draft, flattened into the payload
    #[serde(flatten)]
    pub draft: Draft,
}

/// Persists finalized drafts on the server
#[async_trait]
pub trait DraftSaver: Send + Sync {
    /// Save `payload`, returning the entity id
    async fn save(&self, payload: &FinalizedPayload) -> Result<String, CollaboratorError>;
}
