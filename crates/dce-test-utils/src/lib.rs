//! Testing utilities for DCE workspace
//!
//! Shared fixtures and fake collaborators.

#![allow(missing_docs)]

use async_trait::async_trait;
use dce_lifecycle::{
    CollaboratorError, DraftSaver, DraftStore, DryRunRequest, DryRunResponse, DryRunner,
    FinalizedPayload, MemoryDraftStore, StoreError,
};
use dce_model::{Draft, HttpMethod, Logic};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::VecDeque;

// ----------------------------------------------------------------------
// Fixtures
// ----------------------------------------------------------------------

pub fn users_draft() -> Draft {
    Draft {
        api_name: "Users".to_string(),
        method: HttpMethod::Get,
        endpoint: "/api-manager/users".to_string(),
        description: "List users".to_string(),
        tags: vec!["users".to_string()],
        params_schema: json!({}),
        runtime_policy: json!({}),
        is_active: true,
        logic: Logic::Sql {
            query: "SELECT 1".to_string(),
            timeout_ms: None,
        },
    }
}

pub fn users_draft_json() -> Value {
    json!({
        "api_name": "Users",
        "method": "GET",
        "endpoint": "/api-manager/users",
        "description": "List users",
        "tags": ["users"],
        "logic": {"type": "sql", "query": "SELECT 1"}
    })
}

/// Complete assistant message carrying a `replace` payload in a code fence
pub fn replace_message() -> String {
    let payload = json!({"type": "api_draft", "mode": "replace", "draft": users_draft_json()});
    format!("Here is the draft you asked for:\n```json\n{payload}\n```\nAnything else?")
}

/// Complete assistant message patching `logic.query`
pub fn patch_message(query: &str) -> String {
    let payload = json!({
        "type": "api_draft",
        "mode": "patch",
        "patch": [{"op": "replace", "path": "/logic/query", "value": query}],
        "notes": "query updated"
    });
    format!("Updated the query. {payload}")
}

pub fn sample_response() -> DryRunResponse {
    DryRunResponse {
        columns: vec!["?column?".to_string()],
        rows: vec![json!({"?column?": 1})],
        row_count: 1,
        duration_ms: 3,
    }
}

// ----------------------------------------------------------------------
// Fake collaborators
// ----------------------------------------------------------------------

/// Dry-runner answering from a script, then with an empty success
#[derive(Debug, Default)]
pub struct ScriptedDryRunner {
    script: Mutex<VecDeque<Result<DryRunResponse, CollaboratorError>>>,
    requests: Mutex<Vec<DryRunRequest>>,
}

impl ScriptedDryRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn passing() -> Self {
        Self::new().then(Ok(sample_response()))
    }

    pub fn failing(message: &str) -> Self {
        Self::new().then(Err(CollaboratorError::network(message)))
    }

    #[must_use]
    pub fn then(self, result: Result<DryRunResponse, CollaboratorError>) -> Self {
        self.script.lock().push_back(result);
        self
    }

    pub fn requests(&self) -> Vec<DryRunRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl DryRunner for ScriptedDryRunner {
    async fn run(&self, request: &DryRunRequest) -> Result<DryRunResponse, CollaboratorError> {
        self.requests.lock().push(request.clone());
        self.script
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(DryRunResponse::default()))
    }
}

/// Saver that accepts everything and remembers what it saw
#[derive(Debug)]
pub struct RecordingSaver {
    entity_id: String,
    saved: Mutex<Vec<FinalizedPayload>>,
}

impl RecordingSaver {
    pub fn new(entity_id: &str) -> Self {
        Self {
            entity_id: entity_id.to_string(),
            saved: Mutex::new(Vec::new()),
        }
    }

    pub fn saved(&self) -> Vec<FinalizedPayload> {
        self.saved.lock().clone()
    }
}

#[async_trait]
impl DraftSaver for RecordingSaver {
    async fn save(&self, payload: &FinalizedPayload) -> Result<String, CollaboratorError> {
        self.saved.lock().push(payload.clone());
        Ok(payload.id.clone().unwrap_or_else(|| self.entity_id.clone()))
    }
}

/// Saver whose server is always down
#[derive(Debug, Default)]
pub struct FailingSaver;

#[async_trait]
impl DraftSaver for FailingSaver {
    async fn save(&self, _payload: &FinalizedPayload) -> Result<String, CollaboratorError> {
        Err(CollaboratorError::network("connection refused"))
    }
}

/// Store that refuses writes to matching keys and keeps the rest in memory
#[derive(Debug, Default)]
pub struct FailingStore {
    pattern: Option<String>,
    inner: MemoryDraftStore,
}

impl FailingStore {
    /// Refuse every write
    pub fn all() -> Self {
        Self::default()
    }

    /// Refuse writes to keys containing `pattern`
    pub fn matching(pattern: &str) -> Self {
        Self {
            pattern: Some(pattern.to_string()),
            inner: MemoryDraftStore::new(),
        }
    }

    fn refuses(&self, key: &str) -> bool {
        self.pattern.as_deref().map_or(true, |p| key.contains(p))
    }
}

impl DraftStore for FailingStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        if self.refuses(key) {
            return Err(StoreError::backend(format!("quota exceeded writing {key}")));
        }
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.inner.remove(key)
    }
}
