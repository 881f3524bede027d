//! Draft persistence
//!
//! Storage is injected through [`DraftStore`]; the controller never knows
//! what backs it. Keys are scoped per editing context through
//! [`StorageKeys`].

use crate::error::StoreError;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::{self, Display, Formatter};
use uuid::Uuid;

/// Default key prefix
pub const DEFAULT_PREFIX: &str = "api-manager";

/// String key-value persistence
pub trait DraftStore: Send + Sync {
    /// Read the value under `key`
    ///
    /// # Errors
    /// Returns error if the backend cannot be read
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write `value` under `key`, replacing any previous value
    ///
    /// # Errors
    /// Returns error if the backend cannot be written
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove `key`; removing a missing key succeeds
    ///
    /// # Errors
    /// Returns error if the backend cannot be written
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// In-process store
#[derive(Debug, Default)]
pub struct MemoryDraftStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryDraftStore {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the store is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Stored keys, sorted
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.read().keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl DraftStore for MemoryDraftStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries.write().remove(key);
        Ok(())
    }
}

/// What the form is editing
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditingContext {
    /// Item not saved yet
    #[default]
    New,
    /// Saved entity, by id
    Existing(String),
}

impl EditingContext {
    /// Parse a CLI-style label: `new` or an entity id
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            "" | "new" => Self::New,
            id => Self::Existing(id.to_string()),
        }
    }

    /// Storage scope: `new` or `id:{entity_id}`
    #[must_use]
    pub fn scope(&self) -> String {
        match self {
            Self::New => "new".to_string(),
            Self::Existing(id) => format!("id:{id}"),
        }
    }

    /// Entity id, for existing items
    #[inline]
    #[must_use]
    pub fn entity_id(&self) -> Option<&str> {
        match self {
            Self::New => None,
            Self::Existing(id) => Some(id),
        }
    }
}

impl Display for EditingContext {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.scope())
    }
}

/// Per-activation identifier used to discard stale responses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContextId(Uuid);

impl ContextId {
    /// Fresh random id
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Underlying UUID
    #[inline]
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ContextId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for ContextId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Keys one editing context persists under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    /// In-progress draft snapshot
    pub draft: String,
    /// Snapshot applied to the form
    pub applied: String,
    /// Finalized payload awaiting a server save
    pub finalized: String,
}

impl StorageKeys {
    /// Keys for `context` under `prefix`
    #[must_use]
    pub fn new(prefix: &str, context: &EditingContext) -> Self {
        let scope = context.scope();
        Self {
            draft: format!("{prefix}:draft:{scope}"),
            applied: format!("{prefix}:applied:{scope}"),
            finalized: format!("{prefix}:finalized:{scope}"),
        }
    }
}
