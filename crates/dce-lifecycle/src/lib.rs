//! DCE Draft Lifecycle
//!
//! Drives a draft from assistant response to saved entity.
//!
//! # Lifecycle
//!
//! ```text
//! idle ──ingest──▶ draft_ready ──begin_test──▶ testing ──finish_test──▶ draft_ready
//!   ▲                 │  │  │                                              │
//!   │                 │  │  └─apply_to_form──▶ applied ──observe_form──▶ outdated
//!   │                 │  └─preview──▶ previewing ──close_preview──▶ (origin)
//!   └──send_message───┴─begin_save/finish_save──▶ saved
//! ```
//!
//! Every failure path lands in `error`, from which only `idle` is reachable.
//!
//! # Example
//!
//! ```rust,ignore
//! use dce_lifecycle::prelude::*;
//!
//! let store = Arc::new(MemoryDraftStore::new());
//! let mut controller = DraftController::new(EngineConfig::new(), store);
//! controller.send_message()?;
//! controller.ingest(&response, Completion::Complete)?;
//! controller.run_test(&runner, serde_json::json!({})).await?;
//! let receipt = controller.run_save(&saver).await?;
//! ```

#![warn(unreachable_pub)]

pub mod collaborators;
pub mod config;
pub mod controller;
pub mod error;
pub mod state_machine;
pub mod store;

pub use collaborators::{DraftSaver, DryRunRequest, DryRunResponse, DryRunner, FinalizedPayload};
pub use config::EngineConfig;
pub use controller::{
    Completion, DraftController, IngestOutcome, SaveReceipt, SaveTarget, SaveTicket,
    TestResolution, TestTicket,
};
pub use error::{
    CollaboratorError, ConfigError, EngineError, LifecycleError, StateMachineError, StoreError,
};
pub use state_machine::{allowed_transitions, validate_transition, LifecycleState};
pub use store::{ContextId, DraftStore, EditingContext, MemoryDraftStore, StorageKeys};

pub use dce_contract::DraftMode;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for driving a draft lifecycle
    pub use crate::collaborators::{DraftSaver, DryRunner};
    pub use crate::config::EngineConfig;
    pub use crate::controller::{Completion, DraftController, IngestOutcome, SaveTarget};
    pub use crate::error::{EngineError, LifecycleError};
    pub use crate::state_machine::LifecycleState;
    pub use crate::store::{DraftStore, EditingContext, MemoryDraftStore};
    pub use std::sync::Arc;
}
