//! Draft lifecycle controller
//!
//! [`DraftController`] owns the current draft for one editing context and
//! gates every action on it through the lifecycle table in
//! [`crate::state_machine`].
//!
//! # Async collaborators
//!
//! Dry-runs and saves are split into `begin_*` / `finish_*` pairs. The ticket
//! returned by `begin_*` remembers which context (and, for tests, which draft
//! revision) it was issued for, so a response that arrives after the user
//! moved on is recognised as stale. `run_test` and `run_save` wrap both halves
//! around a collaborator call.

use crate::collaborators::{
    DraftSaver, DryRunRequest, DryRunResponse, DryRunner, FinalizedPayload,
};
use crate::config::EngineConfig;
use crate::error::{CollaboratorError, EngineError, LifecycleError, StoreError};
use crate::state_machine::{validate_transition, LifecycleState};
use crate::store::{ContextId, DraftStore, EditingContext, StorageKeys};
use dce_contract::{
    normalize, parse_candidates, validate_contract, validate_shape, validate_sql,
    DraftMode, NormalizeError, NormalizedDraft, ParseError,
};
use dce_delta::diff;
use dce_model::{ContractExpectation, Draft, Logic, ValidationResult};
use serde_json::Value;
use std::sync::Arc;

/// Whether assistant text is still streaming
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// More text will follow
    Partial,
    /// Final text of the message
    Complete,
}

/// Result of feeding assistant text to the controller
#[derive(Debug, Clone, PartialEq)]
pub enum IngestOutcome {
    /// Still streaming; nothing was evaluated
    Responding,
    /// A draft was accepted
    DraftReady {
        /// Whether the draft replaced or patched the base
        mode: DraftMode,
        /// Changes against the base draft
        changes: Vec<String>,
    },
    /// The response was rejected; the controller is in `error`
    Rejected(EngineError),
}

/// Outstanding dry-run
#[derive(Debug, Clone)]
pub struct TestTicket {
    /// Request to hand to the [`DryRunner`]
    pub request: DryRunRequest,
    context_id: ContextId,
    revision: u64,
}

impl TestTicket {
    /// Context the test was started in
    #[inline]
    #[must_use]
    pub fn context_id(&self) -> ContextId {
        self.context_id
    }
}

/// How a dry-run completion was handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestResolution {
    /// Test passed; the save gate is open
    Passed,
    /// Test failed; the draft is kept but cannot be saved
    Failed,
    /// Response belonged to an earlier context or draft and was ignored
    Discarded,
}

/// Outstanding save
#[derive(Debug, Clone)]
pub struct SaveTicket {
    /// Payload to hand to the [`DraftSaver`]
    pub payload: FinalizedPayload,
    /// Exact bytes written to the local store if the server save fails
    pub body: String,
    context_id: ContextId,
    revision: u64,
    snapshot: String,
    keys: StorageKeys,
}

impl SaveTicket {
    /// Context the save was started in
    #[inline]
    #[must_use]
    pub fn context_id(&self) -> ContextId {
        self.context_id
    }
}

/// Where a finalized draft ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveTarget {
    /// Persisted by the server
    Server,
    /// Local fallback under the finalized key
    Local,
}

/// Outcome of a save
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveReceipt {
    /// Where the payload went
    pub target: SaveTarget,
    /// Entity id returned by the server
    pub entity_id: Option<String>,
    /// Key the payload was written under, for local saves
    pub fallback_key: Option<String>,
    /// Why the server save failed, for local saves
    pub error: Option<CollaboratorError>,
}

/// Owns the draft for the current editing context
pub struct DraftController {
    config: EngineConfig,
    store: Arc<dyn DraftStore>,
    context: EditingContext,
    context_id: ContextId,
    keys: StorageKeys,
    state: LifecycleState,
    preview_origin: Option<LifecycleState>,
    draft: Option<Draft>,
    base_draft: Draft,
    applied_baseline: Option<Draft>,
    test_ok: Option<bool>,
    last_dry_run: Option<DryRunResponse>,
    revision: u64,
    test_in_flight: bool,
    save_in_flight: bool,
    report: ValidationResult,
    notes: Option<String>,
}

impl DraftController {
    /// Create a controller for a new item
    ///
    /// No persisted snapshot is loaded; call [`Self::switch_context`] for that.
    #[must_use]
    pub fn new(config: EngineConfig, store: Arc<dyn DraftStore>) -> Self {
        let context = EditingContext::New;
        let keys = StorageKeys::new(&config.storage_prefix, &context);
        Self {
            config,
            store,
            context,
            context_id: ContextId::new(),
            keys,
            state: LifecycleState::Idle,
            preview_origin: None,
            draft: None,
            base_draft: Draft::blank(),
            applied_baseline: None,
            test_ok: None,
            last_dry_run: None,
            revision: 0,
            test_in_flight: false,
            save_in_flight: false,
            report: ValidationResult::pass(),
            notes: None,
        }
    }

    /// Create a controller and activate `context`
    ///
    /// # Errors
    /// Returns error if the persisted snapshot cannot be read
    pub fn open(
        config: EngineConfig,
        store: Arc<dyn DraftStore>,
        context: EditingContext,
        base: Draft,
    ) -> Result<Self, LifecycleError> {
        let mut controller = Self::new(config, store);
        controller.switch_context(context, base)?;
        Ok(controller)
    }

    // ------------------------------------------------------------------
    // Context and message boundaries
    // ------------------------------------------------------------------

    /// A new user message: discard the draft and its persisted snapshot
    ///
    /// # Errors
    /// Returns error if the snapshot cannot be removed
    pub fn send_message(&mut self) -> Result<(), LifecycleError> {
        self.clear_draft();
        self.enter(LifecycleState::Idle)?;
        self.store.remove(&self.keys.draft)?;
        Ok(())
    }

    /// Activate `context` with `base` as the live form's definition
    ///
    /// A persisted draft snapshot for the context is reloaded when it still
    /// passes shape validation, and discarded otherwise.
    ///
    /// # Errors
    /// Returns error if the store cannot be read
    pub fn switch_context(
        &mut self,
        context: EditingContext,
        base: Draft,
    ) -> Result<(), LifecycleError> {
        self.clear_draft();
        self.enter(LifecycleState::Idle)?;

        self.keys = StorageKeys::new(&self.config.storage_prefix, &context);
        self.context = context;
        self.context_id = ContextId::new();
        self.base_draft = base;
        self.applied_baseline = None;
        self.test_in_flight = false;
        self.save_in_flight = false;

        tracing::info!(context = %self.context, context_id = %self.context_id, "editing context activated");
        self.restore()
    }

    /// Switch to a blank new item
    ///
    /// # Errors
    /// Returns error if the store cannot be read
    pub fn start_new_item(&mut self) -> Result<(), LifecycleError> {
        self.switch_context(EditingContext::New, Draft::blank())
    }

    /// Leave `error` (or any state) and reload the persisted snapshot
    ///
    /// The editing context and its id are kept. A draft whose test failed is
    /// still persisted, so it comes back ready for another attempt.
    ///
    /// # Errors
    /// Returns error if the store cannot be read
    pub fn recover(&mut self) -> Result<(), LifecycleError> {
        self.clear_draft();
        self.enter(LifecycleState::Idle)?;
        self.restore()
    }

    // ------------------------------------------------------------------
    // Assistant responses
    // ------------------------------------------------------------------

    /// Feed the text accumulated so far for the current message
    ///
    /// Partial text is never evaluated. Complete text is checked against the
    /// configured contract, parsed and normalized against the base draft.
    ///
    /// # Errors
    /// Returns error if a complete message arrives outside `idle`, or the
    /// accepted draft cannot be persisted. Rejected responses are not errors;
    /// they are reported through [`IngestOutcome::Rejected`].
    pub fn ingest(
        &mut self,
        text: &str,
        completion: Completion,
    ) -> Result<IngestOutcome, LifecycleError> {
        if completion == Completion::Partial {
            return Ok(IngestOutcome::Responding);
        }
        if self.state != LifecycleState::Idle {
            return Err(LifecycleError::invalid_state("ingest a response", self.state));
        }

        match self.evaluate(text) {
            Ok(normalized) => self.accept(normalized),
            Err(error) => self.reject(error),
        }
    }

    fn evaluate(&self, text: &str) -> Result<NormalizedDraft, EngineError> {
        validate_contract(self.config.contract, text).into_result()?;

        let values = parse_candidates(text);
        tracing::debug!(candidates = values.len(), "parsed response candidates");

        let mut best: Option<NormalizeError> = None;
        for value in &values {
            match normalize(value, &self.base_draft, self.config.logic_variant) {
                Ok(normalized) => return Ok(normalized),
                Err(error) => {
                    // an error about an actual api_draft beats "wrong type"
                    let replace = match &best {
                        None => true,
                        Some(NormalizeError::NotApiDraft(_)) => {
                            !matches!(error, NormalizeError::NotApiDraft(_))
                        }
                        Some(_) => false,
                    };
                    if replace {
                        best = Some(error);
                    }
                }
            }
        }

        Err(match best {
            Some(error) => error.into(),
            None => ParseError::NoJson {
                expected: self.config.contract.unwrap_or(ContractExpectation::ApiDraft),
            }
            .into(),
        })
    }

    fn accept(&mut self, normalized: NormalizedDraft) -> Result<IngestOutcome, LifecycleError> {
        validate_transition(self.state, LifecycleState::DraftReady)?;
        let snapshot = serde_json::to_string(&normalized.draft)?;
        self.store.set(&self.keys.draft, &snapshot)?;

        self.draft = Some(normalized.draft);
        self.notes = normalized.notes;
        self.test_ok = None;
        self.last_dry_run = None;
        self.revision += 1;
        self.report.clear();
        self.enter(LifecycleState::DraftReady)?;

        let changes = self.changes();
        tracing::info!(mode = ?normalized.mode, changes = changes.len(), "draft accepted");
        Ok(IngestOutcome::DraftReady {
            mode: normalized.mode,
            changes,
        })
    }

    fn reject(&mut self, error: EngineError) -> Result<IngestOutcome, LifecycleError> {
        tracing::warn!(%error, "response rejected");
        self.fail(&error)?;
        Ok(IngestOutcome::Rejected(error))
    }

    // ------------------------------------------------------------------
    // Preview
    // ------------------------------------------------------------------

    /// Pretty JSON of the current draft; enters `previewing`
    ///
    /// # Errors
    /// Returns error if there is no draft or the current state cannot preview
    pub fn preview(&mut self) -> Result<String, LifecycleError> {
        let draft = self.draft.as_ref().ok_or(LifecycleError::NoDraft)?;
        let rendered = serde_json::to_string_pretty(draft)?;
        let origin = self.state;
        self.enter(LifecycleState::Previewing)?;
        self.preview_origin = Some(origin);
        Ok(rendered)
    }

    /// Return to the state the preview was opened from
    ///
    /// # Errors
    /// Returns error if no preview is open
    pub fn close_preview(&mut self) -> Result<(), LifecycleError> {
        if self.state != LifecycleState::Previewing {
            return Err(LifecycleError::invalid_state("close a preview", self.state));
        }
        let origin = self
            .preview_origin
            .take()
            .ok_or_else(|| LifecycleError::invalid_state("close a preview", self.state))?;
        self.enter(origin)
    }

    // ------------------------------------------------------------------
    // Dry-run
    // ------------------------------------------------------------------

    /// Validate the draft and start a dry-run
    ///
    /// Shape validation runs first, then the SQL guard for SQL logic when
    /// enabled. A failure moves to `error` and clears the draft.
    ///
    /// # Errors
    /// Returns error if a test is already running, the state is not
    /// `draft_ready`, there is no draft, or validation fails
    pub fn begin_test(&mut self, params: Value) -> Result<TestTicket, LifecycleError> {
        if self.test_in_flight {
            return Err(LifecycleError::TestInFlight);
        }
        if self.state != LifecycleState::DraftReady {
            return Err(LifecycleError::invalid_state("test", self.state));
        }
        let draft = self.draft.clone().ok_or(LifecycleError::NoDraft)?;

        let report = match self.guard(&draft) {
            Ok(report) => report,
            Err(error) => {
                tracing::warn!(%error, "draft failed validation before test");
                self.fail(&error)?;
                self.store.remove(&self.keys.draft)?;
                return Err(error.into());
            }
        };

        self.enter(LifecycleState::Testing)?;
        self.report = report;
        self.test_in_flight = true;

        Ok(TestTicket {
            request: DryRunRequest::for_draft(&draft, params),
            context_id: self.context_id,
            revision: self.revision,
        })
    }

    fn guard(&self, draft: &Draft) -> Result<ValidationResult, EngineError> {
        let value = draft.to_value().map_err(|e| {
            EngineError::ShapeValidation(dce_contract::ShapeError::Invalid(e.to_string()))
        })?;
        validate_shape(&value, self.config.logic_variant)?;

        match &draft.logic {
            Logic::Sql { query, .. } if self.config.enforce_sql_safety => {
                let report = validate_sql(query);
                if report.ok {
                    Ok(report)
                } else {
                    Err(EngineError::SqlSafety(report.errors))
                }
            }
            _ => Ok(ValidationResult::pass()),
        }
    }

    /// Apply a dry-run result
    ///
    /// A ticket from an earlier context or draft revision is discarded.
    pub fn finish_test(
        &mut self,
        ticket: TestTicket,
        result: Result<DryRunResponse, CollaboratorError>,
    ) -> TestResolution {
        if ticket.context_id != self.context_id
            || ticket.revision != self.revision
            || self.state != LifecycleState::Testing
        {
            tracing::warn!(ticket_context = %ticket.context_id, context = %self.context_id, "discarding stale test result");
            return TestResolution::Discarded;
        }
        self.test_in_flight = false;

        match result {
            Ok(response) => {
                tracing::info!(rows = response.row_count, duration_ms = response.duration_ms, "test passed");
                self.test_ok = Some(true);
                self.last_dry_run = Some(response);
                self.settle(LifecycleState::DraftReady);
                TestResolution::Passed
            }
            Err(error) => {
                let error = EngineError::Network(error);
                tracing::info!(%error, "test failed");
                self.test_ok = Some(false);
                self.last_dry_run = None;
                for message in error.messages() {
                    self.report.error(message);
                }
                self.settle(LifecycleState::Error);
                TestResolution::Failed
            }
        }
    }

    /// Validate, dry-run through `runner`, and apply the result
    ///
    /// # Errors
    /// Returns error if the test cannot be started
    pub async fn run_test(
        &mut self,
        runner: &dyn DryRunner,
        params: Value,
    ) -> Result<TestResolution, LifecycleError> {
        let ticket = self.begin_test(params)?;
        let result = runner.run(&ticket.request).await;
        Ok(self.finish_test(ticket, result))
    }

    // ------------------------------------------------------------------
    // Form
    // ------------------------------------------------------------------

    /// Copy the draft into the live form
    ///
    /// The normalized snapshot becomes both the applied baseline and the
    /// base draft, and is persisted under the applied key.
    ///
    /// # Errors
    /// Returns error if there is no draft, the state cannot apply, or the
    /// snapshot cannot be persisted
    pub fn apply_to_form(&mut self) -> Result<Draft, LifecycleError> {
        let snapshot = self
            .draft
            .as_ref()
            .ok_or(LifecycleError::NoDraft)?
            .normalized();
        validate_transition(self.state, LifecycleState::Applied)?;
        self.store
            .set(&self.keys.applied, &serde_json::to_string(&snapshot)?)?;

        self.applied_baseline = Some(snapshot.clone());
        self.base_draft = snapshot.clone();
        self.preview_origin = None;
        self.enter(LifecycleState::Applied)?;
        Ok(snapshot)
    }

    /// Record the form's current definition
    ///
    /// A snapshot that no longer matches the applied baseline moves an
    /// applied draft to `outdated`, including one being previewed, which
    /// closes the preview.
    ///
    /// # Errors
    /// Returns error if the transition is rejected
    pub fn observe_form(&mut self, snapshot: Draft) -> Result<(), LifecycleError> {
        let drifted = self
            .applied_baseline
            .as_ref()
            .is_some_and(|baseline| snapshot.normalized() != *baseline);
        self.base_draft = snapshot;
        if !drifted {
            return Ok(());
        }

        match self.state {
            LifecycleState::Applied => self.enter(LifecycleState::Outdated),
            LifecycleState::Previewing
                if self.preview_origin == Some(LifecycleState::Applied) =>
            {
                self.enter(LifecycleState::Outdated)?;
                self.preview_origin = None;
                Ok(())
            }
            _ => Ok(()),
        }
    }

    // ------------------------------------------------------------------
    // Save
    // ------------------------------------------------------------------

    /// Start saving the draft
    ///
    /// # Errors
    /// Returns error if a save is already running, the state is not
    /// `draft_ready`, the draft has no passing test, or it cannot be
    /// serialized
    pub fn begin_save(&mut self) -> Result<SaveTicket, LifecycleError> {
        if self.save_in_flight {
            return Err(LifecycleError::SaveInFlight);
        }
        if self.state != LifecycleState::DraftReady {
            return Err(LifecycleError::invalid_state("save", self.state));
        }
        if self.test_ok != Some(true) {
            return Err(LifecycleError::TestRequired);
        }
        let draft = self.draft.clone().ok_or(LifecycleError::NoDraft)?;

        let payload = FinalizedPayload {
            id: self.context.entity_id().map(str::to_string),
            draft,
        };
        let body = serde_json::to_string(&payload)?;
        let snapshot = serde_json::to_string(&payload.draft)?;
        self.save_in_flight = true;

        Ok(SaveTicket {
            payload,
            body,
            context_id: self.context_id,
            revision: self.revision,
            snapshot,
            keys: self.keys.clone(),
        })
    }

    /// Apply a save result
    ///
    /// The storage step always runs against the ticket's own context, even
    /// when the user has moved on: a server success clears that context's
    /// fallback and snapshot, a server failure writes the payload bytes to
    /// its finalized key. A ticket from another context or an earlier draft
    /// revision never changes the current state, and leaves a draft
    /// snapshot alone once a newer draft has replaced it.
    ///
    /// # Errors
    /// Returns error if the fallback write fails
    pub fn finish_save(
        &mut self,
        ticket: SaveTicket,
        result: Result<String, CollaboratorError>,
    ) -> Result<SaveReceipt, LifecycleError> {
        let current = ticket.context_id == self.context_id && ticket.revision == self.revision;
        if current {
            self.save_in_flight = false;
        } else {
            tracing::warn!(ticket_context = %ticket.context_id, context = %self.context_id, "save completed for a superseded draft");
        }

        let receipt = match result {
            Ok(entity_id) => {
                if let Err(error) = self.store.remove(&ticket.keys.finalized) {
                    tracing::warn!(%error, key = %ticket.keys.finalized, "failed to clear local fallback");
                }
                if let Err(error) = self.clear_saved_snapshot(&ticket, current) {
                    tracing::warn!(%error, key = %ticket.keys.draft, "failed to clear saved draft");
                }
                tracing::info!(entity_id = %entity_id, "draft saved to server");
                SaveReceipt {
                    target: SaveTarget::Server,
                    entity_id: Some(entity_id),
                    fallback_key: None,
                    error: None,
                }
            }
            Err(error) => {
                if let Err(store_error) = self.store.set(&ticket.keys.finalized, &ticket.body) {
                    tracing::warn!(%store_error, %error, "save fallback failed");
                    if current {
                        self.report.error(format!("Save failed: {error}"));
                        self.report.error(format!("Local fallback failed: {store_error}"));
                        self.settle(LifecycleState::Error);
                    }
                    return Err(store_error.into());
                }
                tracing::warn!(%error, key = %ticket.keys.finalized, "server save failed, draft kept locally");
                if current {
                    self.report
                        .warn(format!("Saved locally; server save failed: {error}"));
                }
                SaveReceipt {
                    target: SaveTarget::Local,
                    entity_id: None,
                    fallback_key: Some(ticket.keys.finalized.clone()),
                    error: Some(error),
                }
            }
        };

        if current && self.state == LifecycleState::DraftReady {
            self.enter(LifecycleState::Saved)?;
        }
        Ok(receipt)
    }

    /// Remove the ticket's draft snapshot unless a newer draft took its place
    fn clear_saved_snapshot(&self, ticket: &SaveTicket, current: bool) -> Result<(), StoreError> {
        if !current {
            let stored = self.store.get(&ticket.keys.draft)?;
            if stored.as_deref() != Some(ticket.snapshot.as_str()) {
                tracing::debug!(key = %ticket.keys.draft, "draft snapshot was replaced, keeping it");
                return Ok(());
            }
        }
        self.store.remove(&ticket.keys.draft)
    }

    /// Save through `saver` with local fallback
    ///
    /// # Errors
    /// Returns error if the save cannot be started or the fallback fails
    pub async fn run_save(&mut self, saver: &dyn DraftSaver) -> Result<SaveReceipt, LifecycleError> {
        let ticket = self.begin_save()?;
        let result = saver.save(&ticket.payload).await;
        self.finish_save(ticket, result)
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Changes of the current draft against the base draft
    #[must_use]
    pub fn changes(&self) -> Vec<String> {
        self.draft
            .as_ref()
            .map(|draft| diff(draft, &self.base_draft))
            .unwrap_or_default()
    }

    /// Current lifecycle state
    #[inline]
    #[must_use]
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Current draft, if any
    #[inline]
    #[must_use]
    pub fn draft(&self) -> Option<&Draft> {
        self.draft.as_ref()
    }

    /// Definition currently in the form
    #[inline]
    #[must_use]
    pub fn base_draft(&self) -> &Draft {
        &self.base_draft
    }

    /// Snapshot last applied to the form
    #[inline]
    #[must_use]
    pub fn applied_baseline(&self) -> Option<&Draft> {
        self.applied_baseline.as_ref()
    }

    /// `None` until the current draft has been tested
    #[inline]
    #[must_use]
    pub fn test_ok(&self) -> Option<bool> {
        self.test_ok
    }

    /// Errors and warnings for the current draft
    #[inline]
    #[must_use]
    pub fn report(&self) -> &ValidationResult {
        &self.report
    }

    /// Assistant notes attached to the current draft
    #[inline]
    #[must_use]
    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    /// Item being edited
    #[inline]
    #[must_use]
    pub fn context(&self) -> &EditingContext {
        &self.context
    }

    /// Id of the current context activation
    #[inline]
    #[must_use]
    pub fn context_id(&self) -> ContextId {
        self.context_id
    }

    /// Storage keys of the current context
    #[inline]
    #[must_use]
    pub fn keys(&self) -> &StorageKeys {
        &self.keys
    }

    /// Last successful dry-run
    #[inline]
    #[must_use]
    pub fn last_dry_run(&self) -> Option<&DryRunResponse> {
        self.last_dry_run.as_ref()
    }

    /// Engine configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn enter(&mut self, to: LifecycleState) -> Result<(), LifecycleError> {
        validate_transition(self.state, to)?;
        if self.state != to {
            tracing::info!(from = %self.state, to = %to, context = %self.context, "lifecycle transition");
        }
        self.state = to;
        Ok(())
    }

    /// Transition known to be legal from the current state
    fn settle(&mut self, to: LifecycleState) {
        if let Err(error) = self.enter(to) {
            tracing::error!(%error, "lifecycle transition rejected");
        }
    }

    fn clear_draft(&mut self) {
        self.draft = None;
        self.notes = None;
        self.test_ok = None;
        self.last_dry_run = None;
        self.preview_origin = None;
        self.test_in_flight = false;
        self.save_in_flight = false;
        self.revision += 1;
        self.report.clear();
    }

    /// Record `error`, drop the draft and enter `error`
    fn fail(&mut self, error: &EngineError) -> Result<(), LifecycleError> {
        self.enter(LifecycleState::Error)?;
        self.draft = None;
        self.notes = None;
        self.test_ok = Some(false);
        self.revision += 1;
        self.report.clear();
        for message in error.messages() {
            self.report.error(message);
        }
        Ok(())
    }

    fn restore(&mut self) -> Result<(), LifecycleError> {
        if let Some(raw) = self.store.get(&self.keys.applied)? {
            self.applied_baseline = serde_json::from_str(&raw).ok();
        }

        let Some(raw) = self.store.get(&self.keys.draft)? else {
            return Ok(());
        };
        let restored = serde_json::from_str::<Value>(&raw)
            .map_err(|e| StoreError::Corrupt(e.to_string()))
            .and_then(|value| {
                validate_shape(&value, self.config.logic_variant)
                    .map_err(|e| StoreError::Corrupt(e.to_string()))
            });

        match restored {
            Ok(draft) => {
                self.enter(LifecycleState::DraftReady)?;
                self.draft = Some(draft);
                tracing::debug!(key = %self.keys.draft, "restored draft snapshot");
            }
            Err(error) => {
                tracing::warn!(%error, key = %self.keys.draft, "discarding unusable draft snapshot");
                self.store.remove(&self.keys.draft)?;
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for DraftController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DraftController")
            .field("context", &self.context)
            .field("context_id", &self.context_id)
            .field("state", &self.state)
            .field("revision", &self.revision)
            .field("test_ok", &self.test_ok)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryDraftStore;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const REPLACE: &str = r#"{"type":"api_draft","mode":"replace","draft":{"api_name":"Users","method":"GET","endpoint":"/api-manager/users","logic":{"type":"sql","query":"SELECT id FROM users"}}}"#;

    fn controller() -> (DraftController, Arc<MemoryDraftStore>) {
        let store = Arc::new(MemoryDraftStore::new());
        let controller = DraftController::new(EngineConfig::new(), store.clone());
        (controller, store)
    }

    #[test]
    fn partial_text_is_ignored() {
        let (mut ctl, _) = controller();
        let outcome = ctl.ingest("{\"type\": \"api_dr", Completion::Partial).unwrap();
        assert_eq!(outcome, IngestOutcome::Responding);
        assert_eq!(ctl.state(), LifecycleState::Idle);
        assert!(ctl.report().ok);
    }

    #[test]
    fn complete_text_outside_idle_is_refused() {
        let (mut ctl, _) = controller();
        ctl.ingest(REPLACE, Completion::Complete).unwrap();
        let err = ctl.ingest(REPLACE, Completion::Complete).unwrap_err();
        assert_eq!(
            err,
            LifecycleError::invalid_state("ingest a response", LifecycleState::DraftReady)
        );
    }

    #[test]
    fn accepted_draft_is_persisted() {
        let (mut ctl, store) = controller();
        ctl.ingest(REPLACE, Completion::Complete).unwrap();
        assert!(store.get("api-manager:draft:new").unwrap().is_some());

        ctl.send_message().unwrap();
        assert_eq!(store.get("api-manager:draft:new").unwrap(), None);
        assert_eq!(ctl.draft(), None);
    }

    #[test]
    fn rejection_clears_draft() {
        let (mut ctl, _) = controller();
        let outcome = ctl.ingest("Sorry, I cannot help with that.", Completion::Complete).unwrap();
        assert!(matches!(outcome, IngestOutcome::Rejected(EngineError::Parse(_))));
        assert_eq!(ctl.state(), LifecycleState::Error);
        assert_eq!(ctl.test_ok(), Some(false));
        assert!(!ctl.report().ok);
    }

    #[test]
    fn preview_returns_to_origin() {
        let (mut ctl, _) = controller();
        ctl.ingest(REPLACE, Completion::Complete).unwrap();

        let json = ctl.preview().unwrap();
        assert!(json.contains("\"api_name\": \"Users\""));
        assert_eq!(ctl.state(), LifecycleState::Previewing);

        ctl.close_preview().unwrap();
        assert_eq!(ctl.state(), LifecycleState::DraftReady);
        assert!(ctl.close_preview().is_err());
    }

    #[test]
    fn blocked_sql_clears_draft() {
        let (mut ctl, store) = controller();
        let text = REPLACE.replace("SELECT id FROM users", "DELETE FROM users");
        ctl.ingest(&text, Completion::Complete).unwrap();

        let err = ctl.begin_test(json!({})).unwrap_err();
        assert!(matches!(
            err,
            LifecycleError::Engine(EngineError::SqlSafety(_))
        ));
        assert_eq!(ctl.state(), LifecycleState::Error);
        assert_eq!(ctl.draft(), None);
        assert!(ctl.report().errors.contains(&"DELETE not allowed".to_string()));
        assert_eq!(store.get("api-manager:draft:new").unwrap(), None);
    }

    #[test]
    fn sql_guard_can_be_disabled() {
        let store = Arc::new(MemoryDraftStore::new());
        let mut ctl = DraftController::new(EngineConfig::new().with_sql_safety(false), store);
        let text = REPLACE.replace("SELECT id FROM users", "DELETE FROM users");
        ctl.ingest(&text, Completion::Complete).unwrap();
        assert!(ctl.begin_test(Value::Null).is_ok());
    }

    #[test]
    fn failed_test_keeps_draft_and_recovers() {
        let (mut ctl, _) = controller();
        ctl.ingest(REPLACE, Completion::Complete).unwrap();

        let ticket = ctl.begin_test(Value::Null).unwrap();
        let resolution = ctl.finish_test(ticket, Err(CollaboratorError::network("timeout")));
        assert_eq!(resolution, TestResolution::Failed);
        assert_eq!(ctl.state(), LifecycleState::Error);
        assert!(ctl.draft().is_some());
        assert_eq!(ctl.begin_save().unwrap_err(), LifecycleError::invalid_state("save", LifecycleState::Error));

        ctl.recover().unwrap();
        assert_eq!(ctl.state(), LifecycleState::DraftReady);
        assert_eq!(ctl.test_ok(), None);
    }

    #[test]
    fn apply_then_edit_marks_outdated() {
        let (mut ctl, store) = controller();
        ctl.ingest(REPLACE, Completion::Complete).unwrap();

        let applied = ctl.apply_to_form().unwrap();
        assert_eq!(ctl.state(), LifecycleState::Applied);
        assert!(ctl.changes().is_empty());
        assert!(store.get("api-manager:applied:new").unwrap().is_some());

        // whitespace-only edits do not count
        let mut same = applied.clone();
        same.api_name = format!("  {}  ", same.api_name);
        ctl.observe_form(same).unwrap();
        assert_eq!(ctl.state(), LifecycleState::Applied);

        let mut edited = applied;
        edited.endpoint = "/users/v2".into();
        ctl.observe_form(edited).unwrap();
        assert_eq!(ctl.state(), LifecycleState::Outdated);

        ctl.apply_to_form().unwrap();
        assert_eq!(ctl.state(), LifecycleState::Applied);
    }

    #[test]
    fn edit_during_applied_preview_marks_outdated() {
        let (mut ctl, _) = controller();
        ctl.ingest(REPLACE, Completion::Complete).unwrap();
        let mut edited = ctl.apply_to_form().unwrap();

        ctl.preview().unwrap();
        edited.api_name = "People".into();
        ctl.observe_form(edited).unwrap();

        assert_eq!(ctl.state(), LifecycleState::Outdated);
        assert_eq!(ctl.base_draft().api_name, "People");
        assert!(ctl.close_preview().is_err());
    }

    #[test]
    fn edit_during_draft_preview_stays_in_preview() {
        let (mut ctl, _) = controller();
        ctl.ingest(REPLACE, Completion::Complete).unwrap();
        ctl.preview().unwrap();

        let mut edited = Draft::blank();
        edited.api_name = "People".into();
        ctl.observe_form(edited).unwrap();

        assert_eq!(ctl.state(), LifecycleState::Previewing);
        ctl.close_preview().unwrap();
        assert_eq!(ctl.state(), LifecycleState::DraftReady);
    }

    #[test]
    fn switch_context_reloads_snapshot() {
        let (mut ctl, store) = controller();
        ctl.switch_context(EditingContext::Existing("7".into()), Draft::blank())
            .unwrap();
        ctl.ingest(REPLACE, Completion::Complete).unwrap();
        let first_id = ctl.context_id();

        ctl.start_new_item().unwrap();
        assert_eq!(ctl.state(), LifecycleState::Idle);
        assert!(store.get("api-manager:draft:id:7").unwrap().is_some());

        ctl.switch_context(EditingContext::Existing("7".into()), Draft::blank())
            .unwrap();
        assert_eq!(ctl.state(), LifecycleState::DraftReady);
        assert_eq!(ctl.draft().unwrap().api_name, "Users");
        assert_ne!(ctl.context_id(), first_id);
    }

    #[test]
    fn unusable_snapshot_is_discarded() {
        let store = Arc::new(MemoryDraftStore::new());
        store.set("api-manager:draft:new", "{\"api_name\": \"\"}").unwrap();
        let ctl = DraftController::open(
            EngineConfig::new(),
            store.clone(),
            EditingContext::New,
            Draft::blank(),
        )
        .unwrap();
        assert_eq!(ctl.state(), LifecycleState::Idle);
        assert!(store.is_empty());
    }
}
