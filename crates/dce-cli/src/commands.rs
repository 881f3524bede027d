//! Subcommand implementations
//!
//! Each command writes its report to `out` and returns whether it succeeded,
//! which `main` turns into the exit code.

use crate::file_store::FileDraftStore;
use anyhow::Context;
use dce_contract::{extract_candidates, validate_contract, validate_sql};
use dce_delta::{describe, diff};
use dce_lifecycle::{
    Completion, DraftController, DraftStore, EditingContext, EngineConfig, IngestOutcome,
    MemoryDraftStore,
};
use dce_model::{ContractExpectation, Draft};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

/// Contract check of assistant text
pub fn check(contract: ContractExpectation, text: &str, out: &mut impl Write) -> anyhow::Result<bool> {
    let check = validate_contract(Some(contract), text);
    match &check.reason {
        None => writeln!(out, "ok: response satisfies {contract}")?,
        Some(reason) => writeln!(out, "error: {reason}")?,
    }
    Ok(check.ok)
}

/// Every JSON candidate, one per line
pub fn extract(text: &str, out: &mut impl Write) -> anyhow::Result<bool> {
    let candidates = extract_candidates(text);
    for candidate in &candidates {
        writeln!(out, "{candidate}")?;
    }
    Ok(!candidates.is_empty())
}

/// SQL guard report
pub fn sql(query: &str, out: &mut impl Write) -> anyhow::Result<bool> {
    let result = validate_sql(query);
    for error in &result.errors {
        writeln!(out, "error: {error}")?;
    }
    for warning in &result.warnings {
        writeln!(out, "warning: {warning}")?;
    }
    if result.ok {
        writeln!(out, "ok")?;
    }
    Ok(result.ok)
}

/// Change list between two draft files
pub fn diff_files(draft: &Path, baseline: &Path, out: &mut impl Write) -> anyhow::Result<bool> {
    let draft = read_draft(draft)?;
    let baseline = read_draft(baseline)?;
    writeln!(out, "{}", describe(&diff(&draft, &baseline)))?;
    Ok(true)
}

/// Options for [`ingest`]
#[derive(Debug, Clone, Default)]
pub struct IngestOptions {
    /// Definition currently in the form; blank when absent
    pub base: Option<Draft>,
    /// Context whose storage keys are used
    pub context: EditingContext,
    /// File store to persist into; in-memory when absent
    pub store: Option<std::path::PathBuf>,
}

/// Run one complete message through a controller
pub fn ingest(
    config: EngineConfig,
    text: &str,
    options: IngestOptions,
    out: &mut impl Write,
) -> anyhow::Result<bool> {
    let store: Arc<dyn DraftStore> = match &options.store {
        Some(path) => Arc::new(
            FileDraftStore::open(path)
                .with_context(|| format!("opening store {}", path.display()))?,
        ),
        None => Arc::new(MemoryDraftStore::new()),
    };
    let base = options.base.unwrap_or_else(Draft::blank);

    let mut controller = DraftController::open(config, store, options.context, base)?;
    controller.send_message()?;
    let outcome = controller.ingest(text, Completion::Complete)?;

    writeln!(out, "state: {}", controller.state())?;
    match outcome {
        IngestOutcome::DraftReady { mode, changes } => {
            writeln!(out, "mode: {mode:?}")?;
            if let Some(notes) = controller.notes() {
                writeln!(out, "notes: {notes}")?;
            }
            if let Some(draft) = controller.draft() {
                writeln!(out, "{}", serde_json::to_string_pretty(draft)?)?;
            }
            writeln!(out, "changes:\n{}", describe(&changes))?;
            Ok(true)
        }
        IngestOutcome::Rejected(error) => {
            tracing::debug!(%error, "ingest rejected");
            for message in &controller.report().errors {
                writeln!(out, "error: {message}")?;
            }
            Ok(false)
        }
        IngestOutcome::Responding => Ok(false),
    }
}

/// Read and validate a draft file
pub fn read_draft(path: &Path) -> anyhow::Result<Draft> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let value: serde_json::Value =
        serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
    let draft = dce_contract::validate_shape(&value, dce_model::LogicVariant::Extended)
        .with_context(|| format!("validating {}", path.display()))?;
    Ok(draft)
}
