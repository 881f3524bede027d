//! Draft normalization and shape validation
//!
//! Turns an `api_draft` payload into a typed [`Draft`], either by taking the
//! supplied draft wholesale (`replace`) or by patching the current base
//! (`patch`). Untyped JSON is checked here once; everything downstream works
//! on [`Draft`].

use crate::error::{NormalizeError, ShapeError};
use dce_delta::apply_to_draft;
use dce_model::{Draft, LogicVariant, PatchOperation, ValidationResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Payload `type` accepted by [`normalize`]
pub const API_DRAFT_TYPE: &str = "api_draft";

/// How a payload produced its draft
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftMode {
    /// Draft supplied in full
    Replace,
    /// Draft derived by patching the base
    Patch,
}

impl DraftMode {
    fn from_payload(mode: Option<&Value>) -> Result<Self, NormalizeError> {
        match mode {
            None | Some(Value::Null) => Ok(Self::Replace),
            Some(Value::String(s)) if s == "replace" => Ok(Self::Replace),
            Some(Value::String(s)) if s == "patch" => Ok(Self::Patch),
            Some(Value::String(s)) => Err(NormalizeError::UnknownMode(s.clone())),
            Some(other) => Err(NormalizeError::UnknownMode(other.to_string())),
        }
    }
}

/// Validated draft together with how it was produced
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedDraft {
    /// Draft after replace or patch
    pub draft: Draft,
    /// How the draft was produced
    pub mode: DraftMode,
    /// Free-form assistant notes carried on the payload
    pub notes: Option<String>,
}

/// Normalize an `api_draft` payload against `base`
///
/// # Errors
/// Returns error if the payload is not an `api_draft`, its mode is unknown,
/// the draft or patch is missing, the patch cannot be applied, or the
/// resulting draft fails shape validation
pub fn normalize(
    payload: &Value,
    base: &Draft,
    variant: LogicVariant,
) -> Result<NormalizedDraft, NormalizeError> {
    let kind = payload.get("type").and_then(Value::as_str);
    if kind != Some(API_DRAFT_TYPE) {
        return Err(NormalizeError::NotApiDraft(kind.map(str::to_string)));
    }

    let mode = DraftMode::from_payload(payload.get("mode"))?;
    let draft = match mode {
        DraftMode::Replace => {
            let draft = payload
                .get("draft")
                .filter(|d| d.is_object())
                .ok_or(NormalizeError::MissingDraft)?;
            validate_shape(draft, variant)?
        }
        DraftMode::Patch => {
            let patch = payload
                .get("patch")
                .filter(|p| p.is_array())
                .ok_or(NormalizeError::MissingPatch)?;
            let ops: Vec<PatchOperation> = serde_json::from_value(patch.clone())
                .map_err(|e| NormalizeError::InvalidPatch(e.to_string()))?;
            let patched = apply_to_draft(base, &ops)?;
            validate_shape(&patched, variant)?
        }
    };

    let notes = payload
        .get("notes")
        .and_then(Value::as_str)
        .map(str::to_string);

    tracing::debug!(mode = ?mode, api_name = %draft.api_name, "normalized draft payload");
    Ok(NormalizedDraft { draft, mode, notes })
}

/// Check the required draft fields, then convert to a typed [`Draft`]
///
/// Requirements are checked in a fixed order and the first failure is
/// returned.
///
/// # Errors
/// Returns the first [`ShapeError`] encountered
pub fn validate_shape(value: &Value, variant: LogicVariant) -> Result<Draft, ShapeError> {
    if !value.is_object() {
        return Err(ShapeError::NotAnObject);
    }
    if blank(value.get("api_name")) {
        return Err(ShapeError::MissingApiName);
    }
    if value.get("method").map_or(true, Value::is_null) || blank_string(value.get("method")) {
        return Err(ShapeError::MissingMethod);
    }
    if blank(value.get("endpoint")) {
        return Err(ShapeError::MissingEndpoint);
    }

    let logic = value.get("logic");
    let logic_type = logic.and_then(|l| l.get("type")).and_then(Value::as_str);
    match (variant, logic_type) {
        (_, Some("sql")) => {
            if blank(logic.and_then(|l| l.get("query"))) {
                return Err(ShapeError::MissingQuery);
            }
        }
        (LogicVariant::SqlOnly, _) => return Err(ShapeError::SqlLogicRequired),
        (LogicVariant::Extended, Some("http")) => {
            let spec = logic.and_then(|l| l.get("spec"));
            if blank(spec.and_then(|s| s.get("url"))) {
                return Err(ShapeError::MissingHttpUrl);
            }
            if blank(spec.and_then(|s| s.get("method"))) {
                return Err(ShapeError::MissingHttpMethod);
            }
        }
        (LogicVariant::Extended, other) => {
            return Err(ShapeError::UnsupportedLogic(
                other.unwrap_or("none").to_string(),
            ));
        }
    }

    serde_json::from_value(value.clone()).map_err(|e| ShapeError::Invalid(e.to_string()))
}

/// Shape-check a typed draft, reporting into a [`ValidationResult`]
#[must_use]
pub fn validate_draft(draft: &Draft, variant: LogicVariant) -> ValidationResult {
    let value = match draft.to_value() {
        Ok(value) => value,
        Err(e) => return ValidationResult::failure(e.to_string()),
    };
    match validate_shape(&value, variant) {
        Ok(_) => ValidationResult::pass(),
        Err(e) => ValidationResult::failure(e.to_string()),
    }
}

/// Missing, not a string, or only whitespace
fn blank(value: Option<&Value>) -> bool {
    value
        .and_then(Value::as_str)
        .map_or(true, |s| s.trim().is_empty())
}

fn blank_string(value: Option<&Value>) -> bool {
    value
        .and_then(Value::as_str)
        .is_some_and(|s| s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dce_model::{HttpMethod, Logic};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn users_draft() -> Value {
        json!({
            "api_name": "Users",
            "method": "GET",
            "endpoint": "/api-manager/users",
            "logic": {"type": "sql", "query": "SELECT 1"}
        })
    }

    fn base() -> Draft {
        validate_shape(&users_draft(), LogicVariant::Extended).unwrap()
    }

    #[test]
    fn replace_payload() {
        let payload = json!({"type": "api_draft", "mode": "replace", "draft": users_draft()});
        let out = normalize(&payload, &Draft::blank(), LogicVariant::SqlOnly).unwrap();
        assert_eq!(out.mode, DraftMode::Replace);
        assert_eq!(out.draft.api_name, "Users");
        assert_eq!(out.draft.method, HttpMethod::Get);
        assert!(out.draft.is_active);
    }

    #[test]
    fn absent_mode_means_replace() {
        let payload = json!({"type": "api_draft", "draft": users_draft(), "notes": "first pass"});
        let out = normalize(&payload, &Draft::blank(), LogicVariant::Extended).unwrap();
        assert_eq!(out.mode, DraftMode::Replace);
        assert_eq!(out.notes.as_deref(), Some("first pass"));
    }

    #[test]
    fn patch_payload_changes_only_the_target() {
        let payload = json!({
            "type": "api_draft",
            "mode": "patch",
            "patch": [{"op": "replace", "path": "/logic/query", "value": "SELECT 2"}]
        });
        let out = normalize(&payload, &base(), LogicVariant::Extended).unwrap();
        assert_eq!(out.mode, DraftMode::Patch);

        let mut expected = base();
        expected.logic = Logic::Sql {
            query: "SELECT 2".into(),
            timeout_ms: None,
        };
        assert_eq!(out.draft, expected);
    }

    #[test]
    fn wrong_type_is_rejected() {
        let err = normalize(&json!({"type": "cep_draft"}), &base(), LogicVariant::Extended)
            .unwrap_err();
        assert_eq!(err, NormalizeError::NotApiDraft(Some("cep_draft".into())));
    }

    #[test]
    fn unknown_mode_is_rejected() {
        let payload = json!({"type": "api_draft", "mode": "merge", "draft": users_draft()});
        assert_eq!(
            normalize(&payload, &base(), LogicVariant::Extended).unwrap_err(),
            NormalizeError::UnknownMode("merge".into())
        );
    }

    #[test]
    fn missing_draft_and_patch() {
        let replace = json!({"type": "api_draft", "draft": null});
        let patch = json!({"type": "api_draft", "mode": "patch", "patch": {}});
        assert_eq!(
            normalize(&replace, &base(), LogicVariant::Extended).unwrap_err(),
            NormalizeError::MissingDraft
        );
        assert_eq!(
            normalize(&patch, &base(), LogicVariant::Extended).unwrap_err(),
            NormalizeError::MissingPatch
        );
    }

    #[test]
    fn malformed_patch_entries() {
        let payload = json!({"type": "api_draft", "mode": "patch", "patch": [42]});
        assert!(matches!(
            normalize(&payload, &base(), LogicVariant::Extended),
            Err(NormalizeError::InvalidPatch(_))
        ));
    }

    #[test]
    fn patch_result_is_revalidated() {
        let payload = json!({
            "type": "api_draft",
            "mode": "patch",
            "patch": [{"op": "replace", "path": "/logic/query", "value": "  "}]
        });
        assert_eq!(
            normalize(&payload, &base(), LogicVariant::Extended).unwrap_err(),
            NormalizeError::Shape(ShapeError::MissingQuery)
        );
    }

    #[test]
    fn first_failure_wins() {
        let value = json!({"api_name": " ", "endpoint": ""});
        assert_eq!(
            validate_shape(&value, LogicVariant::Extended),
            Err(ShapeError::MissingApiName)
        );
        let value = json!({"api_name": "x", "endpoint": ""});
        assert_eq!(
            validate_shape(&value, LogicVariant::Extended),
            Err(ShapeError::MissingMethod)
        );
        let value = json!({"api_name": "x", "method": "GET", "endpoint": ""});
        assert_eq!(
            validate_shape(&value, LogicVariant::Extended),
            Err(ShapeError::MissingEndpoint)
        );
    }

    #[test]
    fn sql_only_rejects_http() {
        let mut value = users_draft();
        value["logic"] = json!({"type": "http", "spec": {"method": "GET", "url": "https://x"}});
        assert_eq!(
            validate_shape(&value, LogicVariant::SqlOnly),
            Err(ShapeError::SqlLogicRequired)
        );
        assert!(validate_shape(&value, LogicVariant::Extended).is_ok());
    }

    #[test]
    fn http_requires_url_then_method() {
        let mut value = users_draft();
        value["logic"] = json!({"type": "http", "spec": {"method": "GET"}});
        assert_eq!(
            validate_shape(&value, LogicVariant::Extended),
            Err(ShapeError::MissingHttpUrl)
        );
        value["logic"] = json!({"type": "http", "spec": {"url": "https://x"}});
        assert_eq!(
            validate_shape(&value, LogicVariant::Extended),
            Err(ShapeError::MissingHttpMethod)
        );
    }

    #[test]
    fn unknown_logic_type() {
        let mut value = users_draft();
        value["logic"] = json!({"type": "python", "code": "print(1)"});
        assert_eq!(
            validate_shape(&value, LogicVariant::Extended),
            Err(ShapeError::UnsupportedLogic("python".into()))
        );
    }

    #[test]
    fn unsupported_method_is_a_shape_error() {
        let mut value = users_draft();
        value["method"] = json!("PATCH");
        assert!(matches!(
            validate_shape(&value, LogicVariant::Extended),
            Err(ShapeError::Invalid(_))
        ));
    }

    #[test]
    fn lowercase_method_is_accepted() {
        let mut value = users_draft();
        value["method"] = json!("post");
        let draft = validate_shape(&value, LogicVariant::Extended).unwrap();
        assert_eq!(draft.method, HttpMethod::Post);
    }

    #[test]
    fn typed_draft_report() {
        assert!(validate_draft(&base(), LogicVariant::SqlOnly).ok);
        let report = validate_draft(&Draft::blank(), LogicVariant::SqlOnly);
        assert_eq!(report.errors, vec!["api_name is required"]);
    }
}
