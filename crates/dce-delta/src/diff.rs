//! Field-level draft diffs
//!
//! Produces one human-readable line per changed field, always in the order
//! name, method, endpoint, description, tags, logic.

use dce_model::{Draft, Logic};

/// Placeholder shown when a diff is empty
pub const NO_CHANGES: &str = "No changes";

/// Describe how `draft` differs from `baseline`
///
/// An empty list means the drafts agree on every compared field.
#[must_use]
pub fn diff(draft: &Draft, baseline: &Draft) -> Vec<String> {
    let mut changes = Vec::new();

    if draft.api_name != baseline.api_name {
        changes.push(format!(
            "Name changed: \"{}\" -> \"{}\"",
            baseline.api_name, draft.api_name
        ));
    }
    if draft.method != baseline.method {
        changes.push(format!(
            "Method changed: {} -> {}",
            baseline.method, draft.method
        ));
    }
    if draft.endpoint != baseline.endpoint {
        changes.push(format!(
            "Endpoint changed: {} -> {}",
            display_or_none(&baseline.endpoint),
            display_or_none(&draft.endpoint)
        ));
    }
    if draft.description != baseline.description {
        changes.push("Description updated".to_string());
    }

    let tags = draft.tags.join(",");
    let baseline_tags = baseline.tags.join(",");
    if tags != baseline_tags {
        changes.push(format!(
            "Tags changed: {} -> {}",
            display_or_none(&baseline_tags),
            display_or_none(&tags)
        ));
    }

    if let Some(change) = logic_change(&draft.logic, &baseline.logic) {
        changes.push(change);
    }

    changes
}

/// Render a change list, substituting [`NO_CHANGES`] when empty
#[must_use]
pub fn describe(changes: &[String]) -> String {
    if changes.is_empty() {
        NO_CHANGES.to_string()
    } else {
        changes.join("\n")
    }
}

fn logic_change(logic: &Logic, baseline: &Logic) -> Option<String> {
    match (logic, baseline) {
        (Logic::Sql { query, .. }, Logic::Sql { query: old, .. }) => {
            (query != old).then(|| "Logic query updated".to_string())
        }
        (Logic::Http { spec, .. }, Logic::Http { spec: old, .. }) => {
            (spec != old).then(|| "HTTP spec updated".to_string())
        }
        _ => Some(format!(
            "Logic type changed: {} -> {}",
            baseline.kind(),
            logic.kind()
        )),
    }
}

fn display_or_none(value: &str) -> &str {
    if value.is_empty() {
        "(none)"
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dce_model::{HttpMethod, HttpSpec};
    use pretty_assertions::assert_eq;

    fn base() -> Draft {
        let mut draft = Draft::blank();
        draft.api_name = "Users".into();
        draft.endpoint = "/api-manager/users".into();
        draft.logic = Logic::Sql {
            query: "SELECT 1".into(),
            timeout_ms: None,
        };
        draft
    }

    #[test]
    fn identical_drafts_have_no_changes() {
        assert!(diff(&base(), &base()).is_empty());
        assert_eq!(describe(&diff(&base(), &base())), NO_CHANGES);
    }

    #[test]
    fn query_change_is_reported_without_value() {
        let mut draft = base();
        draft.logic = Logic::Sql {
            query: "SELECT 2".into(),
            timeout_ms: None,
        };
        assert_eq!(diff(&draft, &base()), vec!["Logic query updated"]);
    }

    #[test]
    fn changes_follow_fixed_field_order() {
        let mut draft = base();
        draft.logic = Logic::Http {
            spec: HttpSpec {
                method: "GET".into(),
                url: "https://example.com".into(),
                headers: None,
                params: None,
                body: None,
            },
            timeout_ms: None,
        };
        draft.tags = vec!["a".into(), "b".into()];
        draft.description = "new".into();
        draft.endpoint = "/users".into();
        draft.method = HttpMethod::Post;
        draft.api_name = "People".into();

        assert_eq!(
            diff(&draft, &base()),
            vec![
                "Name changed: \"Users\" -> \"People\"",
                "Method changed: GET -> POST",
                "Endpoint changed: /api-manager/users -> /users",
                "Description updated",
                "Tags changed: (none) -> a,b",
                "Logic type changed: sql -> http",
            ]
        );
    }

    #[test]
    fn tag_order_matters() {
        let mut a = base();
        a.tags = vec!["x".into(), "y".into()];
        let mut b = base();
        b.tags = vec!["y".into(), "x".into()];
        assert_eq!(diff(&a, &b), vec!["Tags changed: y,x -> x,y"]);
    }

    #[test]
    fn timeout_alone_is_not_a_logic_change() {
        let mut draft = base();
        draft.logic = Logic::Sql {
            query: "SELECT 1".into(),
            timeout_ms: Some(100),
        };
        assert!(diff(&draft, &base()).is_empty());
    }

    #[test]
    fn http_spec_change() {
        let spec = |url: &str| Logic::Http {
            spec: HttpSpec {
                method: "GET".into(),
                url: url.into(),
                headers: None,
                params: None,
                body: None,
            },
            timeout_ms: None,
        };
        let mut a = base();
        a.logic = spec("https://a");
        let mut b = base();
        b.logic = spec("https://b");
        assert_eq!(diff(&a, &b), vec!["HTTP spec updated"]);
    }
}
