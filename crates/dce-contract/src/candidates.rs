//! JSON candidate parsing
//!
//! Collects every JSON value that can be recovered from an assistant
//! response, whether the response is bare JSON, fenced JSON, or JSON buried
//! in prose.

use crate::scanner::extract_candidates;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static CODE_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)```(?:json)?").expect("valid code fence regex"));

/// Parse `text` as JSON directly, without any recovery
#[inline]
#[must_use]
pub fn try_parse_json(text: &str) -> Option<Value> {
    serde_json::from_str(text.trim()).ok()
}

/// Remove markdown code-fence markers (```` ```json ```` and ```` ``` ````)
#[must_use]
pub fn strip_code_fences(text: &str) -> String {
    CODE_FENCE.replace_all(text, "").into_owned()
}

/// Every JSON value recoverable from `text`, in discovery order
///
/// Two bases are tried, the fence-stripped text first and then the raw
/// text. For each, a direct parse is attempted before the scanner
/// candidates. The same value may be reported more than once.
#[must_use]
pub fn parse_candidates(text: &str) -> Vec<Value> {
    let stripped = strip_code_fences(text);
    let mut values = Vec::new();

    for base in [stripped.as_str(), text] {
        if let Some(value) = try_parse_json(base) {
            values.push(value);
        }
        values.extend(
            extract_candidates(base)
                .iter()
                .filter_map(|candidate| try_parse_json(candidate)),
        );
    }

    values
}
