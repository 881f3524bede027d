//! Patch operations and the paths they address
//!
//! Provides [`PatchOperation`] (a minimal JSON-Patch-like record) and
//! [`PatchPath`] for addressing a location inside a draft.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// The only operation the applicator acts on
pub const REPLACE_OP: &str = "replace";

/// Single patch operation
///
/// `op` is kept as raw text so that operations the applicator does not
/// support still deserialize and can be skipped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchOperation {
    /// Operation name
    pub op: String,
    /// `/`-delimited target path
    pub path: String,
    /// Value to assign
    #[serde(default)]
    pub value: Value,
}

impl PatchOperation {
    /// Build a `replace` operation
    #[must_use]
    pub fn replace(path: impl Into<String>, value: Value) -> Self {
        Self {
            op: REPLACE_OP.to_string(),
            path: path.into(),
            value,
        }
    }

    /// Whether this is a `replace`
    #[inline]
    #[must_use]
    pub fn is_replace(&self) -> bool {
        self.op == REPLACE_OP
    }

    /// Parsed target path
    #[inline]
    #[must_use]
    pub fn target(&self) -> PatchPath {
        PatchPath::parse(&self.path)
    }
}

/// One step of a patch path
///
/// A segment made only of ASCII digits is an array index. An object key that
/// happens to look numeric cannot be told apart from an index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Array position
    Index(usize),
    /// Object property
    Key(String),
}

impl Segment {
    fn classify(raw: &str) -> Self {
        if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(index) = raw.parse() {
                return Self::Index(index);
            }
        }
        Self::Key(raw.to_string())
    }
}

impl Display for Segment {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(i) => write!(f, "{i}"),
            Self::Key(k) => f.write_str(k),
        }
    }
}

/// Path within a draft tree
///
/// # Examples
/// - `/logic/query` → `[Key("logic"), Key("query")]`
/// - `/tags/0` → `[Key("tags"), Index(0)]`
/// - `//logic//` → `[Key("logic")]` (empty segments are discarded)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct PatchPath(Vec<Segment>);

impl PatchPath {
    /// Parse a `/`-delimited path, discarding empty segments
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        Self(
            raw.split('/')
                .filter(|s| !s.is_empty())
                .map(Segment::classify)
                .collect(),
        )
    }

    /// Path segments
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    /// Number of segments
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the path has no segments
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Segments leading to the target, and the target itself
    #[inline]
    #[must_use]
    pub fn split_last(&self) -> Option<(&Segment, &[Segment])> {
        self.0.split_last()
    }
}

impl FromStr for PatchPath {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl Display for PatchPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("/");
        }
        for segment in &self.0 {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn parse_discards_empty_segments() {
        let path = PatchPath::parse("//logic//query/");
        assert_eq!(
            path.segments(),
            &[Segment::Key("logic".into()), Segment::Key("query".into())]
        );
        assert_eq!(path.to_string(), "/logic/query");
    }

    #[test]
    fn digits_become_indices() {
        let path = PatchPath::parse("/tags/0/x1/-1");
        assert_eq!(
            path.segments(),
            &[
                Segment::Key("tags".into()),
                Segment::Index(0),
                Segment::Key("x1".into()),
                Segment::Key("-1".into()),
            ]
        );
    }

    #[test]
    fn empty_path_has_no_segments() {
        assert!(PatchPath::parse("").is_empty());
        assert!(PatchPath::parse("///").is_empty());
        assert_eq!(PatchPath::default().to_string(), "/");
    }

    #[test]
    fn operation_value_defaults_to_null() {
        let op: PatchOperation =
            serde_json::from_value(json!({"op": "remove", "path": "/tags/0"})).unwrap();
        assert!(!op.is_replace());
        assert_eq!(op.value, Value::Null);
    }

    #[test]
    fn replace_constructor() {
        let op = PatchOperation::replace("/logic/query", json!("SELECT 2"));
        assert!(op.is_replace());
        assert_eq!(op.target().len(), 2);
    }
}
