//! API drafts and their logic bodies
//!
//! A [`Draft`] is the typed form of an assistant-authored API definition.
//! Opaque JSON is converted into it once, at the shape-validation boundary,
//! so downstream code never re-checks an untyped cast.

use crate::error::ModelError;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Candidate API definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Draft {
    /// Display name of the API
    pub api_name: String,
    /// HTTP method the API is exposed under
    pub method: HttpMethod,
    /// Exposed endpoint path
    pub endpoint: String,
    /// Free-form description
    #[serde(default, deserialize_with = "nullable")]
    pub description: String,
    /// Ordered tag list
    #[serde(default, deserialize_with = "nullable")]
    pub tags: Vec<String>,
    /// Parameter schema (opaque)
    #[serde(default = "empty_object", deserialize_with = "nullable_object")]
    pub params_schema: Value,
    /// Runtime policy (opaque)
    #[serde(default = "empty_object", deserialize_with = "nullable_object")]
    pub runtime_policy: Value,
    /// Whether the API is enabled once saved
    #[serde(default = "default_active")]
    pub is_active: bool,
    /// Executable body
    pub logic: Logic,
}

impl Draft {
    /// Blank draft used as the base of a new item
    #[must_use]
    pub fn blank() -> Self {
        Self {
            api_name: String::new(),
            method: HttpMethod::Get,
            endpoint: String::new(),
            description: String::new(),
            tags: Vec::new(),
            params_schema: empty_object(),
            runtime_policy: empty_object(),
            is_active: true,
            logic: Logic::Sql {
                query: String::new(),
                timeout_ms: None,
            },
        }
    }

    /// Snapshot with surrounding whitespace removed and blank tags dropped
    ///
    /// Two drafts that only differ in incidental whitespace have equal
    /// normalized snapshots.
    #[must_use]
    pub fn normalized(&self) -> Self {
        let mut out = self.clone();
        out.api_name = out.api_name.trim().to_string();
        out.endpoint = out.endpoint.trim().to_string();
        out.description = out.description.trim().to_string();
        out.tags = out
            .tags
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();
        if let Logic::Sql { query, .. } = &mut out.logic {
            *query = query.trim().to_string();
        }
        out
    }

    /// Serialize into a JSON value
    ///
    /// # Errors
    /// Returns error if serialization fails
    pub fn to_value(&self) -> Result<Value, ModelError> {
        serde_json::to_value(self).map_err(|e| ModelError::Serialization(e.to_string()))
    }

    /// Deserialize from a JSON value
    ///
    /// # Errors
    /// Returns error if the value does not describe a draft
    pub fn from_value(value: Value) -> Result<Self, ModelError> {
        serde_json::from_value(value).map_err(|e| ModelError::InvalidDraft(e.to_string()))
    }
}

/// Method an API is exposed under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE", try_from = "String")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    /// Wire label
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl Display for HttpMethod {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "DELETE" => Ok(Self::Delete),
            _ => Err(ModelError::UnknownMethod(s.to_string())),
        }
    }
}

impl TryFrom<String> for HttpMethod {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Executable body of a draft
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Logic {
    /// Single read-only SQL statement
    Sql {
        query: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timeout_ms: Option<u64>,
    },
    /// Outbound HTTP call
    Http {
        spec: HttpSpec,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timeout_ms: Option<u64>,
    },
}

impl Logic {
    /// Variant discriminant
    #[inline]
    #[must_use]
    pub fn kind(&self) -> LogicKind {
        match self {
            Self::Sql { .. } => LogicKind::Sql,
            Self::Http { .. } => LogicKind::Http,
        }
    }

    /// Text handed to the dry-run endpoint
    ///
    /// The SQL query verbatim, or the HTTP spec as compact JSON.
    #[must_use]
    pub fn body(&self) -> String {
        match self {
            Self::Sql { query, .. } => query.clone(),
            Self::Http { spec, .. } => serde_json::to_string(spec).unwrap_or_default(),
        }
    }

    /// Configured timeout
    #[inline]
    #[must_use]
    pub fn timeout_ms(&self) -> Option<u64> {
        match self {
            Self::Sql { timeout_ms, .. } | Self::Http { timeout_ms, .. } => *timeout_ms,
        }
    }
}

/// Logic discriminant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicKind {
    Sql,
    Http,
}

impl LogicKind {
    /// Wire label
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sql => "sql",
            Self::Http => "http",
        }
    }
}

impl Display for LogicKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outbound HTTP call description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpSpec {
    /// Upstream method (any verb the upstream accepts)
    pub method: String,
    /// Upstream URL
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

/// Which logic variants a deployment accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicVariant {
    /// SQL logic only
    SqlOnly,
    /// SQL or HTTP logic
    #[default]
    Extended,
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

fn default_active() -> bool {
    true
}

fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

fn nullable_object<'de, D>(deserializer: D) -> Result<Value, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Value>::deserialize(deserializer).map(|v| match v {
        None | Some(Value::Null) => empty_object(),
        Some(other) => other,
    })
}
