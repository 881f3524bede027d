//! Engine configuration

use crate::error::ConfigError;
use crate::store::DEFAULT_PREFIX;
use dce_model::{ContractExpectation, LogicVariant};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Prefix for every persisted key
    pub storage_prefix: String,
    /// Logic variants a draft may use
    pub logic_variant: LogicVariant,
    /// Contract responses are checked against
    ///
    /// In TOML, `contract = "none"` disables the check.
    #[serde(with = "contract_setting")]
    pub contract: Option<ContractExpectation>,
    /// Run the read-only SQL guard before a dry-run
    pub enforce_sql_safety: bool,
}

impl EngineConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With storage prefix
    #[inline]
    #[must_use]
    pub fn with_storage_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.storage_prefix = prefix.into();
        self
    }

    /// With logic variant
    #[inline]
    #[must_use]
    pub fn with_logic_variant(mut self, variant: LogicVariant) -> Self {
        self.logic_variant = variant;
        self
    }

    /// With contract (`None` disables contract checks)
    #[inline]
    #[must_use]
    pub fn with_contract(mut self, contract: Option<ContractExpectation>) -> Self {
        self.contract = contract;
        self
    }

    /// With SQL guard toggle
    #[inline]
    #[must_use]
    pub fn with_sql_safety(mut self, enforce: bool) -> Self {
        self.enforce_sql_safety = enforce;
        self
    }

    /// Parse TOML; absent keys keep their defaults
    ///
    /// # Errors
    /// Returns error if the text is not valid TOML for this config
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load a TOML file
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            storage_prefix: DEFAULT_PREFIX.to_string(),
            logic_variant: LogicVariant::Extended,
            contract: Some(ContractExpectation::ApiDraft),
            enforce_sql_safety: true,
        }
    }
}

/// `Option<ContractExpectation>` as a TOML string, `"none"` for no contract
mod contract_setting {
    use dce_model::ContractExpectation;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    const DISABLED: &str = "none";

    pub(super) fn serialize<S: Serializer>(
        value: &Option<ContractExpectation>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(contract) => contract.serialize(serializer),
            None => serializer.serialize_str(DISABLED),
        }
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<ContractExpectation>, D::Error> {
        let label = String::deserialize(deserializer)?;
        if label.trim() == DISABLED {
            return Ok(None);
        }
        label.parse().map(Some).map_err(serde::de::Error::custom)
    }
}
