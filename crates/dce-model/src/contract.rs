//! Output contracts an assistant response must satisfy

use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Expected shape of an assistant response
///
/// For every contract except [`ContractExpectation::ScreenPatch`] the label
/// is matched against the `type` field of a parsed object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractExpectation {
    /// API definition draft
    ApiDraft,
    /// Complex-event-processing rule draft
    CepDraft,
    /// Screen editor patch (bare array or `{"patch": [...]}`)
    ScreenPatch,
    /// Simulation scenario draft
    SimDraft,
}

impl ContractExpectation {
    /// All contracts, in declaration order
    pub const ALL: [Self; 4] = [Self::ApiDraft, Self::CepDraft, Self::ScreenPatch, Self::SimDraft];

    /// Wire label
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ApiDraft => "api_draft",
            Self::CepDraft => "cep_draft",
            Self::ScreenPatch => "screen_patch",
            Self::SimDraft => "sim_draft",
        }
    }

    /// Whether the contract is satisfied by a patch list rather than a typed object
    #[inline]
    #[must_use]
    pub const fn is_patch(self) -> bool {
        matches!(self, Self::ScreenPatch)
    }
}

impl Display for ContractExpectation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContractExpectation {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s.trim())
            .ok_or_else(|| ModelError::UnknownContract(s.to_string()))
    }
}
