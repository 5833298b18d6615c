//! Per-conversation session record

use crate::history::TurnHistory;
use crate::ledger::RiskBudget;
use crate::state_machine::{ConsentContext, CredentialLifetime, Mode, Step};
use serde::{Deserialize, Serialize};

/// Everything the governor knows about one conversation. Persisted as a
/// JSON blob keyed by session id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default)]
    pub history: TurnHistory,
    #[serde(default)]
    pub step: Step,
    #[serde(default)]
    pub mode: Option<Mode>,
    #[serde(default)]
    pub risk_budget: Option<RiskBudget>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lifetime: Option<CredentialLifetime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential: Option<String>,
}

impl Session {
    pub fn consent_context(&self) -> ConsentContext {
        ConsentContext {
            mode: self.mode,
            risk_budget: self.risk_budget,
        }
    }

    pub fn is_active(&self) -> bool {
        self.step == Step::Active
    }

    pub fn from_blob(blob: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(blob)
    }

    pub fn to_blob(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
