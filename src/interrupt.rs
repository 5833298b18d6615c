//! Constraint trigger protocol (CTP) interrupt records
//!
//! Every policy action is reported to the user as a fenced `ctp` block with
//! a fixed field layout, in place of (or ahead of) model output.

use chrono::{DateTime, SecondsFormat, Utc};
use std::fmt;

/// Capability affected by every interrupt
pub const AFFECTED_CAPABILITY: &str = "output_generation";

/// Action taken by every interrupt
pub const ACTION_TAKEN: &str = "INTERRUPT";

/// The policy constraints that can interrupt a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
    /// Credential missing, tampered or expired
    PmtInvalid,
    /// Hard-stop keyword in the user input
    SafetyPre,
    /// Hard-stop keyword in the model output
    SafetyPost,
    /// This turn depleted one or more categories
    BudgetWarning,
    /// A category was already depleted before inference
    BudgetDepleted,
}

impl Constraint {
    pub fn id(self) -> &'static str {
        match self {
            Constraint::PmtInvalid => "PMT_INVALID",
            Constraint::SafetyPre => "SAFETY_PRE",
            Constraint::SafetyPost => "SAFETY_POST",
            Constraint::BudgetWarning => "BUDGET_WARNING",
            Constraint::BudgetDepleted => "BUDGET_DEPLETED",
        }
    }

    pub fn trigger_signal(self) -> &'static str {
        match self {
            Constraint::PmtInvalid => "invalid_signature",
            Constraint::SafetyPre => "hard_stop_keyword",
            Constraint::SafetyPost => "hard_stop_output",
            Constraint::BudgetWarning => "depletion_imminent",
            Constraint::BudgetDepleted => "zero_balance",
        }
    }

    /// Fixed details text, where the constraint has one
    pub fn default_details(self) -> Option<&'static str> {
        match self {
            Constraint::PmtInvalid => Some("Session terminated."),
            Constraint::SafetyPre => Some("Illegal content requested."),
            Constraint::SafetyPost => Some("Response contained prohibited content."),
            Constraint::BudgetDepleted => {
                Some("Risk budget exhausted. Reply 'RENEW' to continue.")
            }
            Constraint::BudgetWarning => None,
        }
    }
}

/// A single interrupt, ready to render
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterruptRecord {
    pub constraint_id: String,
    pub trigger_signal: String,
    pub affected_capability: String,
    pub action_taken: String,
    pub timestamp: DateTime<Utc>,
    pub details: String,
}

impl InterruptRecord {
    pub fn new(
        constraint_id: impl Into<String>,
        trigger_signal: impl Into<String>,
        details: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            constraint_id: constraint_id.into(),
            trigger_signal: trigger_signal.into(),
            affected_capability: AFFECTED_CAPABILITY.to_string(),
            action_taken: ACTION_TAKEN.to_string(),
            timestamp,
            details: details.into(),
        }
    }

    pub fn for_constraint(
        constraint: Constraint,
        details: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self::new(
            constraint.id(),
            constraint.trigger_signal(),
            details,
            timestamp,
        )
    }
}

impl fmt::Display for InterruptRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "```ctp")?;
        writeln!(f, "constraint_id:      {}", self.constraint_id)?;
        writeln!(f, "trigger_signal:    {}", self.trigger_signal)?;
        writeln!(f, "affected_capability: {}", self.affected_capability)?;
        writeln!(f, "action_taken:      {}", self.action_taken)?;
        writeln!(
            f,
            "timestamp:         {}",
            self.timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
        )?;
        writeln!(f, "details:           {}", self.details)?;
        write!(f, "```")
    }
}
