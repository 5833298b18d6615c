//! Onboarding state types

use crate::ledger::{RiskBudget, RiskCategory};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::Write;

/// Nonce embedded in the handshake consent phrase
pub const HANDSHAKE_NONCE: &str = "x7k9p2m";

/// Reserved active-session command that refills the risk budget
pub const RENEW_COMMAND: &str = "RENEW";

/// Lifetime used for the "indefinite" duration choice
pub const INDEFINITE_LIFETIME_HOURS: i64 = 999_999;

// ============================================================================
// Mode
// ============================================================================

/// Conversational policy chosen at mode selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Mode {
    Diagnostic,
    OpenEpistemic,
    CoCreation,
    Simulation,
    ConsensusSafe,
}

impl Mode {
    pub const ALL: [Mode; 5] = [
        Mode::Diagnostic,
        Mode::OpenEpistemic,
        Mode::CoCreation,
        Mode::Simulation,
        Mode::ConsensusSafe,
    ];

    /// Parse the literal selector `1`..`5`
    pub fn from_selector(input: &str) -> Option<Self> {
        match input {
            "1" => Some(Mode::Diagnostic),
            "2" => Some(Mode::OpenEpistemic),
            "3" => Some(Mode::CoCreation),
            "4" => Some(Mode::Simulation),
            "5" => Some(Mode::ConsensusSafe),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Diagnostic => "DIAGNOSTIC",
            Mode::OpenEpistemic => "OPEN_EPISTEMIC",
            Mode::CoCreation => "CO_CREATION",
            Mode::Simulation => "SIMULATION",
            Mode::ConsensusSafe => "CONSENSUS_SAFE",
        }
    }

    /// Contract shown after the mode is selected
    pub fn contract_text(self) -> String {
        let terms = match self {
            Mode::Diagnostic => "Allowed: Factual recall.\nRestricted: No speculation.",
            Mode::OpenEpistemic => "Allowed: High uncertainty, non-consensus hypotheses.",
            Mode::CoCreation => "Allowed: Sustained joint hypothesis, high paradox tolerance.",
            Mode::Simulation => "Allowed: Radical ontological hypotheses, maximum paradox.",
            Mode::ConsensusSafe => "Allowed: Standard safe responses.",
        };
        format!(
            "MODE CONTRACT – {self}\n\n{terms}\n\nType \"{}\" to proceed, or \"DECLINE\".",
            self.acceptance_phrase()
        )
    }

    /// Phrase that accepts this mode's contract (compared case-insensitively)
    pub fn acceptance_phrase(self) -> String {
        format!("ACCEPT {self}")
    }

    /// Exact phrase required at the handshake step
    pub fn consent_phrase(self) -> String {
        format!("I consent to {self} mode under OECS-MVP terms – nonce: {HANDSHAKE_NONCE}")
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Credential lifetime
// ============================================================================

/// Session duration chosen at the duration step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialLifetime {
    OneHour,
    FourHours,
    OneDay,
    Indefinite,
}

impl CredentialLifetime {
    /// Parse the literal selector `1`..`4`
    pub fn from_selector(input: &str) -> Option<Self> {
        match input {
            "1" => Some(CredentialLifetime::OneHour),
            "2" => Some(CredentialLifetime::FourHours),
            "3" => Some(CredentialLifetime::OneDay),
            "4" => Some(CredentialLifetime::Indefinite),
            _ => None,
        }
    }

    pub fn hours(self) -> i64 {
        match self {
            CredentialLifetime::OneHour => 1,
            CredentialLifetime::FourHours => 4,
            CredentialLifetime::OneDay => 24,
            CredentialLifetime::Indefinite => INDEFINITE_LIFETIME_HOURS,
        }
    }

    pub fn duration(self) -> Duration {
        Duration::hours(self.hours())
    }
}

// ============================================================================
// Step
// ============================================================================

/// Onboarding step. Only moves forward, except for an explicit reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    #[default]
    ModeSelection,
    Contract,
    RiskBudget,
    Duration,
    Handshake,
    Active,
}

impl Step {
    /// Position in the onboarding sequence
    #[allow(dead_code)] // Used by ordering checks
    pub fn ordinal(self) -> u8 {
        match self {
            Step::ModeSelection => 0,
            Step::Contract => 1,
            Step::RiskBudget => 2,
            Step::Duration => 3,
            Step::Handshake => 4,
            Step::Active => 5,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Step::ModeSelection => "mode_selection",
            Step::Contract => "contract",
            Step::RiskBudget => "risk_budget",
            Step::Duration => "duration",
            Step::Handshake => "handshake",
            Step::Active => "active",
        }
    }
}

// ============================================================================
// Consent context
// ============================================================================

/// Values collected so far during onboarding
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsentContext {
    pub mode: Option<Mode>,
    pub risk_budget: Option<RiskBudget>,
}

// ============================================================================
// Fixed prompts
// ============================================================================

pub const MODE_MENU: &str = "Select epistemic mode:\n\n\
[1] DIAGNOSTIC\n\
[2] OPEN_EPISTEMIC\n\
[3] CO_CREATION\n\
[4] SIMULATION\n\
[5] CONSENSUS_SAFE\n\n\
Reply with number.";

pub const DURATION_MENU: &str =
    "Select duration:\n\n[1] 1h\n[2] 4h\n[3] 24h\n[4] Indefinite\n\nReply with number.";

pub const DECLINE_RESPONSE: &str = "Session reset. Select mode 1-5.";

pub const RENEW_RESPONSE: &str = "ADMIN: Risk Budget replenished to 10/10.";

/// Prompt listing the categories to allocate
pub fn risk_budget_prompt() -> String {
    let mut prompt = String::from("Allocate risk budget (0–10 per category):\n\n");
    for (i, category) in RiskCategory::ALL.into_iter().enumerate() {
        let _ = writeln!(prompt, "{}. {}", i + 1, category.label());
    }
    prompt.push_str("\nReply format:\n1: 10\n2: 10\n3: 10\n4: 10");
    prompt
}

pub fn handshake_prompt(mode: Mode) -> String {
    format!("Final consent: Copy-paste exactly:\n\n\"{}\"", mode.consent_phrase())
}

pub fn handshake_complete(mode: Mode, budget: &RiskBudget) -> String {
    format!(
        "HANDSHAKE COMPLETE\n\nPMT Issued.\nMode: {mode}\nBudget: {budget}\n\nSession Active. Begin inquiry."
    )
}
