//! Pure onboarding transition function
//!
//! Each call consumes one user input at the current step and either advances
//! (returning the new step, the effects to apply, and the reply) or rejects
//! the input with a re-prompt. Rejection never changes the step.

use super::state::{
    handshake_complete, handshake_prompt, risk_budget_prompt, ConsentContext,
    CredentialLifetime, Mode, Step, DECLINE_RESPONSE, DURATION_MENU,
};
use super::Effect;
use crate::ledger::{RiskBudget, MAX_ALLOWANCE};
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

/// `index: value` pairs, extracted in order of appearance
static ALLOCATION_PAIR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d+:\s*(\d+)").unwrap_or_else(|e| panic!("allocation pattern is invalid: {e}"))
});

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_step: Step,
    pub effects: Vec<Effect>,
    pub response: String,
}

impl TransitionResult {
    pub fn new(step: Step, response: impl Into<String>) -> Self {
        Self {
            new_step: step,
            effects: vec![],
            response: response.into(),
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Rejected onboarding input. The message is the re-prompt shown to the user.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Invalid choice. Reply with 1–5 only.")]
    InvalidModeSelection,
    #[error("Type \"ACCEPT {0}\" or \"DECLINE\"")]
    ContractNotAccepted(Mode),
    #[error("Values must be between 0 and 10.")]
    BudgetOutOfRange,
    #[error("Parsing error. Please ensure you have 4 categories defined (e.g., 1:10, 2:10...)")]
    BudgetUnparsable,
    #[error("Reply 1–4.")]
    InvalidDuration,
    #[error("Phrase mismatch. Copy exactly.")]
    PhraseMismatch,
    #[error("Initiation error.")]
    MissingContext(&'static str),
    #[error("Initiation error.")]
    AlreadyActive,
}

/// Pure transition function.
///
/// `input` is expected to be trimmed already.
pub fn transition(
    step: Step,
    context: &ConsentContext,
    input: &str,
) -> Result<TransitionResult, TransitionError> {
    match step {
        Step::ModeSelection => {
            let mode = Mode::from_selector(input).ok_or(TransitionError::InvalidModeSelection)?;
            Ok(TransitionResult::new(Step::Contract, mode.contract_text())
                .with_effect(Effect::SelectMode(mode)))
        }

        Step::Contract => {
            let mode = context.mode.ok_or(TransitionError::MissingContext("mode"))?;
            if input.eq_ignore_ascii_case(&mode.acceptance_phrase()) {
                Ok(TransitionResult::new(Step::RiskBudget, risk_budget_prompt()))
            } else if input.eq_ignore_ascii_case("DECLINE") {
                Ok(TransitionResult::new(Step::ModeSelection, DECLINE_RESPONSE)
                    .with_effect(Effect::ResetSession))
            } else {
                Err(TransitionError::ContractNotAccepted(mode))
            }
        }

        Step::RiskBudget => {
            let budget = parse_allocation(input)?;
            Ok(TransitionResult::new(Step::Duration, DURATION_MENU)
                .with_effect(Effect::AllocateBudget(budget)))
        }

        Step::Duration => {
            let mode = context.mode.ok_or(TransitionError::MissingContext("mode"))?;
            let lifetime =
                CredentialLifetime::from_selector(input).ok_or(TransitionError::InvalidDuration)?;
            Ok(TransitionResult::new(Step::Handshake, handshake_prompt(mode))
                .with_effect(Effect::SetLifetime(lifetime)))
        }

        Step::Handshake => {
            let mode = context.mode.ok_or(TransitionError::MissingContext("mode"))?;
            let budget = context
                .risk_budget
                .ok_or(TransitionError::MissingContext("risk_budget"))?;
            if input != mode.consent_phrase() {
                return Err(TransitionError::PhraseMismatch);
            }
            Ok(
                TransitionResult::new(Step::Active, handshake_complete(mode, &budget))
                    .with_effect(Effect::IssueCredential),
            )
        }

        Step::Active => Err(TransitionError::AlreadyActive),
    }
}

/// Extract exactly four in-range allocation values, ignoring the indices and
/// any surrounding text.
pub fn parse_allocation(input: &str) -> Result<RiskBudget, TransitionError> {
    let captures: Vec<&str> = ALLOCATION_PAIR
        .captures_iter(input)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect();

    let [a, b, c, d] = captures.as_slice() else {
        return Err(TransitionError::BudgetUnparsable);
    };

    let mut values = [0u8; 4];
    for (slot, raw) in values.iter_mut().zip([a, b, c, d]) {
        // Digits-only by construction, so a parse failure means overflow
        *slot = raw
            .parse::<u8>()
            .ok()
            .filter(|v| *v <= MAX_ALLOWANCE)
            .ok_or(TransitionError::BudgetOutOfRange)?;
    }

    RiskBudget::from_allocation(values).ok_or(TransitionError::BudgetOutOfRange)
}
