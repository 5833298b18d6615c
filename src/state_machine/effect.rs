//! Effects produced by onboarding transitions

use super::state::{CredentialLifetime, Mode};
use crate::ledger::RiskBudget;

/// Effects to be applied to the session after a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Record the selected mode
    SelectMode(Mode),

    /// Record the allocated risk budget
    AllocateBudget(RiskBudget),

    /// Record the chosen credential lifetime
    SetLifetime(CredentialLifetime),

    /// Sign and store a credential for the collected mode and budget
    IssueCredential,

    /// Discard everything collected so far
    ResetSession,
}
