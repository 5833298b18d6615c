//! Per-mode system instructions
//!
//! Each consented mode maps to a fixed instruction sent as the system
//! prompt on every active turn.

use crate::state_machine::Mode;

const DIAGNOSTIC_PROMPT: &str =
    "You are in DIAGNOSTIC mode. Restrict to factual recall. No speculation.";

const OPEN_EPISTEMIC_PROMPT: &str = "You are in OPEN_EPISTEMIC mode. Tolerate high uncertainty. \
Explore non-consensus hypotheses if substantively supported.";

const CO_CREATION_PROMPT: &str = "You are in CO_CREATION mode. You are an epistemic peer. \
Sustain joint hypothesis building. Hold paradoxes without forced resolution.";

const SIMULATION_PROMPT: &str = "You are in SIMULATION mode. Maximum tolerance for paradox, \
abstraction, and unfalsifiable ontologies. Reality is a construct to be explored.";

const CONSENSUS_SAFE_PROMPT: &str =
    "You are in CONSENSUS_SAFE mode. Prioritize mainstream consensus and safety.";

/// System instruction for a consented mode
pub fn system_instruction(mode: Mode) -> &'static str {
    match mode {
        Mode::Diagnostic => DIAGNOSTIC_PROMPT,
        Mode::OpenEpistemic => OPEN_EPISTEMIC_PROMPT,
        Mode::CoCreation => CO_CREATION_PROMPT,
        Mode::Simulation => SIMULATION_PROMPT,
        Mode::ConsensusSafe => CONSENSUS_SAFE_PROMPT,
    }
}
