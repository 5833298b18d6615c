//! Property-based tests for the onboarding state machine
//!
//! These tests verify that no input can skip a step and that rejected input
//! never moves the machine.

use super::state::*;
use super::transition::*;
use super::*;
use crate::ledger::RiskBudget;
use proptest::prelude::*;

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_mode() -> impl Strategy<Value = Mode> {
    prop_oneof![
        Just(Mode::Diagnostic),
        Just(Mode::OpenEpistemic),
        Just(Mode::CoCreation),
        Just(Mode::Simulation),
        Just(Mode::ConsensusSafe),
    ]
}

fn arb_onboarding_step() -> impl Strategy<Value = Step> {
    prop_oneof![
        Just(Step::ModeSelection),
        Just(Step::Contract),
        Just(Step::RiskBudget),
        Just(Step::Duration),
        Just(Step::Handshake),
    ]
}

fn arb_budget() -> impl Strategy<Value = RiskBudget> {
    proptest::array::uniform4(0u8..=10)
        .prop_map(|values| RiskBudget::from_allocation(values).unwrap())
}

fn arb_context() -> impl Strategy<Value = ConsentContext> {
    (arb_mode(), arb_budget()).prop_map(|(mode, budget)| ConsentContext {
        mode: Some(mode),
        risk_budget: Some(budget),
    })
}

/// Inputs that are sometimes valid at some step
fn arb_input() -> impl Strategy<Value = String> {
    prop_oneof![
        (0u8..10).prop_map(|n| n.to_string()),
        arb_mode().prop_map(|m| m.acceptance_phrase()),
        arb_mode().prop_map(|m| m.consent_phrase()),
        Just("DECLINE".to_string()),
        Just("1:10 2:10 3:10 4:10".to_string()),
        "[a-zA-Z0-9: ]{0,30}",
    ]
}

/// Inputs with no selector digit, keyword, or allocation pair
fn arb_garbage() -> impl Strategy<Value = String> {
    "[a-zA-Z ,.!?]{0,40}".prop_filter("must not spell DECLINE", |s| {
        !s.trim().eq_ignore_ascii_case("decline")
    })
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn prop_never_skips_a_step(
        step in arb_onboarding_step(),
        context in arb_context(),
        input in arb_input(),
    ) {
        match transition(step, &context, &input) {
            Ok(result) => {
                let advanced = result.new_step.ordinal() == step.ordinal() + 1;
                let reset = result.new_step == Step::ModeSelection
                    && result.effects == vec![Effect::ResetSession];
                prop_assert!(advanced || reset, "{:?} -> {:?}", step, result.new_step);
            }
            Err(err) => prop_assert!(!err.to_string().is_empty()),
        }
    }

    #[test]
    fn prop_garbage_is_rejected_everywhere(
        step in arb_onboarding_step(),
        context in arb_context(),
        input in arb_garbage(),
    ) {
        prop_assert!(transition(step, &context, &input).is_err());
    }

    #[test]
    fn prop_only_contract_step_can_reset(
        step in arb_onboarding_step(),
        context in arb_context(),
        input in arb_input(),
    ) {
        if let Ok(result) = transition(step, &context, &input) {
            if result.effects.contains(&Effect::ResetSession) {
                prop_assert_eq!(step, Step::Contract);
            }
        }
    }

    #[test]
    fn prop_credential_only_issued_at_handshake(
        step in arb_onboarding_step(),
        context in arb_context(),
        input in arb_input(),
    ) {
        if let Ok(result) = transition(step, &context, &input) {
            let issues = result.effects.contains(&Effect::IssueCredential);
            prop_assert_eq!(issues, step == Step::Handshake);
            prop_assert_eq!(issues, result.new_step == Step::Active);
        }
    }

    #[test]
    fn prop_allocation_roundtrips_through_prompt_format(values in proptest::array::uniform4(0u8..=10)) {
        let input = format!(
            "1: {}\n2: {}\n3: {}\n4: {}",
            values[0], values[1], values[2], values[3]
        );
        let budget = parse_allocation(&input).unwrap();
        prop_assert_eq!(budget, RiskBudget::from_allocation(values).unwrap());
    }

    #[test]
    fn prop_out_of_range_allocation_rejected(
        values in proptest::array::uniform4(0u16..=10),
        slot in 0usize..4,
        over in 11u16..1000,
    ) {
        let mut values = values;
        values[slot] = over;
        let input = format!("1:{} 2:{} 3:{} 4:{}", values[0], values[1], values[2], values[3]);
        prop_assert_eq!(parse_allocation(&input).unwrap_err(), TransitionError::BudgetOutOfRange);
    }
}

// ============================================================================
// Full onboarding walk
// ============================================================================

/// Drive the machine through onboarding, applying effects the way the
/// governor does, and return the final step and context.
fn walk(inputs: &[&str]) -> (Step, ConsentContext, Vec<String>) {
    let mut step = Step::ModeSelection;
    let mut context = ConsentContext::default();
    let mut replies = Vec::new();

    for input in inputs {
        match transition(step, &context, input) {
            Ok(result) => {
                for effect in &result.effects {
                    match effect {
                        Effect::SelectMode(mode) => context.mode = Some(*mode),
                        Effect::AllocateBudget(budget) => context.risk_budget = Some(*budget),
                        Effect::ResetSession => context = ConsentContext::default(),
                        Effect::SetLifetime(_) | Effect::IssueCredential => {}
                    }
                }
                step = result.new_step;
                replies.push(result.response);
            }
            Err(err) => replies.push(err.to_string()),
        }
    }

    (step, context, replies)
}

#[test]
fn test_full_onboarding_reaches_active() {
    let phrase = Mode::OpenEpistemic.consent_phrase();
    let (step, context, replies) = walk(&[
        "2",
        "ACCEPT OPEN_EPISTEMIC",
        "1: 10 2:10 3:10 4:10",
        "3",
        &phrase,
    ]);

    assert_eq!(step, Step::Active);
    assert_eq!(context.mode, Some(Mode::OpenEpistemic));
    assert_eq!(context.risk_budget, Some(RiskBudget::full()));
    assert!(replies[4].contains("Mode: OPEN_EPISTEMIC"));
}

#[test]
fn test_errors_interleaved_with_valid_input() {
    let phrase = Mode::Diagnostic.consent_phrase();
    let (step, _, replies) = walk(&[
        "7",
        "1",
        "yes",
        "ACCEPT DIAGNOSTIC",
        "1:10",
        "1:5 2:5 3:5 4:5",
        "forever",
        "4",
        "I consent",
        &phrase,
    ]);

    assert_eq!(step, Step::Active);
    assert_eq!(replies[0], "Invalid choice. Reply with 1–5 only.");
    assert_eq!(replies[2], "Type \"ACCEPT DIAGNOSTIC\" or \"DECLINE\"");
    assert!(replies[4].starts_with("Parsing error."));
    assert_eq!(replies[6], "Reply 1–4.");
    assert_eq!(replies[8], "Phrase mismatch. Copy exactly.");
}

#[test]
fn test_decline_then_restart() {
    let (step, context, replies) = walk(&["4", "DECLINE", "5"]);
    assert_eq!(step, Step::Contract);
    assert_eq!(context.mode, Some(Mode::ConsensusSafe));
    assert_eq!(replies[1], DECLINE_RESPONSE);
}
