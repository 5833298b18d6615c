//! Property-based tests for the risk budget ledger

use super::*;
use proptest::prelude::*;

fn arb_budget() -> impl Strategy<Value = RiskBudget> {
    proptest::array::uniform4(0u8..=MAX_ALLOWANCE)
        .prop_map(|values| RiskBudget::from_allocation(values).unwrap())
}

fn arb_consumption() -> impl Strategy<Value = Consumption> {
    proptest::array::uniform4(0u8..=20).prop_map(|counts| {
        let mut consumption = Consumption::default();
        for (category, amount) in RiskCategory::ALL.into_iter().zip(counts) {
            consumption.add(category, amount);
        }
        consumption
    })
}

fn arb_response_text() -> impl Strategy<Value = String> {
    let words = prop_oneof![
        Just("maybe"),
        Just("reality"),
        Just("alternative"),
        Just("loop"),
        Just("the"),
        Just("answer"),
        Just("is"),
        Just("Both"),
    ];
    proptest::collection::vec(words, 0..30).prop_map(|ws| ws.join(" "))
}

proptest! {
    #[test]
    fn prop_decrement_is_non_increasing_and_bounded(
        start in arb_budget(),
        steps in proptest::collection::vec(arb_consumption(), 0..20),
    ) {
        let mut budget = start;
        for consumption in &steps {
            let before = budget;
            budget.consume(consumption);
            for category in RiskCategory::ALL {
                prop_assert!(budget.get(category) <= before.get(category));
                prop_assert!(budget.get(category) <= MAX_ALLOWANCE);
            }
        }
    }

    #[test]
    fn prop_renew_always_resets_to_max(
        start in arb_budget(),
        steps in proptest::collection::vec(arb_consumption(), 0..10),
    ) {
        let mut budget = start;
        for consumption in &steps {
            budget.consume(consumption);
        }
        budget.renew();
        for category in RiskCategory::ALL {
            prop_assert_eq!(budget.get(category), MAX_ALLOWANCE);
        }
    }

    #[test]
    fn prop_newly_depleted_are_now_zero(start in arb_budget(), consumption in arb_consumption()) {
        let mut budget = start;
        let newly = budget.consume(&consumption);
        for category in newly {
            prop_assert!(budget.is_depleted(category));
            prop_assert!(!start.is_depleted(category));
        }
    }

    #[test]
    fn prop_lexical_scores_are_bounded_by_weights(text in arb_response_text()) {
        let c = LexicalScorer::default().score(&text);
        prop_assert!(c.get(RiskCategory::EpistemicUncertainty) <= 1);
        prop_assert!(c.get(RiskCategory::MetaphysicalAbstraction) <= 2);
        prop_assert!(c.get(RiskCategory::NonConsensusReasoning) <= 1);
        prop_assert!(c.get(RiskCategory::ParadoxExposure) <= 2);
    }
}
