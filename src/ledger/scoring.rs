//! Heuristic risk scoring
//!
//! The ledger only needs per-category consumption counts; how they are
//! derived is behind [`RiskScorer`] so the word-list heuristic can be
//! replaced without touching the state machine or the ledger.

use super::RiskCategory;

/// Units of allowance consumed per category by one model response
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Consumption {
    counts: [u8; 4],
}

impl Consumption {
    pub fn get(&self, category: RiskCategory) -> u8 {
        self.counts[category.index()]
    }

    pub fn add(&mut self, category: RiskCategory, amount: u8) {
        let slot = &mut self.counts[category.index()];
        *slot = slot.saturating_add(amount);
    }

    pub fn is_zero(&self) -> bool {
        self.counts.iter().all(|c| *c == 0)
    }
}

/// Scores a model response against the risk categories
pub trait RiskScorer: Send + Sync {
    fn score(&self, text: &str) -> Consumption;
}

/// One word list and the weight charged when any of its words appears
#[derive(Debug, Clone)]
pub struct LexicalRule {
    pub category: RiskCategory,
    pub words: &'static [&'static str],
    pub weight: u8,
}

/// Case-insensitive substring scan over fixed word lists.
///
/// Each rule charges its weight at most once per response, however many of
/// its words occur.
#[derive(Debug, Clone)]
pub struct LexicalScorer {
    rules: Vec<LexicalRule>,
}

impl LexicalScorer {
    pub fn new(rules: Vec<LexicalRule>) -> Self {
        Self { rules }
    }
}

impl Default for LexicalScorer {
    fn default() -> Self {
        Self::new(vec![
            LexicalRule {
                category: RiskCategory::EpistemicUncertainty,
                words: &["maybe", "possibly", "hypothesis", "unclear"],
                weight: 1,
            },
            LexicalRule {
                category: RiskCategory::MetaphysicalAbstraction,
                words: &["ontology", "simulation", "consciousness", "reality", "dream"],
                weight: 2,
            },
            LexicalRule {
                category: RiskCategory::NonConsensusReasoning,
                words: &["non-consensus", "alternative", "contrary", "trap"],
                weight: 1,
            },
            LexicalRule {
                category: RiskCategory::ParadoxExposure,
                words: &["paradox", "contradiction", "both", "loop", "recursive"],
                weight: 2,
            },
        ])
    }
}

impl RiskScorer for LexicalScorer {
    fn score(&self, text: &str) -> Consumption {
        let lower = text.to_lowercase();
        let mut consumption = Consumption::default();
        for rule in &self.rules {
            if rule.words.iter().any(|w| lower.contains(w)) {
                consumption.add(rule.category, rule.weight);
            }
        }
        consumption
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neutral_text_consumes_nothing() {
        let scorer = LexicalScorer::default();
        assert!(scorer.score("The capital of France is Paris.").is_zero());
    }

    #[test]
    fn test_weights_per_category() {
        let scorer = LexicalScorer::default();
        let c = scorer.score("Maybe REALITY is a Paradox, contrary to intuition.");
        assert_eq!(c.get(RiskCategory::EpistemicUncertainty), 1);
        assert_eq!(c.get(RiskCategory::MetaphysicalAbstraction), 2);
        assert_eq!(c.get(RiskCategory::NonConsensusReasoning), 1);
        assert_eq!(c.get(RiskCategory::ParadoxExposure), 2);
    }

    #[test]
    fn test_rule_charges_once_per_response() {
        let scorer = LexicalScorer::default();
        let c = scorer.score("dream within a dream, simulation of a simulation");
        assert_eq!(c.get(RiskCategory::MetaphysicalAbstraction), 2);
    }

    #[test]
    fn test_substring_membership() {
        // "both" inside a longer word still counts
        let scorer = LexicalScorer::default();
        let c = scorer.score("That bothers me.");
        assert_eq!(c.get(RiskCategory::ParadoxExposure), 2);
    }

    #[test]
    fn test_custom_rules() {
        let scorer = LexicalScorer::new(vec![LexicalRule {
            category: RiskCategory::NonConsensusReasoning,
            words: &["heterodox"],
            weight: 4,
        }]);
        let c = scorer.score("A heterodox take");
        assert_eq!(c.get(RiskCategory::NonConsensusReasoning), 4);
        assert_eq!(c.get(RiskCategory::ParadoxExposure), 0);
    }
}
