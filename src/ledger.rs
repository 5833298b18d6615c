//! Risk budget ledger
//!
//! Four fixed categories of integer allowance in `[0, 10]`. Generation is
//! blocked as soon as any category reaches zero and stays blocked until an
//! explicit renewal refills every category.

mod scoring;

#[cfg(test)]
mod proptests;

pub use scoring::{Consumption, LexicalRule, LexicalScorer, RiskScorer};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Upper bound of every category, and the value renewal resets to
pub const MAX_ALLOWANCE: u8 = 10;

/// The four fixed budget categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskCategory {
    EpistemicUncertainty,
    MetaphysicalAbstraction,
    NonConsensusReasoning,
    ParadoxExposure,
}

impl RiskCategory {
    /// All categories in allocation order
    pub const ALL: [RiskCategory; 4] = [
        RiskCategory::EpistemicUncertainty,
        RiskCategory::MetaphysicalAbstraction,
        RiskCategory::NonConsensusReasoning,
        RiskCategory::ParadoxExposure,
    ];

    /// Wire/storage key
    pub fn key(self) -> &'static str {
        match self {
            RiskCategory::EpistemicUncertainty => "epistemic_uncertainty",
            RiskCategory::MetaphysicalAbstraction => "metaphysical_abstraction",
            RiskCategory::NonConsensusReasoning => "non_consensus_reasoning",
            RiskCategory::ParadoxExposure => "paradox_exposure",
        }
    }

    /// Human-readable label used in the allocation prompt
    pub fn label(self) -> &'static str {
        match self {
            RiskCategory::EpistemicUncertainty => "Epistemic uncertainty",
            RiskCategory::MetaphysicalAbstraction => "Metaphysical abstraction",
            RiskCategory::NonConsensusReasoning => "Non-consensus reasoning",
            RiskCategory::ParadoxExposure => "Paradox exposure",
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            RiskCategory::EpistemicUncertainty => 0,
            RiskCategory::MetaphysicalAbstraction => 1,
            RiskCategory::NonConsensusReasoning => 2,
            RiskCategory::ParadoxExposure => 3,
        }
    }
}

impl fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Remaining allowance per category.
///
/// Serialized as a flat map keyed by category. Deserialization rejects values
/// above [`MAX_ALLOWANCE`], so a stored budget can never exceed the bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BudgetRepr", into = "BudgetRepr")]
pub struct RiskBudget {
    allowance: [u8; 4],
}

impl RiskBudget {
    /// Every category at [`MAX_ALLOWANCE`]
    pub fn full() -> Self {
        Self {
            allowance: [MAX_ALLOWANCE; 4],
        }
    }

    /// Build from values given in [`RiskCategory::ALL`] order.
    /// Returns `None` if any value is above [`MAX_ALLOWANCE`].
    pub fn from_allocation(values: [u8; 4]) -> Option<Self> {
        if values.iter().any(|v| *v > MAX_ALLOWANCE) {
            return None;
        }
        Some(Self { allowance: values })
    }

    pub fn get(&self, category: RiskCategory) -> u8 {
        self.allowance[category.index()]
    }

    pub fn is_depleted(&self, category: RiskCategory) -> bool {
        self.get(category) == 0
    }

    /// True if generation must be blocked
    pub fn any_depleted(&self) -> bool {
        RiskCategory::ALL.into_iter().any(|c| self.is_depleted(c))
    }

    /// Decrement each category by its consumption, floored at zero.
    ///
    /// Returns the categories that reached zero during this call.
    pub fn consume(&mut self, consumption: &Consumption) -> Vec<RiskCategory> {
        let mut newly_depleted = Vec::new();
        for category in RiskCategory::ALL {
            let slot = &mut self.allowance[category.index()];
            let before = *slot;
            *slot = before.saturating_sub(consumption.get(category));
            if before > 0 && *slot == 0 {
                newly_depleted.push(category);
            }
        }
        newly_depleted
    }

    /// Reset every category to [`MAX_ALLOWANCE`]
    pub fn renew(&mut self) {
        self.allowance = [MAX_ALLOWANCE; 4];
    }
}

impl fmt::Display for RiskBudget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, category) in RiskCategory::ALL.into_iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: {}", category.key(), self.get(category))?;
        }
        f.write_str("}")
    }
}

#[derive(Serialize, Deserialize)]
struct BudgetRepr {
    epistemic_uncertainty: u8,
    metaphysical_abstraction: u8,
    non_consensus_reasoning: u8,
    paradox_exposure: u8,
}

impl TryFrom<BudgetRepr> for RiskBudget {
    type Error = String;

    fn try_from(repr: BudgetRepr) -> Result<Self, Self::Error> {
        RiskBudget::from_allocation([
            repr.epistemic_uncertainty,
            repr.metaphysical_abstraction,
            repr.non_consensus_reasoning,
            repr.paradox_exposure,
        ])
        .ok_or_else(|| format!("risk budget values must be within 0..={MAX_ALLOWANCE}"))
    }
}

impl From<RiskBudget> for BudgetRepr {
    fn from(budget: RiskBudget) -> Self {
        Self {
            epistemic_uncertainty: budget.get(RiskCategory::EpistemicUncertainty),
            metaphysical_abstraction: budget.get(RiskCategory::MetaphysicalAbstraction),
            non_consensus_reasoning: budget.get(RiskCategory::NonConsensusReasoning),
            paradox_exposure: budget.get(RiskCategory::ParadoxExposure),
        }
    }
}
