use super::robot::Robot;
use crate::config::{EvolutionConfig, InheritedWeightMode, WeightMode};

/// Turns prediction counters into earned weight
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightCalculator {
    mode: WeightMode,
    exponent: f64,
}

impl WeightCalculator {
    pub fn new(mode: WeightMode, exponent: f64) -> Self {
        Self { mode, exponent }
    }

    pub fn from_config(config: &EvolutionConfig) -> Self {
        Self::new(config.weight_mode, config.weight_exponent)
    }

    /// Always finite and non-negative; zero without any resolved prediction
    pub fn earned(&self, correct: u64, total: u64) -> f64 {
        if total == 0 {
            return 0.0;
        }
        let correct = correct.min(total) as f64;
        let total = total as f64;
        let base = match self.mode {
            WeightMode::WinCount => (correct - (total - correct)).max(0.0),
            WeightMode::WinRate => (2.0 * correct / total - 1.0).max(0.0),
            WeightMode::Proportional => correct / total,
        };
        let weight = base.powf(self.exponent);
        if weight.is_finite() {
            weight
        } else {
            0.0
        }
    }
}

/// Weight a child receives at birth from its parent(s)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InheritedWeight {
    mode: InheritedWeightMode,
    fraction: f64,
}

impl InheritedWeight {
    pub fn new(mode: InheritedWeightMode, fraction: f64) -> Self {
        Self { mode, fraction }
    }

    pub fn from_config(config: &EvolutionConfig) -> Self {
        Self::new(config.inherited_child_weight_mode, config.inherited_child_weight)
    }

    pub fn inherit_from(&self, parent: &Robot, calculator: &WeightCalculator) -> f64 {
        if self.fraction == 0.0 {
            return 0.0;
        }
        let inherited = match self.mode {
            InheritedWeightMode::Parents => self.fraction * parent.earned_weight(calculator),
            InheritedWeightMode::Ancestors => self.fraction * parent.weight(calculator),
            InheritedWeightMode::AncestorsLog => self.fraction * parent.weight(calculator).ln_1p(),
        };
        if inherited.is_finite() {
            inherited.max(0.0)
        } else {
            0.0
        }
    }

    /// Children of a crossover inherit from the mean of both parents
    pub fn inherit_from_pair(&self, first: &Robot, second: &Robot, calculator: &WeightCalculator) -> f64 {
        (self.inherit_from(first, calculator) + self.inherit_from(second, calculator)) / 2.0
    }
}
