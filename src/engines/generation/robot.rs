use super::weight::WeightCalculator;
use crate::engines::evaluation::Program;
use crate::types::{DatasetName, Outcome, Signal};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Population-unique robot identifier, handed out by a counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RobotName(u64);

impl RobotName {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RobotName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One evolvable program plus its prediction record.
///
/// A robot never decides its own survival. It only keeps counters that the
/// evolution policy reads: `correct_predictions <= total_predictions <= total_outcomes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Robot {
    name: RobotName,
    program: Program,
    /// Latest signal per dataset, resolved on the next bar
    pending: BTreeMap<DatasetName, Signal>,
    /// Signal awaiting resolution against the current bar's change
    current: BTreeMap<DatasetName, Signal>,
    total_outcomes: u64,
    total_predictions: u64,
    correct_predictions: u64,
    bias: i64,
    is_predicting: bool,
    prediction_calls: u64,
    total_children: u64,
    outcomes_at_last_child: u64,
    inherited_weight: f64,
}

impl Robot {
    pub fn new(name: RobotName, program: Program, inherited_weight: f64) -> Self {
        Self {
            name,
            program,
            pending: BTreeMap::new(),
            current: BTreeMap::new(),
            total_outcomes: 0,
            total_predictions: 0,
            correct_predictions: 0,
            bias: 0,
            is_predicting: false,
            prediction_calls: 0,
            total_children: 0,
            outcomes_at_last_child: 0,
            inherited_weight: inherited_weight.max(0.0),
        }
    }

    pub fn name(&self) -> RobotName {
        self.name
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn total_outcomes(&self) -> u64 {
        self.total_outcomes
    }

    pub fn total_predictions(&self) -> u64 {
        self.total_predictions
    }

    pub fn correct_predictions(&self) -> u64 {
        self.correct_predictions
    }

    pub fn wrong_predictions(&self) -> u64 {
        self.total_predictions.saturating_sub(self.correct_predictions)
    }

    pub fn bias(&self) -> i64 {
        self.bias
    }

    /// Has ever emitted a directional signal
    pub fn is_predicting(&self) -> bool {
        self.is_predicting
    }

    pub fn prediction_calls(&self) -> u64 {
        self.prediction_calls
    }

    pub fn total_children(&self) -> u64 {
        self.total_children
    }

    pub fn outcomes_at_last_child(&self) -> u64 {
        self.outcomes_at_last_child
    }

    pub fn outcomes_since_last_child(&self) -> u64 {
        self.total_outcomes.saturating_sub(self.outcomes_at_last_child)
    }

    pub fn inherited_weight(&self) -> f64 {
        self.inherited_weight
    }

    pub fn pending_signal(&self, dataset: &DatasetName) -> Option<Signal> {
        self.pending.get(dataset).copied()
    }

    pub fn current_signal(&self, dataset: &DatasetName) -> Option<Signal> {
        self.current.get(dataset).copied()
    }

    /// Shift the pending signal to current and make `signal` the new pending one
    pub fn record_new_prediction(&mut self, dataset: &DatasetName, signal: Signal) {
        match self.pending.insert(dataset.clone(), signal) {
            Some(previous) => {
                self.current.insert(dataset.clone(), previous);
            }
            None => {
                self.current.remove(dataset);
            }
        }
        self.prediction_calls += 1;
        self.bias += i64::from(signal.polarity());
        if signal.is_directional() {
            self.is_predicting = true;
        }
    }

    /// Resolve the current signal for `dataset`, if any, against the realized change.
    ///
    /// Each signal resolves at most once.
    pub fn resolve_market_change(
        &mut self,
        dataset: &DatasetName,
        realized_change: f64,
        threshold: f64,
    ) -> Option<Outcome> {
        let signal = self.current.remove(dataset)?;
        let outcome = Outcome::resolve(signal, realized_change, threshold);
        self.total_outcomes += 1;
        match outcome {
            Outcome::Correct => {
                self.total_predictions += 1;
                self.correct_predictions += 1;
            }
            Outcome::Wrong => self.total_predictions += 1,
            Outcome::Out => {}
        }
        Some(outcome)
    }

    pub fn earned_weight(&self, calculator: &WeightCalculator) -> f64 {
        calculator.earned(self.correct_predictions, self.total_predictions)
    }

    /// Inherited plus earned weight, always finite and non-negative
    pub fn weight(&self, calculator: &WeightCalculator) -> f64 {
        let weight = self.inherited_weight + self.earned_weight(calculator);
        if weight.is_finite() {
            weight
        } else {
            0.0
        }
    }

    pub fn record_child_born(&mut self) {
        self.total_children += 1;
        self.outcomes_at_last_child = self.total_outcomes;
    }

    /// Statistics as "key value" lines followed by the program listing
    pub fn show(&self, calculator: &WeightCalculator) -> String {
        let fields: [(&str, String); 12] = [
            ("name", self.name.to_string()),
            ("length", self.program.len().to_string()),
            ("total_outcomes", self.total_outcomes.to_string()),
            ("total_predictions", self.total_predictions.to_string()),
            ("correct_predictions", self.correct_predictions.to_string()),
            ("bias", self.bias.to_string()),
            ("is_predicting", self.is_predicting.to_string()),
            ("total_children", self.total_children.to_string()),
            ("outcomes_at_last_child", self.outcomes_at_last_child.to_string()),
            ("inherited_weight", format!("{:.4}", self.inherited_weight)),
            ("earned_weight", format!("{:.4}", self.earned_weight(calculator))),
            ("weight", format!("{:.4}", self.weight(calculator))),
        ];

        let mut out = String::new();
        for (key, value) in fields {
            out.push_str(key);
            out.push(' ');
            out.push_str(&value);
            out.push('\n');
        }
        out.push_str(&self.program.listing());
        out
    }
}

impl fmt::Display for Robot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Robot {} outcomes={} predictions={}/{} length={} children={}",
            self.name,
            self.total_outcomes,
            self.correct_predictions,
            self.total_predictions,
            self.program.len(),
            self.total_children
        )
    }
}
