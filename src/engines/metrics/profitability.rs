use crate::types::{Bar, Outcome, Signal};
use std::collections::HashMap;

/// A resolved population vote: the signal and the change it was held through
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoteRecord {
    pub bar: Bar,
    pub signal: Signal,
    pub change: f64,
    pub outcome: Outcome,
}

impl VoteRecord {
    /// Percent gained by holding the signal through the change
    pub fn profit(&self) -> f64 {
        f64::from(self.signal.polarity()) * self.change
    }
}

/// Running vote accounting for one dataset.
///
/// The vote cast at one bar is held until the next bar with data resolves it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatasetStats {
    pending: Option<Signal>,
    records: Vec<VoteRecord>,
    correct: usize,
    wrong: usize,
    out: usize,
}

impl DatasetStats {
    pub fn records(&self) -> &[VoteRecord] {
        &self.records
    }

    pub fn correct(&self) -> usize {
        self.correct
    }

    pub fn wrong(&self) -> usize {
        self.wrong
    }

    pub fn out(&self) -> usize {
        self.out
    }

    pub fn total_profit(&self) -> f64 {
        self.records.iter().map(VoteRecord::profit).sum()
    }

    /// Resolve the held vote against the change realized at `bar`
    pub fn resolve(&mut self, bar: Bar, change: f64, threshold: f64) -> Option<Outcome> {
        let signal = self.pending.take()?;
        let outcome = Outcome::resolve(signal, change, threshold);
        match outcome {
            Outcome::Correct => self.correct += 1,
            Outcome::Wrong => self.wrong += 1,
            Outcome::Out => self.out += 1,
        }
        self.records.push(VoteRecord {
            bar,
            signal,
            change,
            outcome,
        });
        Some(outcome)
    }

    pub fn hold(&mut self, signal: Signal) {
        self.pending = Some(signal);
    }

    pub fn metrics(&self) -> HashMap<String, f64> {
        ProfitabilityMetrics::calculate(&self.records)
    }
}

pub struct ProfitabilityMetrics;

impl ProfitabilityMetrics {
    /// Summary of the directional votes in `records`; `Out` votes are ignored
    pub fn calculate(records: &[VoteRecord]) -> HashMap<String, f64> {
        let mut metrics = HashMap::new();

        let trades: Vec<&VoteRecord> = records.iter().filter(|r| r.signal.is_directional()).collect();
        if trades.is_empty() {
            return metrics;
        }

        let total_profit: f64 = trades.iter().map(|t| t.profit()).sum();
        let winning: Vec<&&VoteRecord> = trades.iter().filter(|t| t.profit() > 0.0).collect();
        let losing: Vec<&&VoteRecord> = trades.iter().filter(|t| t.profit() <= 0.0).collect();

        metrics.insert("total_profit_pct".to_string(), total_profit);
        metrics.insert("trades".to_string(), trades.len() as f64);

        let win_rate = (winning.len() as f64 / trades.len() as f64) * 100.0;
        metrics.insert("win_rate".to_string(), win_rate);

        if !winning.is_empty() {
            let avg_win: f64 = winning.iter().map(|t| t.profit()).sum::<f64>() / winning.len() as f64;
            metrics.insert("avg_win".to_string(), avg_win);
        }

        if !losing.is_empty() {
            let avg_loss: f64 =
                losing.iter().map(|t| t.profit().abs()).sum::<f64>() / losing.len() as f64;
            metrics.insert("avg_loss".to_string(), avg_loss);
        }

        let gross_profit: f64 = winning.iter().map(|t| t.profit()).sum();
        let gross_loss: f64 = losing.iter().map(|t| t.profit().abs()).sum();
        if gross_loss > 0.0 {
            metrics.insert("profit_factor".to_string(), gross_profit / gross_loss);
        }

        metrics
    }
}
