use crate::types::Signal;

/// Weighted population vote for one dataset at one bar
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct VoteTally {
    pub long_weight: f64,
    pub short_weight: f64,
    pub long_count: usize,
    pub short_count: usize,
    pub out_count: usize,
}

impl VoteTally {
    pub fn add(&mut self, signal: Signal, weight: f64) {
        let weight = if weight.is_finite() { weight.max(0.0) } else { 0.0 };
        match signal {
            Signal::Long => {
                self.long_weight += weight;
                self.long_count += 1;
            }
            Signal::Short => {
                self.short_weight += weight;
                self.short_count += 1;
            }
            Signal::Out => self.out_count += 1,
        }
    }

    pub fn from_votes<I: IntoIterator<Item = (Signal, f64)>>(votes: I) -> Self {
        let mut tally = Self::default();
        for (signal, weight) in votes {
            tally.add(signal, weight);
        }
        tally
    }

    /// A side wins when it outweighs the other by at least `threshold` times
    /// (strictly, so ties stay `Out`). No weight at all is `Out`.
    pub fn decide(&self, threshold: f64) -> Signal {
        let (long, short) = (self.long_weight, self.short_weight);
        if long > short && long >= short * threshold {
            Signal::Long
        } else if short > long && short >= long * threshold {
            Signal::Short
        } else {
            Signal::Out
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heavier_side_wins() {
        let tally = VoteTally::from_votes([(Signal::Long, 3.0), (Signal::Short, 1.0), (Signal::Out, 9.0)]);
        assert_eq!(tally.decide(1.0), Signal::Long);
        assert_eq!(tally.out_count, 1);
    }

    #[test]
    fn test_threshold_requires_margin() {
        let tally = VoteTally::from_votes([(Signal::Long, 3.0), (Signal::Short, 2.0)]);
        assert_eq!(tally.decide(1.0), Signal::Long);
        assert_eq!(tally.decide(2.0), Signal::Out);
    }

    #[test]
    fn test_ties_and_empty_are_out() {
        assert_eq!(VoteTally::default().decide(1.0), Signal::Out);
        let tally = VoteTally::from_votes([(Signal::Long, 2.0), (Signal::Short, 2.0)]);
        assert_eq!(tally.decide(1.0), Signal::Out);
        let zero = VoteTally::from_votes([(Signal::Short, 0.0)]);
        assert_eq!(zero.decide(1.0), Signal::Out);
    }

    #[test]
    fn test_unopposed_side_wins() {
        let tally = VoteTally::from_votes([(Signal::Short, 0.5)]);
        assert_eq!(tally.decide(5.0), Signal::Short);
    }
}
