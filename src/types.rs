use serde::{Deserialize, Serialize};
use std::fmt;

/// Dense index into the master timeline (`0..bar_count`)
pub type Bar = usize;

/// Name of one market dataset, usually the file stem it was loaded from
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DatasetName(String);

impl DatasetName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DatasetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DatasetName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Directional prediction emitted by one program execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Signal {
    Long,
    Short,
    Out,
}

impl Signal {
    /// +1 / -1 / 0, used for bias accounting
    pub fn polarity(self) -> i32 {
        match self {
            Signal::Long => 1,
            Signal::Short => -1,
            Signal::Out => 0,
        }
    }

    pub fn from_sign(value: f64) -> Self {
        if value > 0.0 {
            Signal::Long
        } else if value < 0.0 {
            Signal::Short
        } else {
            Signal::Out
        }
    }

    pub fn is_directional(self) -> bool {
        self != Signal::Out
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Signal::Long => "Long",
            Signal::Short => "Short",
            Signal::Out => "Out",
        };
        f.write_str(name)
    }
}

/// Resolved correctness of a past signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    Correct,
    Wrong,
    Out,
}

impl Outcome {
    /// Compare a signal against the realized percent change.
    ///
    /// Changes whose magnitude does not exceed `threshold` are neutral and
    /// resolve to `Out`, as does an `Out` signal.
    pub fn resolve(signal: Signal, realized_change: f64, threshold: f64) -> Self {
        let direction = if realized_change > threshold {
            Signal::Long
        } else if realized_change < -threshold {
            Signal::Short
        } else {
            return Outcome::Out;
        };

        match signal {
            Signal::Out => Outcome::Out,
            s if s == direction => Outcome::Correct,
            _ => Outcome::Wrong,
        }
    }
}
