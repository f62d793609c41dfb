use super::traits::{ensure, ConfigManifest, ConfigSection, FieldManifest};
use crate::error::TickbreedError;
use serde::{Deserialize, Serialize};

/// Run-level settings: timeline range, training cadence, thresholds and seed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub start_time_point: Option<i64>,
    pub end_time_point: Option<i64>,
    pub perform_training: bool,
    pub bars_between_updates: usize,
    /// Minimum absolute percent change that counts as a market move
    pub result_threshold: f64,
    /// Weight ratio the winning side of a population vote must reach
    pub vote_threshold: f64,
    pub random_seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            start_time_point: None,
            end_time_point: None,
            perform_training: true,
            bars_between_updates: 1,
            result_threshold: 0.0,
            vote_threshold: 1.0,
            random_seed: None,
        }
    }
}

impl ConfigSection for EngineConfig {
    fn section_name() -> &'static str {
        "engine"
    }

    fn validate(&self) -> Result<(), TickbreedError> {
        if let (Some(start), Some(end)) = (self.start_time_point, self.end_time_point) {
            ensure(
                start <= end,
                "End Time Point must be higher or equal Start Time Point",
            )?;
        }
        ensure(self.bars_between_updates > 0, "Bars between updates must be greater than 0")?;
        ensure(
            self.result_threshold.is_finite() && self.result_threshold >= 0.0,
            "Result threshold must be at least 0",
        )?;
        ensure(
            self.vote_threshold.is_finite() && self.vote_threshold >= 1.0,
            "Vote threshold must be at least 1",
        )?;
        Ok(())
    }

    fn to_manifest(&self) -> ConfigManifest {
        ConfigManifest {
            section: "Engine".to_string(),
            fields: vec![
                FieldManifest::new(
                    "start_time_point",
                    serde_json::json!(self.start_time_point),
                    "First time point to process (clamped to data)",
                ),
                FieldManifest::new(
                    "end_time_point",
                    serde_json::json!(self.end_time_point),
                    "Last time point to process (clamped to data)",
                ),
                FieldManifest::new(
                    "perform_training",
                    serde_json::json!(self.perform_training),
                    "Run evolution cycles",
                ),
                FieldManifest::new(
                    "bars_between_updates",
                    serde_json::json!(self.bars_between_updates),
                    "Bars between evolution cycles",
                ),
                FieldManifest::new(
                    "result_threshold",
                    serde_json::json!(self.result_threshold),
                    "Neutral band for realized changes",
                ),
                FieldManifest::new(
                    "vote_threshold",
                    serde_json::json!(self.vote_threshold),
                    "Winning weight ratio for population votes",
                ),
                FieldManifest::new(
                    "random_seed",
                    serde_json::json!(self.random_seed),
                    "Seed for reproducible evolution",
                ),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reversed_range_rejected() {
        let config = EngineConfig {
            start_time_point: Some(20200101),
            end_time_point: Some(20190101),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_vote_threshold_below_one_rejected() {
        let config = EngineConfig {
            vote_threshold: 0.5,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Vote threshold must be at least 1"));
    }
}
