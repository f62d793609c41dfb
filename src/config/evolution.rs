use super::traits::{ensure, zero_to_one, ConfigManifest, ConfigSection, FieldManifest};
use crate::error::TickbreedError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionConfig {
    pub maximum_death_by_age: f64,
    pub maximum_death_by_weight: f64,
    pub probability_of_death_by_age: f64,
    pub probability_of_death_by_weight: f64,
    pub weight_mode: WeightMode,
    pub weight_exponent: f64,
    pub inherited_child_weight: f64,
    pub inherited_child_weight_mode: InheritedWeightMode,
    pub protect_robots_until_outcomes: usize,
    pub new_instruction_probability: f64,
    pub instruction_mutation_probability: f64,
    pub skip_instruction_probability: f64,
    pub minimum_outcomes_to_allow_breeding: usize,
    pub minimum_outcomes_between_breeding: usize,
    pub kill_non_predicting_robots: bool,
    pub random_robots_at_each_update: f64,
    pub protect_best_robots: f64,
    pub require_symmetrical_robots: bool,
}

/// How earned weight is derived from prediction counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WeightMode {
    /// Correct minus wrong predictions
    WinCount,
    /// Accuracy edge over a coin flip
    WinRate,
    /// Raw accuracy
    Proportional,
}

/// How a child's inherited weight is derived from its parent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InheritedWeightMode {
    Parents,
    Ancestors,
    AncestorsLog,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            maximum_death_by_age: 0.01,
            maximum_death_by_weight: 0.1,
            probability_of_death_by_age: 0.5,
            probability_of_death_by_weight: 0.5,
            weight_mode: WeightMode::WinCount,
            weight_exponent: 2.0,
            inherited_child_weight: 0.0,
            inherited_child_weight_mode: InheritedWeightMode::AncestorsLog,
            protect_robots_until_outcomes: 100,
            new_instruction_probability: 0.01,
            instruction_mutation_probability: 0.01,
            skip_instruction_probability: 0.01,
            minimum_outcomes_to_allow_breeding: 50,
            minimum_outcomes_between_breeding: 50,
            kill_non_predicting_robots: true,
            random_robots_at_each_update: 0.02,
            protect_best_robots: 0.02,
            require_symmetrical_robots: true,
        }
    }
}

impl ConfigSection for EvolutionConfig {
    fn section_name() -> &'static str {
        "evolution"
    }

    fn validate(&self) -> Result<(), TickbreedError> {
        let fractions = [
            (self.maximum_death_by_age, "Maximum Death by Age"),
            (self.maximum_death_by_weight, "Maximum Death by Weight"),
            (self.probability_of_death_by_age, "Probability Death by Age"),
            (self.probability_of_death_by_weight, "Probability Death by Weight"),
            (self.inherited_child_weight, "Inherited Child's Weight"),
            (self.new_instruction_probability, "New Instruction Probability"),
            (self.instruction_mutation_probability, "Instruction Mutation Probability"),
            (self.skip_instruction_probability, "Skip Instruction Probability"),
            (self.random_robots_at_each_update, "Random Robots at Each Update"),
            (self.protect_best_robots, "Protect Best Robots"),
        ];
        for (value, name) in fractions {
            ensure(zero_to_one(value), format!("{} must be between 0.0 and 1.0", name))?;
        }
        ensure(
            self.weight_exponent.is_finite() && self.weight_exponent > 0.0,
            "Weight exponent must be greater than 0",
        )?;
        Ok(())
    }

    fn to_manifest(&self) -> ConfigManifest {
        use serde_json::json;
        ConfigManifest {
            section: "Evolution".to_string(),
            fields: vec![
                FieldManifest::new(
                    "maximum_death_by_age",
                    json!(self.maximum_death_by_age),
                    "Largest share of the population that can die of age in one cycle",
                ),
                FieldManifest::new(
                    "maximum_death_by_weight",
                    json!(self.maximum_death_by_weight),
                    "Share of the lightest robots considered for death in one cycle",
                ),
                FieldManifest::new(
                    "probability_of_death_by_age",
                    json!(self.probability_of_death_by_age),
                    "Chance that an old robot considered for death dies",
                ),
                FieldManifest::new(
                    "probability_of_death_by_weight",
                    json!(self.probability_of_death_by_weight),
                    "Chance that a light robot considered for death dies",
                ),
                FieldManifest::new(
                    "weight_mode",
                    json!(format!("{:?}", self.weight_mode)),
                    "Formula turning prediction counts into earned weight",
                ),
                FieldManifest::new(
                    "weight_exponent",
                    json!(self.weight_exponent),
                    "Power applied to the earned weight",
                ),
                FieldManifest::new(
                    "inherited_child_weight",
                    json!(self.inherited_child_weight),
                    "Fraction of parent weight passed to a child",
                ),
                FieldManifest::new(
                    "inherited_child_weight_mode",
                    json!(format!("{:?}", self.inherited_child_weight_mode)),
                    "Which parent weight a child inherits from",
                ),
                FieldManifest::new(
                    "protect_robots_until_outcomes",
                    json!(self.protect_robots_until_outcomes),
                    "Robots with fewer outcomes cannot die of age or weight",
                ),
                FieldManifest::new(
                    "new_instruction_probability",
                    json!(self.new_instruction_probability),
                    "Chance of inserting a random instruction at each slot",
                ),
                FieldManifest::new(
                    "instruction_mutation_probability",
                    json!(self.instruction_mutation_probability),
                    "Chance of replacing each inherited instruction",
                ),
                FieldManifest::new(
                    "skip_instruction_probability",
                    json!(self.skip_instruction_probability),
                    "Chance of dropping each inherited instruction",
                ),
                FieldManifest::new(
                    "minimum_outcomes_to_allow_breeding",
                    json!(self.minimum_outcomes_to_allow_breeding),
                    "Outcomes a robot needs before it can parent",
                ),
                FieldManifest::new(
                    "minimum_outcomes_between_breeding",
                    json!(self.minimum_outcomes_between_breeding),
                    "Outcomes a parent waits between children",
                ),
                FieldManifest::new(
                    "kill_non_predicting_robots",
                    json!(self.kill_non_predicting_robots),
                    "Remove robots that never emitted Long or Short",
                ),
                FieldManifest::new(
                    "random_robots_at_each_update",
                    json!(self.random_robots_at_each_update),
                    "Share of the desired size refilled with random robots",
                ),
                FieldManifest::new(
                    "protect_best_robots",
                    json!(self.protect_best_robots),
                    "Share of the heaviest robots exempt from death",
                ),
                FieldManifest::new(
                    "require_symmetrical_robots",
                    json!(self.require_symmetrical_robots),
                    "Breed complementary pairs by crossover",
                ),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(EvolutionConfig::default().validate().is_ok());
    }

    #[test]
    fn test_probability_out_of_range() {
        let config = EvolutionConfig {
            skip_instruction_probability: 1.5,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err
            .to_string()
            .contains("Skip Instruction Probability must be between 0.0 and 1.0"));
    }

    #[test]
    fn test_nan_probability_rejected() {
        let config = EvolutionConfig {
            probability_of_death_by_weight: f64::NAN,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_manifest_lists_every_field() {
        let manifest = EvolutionConfig::default().to_manifest();
        assert_eq!(manifest.fields.len(), 18);
        assert!(manifest.render().contains("weight_mode WinCount\n"));
        assert!(manifest.fields.iter().all(|f| !f.description.is_empty()));
    }
}
