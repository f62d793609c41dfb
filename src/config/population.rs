use super::traits::{ensure, ConfigManifest, ConfigSection, FieldManifest};
use crate::error::TickbreedError;
use serde::{Deserialize, Serialize};

/// Shape of the population and of the programs its robots carry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopulationConfig {
    pub desired_size: usize,
    pub minimum_robot_instructions: usize,
    pub maximum_robot_instructions: usize,
    pub maximum_processor_instruction_factor: usize,
    pub maximum_data_offset: usize,
    pub ignore_columns: usize,
    pub maximum_registers: usize,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            desired_size: 1000,
            minimum_robot_instructions: 16,
            maximum_robot_instructions: 1024,
            maximum_processor_instruction_factor: 256,
            maximum_data_offset: 256,
            ignore_columns: 0,
            maximum_registers: 8,
        }
    }
}

impl ConfigSection for PopulationConfig {
    fn section_name() -> &'static str {
        "population"
    }

    fn validate(&self) -> Result<(), TickbreedError> {
        ensure(self.desired_size > 0, "Population desired size must be greater than 0")?;
        ensure(self.maximum_data_offset > 0, "Maximum Data Offset must be greater than 0")?;
        ensure(
            self.minimum_robot_instructions > 0,
            "Minimum robot instructions must be greater than 0",
        )?;
        ensure(
            self.maximum_robot_instructions > self.minimum_robot_instructions,
            format!(
                "Maximum robot instructions must be greater than {}",
                self.minimum_robot_instructions
            ),
        )?;
        ensure(
            self.maximum_processor_instruction_factor > 0,
            "Maximum processor instruction factor must be greater than 0",
        )?;
        ensure(self.maximum_registers > 0, "Maximum registers must be greater than 0")?;
        Ok(())
    }

    fn to_manifest(&self) -> ConfigManifest {
        ConfigManifest {
            section: "Population".to_string(),
            fields: vec![
                FieldManifest::new(
                    "desired_size",
                    serde_json::json!(self.desired_size),
                    "Number of robots the population is refilled to",
                ),
                FieldManifest::new(
                    "minimum_robot_instructions",
                    serde_json::json!(self.minimum_robot_instructions),
                    "Shortest allowed program",
                ),
                FieldManifest::new(
                    "maximum_robot_instructions",
                    serde_json::json!(self.maximum_robot_instructions),
                    "Longest allowed program",
                ),
                FieldManifest::new(
                    "maximum_processor_instruction_factor",
                    serde_json::json!(self.maximum_processor_instruction_factor),
                    "Dispatch budget per program instruction",
                ),
                FieldManifest::new(
                    "maximum_data_offset",
                    serde_json::json!(self.maximum_data_offset),
                    "How many bars back a program may read",
                ),
                FieldManifest::new(
                    "ignore_columns",
                    serde_json::json!(self.ignore_columns),
                    "Leading data columns hidden from programs",
                ),
                FieldManifest::new(
                    "maximum_registers",
                    serde_json::json!(self.maximum_registers),
                    "Upper bound for a program's register count",
                ),
            ],
        }
    }
}
