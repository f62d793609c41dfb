use crate::engines::generation::{Population, WeightCalculator};
use std::fmt;

/// Population snapshot for reports
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PopulationSummary {
    pub size: usize,
    pub desired_size: usize,
    pub mean_weight: f64,
    pub max_weight: f64,
    pub predicting: usize,
    pub total_children: u64,
    pub mean_length: f64,
}

impl PopulationSummary {
    pub fn from_population(population: &Population, calculator: &WeightCalculator) -> Self {
        let robots = population.robots();
        let mut summary = Self {
            size: robots.len(),
            desired_size: population.desired_size(),
            ..Default::default()
        };
        if robots.is_empty() {
            return summary;
        }

        let mut weight_sum = 0.0;
        let mut length_sum = 0usize;
        for robot in robots {
            let weight = robot.weight(calculator);
            weight_sum += weight;
            summary.max_weight = summary.max_weight.max(weight);
            length_sum += robot.program().len();
            summary.total_children += robot.total_children();
            if robot.is_predicting() {
                summary.predicting += 1;
            }
        }
        summary.mean_weight = weight_sum / robots.len() as f64;
        summary.mean_length = length_sum as f64 / robots.len() as f64;
        summary
    }

    pub fn predicting_share(&self) -> f64 {
        if self.size == 0 {
            0.0
        } else {
            self.predicting as f64 / self.size as f64
        }
    }
}

impl fmt::Display for PopulationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "size {}", self.size)?;
        writeln!(f, "desired_size {}", self.desired_size)?;
        writeln!(f, "mean_weight {:.4}", self.mean_weight)?;
        writeln!(f, "max_weight {:.4}", self.max_weight)?;
        writeln!(f, "predicting_share {:.4}", self.predicting_share())?;
        writeln!(f, "total_children {}", self.total_children)?;
        writeln!(f, "mean_length {:.2}", self.mean_length)
    }
}
