use super::population::Population;
use super::robot::{Robot, RobotName};
use super::weight::WeightCalculator;
use crate::config::EvolutionConfig;
use rand::Rng;
use std::cmp::Ordering;
use std::collections::HashSet;

/// Robots removed by one kill pass, by reason
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KillReport {
    pub by_age: usize,
    pub by_weight: usize,
    pub non_predicting: usize,
}

impl KillReport {
    pub fn total(&self) -> usize {
        self.by_age + self.by_weight + self.non_predicting
    }
}

/// Applies the protection, age, weight and non-predicting death rules
#[derive(Debug, Clone)]
pub struct RobotKiller {
    maximum_death_by_age: f64,
    maximum_death_by_weight: f64,
    probability_of_death_by_age: f64,
    probability_of_death_by_weight: f64,
    protect_robots_until_outcomes: u64,
    protect_best_robots: f64,
    kill_non_predicting_robots: bool,
}

impl RobotKiller {
    pub fn new(config: &EvolutionConfig) -> Self {
        Self {
            maximum_death_by_age: config.maximum_death_by_age,
            maximum_death_by_weight: config.maximum_death_by_weight,
            probability_of_death_by_age: config.probability_of_death_by_age,
            probability_of_death_by_weight: config.probability_of_death_by_weight,
            protect_robots_until_outcomes: config.protect_robots_until_outcomes as u64,
            protect_best_robots: config.protect_best_robots,
            kill_non_predicting_robots: config.kill_non_predicting_robots,
        }
    }

    /// Run every death rule once, in order, against the population
    pub fn kill<R: Rng>(
        &self,
        population: &mut Population,
        calculator: &WeightCalculator,
        rng: &mut R,
    ) -> KillReport {
        let size = population.len();
        let mut report = KillReport::default();
        if size == 0 {
            return report;
        }

        let weights: Vec<(RobotName, f64)> = population
            .robots()
            .iter()
            .map(|r| (r.name(), r.weight(calculator)))
            .collect();
        let protected = self.protected(population.robots(), &weights);
        let mut dead: HashSet<RobotName> = HashSet::new();

        // Oldest first
        let age_cap = (self.maximum_death_by_age * size as f64).round() as usize;
        let mut by_age: Vec<&Robot> = population
            .robots()
            .iter()
            .filter(|r| !protected.contains(&r.name()))
            .collect();
        by_age.sort_by(|a, b| {
            b.total_outcomes()
                .cmp(&a.total_outcomes())
                .then_with(|| a.name().cmp(&b.name()))
        });
        for robot in by_age {
            if report.by_age >= age_cap {
                break;
            }
            if rng.gen::<f64>() < self.probability_of_death_by_age {
                log::debug!("Robot {} died of age ({} outcomes)", robot.name(), robot.total_outcomes());
                dead.insert(robot.name());
                report.by_age += 1;
            }
        }

        // Lightest first
        let weight_cap = (self.maximum_death_by_weight * size as f64).round() as usize;
        let mut by_weight: Vec<(RobotName, f64)> = weights
            .iter()
            .filter(|(name, _)| !protected.contains(name) && !dead.contains(name))
            .copied()
            .collect();
        by_weight.sort_by(|a, b| {
            a.1.partial_cmp(&b.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        for (name, weight) in by_weight.into_iter().take(weight_cap) {
            if rng.gen::<f64>() < self.probability_of_death_by_weight {
                log::debug!("Robot {} died of weight ({:.4})", name, weight);
                dead.insert(name);
                report.by_weight += 1;
            }
        }

        if self.kill_non_predicting_robots {
            for robot in population.robots() {
                if Self::never_predicted(robot) && dead.insert(robot.name()) {
                    log::debug!("Robot {} removed, never predicted", robot.name());
                    report.non_predicting += 1;
                }
            }
        }

        population.remove_all(&dead);
        report
    }

    /// Young robots plus the heaviest `protect_best_robots` share of the population
    pub fn protected(&self, robots: &[Robot], weights: &[(RobotName, f64)]) -> HashSet<RobotName> {
        let mut protected: HashSet<RobotName> = robots
            .iter()
            .filter(|r| r.total_outcomes() < self.protect_robots_until_outcomes)
            .map(|r| r.name())
            .collect();

        let best = (self.protect_best_robots * robots.len() as f64).ceil() as usize;
        if best > 0 {
            let mut ranked = weights.to_vec();
            ranked.sort_by(|a, b| {
                b.1.partial_cmp(&a.1)
                    .unwrap_or(Ordering::Equal)
                    .then_with(|| a.0.cmp(&b.0))
            });
            protected.extend(ranked.into_iter().take(best).map(|(name, _)| name));
        }
        protected
    }

    /// Was asked to predict at least once and only ever answered `Out`
    pub fn never_predicted(robot: &Robot) -> bool {
        robot.prediction_calls() > 0 && !robot.is_predicting()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WeightMode;
    use crate::engines::evaluation::{Instruction, Program};
    use crate::types::{DatasetName, Signal};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn program() -> Program {
        Program::new(vec![Instruction::EmitLong; 2], 1)
    }

    /// Robot with `outcomes` resolved signals, `correct` of them right
    fn seasoned(population: &mut Population, outcomes: usize, correct: usize) -> RobotName {
        let name = population.add(program(), 0.0);
        let robot = population.get_mut(name).unwrap();
        let dataset = DatasetName::from("D");
        robot.record_new_prediction(&dataset, Signal::Long);
        for i in 0..outcomes {
            robot.record_new_prediction(&dataset, Signal::Long);
            let change = if i < correct { 1.0 } else { -1.0 };
            robot.resolve_market_change(&dataset, change, 0.0);
        }
        name
    }

    fn config() -> EvolutionConfig {
        EvolutionConfig {
            protect_robots_until_outcomes: 0,
            protect_best_robots: 0.0,
            maximum_death_by_age: 0.0,
            maximum_death_by_weight: 0.0,
            probability_of_death_by_age: 1.0,
            probability_of_death_by_weight: 1.0,
            kill_non_predicting_robots: false,
            ..Default::default()
        }
    }

    fn calculator() -> WeightCalculator {
        WeightCalculator::new(WeightMode::WinCount, 2.0)
    }

    #[test]
    fn test_age_kills_oldest_up_to_cap() {
        let mut population = Population::new(10);
        let oldest = seasoned(&mut population, 30, 15);
        for _ in 0..9 {
            seasoned(&mut population, 10, 5);
        }
        let killer = RobotKiller::new(&EvolutionConfig {
            maximum_death_by_age: 0.1,
            ..config()
        });
        let report = killer.kill(&mut population, &calculator(), &mut StdRng::seed_from_u64(1));
        assert_eq!(report.by_age, 1);
        assert!(population.get(oldest).is_none());
        assert_eq!(population.len(), 9);
    }

    #[test]
    fn test_weight_kills_lightest() {
        let mut population = Population::new(4);
        let light = seasoned(&mut population, 10, 2);
        let heavy: Vec<_> = (0..3).map(|_| seasoned(&mut population, 10, 9)).collect();
        let killer = RobotKiller::new(&EvolutionConfig {
            maximum_death_by_weight: 0.25,
            ..config()
        });
        let report = killer.kill(&mut population, &calculator(), &mut StdRng::seed_from_u64(1));
        assert_eq!(report.by_weight, 1);
        assert!(population.get(light).is_none());
        assert!(heavy.iter().all(|n| population.get(*n).is_some()));
    }

    #[test]
    fn test_protection_by_outcomes_and_rank() {
        let mut population = Population::new(4);
        let young = seasoned(&mut population, 2, 0);
        let best = seasoned(&mut population, 20, 20);
        seasoned(&mut population, 20, 5);
        seasoned(&mut population, 20, 6);
        let killer = RobotKiller::new(&EvolutionConfig {
            maximum_death_by_age: 1.0,
            protect_robots_until_outcomes: 5,
            protect_best_robots: 0.25,
            ..config()
        });
        let report = killer.kill(&mut population, &calculator(), &mut StdRng::seed_from_u64(1));
        assert_eq!(report.by_age, 2);
        assert!(population.get(young).is_some());
        assert!(population.get(best).is_some());
    }

    #[test]
    fn test_non_predicting_ignores_protection() {
        let mut population = Population::new(3);
        let silent = population.add(program(), 0.0);
        population
            .get_mut(silent)
            .unwrap()
            .record_new_prediction(&DatasetName::from("D"), Signal::Out);
        let newborn = population.add(program(), 0.0);
        let killer = RobotKiller::new(&EvolutionConfig {
            protect_robots_until_outcomes: 100,
            kill_non_predicting_robots: true,
            ..config()
        });
        let report = killer.kill(&mut population, &calculator(), &mut StdRng::seed_from_u64(1));
        assert_eq!(report.non_predicting, 1);
        assert!(population.get(silent).is_none());
        assert!(population.get(newborn).is_some());
    }

    #[test]
    fn test_zero_probability_kills_nothing() {
        let mut population = Population::new(5);
        for _ in 0..5 {
            seasoned(&mut population, 10, 1);
        }
        let killer = RobotKiller::new(&EvolutionConfig {
            maximum_death_by_age: 1.0,
            maximum_death_by_weight: 1.0,
            probability_of_death_by_age: 0.0,
            probability_of_death_by_weight: 0.0,
            ..config()
        });
        let report = killer.kill(&mut population, &calculator(), &mut StdRng::seed_from_u64(1));
        assert_eq!(report.total(), 0);
        assert_eq!(population.len(), 5);
    }
}
