use super::breeder::{BreedReport, RobotBreeder};
use super::killer::{KillReport, RobotKiller};
use super::population::Population;
use super::weight::WeightCalculator;
use crate::config::EvolutionConfig;
use crate::engines::evaluation::ProgramFactory;
use rand::Rng;
use std::fmt;

/// What one evolution cycle did to the population
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub size_before: usize,
    pub killed: KillReport,
    pub bred: BreedReport,
    pub injected: usize,
    pub size_after: usize,
}

impl fmt::Display for CycleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "size {} -> {}, died age={} weight={} silent={}, born={}, injected={}, starved={}",
            self.size_before,
            self.size_after,
            self.killed.by_age,
            self.killed.by_weight,
            self.killed.non_predicting,
            self.bred.born,
            self.injected,
            self.bred.starved
        )
    }
}

/// Kill, breed, then inject, always in that order
#[derive(Debug, Clone)]
pub struct EvolutionPolicy {
    calculator: WeightCalculator,
    killer: RobotKiller,
    breeder: RobotBreeder,
    random_robots_at_each_update: f64,
}

impl EvolutionPolicy {
    pub fn new(config: &EvolutionConfig, factory: ProgramFactory) -> Self {
        Self {
            calculator: WeightCalculator::from_config(config),
            killer: RobotKiller::new(config),
            breeder: RobotBreeder::new(config, factory),
            random_robots_at_each_update: config.random_robots_at_each_update,
        }
    }

    pub fn calculator(&self) -> &WeightCalculator {
        &self.calculator
    }

    pub fn breeder(&self) -> &RobotBreeder {
        &self.breeder
    }

    /// Random slots reserved out of the free capacity after deaths
    pub fn random_slots(&self, desired_size: usize, free_capacity: usize) -> usize {
        let wanted = (self.random_robots_at_each_update * desired_size as f64).round() as usize;
        wanted.min(free_capacity)
    }

    pub fn apply_cycle<R: Rng>(&self, population: &mut Population, rng: &mut R) -> CycleReport {
        let size_before = population.len();
        let killed = self.killer.kill(population, &self.calculator, rng);

        let free = population.free_capacity();
        let random = self.random_slots(population.desired_size(), free);
        let bred = self.breeder.breed(population, &self.calculator, free - random, rng);
        let injected = self.breeder.inject_random(population, random, rng);

        CycleReport {
            size_before,
            killed,
            bred,
            injected,
            size_after: population.len(),
        }
    }
}
