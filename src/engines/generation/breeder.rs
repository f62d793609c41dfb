use super::operators::{crossover, mutate, roulette_selection, MutationRates};
use super::population::Population;
use super::robot::{Robot, RobotName};
use super::weight::{InheritedWeight, WeightCalculator};
use crate::config::EvolutionConfig;
use crate::engines::evaluation::ProgramFactory;
use rand::Rng;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BreedReport {
    pub born: usize,
    /// Slots left empty because no eligible parent remained
    pub starved: usize,
}

/// Refills the population from weight-proportionally chosen parents
#[derive(Debug, Clone)]
pub struct RobotBreeder {
    factory: ProgramFactory,
    rates: MutationRates,
    inherited: InheritedWeight,
    minimum_outcomes_to_allow_breeding: u64,
    minimum_outcomes_between_breeding: u64,
    require_symmetrical_robots: bool,
}

impl RobotBreeder {
    pub fn new(config: &EvolutionConfig, factory: ProgramFactory) -> Self {
        Self {
            factory,
            rates: MutationRates::from_config(config),
            inherited: InheritedWeight::from_config(config),
            minimum_outcomes_to_allow_breeding: config.minimum_outcomes_to_allow_breeding as u64,
            minimum_outcomes_between_breeding: config.minimum_outcomes_between_breeding as u64,
            require_symmetrical_robots: config.require_symmetrical_robots,
        }
    }

    pub fn factory(&self) -> &ProgramFactory {
        &self.factory
    }

    pub fn is_eligible(&self, robot: &Robot) -> bool {
        robot.total_outcomes() >= self.minimum_outcomes_to_allow_breeding
            && robot.outcomes_since_last_child() >= self.minimum_outcomes_between_breeding
    }

    fn candidates(&self, population: &Population, calculator: &WeightCalculator) -> (Vec<RobotName>, Vec<f64>) {
        population
            .robots()
            .iter()
            .filter(|r| self.is_eligible(r))
            .map(|r| (r.name(), r.weight(calculator)))
            .unzip()
    }

    /// Breed up to `slots` children. Eligibility is rechecked before every pick,
    /// so a parent that just bred waits out `minimum_outcomes_between_breeding`.
    pub fn breed<R: Rng>(
        &self,
        population: &mut Population,
        calculator: &WeightCalculator,
        slots: usize,
        rng: &mut R,
    ) -> BreedReport {
        let mut report = BreedReport::default();
        let mut remaining = slots;

        while remaining > 0 {
            let born = if self.require_symmetrical_robots {
                if remaining < 2 {
                    break;
                }
                self.breed_pair(population, calculator, rng)
            } else {
                self.breed_single(population, calculator, rng)
            };
            if born == 0 {
                break;
            }
            report.born += born;
            remaining -= born;
        }

        report.starved = remaining;
        if remaining > 0 {
            log::warn!(
                "Breeding starved: {} of {} slots left empty",
                remaining,
                slots
            );
        }
        report
    }

    fn breed_single<R: Rng>(
        &self,
        population: &mut Population,
        calculator: &WeightCalculator,
        rng: &mut R,
    ) -> usize {
        let (names, weights) = self.candidates(population, calculator);
        let Some(index) = roulette_selection(&weights, rng) else {
            return 0;
        };
        let Some(parent) = population.get(names[index]) else {
            return 0;
        };

        let program = mutate(parent.program(), &self.rates, &self.factory, rng);
        let inherited = self.inherited.inherit_from(parent, calculator);
        let parent_name = parent.name();

        let child = population.add(program, inherited);
        if let Some(parent) = population.get_mut(parent_name) {
            parent.record_child_born();
        }
        log::debug!("Robot {} born from {}", child, parent_name);
        1
    }

    /// Two distinct parents, two complementary children, or nothing
    fn breed_pair<R: Rng>(
        &self,
        population: &mut Population,
        calculator: &WeightCalculator,
        rng: &mut R,
    ) -> usize {
        let (mut names, mut weights) = self.candidates(population, calculator);
        let Some(first) = roulette_selection(&weights, rng) else {
            return 0;
        };
        let first_name = names.swap_remove(first);
        weights.swap_remove(first);
        let Some(second) = roulette_selection(&weights, rng) else {
            return 0;
        };
        let second_name = names[second];

        let (Some(a), Some(b)) = (population.get(first_name), population.get(second_name)) else {
            return 0;
        };
        let (child_a, child_b) = crossover(a.program(), b.program(), rng);
        let child_a = mutate(&child_a, &self.rates, &self.factory, rng);
        let child_b = mutate(&child_b, &self.rates, &self.factory, rng);
        let inherited = self.inherited.inherit_from_pair(a, b, calculator);

        let born_a = population.add(child_a, inherited);
        let born_b = population.add(child_b, inherited);
        for name in [first_name, second_name] {
            if let Some(parent) = population.get_mut(name) {
                parent.record_child_born();
            }
        }
        log::debug!(
            "Robots {} and {} born from {} and {}",
            born_a,
            born_b,
            first_name,
            second_name
        );
        2
    }

    /// Add `count` robots with fresh random programs and no inherited weight
    pub fn inject_random<R: Rng>(&self, population: &mut Population, count: usize, rng: &mut R) -> usize {
        for _ in 0..count {
            let name = population.add_random(&self.factory, rng);
            log::debug!("Robot {} injected", name);
        }
        count
    }
}
