use super::robot::{Robot, RobotName};
use crate::engines::evaluation::{Program, ProgramFactory};
use crate::error::{Result, TickbreedError};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Live robots plus the counter that names new ones.
///
/// Robot order is insertion order and is part of the reproducible state:
/// death and breeding decisions iterate it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Population {
    desired_size: usize,
    next_name: u64,
    robots: Vec<Robot>,
}

impl Population {
    pub fn new(desired_size: usize) -> Self {
        Self {
            desired_size,
            next_name: 0,
            robots: Vec::new(),
        }
    }

    /// A population filled to `desired_size` with random programs
    pub fn random<R: Rng>(desired_size: usize, factory: &ProgramFactory, rng: &mut R) -> Self {
        let mut population = Self::new(desired_size);
        while population.free_capacity() > 0 {
            population.add_random(factory, rng);
        }
        population
    }

    pub fn desired_size(&self) -> usize {
        self.desired_size
    }

    pub fn set_desired_size(&mut self, desired_size: usize) {
        self.desired_size = desired_size;
    }

    pub fn len(&self) -> usize {
        self.robots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.robots.is_empty()
    }

    pub fn free_capacity(&self) -> usize {
        self.desired_size.saturating_sub(self.robots.len())
    }

    pub fn robots(&self) -> &[Robot] {
        &self.robots
    }

    pub fn robots_mut(&mut self) -> &mut [Robot] {
        &mut self.robots
    }

    pub fn get(&self, name: RobotName) -> Option<&Robot> {
        self.robots.iter().find(|r| r.name() == name)
    }

    pub fn get_mut(&mut self, name: RobotName) -> Option<&mut Robot> {
        self.robots.iter_mut().find(|r| r.name() == name)
    }

    fn next_name(&mut self) -> RobotName {
        let name = RobotName::new(self.next_name);
        self.next_name += 1;
        name
    }

    /// Add a newborn robot under a fresh name
    pub fn add(&mut self, program: Program, inherited_weight: f64) -> RobotName {
        let name = self.next_name();
        self.robots.push(Robot::new(name, program, inherited_weight));
        name
    }

    pub fn add_random<R: Rng>(&mut self, factory: &ProgramFactory, rng: &mut R) -> RobotName {
        let program = factory.random_program(rng);
        self.add(program, 0.0)
    }

    /// Insert an existing robot, e.g. one built by hand in a test
    pub fn insert(&mut self, robot: Robot) -> Result<()> {
        if self.get(robot.name()).is_some() {
            return Err(TickbreedError::Validation(format!(
                "Robot {} already in population",
                robot.name()
            )));
        }
        self.next_name = self.next_name.max(robot.name().value() + 1);
        self.robots.push(robot);
        Ok(())
    }

    /// Remove every robot named in `names`, returning how many went
    pub fn remove_all(&mut self, names: &HashSet<RobotName>) -> usize {
        let before = self.robots.len();
        self.robots.retain(|r| !names.contains(&r.name()));
        before - self.robots.len()
    }

    /// Check loaded state: unique names, counter ahead of every name, valid programs
    pub fn check(&self, factory: &ProgramFactory) -> Result<()> {
        let mut seen = HashSet::with_capacity(self.robots.len());
        for robot in &self.robots {
            if !seen.insert(robot.name()) {
                return Err(TickbreedError::Validation(format!(
                    "Duplicate robot name {}",
                    robot.name()
                )));
            }
            if robot.name().value() >= self.next_name {
                return Err(TickbreedError::Validation(format!(
                    "Robot {} was named after the population counter ({})",
                    robot.name(),
                    self.next_name
                )));
            }
            if robot.correct_predictions() > robot.total_predictions()
                || robot.total_predictions() > robot.total_outcomes()
            {
                return Err(TickbreedError::Validation(format!(
                    "Robot {} has {} correct of {} predictions over {} outcomes",
                    robot.name(),
                    robot.correct_predictions(),
                    robot.total_predictions(),
                    robot.total_outcomes()
                )));
            }
            factory.check(robot.program()).map_err(|e| {
                TickbreedError::Validation(format!("Robot {}: {}", robot.name(), e))
            })?;
        }
        Ok(())
    }
}

/// JSON persistence for populations
pub struct PopulationStore {
    path: PathBuf,
}

impl PopulationStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save(&self, population: &Population) -> Result<()> {
        let json = serde_json::to_string_pretty(population)?;
        std::fs::write(&self.path, json).map_err(|e| {
            TickbreedError::Persistence(format!("Failed to write {}: {}", self.path.display(), e))
        })?;
        log::info!(
            "Saved {} robots to {}",
            population.len(),
            self.path.display()
        );
        Ok(())
    }

    /// Load and check against the current program bounds and data shape
    pub fn load(&self, factory: &ProgramFactory) -> Result<Population> {
        let json = std::fs::read_to_string(&self.path).map_err(|e| {
            TickbreedError::Persistence(format!("Failed to read {}: {}", self.path.display(), e))
        })?;
        let population: Population = serde_json::from_str(&json)?;
        population.check(factory)?;
        log::info!(
            "Loaded {} robots from {}",
            population.len(),
            self.path.display()
        );
        Ok(population)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PopulationConfig;
    use crate::engines::evaluation::Instruction;
    use crate::types::{DatasetName, Signal};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn factory() -> ProgramFactory {
        let config = PopulationConfig {
            minimum_robot_instructions: 2,
            maximum_robot_instructions: 8,
            maximum_registers: 2,
            maximum_data_offset: 4,
            ..Default::default()
        };
        ProgramFactory::new(&config, 2)
    }

    #[test]
    fn test_random_population_has_unique_names() {
        let mut rng = StdRng::seed_from_u64(2);
        let population = Population::random(25, &factory(), &mut rng);
        assert_eq!(population.len(), 25);
        assert_eq!(population.free_capacity(), 0);
        let names: HashSet<_> = population.robots().iter().map(|r| r.name()).collect();
        assert_eq!(names.len(), 25);
        assert!(population.check(&factory()).is_ok());
    }

    #[test]
    fn test_names_not_reused_after_removal() {
        let mut population = Population::new(3);
        let a = population.add(Program::new(vec![Instruction::EmitLong; 2], 1), 0.0);
        population.remove_all(&HashSet::from([a]));
        let b = population.add(Program::new(vec![Instruction::EmitLong; 2], 1), 0.0);
        assert_ne!(a, b);
    }

    #[test]
    fn test_insert_rejects_duplicates() {
        let mut population = Population::new(3);
        let robot = Robot::new(RobotName::new(9), Program::new(vec![Instruction::EmitLong; 2], 1), 0.0);
        population.insert(robot.clone()).unwrap();
        assert!(population.insert(robot).is_err());
        assert_eq!(population.add(Program::empty(), 0.0), RobotName::new(10));
    }

    #[test]
    fn test_store_round_trip_keeps_state() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut population = Population::random(5, &factory(), &mut rng);
        let name = DatasetName::from("SPX");
        for robot in population.robots_mut() {
            robot.record_new_prediction(&name, Signal::Long);
            robot.record_new_prediction(&name, Signal::Short);
            robot.resolve_market_change(&name, 1.0, 0.0);
        }

        let path = std::env::temp_dir().join(format!("tickbreed-pop-{}.json", std::process::id()));
        let store = PopulationStore::new(&path);
        store.save(&population).unwrap();
        let mut loaded = store.load(&factory()).unwrap();
        assert_eq!(loaded.len(), population.len());
        for (a, b) in loaded.robots().iter().zip(population.robots()) {
            assert_eq!(a.name(), b.name());
            assert_eq!(a.program().len(), b.program().len());
            assert_eq!(a.total_outcomes(), 1);
            assert_eq!(a.correct_predictions(), b.correct_predictions());
            assert_eq!(a.pending_signal(&name), Some(Signal::Short));
        }
        assert_eq!(loaded.add(Program::empty(), 0.0), RobotName::new(5));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_load_rejects_out_of_bounds_programs() {
        let mut population = Population::new(1);
        population.add(Program::new(vec![Instruction::EmitLong; 20], 1), 0.0);

        let path = std::env::temp_dir().join(format!("tickbreed-bad-{}.json", std::process::id()));
        let store = PopulationStore::new(&path);
        store.save(&population).unwrap();
        assert!(store.load(&factory()).is_err());
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_load_rejects_inconsistent_counters() {
        let mut population = Population::new(1);
        let name = population.add(Program::new(vec![Instruction::EmitLong; 2], 1), 0.0);
        let dataset = DatasetName::from("SPX");
        let robot = population.get_mut(name).unwrap();
        robot.record_new_prediction(&dataset, Signal::Long);
        robot.record_new_prediction(&dataset, Signal::Long);
        robot.resolve_market_change(&dataset, -1.0, 0.0);

        let mut json = serde_json::to_value(&population).unwrap();
        json["robots"][0]["correct_predictions"] = serde_json::json!(7);
        let tampered: Population = serde_json::from_value(json).unwrap();
        assert_eq!(tampered.robots()[0].wrong_predictions(), 0);

        let path = std::env::temp_dir().join(format!("tickbreed-counters-{}.json", std::process::id()));
        let store = PopulationStore::new(&path);
        store.save(&tampered).unwrap();
        let err = store.load(&factory()).unwrap_err();
        assert!(err.to_string().contains("7 correct of 1 predictions"));
        std::fs::remove_file(&path).ok();
    }
}
