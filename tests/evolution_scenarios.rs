use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tickbreed::config::{EvolutionConfig, PopulationConfig, WeightMode};
use tickbreed::engines::evaluation::{Instruction, Program, ProgramFactory};
use tickbreed::engines::generation::{EvolutionPolicy, Population, Robot, RobotName, WeightCalculator};
use tickbreed::types::{DatasetName, Signal};

fn factory() -> ProgramFactory {
    let config = PopulationConfig {
        minimum_robot_instructions: 4,
        maximum_robot_instructions: 32,
        maximum_registers: 3,
        maximum_data_offset: 8,
        ..Default::default()
    };
    ProgramFactory::new(&config, 2)
}

/// Robot whose record is `predictions` directional calls, `correct` of them
/// right, padded with `Out` calls up to `outcomes` resolved signals
fn robot_with_record(name: u64, outcomes: usize, predictions: usize, correct: usize) -> Robot {
    let program = Program::new(vec![Instruction::EmitLong; 4], 1);
    let mut robot = Robot::new(RobotName::new(name), program, 0.0);
    let dataset = DatasetName::from("SCENARIO");

    let mut signals = Vec::new();
    signals.extend(std::iter::repeat(Signal::Long).take(correct));
    signals.extend(std::iter::repeat(Signal::Short).take(predictions - correct));
    signals.extend(std::iter::repeat(Signal::Out).take(outcomes - predictions));

    robot.record_new_prediction(&dataset, signals.first().copied().unwrap_or(Signal::Out));
    for i in 0..signals.len() {
        let next = signals.get(i + 1).copied().unwrap_or(Signal::Out);
        robot.record_new_prediction(&dataset, next);
        robot.resolve_market_change(&dataset, 1.0, 0.0);
    }

    assert_eq!(robot.total_outcomes(), outcomes as u64);
    assert_eq!(robot.total_predictions(), predictions as u64);
    assert_eq!(robot.correct_predictions(), correct as u64);
    robot
}

/// Outcomes a robot must have seen since its last child before breeding again
const BREEDING_GAP: usize = 50;

#[test]
fn test_high_weight_robot_survives_and_can_parent() {
    let config = EvolutionConfig {
        minimum_outcomes_to_allow_breeding: 0,
        minimum_outcomes_between_breeding: BREEDING_GAP,
        ..Default::default()
    };
    let policy = EvolutionPolicy::new(&config, factory());

    let mut population = Population::new(10);
    // 60 outcomes clear the breeding gap; only 8 of them are predictions
    population.insert(robot_with_record(0, BREEDING_GAP + 10, 8, 8)).unwrap();
    for name in 1..10 {
        population.insert(robot_with_record(name, 0, 0, 0)).unwrap();
    }
    let good = RobotName::new(0);
    assert!(policy.breeder().is_eligible(population.get(good).unwrap()));

    let mut rng = StdRng::seed_from_u64(1);
    policy.apply_cycle(&mut population, &mut rng);

    let survivor = population.get(good).expect("best robot must survive");
    assert!(survivor.weight(policy.calculator()) > 0.0);
    assert!(policy.breeder().is_eligible(survivor));
}

#[test]
fn test_high_weight_robot_parents_when_space_opens() {
    let config = EvolutionConfig {
        minimum_outcomes_to_allow_breeding: 0,
        require_symmetrical_robots: false,
        random_robots_at_each_update: 0.0,
        kill_non_predicting_robots: false,
        minimum_outcomes_between_breeding: BREEDING_GAP,
        ..Default::default()
    };
    let policy = EvolutionPolicy::new(&config, factory());

    let mut population = Population::new(11);
    // 60 outcomes clear the breeding gap; only 8 of them are predictions
    population.insert(robot_with_record(0, BREEDING_GAP + 10, 8, 8)).unwrap();
    for name in 1..10 {
        population.insert(robot_with_record(name, 0, 0, 0)).unwrap();
    }

    let report = policy.apply_cycle(&mut population, &mut StdRng::seed_from_u64(1));
    assert_eq!(report.bred.born, 1);
    assert_eq!(population.get(RobotName::new(0)).unwrap().total_children(), 1);
    assert_eq!(population.len(), 11);
}

#[test]
fn test_weight_is_never_negative() {
    let modes = [WeightMode::WinCount, WeightMode::WinRate, WeightMode::Proportional];
    let mut rng = StdRng::seed_from_u64(5);
    for mode in modes {
        let calculator = WeightCalculator::new(mode, 2.0);
        for name in 0..50 {
            let outcomes = rng.gen_range(0..40);
            let predictions = rng.gen_range(0..=outcomes);
            let correct = rng.gen_range(0..=predictions);
            let robot = robot_with_record(name, outcomes, predictions, correct);
            let weight = robot.weight(&calculator);
            assert!(weight.is_finite() && weight >= 0.0);
        }
    }
}

#[test]
fn test_counters_hold_invariant_under_random_calls() {
    let mut rng = StdRng::seed_from_u64(99);
    let datasets = [DatasetName::from("A"), DatasetName::from("B")];
    let signals = [Signal::Long, Signal::Short, Signal::Out];
    let mut robot = Robot::new(RobotName::new(0), Program::empty(), 0.0);

    for _ in 0..2000 {
        let dataset = &datasets[rng.gen_range(0..2)];
        if rng.gen_bool(0.5) {
            robot.record_new_prediction(dataset, signals[rng.gen_range(0..3)]);
        } else {
            let change = rng.gen_range(-2.0..2.0);
            robot.resolve_market_change(dataset, change, 0.5);
        }
        assert!(robot.correct_predictions() <= robot.total_predictions());
        assert!(robot.total_predictions() <= robot.total_outcomes());
    }
}

/// Population with a spread of records so every death rule has work
fn seasoned_population(seed: u64) -> Population {
    let mut rng = StdRng::seed_from_u64(seed);
    let factory = factory();
    let mut population = Population::random(40, &factory, &mut rng);
    let dataset = DatasetName::from("D");
    for robot in population.robots_mut() {
        let bars = rng.gen_range(0..200);
        for _ in 0..bars {
            let signal = [Signal::Long, Signal::Short, Signal::Out][rng.gen_range(0..3)];
            robot.record_new_prediction(&dataset, signal);
            robot.resolve_market_change(&dataset, rng.gen_range(-1.0..1.0), 0.0);
        }
    }
    population
}

#[test]
fn test_cycles_are_reproducible() {
    let config = EvolutionConfig {
        maximum_death_by_age: 0.2,
        maximum_death_by_weight: 0.3,
        minimum_outcomes_to_allow_breeding: 20,
        minimum_outcomes_between_breeding: 10,
        random_robots_at_each_update: 0.1,
        ..Default::default()
    };
    let policy = EvolutionPolicy::new(&config, factory());

    let run = || {
        let mut population = seasoned_population(3);
        let mut rng = StdRng::seed_from_u64(1234);
        let reports: Vec<_> = (0..5).map(|_| policy.apply_cycle(&mut population, &mut rng)).collect();
        (reports, population)
    };

    let (reports_a, population_a) = run();
    let (reports_b, population_b) = run();
    assert_eq!(reports_a, reports_b);
    assert_eq!(population_a, population_b);
    assert!(reports_a.iter().any(|r| r.killed.total() > 0));
}
