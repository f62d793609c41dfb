use crate::config::AppConfig;
use crate::data::MarketFeed;
use crate::engines::evaluation::{Processor, ProgramFactory, Termination};
use crate::engines::generation::{
    policy::{CycleReport, EvolutionPolicy},
    population::Population,
    weight::WeightCalculator,
};
use crate::engines::metrics::{DatasetStats, PopulationSummary, VoteTally};
use crate::error::{Result, TickbreedError};
use crate::types::{Bar, DatasetName, Signal};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub trait ProgressCallback: Send {
    fn on_bar_start(&mut self, bar: Bar);
    fn on_bar_complete(&mut self, bar: Bar, summary: &BarSummary);
    fn on_cycle_complete(&mut self, bar: Bar, report: &CycleReport);
}

/// Population vote on one dataset at one bar
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetVote {
    pub dataset: DatasetName,
    pub tally: VoteTally,
    pub signal: Signal,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BarSummary {
    pub bar: Bar,
    pub votes: Vec<DatasetVote>,
    /// Executions that ran out of dispatch budget
    pub budget_exhausted: usize,
    pub cycle: Option<CycleReport>,
}

#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub bars_processed: usize,
    pub last_bar: Option<Bar>,
    pub cancelled: bool,
    pub cycles: usize,
    pub datasets: BTreeMap<DatasetName, DatasetStats>,
    pub population: PopulationSummary,
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "bars_processed {}", self.bars_processed)?;
        writeln!(f, "cancelled {}", self.cancelled)?;
        writeln!(f, "cycles {}", self.cycles)?;
        write!(f, "{}", self.population)?;
        for (name, stats) in &self.datasets {
            writeln!(
                f,
                "dataset {} correct {} wrong {} out {} profit {:.4}",
                name,
                stats.correct(),
                stats.wrong(),
                stats.out(),
                stats.total_profit()
            )?;
            let metrics = stats.metrics();
            let mut keys: Vec<&String> = metrics.keys().collect();
            keys.sort();
            for key in keys {
                writeln!(f, "  {} {:.4}", key, metrics[key])?;
            }
        }
        Ok(())
    }
}

/// Drives robots through the timeline: predict, resolve, vote, evolve.
///
/// Prediction runs on the rayon pool, one task per robot. Evolution cycles
/// run on the calling thread and are the only consumer of the random stream,
/// so results do not depend on how prediction was scheduled.
pub struct EvolutionEngine<F: MarketFeed> {
    feed: F,
    config: AppConfig,
    processor: Processor,
    policy: EvolutionPolicy,
    datasets: Vec<DatasetName>,
    stats: BTreeMap<DatasetName, DatasetStats>,
    rng: StdRng,
    cancel: Arc<AtomicBool>,
}

impl<F: MarketFeed> EvolutionEngine<F> {
    pub fn new(feed: F, config: AppConfig) -> Result<Self> {
        let rng = match config.engine.random_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(feed, config, rng)
    }

    /// Build with an explicit random stream
    pub fn with_rng(feed: F, config: AppConfig, rng: StdRng) -> Result<Self> {
        config.validate()?;
        if feed.column_count() == 0 {
            return Err(TickbreedError::DataLoading(
                "Market data exposes no usable columns".to_string(),
            ));
        }

        let factory = ProgramFactory::new(&config.population, feed.column_count());
        let policy = EvolutionPolicy::new(&config.evolution, factory);
        let datasets = feed.dataset_names();
        let stats = datasets
            .iter()
            .map(|name| (name.clone(), DatasetStats::default()))
            .collect();

        Ok(Self {
            processor: Processor::new(config.population.maximum_processor_instruction_factor),
            feed,
            config,
            policy,
            datasets,
            stats,
            rng,
            cancel: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn calculator(&self) -> &WeightCalculator {
        self.policy.calculator()
    }

    pub fn program_factory(&self) -> &ProgramFactory {
        self.policy.breeder().factory()
    }

    pub fn dataset_stats(&self) -> &BTreeMap<DatasetName, DatasetStats> {
        &self.stats
    }

    /// Setting the flag stops `run` before the next bar
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Random population of the configured size, drawn from the engine's stream
    pub fn initial_population(&mut self) -> Population {
        let population = Population::random(
            self.config.population.desired_size,
            self.policy.breeder().factory(),
            &mut self.rng,
        );
        log::info!("Created {} random robots", population.len());
        population
    }

    pub fn is_update_bar(&self, bar: Bar) -> bool {
        self.config.engine.perform_training && (bar + 1) % self.config.engine.bars_between_updates == 0
    }

    /// Process one bar for every dataset that has data there, then evolve if due
    pub fn run_generation(&mut self, population: &mut Population, bar: Bar) -> BarSummary {
        let threshold = self.config.engine.result_threshold;
        let processor = self.processor;
        let calculator = *self.policy.calculator();
        let mut summary = BarSummary {
            bar,
            ..Default::default()
        };

        for name in &self.datasets {
            let Some(window) = self.feed.market_window(name, bar) else {
                log::trace!("No data for {} at bar {}", name, bar);
                continue;
            };
            let change = window.realized_change();

            let results: Vec<(Signal, f64, Termination)> = population
                .robots_mut()
                .par_iter_mut()
                .map(|robot| {
                    let execution = processor.execute(robot.program(), &window);
                    let weight = robot.weight(&calculator);
                    robot.record_new_prediction(name, execution.signal);
                    if let Some(change) = change {
                        robot.resolve_market_change(name, change, threshold);
                    }
                    (execution.signal, weight, execution.termination)
                })
                .collect();

            summary.budget_exhausted += results
                .iter()
                .filter(|(_, _, t)| *t == Termination::BudgetExhausted)
                .count();
            let tally = VoteTally::from_votes(results.iter().map(|(s, w, _)| (*s, *w)));
            let signal = tally.decide(self.config.engine.vote_threshold);

            let stats = self.stats.entry(name.clone()).or_default();
            if let Some(change) = change {
                stats.resolve(bar, change, threshold);
            }
            stats.hold(signal);

            summary.votes.push(DatasetVote {
                dataset: name.clone(),
                tally,
                signal,
            });
        }

        if self.is_update_bar(bar) {
            let report = self.policy.apply_cycle(population, &mut self.rng);
            log::info!("Cycle at bar {}: {}", bar, report);
            summary.cycle = Some(report);
        }

        summary
    }

    /// Run every bar in the configured time range
    pub fn run<C: ProgressCallback>(
        &mut self,
        population: &mut Population,
        callback: &mut C,
    ) -> Result<RunReport> {
        let range = self
            .feed
            .bar_range(self.config.engine.start_time_point, self.config.engine.end_time_point)
            .ok_or_else(|| {
                TickbreedError::DataLoading("No bars in the configured time range".to_string())
            })?;

        if population.is_empty() {
            log::warn!("Starting with an empty population");
        }
        log::info!(
            "Processing bars {}..={} for {} datasets with {} robots",
            range.start(),
            range.end(),
            self.datasets.len(),
            population.len()
        );

        let mut report = RunReport::default();
        for bar in range {
            if self.cancel.load(Ordering::Relaxed) {
                log::warn!("Run cancelled before bar {}", bar);
                report.cancelled = true;
                break;
            }

            callback.on_bar_start(bar);
            let summary = self.run_generation(population, bar);
            if let Some(cycle) = &summary.cycle {
                report.cycles += 1;
                callback.on_cycle_complete(bar, cycle);
            }
            callback.on_bar_complete(bar, &summary);

            report.bars_processed += 1;
            report.last_bar = Some(bar);
        }

        report.datasets = self.stats.clone();
        report.population = PopulationSummary::from_population(population, self.policy.calculator());
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Dataset, MarketData};
    use crate::engines::evaluation::{Instruction, Program};
    use crate::engines::generation::ConsoleProgressCallback;

    fn config() -> AppConfig {
        let mut config = AppConfig::default();
        config.population.desired_size = 6;
        config.population.minimum_robot_instructions = 2;
        config.population.maximum_robot_instructions = 8;
        config.population.maximum_data_offset = 3;
        config.engine.random_seed = Some(42);
        config
    }

    fn feed(config: &AppConfig) -> MarketData {
        let closes = vec![100.0, 101.0, 103.0, 102.0, 104.0, 107.0];
        let dataset = Dataset::new(DatasetName::from("UP"), (1..=6).collect(), vec![closes]).unwrap();
        MarketData::new(vec![dataset], &config.population).unwrap()
    }

    #[test]
    fn test_engine_rejects_invalid_config() {
        let mut config = config();
        config.evolution.protect_best_robots = 3.0;
        assert!(EvolutionEngine::new(feed(&config), config).is_err());
    }

    #[test]
    fn test_always_long_robot_is_scored() {
        let mut config = config();
        config.engine.perform_training = false;
        let mut engine = EvolutionEngine::new(feed(&config), config).unwrap();
        let mut population = Population::new(1);
        let name = population.add(Program::new(vec![Instruction::EmitLong; 2], 1), 0.0);

        for bar in 0..6 {
            engine.run_generation(&mut population, bar);
        }
        let robot = population.get(name).unwrap();
        // predictions from bars 0..=4 resolve on bars 1..=5, one move was down
        assert_eq!(robot.total_outcomes(), 5);
        assert_eq!(robot.correct_predictions(), 4);
        assert_eq!(robot.pending_signal(&DatasetName::from("UP")), Some(Signal::Long));
    }

    #[test]
    fn test_vote_stats_follow_population() {
        let mut config = config();
        config.engine.perform_training = false;
        let mut engine = EvolutionEngine::new(feed(&config), config).unwrap();
        let mut population = Population::new(1);
        population.add(Program::new(vec![Instruction::EmitShort; 2], 1), 1.0);

        let summary = engine.run_generation(&mut population, 0);
        assert_eq!(summary.votes.len(), 1);
        assert_eq!(summary.votes[0].signal, Signal::Short);
        engine.run_generation(&mut population, 1);

        let stats = &engine.dataset_stats()[&DatasetName::from("UP")];
        assert_eq!(stats.wrong(), 1);
        assert!(stats.total_profit() < 0.0);
    }

    #[test]
    fn test_report_lists_vote_metrics() {
        let mut config = config();
        config.engine.perform_training = false;
        let mut engine = EvolutionEngine::new(feed(&config), config).unwrap();
        let mut population = Population::new(1);
        population.add(Program::new(vec![Instruction::EmitLong; 2], 1), 1.0);

        let report = engine.run(&mut population, &mut ConsoleProgressCallback::new(1)).unwrap();
        let text = report.to_string();
        assert!(text.contains("dataset UP correct 4 wrong 1 out 0"));
        assert!(text.contains("  trades 5.0000\n"));
        assert!(text.contains("  win_rate 80.0000\n"));
    }

    #[test]
    fn test_cycles_run_on_update_bars() {
        let mut config = config();
        config.engine.bars_between_updates = 2;
        config.evolution.random_robots_at_each_update = 1.0;
        let mut engine = EvolutionEngine::new(feed(&config), config).unwrap();
        assert!(!engine.is_update_bar(0));
        assert!(engine.is_update_bar(1));

        let mut population = engine.initial_population();
        let mut callback = ConsoleProgressCallback::new(1);
        let report = engine.run(&mut population, &mut callback).unwrap();
        assert_eq!(report.bars_processed, 6);
        assert_eq!(report.cycles, 3);
        assert_eq!(population.len(), 6);
    }

    #[test]
    fn test_cancelled_run_stops_at_bar_boundary() {
        let config = config();
        let mut engine = EvolutionEngine::new(feed(&config), config).unwrap();
        let mut population = engine.initial_population();
        engine.cancel_handle().store(true, Ordering::Relaxed);

        let mut callback = ConsoleProgressCallback::new(1);
        let report = engine.run(&mut population, &mut callback).unwrap();
        assert!(report.cancelled);
        assert_eq!(report.bars_processed, 0);
    }
}
