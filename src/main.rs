//! Evolve a robot population over a directory of CSV market files.
//!
//! Usage: `tickbreed <data-dir> [--config FILE] [--load-population FILE] [--save-population FILE]`

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tickbreed::config::ConfigManager;
use tickbreed::data::{CsvConnector, MarketData};
use tickbreed::engines::generation::{ConsoleProgressCallback, EvolutionEngine, PopulationStore};

#[derive(Parser, Debug)]
#[command(name = "tickbreed")]
#[command(about = "Evolve trading robots against historical market data")]
struct Args {
    /// Directory of `*.csv` files, one dataset per file
    data_dir: PathBuf,

    /// TOML settings file; `TICKBREED__SECTION__FIELD` variables override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Resume from a saved population instead of a random one
    #[arg(long = "load-population")]
    load_population: Option<PathBuf>,

    /// Write the final population here
    #[arg(long = "save-population")]
    save_population: Option<PathBuf>,

    /// Number of top robots to print after the run
    #[arg(long = "show-best", default_value_t = 1)]
    show_best: usize,

    /// Log progress every N bars
    #[arg(long = "report-every", default_value_t = 100)]
    report_every: usize,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let manager = ConfigManager::new();
    manager.load(args.config.as_deref()).with_context(|| match &args.config {
        Some(path) => format!("Loading settings from {}", path.display()),
        None => "Loading settings from the environment".to_string(),
    })?;
    let config = manager.get();
    print!("{}", config.render());

    let minimum_rows = 2;
    let datasets = CsvConnector::load_directory(&args.data_dir, minimum_rows)
        .with_context(|| format!("Loading data from {}", args.data_dir.display()))?;
    let data = MarketData::new(datasets, &config.population)?;

    let mut engine = EvolutionEngine::new(data, config.clone())?;
    let mut population = match &args.load_population {
        Some(path) => {
            let mut population = PopulationStore::new(path)
                .load(engine.program_factory())
                .with_context(|| format!("Loading population from {}", path.display()))?;
            population.set_desired_size(config.population.desired_size);
            population
        }
        None => engine.initial_population(),
    };

    let mut callback = ConsoleProgressCallback::new(args.report_every);
    let report = engine.run(&mut population, &mut callback)?;
    print!("{}", report);

    let calculator = *engine.calculator();
    let mut ranked: Vec<_> = population.robots().iter().collect();
    ranked.sort_by(|a, b| {
        b.weight(&calculator)
            .partial_cmp(&a.weight(&calculator))
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.name().cmp(&b.name()))
    });
    for robot in ranked.into_iter().take(args.show_best) {
        println!();
        print!("{}", robot.show(&calculator));
    }

    if let Some(path) = &args.save_population {
        PopulationStore::new(path)
            .save(&population)
            .with_context(|| format!("Saving population to {}", path.display()))?;
    }

    Ok(())
}
