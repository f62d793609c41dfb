pub mod breeder;
pub mod evolution_engine;
pub mod killer;
pub mod operators;
pub mod policy;
pub mod population;
pub mod progress;
pub mod robot;
pub mod weight;

pub use breeder::{BreedReport, RobotBreeder};
pub use evolution_engine::{BarSummary, DatasetVote, EvolutionEngine, ProgressCallback, RunReport};
pub use killer::{KillReport, RobotKiller};
pub use operators::MutationRates;
pub use policy::{CycleReport, EvolutionPolicy};
pub use population::{Population, PopulationStore};
pub use progress::{ChannelProgressCallback, ConsoleProgressCallback, ProgressMessage};
pub use robot::{Robot, RobotName};
pub use weight::{InheritedWeight, WeightCalculator};
