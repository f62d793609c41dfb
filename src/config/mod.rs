pub mod traits;
pub mod population;
pub mod evolution;
pub mod engine;
pub mod manager;

pub use manager::{ConfigManager, AppConfig};
pub use population::PopulationConfig;
pub use evolution::{EvolutionConfig, WeightMode, InheritedWeightMode};
pub use engine::EngineConfig;
pub use traits::{ConfigSection, ConfigManifest, FieldManifest};
