use super::{
    engine::EngineConfig,
    evolution::EvolutionConfig,
    population::PopulationConfig,
    traits::{ConfigManifest, ConfigSection},
};
use crate::error::TickbreedError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, RwLock};

/// Prefix for environment overrides, e.g. `TICKBREED__EVOLUTION__WEIGHT_EXPONENT=3`
pub const ENV_PREFIX: &str = "TICKBREED";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub population: PopulationConfig,
    pub evolution: EvolutionConfig,
    pub engine: EngineConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), TickbreedError> {
        self.population.validate()?;
        self.evolution.validate()?;
        self.engine.validate()?;
        Ok(())
    }

    pub fn manifests(&self) -> Vec<ConfigManifest> {
        vec![
            self.population.to_manifest(),
            self.evolution.to_manifest(),
            self.engine.to_manifest(),
        ]
    }

    /// Effective settings, one "name value" line per field
    pub fn render(&self) -> String {
        self.manifests().iter().map(ConfigManifest::render).collect()
    }
}

pub struct ConfigManager {
    config: Arc<RwLock<AppConfig>>,
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigManager {
    pub fn new() -> Self {
        Self {
            config: Arc::new(RwLock::new(AppConfig::default())),
        }
    }

    /// Defaults, then the optional TOML file, then `TICKBREED__*` overrides
    pub fn load(&self, path: Option<&Path>) -> Result<(), TickbreedError> {
        self.load_layered(path, Self::environment())
    }

    pub fn load_from_file<P: AsRef<Path>>(&self, path: P) -> Result<(), TickbreedError> {
        self.load(Some(path.as_ref()))
    }

    fn environment() -> config::Environment {
        config::Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true)
    }

    fn load_layered(&self, path: Option<&Path>, environment: config::Environment) -> Result<(), TickbreedError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(
                config::File::from(path)
                    .format(config::FileFormat::Toml)
                    .required(true),
            );
        }
        let settings = builder
            .add_source(environment)
            .build()
            .map_err(|e| TickbreedError::Configuration(format!("Failed to read config: {}", e)))?;

        let config: AppConfig = settings
            .try_deserialize()
            .map_err(|e| TickbreedError::Configuration(format!("Failed to parse config: {}", e)))?;

        self.replace(config)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), TickbreedError> {
        let config = self.get();
        let toml_str = toml::to_string_pretty(&config)
            .map_err(|e| TickbreedError::Configuration(format!("Failed to serialize: {}", e)))?;

        std::fs::write(path, toml_str)
            .map_err(|e| TickbreedError::Configuration(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    pub fn get(&self) -> AppConfig {
        match self.config.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Validate and store a complete configuration
    pub fn replace(&self, config: AppConfig) -> Result<(), TickbreedError> {
        config.validate()?;
        match self.config.write() {
            Ok(mut guard) => *guard = config,
            Err(poisoned) => *poisoned.into_inner() = config,
        }
        Ok(())
    }

    /// Apply `f` to a copy; the stored config only changes if the result validates
    pub fn update<F>(&self, f: F) -> Result<(), TickbreedError>
    where
        F: FnOnce(&mut AppConfig),
    {
        let mut config = self.get();
        f(&mut config);
        self.replace(config)
    }
}
