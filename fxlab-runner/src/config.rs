//! Serializable run configuration.
//!
//! One TOML file describes everything needed to reproduce a run: the data
//! window, account and risk settings, cost model, and the optimizer's
//! knobs. The config hashes to a stable id so two identical configs are
//! recognizably the same run.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use fxlab_core::domain::{PolicyError, RiskPolicy};
use fxlab_core::sim::CostModel;
use fxlab_core::strategy::TemplateId;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error(transparent)]
    Policy(#[from] PolicyError),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Full configuration for a backtest or evolve run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub instrument: String,
    /// Backtest window (inclusive dates, UTC). Omitted bounds fall back to
    /// the loaded data's extent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<NaiveDate>,
    #[serde(default = "default_initial_balance")]
    pub initial_balance: f64,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default)]
    pub policy: RiskPolicy,
    #[serde(default)]
    pub costs: CostModel,
    #[serde(default)]
    pub optimizer: OptimizerConfig,
}

/// Genetic optimizer knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizerConfig {
    #[serde(default = "default_template")]
    pub template: TemplateId,
    #[serde(default = "default_population")]
    pub population: usize,
    #[serde(default = "default_generations")]
    pub generations: usize,
    #[serde(default = "default_elitism")]
    pub elitism: usize,
    #[serde(default = "default_tournament")]
    pub tournament_size: usize,
    #[serde(default = "default_crossover_rate")]
    pub crossover_rate: f64,
    #[serde(default = "default_mutation_rate")]
    pub mutation_rate: f64,
    /// Stop early when the best fitness has not improved for this many
    /// generations. Zero disables the plateau check.
    #[serde(default = "default_plateau")]
    pub plateau_generations: usize,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            template: default_template(),
            population: default_population(),
            generations: default_generations(),
            elitism: default_elitism(),
            tournament_size: default_tournament(),
            crossover_rate: default_crossover_rate(),
            mutation_rate: default_mutation_rate(),
            plateau_generations: default_plateau(),
        }
    }
}

fn default_initial_balance() -> f64 {
    10_000.0
}
fn default_seed() -> u64 {
    42
}
fn default_template() -> TemplateId {
    TemplateId::MaCrossover
}
fn default_population() -> usize {
    50
}
fn default_generations() -> usize {
    30
}
fn default_elitism() -> usize {
    2
}
fn default_tournament() -> usize {
    3
}
fn default_crossover_rate() -> f64 {
    0.9
}
fn default_mutation_rate() -> f64 {
    0.1
}
fn default_plateau() -> usize {
    10
}

impl RunConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: RunConfig = toml::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.policy.validate()?;
        if self.instrument.is_empty() {
            return Err(ConfigError::Invalid("instrument is empty".into()));
        }
        if !(self.initial_balance > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "initial_balance must be positive, got {}",
                self.initial_balance
            )));
        }
        if let (Some(start), Some(end)) = (self.start, self.end) {
            if start > end {
                return Err(ConfigError::Invalid(format!(
                    "start {start} is after end {end}"
                )));
            }
        }
        let opt = &self.optimizer;
        if opt.population == 0 {
            return Err(ConfigError::Invalid("population must be at least 1".into()));
        }
        if opt.generations == 0 {
            return Err(ConfigError::Invalid(
                "generations must be at least 1".into(),
            ));
        }
        if opt.elitism >= opt.population {
            return Err(ConfigError::Invalid(format!(
                "elitism {} must be below population {}",
                opt.elitism, opt.population
            )));
        }
        if opt.tournament_size == 0 || opt.tournament_size > opt.population {
            return Err(ConfigError::Invalid(format!(
                "tournament_size {} out of range for population {}",
                opt.tournament_size, opt.population
            )));
        }
        for (name, rate) in [
            ("crossover_rate", opt.crossover_rate),
            ("mutation_rate", opt.mutation_rate),
        ] {
            if !(0.0..=1.0).contains(&rate) {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be within [0, 1], got {rate}"
                )));
            }
        }
        Ok(())
    }

    /// Content-addressed hash of the whole config; identical configs share
    /// an id across machines.
    pub fn config_hash(&self) -> String {
        let json = serde_json::to_string(self).expect("RunConfig serializes");
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_toml() -> &'static str {
        r#"
            instrument = "EURUSD"
            seed = 7

            [optimizer]
            population = 20
            generations = 10
        "#
    }

    #[test]
    fn parses_minimal_config_with_defaults() {
        let config: RunConfig = toml::from_str(minimal_toml()).unwrap();
        assert_eq!(config.instrument, "EURUSD");
        assert_eq!(config.seed, 7);
        assert_eq!(config.initial_balance, 10_000.0);
        assert_eq!(config.optimizer.population, 20);
        assert_eq!(config.optimizer.elitism, 2);
        assert_eq!(config.policy, RiskPolicy::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn hash_is_stable_and_content_sensitive() {
        let a: RunConfig = toml::from_str(minimal_toml()).unwrap();
        let b: RunConfig = toml::from_str(minimal_toml()).unwrap();
        assert_eq!(a.config_hash(), b.config_hash());

        let mut c = a.clone();
        c.seed = 8;
        assert_ne!(a.config_hash(), c.config_hash());
    }

    #[test]
    fn rejects_elitism_at_population() {
        let mut config: RunConfig = toml::from_str(minimal_toml()).unwrap();
        config.optimizer.elitism = config.optimizer.population;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn rejects_zero_generations() {
        let mut config: RunConfig = toml::from_str(minimal_toml()).unwrap();
        config.optimizer.generations = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn rejects_inverted_window() {
        let mut config: RunConfig = toml::from_str(minimal_toml()).unwrap();
        config.start = NaiveDate::from_ymd_opt(2024, 6, 1);
        config.end = NaiveDate::from_ymd_opt(2024, 1, 1);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn toml_roundtrip_preserves_config() {
        let config: RunConfig = toml::from_str(minimal_toml()).unwrap();
        let text = toml::to_string(&config).unwrap();
        let back: RunConfig = toml::from_str(&text).unwrap();
        assert_eq!(config, back);
    }
}
