use serde::Deserialize;

use crate::services::{
    classifier::ClassifierParams,
    features::FrequencyMode,
    recommendations::EngineConfig,
};

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// CSV meal log (`Date,Meal`) used to train at startup
    #[serde(default)]
    pub history_path: Option<String>,

    /// JSON model artifact, loaded at startup when present
    #[serde(default)]
    pub model_path: Option<String>,

    /// Region key of the built-in holiday calendar
    #[serde(default = "default_holiday_region")]
    pub holiday_region: String,

    /// How the `meal_frequency` feature counts occurrences
    #[serde(default)]
    pub frequency_mode: FrequencyMode,

    /// Boosting rounds
    #[serde(default = "default_n_estimators")]
    pub n_estimators: usize,

    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,

    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Seed for the stratified train/test split
    #[serde(default = "default_random_seed")]
    pub random_seed: u64,

    /// Share of each class held out for evaluation
    #[serde(default = "default_test_fraction")]
    pub test_fraction: f64,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_holiday_region() -> String {
    "IN".to_string()
}

fn default_n_estimators() -> usize {
    100
}

fn default_learning_rate() -> f64 {
    0.1
}

fn default_max_depth() -> usize {
    6
}

fn default_random_seed() -> u64 {
    42
}

fn default_test_fraction() -> f64 {
    0.2
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let config = envy::from_env::<Config>()
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if !(0.0..1.0).contains(&self.test_fraction) {
            anyhow::bail!("TEST_FRACTION must be in [0, 1), got {}", self.test_fraction);
        }
        if self.n_estimators == 0 || self.max_depth == 0 {
            anyhow::bail!("N_ESTIMATORS and MAX_DEPTH must be positive");
        }
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            anyhow::bail!("LEARNING_RATE must be positive, got {}", self.learning_rate);
        }
        Ok(())
    }

    /// Builds the engine configuration carried by this environment
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            classifier: ClassifierParams {
                n_estimators: self.n_estimators,
                learning_rate: self.learning_rate,
                max_depth: self.max_depth,
                random_seed: self.random_seed,
                test_fraction: self.test_fraction,
                ..ClassifierParams::default()
            },
            frequency_mode: self.frequency_mode,
            ..EngineConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_pairs(pairs: &[(&str, &str)]) -> Config {
        let vars = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()));
        envy::from_iter::<_, Config>(vars).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = from_pairs(&[]);
        assert_eq!(config.port, 3000);
        assert_eq!(config.holiday_region, "IN");
        assert_eq!(config.frequency_mode, FrequencyMode::Global);
        assert!(config.history_path.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overrides_flow_into_engine_config() {
        let config = from_pairs(&[
            ("N_ESTIMATORS", "25"),
            ("MAX_DEPTH", "3"),
            ("FREQUENCY_MODE", "historical"),
        ]);
        let engine = config.engine_config();
        assert_eq!(engine.classifier.n_estimators, 25);
        assert_eq!(engine.classifier.max_depth, 3);
        assert_eq!(engine.frequency_mode, FrequencyMode::Historical);
        assert_eq!(engine.top_n, 3);
    }

    #[test]
    fn test_rejects_test_fraction_of_one() {
        let config = from_pairs(&[("TEST_FRACTION", "1.0")]);
        assert!(config.validate().is_err());
    }
}
