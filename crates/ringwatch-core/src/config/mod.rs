//! Analysis Configuration Management
//!
//! Provides unified configuration for an analysis run:
//! - Graph Intelligence parameters
//! - Detector windows, thresholds and work budgets
//! - Anomaly model parameters
//! - Risk fusion weights
//! - Report thresholds and logging
//!
//! # Example
//!
//! ```rust,ignore
//! use ringwatch_core::config::AnalysisConfig;
//!
//! // Load from environment
//! let config = AnalysisConfig::from_env()?;
//!
//! // Or load from file
//! let config = AnalysisConfig::from_file("config/production.toml")?;
//! config.validate()?;
//! ```

mod sections;

pub use sections::{
    AnomalyConfig, CycleConfig, GraphConfig, ReportingConfig, RiskConfig, ShellConfig,
    SmurfConfig,
};

use crate::error::{AnalysisError, Result};
use crate::observability::logging::{LogConfig, LogLevel};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// Unified analysis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Environment name
    pub environment: String,
    /// Service name
    pub service_name: String,
    /// Graph Intelligence configuration
    pub graph: GraphConfig,
    /// Cycle detector configuration
    pub cycles: CycleConfig,
    /// Smurf detector configuration
    pub smurf: SmurfConfig,
    /// Shell detector configuration
    pub shell: ShellConfig,
    /// Anomaly scorer configuration
    pub anomaly: AnomalyConfig,
    /// Risk fusion configuration
    pub risk: RiskConfig,
    /// Report thresholds
    pub reporting: ReportingConfig,
    /// Logging configuration
    pub logging: LogConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            service_name: "ringwatch".to_string(),
            graph: GraphConfig::default(),
            cycles: CycleConfig::default(),
            smurf: SmurfConfig::default(),
            shell: ShellConfig::default(),
            anomaly: AnomalyConfig::default(),
            risk: RiskConfig::default(),
            reporting: ReportingConfig::default(),
            logging: LogConfig::default(),
        }
    }
}

impl AnalysisConfig {
    /// Create development configuration
    pub fn development() -> Self {
        Self {
            logging: LogConfig::development(),
            environment: "development".to_string(),
            ..Default::default()
        }
    }

    /// Create production configuration
    pub fn production() -> Self {
        Self {
            logging: LogConfig::production(),
            environment: "production".to_string(),
            ..Default::default()
        }
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = match lookup("RINGWATCH_ENV").as_deref().unwrap_or("development") {
            "production" | "prod" => Self::production(),
            _ => Self::development(),
        };

        if let Some(name) = lookup("RINGWATCH_SERVICE_NAME") {
            config.service_name = name;
        }

        // Logging overrides
        if let Some(level) = lookup("RINGWATCH_LOG_LEVEL") {
            config.logging.level = LogLevel::from_str(&level).map_err(AnalysisError::config)?;
        }
        if let Some(json) = lookup("RINGWATCH_LOG_JSON") {
            config.logging.structured = parse_var("RINGWATCH_LOG_JSON", &json)?;
        }

        // Budget and determinism overrides
        if let Some(val) = lookup("RINGWATCH_SHELL_MAX_PATHS") {
            config.shell.max_paths_per_source = parse_var("RINGWATCH_SHELL_MAX_PATHS", &val)?;
        }
        if let Some(val) = lookup("RINGWATCH_CYCLE_MAX") {
            config.cycles.max_cycles = parse_var("RINGWATCH_CYCLE_MAX", &val)?;
        }
        if let Some(val) = lookup("RINGWATCH_ANOMALY_SEED") {
            config.anomaly.seed = parse_var("RINGWATCH_ANOMALY_SEED", &val)?;
        }
        if let Some(val) = lookup("RINGWATCH_SUSPICION_THRESHOLD") {
            config.reporting.suspicion_threshold =
                parse_var("RINGWATCH_SUSPICION_THRESHOLD", &val)?;
        }

        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| AnalysisError::ConfigError(format!("Failed to read config: {}", e)))?;

        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| AnalysisError::ConfigError(format!("Failed to parse config: {}", e)))
    }

    /// Render configuration as TOML text
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| AnalysisError::ConfigError(format!("Failed to serialize config: {}", e)))
    }

    /// Save configuration to a TOML file
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = self.to_toml_string()?;

        std::fs::write(path.as_ref(), content)
            .map_err(|e| AnalysisError::ConfigError(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let risk = &self.risk;
        let weights = [
            risk.graph_weight,
            risk.anomaly_weight,
            risk.pattern_weight,
            risk.velocity_weight,
        ];
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(AnalysisError::config(format!(
                "risk weights must be finite and non-negative, got {weights:?}"
            )));
        }

        let weight_sum = self.risk.weight_sum();
        if (weight_sum - 1.0).abs() > 1e-9 {
            return Err(AnalysisError::config(format!(
                "risk weights must sum to 1.0, got {weight_sum}"
            )));
        }

        if self.smurf.window_secs <= 0
            || self.shell.window_secs <= 0
            || self.risk.velocity_window_secs <= 0
        {
            return Err(AnalysisError::config("time windows must be positive"));
        }

        if self.cycles.min_length == 0 || self.cycles.min_length > self.cycles.max_length {
            return Err(AnalysisError::config(format!(
                "cycle length bounds invalid: {}..={}",
                self.cycles.min_length, self.cycles.max_length
            )));
        }

        if self.shell.min_hops == 0 || self.shell.min_hops > self.shell.max_hops {
            return Err(AnalysisError::config(format!(
                "shell hop bounds invalid: {}..={}",
                self.shell.min_hops, self.shell.max_hops
            )));
        }

        if self.cycles.max_cycles == 0 || self.shell.max_paths_per_source == 0 {
            return Err(AnalysisError::config(format!(
                "search budgets must be positive: max_cycles={}, max_paths_per_source={}",
                self.cycles.max_cycles, self.shell.max_paths_per_source
            )));
        }

        if !(self.anomaly.contamination > 0.0 && self.anomaly.contamination <= 0.5) {
            return Err(AnalysisError::config(format!(
                "contamination must be in (0, 0.5], got {}",
                self.anomaly.contamination
            )));
        }

        if self.anomaly.n_trees == 0 || self.anomaly.max_samples == 0 {
            return Err(AnalysisError::config(
                "anomaly model needs at least one tree and one sample",
            ));
        }

        if !(self.graph.pagerank_damping > 0.0 && self.graph.pagerank_damping < 1.0) {
            return Err(AnalysisError::config("pagerank damping must be in (0, 1)"));
        }

        if self.risk.velocity_saturation <= 0.0 || self.risk.confidence_saturation <= 0.0 {
            return Err(AnalysisError::config("saturation points must be positive"));
        }

        if self.environment == "production" && !self.logging.structured {
            tracing::warn!("Production environment without structured logging");
        }

        Ok(())
    }

    /// Set environment
    pub fn with_environment(mut self, env: impl Into<String>) -> Self {
        self.environment = env.into();
        self
    }

    /// Set shell detector configuration
    pub fn with_shell(mut self, config: ShellConfig) -> Self {
        self.shell = config;
        self
    }

    /// Set anomaly scorer configuration
    pub fn with_anomaly(mut self, config: AnomalyConfig) -> Self {
        self.anomaly = config;
        self
    }

    /// Set risk fusion configuration
    pub fn with_risk(mut self, config: RiskConfig) -> Self {
        self.risk = config;
        self
    }

    /// Set logging configuration
    pub fn with_logging(mut self, config: LogConfig) -> Self {
        self.logging = config;
        self
    }
}

fn parse_var<T: FromStr>(key: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| AnalysisError::config(format!("{key}={value}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = AnalysisConfig::default();
        assert_eq!(config.environment, "development");
        assert_eq!(config.service_name, "ringwatch");
        assert_eq!(config.smurf.window_secs, 72 * 3600);
        assert_eq!(config.shell.window_secs, 48 * 3600);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_production_config() {
        let config = AnalysisConfig::production();
        assert_eq!(config.environment, "production");
        assert!(config.logging.structured);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_lookup_overrides() {
        let vars: HashMap<&str, &str> = [
            ("RINGWATCH_ENV", "prod"),
            ("RINGWATCH_LOG_LEVEL", "debug"),
            ("RINGWATCH_SHELL_MAX_PATHS", "250"),
            ("RINGWATCH_ANOMALY_SEED", "7"),
            ("RINGWATCH_SUSPICION_THRESHOLD", "40.5"),
        ]
        .into_iter()
        .collect();

        let config =
            AnalysisConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(config.environment, "production");
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.shell.max_paths_per_source, 250);
        assert_eq!(config.anomaly.seed, 7);
        assert_eq!(config.reporting.suspicion_threshold, 40.5);
    }

    #[test]
    fn test_from_lookup_rejects_garbage() {
        let result = AnalysisConfig::from_lookup(|k| {
            (k == "RINGWATCH_CYCLE_MAX").then(|| "lots".to_string())
        });
        assert!(matches!(result, Err(AnalysisError::ConfigError(_))));
    }

    #[test]
    fn test_partial_toml() {
        let config = AnalysisConfig::from_toml_str(
            r#"
            environment = "staging"

            [shell]
            max_hops = 5

            [risk]
            hub_floor = 0.75
            "#,
        )
        .unwrap();
        assert_eq!(config.environment, "staging");
        assert_eq!(config.shell.max_hops, 5);
        assert_eq!(config.shell.min_hops, 3);
        assert_eq!(config.risk.hub_floor, 0.75);
        assert_eq!(config.risk.graph_weight, 0.4);
    }

    #[test]
    fn test_toml_roundtrip_preserves_defaults() {
        let text = AnalysisConfig::production().to_toml_string().unwrap();
        let parsed = AnalysisConfig::from_toml_str(&text).unwrap();
        assert_eq!(parsed.graph, GraphConfig::default());
        assert_eq!(parsed.environment, "production");
    }

    #[test]
    fn test_validate_rejects_bad_weights() {
        let mut config = AnalysisConfig::default();
        config.risk.velocity_weight = 0.2;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_bounds() {
        let mut config = AnalysisConfig::default();
        config.shell.min_hops = 5;
        assert!(config.validate().is_err());

        let mut config = AnalysisConfig::default();
        config.anomaly.contamination = 0.0;
        assert!(config.validate().is_err());

        let mut config = AnalysisConfig::default();
        config.smurf.window_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_negative_weight() {
        // Still sums to 1.0.
        let mut config = AnalysisConfig::default();
        config.risk.graph_weight = 1.2;
        config.risk.anomaly_weight = -0.5;
        assert!((config.risk.weight_sum() - 1.0).abs() < 1e-9);

        let err = config.validate().unwrap_err();
        assert!(matches!(err, AnalysisError::ConfigError(_)));
        assert!(err.to_string().contains("non-negative"));

        let mut config = AnalysisConfig::default();
        config.risk.pattern_weight = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_budgets() {
        let mut config = AnalysisConfig::default();
        config.shell.max_paths_per_source = 0;
        assert!(matches!(
            config.validate(),
            Err(AnalysisError::ConfigError(_))
        ));

        let mut config = AnalysisConfig::default();
        config.cycles.max_cycles = 0;
        assert!(config.validate().is_err());

        let mut config = AnalysisConfig::default();
        config.cycles.max_cycles = 1;
        config.shell.max_paths_per_source = 1;
        assert!(config.validate().is_ok());
    }
}
