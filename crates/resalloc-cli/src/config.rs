use std::path::Path;

use anyhow::{Context, Result};
use resalloc_solver::{AnalysisConfig, IntegerConfig, SolverConfig};
use serde::Deserialize;

use crate::logging::LoggingConfig;

/// Settings read from the optional `--config` TOML file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub solver: SolverConfig,
    pub integer: IntegerConfig,
    pub analysis: AnalysisConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    pub fn parse_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("malformed configuration")
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::parse_toml(&content).with_context(|| format!("invalid config {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::LogFormat;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config = AppConfig::parse_toml(
            r#"
            [solver]
            binding_tolerance = 0.001

            [integer]
            search_radius = 3

            [logging]
            level = "debug"
            format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.solver.binding_tolerance, 0.001);
        assert_eq!(config.solver.max_iterations, resalloc_solver::DEFAULT_MAX_ITERATIONS);
        assert_eq!(config.integer.search_radius, 3);
        assert!(!config.analysis.finite_difference);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_empty_config() {
        let config = AppConfig::parse_toml("").unwrap();
        assert_eq!(config.solver, SolverConfig::default());
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_rejects_unknown_types() {
        assert!(AppConfig::parse_toml("[solver]\nmax_iterations = \"lots\"").is_err());
    }
}
