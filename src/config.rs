//! Configuration management for the fraud detector

use crate::types::risk::RiskThresholds;
use anyhow::{bail, Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// Default configuration file, relative to the working directory
pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";

/// Prefix of environment overrides, e.g. `FRAUD__SERVER__PORT=9000`
pub const ENV_PREFIX: &str = "FRAUD";

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub models: ModelsConfig,
    pub detection: DetectionConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    pub logging: LoggingConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    /// Socket address to bind, `host:port`
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Pipeline artifacts configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ModelsConfig {
    /// Directory containing the artifact files
    pub models_dir: String,
    #[serde(default = "default_selector_file")]
    pub selector_file: String,
    #[serde(default = "default_reducer_file")]
    pub reducer_file: String,
    /// Random forest JSON artifact, or an .onnx file with the "onnx" feature
    #[serde(default = "default_classifier_file")]
    pub classifier_file: String,
    /// Number of threads for ONNX inference (default: 1)
    #[serde(default = "default_onnx_threads")]
    pub onnx_threads: usize,
}

fn default_selector_file() -> String {
    "feature_selector.json".to_string()
}

fn default_reducer_file() -> String {
    "pca_transformer.json".to_string()
}

fn default_classifier_file() -> String {
    "rf_model.json".to_string()
}

fn default_onnx_threads() -> usize {
    1
}

/// Risk labelling configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DetectionConfig {
    /// Probabilities at or above this are at least a warning
    pub warning_threshold: f64,
    /// Probabilities above this are fraud
    pub fraud_threshold: f64,
}

impl DetectionConfig {
    pub fn thresholds(&self) -> RiskThresholds {
        RiskThresholds::new(self.warning_threshold, self.fraud_threshold)
    }
}

/// Metrics reporting configuration
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    /// Seconds between summaries in the log; 0 disables periodic reports
    pub report_interval_secs: u64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            report_interval_secs: 300,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl AppConfig {
    /// Load configuration from a specific path, layered with `FRAUD__*`
    /// environment variables
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        let config: AppConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the detector cannot run with
    pub fn validate(&self) -> Result<()> {
        if !self.detection.thresholds().is_valid() {
            bail!(
                "Invalid detection thresholds: warning={} fraud={} (need 0 <= warning <= fraud <= 1)",
                self.detection.warning_threshold,
                self.detection.fraud_threshold
            );
        }
        if self.server.port == 0 {
            bail!("Server port must not be 0");
        }
        if !matches!(self.logging.format.as_str(), "json" | "pretty") {
            bail!(
                "Unknown log format '{}' (expected json or pretty)",
                self.logging.format
            );
        }
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        let thresholds = RiskThresholds::default();

        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8501,
            },
            models: ModelsConfig {
                models_dir: "models".to_string(),
                selector_file: default_selector_file(),
                reducer_file: default_reducer_file(),
                classifier_file: default_classifier_file(),
                onnx_threads: default_onnx_threads(),
            },
            detection: DetectionConfig {
                warning_threshold: thresholds.warning,
                fraud_threshold: thresholds.fraud,
            },
            metrics: MetricsConfig::default(),
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.bind_address(), "127.0.0.1:8501");
        assert_eq!(config.detection.thresholds(), RiskThresholds::default());
        assert_eq!(config.models.classifier_file, "rf_model.json");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_file_with_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(
            file,
            r#"
            [server]
            host = "0.0.0.0"
            port = 9000

            [models]
            models_dir = "artifacts"

            [detection]
            warning_threshold = 0.4
            fraud_threshold = 0.8

            [logging]
            level = "debug"
            format = "json"
            "#
        )
        .unwrap();

        let config = AppConfig::load_from_path(file.path()).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.models.models_dir, "artifacts");
        assert_eq!(config.models.reducer_file, "pca_transformer.json");
        assert_eq!(config.detection.thresholds(), RiskThresholds::new(0.4, 0.8));
        assert_eq!(config.metrics.report_interval_secs, 300);
    }

    #[test]
    fn test_environment_overrides_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(
            file,
            r#"
            [server]
            host = "127.0.0.1"
            port = 8501

            [models]
            models_dir = "models"
            onnx_threads = 1

            [detection]
            warning_threshold = 0.5
            fraud_threshold = 0.7

            [logging]
            level = "info"
            format = "pretty"
            "#
        )
        .unwrap();

        // no other test reads this key
        std::env::set_var("FRAUD__MODELS__ONNX_THREADS", "6");
        let config = AppConfig::load_from_path(file.path());
        std::env::remove_var("FRAUD__MODELS__ONNX_THREADS");

        let config = config.unwrap();
        assert_eq!(config.models.onnx_threads, 6);
        assert_eq!(config.server.port, 8501);
    }

    #[test]
    fn test_rejects_inverted_thresholds() {
        let mut config = AppConfig::default();
        config.detection.warning_threshold = 0.9;
        config.detection.fraud_threshold = 0.7;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_unknown_log_format() {
        let mut config = AppConfig::default();
        config.logging.format = "xml".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_shipped_config_loads() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join(DEFAULT_CONFIG_PATH);
        let config = AppConfig::load_from_path(path).unwrap();
        assert_eq!(config.detection.thresholds(), RiskThresholds::default());
        assert_eq!(config.models.models_dir, "models");
    }
}
