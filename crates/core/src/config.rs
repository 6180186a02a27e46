use crate::constants::{
    DEFAULT_CLUSTER_COUNT, DEFAULT_INITIATION_GAP_MINUTES, DEFAULT_MAX_ITERATIONS, DEFAULT_N_INIT,
    DEFAULT_NIGHT_END_HOUR, DEFAULT_NIGHT_START_HOUR, DEFAULT_RANDOM_STATE, DEFAULT_TOLERANCE,
    WEIGHT_SUM_EPSILON,
};
use crate::Error;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Main configuration for groupscope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupscopeConfig {
    /// Pipeline parameters.
    pub analysis: AnalysisConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,

    /// Report output configuration.
    pub report: ReportConfig,
}

/// Parameters of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Number of behavior clusters.
    pub n_clusters: usize,

    /// Seed for k-means initialisation.
    pub random_state: u64,

    /// Number of k-means restarts; the lowest inertia wins.
    pub n_init: usize,

    /// Iteration cap per restart.
    pub max_iterations: usize,

    /// Centroid-shift tolerance for convergence.
    pub tolerance: f64,

    /// Silence in minutes after which a message starts a new thread.
    pub initiation_gap_minutes: i64,

    /// First hour of the night window.
    pub night_start_hour: u32,

    /// Hour the night window ends (exclusive).
    pub night_end_hour: u32,

    /// Influence score weights.
    pub influence: InfluenceWeights,

    /// Optional display names keyed by cluster id (`"0"`, `"1"`, ...).
    pub cluster_names: BTreeMap<String, String>,
}

/// Weights of the influence composite. Must sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InfluenceWeights {
    /// Weight of normalized messages per day.
    pub activity: f64,

    /// Weight of normalized response speed.
    pub responsiveness: f64,

    /// Weight of normalized initiation rate.
    pub initiation: f64,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level.
    pub level: LogLevel,
}

/// Log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Error level.
    Error,

    /// Warning level.
    Warn,

    /// Info level.
    Info,

    /// Debug level.
    Debug,

    /// Trace level.
    Trace,
}

impl LogLevel {
    /// Filter directive understood by `tracing-subscriber`.
    pub fn as_directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Report output configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Default output format name (`text`, `json`, `csv`).
    pub format: String,

    /// Decimal places for floating point columns in text and CSV output.
    pub decimals: usize,
}

impl GroupscopeConfig {
    /// Default location of the configuration file.
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| Error::Config("Cannot find config directory".to_string()))?;
        Ok(config_dir.join("groupscope").join("config.toml"))
    }

    /// Load configuration from file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::FileSystem(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| Error::Parse(format!("Failed to parse config: {}", e)))?;
        config.analysis.validate()?;
        debug!(path = %path.display(), "Configuration loaded");
        Ok(config)
    }

    /// Save configuration to file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = self.to_toml()?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, content)
            .map_err(|e| Error::FileSystem(format!("Failed to write config file: {}", e)))
    }

    /// Render configuration as TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| Error::Parse(format!("Failed to serialize config: {}", e)))
    }
}

impl AnalysisConfig {
    /// Check parameter ranges.
    pub fn validate(&self) -> Result<()> {
        if self.n_clusters == 0 {
            return Err(Error::validation("n_clusters must be at least 1"));
        }
        if self.n_init == 0 {
            return Err(Error::validation("n_init must be at least 1"));
        }
        if self.max_iterations == 0 {
            return Err(Error::validation("max_iterations must be at least 1"));
        }
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(Error::validation("tolerance must be a non-negative number"));
        }
        if self.initiation_gap_minutes <= 0 {
            return Err(Error::validation("initiation_gap_minutes must be positive"));
        }
        if self.night_start_hour > 23 || self.night_end_hour > 23 {
            return Err(Error::validation("night window hours must be within 0..=23"));
        }
        if self.night_start_hour == self.night_end_hour {
            return Err(Error::validation("night window must not be empty"));
        }
        self.influence.validate()
    }

    /// Configured display name of a cluster.
    pub fn cluster_name(&self, cluster_id: usize) -> Option<&str> {
        self.cluster_names
            .get(&cluster_id.to_string())
            .map(String::as_str)
    }

    /// Whether an hour of day falls in the night window.
    pub fn is_night_hour(&self, hour: u32) -> bool {
        if self.night_start_hour > self.night_end_hour {
            hour >= self.night_start_hour || hour < self.night_end_hour
        } else {
            hour >= self.night_start_hour && hour < self.night_end_hour
        }
    }
}

impl InfluenceWeights {
    /// Check that weights are non-negative and sum to 1.
    pub fn validate(&self) -> Result<()> {
        let weights = [self.activity, self.responsiveness, self.initiation];
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(Error::validation(
                "influence weights must be non-negative numbers",
            ));
        }
        let sum: f64 = weights.iter().sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_EPSILON {
            return Err(Error::validation(format!(
                "influence weights must sum to 1, got {}",
                sum
            )));
        }
        Ok(())
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            n_clusters: DEFAULT_CLUSTER_COUNT,
            random_state: DEFAULT_RANDOM_STATE,
            n_init: DEFAULT_N_INIT,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tolerance: DEFAULT_TOLERANCE,
            initiation_gap_minutes: DEFAULT_INITIATION_GAP_MINUTES,
            night_start_hour: DEFAULT_NIGHT_START_HOUR,
            night_end_hour: DEFAULT_NIGHT_END_HOUR,
            influence: InfluenceWeights::default(),
            cluster_names: BTreeMap::new(),
        }
    }
}

impl Default for InfluenceWeights {
    fn default() -> Self {
        Self {
            activity: 0.4,
            responsiveness: 0.3,
            initiation: 0.3,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Warn,
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            format: "text".to_string(),
            decimals: 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_analysis_config_is_valid() {
        AnalysisConfig::default()
            .validate()
            .expect("defaults should validate");
    }

    #[test]
    fn weights_not_summing_to_one_are_rejected() {
        let weights = InfluenceWeights {
            activity: 0.5,
            responsiveness: 0.5,
            initiation: 0.5,
        };
        let err = weights.validate().expect_err("sum of 1.5 must be rejected");
        assert!(err.to_string().contains("sum to 1"));
    }

    #[test]
    fn night_window_wraps_midnight() {
        let config = AnalysisConfig::default();
        assert!(config.is_night_hour(22));
        assert!(config.is_night_hour(0));
        assert!(config.is_night_hour(5));
        assert!(!config.is_night_hour(6));
        assert!(!config.is_night_hour(21));
    }

    #[test]
    fn config_round_trips_through_toml_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("config.toml");

        let mut config = GroupscopeConfig::default();
        config.analysis.n_clusters = 3;
        config.analysis.cluster_names.insert("0".to_string(), "Core".to_string());
        config.save(&path).expect("save config");

        let loaded = GroupscopeConfig::load(&path).expect("load config");
        assert_eq!(loaded, config);
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let config: GroupscopeConfig = toml::from_str(
            r#"
            [analysis]
            n_clusters = 2

            [logging]
            level = "debug"
            "#,
        )
        .expect("partial config should parse");
        assert_eq!(config.analysis.n_clusters, 2);
        assert_eq!(config.analysis.random_state, DEFAULT_RANDOM_STATE);
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.report.decimals, 2);
    }
}
