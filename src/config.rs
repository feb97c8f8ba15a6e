// Configuration for campaign analysis
//
// Which fields must be present, which fields are compared against the golden
// run, and the statistical knobs. Passed explicitly into every analysis call;
// there is no ambient registry of field names.

use crate::error::{AnalysisError, Result};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Configuration for classification and rate estimation
///
/// # Example TOML
/// ```toml
/// required_fields = ["finalcrc", "coremark_freq", "injection_cycle"]
/// compare_fields = ["finalcrc", "coremark_freq"]
/// path_delimiter = "."
/// confidence_level = 0.95
/// window_size = 150
/// ```
///
/// # Example
/// ```
/// use seuscope::config::AnalysisConfig;
///
/// let config = AnalysisConfig::default();
/// assert_eq!(config.confidence_level, 0.95);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Fields whose absence marks a run as critical (SEFI)
    pub required_fields: Vec<String>,

    /// Fields whose mismatch against golden marks a run as corrupted (SDC)
    pub compare_fields: Vec<String>,

    /// Separator of hierarchical register paths
    pub path_delimiter: String,

    /// Two-sided confidence level, strictly inside (0, 1)
    pub confidence_level: f64,

    /// Number of runs per rolling window; must be even and >= 2
    pub window_size: usize,

    /// Field holding the literal register name for per-register breakdowns
    pub register_field: String,

    /// Field used to order runs in time
    pub ordering_field: String,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            required_fields: Vec::new(),
            compare_fields: Vec::new(),
            path_delimiter: ".".to_string(),
            confidence_level: 0.95,
            window_size: 150,
            register_field: "register".to_string(),
            ordering_field: "injection_cycle".to_string(),
        }
    }
}

impl AnalysisConfig {
    /// Create a configuration with the given field sets and default knobs
    pub fn with_fields<S: AsRef<str>>(required: &[S], compare: &[S]) -> Self {
        Self {
            required_fields: required.iter().map(|s| s.as_ref().to_string()).collect(),
            compare_fields: compare.iter().map(|s| s.as_ref().to_string()).collect(),
            ..Self::default()
        }
    }

    /// Tighter confidence bands (99%)
    pub fn strict() -> Self {
        Self {
            confidence_level: 0.99,
            ..Self::default()
        }
    }

    /// Looser confidence bands (90%) and a shorter window
    pub fn permissive() -> Self {
        Self {
            confidence_level: 0.90,
            window_size: 50,
            ..Self::default()
        }
    }

    /// Load configuration from a TOML file
    pub fn from_toml<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path.as_ref()).with_context(|| {
            format!("Failed to read config file: {}", path.as_ref().display())
        })?;

        let config: AnalysisConfig =
            toml::from_str(&content).context("Failed to parse TOML analysis config")?;
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        validate_confidence(self.confidence_level)?;
        validate_window(self.window_size)?;

        if self.path_delimiter.is_empty() {
            return Err(AnalysisError::invalid(
                "path_delimiter",
                "must not be empty",
            ));
        }

        Ok(())
    }
}

pub(crate) fn validate_confidence(level: f64) -> Result<()> {
    if !(level > 0.0 && level < 1.0) {
        return Err(AnalysisError::invalid(
            "confidence_level",
            format!("must be in (0, 1), got {}", level),
        ));
    }
    Ok(())
}

pub(crate) fn validate_window(window_size: usize) -> Result<()> {
    if window_size < 2 || window_size % 2 != 0 {
        return Err(AnalysisError::invalid(
            "window_size",
            format!("must be even and >= 2, got {}", window_size),
        ));
    }
    Ok(())
}
