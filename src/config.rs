//! # Unified Application Configuration
//!
//! Consolidates pipeline, correction and logging settings into one
//! structured object. Settings load from `DOCNORM_*` environment variables
//! (plus `LOG_FORMAT`), are validated as a whole, and serialize to JSON for
//! diagnostics.

use std::env;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error_correction::{CorrectionConfig, DocumentProfile};
use crate::errors::{AppError, AppResult};
use crate::preprocessing::PipelineConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable multi-line output for development
    #[default]
    Pretty,
    /// One JSON object per event
    Json,
}

impl FromStr for LogFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(AppError::Config(format!(
                "LOG_FORMAT must be 'pretty' or 'json', got '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogFormat::Pretty => f.write_str("pretty"),
            LogFormat::Json => f.write_str("json"),
        }
    }
}

/// Logging configuration settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Level applied to this crate's targets
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

impl LoggingConfig {
    /// Validate logging configuration
    pub fn validate(&self) -> AppResult<()> {
        if !LOG_LEVELS.contains(&self.level.as_str()) {
            return Err(AppError::Config(format!(
                "Log level '{}' is invalid. Expected one of: {}",
                self.level,
                LOG_LEVELS.join(", ")
            )));
        }
        Ok(())
    }
}

/// Validate correction configuration
fn validate_correction(config: &CorrectionConfig) -> AppResult<()> {
    if config.max_edit_distance == 0 {
        return Err(AppError::Config("Max edit distance cannot be 0".to_string()));
    }

    if config.max_edit_distance > 5 {
        return Err(AppError::Config(
            "Max edit distance cannot be greater than 5".to_string(),
        ));
    }

    if !(0.0..=1.0).contains(&config.min_correction_confidence) {
        return Err(AppError::Config(format!(
            "Min correction confidence must be between 0.0 and 1.0, got {}",
            config.min_correction_confidence
        )));
    }

    if config.context_window == 0 {
        return Err(AppError::Config("Context window cannot be 0".to_string()));
    }

    if config.context_window > 50 {
        return Err(AppError::Config(
            "Context window cannot be greater than 50 tokens".to_string(),
        ));
    }

    Ok(())
}

/// Unified application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Image preprocessing configuration
    pub pipeline: PipelineConfig,
    /// Text correction configuration
    pub correction: CorrectionConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key/value source, with defaults for
    /// missing keys.
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        // Pipeline
        if let Some(value) = lookup("DOCNORM_PARALLEL") {
            config.pipeline.parallel = parse_bool("DOCNORM_PARALLEL", &value)?;
            config.correction.parallel = config.pipeline.parallel;
        }

        // Correction
        if let Some(value) = lookup("DOCNORM_PROFILE") {
            config.correction.profile = value.parse::<DocumentProfile>()?;
        }
        if let Some(value) = lookup("DOCNORM_MAX_EDIT_DISTANCE") {
            config.correction.max_edit_distance = value.trim().parse().map_err(|_| {
                AppError::Config("DOCNORM_MAX_EDIT_DISTANCE must be a valid number".to_string())
            })?;
        }
        if let Some(value) = lookup("DOCNORM_MIN_CORRECTION_CONFIDENCE") {
            config.correction.min_correction_confidence = value.trim().parse().map_err(|_| {
                AppError::Config(
                    "DOCNORM_MIN_CORRECTION_CONFIDENCE must be a valid number".to_string(),
                )
            })?;
        }
        if let Some(value) = lookup("DOCNORM_CONTEXT_WINDOW") {
            config.correction.context_window = value.trim().parse().map_err(|_| {
                AppError::Config("DOCNORM_CONTEXT_WINDOW must be a valid number".to_string())
            })?;
        }
        if let Some(value) = lookup("DOCNORM_ENABLE_CONTEXTUAL") {
            config.correction.enable_contextual_correction =
                parse_bool("DOCNORM_ENABLE_CONTEXTUAL", &value)?;
        }
        if let Some(value) = lookup("DOCNORM_ENABLE_CONSISTENCY") {
            config.correction.enable_consistency = parse_bool("DOCNORM_ENABLE_CONSISTENCY", &value)?;
        }

        // Logging
        if let Some(value) = lookup("DOCNORM_LOG_LEVEL") {
            config.logging.level = value.trim().to_lowercase();
        }
        if let Some(value) = lookup("LOG_FORMAT") {
            config.logging.format = value.parse()?;
        }

        Ok(config)
    }

    /// Validate all configuration sections
    pub fn validate(&self) -> AppResult<()> {
        validate_correction(&self.correction)?;
        self.logging.validate()?;
        Ok(())
    }

    /// Get a summary of the current configuration for logging
    pub fn summary(&self) -> String {
        format!(
            "Configuration: parallel={}, profile={}, max_edit_distance={}, min_correction_confidence={}, context_window={}, contextual={}, consistency={}, log_level={}, log_format={}",
            self.pipeline.parallel,
            self.correction.profile,
            self.correction.max_edit_distance,
            self.correction.min_correction_confidence,
            self.correction.context_window,
            self.correction.enable_contextual_correction,
            self.correction.enable_consistency,
            self.logging.level,
            self.logging.format
        )
    }

    /// Pretty-printed JSON of the whole configuration
    pub fn to_json(&self) -> AppResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| AppError::Internal(format!("Failed to serialize configuration: {}", e)))
    }
}

fn parse_bool(key: &str, value: &str) -> AppResult<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(AppError::Config(format!("{} must be true or false", key))),
    }
}
