//! # Configuration Tests
//!
//! Loading settings from `.env`-style files and validating them.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use docnorm::config::{AppConfig, LogFormat};
use docnorm::error_correction::DocumentProfile;
use docnorm::errors::AppError;
use tempfile::TempDir;

/// Reads a dotenv file without touching the process environment.
fn load_env_file(path: &Path) -> HashMap<String, String> {
    dotenvy::from_path_iter(path)
        .unwrap()
        .map(|item| item.unwrap())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env_file() {
        let temp_dir = TempDir::new().unwrap();
        let env_path = temp_dir.path().join(".env");
        fs::write(
            &env_path,
            "# docnorm settings\nDOCNORM_PROFILE=academic\nDOCNORM_PARALLEL=false\nDOCNORM_CONTEXT_WINDOW=7\nLOG_FORMAT=json\n",
        )
        .unwrap();

        let vars = load_env_file(&env_path);
        let config = AppConfig::from_lookup(|key| vars.get(key).cloned()).unwrap();

        assert_eq!(config.correction.profile, DocumentProfile::Academic);
        assert!(!config.pipeline.parallel);
        assert!(!config.correction.parallel);
        assert_eq!(config.correction.context_window, 7);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_out_of_range_file_values_fail_validation() {
        let temp_dir = TempDir::new().unwrap();
        let env_path = temp_dir.path().join(".env");
        fs::write(&env_path, "DOCNORM_MAX_EDIT_DISTANCE=9\n").unwrap();

        let vars = load_env_file(&env_path);
        let config = AppConfig::from_lookup(|key| vars.get(key).cloned()).unwrap();
        let err = config.validate().unwrap_err();

        assert!(matches!(err, AppError::Config(_)));
        assert!(err.to_string().starts_with("[CONFIG]"));
    }

    #[test]
    fn test_json_snapshot_written_and_read_back() {
        let temp_dir = TempDir::new().unwrap();
        let json_path = temp_dir.path().join("config.json");

        let mut config = AppConfig::default();
        config.correction.profile = DocumentProfile::News;
        config.correction.enable_consistency = false;
        fs::write(&json_path, config.to_json().unwrap()).unwrap();

        let parsed: AppConfig = serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_missing_keys_use_defaults() {
        let config = AppConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, AppConfig::default());
        assert!(config.summary().contains("log_format=pretty"));
    }
}
