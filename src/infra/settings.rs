// ============================================================
// Layer 6 - Settings
// ============================================================
// Layered configuration, lowest priority first:
//
//   built-in defaults
//   Churn.toml in the working directory (or the --config file)
//   CHURN_* environment variables (CHURN_ARTIFACTS_DIR=...)
//
// Command-line flags are applied on top of the result by the CLI.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::data::loader::DEFAULT_DATASET_URL;
use crate::data::splitter::SPLIT_SEED;
use crate::domain::hyperparams::validate_learning_rate;

pub const DEFAULT_CONFIG_FILE: &str = "Churn.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub artifacts_dir:      PathBuf,
    pub dataset_url:        String,
    pub fetch_timeout_secs: u64,
    /// Overrides the optimizer's default learning rate when set
    #[serde(default)]
    pub learning_rate:      Option<f64>,
    pub seed:               u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            artifacts_dir:      PathBuf::from("artifacts"),
            dataset_url:        DEFAULT_DATASET_URL.to_string(),
            fetch_timeout_secs: 60,
            learning_rate:      None,
            seed:               SPLIT_SEED,
        }
    }
}

impl Settings {
    /// `config` replaces the default Churn.toml lookup. An explicit file
    /// must exist; the default one is optional.
    pub fn load(config: Option<&Path>) -> Result<Self> {
        let file = match config {
            Some(path) => {
                anyhow::ensure!(path.exists(), "Config file '{}' not found", path.display());
                path.to_path_buf()
            }
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        let figment = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(&file))
            .merge(Env::prefixed("CHURN_"));

        Self::extract(figment).with_context(|| format!("Invalid settings (file '{}')", file.display()))
    }

    fn extract(figment: Figment) -> Result<Self> {
        let settings: Settings = figment.extract()?;
        anyhow::ensure!(settings.fetch_timeout_secs > 0, "fetch_timeout_secs must be positive");
        if let Some(lr) = settings.learning_rate {
            validate_learning_rate(lr)?;
        }
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_toml(toml: &str) -> Result<Settings> {
        Settings::extract(
            Figment::from(Serialized::defaults(Settings::default())).merge(Toml::string(toml)),
        )
    }

    #[test]
    fn test_defaults() {
        let s = with_toml("").unwrap();
        assert_eq!(s, Settings::default());
        assert_eq!(s.fetch_timeout_secs, 60);
        assert_eq!(s.seed, 42);
    }

    #[test]
    fn test_toml_overrides_defaults() {
        let s = with_toml("artifacts_dir = \"/tmp/churn\"\nlearning_rate = 0.05\n").unwrap();
        assert_eq!(s.artifacts_dir, PathBuf::from("/tmp/churn"));
        assert_eq!(s.learning_rate, Some(0.05));
        assert_eq!(s.dataset_url, DEFAULT_DATASET_URL);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(with_toml("fetch_timeout_secs = 0").is_err());
        assert!(with_toml("learning_rate = -1.0").is_err());
    }

    #[test]
    fn test_missing_explicit_config_file() {
        assert!(Settings::load(Some(Path::new("/definitely/not/here.toml"))).is_err());
    }
}
