use std::path::{Path, PathBuf};

use crate::error::AppError;

const DEFAULT_CLASSIFIED_FILE: &str = "classified_data.json";
const DEFAULT_KEYWORD_FILE: &str = "custom_keywords.json";
const DEFAULT_HISTORY_FILE: &str = "translation_history.json";

/// Application configuration loaded explicitly from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the persisted JSON files. Created on startup if missing.
    pub data_dir: PathBuf,
    pub classified_file: String,
    pub keyword_file: String,
    pub history_file: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Required:
    /// - `SHILU_DATA_DIR`: directory for the classified data, custom keywords
    ///   and translation history
    ///
    /// Optional file-name overrides inside that directory:
    /// - `SHILU_CLASSIFIED_FILE` (default `classified_data.json`)
    /// - `SHILU_KEYWORD_FILE` (default `custom_keywords.json`)
    /// - `SHILU_HISTORY_FILE` (default `translation_history.json`)
    pub fn from_env() -> Result<Self, AppError> {
        let data_dir = std::env::var("SHILU_DATA_DIR").map_err(|_| {
            AppError::Config("SHILU_DATA_DIR environment variable is required".to_string())
        })?;

        let mut config = Self::with_data_dir(data_dir);
        let override_name = |var: &str, target: &mut String| {
            if let Some(name) = std::env::var(var).ok().filter(|v| !v.trim().is_empty()) {
                *target = name;
            }
        };
        override_name("SHILU_CLASSIFIED_FILE", &mut config.classified_file);
        override_name("SHILU_KEYWORD_FILE", &mut config.keyword_file);
        override_name("SHILU_HISTORY_FILE", &mut config.history_file);

        Ok(config)
    }

    /// Configuration with default file names under `data_dir`.
    pub fn with_data_dir(data_dir: impl AsRef<Path>) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            classified_file: DEFAULT_CLASSIFIED_FILE.to_string(),
            keyword_file: DEFAULT_KEYWORD_FILE.to_string(),
            history_file: DEFAULT_HISTORY_FILE.to_string(),
        }
    }

    pub fn classified_path(&self) -> PathBuf {
        self.data_dir.join(&self.classified_file)
    }

    pub fn keyword_path(&self) -> PathBuf {
        self.data_dir.join(&self.keyword_file)
    }

    pub fn history_path(&self) -> PathBuf {
        self.data_dir.join(&self.history_file)
    }
}
