/// JSON file persistence for the classifier state.
///
/// Loading degrades gracefully: a missing file yields the empty default, and an
/// unreadable or corrupt file is logged and replaced by the default. The one
/// exception is a custom-keyword key that does not name three levels, which is
/// reported to the caller.
///
/// Files, all UTF-8 pretty-printed JSON inside the data directory:
/// - classified data: `{L1: {L2: {L3: [article, ...]}}}`
/// - custom keywords: `{"事务类-L2-L3": {"keywords": [...], "description": "..."}}`
/// - translation history: `[{"originalText", "translation", "timestamp"}, ...]`
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use shilu_core::keywords::{KeywordStore, PersistedKeywords};
use shilu_core::model::TranslationRecord;
use shilu_core::store::ClassifiedStore;

use crate::config::Config;
use crate::error::AppError;

pub struct Storage {
    classified_path: PathBuf,
    keyword_path: PathBuf,
    history_path: PathBuf,
}

impl Storage {
    /// Resolve file paths from `config`, creating the data directory if needed.
    pub fn open(config: &Config) -> Result<Self, AppError> {
        fs::create_dir_all(&config.data_dir).map_err(|e| AppError::Storage {
            path: config.data_dir.display().to_string(),
            message: format!("cannot create data directory: {e}"),
        })?;

        Ok(Self {
            classified_path: config.classified_path(),
            keyword_path: config.keyword_path(),
            history_path: config.history_path(),
        })
    }

    pub fn load_classified(&self) -> ClassifiedStore {
        let store: ClassifiedStore = load_or_default(&self.classified_path);
        info!(articles = store.total_count(), "classified data loaded");
        store
    }

    /// Built-in keywords overlaid with the saved custom entries.
    pub fn load_keywords(&self) -> Result<KeywordStore, AppError> {
        let custom: PersistedKeywords = load_or_default(&self.keyword_path);
        let custom_count = custom.len();
        let store = KeywordStore::with_custom(custom)?;
        info!(custom = custom_count, "keyword store loaded");
        Ok(store)
    }

    pub fn load_history(&self) -> Vec<TranslationRecord> {
        let history: Vec<TranslationRecord> = load_or_default(&self.history_path);
        info!(records = history.len(), "translation history loaded");
        history
    }

    pub fn save_classified(&self, store: &ClassifiedStore) -> Result<(), AppError> {
        save_json(&self.classified_path, store)
    }

    pub fn save_keywords(&self, keywords: &KeywordStore) -> Result<(), AppError> {
        save_json(&self.keyword_path, &keywords.custom_keywords())
    }

    pub fn save_history(&self, history: &[TranslationRecord]) -> Result<(), AppError> {
        save_json(&self.history_path, history)
    }
}

fn load_or_default<T: DeserializeOwned + Default>(path: &Path) -> T {
    if !path.exists() {
        debug!(path = %path.display(), "data file absent, using defaults");
        return T::default();
    }

    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            warn!(error = %e, path = %path.display(), "data file unreadable, using defaults");
            return T::default();
        }
    };

    serde_json::from_str(&content)
        .inspect_err(|e| warn!(error = %e, path = %path.display(), "data file corrupt, using defaults"))
        .unwrap_or_default()
}

fn save_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), AppError> {
    let storage_err = |message: String| AppError::Storage {
        path: path.display().to_string(),
        message,
    };

    let json = serde_json::to_string_pretty(value)
        .map_err(|e| storage_err(format!("serialization failed: {e}")))?;
    fs::write(path, json).map_err(|e| storage_err(format!("write failed: {e}")))?;

    debug!(path = %path.display(), "data file saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shilu_core::category::CategoryPath;

    fn storage(dir: &Path) -> Storage {
        Storage::open(&Config::with_data_dir(dir)).unwrap()
    }

    #[test]
    fn missing_files_load_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(&dir.path().join("nested"));

        assert!(storage.load_classified().is_empty());
        assert!(storage.load_history().is_empty());
        let keywords = storage.load_keywords().unwrap();
        assert!(keywords.custom_keywords().is_empty());
    }

    #[test]
    fn corrupt_file_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(dir.path());
        fs::write(dir.path().join("classified_data.json"), "{not json").unwrap();
        fs::write(dir.path().join("translation_history.json"), "42").unwrap();

        assert!(storage.load_classified().is_empty());
        assert!(storage.load_history().is_empty());
    }

    #[test]
    fn malformed_keyword_key_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(dir.path());
        fs::write(
            dir.path().join("custom_keywords.json"),
            r#"{"事务类-赈灾": {"keywords": ["赈"], "description": "x"}}"#,
        )
        .unwrap();

        assert!(matches!(storage.load_keywords(), Err(AppError::Core(_))));
    }

    #[test]
    fn state_round_trips_through_files() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(dir.path());

        let mut store = ClassifiedStore::new();
        store
            .save_classified_text("○1直隶被灾", "译文", "0/赈灾与民生保障/赈灾", Some("doc_1"))
            .unwrap();
        storage.save_classified(&store).unwrap();

        let mut keywords = KeywordStore::builtin();
        let path: CategoryPath = "1/腐败/待补充".parse().unwrap();
        keywords
            .set_keywords(path.clone(), vec!["贪墨".to_string()])
            .unwrap();
        storage.save_keywords(&keywords).unwrap();

        let history = vec![TranslationRecord {
            original_text: "○1直隶被灾".to_string(),
            translation: "译文".to_string(),
            timestamp: 1.5,
        }];
        storage.save_history(&history).unwrap();

        let restored = storage.load_classified();
        assert_eq!(restored.total_count(), 1);
        let leaf: CategoryPath = "0/赈灾与民生保障/赈灾".parse().unwrap();
        assert_eq!(restored.articles_at(&leaf)[0].article_id.as_deref(), Some("doc_1"));
        assert_eq!(storage.load_keywords().unwrap().keywords(&path), ["贪墨"]);
        assert_eq!(storage.load_history(), history);

        let raw = fs::read_to_string(dir.path().join("custom_keywords.json")).unwrap();
        assert!(raw.contains("问题类-腐败-待补充"));
    }
}
