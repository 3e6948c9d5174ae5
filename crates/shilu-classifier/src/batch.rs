/// Batch processing: read document files, segment them into articles and
/// analyze every article. The latest batch stays in memory so its articles can
/// be classified one by one afterwards.
use std::path::{Path, PathBuf};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use shilu_core::analyzer::Analyzer;
use shilu_core::category::CategoryPath;
use shilu_core::model::AnalysisResult;
use shilu_core::segmenter::segment_document;

use crate::error::AppError;

/// One analyzed article of a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BatchArticle {
    pub article_id: String,
    pub original_text: String,
    pub analysis: AnalysisResult,
    /// Commit key once the article has been classified.
    pub classification_key: Option<String>,
}

/// A file that could not be processed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BatchFailure {
    /// `"ERROR_{file name}"`
    pub article_id: String,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BatchEntry {
    Article(BatchArticle),
    Failure(BatchFailure),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct BatchSummary {
    pub files: usize,
    pub articles: usize,
    pub failed_files: usize,
}

#[derive(Debug, Default)]
pub struct BatchSession {
    entries: Vec<BatchEntry>,
}

impl BatchSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[BatchEntry] {
        &self.entries
    }

    /// Replace the current batch with the articles of `files`.
    ///
    /// A file that cannot be read becomes a [`BatchFailure`] entry; the
    /// remaining files are still processed.
    pub fn process_files(&mut self, files: &[PathBuf], analyzer: &Analyzer<'_>) -> BatchSummary {
        self.entries.clear();
        let mut summary = BatchSummary {
            files: files.len(),
            articles: 0,
            failed_files: 0,
        };

        for (i, path) in files.iter().enumerate() {
            let file_name = display_name(path);
            let text = match std::fs::read_to_string(path) {
                Ok(text) => text,
                Err(e) => {
                    warn!(error = %e, file = %file_name, "batch file unreadable");
                    summary.failed_files += 1;
                    self.entries.push(BatchEntry::Failure(BatchFailure {
                        article_id: format!("ERROR_{file_name}"),
                        error: format!("处理文件 {file_name} 失败: {e}"),
                    }));
                    continue;
                }
            };

            let articles = segment_document(&text, &path.to_string_lossy());
            summary.articles += articles.len();
            for article in &articles {
                self.entries.push(BatchEntry::Article(BatchArticle {
                    article_id: article.article_id.clone(),
                    original_text: article.original_text.clone(),
                    analysis: analyzer.analyze(&article.original_text),
                    classification_key: None,
                }));
            }

            info!(
                file = %file_name,
                articles = articles.len(),
                progress = %format!("{}/{}", i + 1, files.len()),
                "batch file processed"
            );
        }

        summary
    }

    /// Record `path` as the classification of a batch article and return it.
    pub fn classify(
        &mut self,
        article_id: &str,
        path: &CategoryPath,
    ) -> Result<&BatchArticle, AppError> {
        let article = self
            .entries
            .iter_mut()
            .find_map(|entry| match entry {
                BatchEntry::Article(a) if a.article_id == article_id => Some(a),
                _ => None,
            })
            .ok_or_else(|| AppError::BatchArticleNotFound(article_id.to_string()))?;

        article.classification_key = Some(path.to_string());
        Ok(article)
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
