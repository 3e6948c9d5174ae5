use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use shilu_core::model::SegmentedArticle;
use shilu_core::store::{ClassifiedStats, SaveOutcome};
use shilu_core::taxonomy::Level1Node;

use crate::batch::{BatchEntry, BatchSummary};

// --- Parameters ---

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct AnalyzeTextParams {
    /// The classical-Chinese text of one article.
    pub text: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SegmentDocumentParams {
    /// Raw document text containing `○`/`○n` article markers.
    pub text: String,
    /// Document or file name used to derive article ids (default: "document").
    pub document_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ProcessBatchParams {
    /// Paths of UTF-8 text files to segment and analyze.
    pub files: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ClassifyBatchArticleParams {
    /// Article id from the latest batch, e.g. "卷一_3".
    pub article_id: String,
    /// Commit key "L1/L2/L3", e.g. "0/赈灾与民生保障/赈灾".
    pub classification_key: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SaveClassificationParams {
    pub original_text: String,
    #[serde(default)]
    pub translation: Option<String>,
    /// Commit key "L1/L2/L3".
    pub classification_key: String,
    /// Saving again with the same id at the same path replaces the earlier entry.
    #[serde(default)]
    pub article_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct CategoryKeyParams {
    /// Either "0/赈灾与民生保障/赈灾" or "事务类-赈灾与民生保障-赈灾".
    pub category: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SetKeywordsParams {
    /// Either "0/赈灾与民生保障/赈灾" or "事务类-赈灾与民生保障-赈灾".
    pub category: String,
    /// Replacement keyword list. Blank and repeated entries are dropped.
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct StatsParams {
    /// Optional "/"-separated prefix of up to three levels, e.g. "0" or "0/赈灾与民生保障".
    #[serde(default)]
    pub filter: Option<String>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ExportCsvParams {
    /// Destination file path.
    pub file_path: String,
    /// Optional "/"-separated category prefix.
    #[serde(default)]
    pub filter: Option<String>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct CategoryCasesParams {
    pub level1: String,
    pub level2: String,
    pub level3: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct TextParams {
    /// Corpus text, one article per line.
    pub text: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ExtractRangeParams {
    /// Numbered corpus text (lines starting with `○n`).
    pub text: String,
    /// First article number to keep (inclusive).
    pub start: u64,
    /// Last article number to keep (inclusive).
    pub end: u64,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct RandomDrawParams {
    /// Corpus text, one article per line.
    pub text: String,
    /// Number of lines to draw. Defaults to 100 and is capped at the number of
    /// non-empty lines.
    pub count: Option<usize>,
}

// --- Responses ---

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct SegmentResponse {
    pub articles: Vec<SegmentedArticle>,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct BatchResponse {
    pub summary: BatchSummary,
    pub entries: Vec<BatchEntry>,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct SaveResponse {
    pub outcome: SaveOutcome,
    pub classification_key: String,
    pub article_id: Option<String>,
    pub total_articles: usize,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct CategoryTreeResponse {
    pub tree: IndexMap<String, Level1Node>,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct KeywordCategory {
    /// Commit key "L1/L2/L3".
    pub category: String,
    /// Key as stored in the custom keyword file.
    pub keyword_key: String,
    pub description: String,
    pub keywords: Vec<String>,
    pub custom: bool,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct KeywordListResponse {
    pub categories: Vec<KeywordCategory>,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct KeywordsResponse {
    pub category: String,
    pub keywords: Vec<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct StatsResponse {
    pub total: usize,
    pub stats: ClassifiedStats,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ExportCsvResponse {
    pub file_path: String,
    pub rows: usize,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct CategoryCasesResponse {
    pub cases: Vec<String>,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct LinesResponse {
    pub lines: Vec<String>,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct TextResponse {
    pub text: String,
}
