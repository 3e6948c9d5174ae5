use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A classified text fragment as held in the classified store.
///
/// The category is implied by where the article sits in the store; it is not
/// repeated on the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub original_text: String,
    #[serde(default)]
    pub translation: String,
    /// Present for articles that came out of a segmented document.
    #[serde(default)]
    pub article_id: Option<String>,
    /// Seconds since the Unix epoch at save time.
    pub timestamp: f64,
}

/// An article produced by the segmenter, not yet classified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SegmentedArticle {
    /// `"{documentBaseName}_{n}"`, n starting at 1.
    pub article_id: String,
    pub original_text: String,
}

/// Coarse subject/action/nature triple. Empty strings mean "not found".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CoreInfo {
    pub subject: String,
    pub action: String,
    pub nature: String,
}

/// A scored candidate category for a text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    /// Commit key (`"L1/L2/L3"`) that can be passed straight back when saving.
    pub category: String,
    pub level1: String,
    pub level2: String,
    pub level3: String,
    pub score: usize,
    /// The category description.
    pub reason: String,
    pub matched_keywords: Vec<String>,
}

/// A previously classified article that shares keywords with the query text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SimilarText {
    #[serde(flatten)]
    pub article: Article,
    /// Display path, e.g. `"0集 → 赈灾与民生保障 → 赈灾"`.
    pub category_path: String,
    pub similarity: usize,
    pub common_keywords: Vec<String>,
}

/// Everything the analyzer produces for one text. Never persisted as is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub translation: String,
    pub core_info: CoreInfo,
    pub keywords: Vec<String>,
    pub recommendations: Vec<Recommendation>,
    pub similar_texts: Vec<SimilarText>,
}

/// One entry of the translation history file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TranslationRecord {
    pub original_text: String,
    pub translation: String,
    pub timestamp: f64,
}

/// Current time as fractional seconds since the Unix epoch.
pub fn now_timestamp() -> f64 {
    let now = chrono::Utc::now();
    now.timestamp() as f64 + f64::from(now.timestamp_subsec_micros()) / 1_000_000.0
}
