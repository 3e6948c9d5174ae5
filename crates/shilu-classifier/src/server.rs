/// MCP server for classifying Qing Shilu articles.
///
/// Analysis tools:
/// - `analyze_text`, `segment_document`, `process_batch`
///
/// Classification and keyword maintenance:
/// - `save_classification`, `classify_batch_article`
/// - `get_category_tree`, `list_keywords`, `get_keywords`, `set_keywords`
///
/// Reporting:
/// - `get_stats`, `export_csv`, `get_category_cases`
///
/// Corpus preparation:
/// - `clean_corpus`, `number_lines`, `extract_range`, `random_draw`
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rmcp::{
    Json, ServerHandler,
    handler::server::router::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::*,
    tool, tool_handler, tool_router,
};
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use shilu_core::analyzer::Analyzer;
use shilu_core::category::{CategoryFilter, CategoryPath};
use shilu_core::export::export_to_csv;
use shilu_core::keywords::KeywordStore;
use shilu_core::model::{now_timestamp, AnalysisResult, TranslationRecord};
use shilu_core::prepare::{self, CleanedCorpus};
use shilu_core::segmenter::segment_document;
use shilu_core::store::ClassifiedStore;
use shilu_core::taxonomy::Taxonomy;

use crate::api::{
    AnalyzeTextParams, BatchResponse, CategoryCasesParams, CategoryCasesResponse,
    CategoryKeyParams, CategoryTreeResponse, ClassifyBatchArticleParams, ExportCsvParams,
    ExportCsvResponse, ExtractRangeParams, KeywordCategory, KeywordListResponse,
    KeywordsResponse, LinesResponse, ProcessBatchParams, RandomDrawParams,
    SaveClassificationParams, SaveResponse, SegmentDocumentParams, SegmentResponse,
    SetKeywordsParams, StatsParams, StatsResponse, TextParams, TextResponse,
};
use crate::batch::BatchSession;
use crate::error::AppError;
use crate::storage::Storage;

/// Translation records kept in memory and on disk; older ones are dropped first.
pub const MAX_HISTORY_RECORDS: usize = 1000;

/// Mutable application state. A single `RwLock` guards all of it, so there is
/// at most one writer and readers see a consistent snapshot.
pub struct AppState {
    pub keywords: KeywordStore,
    pub classified: ClassifiedStore,
    pub history: Vec<TranslationRecord>,
    pub batch: BatchSession,
}

impl AppState {
    pub fn load(storage: &Storage) -> Result<Self, AppError> {
        Ok(Self {
            keywords: storage.load_keywords()?,
            classified: storage.load_classified(),
            history: storage.load_history(),
            batch: BatchSession::new(),
        })
    }

    /// Append a translation record, dropping the oldest beyond [`MAX_HISTORY_RECORDS`].
    pub fn record_translation(&mut self, record: TranslationRecord) {
        self.history.push(record);
        let excess = self.history.len().saturating_sub(MAX_HISTORY_RECORDS);
        if excess > 0 {
            self.history.drain(..excess);
        }
    }
}

#[derive(Clone)]
pub struct ShiluServer {
    state: Arc<RwLock<AppState>>,
    taxonomy: Arc<Taxonomy>,
    storage: Arc<Storage>,
    tool_router: ToolRouter<ShiluServer>,
}

impl ShiluServer {
    pub fn new(state: AppState, taxonomy: Taxonomy, storage: Storage) -> Self {
        Self {
            state: Arc::new(RwLock::new(state)),
            taxonomy: Arc::new(taxonomy),
            storage: Arc::new(storage),
            tool_router: Self::tool_router(),
        }
    }
}

fn persist_err(e: AppError) -> String {
    error!(error = %e, "persisting state failed");
    format!("change applied in memory but not saved: {e}")
}

fn parse_filter(filter: Option<&str>) -> Result<CategoryFilter, String> {
    CategoryFilter::parse(filter).map_err(|e| format!("invalid filter: {e}"))
}

#[tool_router]
impl ShiluServer {
    #[tool(description = "Analyze one article: core subject/action/nature, matched keywords, top-3 category recommendations, up to 3 similar classified articles and a draft translation. The result is appended to the translation history (latest 1000 records).")]
    async fn analyze_text(
        &self,
        Parameters(params): Parameters<AnalyzeTextParams>,
    ) -> Result<Json<AnalysisResult>, String> {
        let mut state = self.state.write().await;
        let result = Analyzer::new(&state.keywords, &state.classified).analyze(&params.text);

        state.record_translation(TranslationRecord {
            original_text: params.text,
            translation: result.translation.clone(),
            timestamp: now_timestamp(),
        });
        if let Err(e) = self.storage.save_history(&state.history) {
            warn!(error = %e, "translation history not saved");
        }

        Ok(Json(result))
    }

    #[tool(description = "Split a raw document into articles at every ○ or ○n marker. Ids are '{document base name}_{n}'. Text before the first marker becomes article 1.")]
    async fn segment_document(
        &self,
        Parameters(params): Parameters<SegmentDocumentParams>,
    ) -> Result<Json<SegmentResponse>, String> {
        let name = params.document_name.unwrap_or_default();
        let articles = segment_document(&params.text, &name);
        Ok(Json(SegmentResponse { articles }))
    }

    #[tool(description = "Read, segment and analyze a list of text files. Replaces the in-memory batch; unreadable files are reported as ERROR_ entries.")]
    async fn process_batch(
        &self,
        Parameters(params): Parameters<ProcessBatchParams>,
    ) -> Result<Json<BatchResponse>, String> {
        if params.files.is_empty() {
            return Err("files must not be empty".to_string());
        }
        let files: Vec<PathBuf> = params.files.iter().map(PathBuf::from).collect();

        let mut guard = self.state.write().await;
        let state = &mut *guard;
        let analyzer = Analyzer::new(&state.keywords, &state.classified);
        let summary = state.batch.process_files(&files, &analyzer);
        info!(
            files = summary.files,
            articles = summary.articles,
            failed = summary.failed_files,
            "batch processed"
        );

        Ok(Json(BatchResponse {
            summary,
            entries: state.batch.entries().to_vec(),
        }))
    }

    #[tool(description = "Classify an article from the latest batch under a 'L1/L2/L3' key and save it (replacing an earlier save of the same article id at that path).")]
    async fn classify_batch_article(
        &self,
        Parameters(params): Parameters<ClassifyBatchArticleParams>,
    ) -> Result<Json<SaveResponse>, String> {
        let path: CategoryPath = params
            .classification_key
            .parse()
            .map_err(|e| format!("invalid classification key: {e}"))?;

        let mut guard = self.state.write().await;
        let state = &mut *guard;
        let article = state
            .batch
            .classify(&params.article_id, &path)
            .map_err(|e| e.to_string())?;
        let (text, translation) = (
            article.original_text.clone(),
            article.analysis.translation.clone(),
        );

        let outcome = state
            .classified
            .save(&text, &translation, &path, Some(&params.article_id));
        self.storage
            .save_classified(&state.classified)
            .map_err(persist_err)?;

        Ok(Json(SaveResponse {
            outcome,
            classification_key: path.to_string(),
            article_id: Some(params.article_id),
            total_articles: state.classified.total_count(),
        }))
    }

    #[tool(description = "Save a classified text under a 'L1/L2/L3' key, e.g. '0/赈灾与民生保障/赈灾'. With an article_id, an existing entry with the same id at that path is replaced.")]
    async fn save_classification(
        &self,
        Parameters(params): Parameters<SaveClassificationParams>,
    ) -> Result<Json<SaveResponse>, String> {
        if params.original_text.trim().is_empty() {
            return Err("original_text must not be empty".to_string());
        }

        let mut state = self.state.write().await;
        let outcome = state
            .classified
            .save_classified_text(
                &params.original_text,
                params.translation.as_deref().unwrap_or_default(),
                &params.classification_key,
                params.article_id.as_deref(),
            )
            .map_err(|e| format!("save failed: {e}"))?;
        self.storage
            .save_classified(&state.classified)
            .map_err(persist_err)?;

        Ok(Json(SaveResponse {
            outcome,
            classification_key: params.classification_key.trim().to_string(),
            article_id: params.article_id.filter(|id| !id.is_empty()),
            total_articles: state.classified.total_count(),
        }))
    }

    #[tool(description = "Return the three-level category tree with L1 display names and L3 descriptions.")]
    async fn get_category_tree(&self) -> Result<Json<CategoryTreeResponse>, String> {
        Ok(Json(CategoryTreeResponse {
            tree: self.taxonomy.category_tree().clone(),
        }))
    }

    #[tool(description = "List every category of the merged keyword table (built-in overlaid by custom) with its keywords and description.")]
    async fn list_keywords(&self) -> Result<Json<KeywordListResponse>, String> {
        let state = self.state.read().await;
        let categories = state
            .keywords
            .merged_keywords()
            .iter()
            .map(|(path, entry)| KeywordCategory {
                category: path.to_string(),
                keyword_key: path.keyword_key(),
                description: entry.description.clone(),
                keywords: entry.keywords.clone(),
                custom: state.keywords.is_custom(path),
            })
            .collect();

        Ok(Json(KeywordListResponse { categories }))
    }

    #[tool(description = "Get the keyword list of one category. Unknown categories return an empty list.")]
    async fn get_keywords(
        &self,
        Parameters(params): Parameters<CategoryKeyParams>,
    ) -> Result<Json<KeywordsResponse>, String> {
        let path = CategoryPath::parse_any(&params.category)
            .map_err(|e| format!("invalid category: {e}"))?;

        let state = self.state.read().await;
        Ok(Json(KeywordsResponse {
            category: path.to_string(),
            keywords: state.keywords.keywords(&path).to_vec(),
            description: state.keywords.entry(&path).map(|e| e.description.clone()),
        }))
    }

    #[tool(description = "Replace the keyword list of a category with a custom one. Any three-level key is accepted, including categories outside the built-in tree.")]
    async fn set_keywords(
        &self,
        Parameters(params): Parameters<SetKeywordsParams>,
    ) -> Result<Json<KeywordsResponse>, String> {
        let path = CategoryPath::parse_any(&params.category)
            .map_err(|e| format!("invalid category: {e}"))?;

        if !self.taxonomy.contains(&path) {
            warn!(category = %path, "custom keywords for a category outside the built-in tree");
        }

        let mut state = self.state.write().await;
        state
            .keywords
            .set_keywords(path.clone(), params.keywords)
            .map_err(|e| format!("invalid category: {e}"))?;
        self.storage
            .save_keywords(&state.keywords)
            .map_err(persist_err)?;
        info!(category = %path, "custom keywords updated");

        Ok(Json(KeywordsResponse {
            category: path.to_string(),
            keywords: state.keywords.keywords(&path).to_vec(),
            description: state.keywords.entry(&path).map(|e| e.description.clone()),
        }))
    }

    #[tool(description = "Article counts per L1/L2/L3, optionally restricted by a '/'-separated prefix such as '0' or '0/赈灾与民生保障/赈灾'. Empty nodes are omitted.")]
    async fn get_stats(
        &self,
        Parameters(params): Parameters<StatsParams>,
    ) -> Result<Json<StatsResponse>, String> {
        let filter = parse_filter(params.filter.as_deref())?;

        let state = self.state.read().await;
        let stats = state.classified.stats(&filter, &self.taxonomy);
        let total = stats.values().map(|l1| l1.count).sum();

        Ok(Json(StatsResponse { total, stats }))
    }

    #[tool(description = "Export classified articles (optionally filtered by a '/'-separated prefix) to a CSV file with columns Level1, Level2, Level3, OriginalText, Translation, ArticleId, Timestamp.")]
    async fn export_csv(
        &self,
        Parameters(params): Parameters<ExportCsvParams>,
    ) -> Result<Json<ExportCsvResponse>, String> {
        let file_path = params.file_path.trim().to_string();
        if file_path.is_empty() {
            return Err("file_path must not be empty".to_string());
        }
        let filter = parse_filter(params.filter.as_deref())?;

        let state = self.state.read().await;
        let rows = export_to_csv(&state.classified, Path::new(&file_path), &filter)
            .map_err(|e| e.to_string())?;

        Ok(Json(ExportCsvResponse { file_path, rows }))
    }

    #[tool(description = "Original texts saved under exactly one L1/L2/L3 category. Empty when the category has no articles.")]
    async fn get_category_cases(
        &self,
        Parameters(params): Parameters<CategoryCasesParams>,
    ) -> Result<Json<CategoryCasesResponse>, String> {
        let path = CategoryPath::new(params.level1.trim(), params.level2.trim(), params.level3.trim());

        let state = self.state.read().await;
        Ok(Json(CategoryCasesResponse {
            cases: state.classified.category_cases(&path),
        }))
    }

    #[tool(description = "Clean a corpus with one article per line: strip ○n numbering to a single leading ○, then drop duplicates (width- and NFKC-insensitive), keeping first occurrences.")]
    async fn clean_corpus(
        &self,
        Parameters(params): Parameters<TextParams>,
    ) -> Result<Json<CleanedCorpus>, String> {
        Ok(Json(prepare::clean_corpus(&params.text)))
    }

    #[tool(description = "Prefix every non-empty line with ○n, numbering from 1. Blank lines are kept unnumbered.")]
    async fn number_lines(
        &self,
        Parameters(params): Parameters<TextParams>,
    ) -> Result<Json<TextResponse>, String> {
        Ok(Json(TextResponse {
            text: prepare::number_lines(&params.text),
        }))
    }

    #[tool(description = "Keep the lines numbered ○start through ○end (inclusive) from a numbered corpus.")]
    async fn extract_range(
        &self,
        Parameters(params): Parameters<ExtractRangeParams>,
    ) -> Result<Json<LinesResponse>, String> {
        if params.start > params.end {
            return Err(format!(
                "start ({}) must not exceed end ({})",
                params.start, params.end
            ));
        }
        Ok(Json(LinesResponse {
            lines: prepare::extract_range(&params.text, params.start, params.end),
        }))
    }

    #[tool(description = "Draw distinct non-empty lines at random from a corpus. count defaults to 100 and is capped at the number of lines.")]
    async fn random_draw(
        &self,
        Parameters(params): Parameters<RandomDrawParams>,
    ) -> Result<Json<LinesResponse>, String> {
        let lines = prepare::random_draw(&params.text, params.count, &mut rand::thread_rng());
        Ok(Json(LinesResponse { lines }))
    }
}

#[tool_handler]
impl ServerHandler for ShiluServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_06_18,
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .build(),
            server_info: Implementation {
                name: "shilu-classifier".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                title: None,
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Qing Shilu classification server. Use segment_document or process_batch \
                 to split documents into articles, analyze_text for keyword-based category \
                 recommendations and similar classified articles, save_classification or \
                 classify_batch_article to commit a category, and get_stats, export_csv or \
                 get_category_cases to review the classified collection."
                    .to_string(),
            ),
        }
    }
}
