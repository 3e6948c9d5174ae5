/// Text analyzer: core-info extraction, keyword matching, category
/// recommendation and similar-text retrieval.
///
/// All matching is plain substring containment against the merged keyword map.
/// Nothing here fails; absent matches come back as empty strings and lists.
use indexmap::IndexSet;
use regex::Regex;
use tracing::debug;

use crate::keywords::KeywordStore;
use crate::model::{AnalysisResult, CoreInfo, Recommendation, SimilarText};
use crate::store::ClassifiedStore;

pub const MAX_RECOMMENDATIONS: usize = 3;
pub const MAX_SIMILAR_TEXTS: usize = 3;
/// A stored article needs at least this many shared keywords to count as similar.
pub const MIN_COMMON_KEYWORDS: usize = 2;

const SUBJECT_PATTERN: &str =
    r"(○\d+)?\s*(\w+?巡抚|\w+?总督|\w+?按察使|\w+?知府|\w+?知县|皇上|皇帝|朝廷|部议)";

const DEFAULT_ACTIONS: &[&str] = &[
    "参奏", "题参", "疏报", "谕令", "谕", "抚恤", "赈济", "剿", "捕", "审", "判", "任免", "调", "革职",
];

const GLOSSARY: &[(&str, &str)] = &[
    ("题参", "上奏参劾"),
    ("蠲免", "免除赋税"),
    ("赈粜", "平价卖粮救灾"),
    ("平粜", "平价卖粮"),
];

/// Assigns `nature` when any trigger term occurs in the text.
#[derive(Debug, Clone, PartialEq, Eq)]
struct NatureRule {
    triggers: Vec<String>,
    nature: String,
}

impl NatureRule {
    fn new(triggers: &[&str], nature: &str) -> Self {
        Self {
            triggers: triggers.iter().map(|t| t.to_string()).collect(),
            nature: nature.to_string(),
        }
    }

    fn matches(&self, text: &str) -> bool {
        self.triggers.iter().any(|t| text.contains(t.as_str()))
    }
}

/// Pattern set behind [`CoreInfo`] extraction.
///
/// Actions and nature rules are checked in order; the first hit wins.
#[derive(Debug, Clone)]
pub struct CoreInfoRules {
    subject: Regex,
    actions: Vec<String>,
    natures: Vec<NatureRule>,
}

impl CoreInfoRules {
    fn new(subject: Regex, actions: Vec<String>, natures: Vec<NatureRule>) -> Self {
        Self {
            subject,
            actions,
            natures,
        }
    }

    pub fn extract(&self, text: &str) -> CoreInfo {
        let subject = self
            .subject
            .captures(text)
            .and_then(|caps| caps.get(2).or_else(|| caps.get(1)))
            .map(|m| m.as_str().to_string())
            .unwrap_or_default();

        let action = self
            .actions
            .iter()
            .find(|a| text.contains(a.as_str()))
            .cloned()
            .unwrap_or_default();

        let nature = self
            .natures
            .iter()
            .find(|rule| rule.matches(text))
            .map(|rule| rule.nature.clone())
            .unwrap_or_default();

        CoreInfo {
            subject,
            action,
            nature,
        }
    }
}

impl Default for CoreInfoRules {
    fn default() -> Self {
        Self::new(
            Regex::new(SUBJECT_PATTERN).expect("valid regex"),
            DEFAULT_ACTIONS.iter().map(|a| a.to_string()).collect(),
            vec![
                NatureRule::new(&["不效力", "徇私", "贪暴", "失职"], "官员失职问题"),
                NatureRule::new(&["被灾", "抚恤", "赈济"], "灾害救济事务"),
            ],
        )
    }
}

/// Draft vernacular translation: a core-info header plus glossary notes for
/// every glossary term present in `text`.
pub fn draft_translation(text: &str, core: &CoreInfo) -> String {
    let or_none = |s: &str| if s.is_empty() { "无".to_string() } else { s.to_string() };

    let mut draft = format!(
        "【核心信息】主体: {}, 性质: {}\n\n",
        or_none(&core.subject),
        or_none(&core.nature)
    );
    draft.push_str("【译文草稿】待人工校订。\n\n");

    for (term, note) in GLOSSARY {
        if text.contains(term) {
            draft.push_str(&format!("【术语注释】'{term}' 意为 '{note}'。\n"));
        }
    }

    draft
}

/// Read-only view over the keyword and classified stores.
pub struct Analyzer<'a> {
    keywords: &'a KeywordStore,
    store: &'a ClassifiedStore,
    rules: CoreInfoRules,
}

impl<'a> Analyzer<'a> {
    pub fn new(keywords: &'a KeywordStore, store: &'a ClassifiedStore) -> Self {
        Self {
            keywords,
            store,
            rules: CoreInfoRules::default(),
        }
    }

    /// Full analysis of one text.
    pub fn analyze(&self, text: &str) -> AnalysisResult {
        let core_info = self.extract_core_info(text);
        let keywords = self.extract_keywords(text);
        let translation = draft_translation(text, &core_info);
        let recommendations = self.recommend_categories(&keywords);
        let similar_texts = self.find_similar_texts(text);

        debug!(
            keywords = keywords.len(),
            recommendations = recommendations.len(),
            similar = similar_texts.len(),
            "text analyzed"
        );

        AnalysisResult {
            translation,
            core_info,
            keywords,
            recommendations,
            similar_texts,
        }
    }

    pub fn extract_core_info(&self, text: &str) -> CoreInfo {
        self.rules.extract(text)
    }

    /// Every merged-map keyword that occurs in `text`, without repeats, in the
    /// order the map yields them. Line breaks are removed before matching.
    pub fn extract_keywords(&self, text: &str) -> Vec<String> {
        self.keyword_set(text).into_iter().collect()
    }

    fn keyword_set(&self, text: &str) -> IndexSet<String> {
        let clean: String = text.chars().filter(|c| *c != '\n' && *c != '\r').collect();
        let clean = clean.trim();

        let mut found = IndexSet::new();
        for entry in self.keywords.merged_keywords().values() {
            for keyword in &entry.keywords {
                if clean.contains(keyword.as_str()) {
                    found.insert(keyword.clone());
                }
            }
        }
        found
    }

    /// Categories ranked by how many of `keywords` they list.
    ///
    /// Zero scores are dropped. The sort is stable, so equal scores keep
    /// merged-map order. At most [`MAX_RECOMMENDATIONS`] entries.
    pub fn recommend_categories(&self, keywords: &[String]) -> Vec<Recommendation> {
        let mut scored: Vec<Recommendation> = self
            .keywords
            .merged_keywords()
            .iter()
            .filter_map(|(path, entry)| {
                let matched: Vec<String> = keywords
                    .iter()
                    .filter(|k| entry.contains(k))
                    .cloned()
                    .collect();
                if matched.is_empty() {
                    return None;
                }
                Some(Recommendation {
                    category: path.to_string(),
                    level1: path.level1.clone(),
                    level2: path.level2.clone(),
                    level3: path.level3.clone(),
                    score: matched.len(),
                    reason: entry.description.clone(),
                    matched_keywords: matched,
                })
            })
            .collect();

        scored.sort_by(|a, b| b.score.cmp(&a.score));
        scored.truncate(MAX_RECOMMENDATIONS);
        scored
    }

    /// Stored articles sharing at least [`MIN_COMMON_KEYWORDS`] keywords with
    /// `text`, best first, ties in store order. Stored keyword sets are
    /// recomputed on every call.
    pub fn find_similar_texts(&self, text: &str) -> Vec<SimilarText> {
        let query = self.keyword_set(text);
        if query.len() < MIN_COMMON_KEYWORDS {
            return Vec::new();
        }

        let mut similar: Vec<SimilarText> = self
            .store
            .iter()
            .filter_map(|classified| {
                let stored = self.keyword_set(&classified.article.original_text);
                let common: Vec<String> = query
                    .iter()
                    .filter(|k| stored.contains(*k))
                    .cloned()
                    .collect();
                (common.len() >= MIN_COMMON_KEYWORDS).then(|| SimilarText {
                    article: classified.article.clone(),
                    category_path: classified.path.display_path(),
                    similarity: common.len(),
                    common_keywords: common,
                })
            })
            .collect();

        similar.sort_by(|a, b| b.similarity.cmp(&a.similarity));
        similar.truncate(MAX_SIMILAR_TEXTS);
        similar
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::CategoryPath;
    use crate::keywords::KeywordEntry;

    fn path(key: &str) -> CategoryPath {
        key.parse().unwrap()
    }

    fn table(entries: &[(&str, &[&str])]) -> KeywordStore {
        KeywordStore::from_entries(
            entries
                .iter()
                .map(|(key, words)| (path(key), KeywordEntry::new(words.iter().copied(), "测试"))),
        )
    }

    #[test]
    fn core_info_from_memorial() {
        let store = ClassifiedStore::new();
        let keywords = KeywordStore::builtin();
        let analyzer = Analyzer::new(&keywords, &store);

        let info = analyzer.extract_core_info("○12直隶总督奏报被灾州县，请加抚恤。");
        assert_eq!(info.subject, "直隶总督");
        assert_eq!(info.action, "抚恤");
        assert_eq!(info.nature, "灾害救济事务");
    }

    #[test]
    fn action_list_order_wins_over_text_order() {
        let rules = CoreInfoRules::default();
        // 审 appears first in the text, 谕 comes first in the list
        let info = rules.extract("审明后谕令地方");
        assert_eq!(info.action, "谕令");
    }

    #[test]
    fn dereliction_outranks_relief() {
        let info = CoreInfoRules::default().extract("知县徇私，赈济不力");
        assert_eq!(info.nature, "官员失职问题");
    }

    #[test]
    fn core_info_is_empty_without_hits() {
        let info = CoreInfoRules::default().extract("天气晴和");
        assert_eq!(info, CoreInfo::default());
    }

    #[test]
    fn draft_translation_header_and_glossary() {
        let core = CoreInfo {
            subject: "巡抚".to_string(),
            action: String::new(),
            nature: String::new(),
        };
        let draft = draft_translation("该抚题参属员，并请蠲免钱粮", &core);
        assert!(draft.starts_with("【核心信息】主体: 巡抚, 性质: 无\n\n"));
        assert!(draft.contains("【术语注释】'题参' 意为 '上奏参劾'。"));
        assert!(draft.contains("【术语注释】'蠲免' 意为 '免除赋税'。"));
        assert!(!draft.contains("平粜"));
    }

    #[test]
    fn keyword_extraction_is_substring_based_and_order_independent() {
        let keywords = table(&[
            ("0/军事与外交事务/战争", &["剿"]),
            ("0/赈灾与民生保障/赈灾", &["赈济"]),
        ]);
        let store = ClassifiedStore::new();
        let analyzer = Analyzer::new(&keywords, &store);

        let a: IndexSet<String> = analyzer.extract_keywords("剿匪后赈济灾民").into_iter().collect();
        let b: IndexSet<String> = analyzer.extract_keywords("赈济灾民后剿匪").into_iter().collect();
        let expected: IndexSet<String> = ["剿", "赈济"].iter().map(|s| s.to_string()).collect();
        assert_eq!(a, expected);
        assert_eq!(b, expected);
    }

    #[test]
    fn keyword_extraction_ignores_line_breaks_and_repeats() {
        let keywords = table(&[
            ("0/赈灾与民生保障/赈灾", &["赈济", "灾民"]),
            ("0/赈灾与民生保障/救灾", &["赈济"]),
        ]);
        let store = ClassifiedStore::new();
        let analyzer = Analyzer::new(&keywords, &store);

        assert_eq!(analyzer.extract_keywords("赈\r\n济灾民"), ["赈济", "灾民"]);
        assert!(analyzer.extract_keywords("").is_empty());
    }

    #[test]
    fn recommendations_rank_by_score_with_stable_ties() {
        let keywords = table(&[
            ("0/a/x", &["甲"]),
            ("0/b/y", &["甲", "乙", "丙"]),
            ("0/c/z", &["乙"]),
            ("0/d/w", &["丁"]),
        ]);
        let store = ClassifiedStore::new();
        let analyzer = Analyzer::new(&keywords, &store);

        let query: Vec<String> = ["甲", "乙", "丙"].iter().map(|s| s.to_string()).collect();
        let recs = analyzer.recommend_categories(&query);

        let order: Vec<(&str, usize)> = recs.iter().map(|r| (r.category.as_str(), r.score)).collect();
        assert_eq!(order, [("0/b/y", 3), ("0/a/x", 1), ("0/c/z", 1)]);
        assert_eq!(recs[0].matched_keywords, ["甲", "乙", "丙"]);
        assert_eq!(recs[0].level2, "b");
        assert_eq!(recs[0].reason, "测试");
    }

    #[test]
    fn recommendations_are_capped_and_skip_zero_scores() {
        let keywords = KeywordStore::builtin();
        let store = ClassifiedStore::new();
        let analyzer = Analyzer::new(&keywords, &store);

        assert!(analyzer.recommend_categories(&[]).is_empty());

        let text = "直隶被灾，开仓赈济，抚恤灾民，修筑堤坝，缉拿盗匪，审理案件";
        let found = analyzer.extract_keywords(text);
        let recs = analyzer.recommend_categories(&found);
        assert!(recs.len() <= MAX_RECOMMENDATIONS);
        assert!(recs.iter().all(|r| r.score > 0));
        assert!(recs.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn similarity_needs_two_shared_keywords() {
        let keywords = table(&[("0/赈灾与民生保障/赈灾", &["被灾", "赈济", "抚恤"])]);
        let mut store = ClassifiedStore::new();
        store.save(
            "某县被灾",
            "",
            &path("0/赈灾与民生保障/赈灾"),
            Some("one"),
        );
        store.save(
            "某县被灾，已行赈济",
            "",
            &path("0/赈灾与民生保障/赈灾"),
            Some("two"),
        );

        let analyzer = Analyzer::new(&keywords, &store);
        let similar = analyzer.find_similar_texts("直隶被灾，请旨赈济");
        assert_eq!(similar.len(), 1);
        assert_eq!(similar[0].article.article_id.as_deref(), Some("two"));
        assert_eq!(similar[0].similarity, 2);
        assert_eq!(similar[0].common_keywords, ["被灾", "赈济"]);
        assert_eq!(similar[0].category_path, "0集 → 赈灾与民生保障 → 赈灾");
    }

    #[test]
    fn similar_texts_keep_top_three_in_store_order() {
        let keywords = table(&[("0/a/x", &["甲", "乙", "丙"])]);
        let mut store = ClassifiedStore::new();
        let leaf = path("0/a/x");
        store.save("甲乙", "", &leaf, Some("1"));
        store.save("甲乙丙", "", &leaf, Some("2"));
        store.save("乙丙", "", &leaf, Some("3"));
        store.save("甲丙", "", &leaf, Some("4"));
        store.save("丙", "", &leaf, Some("5"));

        let analyzer = Analyzer::new(&keywords, &store);
        let ids: Vec<String> = analyzer
            .find_similar_texts("甲乙丙")
            .into_iter()
            .filter_map(|s| s.article.article_id)
            .collect();
        assert_eq!(ids, ["2", "1", "3"]);
    }

    #[test]
    fn analyze_composes_every_part() {
        let keywords = KeywordStore::builtin();
        let store = ClassifiedStore::new();
        let analyzer = Analyzer::new(&keywords, &store);

        let result = analyzer.analyze("○1山东巡抚疏报被灾，请旨赈济。");
        assert_eq!(result.core_info.subject, "山东巡抚");
        assert_eq!(result.core_info.action, "疏报");
        assert!(result.translation.starts_with("【核心信息】主体: 山东巡抚, 性质: 灾害救济事务"));
        assert!(result.keywords.iter().any(|k| k == "赈济"));
        assert!(!result.recommendations.is_empty());
        assert!(result.similar_texts.is_empty());
    }
}
