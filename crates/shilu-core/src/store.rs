/// Classified-data store: L1 → L2 → L3 → ordered list of articles.
///
/// Every article sits at the path it was classified under. Lists keep insertion
/// order; saving an article whose id already exists at the same path replaces the
/// existing entry in place instead of appending.
///
/// Serialized form (the `classified_data.json` layout):
/// `{"0": {"赈灾与民生保障": {"赈灾": [{"originalText": …, "translation": …,
/// "articleId": …, "timestamp": …}]}}}`
use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::category::{CategoryFilter, CategoryPath};
use crate::error::CoreError;
use crate::model::{now_timestamp, Article};
use crate::taxonomy::Taxonomy;

type Level3Map = IndexMap<String, Vec<Article>>;
type Level2Map = IndexMap<String, Level3Map>;

/// Whether a save created a new entry or overwrote one with the same id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SaveOutcome {
    Inserted,
    Updated,
}

/// Per-L2 statistics: total count and L3 → count.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Level2Stats {
    pub count: usize,
    pub levels: IndexMap<String, usize>,
}

/// Per-L1 statistics: display name, total count and L2 breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Level1Stats {
    pub name: String,
    pub count: usize,
    pub levels: IndexMap<String, Level2Stats>,
}

/// Sparse count tree keyed by L1 identifier. Nodes without articles are omitted.
pub type ClassifiedStats = IndexMap<String, Level1Stats>;

/// An article together with the path it is stored under.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedArticle<'a> {
    pub path: CategoryPath,
    pub article: &'a Article,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct ClassifiedStore {
    data: IndexMap<String, Level2Map>,
}

impl ClassifiedStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Save a classified text under a `"L1/L2/L3"` commit key.
    ///
    /// Fails when the key does not have exactly three parts; nothing is stored
    /// in that case.
    pub fn save_classified_text(
        &mut self,
        original_text: &str,
        translation: &str,
        classification_key: &str,
        article_id: Option<&str>,
    ) -> Result<SaveOutcome, CoreError> {
        let path: CategoryPath = classification_key.parse()?;
        Ok(self.save(original_text, translation, &path, article_id))
    }

    /// Save a classified text under `path`, creating missing containers.
    ///
    /// A non-empty `article_id` that matches an entry at the same path replaces
    /// that entry, keeping its position. Otherwise the article is appended.
    pub fn save(
        &mut self,
        original_text: &str,
        translation: &str,
        path: &CategoryPath,
        article_id: Option<&str>,
    ) -> SaveOutcome {
        let article_id = article_id.filter(|id| !id.is_empty());
        let entry = Article {
            original_text: original_text.to_string(),
            translation: translation.to_string(),
            article_id: article_id.map(str::to_string),
            timestamp: now_timestamp(),
        };

        let articles = self
            .data
            .entry(path.level1.clone())
            .or_default()
            .entry(path.level2.clone())
            .or_default()
            .entry(path.level3.clone())
            .or_default();

        let existing = article_id.and_then(|id| {
            articles
                .iter()
                .position(|a| a.article_id.as_deref() == Some(id))
        });

        let outcome = match existing {
            Some(index) => {
                articles[index] = entry;
                SaveOutcome::Updated
            }
            None => {
                articles.push(entry);
                SaveOutcome::Inserted
            }
        };

        debug!(path = %path, ?outcome, "classified text saved");
        outcome
    }

    /// Original texts stored at exactly `path`; empty when the path is absent.
    pub fn category_cases(&self, path: &CategoryPath) -> Vec<String> {
        self.articles_at(path)
            .iter()
            .map(|a| a.original_text.clone())
            .collect()
    }

    pub fn articles_at(&self, path: &CategoryPath) -> &[Article] {
        self.data
            .get(&path.level1)
            .and_then(|l2| l2.get(&path.level2))
            .and_then(|l3| l3.get(&path.level3))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Every stored article in store order: L1, then L2, then L3, then list order.
    pub fn iter(&self) -> impl Iterator<Item = ClassifiedArticle<'_>> + '_ {
        self.filtered(&CategoryFilter::all()).into_iter()
    }

    /// Articles under the nodes selected by `filter`, in store order.
    pub fn filtered(&self, filter: &CategoryFilter) -> Vec<ClassifiedArticle<'_>> {
        let mut selected = Vec::new();
        for (l1, l2_map) in &self.data {
            if !filter.matches_level1(l1) {
                continue;
            }
            for (l2, l3_map) in l2_map {
                if !filter.matches_level2(l2) {
                    continue;
                }
                for (l3, articles) in l3_map {
                    if !filter.matches_level3(l3) {
                        continue;
                    }
                    let path = CategoryPath::new(l1.as_str(), l2.as_str(), l3.as_str());
                    selected.extend(articles.iter().map(|article| ClassifiedArticle {
                        path: path.clone(),
                        article,
                    }));
                }
            }
        }
        selected
    }

    pub fn total_count(&self) -> usize {
        self.data
            .values()
            .flat_map(|l2| l2.values())
            .flat_map(|l3| l3.values())
            .map(Vec::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total_count() == 0
    }

    /// Count tree restricted to `filter`.
    ///
    /// Counts include every stored article, also those under paths the taxonomy
    /// does not know; the taxonomy only supplies L1 display names. Nodes with a
    /// zero count are omitted, so a leaf filter yields at most one branch.
    pub fn stats(&self, filter: &CategoryFilter, taxonomy: &Taxonomy) -> ClassifiedStats {
        let mut result = ClassifiedStats::new();

        for (l1, l2_map) in &self.data {
            if !filter.matches_level1(l1) {
                continue;
            }

            let mut l1_stats = Level1Stats {
                name: taxonomy.level1_name(l1),
                count: 0,
                levels: IndexMap::new(),
            };

            for (l2, l3_map) in l2_map {
                if !filter.matches_level2(l2) {
                    continue;
                }

                let mut l2_stats = Level2Stats::default();
                for (l3, articles) in l3_map {
                    if !filter.matches_level3(l3) || articles.is_empty() {
                        continue;
                    }
                    l2_stats.count += articles.len();
                    l2_stats.levels.insert(l3.clone(), articles.len());
                }

                if l2_stats.count > 0 {
                    l1_stats.count += l2_stats.count;
                    l1_stats.levels.insert(l2.clone(), l2_stats);
                }
            }

            if l1_stats.count > 0 {
                if taxonomy.category_tree().get(l1).is_none() {
                    warn!(level1 = %l1, "classified data contains an unknown L1 key");
                }
                result.insert(l1.clone(), l1_stats);
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RELIEF: &str = "0/赈灾与民生保障/赈灾";
    const CORRUPTION: &str = "1/腐败/待补充";

    fn leaf_sum(stats: &ClassifiedStats) -> usize {
        stats
            .values()
            .flat_map(|l1| l1.levels.values())
            .flat_map(|l2| l2.levels.values())
            .sum()
    }

    #[test]
    fn upsert_by_article_id_replaces_in_place() {
        let mut store = ClassifiedStore::new();
        store
            .save_classified_text("甲", "", RELIEF, Some("doc_1"))
            .unwrap();
        store
            .save_classified_text("乙", "", RELIEF, Some("doc_2"))
            .unwrap();
        let outcome = store
            .save_classified_text("甲改", "译文", RELIEF, Some("doc_1"))
            .unwrap();

        assert_eq!(outcome, SaveOutcome::Updated);
        let path: CategoryPath = RELIEF.parse().unwrap();
        assert_eq!(store.category_cases(&path), ["甲改", "乙"]);
        assert_eq!(store.articles_at(&path)[0].translation, "译文");
    }

    #[test]
    fn different_or_missing_id_appends() {
        let mut store = ClassifiedStore::new();
        store
            .save_classified_text("甲", "", RELIEF, Some("doc_1"))
            .unwrap();
        store
            .save_classified_text("甲", "", RELIEF, Some("doc_2"))
            .unwrap();
        store.save_classified_text("甲", "", RELIEF, None).unwrap();
        store.save_classified_text("甲", "", RELIEF, Some("")).unwrap();
        assert_eq!(store.total_count(), 4);
    }

    #[test]
    fn same_id_under_another_path_is_a_new_entry() {
        let mut store = ClassifiedStore::new();
        store
            .save_classified_text("甲", "", RELIEF, Some("doc_1"))
            .unwrap();
        let outcome = store
            .save_classified_text("甲", "", CORRUPTION, Some("doc_1"))
            .unwrap();
        assert_eq!(outcome, SaveOutcome::Inserted);
        assert_eq!(store.total_count(), 2);
    }

    #[test]
    fn malformed_key_stores_nothing() {
        let mut store = ClassifiedStore::new();
        let err = store
            .save_classified_text("甲", "", "0/赈灾与民生保障", None)
            .unwrap_err();
        assert!(matches!(err, CoreError::MalformedCategoryKey { .. }));
        assert!(store.is_empty());
    }

    #[test]
    fn category_cases_for_absent_path_is_empty() {
        let store = ClassifiedStore::new();
        assert!(store.category_cases(&RELIEF.parse().unwrap()).is_empty());
    }

    #[test]
    fn iteration_follows_store_order() {
        let mut store = ClassifiedStore::new();
        store.save_classified_text("一", "", CORRUPTION, None).unwrap();
        store.save_classified_text("二", "", RELIEF, None).unwrap();
        store.save_classified_text("三", "", CORRUPTION, None).unwrap();

        let texts: Vec<&str> = store
            .iter()
            .map(|c| c.article.original_text.as_str())
            .collect();
        assert_eq!(texts, ["一", "三", "二"]);
    }

    #[test]
    fn unfiltered_stats_sum_to_total() {
        let taxonomy = Taxonomy::builtin();
        let mut store = ClassifiedStore::new();
        store.save_classified_text("一", "", RELIEF, None).unwrap();
        store.save_classified_text("二", "", RELIEF, None).unwrap();
        store
            .save_classified_text("三", "", "0/科举与教育/科举", None)
            .unwrap();
        store.save_classified_text("四", "", CORRUPTION, None).unwrap();
        store
            .save_classified_text("五", "", "自定义/地方/杂项", None)
            .unwrap();

        let stats = store.stats(&CategoryFilter::all(), &taxonomy);
        assert_eq!(leaf_sum(&stats), store.total_count());
        assert_eq!(stats["0"].name, "事务类 (Affairs)");
        assert_eq!(stats["0"].count, 3);
        assert_eq!(stats["0"].levels["赈灾与民生保障"].levels["赈灾"], 2);
        assert_eq!(stats["自定义"].name, "未知 L1 (自定义)");
    }

    #[test]
    fn stats_are_sparse_and_filtered() {
        let taxonomy = Taxonomy::builtin();
        let mut store = ClassifiedStore::new();
        store.save_classified_text("一", "", RELIEF, None).unwrap();
        store
            .save_classified_text("二", "", "0/赈灾与民生保障/救灾", None)
            .unwrap();
        store.save_classified_text("三", "", CORRUPTION, None).unwrap();

        let l1_only = store.stats(&CategoryFilter::parse(Some("0")).unwrap(), &taxonomy);
        assert_eq!(l1_only.len(), 1);
        assert_eq!(l1_only["0"].count, 2);
        assert!(!l1_only["0"].levels.contains_key("科举与教育"));

        let leaf = store.stats(&CategoryFilter::parse(Some(RELIEF)).unwrap(), &taxonomy);
        assert_eq!(leaf["0"].count, 1);
        assert_eq!(leaf["0"].levels.len(), 1);
        assert_eq!(leaf["0"].levels["赈灾与民生保障"].levels.len(), 1);
        assert_eq!(leaf["0"].levels["赈灾与民生保障"].levels["赈灾"], 1);

        let unknown = store.stats(&CategoryFilter::parse(Some("0/不存在")).unwrap(), &taxonomy);
        assert!(unknown.is_empty());
    }

    #[test]
    fn serialized_layout_matches_data_file() {
        let mut store = ClassifiedStore::new();
        store
            .save_classified_text("○1直隶被灾", "译", RELIEF, Some("doc_1"))
            .unwrap();

        let json = serde_json::to_value(&store).unwrap();
        let entry = &json["0"]["赈灾与民生保障"]["赈灾"][0];
        assert_eq!(entry["originalText"], "○1直隶被灾");
        assert_eq!(entry["articleId"], "doc_1");
        assert!(entry["timestamp"].as_f64().unwrap() > 0.0);

        let restored: ClassifiedStore = serde_json::from_value(json).unwrap();
        assert_eq!(restored.category_cases(&RELIEF.parse().unwrap()), ["○1直隶被灾"]);
    }
}
