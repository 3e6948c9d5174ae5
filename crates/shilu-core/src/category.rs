/// Category paths and filters.
///
/// A leaf category is addressed by the triple (L1, L2, L3). L1 is a stable
/// identifier (`"0"`, `"1"`); L2 and L3 are names. Two surface forms exist:
/// - commit keys: `"0/赈灾与民生保障/赈灾"`
/// - keyword-file keys: `"事务类-赈灾与民生保障-赈灾"` (L1 written as its label)
///
/// Both parse into the same [`CategoryPath`]; L1 labels are mapped back to their
/// identifier so the two forms compare equal.
use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// The fixed top level of the taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level1 {
    Affairs,
    Issues,
}

impl Level1 {
    pub const ALL: [Level1; 2] = [Level1::Affairs, Level1::Issues];

    /// Stable identifier used in commit keys and the classified store.
    pub fn id(&self) -> &'static str {
        match self {
            Self::Affairs => "0",
            Self::Issues => "1",
        }
    }

    /// Short label used in keyword-file keys.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Affairs => "事务类",
            Self::Issues => "问题类",
        }
    }

    /// Display name shown next to the tree and in statistics.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Affairs => "事务类 (Affairs)",
            Self::Issues => "问题类 (Issues)",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|l| l.id() == id)
    }

    /// Accepts either the identifier or the label.
    pub fn lookup(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|l| l.id() == s || l.label() == s)
    }
}

/// Map a raw L1 component onto its identifier. Unknown values pass through
/// unchanged so freeform categories stay addressable.
fn canonical_level1(raw: &str) -> String {
    match Level1::lookup(raw) {
        Some(l1) => l1.id().to_string(),
        None => raw.to_string(),
    }
}

/// A fully qualified leaf category.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CategoryPath {
    pub level1: String,
    pub level2: String,
    pub level3: String,
}

impl CategoryPath {
    pub fn new(
        level1: impl Into<String>,
        level2: impl Into<String>,
        level3: impl Into<String>,
    ) -> Self {
        let level1: String = level1.into();
        Self {
            level1: canonical_level1(&level1),
            level2: level2.into(),
            level3: level3.into(),
        }
    }

    /// Parse a keyword-file key such as `"事务类-赈灾与民生保障-赈灾"`.
    pub fn from_keyword_key(key: &str) -> Result<Self, CoreError> {
        split_three(key, '-')
    }

    /// Parse either surface form: keys containing `/` are commit keys, anything
    /// else is read as a keyword-file key.
    pub fn parse_any(key: &str) -> Result<Self, CoreError> {
        let key = key.trim();
        if key.contains('/') {
            key.parse()
        } else {
            Self::from_keyword_key(key)
        }
    }

    /// Render the keyword-file form, writing known L1 identifiers as labels.
    ///
    /// Lossy when a component contains `-`; see [`Self::has_keyword_key`].
    pub fn keyword_key(&self) -> String {
        let l1 = Level1::from_id(&self.level1)
            .map(|l| l.label())
            .unwrap_or(self.level1.as_str());
        format!("{l1}-{}-{}", self.level2, self.level3)
    }

    /// True when [`Self::keyword_key`] parses back to this path.
    pub fn has_keyword_key(&self) -> bool {
        ![&self.level1, &self.level2, &self.level3]
            .iter()
            .any(|part| part.contains('-'))
    }

    /// Path string used when presenting similar texts: `"0集 → 赈灾与民生保障 → 赈灾"`.
    pub fn display_path(&self) -> String {
        format!("{}集 → {} → {}", self.level1, self.level2, self.level3)
    }
}

fn split_three(key: &str, delimiter: char) -> Result<CategoryPath, CoreError> {
    let parts: Vec<&str> = key.split(delimiter).collect();
    match parts.as_slice() {
        [l1, l2, l3] if !l1.is_empty() && !l2.is_empty() && !l3.is_empty() => {
            Ok(CategoryPath::new(*l1, *l2, *l3))
        }
        _ => Err(CoreError::MalformedCategoryKey {
            key: key.to_string(),
            delimiter,
            parts: parts.len(),
        }),
    }
}

impl FromStr for CategoryPath {
    type Err = CoreError;

    /// Parse a commit key such as `"0/赈灾与民生保障/赈灾"`.
    fn from_str(key: &str) -> Result<Self, Self::Err> {
        split_three(key.trim(), '/')
    }
}

impl fmt::Display for CategoryPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.level1, self.level2, self.level3)
    }
}

impl Serialize for CategoryPath {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CategoryPath {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

impl JsonSchema for CategoryPath {
    fn schema_name() -> std::borrow::Cow<'static, str> {
        "CategoryPath".into()
    }

    fn json_schema(generator: &mut schemars::SchemaGenerator) -> schemars::Schema {
        String::json_schema(generator)
    }
}

/// A `/`-delimited prefix of zero to three path components.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryFilter {
    pub level1: Option<String>,
    pub level2: Option<String>,
    pub level3: Option<String>,
}

impl CategoryFilter {
    /// No restriction at any level.
    pub fn all() -> Self {
        Self::default()
    }

    /// Parse an optional filter key. `None` and the empty string match everything.
    pub fn parse(key: Option<&str>) -> Result<Self, CoreError> {
        let Some(key) = key.map(str::trim).filter(|k| !k.is_empty()) else {
            return Ok(Self::all());
        };

        let parts: Vec<&str> = key.split('/').collect();
        if parts.len() > 3 {
            return Err(CoreError::MalformedFilter {
                key: key.to_string(),
            });
        }

        let part = |i: usize| {
            parts
                .get(i)
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        Ok(Self {
            level1: part(0).map(|l1| canonical_level1(&l1)),
            level2: part(1),
            level3: part(2),
        })
    }

    pub fn matches_level1(&self, level1: &str) -> bool {
        self.level1.as_deref().map_or(true, |f| f == level1)
    }

    pub fn matches_level2(&self, level2: &str) -> bool {
        self.level2.as_deref().map_or(true, |f| f == level2)
    }

    pub fn matches_level3(&self, level3: &str) -> bool {
        self.level3.as_deref().map_or(true, |f| f == level3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commit_key() {
        let path: CategoryPath = "0/赈灾与民生保障/赈灾".parse().unwrap();
        assert_eq!(path.level1, "0");
        assert_eq!(path.level2, "赈灾与民生保障");
        assert_eq!(path.level3, "赈灾");
        assert_eq!(path.to_string(), "0/赈灾与民生保障/赈灾");
    }

    #[test]
    fn keyword_key_maps_label_to_identifier() {
        let from_file = CategoryPath::from_keyword_key("事务类-赈灾与民生保障-赈灾").unwrap();
        let from_commit: CategoryPath = "0/赈灾与民生保障/赈灾".parse().unwrap();
        assert_eq!(from_file, from_commit);
        assert_eq!(from_commit.keyword_key(), "事务类-赈灾与民生保障-赈灾");
    }

    #[test]
    fn freeform_level1_is_kept() {
        let path = CategoryPath::from_keyword_key("自定义-地方-杂项").unwrap();
        assert_eq!(path.level1, "自定义");
        assert!(Level1::from_id(&path.level1).is_none());
        assert_eq!(path.keyword_key(), "自定义-地方-杂项");
    }

    #[test]
    fn rejects_wrong_part_count() {
        let err = "0/赈灾与民生保障".parse::<CategoryPath>().unwrap_err();
        assert!(matches!(
            err,
            CoreError::MalformedCategoryKey { parts: 2, delimiter: '/', .. }
        ));

        assert!("0/a/b/c".parse::<CategoryPath>().is_err());
        assert!("0//b".parse::<CategoryPath>().is_err());
        assert!(CategoryPath::from_keyword_key("事务类-赈灾").is_err());
    }

    #[test]
    fn parse_any_accepts_both_forms() {
        let a = CategoryPath::parse_any("问题类-腐败-待补充").unwrap();
        let b = CategoryPath::parse_any(" 1/腐败/待补充 ").unwrap();
        assert_eq!(a, b);
        assert!(CategoryPath::parse_any("腐败").is_err());
    }

    #[test]
    fn dash_in_name_has_no_keyword_key() {
        let dashed: CategoryPath = "0/军-务/杂项".parse().unwrap();
        assert!(!dashed.has_keyword_key());
        assert!(CategoryPath::from_keyword_key(&dashed.keyword_key()).is_err());

        let plain: CategoryPath = "0/军务/杂项".parse().unwrap();
        assert!(plain.has_keyword_key());
    }

    #[test]
    fn display_path_uses_identifier() {
        let path: CategoryPath = "1/腐败/待补充".parse().unwrap();
        assert_eq!(path.display_path(), "1集 → 腐败 → 待补充");
    }

    #[test]
    fn filter_parsing() {
        assert_eq!(CategoryFilter::parse(None).unwrap(), CategoryFilter::all());
        assert_eq!(CategoryFilter::parse(Some("")).unwrap(), CategoryFilter::all());

        let f = CategoryFilter::parse(Some("事务类/赈灾与民生保障")).unwrap();
        assert_eq!(f.level1.as_deref(), Some("0"));
        assert_eq!(f.level2.as_deref(), Some("赈灾与民生保障"));
        assert!(f.level3.is_none());

        let leaf = CategoryFilter::parse(Some("0/赈灾与民生保障/赈灾")).unwrap();
        assert!(leaf.matches_level3("赈灾"));
        assert!(!leaf.matches_level3("救灾"));

        assert!(CategoryFilter::parse(Some("0/a/b/c")).is_err());
    }
}
