/// Keyword store: curated keyword lists per category, overlaid by custom entries.
///
/// The merged map is what the analyzer reads. It keeps the built-in insertion
/// order; a custom entry under an existing path replaces that path's keyword list
/// in place, and custom entries under new paths are appended in the order they
/// were added.
use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::category::{CategoryPath, Level1};
use crate::error::CoreError;

/// Description given to custom entries that have no built-in counterpart.
pub const CUSTOM_DESCRIPTION: &str = "自定义关键词";

type BuiltinEntry = (
    Level1,
    &'static str,
    &'static str,
    &'static [&'static str],
    &'static str,
);

const BUILTIN_KEYWORDS: &[BuiltinEntry] = &[
    (
        Level1::Affairs,
        "赈灾与民生保障",
        "赈灾",
        &[
            "抚恤", "被灾", "赈济", "借籽种", "修费银", "淹毙", "旱", "雹", "霜", "饥", "贫民",
            "蠲免", "救荒", "急赈", "赈粜", "平粜", "开仓", "发粟", "煮粥", "施粥",
        ],
        "灾害救济相关事务",
    ),
    (
        Level1::Affairs,
        "赈灾与民生保障",
        "救灾",
        &["抢险", "转移", "救援", "救护", "急赈", "堵口", "筑堤", "防汛", "救灾"],
        "灾害中的救援行动",
    ),
    (
        Level1::Affairs,
        "赈灾与民生保障",
        "民生工程",
        &[
            "水利", "河道", "堤坝", "桥梁", "道路", "粮仓", "工程", "开工", "竣工", "漕运", "运河",
            "闸坝", "涵洞", "圩田", "围垦",
        ],
        "改善民生的公共工程建设",
    ),
    (
        Level1::Affairs,
        "官场与宫廷生活",
        "信息交流",
        &[
            "奏报", "题参", "疏报", "谕令", "批复", "公文", "往来", "题本", "奏折", "揭帖", "咨文",
            "移文",
        ],
        "官场公文往来和信息传递",
    ),
    (
        Level1::Affairs,
        "官场与宫廷生活",
        "皇帝起居",
        &[
            "起居", "礼仪", "祭祀", "典礼", "朝贺", "请安", "谒陵", "巡幸", "大阅", "耕耤", "亲蚕",
        ],
        "皇帝日常活动和宫廷礼仪",
    ),
    (
        Level1::Affairs,
        "社会治安与司法",
        "案件",
        &["审理", "判决", "断案", "审明", "结案", "案卷", "审拟", "覆审", "勘验", "检验"],
        "各类司法案件的审理过程",
    ),
    (
        Level1::Affairs,
        "社会治安与司法",
        "刑事",
        &[
            "盗窃", "杀人", "抢劫", "奸淫", "斗殴", "命案", "盗贼", "强盗", "土匪", "凶犯", "罪人",
            "逃犯",
        ],
        "刑事案件及刑罚规定",
    ),
    (
        Level1::Affairs,
        "社会治安与司法",
        "走私",
        &["私盐", "走私", "违禁", "偷运", "漏税", "私茶", "私铸", "私贩", "夹带"],
        "违禁物品走私及打击措施",
    ),
    (
        Level1::Affairs,
        "社会治安与司法",
        "流民",
        &["流民", "流亡", "逃荒", "迁徙", "安置", "招徕", "归籍", "土著", "客民"],
        "流民管理和安置政策",
    ),
    (
        Level1::Affairs,
        "社会治安与司法",
        "社会秩序",
        &["保甲", "治安", "缉捕", "巡防", "保正", "甲长", "团练", "乡勇", "练总", "捕役"],
        "维护地方稳定的社会管理措施",
    ),
    (
        Level1::Affairs,
        "宗教与社会风俗",
        "民间风俗",
        &["节日", "婚嫁", "丧葬", "习俗", "风俗", "节庆", "庙会", "赛会", "社火", "祈雨"],
        "民间传统节日和风俗习惯",
    ),
    (
        Level1::Affairs,
        "宗教与社会风俗",
        "邪教和秘密宗教",
        &["邪教", "白莲教", "天理教", "秘密宗教", "禁教", "镇压", "罗教", "无为教", "闻香教"],
        "被朝廷认定为邪教的组织及镇压措施",
    ),
    (
        Level1::Affairs,
        "军事与外交事务",
        "战争",
        &[
            "进剿", "征讨", "攻城", "捷报", "凯旋", "投降", "战事", "军饷", "营制", "兵制", "练军",
            "防军",
        ],
        "主动征战和防御作战等军事行动",
    ),
    (
        Level1::Affairs,
        "军事与外交事务",
        "边防",
        &["边防", "驻军", "边疆", "边境", "戍边", "卡伦", "台站", "军台", "驿站", "塘汛"],
        "边疆防御和边境管理事务",
    ),
    (
        Level1::Affairs,
        "军事与外交事务",
        "外交往来",
        &["朝贡", "册封", "贡品", "使节", "藩属", "外国", "属国", "进贡", "回赐"],
        "与藩属国和外国的使节往来",
    ),
    (
        Level1::Affairs,
        "财政与经济事务",
        "财政内容",
        &[
            "钱粮", "赋税", "税收", "国库", "收支", "银两", "钱", "地丁", "漕粮", "盐课", "关税",
            "厘金",
        ],
        "财政收支和赋税征收相关事务",
    ),
    (
        Level1::Affairs,
        "财政与经济事务",
        "商业贸易",
        &["贸易", "市场", "商税", "买卖", "交易", "商业", "行商", "坐商", "牙行", "铺户"],
        "商品交易和市场管理事务",
    ),
    (
        Level1::Affairs,
        "财政与经济事务",
        "经济政策",
        &["专卖", "货币", "盐政", "铁政", "钱法", "改革", "币制", "银本位", "铜钱", "制钱"],
        "影响经济的制度和政策",
    ),
    (
        Level1::Affairs,
        "科举与教育",
        "科举",
        &[
            "科举", "进士", "举人", "秀才", "考试", "录取", "考官", "乡试", "会试", "殿试", "童试",
            "生员",
        ],
        "科举考试流程和录取规则",
    ),
    (
        Level1::Issues,
        "不确定",
        "待补充",
        &["不确定", "待考", "待查", "存疑", "未详", "俟查"],
        "暂时无法明确归类的问题内容",
    ),
    (
        Level1::Issues,
        "行政失职",
        "待补充",
        &["不效力", "徇私", "情面", "昏聩", "疏忽", "拖延", "不力", "玩忽", "贻误", "废弛"],
        "官员行政失职的具体表现",
    ),
    (
        Level1::Issues,
        "腐败",
        "待补充",
        &["贪污", "受贿", "侵吞", "克扣", "冒领", "虚报", "贿赂", "勒索", "敲诈", "舞弊"],
        "官员贪腐行为",
    ),
];

/// Keywords and description for one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct KeywordEntry {
    pub keywords: Vec<String>,
    pub description: String,
}

impl KeywordEntry {
    /// Build an entry, dropping blank and repeated keywords while keeping first-seen order.
    pub fn new(keywords: impl IntoIterator<Item = impl Into<String>>, description: impl Into<String>) -> Self {
        Self {
            keywords: dedup_keywords(keywords),
            description: description.into(),
        }
    }

    pub fn contains(&self, keyword: &str) -> bool {
        self.keywords.iter().any(|k| k == keyword)
    }
}

fn dedup_keywords(keywords: impl IntoIterator<Item = impl Into<String>>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for keyword in keywords {
        let keyword: String = keyword.into();
        let keyword = keyword.trim();
        if !keyword.is_empty() && !out.iter().any(|k| k == keyword) {
            out.push(keyword.to_string());
        }
    }
    out
}

/// Custom keyword entries as persisted: keyword-file key → entry.
pub type PersistedKeywords = IndexMap<String, KeywordEntry>;

/// Built-in keyword table plus runtime overrides.
#[derive(Debug, Clone)]
pub struct KeywordStore {
    builtin: IndexMap<CategoryPath, KeywordEntry>,
    custom: IndexMap<CategoryPath, KeywordEntry>,
    merged: IndexMap<CategoryPath, KeywordEntry>,
}

impl KeywordStore {
    /// The shipped keyword table with no overrides.
    pub fn builtin() -> Self {
        let builtin: Vec<(CategoryPath, KeywordEntry)> = BUILTIN_KEYWORDS
            .iter()
            .map(|(l1, l2, l3, keywords, description)| {
                (
                    CategoryPath::new(l1.id(), *l2, *l3),
                    KeywordEntry::new(keywords.iter().copied(), *description),
                )
            })
            .collect();

        Self::from_entries(builtin)
    }

    /// A store whose base table is `entries` instead of the shipped one.
    pub fn from_entries(entries: impl IntoIterator<Item = (CategoryPath, KeywordEntry)>) -> Self {
        let builtin: IndexMap<CategoryPath, KeywordEntry> = entries.into_iter().collect();
        let merged = builtin.clone();
        Self {
            builtin,
            custom: IndexMap::new(),
            merged,
        }
    }

    /// The built-in table overlaid with previously saved custom entries.
    ///
    /// Fails when a persisted key does not split into three parts.
    pub fn with_custom(custom: PersistedKeywords) -> Result<Self, CoreError> {
        let mut store = Self::builtin();
        for (key, entry) in custom {
            let path = CategoryPath::from_keyword_key(&key)?;
            let entry = KeywordEntry::new(entry.keywords, entry.description);
            store.custom.insert(path, entry);
        }
        store.rebuild();
        Ok(store)
    }

    /// The effective table: built-in entries overlaid by custom ones.
    pub fn merged_keywords(&self) -> &IndexMap<CategoryPath, KeywordEntry> {
        &self.merged
    }

    /// Keywords of one category; empty for unknown categories.
    pub fn keywords(&self, path: &CategoryPath) -> &[String] {
        self.merged
            .get(path)
            .map(|e| e.keywords.as_slice())
            .unwrap_or(&[])
    }

    pub fn entry(&self, path: &CategoryPath) -> Option<&KeywordEntry> {
        self.merged.get(path)
    }

    /// Replace the keyword list of a category with a custom one.
    ///
    /// Paths absent from the taxonomy are accepted. A new custom entry inherits
    /// the built-in description when there is one. Paths whose names contain
    /// `-` are rejected, since their keyword-file key would not load back.
    pub fn set_keywords(&mut self, path: CategoryPath, keywords: Vec<String>) -> Result<(), CoreError> {
        if !path.has_keyword_key() {
            return Err(CoreError::UnrepresentableKeywordKey {
                category: path.to_string(),
            });
        }

        let keywords = dedup_keywords(keywords);
        match self.custom.get_mut(&path) {
            Some(entry) => entry.keywords = keywords,
            None => {
                let description = self
                    .builtin
                    .get(&path)
                    .map(|e| e.description.clone())
                    .unwrap_or_else(|| CUSTOM_DESCRIPTION.to_string());
                self.custom.insert(
                    path,
                    KeywordEntry {
                        keywords,
                        description,
                    },
                );
            }
        }
        self.rebuild();
        Ok(())
    }

    /// Custom entries keyed by their keyword-file key, ready to persist.
    pub fn custom_keywords(&self) -> PersistedKeywords {
        self.custom
            .iter()
            .map(|(path, entry)| (path.keyword_key(), entry.clone()))
            .collect()
    }

    pub fn is_custom(&self, path: &CategoryPath) -> bool {
        self.custom.contains_key(path)
    }

    fn rebuild(&mut self) {
        let mut merged = self.builtin.clone();
        for (path, entry) in &self.custom {
            // insert keeps the position of an existing key
            merged.insert(path.clone(), entry.clone());
        }
        debug!(
            builtin = self.builtin.len(),
            custom = self.custom.len(),
            merged = merged.len(),
            "keyword map rebuilt"
        );
        self.merged = merged;
    }
}

impl Default for KeywordStore {
    fn default() -> Self {
        Self::builtin()
    }
}
