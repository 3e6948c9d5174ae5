/// The built-in three-level category tree.
///
/// L1 nodes are the fixed [`Level1`] values; L2 and L3 are names, unique within
/// their parent. Each L3 leaf carries a short description.
use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::category::{CategoryPath, Level1};

type Leaves = &'static [(&'static str, &'static str)];

const DEFAULT_TAXONOMY: &[(Level1, &str, Leaves)] = &[
    (
        Level1::Affairs,
        "赈灾与民生保障",
        &[
            ("赈灾", "灾害发生后的赈济措施"),
            ("救灾", "灾害中的救援行动"),
            ("民生工程", "改善民生的公共工程"),
        ],
    ),
    (
        Level1::Affairs,
        "官场与宫廷生活",
        &[
            ("信息交流", "官场公文往来、信息传递"),
            ("皇帝起居", "皇帝的日常活动、宫廷礼仪"),
        ],
    ),
    (
        Level1::Affairs,
        "社会治安与司法",
        &[
            ("案件", "各类司法案件的审理、判决"),
            ("刑事", "刑事案件及刑罚规定"),
            ("走私", "违禁物品走私及打击措施"),
            ("流民", "流民管理、安置政策"),
            ("社会秩序", "维护地方稳定的措施"),
        ],
    ),
    (
        Level1::Affairs,
        "宗教与社会风俗",
        &[
            ("民间风俗", "民间节日、婚丧嫁娶等习俗"),
            ("邪教和秘密宗教", "被朝廷认定为邪教的组织及镇压措施"),
        ],
    ),
    (
        Level1::Affairs,
        "军事与外交事务",
        &[
            ("战争", "主动征战、防御作战等军事行动"),
            ("边防", "边疆防御、驻军布防、边境管理"),
            ("外交往来", "与藩属国、外国的使节往来"),
        ],
    ),
    (
        Level1::Affairs,
        "财政与经济事务",
        &[
            ("财政内容", "财政收支数额、国库管理、赋税征收"),
            ("商业贸易", "商品交易、市场管理、商税政策"),
            ("经济政策", "影响经济的制度"),
        ],
    ),
    (
        Level1::Affairs,
        "科举与教育",
        &[("科举", "科举考试流程、录取规则")],
    ),
    (
        Level1::Issues,
        "不确定",
        &[("待补充", "暂时无法明确归类的问题内容")],
    ),
    (
        Level1::Issues,
        "行政失职",
        &[("待补充", "官员行政失职的具体表现")],
    ),
    (Level1::Issues, "腐败", &[("待补充", "官员贪腐行为")]),
];

/// One top-level node: its display name and the L2 → L3 → description map.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Level1Node {
    pub name: String,
    pub levels: IndexMap<String, IndexMap<String, String>>,
}

/// The category tree, keyed by L1 identifier.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct Taxonomy {
    nodes: IndexMap<String, Level1Node>,
}

impl Taxonomy {
    /// The tree shipped with the application.
    pub fn builtin() -> Self {
        let mut nodes: IndexMap<String, Level1Node> = IndexMap::new();
        for (l1, l2, leaves) in DEFAULT_TAXONOMY {
            let node = nodes.entry(l1.id().to_string()).or_insert_with(|| Level1Node {
                name: l1.display_name().to_string(),
                levels: IndexMap::new(),
            });
            let l3_map = node.levels.entry(l2.to_string()).or_default();
            for (l3, description) in *leaves {
                l3_map.insert(l3.to_string(), description.to_string());
            }
        }
        Self { nodes }
    }

    /// The full tree with every L1 node annotated with its display name.
    pub fn category_tree(&self) -> &IndexMap<String, Level1Node> {
        &self.nodes
    }

    /// Display name for an L1 identifier, falling back to a marker for unknown keys.
    pub fn level1_name(&self, level1: &str) -> String {
        self.nodes
            .get(level1)
            .map(|n| n.name.clone())
            .unwrap_or_else(|| format!("未知 L1 ({level1})"))
    }

    /// True when `path` names a leaf of the tree.
    pub fn contains(&self, path: &CategoryPath) -> bool {
        self.nodes
            .get(&path.level1)
            .and_then(|node| node.levels.get(&path.level2))
            .is_some_and(|l3_map| l3_map.contains_key(&path.level3))
    }
}

impl Default for Taxonomy {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_tree_has_both_top_levels() {
        let taxonomy = Taxonomy::builtin();
        let tree = taxonomy.category_tree();
        assert_eq!(tree.len(), 2);
        assert_eq!(tree["0"].name, "事务类 (Affairs)");
        assert_eq!(tree["1"].name, "问题类 (Issues)");
        assert_eq!(tree["0"].levels.len(), 7);
        assert_eq!(tree["1"].levels.len(), 3);
    }

    #[test]
    fn tree_has_22_leaves_in_order() {
        let taxonomy = Taxonomy::builtin();
        let leaves: Vec<String> = taxonomy
            .category_tree()
            .iter()
            .flat_map(|(l1, node)| {
                node.levels.iter().flat_map(move |(l2, l3_map)| {
                    l3_map.keys().map(move |l3| format!("{l1}/{l2}/{l3}"))
                })
            })
            .collect();
        assert_eq!(leaves.len(), 22);
        assert_eq!(leaves[0], "0/赈灾与民生保障/赈灾");
        assert_eq!(leaves[21], "1/腐败/待补充");
    }

    #[test]
    fn lookup_and_unknown_names() {
        let taxonomy = Taxonomy::builtin();
        let path: CategoryPath = "0/科举与教育/科举".parse().unwrap();
        assert!(taxonomy.contains(&path));
        assert!(!taxonomy.contains(&"0/科举与教育/书院".parse().unwrap()));
        assert_eq!(taxonomy.level1_name("9"), "未知 L1 (9)");
    }

    #[test]
    fn serializes_as_nested_object() {
        let json = serde_json::to_value(Taxonomy::builtin()).unwrap();
        assert_eq!(json["1"]["name"], "问题类 (Issues)");
        assert_eq!(json["1"]["levels"]["腐败"]["待补充"], "官员贪腐行为");
    }
}
