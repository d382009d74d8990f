use serde::Deserialize;
use serde_json::Value;

use crate::error::BsmapError;

/// Ordered chart-of-accounts tree that drives the report layout.
///
/// In JSON each section is an object of categories. A category value is a
/// list of leaf names, an object of sub-categories, or `null` for a total
/// slot. Object key order is traversal order.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "Value")]
pub struct ChartTemplate {
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub name: String,
    pub categories: Vec<Category>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub name: String,
    pub body: CategoryBody,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CategoryBody {
    Items(Vec<String>),
    Groups(Vec<Group>),
    Total,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub name: String,
    pub body: GroupBody,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GroupBody {
    Items(Vec<String>),
    Subtotal,
}

impl ChartTemplate {
    /// Number of rows the layout emits for this template, separators included.
    pub fn row_count(&self) -> usize {
        let body: usize = self
            .sections
            .iter()
            .map(|s| {
                1 + s
                    .categories
                    .iter()
                    .map(|c| match &c.body {
                        CategoryBody::Items(items) => 1 + items.len(),
                        CategoryBody::Groups(groups) => {
                            1 + groups
                                .iter()
                                .map(|g| match &g.body {
                                    GroupBody::Items(items) => 1 + items.len(),
                                    GroupBody::Subtotal => 1,
                                })
                                .sum::<usize>()
                        }
                        CategoryBody::Total => 1,
                    })
                    .sum::<usize>()
            })
            .sum();
        body + self.sections.len().saturating_sub(1)
    }

    /// Every account name that can carry an amount (leaves and total slots),
    /// in layout order. Names repeated across categories appear once each time.
    pub fn slot_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        for section in &self.sections {
            for category in &section.categories {
                match &category.body {
                    CategoryBody::Items(items) => names.extend(items.iter().map(String::as_str)),
                    CategoryBody::Groups(groups) => {
                        for group in groups {
                            match &group.body {
                                GroupBody::Items(items) => {
                                    names.extend(items.iter().map(String::as_str))
                                }
                                GroupBody::Subtotal => names.push(group.name.as_str()),
                            }
                        }
                    }
                    CategoryBody::Total => names.push(category.name.as_str()),
                }
            }
        }
        names
    }
}

fn string_list(value: &[Value], context: &str) -> Result<Vec<String>, BsmapError> {
    value
        .iter()
        .map(|v| {
            v.as_str().map(str::to_string).ok_or_else(|| {
                BsmapError::Config(format!("structure: '{context}' must list strings, got {v}"))
            })
        })
        .collect()
}

impl TryFrom<Value> for ChartTemplate {
    type Error = BsmapError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let Value::Object(sections) = value else {
            return Err(BsmapError::Config(
                "structure must be an object of sections".to_string(),
            ));
        };
        let mut out = Vec::with_capacity(sections.len());
        for (section_name, categories) in sections {
            let Value::Object(categories) = categories else {
                return Err(BsmapError::Config(format!(
                    "structure: section '{section_name}' must be an object"
                )));
            };
            let mut cats = Vec::with_capacity(categories.len());
            for (cat_name, body) in categories {
                let body = match body {
                    Value::Null => CategoryBody::Total,
                    Value::Array(items) => CategoryBody::Items(string_list(&items, &cat_name)?),
                    Value::Object(groups) => {
                        let mut gs = Vec::with_capacity(groups.len());
                        for (group_name, items) in groups {
                            let body = match items {
                                Value::Null => GroupBody::Subtotal,
                                Value::Array(items) => {
                                    GroupBody::Items(string_list(&items, &group_name)?)
                                }
                                other => {
                                    return Err(BsmapError::Config(format!(
                                        "structure: '{group_name}' must be a list or null, got {other}"
                                    )))
                                }
                            };
                            gs.push(Group {
                                name: group_name,
                                body,
                            });
                        }
                        CategoryBody::Groups(gs)
                    }
                    other => {
                        return Err(BsmapError::Config(format!(
                            "structure: '{cat_name}' must be a list, object or null, got {other}"
                        )))
                    }
                };
                cats.push(Category {
                    name: cat_name,
                    body,
                });
            }
            out.push(Section {
                name: section_name,
                categories: cats,
            });
        }
        Ok(Self { sections: out })
    }
}

fn items(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

fn leaves(name: &str, names: &[&str]) -> Category {
    Category {
        name: name.to_string(),
        body: CategoryBody::Items(items(names)),
    }
}

fn total(name: &str) -> Category {
    Category {
        name: name.to_string(),
        body: CategoryBody::Total,
    }
}

impl Default for ChartTemplate {
    /// Consolidated balance sheet layout used by Japanese annual reports.
    fn default() -> Self {
        let assets = Section {
            name: "資産の部".to_string(),
            categories: vec![
                leaves(
                    "流動資産",
                    &[
                        "現金及び預金",
                        "コールローン",
                        "受取手形及び売掛金",
                        "有価証券",
                        "棚卸資産",
                        "営業貸付金",
                        "銀行業における貸出金",
                        "その他",
                        "貸倒引当金",
                        "流動資産合計",
                    ],
                ),
                Category {
                    name: "固定資産".to_string(),
                    body: CategoryBody::Groups(vec![
                        Group {
                            name: "有形固定資産".to_string(),
                            body: GroupBody::Items(items(&[
                                "建物及び構築物（純額）",
                                "工具、器具及び備品（純額）",
                                "土地",
                                "リース資産（純額）",
                                "建設仮勘定",
                                "その他（純額）",
                                "有形固定資産合計",
                            ])),
                        },
                        Group {
                            name: "無形固定資産".to_string(),
                            body: GroupBody::Items(items(&[
                                "のれん",
                                "ソフトウエア",
                                "リース資産",
                                "その他",
                                "無形固定資産合計",
                            ])),
                        },
                        Group {
                            name: "投資その他の資産".to_string(),
                            body: GroupBody::Items(items(&[
                                "投資有価証券",
                                "退職給付に係る資産",
                                "繰延税金資産",
                                "差入保証金",
                                "店舗賃借仮勘定",
                                "その他",
                                "貸倒引当金",
                                "投資その他の資産合計",
                            ])),
                        },
                    ]),
                },
                total("固定資産合計"),
                total("資産合計"),
            ],
        };
        let liabilities = Section {
            name: "負債の部".to_string(),
            categories: vec![
                leaves(
                    "流動負債",
                    &[
                        "支払手形及び買掛金",
                        "銀行業における預金",
                        "短期借入金",
                        "1年内返済予定の長期借入金",
                        "1年内償還予定の社債",
                        "コマーシャル・ペーパー",
                        "リース債務",
                        "未払法人税等",
                        "契約負債",
                        "賞与引当金",
                        "店舗閉鎖損失引当金",
                        "ポイント引当金",
                        "設備関係支払手形",
                        "その他",
                        "流動負債合計",
                    ],
                ),
                leaves(
                    "固定負債",
                    &[
                        "社債",
                        "長期借入金",
                        "リース債務",
                        "繰延税金負債",
                        "役員退職慰労引当金",
                        "店舗閉鎖損失引当金",
                        "偶発損失引当金",
                        "利息返還損失引当金",
                        "退職給付に係る負債",
                        "資産除去債務",
                        "長期預り保証金",
                        "保険契約準備金",
                        "その他",
                        "固定負債合計",
                    ],
                ),
                total("負債合計"),
            ],
        };
        Self {
            sections: vec![assets, liabilities],
        }
    }
}
