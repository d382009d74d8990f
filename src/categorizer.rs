use serde::Deserialize;
use serde_json::Value;

use crate::amount::AmountParser;
use crate::error::BsmapError;
use crate::models::ClassifiedEntry;

/// Maps raw labels onto one canonical account. Matching is a case-sensitive
/// substring test against each pattern.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternRule {
    pub account: String,
    pub patterns: Vec<String>,
    pub priority: i64,
}

impl PatternRule {
    pub fn matches(&self, label: &str) -> bool {
        self.patterns.iter().any(|p| label.contains(p.as_str()))
    }
}

/// Ordered rule list. Higher priority is tried first; equal priorities keep
/// declaration order, so the first matching rule wins.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(try_from = "Value")]
pub struct PatternTable {
    rules: Vec<PatternRule>,
}

impl PatternTable {
    pub fn new(mut rules: Vec<PatternRule>) -> Self {
        // stable: ties stay in insertion order
        rules.sort_by(|a, b| b.priority.cmp(&a.priority));
        Self { rules }
    }

    pub fn rules(&self) -> &[PatternRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Canonical account for `label`, if any rule matches.
    pub fn find(&self, label: &str) -> Option<&str> {
        self.rules
            .iter()
            .find(|r| r.matches(label))
            .map(|r| r.account.as_str())
    }
}

fn patterns_from(value: Value, account: &str) -> Result<Vec<String>, BsmapError> {
    let patterns = match value {
        Value::String(s) => vec![s],
        Value::Array(items) => items
            .into_iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        other => {
            return Err(BsmapError::Config(format!(
                "account_mapping: patterns for '{account}' must be a string or list, got {other}"
            )))
        }
    };
    // "" is a substring of every label
    Ok(patterns.into_iter().filter(|p| !p.is_empty()).collect())
}

impl TryFrom<Value> for PatternTable {
    type Error = BsmapError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let mut rules = Vec::new();
        match value {
            Value::Object(map) => {
                for (account, patterns) in map {
                    let patterns = patterns_from(patterns, &account)?;
                    rules.push(PatternRule {
                        account,
                        patterns,
                        priority: 0,
                    });
                }
            }
            Value::Array(entries) => {
                for entry in entries {
                    let Value::Object(mut obj) = entry else {
                        return Err(BsmapError::Config(
                            "account_mapping entries must be objects".to_string(),
                        ));
                    };
                    let account = match obj.remove("account") {
                        Some(Value::String(s)) => s,
                        _ => {
                            return Err(BsmapError::Config(
                                "account_mapping entry is missing 'account'".to_string(),
                            ))
                        }
                    };
                    let patterns = match obj.remove("patterns") {
                        Some(v) => patterns_from(v, &account)?,
                        None => vec![account.clone()],
                    };
                    let priority = match obj.remove("priority") {
                        None | Some(Value::Null) => 0,
                        Some(v) => v.as_i64().ok_or_else(|| {
                            BsmapError::Config(format!(
                                "account_mapping: priority for '{account}' must be an integer"
                            ))
                        })?,
                    };
                    rules.push(PatternRule {
                        account,
                        patterns,
                        priority,
                    });
                }
            }
            Value::Null => {}
            other => {
                return Err(BsmapError::Config(format!(
                    "account_mapping must be an object or a list, got {other}"
                )))
            }
        }
        Ok(Self::new(rules))
    }
}

/// Name-based level hints for canonical accounts.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountLevels {
    pub major_categories: Vec<String>,
    pub total_marker: String,
}

impl AccountLevels {
    /// 0 for sections and major categories, 1 for totals, 2 for everything else.
    pub fn level_of(&self, account: &str) -> u8 {
        if self.major_categories.iter().any(|m| m == account) {
            0
        } else if !self.total_marker.is_empty() && account.contains(self.total_marker.as_str()) {
            1
        } else {
            2
        }
    }
}

/// Classify one raw line item. `None` for blank labels and labels no rule
/// matches.
pub fn classify(
    label: &str,
    raw_value: &str,
    table: &PatternTable,
    parser: &AmountParser,
    levels: &AccountLevels,
) -> Option<ClassifiedEntry> {
    let label = label.trim();
    if label.is_empty() {
        return None;
    }
    let account = table.find(label)?;
    Some(ClassifiedEntry {
        account: account.to_string(),
        level: levels.level_of(account),
        amount: parser.normalize(raw_value),
        annotation: parser.annotations(raw_value),
    })
}
