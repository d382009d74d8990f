use std::collections::BTreeSet;

use regex::{Regex, RegexBuilder};
use serde::Deserialize;
use serde_json::Value;

use crate::error::{BsmapError, Result};
use crate::models::TallTable;

/// Source-name -> general-name table, flattened across the config groups.
/// A source name repeated in a later group overrides the earlier mapping but
/// keeps its original position.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(try_from = "Value")]
pub struct RemapTable {
    entries: Vec<(String, String)>,
}

impl RemapTable {
    pub fn insert(&mut self, source: impl Into<String>, general: impl Into<String>) {
        let source = source.into();
        let general = general.into();
        match self.entries.iter_mut().find(|(s, _)| *s == source) {
            Some(entry) => entry.1 = general,
            None => self.entries.push((source, general)),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn lookup(&self, source: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(s, _)| s == source)
            .map(|(_, g)| g.as_str())
    }

    /// Exact match first, then the first source name contained in `value`.
    pub fn apply(&self, value: &str) -> Option<&str> {
        if let Some(general) = self.lookup(value) {
            return Some(general);
        }
        let (source, general) = self.entries.iter().find(|(s, _)| value.contains(s.as_str()))?;
        tracing::debug!(value, source = source.as_str(), general = general.as_str(), "partial match");
        Some(general.as_str())
    }
}

impl TryFrom<Value> for RemapTable {
    type Error = BsmapError;

    fn try_from(value: Value) -> std::result::Result<Self, Self::Error> {
        let mut table = RemapTable::default();
        let groups = match value {
            Value::Null => return Ok(table),
            Value::Object(groups) => groups,
            other => {
                return Err(BsmapError::Config(format!(
                    "account_mapping must be an object of groups, got {other}"
                )))
            }
        };
        for (group, mappings) in groups {
            let Value::Object(mappings) = mappings else {
                return Err(BsmapError::Config(format!(
                    "account_mapping group '{group}' must be an object"
                )));
            };
            for (source, general) in mappings {
                let Value::String(general) = general else {
                    return Err(BsmapError::Config(format!(
                        "account_mapping '{group}.{source}' must map to a string"
                    )));
                };
                table.insert(source, general);
            }
        }
        Ok(table)
    }
}

/// Decides which columns the remapper rewrites. Patterns are
/// case-insensitive regexes; exclusions win.
#[derive(Debug, Clone)]
pub struct ColumnSelector {
    targets: Vec<Regex>,
    excludes: Vec<Regex>,
}

fn compile(patterns: &[String]) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|p| {
            RegexBuilder::new(p)
                .case_insensitive(true)
                .build()
                .map_err(BsmapError::from)
        })
        .collect()
}

impl ColumnSelector {
    pub fn new(targets: &[String], excludes: &[String]) -> Result<Self> {
        Ok(Self {
            targets: compile(targets)?,
            excludes: compile(excludes)?,
        })
    }

    pub fn is_target(&self, column: &str) -> bool {
        if self.excludes.iter().any(|re| re.is_match(column)) {
            return false;
        }
        self.targets.is_empty() || self.targets.iter().any(|re| re.is_match(column))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MappedItem {
    /// 1-based data row.
    pub row: usize,
    pub column: String,
    pub original: String,
    pub transformed: String,
}

#[derive(Debug, Clone, Default)]
pub struct RemapStats {
    pub target_columns: Vec<String>,
    pub mapped: Vec<MappedItem>,
    pub unmapped: BTreeSet<String>,
}

impl RemapStats {
    pub fn total_transformations(&self) -> usize {
        self.mapped.len()
    }
}

/// Rewrite every non-empty cell of the selected columns through `mapping`.
/// Cells are trimmed; cells no rule matches keep their trimmed value.
///
/// Any cell whose text changed, trimming included, counts as a
/// transformation. A non-empty cell left exactly as it was is reported as
/// unmapped, even when a rule maps it onto itself.
pub fn remap_table(
    table: &TallTable,
    mapping: &RemapTable,
    selector: &ColumnSelector,
) -> (TallTable, RemapStats) {
    let mut out = table.clone();
    let mut stats = RemapStats::default();

    let targets: Vec<usize> = table
        .headers
        .iter()
        .enumerate()
        .filter(|(_, h)| selector.is_target(h))
        .map(|(i, _)| i)
        .collect();
    stats.target_columns = targets.iter().map(|&i| table.headers[i].clone()).collect();
    tracing::info!(columns = ?stats.target_columns, "remapping columns");

    for &col in &targets {
        let column = &table.headers[col];
        for (i, row) in out.rows.iter_mut().enumerate() {
            let Some(cell) = row.get_mut(col) else { continue };
            if cell.is_empty() {
                continue;
            }
            let value = cell.trim();
            let transformed = mapping.apply(value).unwrap_or(value).to_string();
            if transformed == *cell {
                stats.unmapped.insert(transformed);
                continue;
            }
            stats.mapped.push(MappedItem {
                row: i + 1,
                column: column.clone(),
                original: cell.clone(),
                transformed: transformed.clone(),
            });
            *cell = transformed;
        }
    }
    (out, stats)
}
