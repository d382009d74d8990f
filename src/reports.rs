use std::collections::BTreeMap;

use crate::amount::AmountParser;
use crate::categorizer::{classify, AccountLevels};
use crate::error::Result;
use crate::fmt::{format_total, Decimal};
use crate::importer;
use crate::models::{ClassifiedEntry, ConsolidatedEntry, OutputRow, RawLineItem, RowLevel, TallTable};
use crate::settings::BalanceSheetSettings;
use crate::template::{CategoryBody, ChartTemplate, GroupBody};

// ---------------------------------------------------------------------------
// Consolidation
// ---------------------------------------------------------------------------

/// Classified entries keyed by canonical account.
pub type EntryGroups = BTreeMap<String, Vec<ClassifiedEntry>>;

/// Sum one account's entries. Unparseable amounts are skipped; `None` when
/// nothing parsed at all. Whole parts are summed exactly, so long digit runs
/// never lose precision.
pub fn consolidate_group(
    account: &str,
    entries: &[ClassifiedEntry],
    negative_marker: &str,
) -> Option<ConsolidatedEntry> {
    let mut total: Option<Decimal> = None;
    for entry in entries {
        let Some(amount) = Decimal::parse(&entry.amount) else { continue };
        let sum = match total {
            Some(t) => t.checked_add(amount),
            None => Some(amount),
        };
        match sum {
            Some(sum) => total = Some(sum),
            None => tracing::warn!(
                account,
                amount = entry.amount.as_str(),
                "total overflows, entry skipped"
            ),
        }
    }
    total.map(|total| ConsolidatedEntry {
        account: account.to_string(),
        amount: format_total(total, negative_marker),
    })
}

pub fn consolidate(groups: &EntryGroups, negative_marker: &str) -> BTreeMap<String, ConsolidatedEntry> {
    groups
        .iter()
        .filter_map(|(account, entries)| {
            let entry = consolidate_group(account, entries, negative_marker)?;
            tracing::debug!(
                account = entry.account.as_str(),
                amount = entry.amount.as_str(),
                items = entries.len(),
                "consolidated"
            );
            Some((account.clone(), entry))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

/// Fixed table geometry of the rendered report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub columns: usize,
    pub amount_column: usize,
}

/// Pad with empty cells or truncate so the row has exactly `columns` cells.
pub fn standardize(mut row: OutputRow, columns: usize) -> OutputRow {
    row.resize(columns, String::new());
    row
}

fn label_row(label: &str, level: RowLevel) -> OutputRow {
    let mut row = vec![String::new(); level.label_column() + 1];
    row[level.label_column()] = label.to_string();
    row
}

fn slot_row(
    name: &str,
    level: RowLevel,
    layout: Layout,
    consolidated: &BTreeMap<String, ConsolidatedEntry>,
) -> OutputRow {
    let mut row = label_row(name, level);
    if let Some(entry) = consolidated.get(name).filter(|e| !e.amount.is_empty()) {
        if row.len() <= layout.amount_column {
            row.resize(layout.amount_column + 1, String::new());
        }
        row[layout.amount_column] = format!("\"{}\"", entry.amount);
    }
    row
}

/// Walk the template in declaration order and emit one row per node, with a
/// blank row between sections. Every returned row has `layout.columns` cells.
pub fn build_rows(
    template: &ChartTemplate,
    consolidated: &BTreeMap<String, ConsolidatedEntry>,
    layout: Layout,
) -> Vec<OutputRow> {
    let mut rows = Vec::with_capacity(template.row_count());
    for (i, section) in template.sections.iter().enumerate() {
        if i > 0 {
            rows.push(Vec::new());
        }
        rows.push(label_row(&section.name, RowLevel::Section));

        for category in &section.categories {
            match &category.body {
                CategoryBody::Groups(groups) => {
                    rows.push(label_row(&category.name, RowLevel::Category));
                    for group in groups {
                        match &group.body {
                            GroupBody::Items(items) => {
                                rows.push(label_row(&group.name, RowLevel::SubCategory));
                                for item in items {
                                    rows.push(slot_row(item, RowLevel::SubCategory, layout, consolidated));
                                }
                            }
                            GroupBody::Subtotal => {
                                rows.push(slot_row(&group.name, RowLevel::Category, layout, consolidated));
                            }
                        }
                    }
                }
                CategoryBody::Items(items) => {
                    rows.push(label_row(&category.name, RowLevel::Category));
                    for item in items {
                        rows.push(slot_row(item, RowLevel::Category, layout, consolidated));
                    }
                }
                CategoryBody::Total => {
                    rows.push(slot_row(&category.name, RowLevel::Section, layout, consolidated));
                }
            }
        }
    }
    rows.into_iter().map(|r| standardize(r, layout.columns)).collect()
}

// ---------------------------------------------------------------------------
// Balance sheet
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct BalanceSheetReport {
    pub rows: Vec<OutputRow>,
    /// Items that matched a pattern rule.
    pub mapped: usize,
    /// Distinct canonical accounts among the mapped items.
    pub accounts: usize,
    /// Labels no rule matched, in input order.
    pub unmapped: Vec<String>,
}

impl BalanceSheetReport {
    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.rows.first().map_or(0, Vec::len))
    }
}

/// Turns raw line items into the balance-sheet table. Holds only immutable
/// configuration, so one builder can render any number of reports.
pub struct BalanceSheetBuilder<'a> {
    settings: &'a BalanceSheetSettings,
    parser: AmountParser,
    levels: AccountLevels,
}

impl<'a> BalanceSheetBuilder<'a> {
    pub fn new(settings: &'a BalanceSheetSettings) -> Result<Self> {
        let slots = settings.structure.slot_names();
        for rule in settings.account_mapping.rules() {
            if !slots.contains(&rule.account.as_str()) {
                tracing::warn!(account = rule.account.as_str(), "account has no slot in the layout");
            }
        }
        Ok(Self {
            parser: AmountParser::new(&settings.negative_marker, &settings.annotation_marker)?,
            levels: settings.levels(),
            settings,
        })
    }

    pub fn layout(&self) -> Layout {
        Layout {
            columns: self.settings.column_count,
            amount_column: self.settings.amount_column,
        }
    }

    pub fn classify(&self, item: &RawLineItem) -> Option<ClassifiedEntry> {
        classify(
            &item.label,
            &item.raw_value,
            &self.settings.account_mapping,
            &self.parser,
            &self.levels,
        )
    }

    pub fn transform(&self, items: &[RawLineItem]) -> BalanceSheetReport {
        let mut groups = EntryGroups::new();
        let mut mapped = 0usize;
        let mut unmapped = Vec::new();
        for item in items {
            match self.classify(item) {
                Some(entry) => {
                    groups.entry(entry.account.clone()).or_default().push(entry);
                    mapped += 1;
                }
                None => {
                    let label = item.label.trim();
                    if !label.is_empty() {
                        tracing::debug!(label, "no pattern matched");
                        unmapped.push(label.to_string());
                    }
                }
            }
        }
        tracing::info!(mapped, accounts = groups.len(), "classified line items");

        let consolidated = consolidate(&groups, &self.settings.negative_marker);
        let rows = build_rows(&self.settings.structure, &consolidated, self.layout());
        tracing::info!(rows = rows.len(), "balance sheet built");

        BalanceSheetReport {
            rows,
            mapped,
            accounts: groups.len(),
            unmapped,
        }
    }

    /// Period-filter the loaded table, pick its label and value columns and
    /// transform. A table without usable columns yields a report with no rows.
    pub fn transform_table(&self, table: &TallTable) -> BalanceSheetReport {
        match importer::extract_items(table, &self.settings.negative_marker) {
            Some(items) => self.transform(&items),
            None => {
                tracing::warn!("label or value column not found, producing an empty report");
                BalanceSheetReport::default()
            }
        }
    }
}
