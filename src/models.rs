/// One row of the tall input: a reported label, its raw amount text and the
/// period context it was filtered on, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct RawLineItem {
    pub label: String,
    pub raw_value: String,
    pub context: Option<String>,
}

impl RawLineItem {
    pub fn new(label: impl Into<String>, raw_value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            raw_value: raw_value.into(),
            context: None,
        }
    }
}

/// A raw item that matched a pattern rule. `amount` is the normalized numeric
/// token (commas kept, `-` sign), never unit-rescaled.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedEntry {
    pub account: String,
    /// Advisory level derived from the account name. Render columns come
    /// from the template walk, not from here.
    pub level: u8,
    pub amount: String,
    pub annotation: String,
}

/// Sum of every classified entry for one account, already formatted for the
/// report.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsolidatedEntry {
    pub account: String,
    pub amount: String,
}

/// Position of a rendered row in the chart-of-accounts hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowLevel {
    /// Section headers and section-level totals.
    Section,
    /// Category headers and direct leaves of a category.
    Category,
    /// Sub-category headers and their leaves.
    SubCategory,
}

impl RowLevel {
    pub fn label_column(self) -> usize {
        match self {
            Self::Section => 0,
            Self::Category => 1,
            Self::SubCategory => 2,
        }
    }
}

pub type OutputRow = Vec<String>;

/// In-memory delimited table as loaded from disk.
#[derive(Debug, Clone, Default)]
pub struct TallTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TallTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Cell by column index; short rows read as empty.
    pub fn cell(row: &[String], idx: usize) -> &str {
        row.get(idx).map(String::as_str).unwrap_or("")
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.headers.len())
    }
}
