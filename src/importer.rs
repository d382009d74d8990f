use std::path::Path;

use encoding_rs::{Encoding, UTF_8};

use crate::amount::looks_numeric;
use crate::error::{BsmapError, Result};
use crate::models::{RawLineItem, TallTable};
use crate::settings::InputSettings;

const LABEL_CANDIDATES: &[&str] = &["項目名", "科目名", "勘定科目", "Element", "ElementName"];
const LABEL_FRAGMENTS: &[&str] = &["項目", "科目", "勘定", "Element"];
const VALUE_CANDIDATES: &[&str] = &["値", "金額", "Value", "Amount", "残高"];
const VALUE_FRAGMENTS: &[&str] = &["値", "金額", "Value", "Amount"];

const CONTEXT_ID_COLUMN: &str = "コンテキストID";
const RELATIVE_YEAR_COLUMN: &str = "相対年度";
const CURRENT_PERIODS: &[&str] = &["当期", "当期末"];

/// Values sampled per column when sniffing for the amount column.
const SNIFF_SAMPLE: usize = 10;

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Read a delimited file in `encoding`. A byte-order mark overrides the
/// configured encoding. Lines above `header_row` are skipped, the header line
/// names the columns, and every later line becomes a row.
pub fn load_table(
    file_path: &Path,
    input: &InputSettings,
    delimiter: u8,
    encoding: &'static Encoding,
) -> Result<TallTable> {
    if !file_path.exists() {
        return Err(BsmapError::InputNotFound(file_path.display().to_string()));
    }
    let bytes = std::fs::read(file_path)?;
    let encoding = Encoding::for_bom(&bytes).map_or(encoding, |(bom, _)| bom);
    tracing::debug!(encoding = encoding.name(), "decoding input");

    let table = if encoding == UTF_8 {
        read_table(bytes.as_slice(), input.header_row, delimiter)?
    } else {
        let (text, _, had_errors) = encoding.decode(&bytes);
        if had_errors {
            return Err(BsmapError::Encoding(format!(
                "{} is not valid {}",
                file_path.display(),
                encoding.name()
            )));
        }
        read_table(text.as_bytes(), input.header_row, delimiter)?
    };
    tracing::info!(
        path = %file_path.display(),
        rows = table.rows.len(),
        columns = table.headers.len(),
        "loaded input"
    );
    tracing::debug!(headers = ?table.headers, "input columns");
    Ok(table)
}

fn decode_record(record: &csv::ByteRecord, number: usize) -> Result<Vec<String>> {
    let line = record.position().map_or(number as u64, |p| p.line());
    record
        .iter()
        .map(|field| {
            std::str::from_utf8(field)
                .map(str::to_string)
                .map_err(|_| BsmapError::Encoding(format!("line {line} is not valid UTF-8")))
        })
        .collect()
}

/// Parse UTF-8 delimited text. Every record counts toward `header_row`, and
/// records above it are skipped without being decoded.
pub fn read_table<R: std::io::Read>(reader: R, header_row: usize, delimiter: u8) -> Result<TallTable> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(reader);
    let mut table = TallTable::default();

    for (i, result) in rdr.byte_records().enumerate() {
        let record = result?;
        let number = i + 1;
        if number < header_row {
            continue;
        }
        let cells = decode_record(&record, number)?;
        if number == header_row {
            table.headers = cells
                .into_iter()
                .enumerate()
                .map(|(col, h)| {
                    let h = if col == 0 { h.trim_start_matches('\u{feff}').to_string() } else { h };
                    h.trim().to_string()
                })
                .collect();
            continue;
        }
        table.rows.push(cells);
    }
    Ok(table)
}

// ---------------------------------------------------------------------------
// Current period
// ---------------------------------------------------------------------------

fn contains_current(value: &str) -> bool {
    value.to_lowercase().contains("current")
}

fn filtered(table: &TallTable, keep: impl Fn(&[String]) -> bool) -> TallTable {
    TallTable {
        headers: table.headers.clone(),
        rows: table.rows.iter().filter(|r| keep(r)).cloned().collect(),
    }
}

/// Keep only current-period rows. Returns the filtered table and the column
/// the decision was based on, if any.
pub fn current_period(table: &TallTable) -> (TallTable, Option<usize>) {
    if let Some(idx) = table.column_index(CONTEXT_ID_COLUMN) {
        let out = filtered(table, |r| contains_current(TallTable::cell(r, idx)));
        tracing::info!(rows = out.rows.len(), "filtered on context id");
        return (out, Some(idx));
    }

    if let Some(idx) = table.column_index(RELATIVE_YEAR_COLUMN) {
        let out = filtered(table, |r| CURRENT_PERIODS.contains(&TallTable::cell(r, idx)));
        tracing::info!(rows = out.rows.len(), "filtered on relative year");
        return (out, Some(idx));
    }

    let instant: Vec<usize> = table
        .headers
        .iter()
        .enumerate()
        .filter(|(_, h)| h.contains("Instant") || h.contains("Quarter"))
        .map(|(i, _)| i)
        .collect();
    let Some(first_row) = table.rows.first() else {
        return (table.clone(), None);
    };
    let qualifying: Vec<usize> = instant
        .into_iter()
        .filter(|&i| TallTable::cell(first_row, i).contains("Current"))
        .collect();
    if let Some(&idx) = qualifying.first() {
        let out = filtered(table, |r| {
            qualifying.iter().any(|&i| contains_current(TallTable::cell(r, i)))
        });
        if !out.rows.is_empty() {
            tracing::info!(rows = out.rows.len(), "filtered on instant columns");
            return (out, Some(idx));
        }
    }
    (table.clone(), None)
}

// ---------------------------------------------------------------------------
// Column detection
// ---------------------------------------------------------------------------

fn by_name(table: &TallTable, candidates: &[&str], fragments: &[&str]) -> Option<usize> {
    candidates
        .iter()
        .find_map(|c| table.column_index(c))
        .or_else(|| {
            table
                .headers
                .iter()
                .position(|h| fragments.iter().any(|f| h.contains(f)))
        })
}

fn non_empty(table: &TallTable, idx: usize) -> impl Iterator<Item = &str> {
    table
        .rows
        .iter()
        .map(move |r| TallTable::cell(r, idx).trim())
        .filter(|v| !v.is_empty())
}

/// Label column: a known header name, then a header containing a known
/// fragment, then the first column holding any non-numeric text.
pub fn detect_label_column(table: &TallTable, negative_marker: &str) -> Option<usize> {
    by_name(table, LABEL_CANDIDATES, LABEL_FRAGMENTS).or_else(|| {
        (0..table.headers.len())
            .find(|&i| non_empty(table, i).any(|v| !looks_numeric(v, negative_marker)))
    })
}

/// Value column: a known header name, then a header containing a known
/// fragment, then the first column where most sampled values are numbers.
pub fn detect_value_column(table: &TallTable, negative_marker: &str) -> Option<usize> {
    by_name(table, VALUE_CANDIDATES, VALUE_FRAGMENTS).or_else(|| {
        (0..table.headers.len()).find(|&i| {
            let sample: Vec<&str> = non_empty(table, i).take(SNIFF_SAMPLE).collect();
            let numeric = sample.iter().filter(|v| looks_numeric(v, negative_marker)).count();
            numeric * 2 > sample.len()
        })
    })
}

/// Current-period line items of `table`, or `None` when no label or value
/// column can be found.
pub fn extract_items(table: &TallTable, negative_marker: &str) -> Option<Vec<RawLineItem>> {
    let (table, context) = current_period(table);
    let label = detect_label_column(&table, negative_marker);
    let value = detect_value_column(&table, negative_marker);
    tracing::info!(
        label = label.map(|i| table.headers[i].as_str()),
        value = value.map(|i| table.headers[i].as_str()),
        "detected columns"
    );
    let (label, value) = (label?, value?);
    Some(
        table
            .rows
            .iter()
            .map(|r| RawLineItem {
                context: context.map(|c| TallTable::cell(r, c).to_string()),
                ..RawLineItem::new(TallTable::cell(r, label), TallTable::cell(r, value))
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(headers: &[&str], rows: &[&[&str]]) -> TallTable {
        TallTable {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        }
    }

    #[test]
    fn test_read_table_with_header_row() {
        let content = "\u{feff}title line\n項目名\t値\n現金及び預金\t1,000\n土地\t\"2,000\"\n";
        let t = read_table(content.as_bytes(), 2, b'\t').unwrap();
        assert_eq!(t.headers, vec!["項目名", "値"]);
        assert_eq!(t.rows.len(), 2);
        assert_eq!(t.rows[1], vec!["土地", "2,000"]);
    }

    #[test]
    fn test_read_table_strips_bom_and_allows_ragged_rows() {
        let content = "\u{feff}Label,Value\nCash,1\nLand\n";
        let t = read_table(content.as_bytes(), 1, b',').unwrap();
        assert_eq!(t.headers, vec!["Label", "Value"]);
        assert_eq!(t.rows[1], vec!["Land"]);
        assert_eq!(TallTable::cell(&t.rows[1], 1), "");
    }

    #[test]
    fn test_load_table_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_table(&dir.path().join("none.tsv"), &InputSettings::default(), b'\t', UTF_8)
            .unwrap_err();
        assert!(matches!(err, BsmapError::InputNotFound(_)));
    }

    #[test]
    fn test_read_table_skips_undecodable_title_line() {
        let (title, _, _) = encoding_rs::SHIFT_JIS.encode("有価証券報告書");
        let mut content = title.into_owned();
        content.extend_from_slice("\n項目名\t値\n現金及び預金\t1,000\n".as_bytes());
        let t = read_table(content.as_slice(), 2, b'\t').unwrap();
        assert_eq!(t.headers, vec!["項目名", "値"]);
        assert_eq!(t.rows, vec![vec!["現金及び預金", "1,000"]]);
    }

    #[test]
    fn test_read_table_rejects_undecodable_data_line() {
        let mut content = "項目名\t値\n".as_bytes().to_vec();
        content.extend_from_slice(b"\x8c\xbb\x8b\xe0\t500\n");
        content.extend_from_slice("土地\t1,000\n".as_bytes());
        let err = read_table(content.as_slice(), 1, b'\t').unwrap_err();
        assert!(matches!(err, BsmapError::Encoding(_)));
        assert!(err.to_string().contains("line 2"), "got: {err}");
    }

    #[test]
    fn test_load_table_shift_jis() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bs.tsv");
        let (bytes, _, _) = encoding_rs::SHIFT_JIS.encode("項目名\t値\n現金及び預金\t△1,000\n");
        std::fs::write(&path, &bytes).unwrap();
        let t = load_table(&path, &InputSettings::default(), b'\t', encoding_rs::SHIFT_JIS).unwrap();
        assert_eq!(t.headers, vec!["項目名", "値"]);
        assert_eq!(t.rows, vec![vec!["現金及び預金", "△1,000"]]);
    }

    #[test]
    fn test_load_table_utf16_bom_overrides_setting() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bs.tsv");
        let mut bytes = vec![0xFF, 0xFE];
        for unit in "項目名\t値\n土地\t2,000\n".encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        std::fs::write(&path, &bytes).unwrap();
        let t = load_table(&path, &InputSettings::default(), b'\t', UTF_8).unwrap();
        assert_eq!(t.headers, vec!["項目名", "値"]);
        assert_eq!(t.rows, vec![vec!["土地", "2,000"]]);
    }

    #[test]
    fn test_load_table_rejects_malformed_encoding() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bs.tsv");
        // lone Shift-JIS lead byte before the newline
        std::fs::write(&path, b"Label\tValue\nCash\x81\n").unwrap();
        let err = load_table(&path, &InputSettings::default(), b'\t', encoding_rs::SHIFT_JIS)
            .unwrap_err();
        assert!(matches!(err, BsmapError::Encoding(_)));
    }

    #[test]
    fn test_current_period_by_context_id() {
        let t = table(
            &["項目名", "コンテキストID", "値"],
            &[
                &["現金", "CurrentYearInstant", "1"],
                &["現金", "Prior1YearInstant", "2"],
                &["土地", "currentyearinstant_NonConsolidated", "3"],
            ],
        );
        let (out, ctx) = current_period(&t);
        assert_eq!(out.rows.len(), 2);
        assert_eq!(ctx, Some(1));
    }

    #[test]
    fn test_current_period_by_relative_year() {
        let t = table(
            &["科目名", "相対年度", "金額"],
            &[&["現金", "当期末", "1"], &["現金", "前期末", "2"], &["土地", "当期", "3"]],
        );
        let (out, ctx) = current_period(&t);
        assert_eq!(out.rows.len(), 2);
        assert_eq!(ctx, Some(1));
    }

    #[test]
    fn test_current_period_by_instant_columns() {
        let t = table(
            &["Element", "PeriodInstant", "Value"],
            &[&["Cash", "CurrentYearInstant", "1"], &["Cash", "Prior1YearInstant", "2"]],
        );
        let (out, ctx) = current_period(&t);
        assert_eq!(out.rows.len(), 1);
        assert_eq!(ctx, Some(1));

        // first row not current: keep everything
        let t = table(
            &["Element", "PeriodInstant", "Value"],
            &[&["Cash", "Prior1YearInstant", "2"], &["Cash", "CurrentYearInstant", "1"]],
        );
        let (out, ctx) = current_period(&t);
        assert_eq!(out.rows.len(), 2);
        assert_eq!(ctx, None);
    }

    #[test]
    fn test_no_period_columns_keeps_all_rows() {
        let t = table(&["項目名", "値"], &[&["現金", "1"], &["土地", "2"]]);
        let (out, ctx) = current_period(&t);
        assert_eq!(out.rows.len(), 2);
        assert_eq!(ctx, None);
    }

    #[test]
    fn test_detect_columns_by_candidate_then_fragment() {
        let t = table(&["Amount", "勘定科目"], &[]);
        assert_eq!(detect_label_column(&t, "△"), Some(1));
        assert_eq!(detect_value_column(&t, "△"), Some(0));

        let t = table(&["連結項目ラベル", "当期金額"], &[]);
        assert_eq!(detect_label_column(&t, "△"), Some(0));
        assert_eq!(detect_value_column(&t, "△"), Some(1));
    }

    #[test]
    fn test_detect_columns_by_content() {
        let t = table(
            &["a", "b", "c"],
            &[
                &["1", "現金", "1,000"],
                &["2", "土地", "△200"],
                &["3", "のれん", "-"],
            ],
        );
        assert_eq!(detect_label_column(&t, "△"), Some(1));
        assert_eq!(detect_value_column(&t, "△"), Some(0));
    }

    #[test]
    fn test_detect_value_requires_majority() {
        let t = table(&["x", "y"], &[&["a", "1"], &["b", "c"]]);
        assert_eq!(detect_value_column(&t, "△"), None);
        let t = table(&["x", "y"], &[&["a", "1"], &["b", "2"], &["c", "d"]]);
        assert_eq!(detect_value_column(&t, "△"), Some(1));
    }

    #[test]
    fn test_extract_items() {
        let t = table(
            &["項目名", "相対年度", "値"],
            &[&["現金及び預金", "当期末", "1,000"], &["現金及び預金", "前期末", "900"]],
        );
        let items = extract_items(&t, "△").unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].label, "現金及び預金");
        assert_eq!(items[0].raw_value, "1,000");
        assert_eq!(items[0].context.as_deref(), Some("当期末"));
    }

    #[test]
    fn test_extract_items_without_columns() {
        let t = table(&["x"], &[&["1"]]);
        assert!(extract_items(&t, "△").is_none());
        assert!(extract_items(&TallTable::default(), "△").is_none());
    }
}
