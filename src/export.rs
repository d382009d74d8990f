use std::path::{Path, PathBuf};

use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8};

use crate::error::{BsmapError, Result};
use crate::models::{OutputRow, TallTable};

/// `MMDDHHMM.csv` stamped with the local time.
pub fn default_output_name() -> PathBuf {
    let stamp = chrono::Local::now().format("%m%d%H%M").to_string();
    PathBuf::from(format!("{stamp}.csv"))
}

/// Existing outputs are never overwritten.
pub fn ensure_writable(path: &Path) -> Result<()> {
    if path.exists() {
        return Err(BsmapError::OutputExists(path.display().to_string()));
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Encode UTF-8 text for writing. UTF-16 output starts with a byte-order
/// mark. Characters the target encoding cannot represent are an error.
pub fn encode_text(text: &str, encoding: &'static Encoding) -> Result<Vec<u8>> {
    if encoding == UTF_16LE || encoding == UTF_16BE {
        let little = encoding == UTF_16LE;
        let units = std::iter::once(0xFEFF).chain(text.encode_utf16());
        return Ok(units
            .flat_map(|u| if little { u.to_le_bytes() } else { u.to_be_bytes() })
            .collect());
    }
    let (bytes, _, unmappable) = encoding.encode(text);
    if unmappable {
        return Err(BsmapError::Encoding(format!(
            "output contains characters {} cannot represent",
            encoding.name()
        )));
    }
    Ok(bytes.into_owned())
}

fn write_encoded(path: &Path, utf8: Vec<u8>, encoding: &'static Encoding) -> Result<()> {
    let bytes = if encoding == UTF_8 {
        utf8
    } else {
        let text = String::from_utf8(utf8).map_err(|e| BsmapError::Encoding(e.to_string()))?;
        encode_text(&text, encoding)?
    };
    std::fs::write(path, bytes)?;
    Ok(())
}

/// Header-less report rows. Amount cells arrive already quoted, so nothing is
/// quoted again here.
pub fn write_report<W: std::io::Write>(writer: W, rows: &[OutputRow], delimiter: u8) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .quote_style(csv::QuoteStyle::Never)
        .from_writer(writer);
    for row in rows {
        wtr.write_record(row)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_report_file(
    path: &Path,
    rows: &[OutputRow],
    delimiter: u8,
    encoding: &'static Encoding,
) -> Result<()> {
    ensure_writable(path)?;
    let mut buf = Vec::new();
    write_report(&mut buf, rows, delimiter)?;
    write_encoded(path, buf, encoding)?;
    tracing::info!(path = %path.display(), rows = rows.len(), "wrote report");
    Ok(())
}

/// A table with its header row, quoted where needed.
pub fn write_table<W: std::io::Write>(writer: W, table: &TallTable, delimiter: u8) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .flexible(true)
        .delimiter(delimiter)
        .from_writer(writer);
    wtr.write_record(&table.headers)?;
    for row in &table.rows {
        wtr.write_record(row)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_table_file(
    path: &Path,
    table: &TallTable,
    delimiter: u8,
    encoding: &'static Encoding,
) -> Result<()> {
    ensure_writable(path)?;
    let mut buf = Vec::new();
    write_table(&mut buf, table, delimiter)?;
    write_encoded(path, buf, encoding)?;
    tracing::info!(path = %path.display(), rows = table.rows.len(), "wrote table");
    Ok(())
}
