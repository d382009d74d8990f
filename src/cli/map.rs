use std::path::{Path, PathBuf};

use colored::Colorize;

use crate::error::Result;
use crate::export::{default_output_name, write_table_file};
use crate::importer::load_table;
use crate::remap::{remap_table, ColumnSelector};
use crate::settings::load_settings;

pub fn run(input: &str, config: Option<&str>, output: Option<&str>, dry_run: bool) -> Result<()> {
    let settings = load_settings(config.map(Path::new))?;
    let columns = &settings.processing_columns;
    let selector = ColumnSelector::new(&columns.target_columns, &columns.exclude_columns)?;
    let output = output.map(PathBuf::from).unwrap_or_else(default_output_name);
    tracing::info!(input, output = %output.display(), dry_run, "column remap");

    let table = load_table(
        Path::new(input),
        &settings.input,
        settings.input_delimiter()?,
        settings.input_encoding()?,
    )?;

    if dry_run {
        let (rows, cols) = table.shape();
        println!("Config OK: {} mapping entries", settings.account_mapping.len());
        if settings.account_mapping.is_empty() {
            eprintln!(
                "{}",
                "Warning: account_mapping is empty, values will only be trimmed".yellow()
            );
        }
        println!("Input OK:  {rows} rows x {cols} columns");
        println!("Dry run complete, nothing written.");
        return Ok(());
    }

    let (mapped, stats) = remap_table(&table, &settings.account_mapping, &selector);
    write_table_file(
        &output,
        &mapped,
        settings.output_delimiter()?,
        settings.output_encoding()?,
    )?;

    if settings.logging.show_mapping_stats {
        println!("{} values remapped", stats.total_transformations());
        for item in &stats.mapped {
            tracing::debug!(
                row = item.row,
                column = item.column.as_str(),
                original = item.original.as_str(),
                transformed = item.transformed.as_str(),
                "remapped"
            );
        }
        if settings.logging.show_unmapped_items && !stats.unmapped.is_empty() {
            eprintln!(
                "{}",
                format!("Unmapped values ({}):", stats.unmapped.len()).yellow()
            );
            for value in &stats.unmapped {
                eprintln!("  - {}", value.yellow());
            }
        }
    }

    let (rows, cols) = mapped.shape();
    println!("Wrote {} ({rows} rows x {cols} columns)", output.display());
    Ok(())
}
