use std::path::{Path, PathBuf};

use colored::Colorize;

use crate::error::Result;
use crate::export::{default_output_name, write_report_file};
use crate::importer::load_table;
use crate::reports::BalanceSheetBuilder;
use crate::settings::load_settings;

pub fn run(input: &str, config: Option<&str>, output: Option<&str>, dry_run: bool) -> Result<()> {
    let settings = load_settings(config.map(Path::new))?;
    let builder = BalanceSheetBuilder::new(&settings.balance_sheet)?;
    let output = output.map(PathBuf::from).unwrap_or_else(default_output_name);
    tracing::info!(input, output = %output.display(), dry_run, "balance sheet conversion");

    let table = load_table(
        Path::new(input),
        &settings.input,
        settings.input_delimiter()?,
        settings.input_encoding()?,
    )?;

    if dry_run {
        let (rows, cols) = table.shape();
        let rules = &settings.balance_sheet.account_mapping;
        println!("Config OK: {} mapping rules", rules.len());
        if rules.is_empty() {
            eprintln!(
                "{}",
                "Warning: balance_sheet.account_mapping is empty, no label will be mapped".yellow()
            );
        }
        println!("Input OK:  {rows} rows x {cols} columns");
        println!("Dry run complete, nothing written.");
        return Ok(());
    }

    let report = builder.transform_table(&table);
    write_report_file(
        &output,
        &report.rows,
        settings.output_delimiter()?,
        settings.output_encoding()?,
    )?;

    let (rows, cols) = report.shape();
    println!("{} line items mapped to {} accounts", report.mapped, report.accounts);
    println!("Wrote {} ({rows} rows x {cols} columns)", output.display());
    if report.rows.is_empty() {
        eprintln!(
            "{}",
            "Warning: no label/value columns found in the input, the report is empty".yellow()
        );
    } else if settings.logging.show_unmapped_items && !report.unmapped.is_empty() {
        eprintln!(
            "{}",
            format!(
                "{} labels matched no pattern (run `bsmap entries --all` to list them)",
                report.unmapped.len()
            )
            .yellow()
        );
    }
    Ok(())
}
