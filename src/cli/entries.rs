use std::path::Path;

use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::error::Result;
use crate::fmt::format_amount;
use crate::importer::{extract_items, load_table};
use crate::reports::BalanceSheetBuilder;
use crate::settings::load_settings;

pub fn run(input: &str, config: Option<&str>, all: bool) -> Result<()> {
    let settings = load_settings(config.map(Path::new))?;
    let bs = &settings.balance_sheet;
    let builder = BalanceSheetBuilder::new(bs)?;
    let table = load_table(
        Path::new(input),
        &settings.input,
        settings.input_delimiter()?,
        settings.input_encoding()?,
    )?;

    let Some(items) = extract_items(&table, &bs.negative_marker) else {
        eprintln!("{}", "No label/value columns found in the input.".yellow());
        return Ok(());
    };

    let mut out = Table::new();
    out.set_header(vec!["Label", "Account", "Level", "Amount", "Note", "Context"]);
    let mut unmatched = Vec::new();
    let mut matched = 0usize;
    for item in &items {
        match builder.classify(item) {
            Some(entry) => {
                matched += 1;
                out.add_row(vec![
                    Cell::new(item.label.trim()),
                    Cell::new(&entry.account),
                    Cell::new(entry.level),
                    Cell::new(format_amount(&entry.amount, bs.unit_threshold)),
                    Cell::new(&entry.annotation),
                    Cell::new(item.context.as_deref().unwrap_or("")),
                ]);
            }
            None if !item.label.trim().is_empty() => unmatched.push(item.label.trim()),
            None => {}
        }
    }

    println!("Classified Entries\n{out}");
    println!("{matched} of {} line items matched", items.len());

    if all && !unmatched.is_empty() {
        println!();
        println!("{}", "Unmatched labels:".yellow().bold());
        for label in unmatched {
            println!("  {}", label.yellow());
        }
    }
    Ok(())
}
