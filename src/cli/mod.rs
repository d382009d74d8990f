pub mod convert;
pub mod entries;
pub mod map;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "bsmap",
    version,
    about = "Map tall financial-statement line items onto a fixed balance-sheet layout."
)]
pub struct Cli {
    /// Enable debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert a tall statement file into the balance-sheet table.
    Convert {
        /// Path to the tall input file
        #[arg(short, long)]
        input: String,
        /// Config file (default: ./config.json, then ~/.config/bsmap/config.json)
        #[arg(short, long)]
        config: Option<String>,
        /// Output file (default: MMDDHHMM.csv)
        #[arg(short, long)]
        output: Option<String>,
        /// Load config and input without writing anything
        #[arg(long = "dry-run")]
        dry_run: bool,
    },
    /// Show how each input line item is classified.
    Entries {
        /// Path to the tall input file
        #[arg(short, long)]
        input: String,
        /// Config file (default: ./config.json, then ~/.config/bsmap/config.json)
        #[arg(short, long)]
        config: Option<String>,
        /// Also list labels that matched no pattern
        #[arg(long)]
        all: bool,
    },
    /// Rewrite account names in the selected columns of a table.
    Map {
        /// Path to the input file
        #[arg(short, long)]
        input: String,
        /// Config file (default: ./config.json, then ~/.config/bsmap/config.json)
        #[arg(short, long)]
        config: Option<String>,
        /// Output file (default: MMDDHHMM.csv)
        #[arg(short, long)]
        output: Option<String>,
        /// Load config and input without writing anything
        #[arg(long = "dry-run")]
        dry_run: bool,
    },
}
