mod amount;
mod categorizer;
mod cli;
mod error;
mod export;
mod fmt;
mod importer;
mod models;
mod remap;
mod reports;
mod settings;
mod template;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("failed to set up logging: {e}");
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Convert {
            input,
            config,
            output,
            dry_run,
        } => cli::convert::run(&input, config.as_deref(), output.as_deref(), dry_run),
        Commands::Entries { input, config, all } => {
            cli::entries::run(&input, config.as_deref(), all)
        }
        Commands::Map {
            input,
            config,
            output,
            dry_run,
        } => cli::map::run(&input, config.as_deref(), output.as_deref(), dry_run),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
