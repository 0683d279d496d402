//! GBD CLI - identify, analyze and transform SAT-family instance files.

use clap::Parser;
use gbd_cli::commands;
use gbd_cli::{Cli, Command, Config, Formatter};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Log to stderr; stdout carries command output only
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}

fn run(cli: Cli) -> gbd_cli::Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load().unwrap_or_else(|e| {
            tracing::warn!("Ignoring configuration file: {}", e);
            Config::default()
        }),
    };

    let format = cli.format.map(Into::into).unwrap_or(config.output.format);
    let formatter = Formatter::new(format, config.output.header);

    match cli.command {
        Command::Id(args) => commands::execute_id(args, &formatter),
        Command::Hash(args) => commands::execute_hash(args, &formatter),
        Command::Isohash(args) => commands::execute_isohash(args, &formatter),
        Command::Extract(args) => commands::execute_extract(args, &formatter),
        Command::Batch(args) => commands::execute_batch(args, &config, &formatter),
        Command::Normalize(args) => commands::execute_normalize(args),
        Command::Sanitize(args) => commands::execute_sanitize(args),
        Command::CheckSanitized(args) => commands::execute_check_sanitized(args, &formatter),
        Command::Cnf2kis(args) => commands::execute_cnf2kis(args),
    }
}
