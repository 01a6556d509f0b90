mod cli;

use clap::Parser;
use colored::Colorize;
use pgverify::report::EXIT_ERROR;
use tracing_subscriber::EnvFilter;

use cli::{dispatch, Cli};

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let code = match dispatch(cli.command) {
        Ok(code) => code,
        Err(err) => {
            tracing::debug!(error = ?err, "run aborted");
            eprintln!("{} {err:#}", "error:".red().bold());
            EXIT_ERROR
        }
    };
    std::process::exit(code);
}

/// Log to stderr so a JSON report on stdout stays parseable
fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}
