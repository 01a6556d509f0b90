use anyhow::Result;
use clap::CommandFactory;
use pgverify::commands::{list, run};
use pgverify::harness::Selection;
use pgverify::report::EXIT_PASSED;

use super::types::{Cli, Commands};

/// Run a parsed command, returning the process exit code
pub fn dispatch(command: Commands) -> Result<i32> {
    match command {
        Commands::Run {
            config,
            target,
            timeout,
            jobs,
            only,
            skip,
            format,
            password,
        } => run::execute(run::RunOptions {
            config_path: config,
            target,
            timeout_secs: timeout,
            jobs,
            password,
            selection: Selection { only, skip },
            format,
        }),
        Commands::List { config } => {
            list::execute(config.as_deref())?;
            Ok(EXIT_PASSED)
        }
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "pgverify", &mut std::io::stdout());
            Ok(EXIT_PASSED)
        }
    }
}
