use clap::{ArgAction, Parser, Subcommand};
use pgverify::commands::run::OutputFormat;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pgverify")]
#[command(about = "Verify a provisioned PostgreSQL host", long_about = None)]
#[command(version)]
#[command(subcommand_help_heading = "Commands")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace; RUST_LOG wins)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the checks against a host
    Run {
        /// Config file (default: $XDG_CONFIG_HOME/pgverify/config.toml if present)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Target host: local, ssh://[user@]host[:port] or docker://container
        #[arg(short, long)]
        target: Option<String>,

        /// Per-command timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Number of checks to run concurrently
        #[arg(short, long)]
        jobs: Option<usize>,

        /// Run only this check (repeatable)
        #[arg(long = "check", value_name = "NAME")]
        only: Vec<String>,

        /// Skip this check (repeatable)
        #[arg(long, value_name = "NAME")]
        skip: Vec<String>,

        /// Report format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Password of the application role
        #[arg(long, env = "PGVERIFY_DB_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// List the checks and what they verify
    List {
        /// Config file (default: $XDG_CONFIG_HOME/pgverify/config.toml if present)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Generate shell completion script
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run_flags() {
        let cli = Cli::try_parse_from([
            "pgverify",
            "-vv",
            "run",
            "--target",
            "docker://instance",
            "--check",
            "backup-script",
            "--check",
            "role-exists",
            "--skip",
            "postgres-listening",
            "--format",
            "json",
            "--jobs",
            "4",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        let Commands::Run {
            target,
            only,
            skip,
            format,
            jobs,
            ..
        } = cli.command
        else {
            panic!("expected run");
        };
        assert_eq!(target.as_deref(), Some("docker://instance"));
        assert_eq!(only, vec!["backup-script", "role-exists"]);
        assert_eq!(skip, vec!["postgres-listening"]);
        assert_eq!(format, OutputFormat::Json);
        assert_eq!(jobs, Some(4));
    }

    #[test]
    fn test_rejects_unknown_format() {
        assert!(Cli::try_parse_from(["pgverify", "run", "--format", "xml"]).is_err());
    }
}
