//! `pgverify run`: execute the check battery and print the report

use anyhow::{Context, Result};
use clap::ValueEnum;
use std::path::PathBuf;

use crate::config::Config;
use crate::error::HarnessError;
use crate::harness::{default_checks, Harness, Selection};
use crate::host::{CommandHost, Host};
use crate::report::Report;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Command-line overrides for a run
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub config_path: Option<PathBuf>,
    pub target: Option<String>,
    pub timeout_secs: Option<u64>,
    pub jobs: Option<usize>,
    pub password: Option<String>,
    pub selection: Selection,
    pub format: OutputFormat,
}

impl RunOptions {
    /// Load the config and apply the overrides on top of it
    pub fn resolve_config(&self) -> Result<Config> {
        let mut config = Config::discover(self.config_path.as_deref())?;
        if let Some(target) = &self.target {
            config.target = target.clone();
        }
        if let Some(secs) = self.timeout_secs {
            config.command_timeout_secs = secs;
        }
        if let Some(jobs) = self.jobs {
            config.jobs = jobs;
        }
        if self.password.is_some() {
            config.postgres.password = self.password.clone();
        }
        config.validate().context("Invalid settings")?;
        Ok(config)
    }
}

/// Run the selected checks from `config` against `host`
pub fn verify(host: &dyn Host, config: &Config, selection: &Selection) -> Result<Report, HarnessError> {
    let checks = selection.apply(default_checks(config))?;
    Harness::new(host, checks).with_jobs(config.jobs).run()
}

/// Execute the run command, returning the process exit code
pub fn execute(options: RunOptions) -> Result<i32> {
    let config = options.resolve_config()?;
    let target = config.parsed_target()?;
    let host = CommandHost::new(target, config.command_timeout())?;

    let report = verify(&host, &config, &options.selection)?;

    match options.format {
        OutputFormat::Text => print!("{}", report.render_text()),
        OutputFormat::Json => {
            let json = report.to_json().context("Failed to serialize report")?;
            println!("{json}");
        }
    }

    Ok(report.exit_code())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_overrides_win_over_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "target = \"docker://molecule\"\ncommand_timeout_secs = 5").unwrap();

        let options = RunOptions {
            config_path: Some(file.path().to_path_buf()),
            target: Some("ssh://db1".into()),
            jobs: Some(3),
            password: Some("pw".into()),
            ..RunOptions::default()
        };
        let config = options.resolve_config().unwrap();
        assert_eq!(config.target, "ssh://db1");
        assert_eq!(config.command_timeout_secs, 5);
        assert_eq!(config.jobs, 3);
        assert_eq!(config.postgres.password.as_deref(), Some("pw"));
    }

    #[test]
    fn test_invalid_override_is_rejected() {
        let file = NamedTempFile::new().unwrap();
        let options = RunOptions {
            config_path: Some(file.path().to_path_buf()),
            timeout_secs: Some(0),
            ..RunOptions::default()
        };
        assert!(options.resolve_config().is_err());
    }

    #[test]
    #[serial]
    fn test_defaults_without_user_config() {
        let home = tempfile::tempdir().unwrap();
        let previous = std::env::var_os("XDG_CONFIG_HOME");
        std::env::set_var("XDG_CONFIG_HOME", home.path());

        let config = RunOptions::default().resolve_config();

        match previous {
            Some(value) => std::env::set_var("XDG_CONFIG_HOME", value),
            None => std::env::remove_var("XDG_CONFIG_HOME"),
        }
        assert_eq!(config.unwrap(), Config::default());
    }
}
