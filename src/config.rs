//! Configuration for a verification run
//!
//! Every value defaults to what the provisioning role deploys, so an empty
//! (or absent) config file verifies a stock installation.
//!
//! ```toml
//! target = "ssh://deploy@db1.example.com"
//! command_timeout_secs = 30
//!
//! [backup]
//! script = "/usr/local/bin/pg-backup.sh"
//!
//! [postgres]
//! database = "test_db"
//! role = "app_user"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::error::ConfigError;
use crate::host::{SocketAddress, Target, DEFAULT_COMMAND_TIMEOUT};

/// File name looked up under the user config directory
const CONFIG_FILE: &str = "pgverify/config.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// `local`, `ssh://[user@]host[:port]` or `docker://container`
    pub target: String,
    pub command_timeout_secs: u64,
    /// Worker threads used to run checks
    pub jobs: usize,
    pub backup: BackupConfig,
    pub postgres: PostgresConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target: "local".to_string(),
            command_timeout_secs: DEFAULT_COMMAND_TIMEOUT.as_secs(),
            jobs: 1,
            backup: BackupConfig::default(),
            postgres: PostgresConfig::default(),
        }
    }
}

/// Paths of the backup tooling
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BackupConfig {
    pub script: String,
    pub directory: String,
    pub service_unit: String,
    pub timer_unit: String,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            script: "/usr/local/bin/pg-backup.sh".to_string(),
            directory: "/var/lib/postgresql/backups".to_string(),
            service_unit: "/etc/systemd/system/postgres-backup.service".to_string(),
            timer_unit: "/etc/systemd/system/postgres-backup.timer".to_string(),
        }
    }
}

impl BackupConfig {
    /// Unit name of the timer, e.g. `postgres-backup.timer`
    pub fn timer_name(&self) -> &str {
        Path::new(&self.timer_unit)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(&self.timer_unit)
    }
}

/// The containerized database and what it must contain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PostgresConfig {
    /// Name filter for `docker service ls`
    pub service_filter: String,
    /// Name filter for `docker ps`
    pub container_filter: String,
    pub expected_replicas: String,
    pub listen_address: String,
    pub admin_user: String,
    pub database: String,
    pub role: String,
    /// Password of `role`; usually supplied through `PGVERIFY_DB_PASSWORD`
    pub password: Option<String>,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            service_filter: "postgres".to_string(),
            container_filter: "postgres".to_string(),
            expected_replicas: "1/1".to_string(),
            listen_address: "tcp://127.0.0.1:5432".to_string(),
            admin_user: "postgres".to_string(),
            database: "test_db".to_string(),
            role: "app_user".to_string(),
            password: None,
        }
    }
}

impl Config {
    /// Load and validate a config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load `explicit` if given, else the user config file if it exists,
    /// else the defaults.
    pub fn discover(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            debug!(path = %path.display(), "loading config");
            return Self::load(path);
        }
        match Self::default_path() {
            Some(path) if path.is_file() => {
                debug!(path = %path.display(), "loading user config");
                Self::load(&path)
            }
            _ => Ok(Self::default()),
        }
    }

    /// `$XDG_CONFIG_HOME/pgverify/config.toml` or the platform equivalent
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_FILE))
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }

    pub fn parsed_target(&self) -> Result<Target, ConfigError> {
        self.target
            .parse()
            .map_err(|e: crate::error::HostError| ConfigError::Invalid(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.parsed_target()?;
        if self.command_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "command_timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.jobs == 0 {
            return Err(ConfigError::Invalid("jobs must be at least 1".to_string()));
        }
        SocketAddress::parse(&self.postgres.listen_address)
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        let required = [
            ("backup.script", &self.backup.script),
            ("backup.directory", &self.backup.directory),
            ("backup.service_unit", &self.backup.service_unit),
            ("backup.timer_unit", &self.backup.timer_unit),
            ("postgres.service_filter", &self.postgres.service_filter),
            ("postgres.container_filter", &self.postgres.container_filter),
            ("postgres.admin_user", &self.postgres.admin_user),
            ("postgres.database", &self.postgres.database),
            ("postgres.role", &self.postgres.role),
        ];
        for (key, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("{key} must not be empty")));
            }
        }
        Ok(())
    }
}
