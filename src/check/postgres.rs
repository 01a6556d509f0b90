//! Database content checks, run with `psql` inside the database container

use super::docker::require_container;
use super::{Check, CheckFailure};
use crate::host::{quote, Host};

/// A `psql` invocation through `docker exec`
#[derive(Debug, Clone)]
pub struct Psql<'a> {
    container: &'a str,
    user: &'a str,
    database: Option<&'a str>,
    password: Option<&'a str>,
}

impl<'a> Psql<'a> {
    pub fn new(container: &'a str, user: &'a str) -> Self {
        Self {
            container,
            user,
            database: None,
            password: None,
        }
    }

    pub fn database(mut self, database: &'a str) -> Self {
        self.database = Some(database);
        self
    }

    pub fn password(mut self, password: Option<&'a str>) -> Self {
        self.password = password;
        self
    }

    /// Build the shell command for `query`; with `redact` the password is
    /// replaced so the command can be shown in reports.
    pub fn command(&self, query: &str, redact: bool) -> String {
        let mut command = String::from("docker exec ");
        if let Some(password) = self.password {
            let value = if redact { "***" } else { password };
            command.push_str(&format!("-e {} ", quote(&format!("PGPASSWORD={value}"))));
        }
        command.push_str(&format!("{} psql -U {}", quote(self.container), quote(self.user)));
        if let Some(database) = self.database {
            command.push_str(&format!(" -d {}", quote(database)));
        }
        command.push_str(&format!(" -tAc {}", quote(query)));
        command
    }

    /// Run `query` and return its non-empty output rows
    pub fn rows(&self, host: &dyn Host, query: &str) -> Result<Vec<String>, CheckFailure> {
        let output = host.run(&self.command(query, false))?;
        if !output.success() {
            return Err(CheckFailure::Command {
                command: self.command(query, true),
                detail: output.summary(),
            });
        }
        Ok(output.stdout_lines().map(str::to_string).collect())
    }
}

/// Asserts a named database exists
#[derive(Debug, Clone)]
pub struct DatabaseExistsCheck {
    pub name: String,
    pub container_filter: String,
    pub admin_user: String,
    pub database: String,
}

impl Check for DatabaseExistsCheck {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> String {
        format!("database {} exists", self.database)
    }

    fn run(&self, host: &dyn Host) -> Result<(), CheckFailure> {
        let container = require_container(host, &self.container_filter)?;
        let databases = Psql::new(&container, &self.admin_user)
            .rows(host, "SELECT datname FROM pg_database")?;

        if databases.iter().any(|db| *db == self.database) {
            Ok(())
        } else {
            Err(CheckFailure::NotFound {
                subject: format!("database {}", self.database),
            })
        }
    }
}

/// Asserts a named login role exists
#[derive(Debug, Clone)]
pub struct RoleExistsCheck {
    pub name: String,
    pub container_filter: String,
    pub admin_user: String,
    pub role: String,
}

impl Check for RoleExistsCheck {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> String {
        format!("role {} exists", self.role)
    }

    fn run(&self, host: &dyn Host) -> Result<(), CheckFailure> {
        let container = require_container(host, &self.container_filter)?;
        let roles =
            Psql::new(&container, &self.admin_user).rows(host, "SELECT usename FROM pg_user")?;

        if roles.iter().any(|role| *role == self.role) {
            Ok(())
        } else {
            Err(CheckFailure::NotFound {
                subject: format!("role {}", self.role),
            })
        }
    }
}

/// Asserts a role can authenticate against its database and run a query
#[derive(Debug, Clone)]
pub struct RoleCanConnectCheck {
    pub name: String,
    pub container_filter: String,
    pub role: String,
    pub database: String,
    pub password: Option<String>,
}

impl Check for RoleCanConnectCheck {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> String {
        format!("role {} can query database {}", self.role, self.database)
    }

    fn run(&self, host: &dyn Host) -> Result<(), CheckFailure> {
        let container = require_container(host, &self.container_filter)?;
        let rows = Psql::new(&container, &self.role)
            .database(&self.database)
            .password(self.password.as_deref())
            .rows(host, "SELECT 1")?;

        if rows == ["1"] {
            Ok(())
        } else {
            Err(CheckFailure::assertion(
                format!("SELECT 1 as {}", self.role),
                "1",
                format!("{rows:?}"),
            ))
        }
    }
}
