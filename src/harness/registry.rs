//! The check battery and check selection

use crate::check::{
    Check, ContainerHealthCheck, DatabaseExistsCheck, FileCheck, FileKind, RoleCanConnectCheck,
    RoleExistsCheck, ServiceReplicasCheck, SocketListeningCheck, UnitEnabledCheck,
};
use crate::config::Config;
use crate::error::HarnessError;

const ROOT: (&str, &str) = ("root", "root");

/// Every check for a provisioned PostgreSQL host, in reporting order
pub fn default_checks(config: &Config) -> Vec<Box<dyn Check>> {
    let backup = &config.backup;
    let pg = &config.postgres;

    vec![
        Box::new(FileCheck::new("backup-script", &backup.script, FileKind::File, ROOT, 0o700)),
        Box::new(FileCheck::new(
            "backup-directory",
            &backup.directory,
            FileKind::Directory,
            ROOT,
            0o700,
        )),
        Box::new(FileCheck::new(
            "backup-service-unit",
            &backup.service_unit,
            FileKind::File,
            ROOT,
            0o644,
        )),
        Box::new(FileCheck::new(
            "backup-timer-unit",
            &backup.timer_unit,
            FileKind::File,
            ROOT,
            0o644,
        )),
        Box::new(UnitEnabledCheck::new("backup-timer-enabled", backup.timer_name())),
        Box::new(ServiceReplicasCheck::new(
            "postgres-service-replicas",
            &pg.service_filter,
            &pg.expected_replicas,
        )),
        Box::new(ContainerHealthCheck::new(
            "postgres-container-healthy",
            &pg.container_filter,
        )),
        Box::new(SocketListeningCheck::new("postgres-listening", &pg.listen_address)),
        Box::new(DatabaseExistsCheck {
            name: "database-exists".to_string(),
            container_filter: pg.container_filter.clone(),
            admin_user: pg.admin_user.clone(),
            database: pg.database.clone(),
        }),
        Box::new(RoleExistsCheck {
            name: "role-exists".to_string(),
            container_filter: pg.container_filter.clone(),
            admin_user: pg.admin_user.clone(),
            role: pg.role.clone(),
        }),
        Box::new(RoleCanConnectCheck {
            name: "role-can-connect".to_string(),
            container_filter: pg.container_filter.clone(),
            role: pg.role.clone(),
            database: pg.database.clone(),
            password: pg.password.clone(),
        }),
    ]
}

/// Which checks of the battery to run
#[derive(Debug, Clone, Default)]
pub struct Selection {
    /// Run only these checks; empty means all
    pub only: Vec<String>,
    pub skip: Vec<String>,
}

impl Selection {
    /// Filter `checks`, keeping registration order.
    ///
    /// Naming a check that does not exist is an error so a typo cannot
    /// silently drop a check from the run.
    pub fn apply(&self, checks: Vec<Box<dyn Check>>) -> Result<Vec<Box<dyn Check>>, HarnessError> {
        for name in self.only.iter().chain(&self.skip) {
            if !checks.iter().any(|c| c.name() == name) {
                return Err(HarnessError::UnknownCheck { name: name.clone() });
            }
        }

        let selected: Vec<_> = checks
            .into_iter()
            .filter(|c| self.only.is_empty() || self.only.iter().any(|n| n == c.name()))
            .filter(|c| !self.skip.iter().any(|n| n == c.name()))
            .collect();

        if selected.is_empty() {
            return Err(HarnessError::NothingSelected);
        }
        Ok(selected)
    }
}
