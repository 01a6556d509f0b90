//! File and directory ownership/permission checks

use std::fmt;

use super::{Check, CheckFailure};
use crate::host::{FileInfo, Host};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    File,
    Directory,
}

impl FileKind {
    fn of(info: &FileInfo) -> Option<Self> {
        if info.is_file {
            Some(FileKind::File)
        } else if info.is_directory {
            Some(FileKind::Directory)
        } else {
            None
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileKind::File => write!(f, "file"),
            FileKind::Directory => write!(f, "directory"),
        }
    }
}

/// Asserts a path exists with the given type, ownership and mode
#[derive(Debug, Clone)]
pub struct FileCheck {
    pub name: String,
    pub path: String,
    pub kind: FileKind,
    pub owner: String,
    pub group: String,
    pub mode: u32,
}

impl FileCheck {
    pub fn new(name: &str, path: &str, kind: FileKind, owner_group: (&str, &str), mode: u32) -> Self {
        Self {
            name: name.to_string(),
            path: path.to_string(),
            kind,
            owner: owner_group.0.to_string(),
            group: owner_group.1.to_string(),
            mode,
        }
    }
}

impl Check for FileCheck {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> String {
        format!(
            "{} {} is {}:{} {:04o}",
            self.kind, self.path, self.owner, self.group, self.mode
        )
    }

    fn run(&self, host: &dyn Host) -> Result<(), CheckFailure> {
        let info = host.file(&self.path)?;
        if !info.exists {
            return Err(CheckFailure::NotFound {
                subject: format!("{} {}", self.kind, self.path),
            });
        }

        let actual_kind = FileKind::of(&info);
        if actual_kind != Some(self.kind) {
            let actual = actual_kind.map_or_else(|| "another file type".to_string(), |k| k.to_string());
            return Err(CheckFailure::assertion(&self.path, self.kind.to_string(), actual));
        }

        let owner = info.owner.as_deref().unwrap_or("?");
        let group = info.group.as_deref().unwrap_or("?");
        let mode = info.mode.unwrap_or_default();
        if owner != self.owner || group != self.group || mode != self.mode {
            return Err(CheckFailure::assertion(
                &self.path,
                format!("{}:{} {:04o}", self.owner, self.group, self.mode),
                format!("{owner}:{group} {mode:04o}"),
            ));
        }

        Ok(())
    }
}
