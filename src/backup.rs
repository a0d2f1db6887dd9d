//! Bounded ring of timestamped container backups.
//!
//! Backups are named `vault_backup_<YYYYMMDDTHHMMSSZ>.dat`. The timestamp is
//! fixed-width UTC, so sorting names sorts them chronologically. Two rotations
//! within the same second share a name and the later one wins.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::error::{Result, VaultError};

pub const BACKUP_PREFIX: &str = "vault_backup_";
pub const BACKUP_EXTENSION: &str = ".dat";
pub const DEFAULT_MAX_BACKUPS: usize = 5;

const TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%SZ";
const TIMESTAMP_LEN: usize = 16;

#[derive(Clone, Debug)]
pub struct BackupRotator {
    backup_dir: PathBuf,
    max_backups: usize,
}

impl BackupRotator {
    pub fn new(backup_dir: impl Into<PathBuf>, max_backups: usize) -> Self {
        Self {
            backup_dir: backup_dir.into(),
            max_backups,
        }
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    pub fn max_backups(&self) -> usize {
        self.max_backups
    }

    /// Copies `container_path` into the ring and prunes the oldest backups.
    ///
    /// Returns the path of the new backup, or `None` if there was no
    /// container to copy.
    pub fn rotate(&self, container_path: &Path) -> Result<Option<PathBuf>> {
        self.rotate_at(container_path, Utc::now())
    }

    /// Same as [`rotate`](Self::rotate) with an explicit timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::StorageIo`] if the copy fails; nothing is pruned
    /// in that case. Pruning failures are logged and do not fail the call.
    pub fn rotate_at(&self, container_path: &Path, at: DateTime<Utc>) -> Result<Option<PathBuf>> {
        if !container_path.exists() {
            debug!(path = %container_path.display(), "no container to back up");
            return Ok(None);
        }

        fs::create_dir_all(&self.backup_dir).map_err(|e| {
            VaultError::io(
                format!("failed to create backup directory {}", self.backup_dir.display()),
                e,
            )
        })?;

        let target = self
            .backup_dir
            .join(format!("{BACKUP_PREFIX}{}{BACKUP_EXTENSION}", at.format(TIMESTAMP_FORMAT)));
        fs::copy(container_path, &target).map_err(|e| {
            VaultError::io(format!("failed to create backup {}", target.display()), e)
        })?;
        info!(backup = %target.display(), "vault backed up");

        self.prune();
        Ok(Some(target))
    }

    /// Lists retained backups, oldest first.
    pub fn backups(&self) -> Result<Vec<PathBuf>> {
        let entries = match fs::read_dir(&self.backup_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(VaultError::io(
                    format!("failed to list {}", self.backup_dir.display()),
                    e,
                ));
            }
        };

        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| is_backup_name(name))
            .collect();
        names.sort();

        Ok(names
            .into_iter()
            .map(|name| self.backup_dir.join(name))
            .collect())
    }

    fn prune(&self) {
        let backups = match self.backups() {
            Ok(backups) => backups,
            Err(e) => {
                warn!(error = %e, "could not list backups for pruning");
                return;
            }
        };

        let excess = backups.len().saturating_sub(self.max_backups);
        for old in &backups[..excess] {
            match fs::remove_file(old) {
                Ok(()) => debug!(backup = %old.display(), "removed old backup"),
                Err(e) => warn!(backup = %old.display(), error = %e, "failed to remove old backup"),
            }
        }
    }
}

fn is_backup_name(name: &str) -> bool {
    name.strip_prefix(BACKUP_PREFIX)
        .and_then(|rest| rest.strip_suffix(BACKUP_EXTENSION))
        .is_some_and(|stamp| stamp.len() == TIMESTAMP_LEN && stamp.is_ascii())
}
