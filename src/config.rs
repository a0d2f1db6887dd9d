use std::path::PathBuf;

use directories::ProjectDirs;

use crate::backup::DEFAULT_MAX_BACKUPS;
use crate::crypto::KdfParams;
use crate::error::{Result, VaultError};

/// Static configuration for a vault session.
#[derive(Clone, Debug)]
pub struct VaultConfig {
    pub vault_path: PathBuf,
    pub backup_dir: PathBuf,
    pub max_backups: usize,
    pub kdf: KdfParams,
}

impl VaultConfig {
    /// Places the container and backups next to each other under `dir`.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            vault_path: dir.join("vault.dat"),
            backup_dir: dir.join("backups"),
            max_backups: DEFAULT_MAX_BACKUPS,
            kdf: KdfParams::default(),
        }
    }

    /// Uses the platform data directory, e.g. `~/.local/share/pwvault` on Linux.
    pub fn platform_default() -> Result<Self> {
        let project_dirs = ProjectDirs::from("", "", "pwvault").ok_or_else(|| {
            VaultError::io(
                "could not determine platform directories",
                std::io::Error::from(std::io::ErrorKind::NotFound),
            )
        })?;

        Ok(Self::in_dir(project_dirs.data_dir()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_dir_uses_defaults() {
        let config = VaultConfig::in_dir("/tmp/pw");

        assert_eq!(config.vault_path, PathBuf::from("/tmp/pw/vault.dat"));
        assert_eq!(config.backup_dir, PathBuf::from("/tmp/pw/backups"));
        assert_eq!(config.max_backups, 5);
        assert_eq!(config.kdf.iterations(), 480_000);
    }
}
