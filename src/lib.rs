pub mod backup;
mod config;
pub mod credentials;
pub mod crypto;
mod error;
mod format;
pub mod generator;
mod storage;
mod vault;

use std::path::{Path, PathBuf};

pub use crate::backup::BackupRotator;
pub use crate::config::VaultConfig;
pub use crate::credentials::{CredentialEntry, CredentialMap};
pub use crate::crypto::KdfParams;
pub use crate::error::{CredentialError, CryptoError, GeneratorError, Result, VaultError};
pub use crate::generator::CharClass;
pub use crate::vault::VaultStore;
use tracing::{info, warn};
use zeroize::Zeroizing;

/// An unlocked vault session.
///
/// Every mutation is applied to a copy of the credential map, saved, and only
/// then committed in memory, so a failed save leaves the session exactly as
/// it was on disk. Each successful save is followed by a best-effort backup.
pub struct Vault {
    store: VaultStore,
    backups: BackupRotator,
    passphrase: Zeroizing<String>,
    credentials: CredentialMap,
}

impl Vault {
    /// Opens the vault described by `config`, or starts an empty one if no
    /// container exists yet. Nothing is written until the first mutation.
    pub fn open(config: &VaultConfig, passphrase: Zeroizing<String>) -> Result<Self> {
        let store = VaultStore::new(config.vault_path.clone(), config.kdf);
        let credentials = store.open(&passphrase)?;

        Ok(Self {
            store,
            backups: BackupRotator::new(config.backup_dir.clone(), config.max_backups),
            passphrase,
            credentials,
        })
    }

    /// `true` until the first save creates the container.
    pub fn is_new(&self) -> bool {
        !self.store.exists()
    }

    pub fn path(&self) -> &Path {
        self.store.path()
    }

    pub fn get(&self, service: &str) -> Option<&CredentialEntry> {
        self.credentials.get(service)
    }

    pub fn entries(&self) -> Vec<(&str, &CredentialEntry)> {
        self.credentials.sorted()
    }

    pub fn service_names(&self) -> Vec<&str> {
        self.credentials.service_names()
    }

    pub fn search(&self, term: &str) -> Vec<(&str, &CredentialEntry)> {
        self.credentials.search(term)
    }

    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }

    pub fn add(&mut self, service: &str, account_id: &str, secret: &str) -> Result<()> {
        let mut next = self.credentials.clone();
        next.insert(service, account_id, secret)?;
        self.commit(next)
    }

    pub fn update(
        &mut self,
        original: &str,
        new_service: &str,
        account_id: &str,
        secret: &str,
    ) -> Result<()> {
        let mut next = self.credentials.clone();
        next.update(original, new_service, account_id, secret)?;
        self.commit(next)
    }

    pub fn remove(&mut self, service: &str) -> Result<()> {
        let mut next = self.credentials.clone();
        next.remove(service)?;
        self.commit(next)
    }

    /// Re-encrypts the whole vault under `new_passphrase`.
    ///
    /// If the save fails the session keeps the previous passphrase, which is
    /// still the one that decrypts the container on disk.
    pub fn change_passphrase(&mut self, new_passphrase: Zeroizing<String>) -> Result<()> {
        let previous = std::mem::replace(&mut self.passphrase, new_passphrase);

        if let Err(e) = self.persist(&self.credentials) {
            self.passphrase = previous;
            return Err(e);
        }

        info!(path = %self.path().display(), "master passphrase changed");
        Ok(())
    }

    /// Writes the current state again under a fresh salt.
    pub fn save(&self) -> Result<()> {
        self.persist(&self.credentials)
    }

    /// Snapshots the container into the backup ring right now.
    pub fn backup_now(&self) -> Result<Option<PathBuf>> {
        self.backups.rotate(self.store.path())
    }

    pub fn backups(&self) -> Result<Vec<PathBuf>> {
        self.backups.backups()
    }

    /// Ends the session. The passphrase and decrypted entries are wiped on drop.
    pub fn close(self) {}

    fn commit(&mut self, next: CredentialMap) -> Result<()> {
        self.persist(&next)?;
        self.credentials = next;
        Ok(())
    }

    fn persist(&self, map: &CredentialMap) -> Result<()> {
        self.store.save(&self.passphrase, map)?;

        if let Err(e) = self.backups.rotate(self.store.path()) {
            warn!(error = %e, "backup rotation failed");
        }
        Ok(())
    }
}
