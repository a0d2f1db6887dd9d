//! Encrypted load/save of the credential map.

use std::path::{Path, PathBuf};

use tracing::debug;
use zeroize::Zeroizing;

use crate::credentials::CredentialMap;
use crate::crypto::{self, KdfParams};
use crate::error::{CryptoError, Result, VaultError};
use crate::format::VaultContainer;
use crate::storage::Storage;

/// Owns the container file and the KDF parameters used to open it.
#[derive(Clone, Debug)]
pub struct VaultStore {
    storage: Storage,
    kdf: KdfParams,
}

impl VaultStore {
    pub fn new(path: impl Into<PathBuf>, kdf: KdfParams) -> Self {
        Self {
            storage: Storage::new(path.into()),
            kdf,
        }
    }

    pub fn path(&self) -> &Path {
        self.storage.path()
    }

    pub fn exists(&self) -> bool {
        self.storage.exists()
    }

    /// Loads and decrypts the credential map.
    ///
    /// A missing file is the first-run state: an empty map is returned and
    /// nothing is written.
    ///
    /// # Errors
    ///
    /// - [`VaultError::InvalidPassphrase`] if authentication fails, whether from
    ///   a wrong passphrase or a damaged ciphertext
    /// - [`VaultError::MalformedContainer`] if the file is structurally invalid
    /// - [`VaultError::StorageIo`] if the file exists but cannot be read, or
    ///   the path cannot be reached at all
    pub fn open(&self, passphrase: &str) -> Result<CredentialMap> {
        let Some(data) = self.storage.load_if_exists()? else {
            debug!(path = %self.path().display(), "no vault container, starting empty");
            return Ok(CredentialMap::new());
        };

        let container = VaultContainer::parse(&data)?;

        let key = crypto::derive_key(passphrase, container.salt(), self.kdf)?;
        let plaintext = crypto::decrypt(&key[..], container.ciphertext()).map_err(|e| match e {
            CryptoError::Authentication => VaultError::InvalidPassphrase,
            other => VaultError::Crypto(other),
        })?;

        let map: CredentialMap = serde_json::from_slice(&plaintext).map_err(|e| {
            VaultError::MalformedContainer(format!("payload is not a credential map: {e}"))
        })?;

        debug!(path = %self.path().display(), entries = map.len(), "vault opened");
        Ok(map)
    }

    /// Encrypts `map` under a fresh salt and atomically replaces the container.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::StorageIo`] if the write fails; any existing
    /// container is left untouched in that case.
    pub fn save(&self, passphrase: &str, map: &CredentialMap) -> Result<()> {
        let salt = crypto::generate_salt()?;
        let key = crypto::derive_key(passphrase, &salt, self.kdf)?;

        let plaintext = Zeroizing::new(serde_json::to_vec(map)?);
        let ciphertext = crypto::encrypt(&key[..], &plaintext)?;

        let container = VaultContainer::new(salt, ciphertext);
        self.storage.save(&container.to_bytes())?;

        debug!(path = %self.path().display(), entries = map.len(), "vault saved");
        Ok(())
    }
}
