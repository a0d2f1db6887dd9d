//! On-disk layout of the vault container.
//!
//! ```text
//! SALT (16) | NONCE (24) | CIPHERTEXT | TAG (16)
//! ```
//!
//! There is no magic or version header; any layout change is breaking.

use crate::crypto::SALT_LEN;
use crate::error::{Result, VaultError};

/// A parsed vault container: the KDF salt and the AEAD output that follows it.
pub(crate) struct VaultContainer {
    salt: [u8; SALT_LEN],
    ciphertext: Vec<u8>,
}

impl VaultContainer {
    pub fn new(salt: [u8; SALT_LEN], ciphertext: Vec<u8>) -> Self {
        Self { salt, ciphertext }
    }

    /// Returns the salt used for key derivation.
    pub fn salt(&self) -> &[u8; SALT_LEN] {
        &self.salt
    }

    /// Returns the nonce-prefixed ciphertext.
    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    /// Parses container bytes.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::MalformedContainer`] if the data is too short to
    /// hold a salt or carries no ciphertext at all.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < SALT_LEN {
            return Err(VaultError::MalformedContainer(format!(
                "file is {} bytes, too short to contain a {SALT_LEN}-byte salt",
                data.len()
            )));
        }

        let (salt, ciphertext) = data.split_at(SALT_LEN);
        if ciphertext.is_empty() {
            return Err(VaultError::MalformedContainer(
                "no ciphertext after salt".into(),
            ));
        }

        let mut buf = [0u8; SALT_LEN];
        buf.copy_from_slice(salt);

        Ok(Self::new(buf, ciphertext.to_vec()))
    }

    /// Serializes the container to `salt || ciphertext`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(SALT_LEN + self.ciphertext.len());
        buf.extend_from_slice(&self.salt);
        buf.extend_from_slice(&self.ciphertext);
        buf
    }
}
