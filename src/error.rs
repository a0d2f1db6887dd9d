//! Error types for the vault engine and password generator.

use std::io;

use thiserror::Error;

/// Errors from the cryptographic primitives.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Wrong key, or the ciphertext was tampered with or truncated.
    #[error("authentication failed")]
    Authentication,

    #[error("invalid salt length: expected {expected} bytes, got {got}")]
    InvalidSaltLength { expected: usize, got: usize },

    #[error("invalid key derivation parameters: {0}")]
    InvalidKdfParams(String),

    #[error("encryption failed")]
    Encryption,

    #[error("OS random generator unavailable")]
    RandomUnavailable,
}

/// Business-rule errors on the credential map.
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("service '{0}' already exists")]
    ServiceExists(String),

    #[error("service '{0}' not found")]
    ServiceNotFound(String),
}

/// Errors from opening, saving and rotating a vault.
#[derive(Debug, Error)]
pub enum VaultError {
    /// Wrong passphrase or damaged ciphertext; the two are never told apart.
    #[error("Invalid password or corrupted data")]
    InvalidPassphrase,

    #[error("malformed vault container: {0}")]
    MalformedContainer(String),

    #[error("{context}")]
    StorageIo {
        context: String,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error("failed to serialize credentials: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl VaultError {
    pub(crate) fn io(context: impl Into<String>, source: io::Error) -> Self {
        VaultError::StorageIo {
            context: context.into(),
            source,
        }
    }
}

/// Errors from the password generator.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GeneratorError {
    #[error("select at least one character class")]
    EmptyCharset,

    #[error("length {length} is shorter than the {classes} selected character classes")]
    LengthBelowClassCount { length: usize, classes: usize },
}

pub type Result<T, E = VaultError> = std::result::Result<T, E>;
