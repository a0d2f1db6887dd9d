use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use zeroize::Zeroizing;

use super::{KEY_LEN, SALT_LEN};
use crate::error::CryptoError;

/// A 256-bit key that is wiped when dropped.
pub type DerivedKey = Zeroizing<[u8; KEY_LEN]>;

/// PBKDF2-HMAC-SHA256 iteration count used when none is configured.
pub const DEFAULT_ITERATIONS: u32 = 480_000;

/// Lowest iteration count [`KdfParams::new`] accepts.
pub const MIN_ITERATIONS: u32 = DEFAULT_ITERATIONS;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    iterations: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
        }
    }
}

impl KdfParams {
    pub fn new(iterations: u32) -> Result<Self, CryptoError> {
        let params = Self { iterations };
        params.validate()?;
        Ok(params)
    }

    /// Skips the iteration floor so tests can run thousands of derivations.
    #[cfg(test)]
    pub(crate) fn insecure_for_tests(iterations: u32) -> Self {
        Self { iterations }
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    pub fn validate(&self) -> Result<(), CryptoError> {
        if self.iterations < MIN_ITERATIONS {
            return Err(CryptoError::InvalidKdfParams(format!(
                "pbkdf2 iteration count must be >= {MIN_ITERATIONS}, got {}",
                self.iterations
            )));
        }
        Ok(())
    }
}

/// Derives the vault key from a passphrase and a 16-byte salt.
///
/// Deterministic: the same passphrase, salt and parameters always give the
/// same key, which is how an existing container finds its key again.
pub fn derive_key(password: &str, salt: &[u8], kdf: KdfParams) -> Result<DerivedKey, CryptoError> {
    if salt.len() != SALT_LEN {
        return Err(CryptoError::InvalidSaltLength {
            expected: SALT_LEN,
            got: salt.len(),
        });
    }
    if kdf.iterations == 0 {
        return Err(CryptoError::InvalidKdfParams(
            "pbkdf2 iteration count must be non-zero".into(),
        ));
    }

    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, kdf.iterations, &mut key[..]);

    Ok(key)
}
