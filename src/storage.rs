//! Crash-safe file storage for the vault container.

use crate::crypto::aead::secure_random;
use crate::error::{Result, VaultError};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Reads and atomically replaces the container file.
#[derive(Clone, Debug)]
pub struct Storage {
    path: PathBuf,
}

impl Storage {
    /// Creates a new Storage instance with the given path.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Returns `true` if the container file exists.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Loads the entire container file into memory.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::StorageIo`] if the file cannot be read.
    pub fn load(&self) -> Result<Vec<u8>> {
        fs::read(&self.path).map_err(|e| {
            VaultError::io(format!("failed to read {}", self.path.display()), e)
        })
    }

    /// Loads the container file, or `None` if it does not exist.
    ///
    /// Only a missing file counts as absent; an unreachable path or a
    /// permission error is still a read failure.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::StorageIo`] for any error other than `NotFound`.
    pub fn load_if_exists(&self) -> Result<Option<Vec<u8>>> {
        match fs::read(&self.path) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(VaultError::io(
                format!("failed to read {}", self.path.display()),
                e,
            )),
        }
    }

    /// Saves data to the container file using atomic write.
    ///
    /// 1. Writes data to a temporary file with a random name in the same directory
    /// 2. Syncs the temporary file to disk
    /// 3. Atomically replaces the old file with the new one
    /// 4. Syncs the parent directory so the rename is persisted
    ///
    /// A crash or error leaves either the old or the new file in place, never a
    /// partial write. Creates parent directories if they don't exist.
    ///
    /// Once the rename has happened the new file is the container, so a failed
    /// directory sync is only logged.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::StorageIo`] if the file cannot be written; the
    /// previous container is untouched in that case.
    pub fn save(&self, data: &[u8]) -> Result<()> {
        if let Some(parent) = self.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                VaultError::io(format!("failed to create {}", parent.display()), e)
            })?;
        }

        let tmp_path = self.random_tmp_path()?;

        if let Err(e) = Self::write_synced(&tmp_path, data) {
            let _ = fs::remove_file(&tmp_path);
            return Err(VaultError::io("failed to write temporary file", e));
        }

        if let Err(e) = self.atomic_replace(&tmp_path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(VaultError::io(
                format!("failed to replace {}", self.path.display()),
                e,
            ));
        }

        if let Some(parent) = self.parent() {
            sync_dir(parent);
        }

        Ok(())
    }

    /// Returns the path to the container file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parent(&self) -> Option<&Path> {
        self.path.parent().filter(|p| !p.as_os_str().is_empty())
    }

    fn write_synced(tmp_path: &Path, data: &[u8]) -> io::Result<()> {
        // fail if the name is already taken
        let mut tmp_file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(tmp_path)?;

        tmp_file.write_all(data)?;
        tmp_file.sync_all()
    }

    /// Generates a unique temporary file path in the same directory.
    ///
    /// Format: `filename.tmp.<randomhex>`
    fn random_tmp_path(&self) -> Result<PathBuf> {
        let mut buf = [0u8; 8]; // 64 bit entropy
        secure_random(&mut buf)?;

        let rand_string = buf.iter().map(|b| format!("{:02x}", b)).collect::<String>();

        let file_name = self.path.file_name().ok_or_else(|| {
            VaultError::io(
                format!("{} is not a file path", self.path.display()),
                io::Error::from(io::ErrorKind::InvalidInput),
            )
        })?;

        let tmp_name = format!("{}.tmp.{}", file_name.to_string_lossy(), rand_string);

        Ok(self.path.with_file_name(tmp_name))
    }

    /// Atomically replaces the target file with the temporary file.
    ///
    /// Uses Windows `ReplaceFileW` with `REPLACEFILE_WRITE_THROUGH` so the
    /// replacement is persisted to disk. `ReplaceFileW` requires an existing
    /// target, so the first save falls back to a plain rename.
    #[cfg(target_os = "windows")]
    fn atomic_replace(&self, tmp_path: &Path) -> io::Result<()> {
        use std::ffi::OsStr;
        use std::os::windows::ffi::OsStrExt;
        use windows_sys::Win32::Storage::FileSystem::{REPLACEFILE_WRITE_THROUGH, ReplaceFileW};

        if !self.path.exists() {
            return fs::rename(tmp_path, &self.path);
        }

        fn to_wide(s: &OsStr) -> Vec<u16> {
            s.encode_wide().chain(std::iter::once(0)).collect()
        }

        let target_w = to_wide(self.path.as_os_str());
        let tmp_w = to_wide(tmp_path.as_os_str());

        // SAFETY:
        // - Strings are valid UTF-16 and null-terminated
        // - Pointers remain valid during the call
        // - Windows does not retain the pointers after return
        let result = unsafe {
            ReplaceFileW(
                target_w.as_ptr(),
                tmp_w.as_ptr(),
                std::ptr::null(),
                REPLACEFILE_WRITE_THROUGH,
                std::ptr::null(),
                std::ptr::null(),
            )
        };

        if result == 0 {
            return Err(io::Error::last_os_error());
        }

        Ok(())
    }

    /// Atomically replaces the target file with the temporary file.
    ///
    /// On Unix, `rename()` is atomic when both paths are on the same filesystem.
    #[cfg(not(target_os = "windows"))]
    fn atomic_replace(&self, tmp_path: &Path) -> io::Result<()> {
        fs::rename(tmp_path, &self.path)
    }
}

/// Flushes a directory entry after a rename. Failure is logged, not returned.
fn sync_dir(dir: &Path) {
    if let Err(e) = File::open(dir).and_then(|d| d.sync_all()) {
        warn!(dir = %dir.display(), error = %e, "failed to sync vault directory");
    }
}
