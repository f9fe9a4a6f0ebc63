//! Persisted credential storage.
//!
//! DESIGN
//! ======
//! Only the auth store writes through these handles. `MemoryCredentials`
//! gives ephemeral sessions (nothing survives a restart); `FileCredentials`
//! keeps the token pair in a JSON file so sign-in survives restarts.

#[cfg(test)]
#[path = "credentials_test.rs"]
mod credentials_test;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::net::types::Credential;

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("credential file io: {0}")]
    Io(#[from] std::io::Error),
    #[error("credential file is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

pub trait CredentialStore: Send + Sync {
    /// Read the stored credential, if any.
    ///
    /// # Errors
    ///
    /// Returns an error when the backing storage exists but cannot be read.
    fn load(&self) -> Result<Option<Credential>, CredentialError>;

    /// Replace the stored credential.
    ///
    /// # Errors
    ///
    /// Returns an error when the backing storage cannot be written.
    fn save(&self, credential: &Credential) -> Result<(), CredentialError>;

    /// Remove any stored credential. Clearing an empty store is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error when the backing storage cannot be removed.
    fn clear(&self) -> Result<(), CredentialError>;
}

/// In-memory credential slot; lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryCredentials {
    slot: Mutex<Option<Credential>>,
}

impl MemoryCredentials {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(credential: Credential) -> Self {
        Self { slot: Mutex::new(Some(credential)) }
    }
}

impl CredentialStore for MemoryCredentials {
    fn load(&self) -> Result<Option<Credential>, CredentialError> {
        Ok(self.slot.lock().unwrap_or_else(std::sync::PoisonError::into_inner).clone())
    }

    fn save(&self, credential: &Credential) -> Result<(), CredentialError> {
        *self.slot.lock().unwrap_or_else(std::sync::PoisonError::into_inner) = Some(credential.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), CredentialError> {
        *self.slot.lock().unwrap_or_else(std::sync::PoisonError::into_inner) = None;
        Ok(())
    }
}

/// JSON file holding the token pair.
#[derive(Debug, Clone)]
pub struct FileCredentials {
    path: PathBuf,
}

impl FileCredentials {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialStore for FileCredentials {
    fn load(&self) -> Result<Option<Credential>, CredentialError> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(None),
            Ok(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, credential: &Credential) -> Result<(), CredentialError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let body = serde_json::to_vec_pretty(credential)?;
        let staging = self.path.with_extension("tmp");
        write_private(&staging, &body)?;
        std::fs::rename(&staging, &self.path)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), CredentialError> {
        match std::fs::remove_file(&self.path) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// Write `body` to a file only the owner can read, replacing any previous
/// contents.
fn write_private(path: &Path, body: &[u8]) -> std::io::Result<()> {
    let mut options = std::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    std::os::unix::fs::OpenOptionsExt::mode(&mut options, 0o600);
    let mut file = options.open(path)?;
    // `mode` only applies on creation; a leftover file keeps its old bits.
    #[cfg(unix)]
    file.set_permissions(std::os::unix::fs::PermissionsExt::from_mode(0o600))?;
    file.write_all(body)?;
    file.sync_all()
}
