use crate::error::{Result, TestSiteError};
use crate::paths;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// LifecycleStatus
// ---------------------------------------------------------------------------

/// Persisted lifecycle state of the test site.
///
/// The discriminants are the on-disk wire format and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleStatus {
    Installing = 2,
    Installed = 3,
    NotInstalled = 4,
    Enabled = 5,
    Disabled = 6,
}

impl LifecycleStatus {
    pub fn all() -> &'static [LifecycleStatus] {
        &[
            LifecycleStatus::Installing,
            LifecycleStatus::Installed,
            LifecycleStatus::NotInstalled,
            LifecycleStatus::Enabled,
            LifecycleStatus::Disabled,
        ]
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::all().iter().copied().find(|s| s.code() == code)
    }

    /// Whether the application schema is believed to exist.
    pub fn is_installed(self) -> bool {
        matches!(
            self,
            LifecycleStatus::Installed | LifecycleStatus::Enabled | LifecycleStatus::Disabled
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LifecycleStatus::Installing => "installing",
            LifecycleStatus::Installed => "installed",
            LifecycleStatus::NotInstalled => "not_installed",
            LifecycleStatus::Enabled => "enabled",
            LifecycleStatus::Disabled => "disabled",
        }
    }
}

impl fmt::Display for LifecycleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// StatusStore
// ---------------------------------------------------------------------------

/// The single-integer status file. No locking: callers serialise access.
#[derive(Debug, Clone)]
pub struct StatusStore {
    path: PathBuf,
}

impl StatusStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Status file at its fixed location under the harness root.
    pub fn in_root(root: &Path) -> Self {
        Self::new(paths::status_path(root))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Absent or unreadable file reads as `NotInstalled`; garbage, including
    /// bytes that are not text, is an error.
    pub fn read(&self) -> Result<LifecycleStatus> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e)
                if matches!(
                    e.kind(),
                    std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied
                ) =>
            {
                return Ok(LifecycleStatus::NotInstalled)
            }
            Err(e) => return Err(e.into()),
        };
        let raw = String::from_utf8_lossy(&bytes);
        let trimmed = raw.trim();
        trimmed
            .parse::<u8>()
            .ok()
            .and_then(LifecycleStatus::from_code)
            .ok_or_else(|| TestSiteError::CorruptStatus(trimmed.to_string()))
    }

    pub fn write(&self, status: LifecycleStatus) -> Result<()> {
        tracing::debug!(path = %self.path.display(), %status, "writing test site status");
        crate::io::atomic_write(&self.path, status.code().to_string().as_bytes()).map_err(
            |source| TestSiteError::StatusNotWritable {
                path: self.path.clone(),
                source,
            },
        )
    }

    /// Remove the file, which reads back as `NotInstalled`.
    pub fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(TestSiteError::StatusNotWritable {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
