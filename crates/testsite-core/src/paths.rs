use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// File constants
// ---------------------------------------------------------------------------

pub const CONFIG_FILE: &str = "testsite.yaml";
pub const STATUS_FILE: &str = "test_site_status.txt";

/// Entries of the test data directory that survive a clear.
pub const DEFAULT_KEEP: &[&str] = &["behat", "behattestdir.txt", "lock"];

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn status_path(root: &Path) -> PathBuf {
    root.join(STATUS_FILE)
}

/// Join `path` onto `base` unless it is already absolute.
pub fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
