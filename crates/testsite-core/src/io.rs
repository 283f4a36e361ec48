use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Atomically replace `path` with `data` via a tempfile in the same directory.
///
/// Unlike a plain `fs::write`, a crash mid-write never leaves a truncated file.
/// The parent directory must already exist.
pub fn atomic_write(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Remove every entry directly under `dir` whose name is not in `keep`,
/// and never remove an entry that contains `protect`.
///
/// Returns the number of entries removed. A missing `dir` removes nothing.
pub fn clear_dir(dir: &Path, keep: &[String], protect: Option<&Path>) -> std::io::Result<usize> {
    if !dir.is_dir() {
        return Ok(0);
    }
    let mut removed = 0;
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        if keep.iter().any(|k| name == k.as_str()) {
            continue;
        }
        let path = entry.path();
        if protect.is_some_and(|p| p.starts_with(&path)) {
            tracing::debug!(path = %path.display(), "keeping entry that holds the harness");
            continue;
        }
        // symlinks are unlinked, never followed
        if entry.file_type()?.is_dir() {
            std::fs::remove_dir_all(&path)?;
        } else {
            std::fs::remove_file(&path)?;
        }
        removed += 1;
    }
    Ok(removed)
}
