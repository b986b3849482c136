// crates/veil-wrapper-gen/src/output.rs
// ============================================================================
// Module: Wrapper Output
// Description: Atomic writes and drift checks for generated wrapper files.
// Purpose: Never leave a partial artifact on disk.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Generated contents are written to a unique temporary file next to the
//! destination, synced, and renamed into place. Every failure path removes
//! the temporary file. Drift checks compare on-disk contents with a fresh
//! rendering while ignoring the `// Generated on:` line.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use crate::TIMESTAMP_PREFIX;
use crate::WrapperGenError;

// ============================================================================
// SECTION: Writes
// ============================================================================

/// Writes generated contents to `path` atomically.
///
/// Parent directories are created when missing. The rename replaces an
/// existing artifact in one step; when it fails the existing artifact is left
/// untouched.
///
/// # Errors
///
/// Returns [`WrapperGenError::Io`] when any filesystem step fails.
pub fn write_output(path: &Path, contents: &str) -> Result<(), WrapperGenError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|err| WrapperGenError::Io(err.to_string()))?;
    }
    let (temp_path, mut file) = create_temp_output(path)?;
    if let Err(err) = file.write_all(contents.as_bytes()) {
        let _ = fs::remove_file(&temp_path);
        return Err(WrapperGenError::Io(err.to_string()));
    }
    if let Err(err) = file.sync_all() {
        let _ = fs::remove_file(&temp_path);
        return Err(WrapperGenError::Io(err.to_string()));
    }
    drop(file);
    persist_temp_output(&temp_path, path)
}

/// Compares on-disk contents with a fresh rendering, ignoring the timestamp.
///
/// # Errors
///
/// Returns [`WrapperGenError::Io`] when the file cannot be read and
/// [`WrapperGenError::Drift`] when contents differ.
pub fn check_output(path: &Path, contents: &str) -> Result<(), WrapperGenError> {
    let existing = fs::read_to_string(path).map_err(|err| WrapperGenError::Io(err.to_string()))?;
    if strip_timestamp(&existing) != strip_timestamp(contents) {
        return Err(WrapperGenError::Drift {
            path: path.display().to_string(),
        });
    }
    Ok(())
}

/// Removes the `// Generated on:` line from generated contents.
#[must_use]
pub fn strip_timestamp(contents: &str) -> String {
    contents
        .split_inclusive('\n')
        .filter(|line| !line.starts_with(TIMESTAMP_PREFIX))
        .collect()
}

// ============================================================================
// SECTION: Temporary Files
// ============================================================================

/// Attempts made to allocate a unique temporary path.
const TEMP_ATTEMPTS: usize = 16;
/// Process-wide counter for temporary file names.
static TEMP_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Creates a unique temporary output file alongside the destination.
fn create_temp_output(path: &Path) -> Result<(PathBuf, fs::File), WrapperGenError> {
    let parent = path.parent().filter(|parent| !parent.as_os_str().is_empty());
    let parent = parent.unwrap_or_else(|| Path::new("."));
    let file_name = path.file_name().and_then(|name| name.to_str()).ok_or_else(|| {
        WrapperGenError::Io("output path does not include a file name".to_string())
    })?;
    for _ in 0 .. TEMP_ATTEMPTS {
        let attempt = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        let temp_name = format!(".{file_name}.tmp.{}.{}", std::process::id(), attempt);
        let temp_path = parent.join(temp_name);
        match OpenOptions::new().write(true).create_new(true).open(&temp_path) {
            Ok(file) => return Ok((temp_path, file)),
            Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {}
            Err(err) => return Err(WrapperGenError::Io(err.to_string())),
        }
    }
    Err(WrapperGenError::Io("failed to allocate temporary output path".to_string()))
}

/// Renames the temporary output file over the final destination.
fn persist_temp_output(temp_path: &Path, path: &Path) -> Result<(), WrapperGenError> {
    fs::rename(temp_path, path).map_err(|err| {
        let _ = fs::remove_file(temp_path);
        WrapperGenError::Io(err.to_string())
    })
}

// ============================================================================
// SECTION: Tests
// ============================================================================
