// crates/veil-contract/src/resolve.rs
// ============================================================================
// Module: Contract Module Resolution
// Description: Locates exactly one compiled contract artifact from a hint.
// Purpose: Replace implicit "only folder" discovery with a validated lookup.
// Dependencies: std
// ============================================================================

//! ## Overview
//! A location hint is either the artifact file itself or a directory. A
//! directory is scanned for contract modules: the directory itself when it
//! holds `contract/index.d.cts`, plus each direct child of its `managed/`
//! subdirectory (or of the directory itself when there is no `managed/`).
//! An optional name selector narrows the candidates. Without a selector, a
//! directory holding exactly one `*.compact` source file narrows them to the
//! module named after that file, so stale builds under `managed/` do not
//! shadow the current contract. Anything other than a single remaining
//! candidate is an error.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::io;
use std::io::Read;
use std::path::Path;
use std::path::PathBuf;

use crate::ExtractError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Artifact paths relative to a module directory, in preference order.
pub const ARTIFACT_RELATIVE_PATHS: [&str; 2] = ["contract/index.d.cts", "contract/index.d.ts"];

/// Build-output subdirectory holding compiled modules.
pub const MANAGED_DIR: &str = "managed";

/// Extension of contract source files.
pub const SOURCE_EXTENSION: &str = "compact";

/// Maximum artifact size accepted by the extractor.
pub const MAX_ARTIFACT_BYTES: u64 = 4 * 1024 * 1024;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Single resolved contract module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedModule {
    /// Module name (the module directory name).
    pub name: String,
    /// Path to the declaration artifact.
    pub artifact: PathBuf,
}

// ============================================================================
// SECTION: Resolution
// ============================================================================

/// Resolves exactly one contract module from a location hint.
///
/// # Errors
///
/// Returns [`ExtractError::ContractNotFound`] when no candidate remains,
/// [`ExtractError::AmbiguousContract`] when more than one does, and
/// [`ExtractError::Io`] for filesystem failures other than a missing hint.
pub fn resolve_module(hint: &Path, selector: Option<&str>) -> Result<ResolvedModule, ExtractError> {
    let metadata = match fs::metadata(hint) {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(ExtractError::ContractNotFound {
                searched: hint.display().to_string(),
            });
        }
        Err(err) => return Err(ExtractError::Io(err.to_string())),
    };
    let (searched, mut candidates) = if metadata.is_file() {
        let module = ResolvedModule {
            name: module_name_for_file(hint),
            artifact: hint.to_path_buf(),
        };
        (hint.to_path_buf(), vec![module])
    } else {
        scan_directory(hint)?
    };
    if let Some(selector) = selector {
        candidates.retain(|candidate| candidate.name == selector);
    } else if candidates.len() > 1
        && metadata.is_dir()
        && let Some(source) = single_source_stem(hint)?
        && candidates.iter().any(|candidate| candidate.name == source)
    {
        candidates.retain(|candidate| candidate.name == source);
    }
    match candidates.len() {
        0 => Err(ExtractError::ContractNotFound {
            searched: searched.display().to_string(),
        }),
        1 => candidates.pop().ok_or_else(|| ExtractError::ContractNotFound {
            searched: searched.display().to_string(),
        }),
        _ => {
            let mut names: Vec<String> =
                candidates.into_iter().map(|candidate| candidate.name).collect();
            names.sort();
            Err(ExtractError::AmbiguousContract {
                searched: searched.display().to_string(),
                candidates: names,
            })
        }
    }
}

/// Scans a directory hint and returns the scanned root plus candidates.
fn scan_directory(hint: &Path) -> Result<(PathBuf, Vec<ResolvedModule>), ExtractError> {
    let mut candidates = Vec::new();
    if let Some(artifact) = module_artifact(hint) {
        candidates.push(ResolvedModule {
            name: module_name_for_dir(hint),
            artifact,
        });
    }
    let managed = hint.join(MANAGED_DIR);
    let root = if managed.is_dir() { managed } else { hint.to_path_buf() };
    let entries = fs::read_dir(&root).map_err(|err| ExtractError::Io(err.to_string()))?;
    let mut children = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| ExtractError::Io(err.to_string()))?;
        let path = entry.path();
        if path.is_dir() {
            children.push(path);
        }
    }
    children.sort();
    for child in children {
        if let Some(artifact) = module_artifact(&child) {
            candidates.push(ResolvedModule {
                name: module_name_for_dir(&child),
                artifact,
            });
        }
    }
    Ok((root, candidates))
}

/// Returns the stem of the only `*.compact` file directly inside `dir`.
fn single_source_stem(dir: &Path) -> Result<Option<String>, ExtractError> {
    let entries = fs::read_dir(dir).map_err(|err| ExtractError::Io(err.to_string()))?;
    let mut stems = Vec::new();
    for entry in entries {
        let path = entry.map_err(|err| ExtractError::Io(err.to_string()))?.path();
        if path.is_file()
            && path.extension().is_some_and(|ext| ext == SOURCE_EXTENSION)
            && let Some(stem) = path.file_stem()
        {
            stems.push(stem.to_string_lossy().into_owned());
        }
    }
    if stems.len() == 1 { Ok(stems.pop()) } else { Ok(None) }
}

/// Returns the artifact path inside a module directory, if any.
fn module_artifact(dir: &Path) -> Option<PathBuf> {
    ARTIFACT_RELATIVE_PATHS.iter().map(|relative| dir.join(relative)).find(|path| path.is_file())
}

/// Derives a module name from its directory.
fn module_name_for_dir(dir: &Path) -> String {
    dir.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .or_else(|| {
            fs::canonicalize(dir)
                .ok()
                .and_then(|path| path.file_name().map(|name| name.to_string_lossy().into_owned()))
        })
        .unwrap_or_else(|| "contract".to_string())
}

/// Derives a module name from an artifact path.
///
/// Uses the directory above `contract/` when the conventional layout is
/// present, otherwise the file stem without declaration suffixes.
fn module_name_for_file(path: &Path) -> String {
    let parent = path.parent();
    if let Some(parent) = parent
        && parent.file_name().is_some_and(|name| name == "contract")
        && let Some(module) = parent.parent().and_then(Path::file_name)
    {
        return module.to_string_lossy().into_owned();
    }
    let file_name = path.file_name().map(|name| name.to_string_lossy().into_owned());
    let file_name = file_name.unwrap_or_else(|| "contract".to_string());
    [".d.cts", ".d.ts", ".d.mts", ".ts", ".cts"]
        .iter()
        .find_map(|suffix| file_name.strip_suffix(suffix))
        .map_or_else(|| file_name.clone(), str::to_string)
}

// ============================================================================
// SECTION: Artifact Input
// ============================================================================

/// Reads an artifact with a size limit to avoid memory exhaustion.
///
/// # Errors
///
/// Returns [`ExtractError::TooLarge`] past [`MAX_ARTIFACT_BYTES`], or
/// [`ExtractError::Io`] for read and UTF-8 failures.
pub fn read_artifact(path: &Path) -> Result<String, ExtractError> {
    let too_large = || ExtractError::TooLarge {
        path: path.display().to_string(),
        limit: MAX_ARTIFACT_BYTES,
    };
    let file = fs::File::open(path).map_err(|err| ExtractError::Io(err.to_string()))?;
    let metadata = file.metadata().map_err(|err| ExtractError::Io(err.to_string()))?;
    if metadata.len() > MAX_ARTIFACT_BYTES {
        return Err(too_large());
    }
    let mut bytes = Vec::new();
    let mut limited = file.take(MAX_ARTIFACT_BYTES + 1);
    limited.read_to_end(&mut bytes).map_err(|err| ExtractError::Io(err.to_string()))?;
    let size = u64::try_from(bytes.len()).map_err(|_| too_large())?;
    if size > MAX_ARTIFACT_BYTES {
        return Err(too_large());
    }
    String::from_utf8(bytes)
        .map_err(|err| ExtractError::Io(format!("artifact is not utf-8: {err}")))
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test fixtures use explicit asserts and unwraps for clarity."
    )]

    use super::*;

    #[test]
    fn file_names_follow_conventional_layout() {
        let path = Path::new("build/managed/voting/contract/index.d.cts");
        assert_eq!(module_name_for_file(path), "voting");
        assert_eq!(module_name_for_file(Path::new("out/counter.d.ts")), "counter");
    }
}
