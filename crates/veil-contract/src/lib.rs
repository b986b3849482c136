// crates/veil-contract/src/lib.rs
// ============================================================================
// Module: Veil Schema Extractor
// Description: Derives contract schemas from compiled declaration artifacts.
// Purpose: Resolve one contract module and parse its generated type surface.
// Dependencies: thiserror, veil-core
// ============================================================================

//! ## Overview
//! The schema extractor turns the contract compiler's generated TypeScript
//! declaration file (`<build>/managed/<contract>/contract/index.d.cts`) into
//! a [`ContractSchema`]. Extraction is two explicit steps:
//! [`resolve_module`] validates that a location hint names exactly one
//! contract module, and [`parse_artifact`] derives the schema from its text.
//!
//! ### Security Posture
//! Artifacts are untrusted input. Reads are capped at [`MAX_ARTIFACT_BYTES`]
//! and parsing fails closed with the artifact path and line.
//!
//! ## Index
//! - Resolution: [`resolve_module`], [`ResolvedModule`]
//! - Extraction: [`extract`], [`extract_module`], [`parse_artifact`]
//! - Errors: [`ExtractError`]

// ============================================================================
// SECTION: Modules
// ============================================================================

mod lexer;
mod parser;
mod resolve;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;

use thiserror::Error;
use veil_core::ContractSchema;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use parser::COMBINED_GROUP;
pub use parser::LEDGER_GROUP;
pub use parser::QUERY_GROUP;
pub use parser::TRANSACTION_GROUP;
pub use parser::WITNESS_GROUP;
pub use resolve::ARTIFACT_RELATIVE_PATHS;
pub use resolve::MANAGED_DIR;
pub use resolve::MAX_ARTIFACT_BYTES;
pub use resolve::ResolvedModule;
pub use resolve::read_artifact;
pub use resolve::resolve_module;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while resolving or parsing a contract module.
///
/// # Invariants
/// - Every variant is fatal to session and generation startup.
/// - Variant meanings are stable for automation and tests.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    /// No contract module matched the hint.
    #[error("no contract module found under {searched}")]
    ContractNotFound {
        /// Location that was searched.
        searched: String,
    },
    /// More than one contract module matched the hint.
    #[error(
        "multiple contract modules under {searched}: {}; select one by name",
        .candidates.join(", ")
    )]
    AmbiguousContract {
        /// Location that was searched.
        searched: String,
        /// Sorted candidate module names.
        candidates: Vec<String>,
    },
    /// The artifact could not be tokenized into declaration groups.
    #[error("{path}:{line}: {message}")]
    ParseError {
        /// Artifact path.
        path: String,
        /// 1-based line.
        line: usize,
        /// Failure description.
        message: String,
    },
    /// IO error while reading the artifact.
    #[error("io error: {0}")]
    Io(String),
    /// Artifact exceeds the input limit.
    #[error("artifact {path} exceeds {limit} bytes")]
    TooLarge {
        /// Artifact path.
        path: String,
        /// Size limit in bytes.
        limit: u64,
    },
}

// ============================================================================
// SECTION: Extraction
// ============================================================================

/// Resolves one contract module from `hint` and extracts its schema.
///
/// # Errors
///
/// Returns [`ExtractError`] when resolution, reading, or parsing fails.
pub fn extract(hint: &Path, selector: Option<&str>) -> Result<ContractSchema, ExtractError> {
    let module = resolve_module(hint, selector)?;
    extract_module(&module)
}

/// Extracts the schema of an already resolved module.
///
/// # Errors
///
/// Returns [`ExtractError`] when reading or parsing fails.
pub fn extract_module(module: &ResolvedModule) -> Result<ContractSchema, ExtractError> {
    let source = read_artifact(&module.artifact)?;
    parse_artifact(&module.name, &module.artifact, &source)
}

/// Parses artifact text into a schema named `name`.
///
/// `path` is only used to label parse errors.
///
/// # Errors
///
/// Returns [`ExtractError::ParseError`] when the mandatory declaration groups
/// are missing or malformed.
pub fn parse_artifact(
    name: &str,
    path: &Path,
    source: &str,
) -> Result<ContractSchema, ExtractError> {
    parser::parse_schema(name, source).map_err(|err| ExtractError::ParseError {
        path: path.display().to_string(),
        line: err.line,
        message: err.message,
    })
}
