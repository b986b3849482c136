// crates/veil-wrapper-gen/src/lib.rs
// ============================================================================
// Module: Wrapper Generator Library
// Description: Deterministic TypeScript wrapper generator for contract schemas.
// Purpose: Emit typed API wrappers and schema mirrors from a contract schema.
// Dependencies: serde_json, thiserror, time, veil-core
// ============================================================================

//! ## Overview
//! This crate renders one TypeScript module per contract schema. The module
//! holds a `GeneratedAPIWrappers` class with one runtime-checked wrapper per
//! operation, a `FunctionParameters` tuple map, a `ContractState` ledger
//! mirror, the `DeployedContractHandle` surface the wrappers delegate to, and
//! a `CONTRACT_METADATA` constant.
//!
//! ### Design Notes
//! - Output is deterministic: re-rendering an unchanged schema differs only in
//!   the single `// Generated on:` line.
//! - Unrecognized contract types render as `any`; no type is guessed.
//! - Writes are atomic; a failed generation leaves any earlier artifact intact.
//!
//! ## Index
//! - Public API: [`WrapperGenerator`], [`WrapperGenError`], [`DEFAULT_WRAPPER_PATH`]
//! - Output: [`write_output`], [`check_output`], [`strip_timestamp`]

// ============================================================================
// SECTION: Modules
// ============================================================================

mod output;
mod render;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;

use thiserror::Error;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use veil_core::ContractSchema;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use output::check_output;
pub use output::strip_timestamp;
pub use output::write_output;
pub use render::typescript_type;

// ============================================================================
// SECTION: Public API
// ============================================================================

/// Default wrapper output path relative to the project root.
pub const DEFAULT_WRAPPER_PATH: &str = "contract-cli/src/generated-api-wrappers.ts";

/// Prefix of the single timestamp line in generated output.
pub const TIMESTAMP_PREFIX: &str = "// Generated on: ";

/// Errors raised by the wrapper generator.
///
/// # Invariants
/// - Variant meanings are stable for automation and tests.
///
/// # Examples
/// ```
/// use veil_wrapper_gen::WrapperGenError;
///
/// let err = WrapperGenError::Drift {
///     path: "out.ts".to_string(),
/// };
/// assert!(err.to_string().contains("out.ts"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WrapperGenError {
    /// IO error while reading or writing files.
    #[error("io error: {0}")]
    Io(String),
    /// JSON serialization error.
    #[error("json error: {0}")]
    Json(String),
    /// Timestamp could not be formatted.
    #[error("timestamp error: {0}")]
    Timestamp(String),
    /// On-disk wrappers differ from a fresh rendering.
    #[error("wrapper drift detected for {path}; run `veil generate`")]
    Drift {
        /// Path of the drifted artifact.
        path: String,
    },
}

/// Wrapper generator bound to one contract schema.
///
/// # Invariants
/// - Rendering is deterministic for a fixed schema and timestamp.
#[derive(Debug, Clone, Copy)]
pub struct WrapperGenerator<'a> {
    /// Schema the wrappers mirror.
    schema: &'a ContractSchema,
}

impl<'a> WrapperGenerator<'a> {
    /// Creates a generator for `schema`.
    #[must_use]
    pub const fn new(schema: &'a ContractSchema) -> Self {
        Self {
            schema,
        }
    }

    /// Renders the wrapper module stamped with `generated_at`.
    ///
    /// # Errors
    ///
    /// Returns [`WrapperGenError`] when the timestamp or metadata cannot be
    /// serialized.
    pub fn render(&self, generated_at: OffsetDateTime) -> Result<String, WrapperGenError> {
        let timestamp = generated_at
            .format(&Rfc3339)
            .map_err(|err| WrapperGenError::Timestamp(err.to_string()))?;
        render::render_module(self.schema, &timestamp)
    }

    /// Renders with the current time and writes the module to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`WrapperGenError`] when rendering or the atomic write fails.
    pub fn generate(&self, path: &Path) -> Result<(), WrapperGenError> {
        let contents = self.render(OffsetDateTime::now_utc())?;
        write_output(path, &contents)
    }

    /// Checks `path` for drift against a fresh rendering.
    ///
    /// # Errors
    ///
    /// Returns [`WrapperGenError::Drift`] when the contents differ outside the
    /// timestamp line, or [`WrapperGenError::Io`] when the file is unreadable.
    pub fn check(&self, path: &Path) -> Result<(), WrapperGenError> {
        let contents = self.render(OffsetDateTime::now_utc())?;
        check_output(path, &contents)
    }
}
