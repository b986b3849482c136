// crates/veil-config/src/lib.rs
// ============================================================================
// Module: Veil Config Library
// Description: Canonical config model and validation for veil.toml.
// Purpose: Single source of truth for contract, wrapper, network, and logging settings.
// Dependencies: serde, toml, veil-wrapper-gen
// ============================================================================

//! ## Overview
//! `veil-config` defines the configuration model for the Veil contract shell.
//! Configuration is read from TOML with strict size and path limits and is
//! validated fail-closed: unknown keys, malformed URLs, and out-of-range
//! timeouts are rejected rather than defaulted.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod profile;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use profile::NetworkEndpoints;
pub use profile::NetworkProfile;
