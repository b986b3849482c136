// crates/veil-cli/src/lib.rs
// ============================================================================
// Module: Veil CLI Library
// Description: Shared components for the Veil command-line interface.
// Purpose: Provide the menu builder, session runner, gateway handle, and i18n.
// Dependencies: veil-core, reqwest, serde_json
// ============================================================================

//! ## Overview
//! This library houses the interactive pieces of the `veil` binary so they
//! can be tested without a terminal: the [`menu`] builder turns a schema into
//! numbered actions, the [`runner`] drives a session over any reader/writer
//! pair, and the [`gateway`] module reaches a deployed contract over
//! JSON-RPC. All user-facing text goes through the [`i18n`] catalog.

// ============================================================================
// SECTION: Modules
// ============================================================================

/// JSON-RPC contract handle.
pub mod gateway;
/// Internationalization helpers and message catalog.
pub mod i18n;
/// Schema to menu transform.
pub mod menu;
/// Interactive session state machine.
pub mod runner;
