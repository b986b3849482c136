// crates/veil-core/src/lib.rs
// ============================================================================
// Module: Veil Core Library
// Description: Contract schema model, type mapping, and live-handle interfaces.
// Purpose: Provide the shared vocabulary for extraction, menus, and codegen.
// Dependencies: async-trait, bigdecimal, hex, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! `veil-core` defines the normalized contract schema that every other Veil
//! crate consumes: operations with their mutability classification, ledger
//! fields, and witness bindings. It also owns the type mapper that folds raw
//! type tokens into a closed set of semantic kinds, the coercion of operator
//! text into typed argument values, and the narrow async interface through
//! which a live contract instance is invoked.
//!
//! Security posture: type tokens and operator input are untrusted text; the
//! mapper is total and coercion fails closed.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod events;
pub mod interfaces;
pub mod schema;
pub mod types;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use events::FileSessionLogSink;
pub use events::NoopSessionLogSink;
pub use events::SessionEvent;
pub use events::SessionEventKind;
pub use events::SessionLogSink;
pub use events::StderrSessionLogSink;
pub use interfaces::ContractHandle;
pub use interfaces::FinalizedTransaction;
pub use interfaces::HandleError;
pub use schema::ContractSchema;
pub use schema::DeclarationGroup;
pub use schema::DeclarationGroups;
pub use schema::Mutability;
pub use schema::Operation;
pub use schema::Parameter;
pub use schema::SchemaError;
pub use schema::TypeToken;
pub use schema::Witness;
pub use schema::default_description;
pub use types::ArgValue;
pub use types::CoercionError;
pub use types::IntegerRange;
pub use types::SemanticKind;
pub use types::coerce;
pub use types::map_type;
