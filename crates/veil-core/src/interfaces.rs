// crates/veil-core/src/interfaces.rs
// ============================================================================
// Module: Live Contract Handle Interface
// Description: Narrow async surface for invoking a deployed contract.
// Purpose: Decouple sessions from wallet, proof, and chain plumbing.
// Dependencies: async-trait, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! A [`ContractHandle`] exposes the three calls a session needs: submit a
//! mutating operation and wait for settlement, evaluate a read-only
//! operation, and read the current ledger values. Proof generation, wallet
//! management, and chain synchronization live behind implementations of this
//! trait and never leak into the session state machine.
//!
//! Timeouts belong to the implementation. Implementations must surface them
//! as [`HandleError::Timeout`] instead of blocking indefinitely.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::types::ArgValue;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Settlement receipt returned by a mutating operation.
///
/// # Invariants
/// - `tx_id` is non-empty when produced by a conforming handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalizedTransaction {
    /// Transaction identifier.
    pub tx_id: String,
    /// Block height the transaction was included in.
    pub block_height: u64,
    /// Block hash when reported by the provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_hash: Option<String>,
}

/// Errors reported by a live contract handle.
///
/// # Invariants
/// - Only [`HandleError::ConnectionLost`] is non-retriable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandleError {
    /// Temporary provider failure.
    #[error("transient provider failure: {0}")]
    Transient(String),
    /// Provider did not answer in time.
    #[error("provider timed out: {0}")]
    Timeout(String),
    /// Provider rejected the call (for example, a failed contract assertion).
    #[error("call rejected: {0}")]
    Rejected(String),
    /// Provider returned a malformed response.
    #[error("provider protocol error: {0}")]
    Protocol(String),
    /// Connection to the provider is gone and will not recover.
    #[error("connection lost: {0}")]
    ConnectionLost(String),
}

impl HandleError {
    /// Returns true when the session can keep using the handle.
    #[must_use]
    pub const fn is_retriable(&self) -> bool {
        !matches!(self, Self::ConnectionLost(_))
    }
}

// ============================================================================
// SECTION: Handle Trait
// ============================================================================

/// Live contract instance reached through an external provider.
#[async_trait]
pub trait ContractHandle: Send + Sync {
    /// Submits a mutating operation and waits for settlement.
    ///
    /// # Errors
    ///
    /// Returns [`HandleError`] when submission or settlement fails.
    async fn submit(
        &self,
        operation: &str,
        args: &[ArgValue],
    ) -> Result<FinalizedTransaction, HandleError>;

    /// Evaluates a read-only operation.
    ///
    /// # Errors
    ///
    /// Returns [`HandleError`] when evaluation fails.
    async fn query(&self, operation: &str, args: &[ArgValue]) -> Result<Value, HandleError>;

    /// Reads the current ledger values keyed by field name.
    ///
    /// # Errors
    ///
    /// Returns [`HandleError`] when the ledger cannot be read.
    async fn ledger_state(&self) -> Result<BTreeMap<String, Value>, HandleError>;
}
