// crates/veil-cli/tests/common/mod.rs
// ============================================================================
// Module: Common CLI Test Fixtures
// Description: Schema fixtures, a scripted contract handle, and a recording sink.
// Purpose: Drive menus and sessions without a live gateway.
// Dependencies: async-trait, serde_json, veil-core
// ============================================================================

//! ## Overview
//! [`ScriptedHandle`] answers calls from a queue of canned results and keeps
//! a log of every call it received. [`RecordingSink`] keeps every session
//! event in memory.

#![allow(dead_code, reason = "Shared test helpers may be unused in some cases.")]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;
use veil_core::ArgValue;
use veil_core::ContractHandle;
use veil_core::ContractSchema;
use veil_core::FinalizedTransaction;
use veil_core::HandleError;
use veil_core::Mutability;
use veil_core::Operation;
use veil_core::Parameter;
use veil_core::SessionEvent;
use veil_core::SessionEventKind;
use veil_core::SessionLogSink;
use veil_core::TypeToken;

// ============================================================================
// SECTION: Schema Fixtures
// ============================================================================

/// Builds an operation without a description.
fn operation(
    name: &str,
    parameters: Vec<Parameter>,
    return_type: &str,
    mutability: Mutability,
) -> Operation {
    Operation {
        name: name.to_string(),
        parameters,
        return_type: TypeToken::new(return_type),
        mutability,
        description: None,
    }
}

/// Voting contract: `vote`, `get_votes`, `set_threshold`, `choose`.
pub fn voting_schema() -> ContractSchema {
    let operations = vec![
        operation("vote", Vec::new(), "[]", Mutability::Mutating),
        operation("get_votes", Vec::new(), "Uint<64>", Mutability::ReadOnly),
        operation(
            "set_threshold",
            vec![Parameter::new("threshold", "Uint<64>")],
            "[]",
            Mutability::Mutating,
        ),
        operation(
            "choose",
            vec![Parameter::new("option", "Uint<0..3>")],
            "[]",
            Mutability::Mutating,
        ),
    ];
    let mut ledger = BTreeMap::new();
    ledger.insert("votes".to_string(), TypeToken::new("Counter"));
    ledger.insert("owner".to_string(), TypeToken::new("Bytes<32>"));
    ContractSchema::new("voting", operations, ledger, Vec::new()).unwrap()
}

/// Contract whose choice-named parameters are not integers: `pick`, `flag`.
pub fn picker_schema() -> ContractSchema {
    let operations = vec![
        operation(
            "pick",
            vec![Parameter::new("choice", "Bytes<32>")],
            "[]",
            Mutability::Mutating,
        ),
        operation(
            "flag",
            vec![Parameter::new("option", "Boolean")],
            "[]",
            Mutability::Mutating,
        ),
    ];
    ContractSchema::new("picker", operations, BTreeMap::new(), Vec::new()).unwrap()
}

// ============================================================================
// SECTION: Scripted Handle
// ============================================================================

/// One call received by a [`ScriptedHandle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    /// `submit`, `query`, or `ledger`.
    pub method: &'static str,
    /// Operation name (empty for ledger reads).
    pub operation: String,
    /// Arguments passed.
    pub args: Vec<ArgValue>,
}

/// Contract handle that replays queued results.
#[derive(Default)]
pub struct ScriptedHandle {
    /// Results returned in order.
    responses: Mutex<VecDeque<Result<Value, HandleError>>>,
    /// Calls received in order.
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedHandle {
    /// Creates a handle that answers with `responses` in order.
    pub fn new(responses: Vec<Result<Value, HandleError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Returns every call received so far.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Records a call and pops the next scripted result.
    fn next(
        &self,
        method: &'static str,
        operation: &str,
        args: &[ArgValue],
    ) -> Result<Value, HandleError> {
        self.calls.lock().unwrap().push(RecordedCall {
            method,
            operation: operation.to_string(),
            args: args.to_vec(),
        });
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(HandleError::Protocol("unscripted call".to_string())))
    }
}

#[async_trait]
impl ContractHandle for ScriptedHandle {
    async fn submit(
        &self,
        operation: &str,
        args: &[ArgValue],
    ) -> Result<FinalizedTransaction, HandleError> {
        let value = self.next("submit", operation, args)?;
        serde_json::from_value(value).map_err(|err| HandleError::Protocol(err.to_string()))
    }

    async fn query(&self, operation: &str, args: &[ArgValue]) -> Result<Value, HandleError> {
        self.next("query", operation, args)
    }

    async fn ledger_state(&self) -> Result<BTreeMap<String, Value>, HandleError> {
        let value = self.next("ledger", "", &[])?;
        serde_json::from_value(value).map_err(|err| HandleError::Protocol(err.to_string()))
    }
}

/// Receipt payload in the gateway's wire shape.
pub fn receipt(tx_id: &str, block_height: u64) -> Value {
    serde_json::json!({ "txId": tx_id, "blockHeight": block_height })
}

// ============================================================================
// SECTION: Recording Sink
// ============================================================================

/// Session sink that keeps events in memory.
#[derive(Default)]
pub struct RecordingSink {
    /// Recorded events.
    events: Mutex<Vec<SessionEvent>>,
}

impl RecordingSink {
    /// Returns the recorded event payloads in order.
    pub fn kinds(&self) -> Vec<SessionEventKind> {
        self.events.lock().unwrap().iter().map(|event| event.kind.clone()).collect()
    }
}

impl SessionLogSink for RecordingSink {
    fn record(&self, event: &SessionEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}
