// crates/veil-cli/src/gateway.rs
// ============================================================================
// Module: Contract Gateway Handle
// Description: JSON-RPC over HTTP implementation of the contract handle.
// Purpose: Reach a deployed contract through a proof/wallet gateway service.
// Dependencies: reqwest, serde, serde_json, veil-core
// ============================================================================

//! ## Overview
//! [`GatewayHandle`] speaks JSON-RPC 2.0 over HTTP POST to a gateway that
//! owns proving, wallet balancing, and chain submission. Methods are
//! `contract_submit`, `contract_query`, and `contract_ledger`; arguments are
//! encoded with [`ArgValue::to_json`].
//!
//! Security posture: gateway responses are untrusted; bodies are capped at
//! [`MAX_GATEWAY_RESPONSE_BYTES`] and malformed payloads fail closed as
//! protocol errors.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use reqwest::header::HeaderValue;
use reqwest::redirect::Policy;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use serde_json::json;
use veil_core::ArgValue;
use veil_core::ContractHandle;
use veil_core::FinalizedTransaction;
use veil_core::HandleError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum gateway response body size.
pub const MAX_GATEWAY_RESPONSE_BYTES: usize = 1024 * 1024;
/// JSON-RPC error code for a lost provider connection.
pub const CONNECTION_LOST_CODE: i64 = -32010;
/// JSON-RPC error code for a rejected call.
pub const REJECTED_CODE: i64 = -32011;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Gateway connection settings.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// JSON-RPC endpoint URL.
    pub endpoint: String,
    /// Deployed contract address.
    pub contract_address: String,
    /// TCP connect timeout.
    pub connect_timeout: Duration,
    /// Whole-request timeout.
    pub request_timeout: Duration,
}

/// Contract handle backed by a JSON-RPC gateway.
///
/// # Invariants
/// - Request ids are strictly increasing per handle.
pub struct GatewayHandle {
    /// Reqwest client instance.
    client: Client,
    /// Endpoint URL.
    endpoint: String,
    /// Deployed contract address.
    contract_address: String,
    /// Next JSON-RPC request identifier.
    next_id: AtomicU64,
}

/// JSON-RPC request envelope.
#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    /// JSON-RPC version tag.
    jsonrpc: &'static str,
    /// Request identifier.
    id: u64,
    /// Method name to invoke.
    method: &'a str,
    /// Parameters payload.
    params: Value,
}

/// JSON-RPC response envelope.
#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    /// Optional result payload.
    result: Option<Value>,
    /// Optional error payload.
    error: Option<JsonRpcError>,
}

/// JSON-RPC error payload.
#[derive(Debug, Deserialize)]
struct JsonRpcError {
    /// Error code.
    code: i64,
    /// Error message provided by the gateway.
    message: String,
}

// ============================================================================
// SECTION: Client
// ============================================================================

impl GatewayHandle {
    /// Builds a gateway handle.
    ///
    /// # Errors
    ///
    /// Returns [`HandleError::Protocol`] when the HTTP client cannot be built.
    pub fn new(config: GatewayConfig) -> Result<Self, HandleError> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .redirect(Policy::none())
            .build()
            .map_err(|err| HandleError::Protocol(err.to_string()))?;
        Ok(Self {
            client,
            endpoint: config.endpoint,
            contract_address: config.contract_address,
            next_id: AtomicU64::new(1),
        })
    }

    /// Builds the `{address, operation, args}` parameter object.
    fn operation_params(&self, operation: &str, args: &[ArgValue]) -> Value {
        let args: Vec<Value> = args.iter().map(ArgValue::to_json).collect();
        json!({
            "address": self.contract_address,
            "operation": operation,
            "args": args,
        })
    }

    /// Sends one JSON-RPC call and returns its result payload.
    async fn call(&self, method: &str, params: Value) -> Result<Value, HandleError> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };
        let payload = serde_json::to_vec(&request)
            .map_err(|err| HandleError::Protocol(format!("jsonrpc serialization failed: {err}")))?;
        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .body(payload)
            .send()
            .await
            .map_err(|err| classify_transport_error(&err))?;
        let status = response.status();
        let body = read_response_body_with_limit(response, MAX_GATEWAY_RESPONSE_BYTES).await?;
        if !status.is_success() {
            let preview = String::from_utf8_lossy(&body);
            let message = format!("http status {}: {}", status.as_u16(), preview.trim());
            if status.is_server_error() {
                return Err(HandleError::Transient(message));
            }
            return Err(HandleError::Protocol(message));
        }
        decode_response(&body)
    }
}

#[async_trait]
impl ContractHandle for GatewayHandle {
    async fn submit(
        &self,
        operation: &str,
        args: &[ArgValue],
    ) -> Result<FinalizedTransaction, HandleError> {
        let result = self.call("contract_submit", self.operation_params(operation, args)).await?;
        serde_json::from_value(result)
            .map_err(|err| HandleError::Protocol(format!("invalid transaction receipt: {err}")))
    }

    async fn query(&self, operation: &str, args: &[ArgValue]) -> Result<Value, HandleError> {
        self.call("contract_query", self.operation_params(operation, args)).await
    }

    async fn ledger_state(&self) -> Result<BTreeMap<String, Value>, HandleError> {
        let params = json!({ "address": self.contract_address });
        let result = self.call("contract_ledger", params).await?;
        serde_json::from_value(result)
            .map_err(|err| HandleError::Protocol(format!("invalid ledger payload: {err}")))
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Maps a reqwest send failure to a handle error.
fn classify_transport_error(err: &reqwest::Error) -> HandleError {
    if err.is_timeout() {
        return HandleError::Timeout(err.to_string());
    }
    if err.is_connect() {
        return HandleError::ConnectionLost(err.to_string());
    }
    HandleError::Transient(err.to_string())
}

/// Maps a JSON-RPC error object to a handle error.
fn classify_rpc_error(error: JsonRpcError) -> HandleError {
    match error.code {
        CONNECTION_LOST_CODE => HandleError::ConnectionLost(error.message),
        REJECTED_CODE => HandleError::Rejected(error.message),
        code => HandleError::Protocol(format!("gateway error {code}: {}", error.message)),
    }
}

/// Decodes a JSON-RPC response body into its result payload.
fn decode_response(body: &[u8]) -> Result<Value, HandleError> {
    let response: JsonRpcResponse = serde_json::from_slice(body)
        .map_err(|err| HandleError::Protocol(format!("invalid json-rpc response: {err}")))?;
    if let Some(error) = response.error {
        return Err(classify_rpc_error(error));
    }
    response
        .result
        .ok_or_else(|| HandleError::Protocol("missing result in json-rpc response".to_string()))
}

/// Reads a response body while enforcing a hard byte limit.
async fn read_response_body_with_limit(
    mut response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, HandleError> {
    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await.map_err(|err| classify_transport_error(&err))? {
        let next_total = body.len().saturating_add(chunk.len());
        if next_total > limit {
            return Err(HandleError::Protocol(format!(
                "gateway response exceeds size limit ({next_total} > {limit})"
            )));
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

// ============================================================================
// SECTION: Tests
// ============================================================================
