// crates/veil-cli/tests/gateway.rs
// ============================================================================
// Module: Gateway Handle Tests
// Description: JSON-RPC round trips against a single-shot local HTTP responder.
// Purpose: Prove request shape, receipt decoding, and error classification.
// ============================================================================

//! ## Overview
//! Each test binds a loopback listener that answers exactly one request with
//! a canned status and body, then checks what [`GatewayHandle`] sent and how
//! it classified the answer.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use std::time::Duration;

use serde_json::Value;
use serde_json::json;
use tokio::io::AsyncReadExt;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use veil_cli::gateway::GatewayConfig;
use veil_cli::gateway::GatewayHandle;
use veil_cli::gateway::MAX_GATEWAY_RESPONSE_BYTES;
use veil_core::ArgValue;
use veil_core::ContractHandle;
use veil_core::FinalizedTransaction;
use veil_core::HandleError;

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Contract address used by every test.
const ADDRESS: &str = "0200aabbcc";

/// Builds a handle pointed at `endpoint`.
fn handle_for(endpoint: String) -> GatewayHandle {
    GatewayHandle::new(GatewayConfig {
        endpoint,
        contract_address: ADDRESS.to_string(),
        connect_timeout: Duration::from_secs(2),
        request_timeout: Duration::from_secs(5),
    })
    .unwrap()
}

/// Serves one request and returns the endpoint plus the parsed request body.
async fn spawn_gateway(status: &'static str, body: String) -> (String, JoinHandle<Value>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let task = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let request = read_request_body(&mut stream).await;
        let response = format!(
            "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: \
             {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );
        let _ = stream.write_all(response.as_bytes()).await;
        let _ = stream.shutdown().await;
        serde_json::from_slice(&request).unwrap_or(Value::Null)
    });
    (format!("http://{addr}/rpc"), task)
}

/// Reads one HTTP request and returns its body bytes.
async fn read_request_body(stream: &mut TcpStream) -> Vec<u8> {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let read = stream.read(&mut chunk).await.unwrap();
        if read == 0 {
            return Vec::new();
        }
        buffer.extend_from_slice(&chunk[.. read]);
        let Some(header_end) = buffer.windows(4).position(|window| window == b"\r\n\r\n") else {
            continue;
        };
        let headers = String::from_utf8_lossy(&buffer[.. header_end]).to_ascii_lowercase();
        let length = headers
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .and_then(|value| value.trim().parse::<usize>().ok())
            .unwrap_or(0);
        let body_start = header_end + 4;
        while buffer.len() < body_start + length {
            let read = stream.read(&mut chunk).await.unwrap();
            if read == 0 {
                break;
            }
            buffer.extend_from_slice(&chunk[.. read]);
        }
        return buffer[body_start ..].to_vec();
    }
}

/// Encodes a JSON-RPC success envelope.
fn rpc_result(result: &Value) -> String {
    json!({ "jsonrpc": "2.0", "id": 1, "result": result }).to_string()
}

/// Encodes a JSON-RPC error envelope.
fn rpc_error(code: i64, message: &str) -> String {
    json!({ "jsonrpc": "2.0", "id": 1, "error": { "code": code, "message": message } })
        .to_string()
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[tokio::test]
async fn submit_sends_operation_and_decodes_receipt() {
    let body = rpc_result(&json!({ "txId": "00ff", "blockHeight": 12, "blockHash": "ab" }));
    let (endpoint, server) = spawn_gateway("200 OK", body).await;
    let handle = handle_for(endpoint);

    let receipt = handle
        .submit("vote", &[ArgValue::Integer("1".to_string()), ArgValue::Boolean(false)])
        .await
        .unwrap();
    assert_eq!(
        receipt,
        FinalizedTransaction {
            tx_id: "00ff".to_string(),
            block_height: 12,
            block_hash: Some("ab".to_string()),
        }
    );

    let request = server.await.unwrap();
    assert_eq!(request["jsonrpc"], "2.0");
    assert_eq!(request["method"], "contract_submit");
    assert_eq!(
        request["params"],
        json!({ "address": ADDRESS, "operation": "vote", "args": ["1", false] })
    );
}

#[tokio::test]
async fn query_returns_the_raw_result() {
    let (endpoint, server) = spawn_gateway("200 OK", rpc_result(&json!("42"))).await;
    let value = handle_for(endpoint).query("get_votes", &[]).await.unwrap();
    assert_eq!(value, json!("42"));
    assert_eq!(server.await.unwrap()["method"], "contract_query");
}

#[tokio::test]
async fn ledger_state_sends_address_only() {
    let body = rpc_result(&json!({ "votes": 3, "owner": "0x00" }));
    let (endpoint, server) = spawn_gateway("200 OK", body).await;
    let ledger = handle_for(endpoint).ledger_state().await.unwrap();
    assert_eq!(ledger.get("votes"), Some(&json!(3)));
    assert_eq!(ledger.len(), 2);

    let request = server.await.unwrap();
    assert_eq!(request["method"], "contract_ledger");
    assert_eq!(request["params"], json!({ "address": ADDRESS }));
}

#[tokio::test]
async fn rpc_connection_lost_code_is_not_retriable() {
    let (endpoint, _server) = spawn_gateway("200 OK", rpc_error(-32010, "node gone")).await;
    let err = handle_for(endpoint).query("get_votes", &[]).await.unwrap_err();
    assert_eq!(err, HandleError::ConnectionLost("node gone".to_string()));
    assert!(!err.is_retriable());
}

#[tokio::test]
async fn rpc_rejection_is_retriable() {
    let (endpoint, _server) = spawn_gateway("200 OK", rpc_error(-32011, "already voted")).await;
    let err = handle_for(endpoint).submit("vote", &[]).await.unwrap_err();
    assert_eq!(err, HandleError::Rejected("already voted".to_string()));
    assert!(err.is_retriable());
}

#[tokio::test]
async fn server_errors_are_transient_and_client_errors_are_protocol() {
    let (endpoint, _server) = spawn_gateway("503 Service Unavailable", "busy".to_string()).await;
    let err = handle_for(endpoint).query("get_votes", &[]).await.unwrap_err();
    assert!(matches!(err, HandleError::Transient(message) if message.contains("503")));

    let (endpoint, _server) = spawn_gateway("400 Bad Request", "nope".to_string()).await;
    let err = handle_for(endpoint).query("get_votes", &[]).await.unwrap_err();
    assert!(matches!(err, HandleError::Protocol(message) if message.contains("400")));
}

#[tokio::test]
async fn malformed_receipt_fails_closed() {
    let (endpoint, _server) = spawn_gateway("200 OK", rpc_result(&json!({ "txId": 5 }))).await;
    let err = handle_for(endpoint).submit("vote", &[]).await.unwrap_err();
    assert!(matches!(err, HandleError::Protocol(_)));
}

#[tokio::test]
async fn oversized_response_is_rejected() {
    let body = "x".repeat(MAX_GATEWAY_RESPONSE_BYTES + 1);
    let (endpoint, _server) = spawn_gateway("200 OK", body).await;
    let err = handle_for(endpoint).query("get_votes", &[]).await.unwrap_err();
    assert!(matches!(err, HandleError::Protocol(message) if message.contains("size limit")));
}

#[tokio::test]
async fn refused_connection_is_connection_lost() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let err = handle_for(format!("http://{addr}/rpc")).query("get_votes", &[]).await.unwrap_err();
    assert!(matches!(err, HandleError::ConnectionLost(_)));
}
