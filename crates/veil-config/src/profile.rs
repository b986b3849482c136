// crates/veil-config/src/profile.rs
// ============================================================================
// Module: Network Profiles
// Description: Named deployment targets and their endpoint presets.
// Purpose: Resolve the services a session talks to from one profile name.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A profile names where the contract lives. Each profile carries fixed
//! presets for the indexer, the node, the proof server, the default gateway,
//! and the session log directory. Only the gateway is contacted directly;
//! the other endpoints are reported so operators can confirm the target.

use serde::Deserialize;
use serde::Serialize;

/// Deployment target for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NetworkProfile {
    /// Fully local stack (node, indexer, proof server on loopback).
    #[default]
    Standalone,
    /// Local proof server and indexer against a local testnet node.
    TestnetLocal,
    /// Public testnet services with a local proof server.
    TestnetRemote,
}

/// Endpoint presets for a [`NetworkProfile`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkEndpoints {
    /// Indexer GraphQL endpoint.
    pub indexer: &'static str,
    /// Indexer GraphQL WebSocket endpoint.
    pub indexer_ws: &'static str,
    /// Node RPC endpoint.
    pub node: &'static str,
    /// Proof server endpoint.
    pub proof_server: &'static str,
    /// Default contract gateway endpoint.
    pub gateway: &'static str,
    /// Default directory for session logs.
    pub log_dir: &'static str,
}

impl NetworkProfile {
    /// Returns the canonical profile label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Standalone => "standalone",
            Self::TestnetLocal => "testnet-local",
            Self::TestnetRemote => "testnet-remote",
        }
    }

    /// Returns the endpoint presets for this profile.
    #[must_use]
    pub const fn endpoints(self) -> NetworkEndpoints {
        match self {
            Self::Standalone => NetworkEndpoints {
                indexer: "http://127.0.0.1:8088/api/v1/graphql",
                indexer_ws: "ws://127.0.0.1:8088/api/v1/graphql/ws",
                node: "http://127.0.0.1:9944",
                proof_server: "http://127.0.0.1:6300",
                gateway: "http://127.0.0.1:6310/rpc",
                log_dir: "logs/standalone",
            },
            Self::TestnetLocal => NetworkEndpoints {
                indexer: "http://127.0.0.1:8088/api/v1/graphql",
                indexer_ws: "ws://127.0.0.1:8088/api/v1/graphql/ws",
                node: "http://127.0.0.1:9944",
                proof_server: "http://127.0.0.1:6300",
                gateway: "http://127.0.0.1:6310/rpc",
                log_dir: "logs/testnet-local",
            },
            Self::TestnetRemote => NetworkEndpoints {
                indexer: "https://indexer.testnet-02.midnight.network/api/v1/graphql",
                indexer_ws: "wss://indexer.testnet-02.midnight.network/api/v1/graphql/ws",
                node: "https://rpc.testnet-02.midnight.network",
                proof_server: "http://127.0.0.1:6300",
                gateway: "http://127.0.0.1:6310/rpc",
                log_dir: "logs/testnet-remote",
            },
        }
    }
}

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
    fn remote_profile_keeps_proof_server_local() {
        let endpoints = NetworkProfile::TestnetRemote.endpoints();
        assert!(endpoints.node.starts_with("https://"));
        assert!(endpoints.proof_server.starts_with("http://127.0.0.1"));
    }

    #[test]
    fn profiles_have_distinct_log_dirs() {
        let dirs = [
            NetworkProfile::Standalone.endpoints().log_dir,
            NetworkProfile::TestnetLocal.endpoints().log_dir,
            NetworkProfile::TestnetRemote.endpoints().log_dir,
        ];
        assert_ne!(dirs[0], dirs[1]);
        assert_ne!(dirs[1], dirs[2]);
        assert!(dirs[2].ends_with(NetworkProfile::TestnetRemote.as_str()));
    }
}
