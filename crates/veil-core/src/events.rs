// crates/veil-core/src/events.rs
// ============================================================================
// Module: Session Event Log
// Description: Structured session and generation events with pluggable sinks.
// Purpose: Emit JSON-lines session logs without a hard logging dependency.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Sessions and generation runs describe what they did through
//! [`SessionEvent`] records. Events are routed to a [`SessionLogSink`]
//! selected by configuration: stderr, an append-only JSON-lines file, or
//! nowhere. Sink failures are swallowed; logging never aborts a session.
//!
//! Argument values are not logged. Events carry operation names, counts, and
//! outcome labels only.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Kind-specific payload of a session event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEventKind {
    /// Interactive session started.
    SessionStarted {
        /// Contract module name.
        contract: String,
        /// Number of operations offered.
        operations: usize,
    },
    /// Interactive session ended.
    SessionEnded {
        /// Termination reason label.
        reason: String,
        /// Invocations attempted.
        attempted: usize,
        /// Invocations that failed.
        failures: usize,
    },
    /// Operation invocation started.
    InvocationStarted {
        /// Operation name.
        operation: String,
        /// Whether the operation mutates ledger state.
        mutating: bool,
    },
    /// Operation invocation succeeded.
    InvocationSucceeded {
        /// Operation name.
        operation: String,
        /// Transaction identifier for mutating operations.
        tx_id: Option<String>,
        /// Block height for mutating operations.
        block_height: Option<u64>,
    },
    /// Operation invocation failed.
    InvocationFailed {
        /// Operation name.
        operation: String,
        /// Failure message.
        error: String,
    },
    /// Wrapper source written or checked.
    WrapperGenerated {
        /// Contract module name.
        contract: String,
        /// Output path.
        output: String,
        /// Number of wrapper methods emitted.
        operations: usize,
    },
}

/// Timestamped session event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionEvent {
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Event payload.
    #[serde(flatten)]
    pub kind: SessionEventKind,
}

impl SessionEvent {
    /// Creates a new event stamped with the current time.
    #[must_use]
    pub fn new(kind: SessionEventKind) -> Self {
        let timestamp_ms =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        Self {
            timestamp_ms,
            kind,
        }
    }
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Sink for session events.
pub trait SessionLogSink: Send + Sync {
    /// Record a session event.
    fn record(&self, event: &SessionEvent);
}

/// Sink that logs JSON lines to stderr.
pub struct StderrSessionLogSink;

impl SessionLogSink for StderrSessionLogSink {
    fn record(&self, event: &SessionEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(io::stderr(), "{payload}");
        }
    }
}

/// Sink that appends JSON lines to a file.
pub struct FileSessionLogSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileSessionLogSink {
    /// Opens the log file in append mode, creating it when missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl SessionLogSink for FileSessionLogSink {
    fn record(&self, event: &SessionEvent) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

/// No-op sink.
pub struct NoopSessionLogSink;

impl SessionLogSink for NoopSessionLogSink {
    fn record(&self, _event: &SessionEvent) {}
}

// ============================================================================
// SECTION: Tests
// ============================================================================
