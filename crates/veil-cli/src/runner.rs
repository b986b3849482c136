// crates/veil-cli/src/runner.rs
// ============================================================================
// Module: Interactive Runner
// Description: Menu-driven session loop over a live contract handle.
// Purpose: Collect selections and parameters, invoke, and display results.
// Dependencies: veil-core, serde_json
// ============================================================================

//! ## Overview
//! A [`Session`] is a strict state machine over any line-oriented
//! reader/writer pair. Each [`Session::step`] handles exactly one state:
//!
//! - `AwaitingSelection`: print the menu and read a choice.
//! - `CollectingParameters`: read and coerce one parameter value.
//! - `Invoking`: make exactly one call on the contract handle.
//! - `DisplayingResult`: print the outcome.
//! - `Terminated`: the session is over.
//!
//! Bad input re-prompts without advancing. A quit word at a parameter prompt
//! abandons the selected operation and returns to the menu. Handle failures
//! are reported and the session returns to the menu; only a lost connection
//! ends it.
//!
//! Operator input is read with blocking `BufRead` calls on the current task.
//! Only contract invocations are awaited, so a session should be driven from
//! the main task (or a blocking thread), never spawned onto a shared worker.
//!
//! ## Invariants
//! - At most one contract call is outstanding; calls are never pipelined.
//! - Parameter collection completes before invocation.
//! - A result is displayed before the next selection is read.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::io::BufRead;
use std::io::Write;

use serde_json::Value;
use thiserror::Error;
use veil_core::ArgValue;
use veil_core::ContractHandle;
use veil_core::ContractSchema;
use veil_core::FinalizedTransaction;
use veil_core::HandleError;
use veil_core::Parameter;
use veil_core::SemanticKind;
use veil_core::SessionEvent;
use veil_core::SessionEventKind;
use veil_core::SessionLogSink;
use veil_core::coerce;

use crate::menu::LEDGER_ITEM_ID;
use crate::menu::MenuAction;
use crate::menu::MenuItem;
use crate::menu::build_menu;
use crate::menu::is_quit;
use crate::menu::render_menu_question;
use crate::menu::select;
use crate::t;

// ============================================================================
// SECTION: Enumerated Parameters
// ============================================================================

/// Choices offered for vote-style parameters.
pub const VOTE_CHOICES: [&str; 3] = ["Yes", "No", "Abstain"];

/// Parameter names that take an enumerated choice instead of free input.
const ENUMERATED_PARAMETERS: [(&str, &[&str]); 3] =
    [("option", &VOTE_CHOICES), ("vote_option", &VOTE_CHOICES), ("choice", &VOTE_CHOICES)];

/// Returns the enumerated choices for a parameter name, if any.
#[must_use]
pub fn enumerated_choices(parameter: &str) -> Option<&'static [&'static str]> {
    ENUMERATED_PARAMETERS.iter().find(|(name, _)| *name == parameter).map(|(_, choices)| *choices)
}

/// Returns true when a parameter of this kind can carry a choice index.
///
/// The choice table is keyed by name only, so it is skipped for kinds that
/// cannot hold the zero-based index.
#[must_use]
pub const fn accepts_choice_index(kind: &SemanticKind) -> bool {
    matches!(kind, SemanticKind::Integer { .. } | SemanticKind::OpaqueUnknown { .. })
}

/// Resolves a choice by 1-based number or case-insensitive label to its index.
#[must_use]
pub fn resolve_choice(choices: &[&str], input: &str) -> Option<usize> {
    let trimmed = input.trim();
    if let Ok(number) = trimmed.parse::<usize>() {
        if number == 0 || number > choices.len() {
            return None;
        }
        return Some(number - 1);
    }
    choices.iter().position(|choice| choice.eq_ignore_ascii_case(trimmed))
}

// ============================================================================
// SECTION: Types
// ============================================================================

/// Runner states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerState {
    /// Waiting for a menu choice.
    AwaitingSelection,
    /// Reading parameter values for the selected operation.
    CollectingParameters,
    /// Calling the contract handle.
    Invoking,
    /// Printing the last outcome.
    DisplayingResult,
    /// Session finished.
    Terminated,
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    /// Operator chose to quit.
    OperatorQuit,
    /// Input reached end-of-file.
    InputClosed,
    /// The contract handle reported a non-retriable lost connection.
    ConnectionLost,
}

impl TerminationReason {
    /// Returns a stable label for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OperatorQuit => "operator_quit",
            Self::InputClosed => "input_closed",
            Self::ConnectionLost => "connection_lost",
        }
    }
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a finished session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSummary {
    /// Contract calls attempted, including ledger reads.
    pub attempted: usize,
    /// Contract calls that failed.
    pub failures: usize,
    /// Why the session ended.
    pub reason: TerminationReason,
}

/// Recoverable session errors reported to the operator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// Menu input did not match any item.
    #[error("invalid selection: '{0}'")]
    InvalidSelection(String),
    /// Parameter input could not be coerced.
    #[error("invalid value for {parameter}: {message}")]
    InvalidParameterValue {
        /// Parameter name.
        parameter: String,
        /// Coercion failure.
        message: String,
    },
    /// The contract handle reported an error.
    #[error("{operation} failed: {error}")]
    InvocationFailed {
        /// Operation or menu item id.
        operation: String,
        /// Underlying handle error.
        error: HandleError,
    },
}

/// Result of one contract call, held until displayed.
enum Outcome {
    /// Settled transaction.
    Transaction(FinalizedTransaction),
    /// Query return value.
    Value(Value),
    /// Ledger field values.
    Ledger(BTreeMap<String, Value>),
}

// ============================================================================
// SECTION: Session
// ============================================================================

/// Interactive session over one schema and one live handle.
pub struct Session<'a, R, W> {
    /// Schema borrowed for the session lifetime.
    schema: &'a ContractSchema,
    /// Live contract handle.
    handle: &'a dyn ContractHandle,
    /// Session event sink.
    sink: &'a dyn SessionLogSink,
    /// Menu built once per session.
    menu: Vec<MenuItem>,
    /// Operator input.
    input: R,
    /// Operator output.
    output: W,
    /// Current state.
    state: RunnerState,
    /// Selected menu index.
    selected: Option<usize>,
    /// Arguments collected so far for the selected operation.
    args: Vec<ArgValue>,
    /// Outcome awaiting display.
    outcome: Option<Outcome>,
    /// Calls attempted.
    attempted: usize,
    /// Calls failed.
    failures: usize,
    /// Termination reason once terminated.
    reason: Option<TerminationReason>,
}

impl<'a, R: BufRead, W: Write> Session<'a, R, W> {
    /// Creates a session in the `AwaitingSelection` state.
    pub fn new(
        schema: &'a ContractSchema,
        handle: &'a dyn ContractHandle,
        sink: &'a dyn SessionLogSink,
        input: R,
        output: W,
    ) -> Self {
        Self {
            schema,
            handle,
            sink,
            menu: build_menu(schema),
            input,
            output,
            state: RunnerState::AwaitingSelection,
            selected: None,
            args: Vec::new(),
            outcome: None,
            attempted: 0,
            failures: 0,
            reason: None,
        }
    }

    /// Returns the current state.
    #[must_use]
    pub const fn state(&self) -> RunnerState {
        self.state
    }

    /// Returns the parameter the next input line will be read for.
    #[must_use]
    pub fn pending_parameter(&self) -> Option<&Parameter> {
        if self.state != RunnerState::CollectingParameters {
            return None;
        }
        self.selected_operation_index()
            .and_then(|index| self.schema.operations.get(index))
            .and_then(|operation| operation.parameters.get(self.args.len()))
    }

    /// Returns the counters and termination reason so far.
    #[must_use]
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            attempted: self.attempted,
            failures: self.failures,
            reason: self.reason.unwrap_or(TerminationReason::InputClosed),
        }
    }

    /// Runs the session until it terminates.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when operator input or output fails.
    pub async fn run(mut self) -> io::Result<SessionSummary> {
        self.sink.record(&SessionEvent::new(SessionEventKind::SessionStarted {
            contract: self.schema.name.clone(),
            operations: self.schema.operations.len(),
        }));
        let result = self.run_to_end().await;
        let summary = self.summary();
        self.sink.record(&SessionEvent::new(SessionEventKind::SessionEnded {
            reason: summary.reason.as_str().to_string(),
            attempted: summary.attempted,
            failures: summary.failures,
        }));
        result.map(|()| summary)
    }

    /// Steps until the `Terminated` state.
    async fn run_to_end(&mut self) -> io::Result<()> {
        while self.step().await? != RunnerState::Terminated {}
        Ok(())
    }

    /// Handles the current state once and returns the next state.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when operator input or output fails.
    pub async fn step(&mut self) -> io::Result<RunnerState> {
        let next = match self.state {
            RunnerState::AwaitingSelection => self.await_selection()?,
            RunnerState::CollectingParameters => self.collect_parameter()?,
            RunnerState::Invoking => self.invoke().await?,
            RunnerState::DisplayingResult => self.display_result()?,
            RunnerState::Terminated => RunnerState::Terminated,
        };
        self.state = next;
        Ok(next)
    }

    // ------------------------------------------------------------------------
    // States
    // ------------------------------------------------------------------------

    /// Prints the menu and reads one selection.
    fn await_selection(&mut self) -> io::Result<RunnerState> {
        let question = render_menu_question(&self.menu);
        self.output.write_all(question.as_bytes())?;
        self.prompt(&t!("runner.prompt"))?;
        let Some(line) = self.read_line()? else {
            return Ok(self.terminate(TerminationReason::InputClosed));
        };
        if is_quit(&line) {
            writeln!(self.output, "{}", t!("runner.goodbye"))?;
            return Ok(self.terminate(TerminationReason::OperatorQuit));
        }
        let Some(index) = select(&self.menu, &line) else {
            self.report(&SessionError::InvalidSelection(line.trim().to_string()))?;
            return Ok(RunnerState::AwaitingSelection);
        };
        self.selected = Some(index);
        self.args.clear();
        let needs_parameters = self
            .selected_operation_index()
            .and_then(|op_index| self.schema.operations.get(op_index))
            .is_some_and(|operation| !operation.parameters.is_empty());
        if needs_parameters {
            return Ok(RunnerState::CollectingParameters);
        }
        Ok(RunnerState::Invoking)
    }

    /// Reads and coerces the next pending parameter.
    fn collect_parameter(&mut self) -> io::Result<RunnerState> {
        let Some(parameter) = self.pending_parameter().cloned() else {
            return Ok(RunnerState::Invoking);
        };
        let kind = parameter.ty.kind();
        let choices =
            enumerated_choices(&parameter.name).filter(|_| accepts_choice_index(&kind));
        if let Some(choices) = choices {
            let listed = choices.join(", ");
            writeln!(
                self.output,
                "{}",
                t!("runner.param.choices", name = parameter.name, choices = listed)
            )?;
            for (index, label) in choices.iter().enumerate() {
                writeln!(
                    self.output,
                    "{}",
                    t!("runner.param.choice", number = index + 1, label = label)
                )?;
            }
        }
        self.prompt(&t!("runner.param.prompt", name = parameter.name, kind = kind.label()))?;
        let Some(line) = self.read_line()? else {
            return Ok(self.terminate(TerminationReason::InputClosed));
        };
        if is_quit(&line) {
            writeln!(self.output, "{}", t!("runner.param.cancelled"))?;
            self.selected = None;
            self.args.clear();
            return Ok(RunnerState::AwaitingSelection);
        }
        let raw = match choices {
            Some(choices) => match resolve_choice(choices, &line) {
                Some(index) => index.to_string(),
                None => {
                    self.report(&SessionError::InvalidParameterValue {
                        parameter: parameter.name.clone(),
                        message: format!("expected one of {}", choices.join(", ")),
                    })?;
                    return Ok(RunnerState::CollectingParameters);
                }
            },
            None => line,
        };
        match coerce(&kind, &raw) {
            Ok(value) => self.args.push(value),
            Err(err) => {
                self.report(&SessionError::InvalidParameterValue {
                    parameter: parameter.name.clone(),
                    message: err.to_string(),
                })?;
                return Ok(RunnerState::CollectingParameters);
            }
        }
        if self.pending_parameter_after_push() {
            return Ok(RunnerState::CollectingParameters);
        }
        Ok(RunnerState::Invoking)
    }

    /// Makes exactly one call on the handle for the selected item.
    async fn invoke(&mut self) -> io::Result<RunnerState> {
        let Some(item) = self.selected.and_then(|index| self.menu.get(index)) else {
            return Ok(RunnerState::AwaitingSelection);
        };
        let action = item.action;
        let schema = self.schema;
        let handle = self.handle;
        let args = std::mem::take(&mut self.args);
        let (name, mutating) = match action {
            MenuAction::Invoke(index) => match schema.operations.get(index) {
                Some(operation) => (operation.name.as_str(), operation.mutates()),
                None => return Ok(RunnerState::AwaitingSelection),
            },
            MenuAction::DisplayLedger => (LEDGER_ITEM_ID, false),
        };
        writeln!(self.output, "{}", t!("runner.invoking", operation = name))?;
        self.output.flush()?;
        self.attempted += 1;
        self.sink.record(&SessionEvent::new(SessionEventKind::InvocationStarted {
            operation: name.to_string(),
            mutating,
        }));
        let result = match action {
            MenuAction::DisplayLedger => handle.ledger_state().await.map(Outcome::Ledger),
            MenuAction::Invoke(_) if mutating => {
                handle.submit(name, &args).await.map(Outcome::Transaction)
            }
            MenuAction::Invoke(_) => handle.query(name, &args).await.map(Outcome::Value),
        };
        match result {
            Ok(outcome) => {
                let (tx_id, block_height) = match &outcome {
                    Outcome::Transaction(tx) => (Some(tx.tx_id.clone()), Some(tx.block_height)),
                    Outcome::Value(_) | Outcome::Ledger(_) => (None, None),
                };
                self.sink.record(&SessionEvent::new(SessionEventKind::InvocationSucceeded {
                    operation: name.to_string(),
                    tx_id,
                    block_height,
                }));
                self.outcome = Some(outcome);
                Ok(RunnerState::DisplayingResult)
            }
            Err(error) => {
                self.failures += 1;
                self.sink.record(&SessionEvent::new(SessionEventKind::InvocationFailed {
                    operation: name.to_string(),
                    error: error.to_string(),
                }));
                let retriable = error.is_retriable();
                self.report(&SessionError::InvocationFailed {
                    operation: name.to_string(),
                    error,
                })?;
                if retriable {
                    return Ok(RunnerState::AwaitingSelection);
                }
                writeln!(self.output, "{}", t!("runner.connection_lost"))?;
                Ok(self.terminate(TerminationReason::ConnectionLost))
            }
        }
    }

    /// Prints the pending outcome.
    fn display_result(&mut self) -> io::Result<RunnerState> {
        match self.outcome.take() {
            Some(Outcome::Transaction(tx)) => {
                writeln!(
                    self.output,
                    "{}",
                    t!("runner.tx", tx_id = tx.tx_id, block_height = tx.block_height)
                )?;
                if let Some(hash) = tx.block_hash {
                    writeln!(self.output, "{}", t!("runner.tx.hash", hash = hash))?;
                }
            }
            Some(Outcome::Value(value)) => {
                writeln!(self.output, "{}", t!("runner.result", value = value))?;
            }
            Some(Outcome::Ledger(values)) => self.display_ledger(&values)?,
            None => {}
        }
        self.selected = None;
        Ok(RunnerState::AwaitingSelection)
    }

    // ------------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------------

    /// Prints every schema ledger field in order, marking missing values.
    fn display_ledger(&mut self, values: &BTreeMap<String, Value>) -> io::Result<()> {
        writeln!(self.output, "{}", t!("runner.ledger.header"))?;
        if self.schema.ledger_fields.is_empty() {
            writeln!(self.output, "{}", t!("runner.ledger.empty"))?;
            return Ok(());
        }
        for name in self.schema.ledger_fields.keys() {
            let value = values
                .get(name)
                .map_or_else(|| t!("runner.ledger.unavailable"), Value::to_string);
            writeln!(self.output, "{}", t!("runner.ledger.field", name = name, value = value))?;
        }
        Ok(())
    }

    /// Returns the schema index of the selected operation, if one is selected.
    fn selected_operation_index(&self) -> Option<usize> {
        match self.selected.and_then(|index| self.menu.get(index))?.action {
            MenuAction::Invoke(index) => Some(index),
            MenuAction::DisplayLedger => None,
        }
    }

    /// Returns true when the selected operation still has parameters to read.
    fn pending_parameter_after_push(&self) -> bool {
        self.selected_operation_index()
            .and_then(|index| self.schema.operations.get(index))
            .is_some_and(|operation| self.args.len() < operation.parameters.len())
    }

    /// Records the termination reason and returns the terminal state.
    const fn terminate(&mut self, reason: TerminationReason) -> RunnerState {
        self.reason = Some(reason);
        RunnerState::Terminated
    }

    /// Writes a recoverable error line.
    fn report(&mut self, error: &SessionError) -> io::Result<()> {
        writeln!(self.output, "{}", t!("runner.error", error = error))
    }

    /// Writes a prompt without a trailing newline.
    fn prompt(&mut self, text: &str) -> io::Result<()> {
        self.output.write_all(text.as_bytes())?;
        self.output.flush()
    }

    /// Reads one line without its terminator, or `None` at end of input.
    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let trimmed_len = line.trim_end_matches(['\r', '\n']).len();
        line.truncate(trimmed_len);
        Ok(Some(line))
    }
}
