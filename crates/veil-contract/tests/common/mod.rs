// crates/veil-contract/tests/common/mod.rs
// ============================================================================
// Module: Common Test Fixtures
// Description: Declaration artifacts and build-tree helpers for extractor tests.
// Purpose: Provide reusable contract module layouts on a temporary filesystem.
// Dependencies: tempfile
// ============================================================================

//! ## Overview
//! Fixtures mirror the shape of compiler-generated `index.d.cts` files,
//! including the runtime context parameter, result wrappers, and the
//! declaration groups that follow the type surface.

#![allow(dead_code, reason = "Shared test helpers may be unused in some cases.")]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;
use std::path::PathBuf;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Voting contract with mutating, read-only, and combined-only operations.
pub const VOTING_ARTIFACT: &str = r#"import type * as __compactRuntime from '@midnight-ntwrk/compact-runtime';

export type Witnesses<T> = {
  local_secret_key(context: __compactRuntime.WitnessContext<Ledger, T>): [T, Uint8Array];
}

export type ImpureCircuits<T> = {
  /**
   * Casts a vote for the given option.
   */
  vote(context: __compactRuntime.CircuitContext<T>, vote_option: Uint<0..3>): __compactRuntime.CircuitResults<T, []>;
  increment(context: __compactRuntime.CircuitContext<T>): __compactRuntime.CircuitResults<T, []>;
}

export type PureCircuits = {
  get_votes(option: bigint): bigint;
}

export type Circuits<T> = {
  vote(context: __compactRuntime.CircuitContext<T>, vote_option: Uint<0..3>): __compactRuntime.CircuitResults<T, []>;
  increment(context: __compactRuntime.CircuitContext<T>): __compactRuntime.CircuitResults<T, []>;
  get_votes(context: __compactRuntime.CircuitContext<T>, option: bigint): __compactRuntime.CircuitResults<T, bigint>;
  reset_round(context: __compactRuntime.CircuitContext<T>): __compactRuntime.CircuitResults<T, []>;
}

export type Ledger = {
  readonly votes: bigint;
  readonly round: Counter;
  readonly owner: Uint8Array;
  voters: {
    isEmpty(): boolean;
    member(elem_0: Uint8Array): boolean;
    [Symbol.iterator](): Iterator<Uint8Array>
  };
  [Symbol.iterator](): Iterator<bigint>;
  describe(): string;
}

export type ContractReferenceLocations = any;

export declare const contractReferenceLocations : ContractReferenceLocations;

export declare class Contract<T, W extends Witnesses<T> = Witnesses<T>> {
  witnesses: W;
  circuits: Circuits<T>;
  impureCircuits: ImpureCircuits<T>;
  constructor(witnesses: W);
  initialState(context: __compactRuntime.ConstructorContext<T>): __compactRuntime.ConstructorResult<T>;
}

export declare function ledger(state: __compactRuntime.StateValue): Ledger;
export declare const pureCircuits: PureCircuits;
"#;

/// Minimal counter contract with a single mutating operation.
pub const COUNTER_ARTIFACT: &str = r"export type Witnesses<T> = {
}

export type ImpureCircuits<T> = {
  increment(context: __compactRuntime.CircuitContext<T>): __compactRuntime.CircuitResults<T, []>;
}

export type PureCircuits = {
}

export type Ledger = {
  readonly round: Counter;
}
";

// ============================================================================
// SECTION: Build Tree Helpers
// ============================================================================

/// Writes `<root>/managed/<name>/contract/index.d.cts` and returns its path.
pub fn write_managed_module(root: &Path, name: &str, artifact: &str) -> PathBuf {
    write_module(&root.join("managed").join(name), "index.d.cts", artifact)
}

/// Writes `<module_dir>/contract/<file_name>` and returns its path.
pub fn write_module(module_dir: &Path, file_name: &str, artifact: &str) -> PathBuf {
    let contract_dir = module_dir.join("contract");
    fs::create_dir_all(&contract_dir).expect("create contract dir");
    let path = contract_dir.join(file_name);
    fs::write(&path, artifact).expect("write artifact");
    path
}
