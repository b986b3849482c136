// crates/veil-wrapper-gen/tests/generate.rs
// ============================================================================
// Module: Wrapper Generator Tests
// Description: Determinism, content, and output checks for wrapper generation.
// Purpose: Prove idempotent rendering, drift detection, and atomic writes.
// ============================================================================

//! ## Overview
//! Renders a fixed voting schema and checks the generated module shape, the
//! idempotence contract around the timestamp line, and the on-disk write and
//! drift-check behavior.

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

use std::collections::BTreeMap;
use std::fs;

use tempfile::TempDir;
use time::macros::datetime;
use veil_core::ContractSchema;
use veil_core::Mutability;
use veil_core::Operation;
use veil_core::Parameter;
use veil_core::TypeToken;
use veil_core::Witness;
use veil_wrapper_gen::TIMESTAMP_PREFIX;
use veil_wrapper_gen::WrapperGenError;
use veil_wrapper_gen::WrapperGenerator;
use veil_wrapper_gen::check_output;
use veil_wrapper_gen::strip_timestamp;
use veil_wrapper_gen::write_output;

fn voting_schema() -> ContractSchema {
    let operations = vec![
        Operation {
            name: "vote".to_string(),
            parameters: vec![Parameter::new("vote_option", "Uint<0..3>")],
            return_type: TypeToken::unit(),
            mutability: Mutability::Mutating,
            description: Some("Casts a vote */ safely.".to_string()),
        },
        Operation {
            name: "set_owner".to_string(),
            parameters: vec![Parameter::new("owner", "Bytes<32>"), Parameter::new("note", "Foo")],
            return_type: TypeToken::unit(),
            mutability: Mutability::Mutating,
            description: None,
        },
        Operation {
            name: "get_votes".to_string(),
            parameters: Vec::new(),
            return_type: TypeToken::new("Uint<64>"),
            mutability: Mutability::ReadOnly,
            description: None,
        },
    ];
    let mut ledger = BTreeMap::new();
    ledger.insert("votes".to_string(), TypeToken::new("Counter"));
    ledger.insert("owner".to_string(), TypeToken::new("Bytes<32>"));
    let witnesses = vec![Witness {
        name: "local_secret_key".to_string(),
        ledger_type: TypeToken::new("Ledger"),
        private_type: TypeToken::new("T"),
        returns: vec![TypeToken::new("T"), TypeToken::new("Uint8Array")],
    }];
    ContractSchema::new("voting", operations, ledger, witnesses).unwrap()
}

fn render_at_noon(schema: &ContractSchema) -> String {
    WrapperGenerator::new(schema).render(datetime!(2026-01-02 12:00:00 UTC)).unwrap()
}

// ============================================================================
// SECTION: Rendering
// ============================================================================

#[test]
fn rendering_is_idempotent_apart_from_timestamp() {
    let schema = voting_schema();
    let generator = WrapperGenerator::new(&schema);
    let first = generator.render(datetime!(2026-01-02 12:00:00 UTC)).unwrap();
    let again = generator.render(datetime!(2026-01-02 12:00:00 UTC)).unwrap();
    let later = generator.render(datetime!(2027-05-06 08:30:00 UTC)).unwrap();

    assert_eq!(first, again);
    assert_ne!(first, later);
    assert_eq!(strip_timestamp(&first), strip_timestamp(&later));
    let stamps = first.lines().filter(|line| line.starts_with(TIMESTAMP_PREFIX)).count();
    assert_eq!(stamps, 1);
    assert!(first.contains("// Generated on: 2026-01-02T12:00:00Z"));
}

#[test]
fn emits_one_wrapper_per_operation() {
    let output = render_at_noon(&voting_schema());

    assert!(output.contains("export class GeneratedAPIWrappers {"));
    for name in ["vote", "set_owner", "get_votes"] {
        let signature = format!("  async {name}(...args: FunctionParameters['{name}'])");
        assert_eq!(output.matches(&signature).count(), 1, "wrapper for {name}");
    }
    assert!(output.contains("await this.contract.callTx.vote(...args);"));
    assert!(output.contains("await this.contract.callTx.set_owner(...args);"));
    assert!(output.contains("await this.contract.query.get_votes(...args);"));
    assert!(output.contains("Transaction ${tx.txId} added in block ${tx.blockHeight}"));
}

#[test]
fn wrappers_check_arity_and_kinds() {
    let output = render_at_noon(&voting_schema());

    assert!(output.contains("    assertArity('vote', args, 1);\n"));
    assert!(output.contains("    assertKind('vote', 'vote_option', args[0], 'integer');\n"));
    assert!(output.contains("    assertKind('set_owner', 'owner', args[0], 'bytes', 32);\n"));
    assert!(output.contains("    assertKind('set_owner', 'note', args[1], 'unknown');\n"));
    assert!(output.contains("    assertArity('get_votes', args, 0);\n"));
}

#[test]
fn type_descriptions_mirror_schema() {
    let output = render_at_noon(&voting_schema());

    assert!(output.contains("  vote: [vote_option: bigint];\n"));
    assert!(output.contains("  set_owner: [owner: Uint8Array, note: any];\n"));
    assert!(output.contains("  get_votes: [];\n"));
    assert!(output.contains("  owner: Uint8Array;\n"));
    assert!(output.contains("  votes: bigint;\n"));
    let query_signature = "get_votes(...args: FunctionParameters['get_votes']): Promise<bigint>;";
    assert!(output.contains(query_signature));
    assert!(output.contains("/** Casts a vote * / safely. */"));
    assert!(output.contains("/** Execute set_owner */"));
}

#[test]
fn metadata_constant_lists_operations_ledger_and_witnesses() {
    let output = render_at_noon(&voting_schema());
    let start = output.find("export const CONTRACT_METADATA = ").unwrap();
    let json_text = output[start ..]
        .trim_start_matches("export const CONTRACT_METADATA = ")
        .trim_end()
        .trim_end_matches(" as const;");
    let metadata: serde_json::Value = serde_json::from_str(json_text).unwrap();

    assert_eq!(metadata["contractName"], "voting");
    assert_eq!(metadata["operations"][0]["name"], "vote");
    assert_eq!(metadata["operations"][0]["readOnly"], false);
    assert_eq!(metadata["operations"][2]["readOnly"], true);
    assert_eq!(metadata["operations"][2]["description"], "Execute get_votes");
    assert_eq!(metadata["ledgerState"]["votes"], "Counter");
    assert_eq!(metadata["witnesses"][0]["returns"][1], "Uint8Array");
}

// ============================================================================
// SECTION: Output
// ============================================================================

#[test]
fn generate_creates_parents_and_passes_check() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("contract-cli").join("src").join("generated-api-wrappers.ts");
    let schema = voting_schema();
    let generator = WrapperGenerator::new(&schema);

    generator.generate(&path).unwrap();
    generator.check(&path).unwrap();

    let leftovers: Vec<_> = fs::read_dir(path.parent().unwrap())
        .unwrap()
        .map(|entry| entry.unwrap().file_name())
        .filter(|name| name.to_string_lossy().contains(".tmp."))
        .collect();
    assert!(leftovers.is_empty());
}

#[test]
fn check_reports_drift_after_schema_change() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("wrappers.ts");
    let schema = voting_schema();
    write_output(&path, &render_at_noon(&schema)).unwrap();

    let mut changed = schema.clone();
    changed.operations.pop();
    let err = WrapperGenerator::new(&changed).check(&path).unwrap_err();

    assert_eq!(
        err,
        WrapperGenError::Drift {
            path: path.display().to_string(),
        }
    );
}

#[test]
fn check_ignores_timestamp_only_changes() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("wrappers.ts");
    let schema = voting_schema();
    let generator = WrapperGenerator::new(&schema);
    write_output(&path, &generator.render(datetime!(2020-01-01 00:00:00 UTC)).unwrap()).unwrap();

    check_output(&path, &render_at_noon(&schema)).unwrap();
}

#[test]
fn check_missing_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    let err = check_output(&dir.path().join("absent.ts"), "x").unwrap_err();
    assert!(matches!(err, WrapperGenError::Io(_)));
}

#[test]
fn write_replaces_existing_artifact() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("wrappers.ts");
    fs::write(&path, "stale").unwrap();

    write_output(&path, "fresh").unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), "fresh");
}
