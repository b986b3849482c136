// crates/veil-contract/tests/extract.rs
// ============================================================================
// Module: Schema Extractor Tests
// Description: Module resolution and schema derivation over fixture build trees.
// Purpose: Prove single-module resolution and fail-closed parsing.
// ============================================================================

//! ## Overview
//! Exercises [`veil_contract::extract`] against temporary build directories:
//! unique, missing, and ambiguous modules; operation classification and
//! ordering; ledger and witness discovery; and parse error reporting.

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

mod common;

use std::fs;
use std::path::Path;

use tempfile::TempDir;
use veil_contract::ExtractError;
use veil_contract::MAX_ARTIFACT_BYTES;
use veil_contract::extract;
use veil_contract::parse_artifact;
use veil_contract::resolve_module;
use veil_core::Mutability;
use veil_core::Parameter;
use veil_core::TypeToken;

use crate::common::COUNTER_ARTIFACT;
use crate::common::VOTING_ARTIFACT;
use crate::common::write_managed_module;
use crate::common::write_module;

fn parse(source: &str) -> Result<veil_core::ContractSchema, ExtractError> {
    parse_artifact("fixture", Path::new("fixture.d.cts"), source)
}

fn parse_error_line(source: &str) -> usize {
    match parse(source) {
        Err(ExtractError::ParseError {
            line,
            ..
        }) => line,
        other => panic!("expected parse error, got {other:?}"),
    }
}

// ============================================================================
// SECTION: Resolution
// ============================================================================

#[test]
fn single_managed_module_extracts_every_operation() {
    let build = TempDir::new().unwrap();
    write_managed_module(build.path(), "voting", VOTING_ARTIFACT);

    let schema = extract(build.path(), None).unwrap();

    assert_eq!(schema.name, "voting");
    let names: Vec<&str> = schema.operations.iter().map(|op| op.name.as_str()).collect();
    assert_eq!(names, vec!["vote", "increment", "get_votes", "reset_round"]);
}

#[test]
fn missing_module_reports_searched_location() {
    let build = TempDir::new().unwrap();
    fs::create_dir_all(build.path().join("managed")).unwrap();

    let err = extract(build.path(), None).unwrap_err();

    match err {
        ExtractError::ContractNotFound {
            searched,
        } => assert!(searched.ends_with("managed")),
        other => panic!("expected ContractNotFound, got {other:?}"),
    }
}

#[test]
fn nonexistent_hint_is_not_found() {
    let build = TempDir::new().unwrap();
    let err = extract(&build.path().join("nope"), None).unwrap_err();
    assert!(matches!(err, ExtractError::ContractNotFound { .. }));
}

#[test]
fn two_modules_are_ambiguous_with_sorted_candidates() {
    let build = TempDir::new().unwrap();
    write_managed_module(build.path(), "voting", VOTING_ARTIFACT);
    write_managed_module(build.path(), "counter", COUNTER_ARTIFACT);

    let err = extract(build.path(), None).unwrap_err();

    assert_eq!(
        err,
        ExtractError::AmbiguousContract {
            searched: build.path().join("managed").display().to_string(),
            candidates: vec!["counter".to_string(), "voting".to_string()],
        }
    );
}

#[test]
fn selector_disambiguates_modules() {
    let build = TempDir::new().unwrap();
    write_managed_module(build.path(), "voting", VOTING_ARTIFACT);
    write_managed_module(build.path(), "counter", COUNTER_ARTIFACT);

    let schema = extract(build.path(), Some("counter")).unwrap();
    assert_eq!(schema.name, "counter");
    assert_eq!(schema.operations.len(), 1);

    let err = extract(build.path(), Some("missing")).unwrap_err();
    assert!(matches!(err, ExtractError::ContractNotFound { .. }));
}

#[test]
fn single_source_file_picks_its_module_over_stale_builds() {
    let build = TempDir::new().unwrap();
    fs::write(build.path().join("voting.compact"), "pragma language_version >= 0.16;\n").unwrap();
    write_managed_module(build.path(), "voting", VOTING_ARTIFACT);
    write_managed_module(build.path(), "counter", COUNTER_ARTIFACT);

    let schema = extract(build.path(), None).unwrap();
    assert_eq!(schema.name, "voting");

    let schema = extract(build.path(), Some("counter")).unwrap();
    assert_eq!(schema.name, "counter");
}

#[test]
fn source_files_that_do_not_settle_the_choice_stay_ambiguous() {
    let build = TempDir::new().unwrap();
    write_managed_module(build.path(), "voting", VOTING_ARTIFACT);
    write_managed_module(build.path(), "counter", COUNTER_ARTIFACT);
    fs::write(build.path().join("voting.compact"), "").unwrap();
    fs::write(build.path().join("counter.compact"), "").unwrap();

    let err = extract(build.path(), None).unwrap_err();
    assert!(matches!(err, ExtractError::AmbiguousContract { .. }));

    fs::remove_file(build.path().join("counter.compact")).unwrap();
    fs::rename(build.path().join("voting.compact"), build.path().join("ballot.compact")).unwrap();
    let err = extract(build.path(), None).unwrap_err();
    assert!(matches!(err, ExtractError::AmbiguousContract { .. }));
}

#[test]
fn file_hint_and_module_dir_hint_resolve_directly() {
    let build = TempDir::new().unwrap();
    let artifact = write_managed_module(build.path(), "voting", VOTING_ARTIFACT);

    let by_file = resolve_module(&artifact, None).unwrap();
    assert_eq!(by_file.name, "voting");
    assert_eq!(by_file.artifact, artifact);

    let by_dir = resolve_module(&build.path().join("managed").join("voting"), None).unwrap();
    assert_eq!(by_dir.name, "voting");
    assert_eq!(by_dir.artifact, artifact);
}

#[test]
fn plain_index_d_ts_is_accepted_as_fallback() {
    let build = TempDir::new().unwrap();
    write_module(&build.path().join("counter"), "index.d.ts", COUNTER_ARTIFACT);

    let schema = extract(build.path(), None).unwrap();
    assert_eq!(schema.name, "counter");
}

#[test]
fn oversized_artifact_is_rejected() {
    let build = TempDir::new().unwrap();
    let limit = usize::try_from(MAX_ARTIFACT_BYTES).unwrap();
    let artifact = write_managed_module(build.path(), "huge", &" ".repeat(limit + 1));

    let err = extract(build.path(), None).unwrap_err();

    assert_eq!(
        err,
        ExtractError::TooLarge {
            path: artifact.display().to_string(),
            limit: MAX_ARTIFACT_BYTES,
        }
    );
}

// ============================================================================
// SECTION: Operations
// ============================================================================

#[test]
fn operations_are_classified_by_declaration_group() {
    let schema = parse(VOTING_ARTIFACT).unwrap();

    let vote = schema.operation("vote").unwrap();
    assert_eq!(vote.mutability, Mutability::Mutating);
    assert_eq!(vote.parameters, vec![Parameter::new("vote_option", "Uint<0..3>")]);
    assert!(vote.return_type.is_unit());

    let get_votes = schema.operation("get_votes").unwrap();
    assert_eq!(get_votes.mutability, Mutability::ReadOnly);
    assert_eq!(get_votes.parameters, vec![Parameter::new("option", "bigint")]);
    assert_eq!(get_votes.return_type, TypeToken::new("bigint"));

    let reset_round = schema.operation("reset_round").unwrap();
    assert_eq!(reset_round.mutability, Mutability::Mutating);
    assert_eq!(schema.read_only_count(), 1);
}

#[test]
fn dual_listed_operation_is_mutating() {
    let source = "export type ImpureCircuits<T> = {\n  tally(context: CircuitContext<T>): \
                  CircuitResults<T, bigint>;\n}\nexport type PureCircuits = {\n  tally(): \
                  bigint;\n}\n";
    let schema = parse(source).unwrap();
    let tally = schema.operation("tally").unwrap();
    assert_eq!(tally.mutability, Mutability::Mutating);
    assert_eq!(tally.return_type, TypeToken::new("bigint"));
}

#[test]
fn doc_comments_become_descriptions() {
    let schema = parse(VOTING_ARTIFACT).unwrap();
    let vote = schema.operation("vote").unwrap();
    assert_eq!(vote.description.as_deref(), Some("Casts a vote for the given option."));
    let increment = schema.operation("increment").unwrap();
    assert_eq!(increment.description.as_deref(), Some("Execute increment"));
}

// ============================================================================
// SECTION: Ledger and Witnesses
// ============================================================================

#[test]
fn ledger_properties_are_collected_and_other_members_skipped() {
    let schema = parse(VOTING_ARTIFACT).unwrap();
    let fields: Vec<&str> = schema.ledger_fields.keys().map(String::as_str).collect();
    assert_eq!(fields, vec!["owner", "round", "voters", "votes"]);
    assert_eq!(schema.ledger_fields["round"], TypeToken::new("Counter"));
    assert!(schema.ledger_fields["voters"].as_str().starts_with("{ isEmpty(): boolean;"));
}

#[test]
fn missing_ledger_yields_empty_mapping() {
    let schema = parse("export type PureCircuits = {\n  ping(): boolean;\n}\n").unwrap();
    assert!(schema.ledger_fields.is_empty());
    assert!(schema.witnesses.is_empty());
}

#[test]
fn witnesses_record_context_types_and_results() {
    let schema = parse(VOTING_ARTIFACT).unwrap();
    assert_eq!(schema.witnesses.len(), 1);
    let witness = &schema.witnesses[0];
    assert_eq!(witness.name, "local_secret_key");
    assert_eq!(witness.ledger_type, TypeToken::new("Ledger"));
    assert_eq!(witness.private_type, TypeToken::new("T"));
    assert_eq!(witness.returns, vec![TypeToken::new("T"), TypeToken::new("Uint8Array")]);
}

// ============================================================================
// SECTION: Parse Errors
// ============================================================================

#[test]
fn artifact_without_operation_groups_fails() {
    let line = parse_error_line("export type Ledger = {\n  readonly votes: bigint;\n}\n");
    assert_eq!(line, 1);
}

#[test]
fn unbalanced_delimiters_fail_with_line() {
    let line = parse_error_line("export type PureCircuits = {\n  ping(: boolean;\n}\n");
    assert_eq!(line, 3);
}

#[test]
fn malformed_signature_fails_with_line() {
    let line = parse_error_line("export type ImpureCircuits<T> = {\n  vote;\n}\n");
    assert_eq!(line, 2);
}

#[test]
fn duplicate_name_within_group_fails() {
    let source = "export type PureCircuits = {\n  ping(): boolean;\n  ping(): boolean;\n}\n";
    assert_eq!(parse_error_line(source), 3);
}

#[test]
fn parse_errors_carry_artifact_path() {
    let build = TempDir::new().unwrap();
    let artifact = write_managed_module(build.path(), "broken", "export type Ledger = {}\n");
    let err = extract(build.path(), None).unwrap_err();
    match err {
        ExtractError::ParseError {
            path,
            ..
        } => assert_eq!(path, artifact.display().to_string()),
        other => panic!("expected ParseError, got {other:?}"),
    }
}

#[test]
fn schema_serializes_for_analysis_output() {
    let schema = parse(COUNTER_ARTIFACT).unwrap();
    let value = serde_json::to_value(&schema).unwrap();
    assert_eq!(value["operations"][0]["name"], "increment");
    assert_eq!(value["operations"][0]["mutability"], "mutating");
    assert_eq!(value["ledger_fields"]["round"], "Counter");
}
