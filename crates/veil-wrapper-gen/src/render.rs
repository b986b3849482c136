// crates/veil-wrapper-gen/src/render.rs
// ============================================================================
// Module: TypeScript Wrapper Rendering
// Description: Renders typed API wrappers and schema mirrors as TypeScript.
// Purpose: Keep rendering a pure function of schema and timestamp.
// Dependencies: veil-core, serde_json
// ============================================================================

//! ## Overview
//! Rendering walks the schema in its canonical order: operations in
//! discovery order, ledger fields sorted by name, witnesses in declaration
//! order. The only line that varies between runs on the same schema is the
//! `// Generated on:` header.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;
use serde_json::json;
use veil_core::ContractSchema;
use veil_core::Operation;
use veil_core::Parameter;
use veil_core::SemanticKind;
use veil_core::TypeToken;

use crate::TIMESTAMP_PREFIX;
use crate::WrapperGenError;

// ============================================================================
// SECTION: Type Mapping
// ============================================================================

/// Returns the TypeScript type used for a semantic kind.
#[must_use]
pub const fn typescript_type(kind: &SemanticKind) -> &'static str {
    match kind {
        SemanticKind::Integer {
            ..
        } => "bigint",
        SemanticKind::Boolean => "boolean",
        SemanticKind::Bytes {
            ..
        } => "Uint8Array",
        SemanticKind::Text => "string",
        SemanticKind::OpaqueUnknown {
            ..
        } => "any",
    }
}

/// Returns the TypeScript return type for a token, mapping unit tokens to `void`.
fn typescript_return(token: &TypeToken) -> &'static str {
    if token.is_unit() { "void" } else { typescript_type(&token.kind()) }
}

// ============================================================================
// SECTION: Rendering
// ============================================================================

/// Renders the complete wrapper module.
///
/// # Errors
///
/// Returns [`WrapperGenError::Json`] if metadata serialization fails.
pub fn render_module(schema: &ContractSchema, timestamp: &str) -> Result<String, WrapperGenError> {
    let mut out = String::new();
    out.push_str("// This file is @generated by veil-wrapper-gen. DO NOT EDIT.\n");
    out.push_str("// Contract: ");
    out.push_str(&schema.name);
    out.push('\n');
    out.push_str(TIMESTAMP_PREFIX);
    out.push_str(timestamp);
    out.push_str("\n\n");
    render_support_types(&mut out);
    render_function_parameters(&mut out, schema);
    render_contract_state(&mut out, schema);
    render_contract_handle(&mut out, schema);
    render_helpers(&mut out);
    render_wrapper_class(&mut out, schema);
    render_metadata(&mut out, schema)?;
    Ok(out)
}

/// Renders the logger, transaction, and parameter-kind declarations.
fn render_support_types(out: &mut String) {
    out.push_str("/** Logger injected into the generated wrappers. */\n");
    out.push_str("export interface WrapperLogger {\n");
    out.push_str("  info(message: string): void;\n");
    out.push_str("  error(message: string): void;\n");
    out.push_str("}\n\n");
    out.push_str("/** Settlement descriptor returned by mutating operations. */\n");
    out.push_str("export interface FinalizedTransaction {\n");
    out.push_str("  txId: string;\n");
    out.push_str("  blockHeight: bigint | number;\n");
    out.push_str("  blockHash?: string;\n");
    out.push_str("}\n\n");
    out.push_str(
        "export type ParameterKind = 'integer' | 'boolean' | 'bytes' | 'text' | 'unknown';\n\n",
    );
}

/// Renders the `FunctionParameters` tuple map.
fn render_function_parameters(out: &mut String, schema: &ContractSchema) {
    out.push_str("/** Parameter tuples keyed by operation name. */\n");
    out.push_str("export interface FunctionParameters {\n");
    for operation in &schema.operations {
        out.push_str("  ");
        out.push_str(&operation.name);
        out.push_str(": [");
        let elements: Vec<String> = operation
            .parameters
            .iter()
            .map(|parameter| {
                format!("{}: {}", parameter.name, typescript_type(&parameter.ty.kind()))
            })
            .collect();
        out.push_str(&elements.join(", "));
        out.push_str("];\n");
    }
    out.push_str("}\n\n");
}

/// Renders the `ContractState` ledger mirror.
fn render_contract_state(out: &mut String, schema: &ContractSchema) {
    out.push_str("/** Ledger state shape. */\n");
    out.push_str("export interface ContractState {\n");
    for (name, ty) in &schema.ledger_fields {
        out.push_str("  /** ");
        out.push_str(&normalize_doc(ty.as_str()));
        out.push_str(" */\n  ");
        out.push_str(name);
        out.push_str(": ");
        out.push_str(typescript_type(&ty.kind()));
        out.push_str(";\n");
    }
    out.push_str("}\n\n");
}

/// Renders the deployed-contract surface the wrappers delegate to.
fn render_contract_handle(out: &mut String, schema: &ContractSchema) {
    out.push_str("/** Deployed contract surface the wrappers delegate to. */\n");
    out.push_str("export interface DeployedContractHandle {\n");
    out.push_str("  callTx: {\n");
    for operation in schema.operations.iter().filter(|operation| operation.mutates()) {
        out.push_str("    ");
        out.push_str(&operation.name);
        out.push_str("(...args: FunctionParameters['");
        out.push_str(&operation.name);
        out.push_str("']): Promise<{ public: FinalizedTransaction }>;\n");
    }
    out.push_str("  };\n");
    out.push_str("  query: {\n");
    for operation in schema.operations.iter().filter(|operation| !operation.mutates()) {
        out.push_str("    ");
        out.push_str(&operation.name);
        out.push_str("(...args: FunctionParameters['");
        out.push_str(&operation.name);
        out.push_str("']): Promise<");
        out.push_str(typescript_return(&operation.return_type));
        out.push_str(">;\n");
    }
    out.push_str("  };\n");
    out.push_str("}\n\n");
}

/// Renders the runtime arity and kind guards.
fn render_helpers(out: &mut String) {
    out.push_str(
        "function assertArity(operation: string, args: readonly unknown[], expected: number): \
         void {\n",
    );
    out.push_str("  if (args.length !== expected) {\n");
    out.push_str(
        "    throw new TypeError(`${operation} expects ${expected} argument(s), got \
         ${args.length}`);\n",
    );
    out.push_str("  }\n");
    out.push_str("}\n\n");
    out.push_str("function assertKind(\n");
    out.push_str("  operation: string,\n");
    out.push_str("  parameter: string,\n");
    out.push_str("  value: unknown,\n");
    out.push_str("  kind: ParameterKind,\n");
    out.push_str("  width?: number,\n");
    out.push_str("): void {\n");
    out.push_str("  let valid: boolean;\n");
    out.push_str("  switch (kind) {\n");
    out.push_str("    case 'integer':\n");
    out.push_str("      valid = typeof value === 'bigint';\n");
    out.push_str("      break;\n");
    out.push_str("    case 'boolean':\n");
    out.push_str("      valid = typeof value === 'boolean';\n");
    out.push_str("      break;\n");
    out.push_str("    case 'bytes':\n");
    out.push_str(
        "      valid = value instanceof Uint8Array && (width === undefined || value.length === \
         width);\n",
    );
    out.push_str("      break;\n");
    out.push_str("    case 'text':\n");
    out.push_str("      valid = typeof value === 'string';\n");
    out.push_str("      break;\n");
    out.push_str("    default:\n");
    out.push_str("      valid = true;\n");
    out.push_str("  }\n");
    out.push_str("  if (!valid) {\n");
    out.push_str("    const expected = width === undefined ? kind : `${kind}[${width}]`;\n");
    out.push_str(
        "    throw new TypeError(`${operation}: parameter ${parameter} expects ${expected}`);\n",
    );
    out.push_str("  }\n");
    out.push_str("}\n\n");
    out.push_str("function describeError(error: unknown): string {\n");
    out.push_str("  return error instanceof Error ? error.message : String(error);\n");
    out.push_str("}\n\n");
}

/// Renders the `GeneratedAPIWrappers` class.
fn render_wrapper_class(out: &mut String, schema: &ContractSchema) {
    out.push_str("/** Typed wrappers for every contract operation. */\n");
    out.push_str("export class GeneratedAPIWrappers {\n");
    out.push_str("  constructor(\n");
    out.push_str("    private readonly contract: DeployedContractHandle,\n");
    out.push_str("    private readonly logger: WrapperLogger,\n");
    out.push_str("  ) {}\n");
    for operation in &schema.operations {
        out.push('\n');
        render_wrapper_method(out, operation);
    }
    out.push_str("}\n\n");
}

/// Renders a single wrapper method.
fn render_wrapper_method(out: &mut String, operation: &Operation) {
    let name = operation.name.as_str();
    let result_type = if operation.mutates() {
        "FinalizedTransaction"
    } else {
        typescript_return(&operation.return_type)
    };
    out.push_str("  /** ");
    out.push_str(&normalize_doc(&operation.description_or_default()));
    out.push_str(" */\n");
    out.push_str("  async ");
    out.push_str(name);
    out.push_str("(...args: FunctionParameters['");
    out.push_str(name);
    out.push_str("']): Promise<");
    out.push_str(result_type);
    out.push_str("> {\n");
    out.push_str("    assertArity('");
    out.push_str(name);
    out.push_str("', args, ");
    out.push_str(&operation.parameters.len().to_string());
    out.push_str(");\n");
    for (index, parameter) in operation.parameters.iter().enumerate() {
        render_kind_check(out, name, index, parameter);
    }
    out.push_str("    this.logger.info('Calling ");
    out.push_str(name);
    out.push_str("');\n");
    out.push_str("    try {\n");
    if operation.mutates() {
        out.push_str("      const result = await this.contract.callTx.");
        out.push_str(name);
        out.push_str("(...args);\n");
        out.push_str("      const tx = result.public;\n");
        out.push_str(
            "      this.logger.info(`Transaction ${tx.txId} added in block ${tx.blockHeight}`);\n",
        );
        out.push_str("      return tx;\n");
    } else {
        out.push_str("      const value = await this.contract.query.");
        out.push_str(name);
        out.push_str("(...args);\n");
        out.push_str("      this.logger.info('");
        out.push_str(name);
        out.push_str(" completed');\n");
        out.push_str("      return value;\n");
    }
    out.push_str("    } catch (error) {\n");
    out.push_str("      this.logger.error(`");
    out.push_str(name);
    out.push_str(" failed: ${describeError(error)}`);\n");
    out.push_str("      throw error;\n");
    out.push_str("    }\n");
    out.push_str("  }\n");
}

/// Renders the runtime kind guard for one parameter.
fn render_kind_check(out: &mut String, operation: &str, index: usize, parameter: &Parameter) {
    let kind = parameter.ty.kind();
    out.push_str("    assertKind('");
    out.push_str(operation);
    out.push_str("', '");
    out.push_str(&parameter.name);
    out.push_str("', args[");
    out.push_str(&index.to_string());
    out.push_str("], '");
    out.push_str(kind.label());
    out.push('\'');
    if let SemanticKind::Bytes {
        width: Some(width),
    } = kind
    {
        out.push_str(", ");
        out.push_str(&width.to_string());
    }
    out.push_str(");\n");
}

/// Renders the `CONTRACT_METADATA` constant.
fn render_metadata(out: &mut String, schema: &ContractSchema) -> Result<(), WrapperGenError> {
    let metadata = metadata_value(schema);
    let json = serde_json::to_string_pretty(&metadata)
        .map_err(|err| WrapperGenError::Json(err.to_string()))?;
    out.push_str("/** Schema the wrappers were generated from. */\n");
    out.push_str("export const CONTRACT_METADATA = ");
    out.push_str(&json);
    out.push_str(" as const;\n");
    Ok(())
}

/// Builds the metadata JSON mirror of the schema.
fn metadata_value(schema: &ContractSchema) -> Value {
    let operations: Vec<Value> = schema
        .operations
        .iter()
        .map(|operation| {
            let parameters: Vec<Value> = operation
                .parameters
                .iter()
                .map(|parameter| {
                    json!({
                        "name": parameter.name,
                        "type": parameter.ty.as_str(),
                        "kind": parameter.ty.kind().label(),
                    })
                })
                .collect();
            json!({
                "name": operation.name,
                "readOnly": !operation.mutates(),
                "description": operation.description_or_default(),
                "parameters": parameters,
                "returnType": operation.return_type.as_str(),
            })
        })
        .collect();
    let witnesses: Vec<Value> = schema
        .witnesses
        .iter()
        .map(|witness| {
            let returns: Vec<&str> = witness.returns.iter().map(TypeToken::as_str).collect();
            json!({
                "name": witness.name,
                "ledgerType": witness.ledger_type.as_str(),
                "privateType": witness.private_type.as_str(),
                "returns": returns,
            })
        })
        .collect();
    json!({
        "contractName": schema.name,
        "operations": operations,
        "ledgerState": schema.ledger_fields,
        "witnesses": witnesses,
    })
}

/// Normalizes doc text so it cannot terminate a block comment.
fn normalize_doc(value: &str) -> String {
    let collapsed = value.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.replace("*/", "* /")
}

// ============================================================================
// SECTION: Tests
// ============================================================================
