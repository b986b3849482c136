// crates/veil-core/src/schema.rs
// ============================================================================
// Module: Contract Schema Model
// Description: Normalized schema of contract operations, ledger, and witnesses.
// Purpose: Provide the canonical shape shared by menus, runners, and codegen.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! A [`ContractSchema`] is derived from exactly one compiled contract module
//! and is rebuilt on every analysis run. Operations keep their discovery
//! order; ledger fields are stored in a sorted map so that every consumer
//! renders them identically.
//!
//! Mutability is decided by an explicit classification step over the
//! declaration groups an operation name appeared in. Anything that is not
//! unambiguously read-only is treated as mutating, so a misclassification can
//! only cost a confirmation wait, never a skipped state change.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::types::SemanticKind;
use crate::types::map_type;

// ============================================================================
// SECTION: Type Tokens
// ============================================================================

/// Raw source-language type name as it appeared in the contract artifact.
///
/// # Invariants
/// - The stored text is trimmed; interior spacing is preserved verbatim.
/// - Tokens are opaque until canonicalized by [`map_type`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeToken(String);

impl TypeToken {
    /// Creates a token from raw type text.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.len() == raw.len() {
            return Self(raw);
        }
        Self(trimmed.to_string())
    }

    /// Returns the canonical unit token used for operations without a result.
    #[must_use]
    pub fn unit() -> Self {
        Self("[]".to_string())
    }

    /// Returns the raw token text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true when the token denotes an empty result.
    #[must_use]
    pub fn is_unit(&self) -> bool {
        matches!(self.0.as_str(), "[]" | "void" | "undefined")
    }

    /// Canonicalizes the token into its semantic kind.
    #[must_use]
    pub fn kind(&self) -> SemanticKind {
        map_type(self)
    }
}

impl fmt::Display for TypeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TypeToken {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

// ============================================================================
// SECTION: Mutability Classification
// ============================================================================

/// Syntactic declaration group an operation signature was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclarationGroup {
    /// State-mutating ("transaction") declarations.
    Transaction,
    /// Read-only ("query" / pure) declarations.
    Query,
    /// Combined listing that does not state mutability.
    Combined,
}

/// Set of declaration groups that listed a single operation name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeclarationGroups(BTreeSet<DeclarationGroup>);

impl DeclarationGroups {
    /// Creates an empty group set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that the operation was declared in `group`.
    pub fn insert(&mut self, group: DeclarationGroup) {
        self.0.insert(group);
    }

    /// Returns true when the operation was declared in `group`.
    #[must_use]
    pub fn contains(&self, group: DeclarationGroup) -> bool {
        self.0.contains(&group)
    }
}

impl FromIterator<DeclarationGroup> for DeclarationGroups {
    fn from_iter<I: IntoIterator<Item = DeclarationGroup>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Mutability classification of an operation.
///
/// # Invariants
/// - [`Mutability::ReadOnly`] is only produced by [`Mutability::classify`] when the read-only group
///   is the sole classifying listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mutability {
    /// The operation may change ledger state and settles as a transaction.
    Mutating,
    /// The operation only reads state.
    ReadOnly,
}

impl Mutability {
    /// Classifies an operation from the declaration groups it appeared in.
    ///
    /// The transaction and query groups are the classifying listings; the
    /// combined group carries no mutability information. An operation is
    /// read-only only when it is listed in the query group and not in the
    /// transaction group. Every other combination, including names seen only
    /// in the combined group and names listed in both classifying groups,
    /// defaults to [`Mutability::Mutating`].
    #[must_use]
    pub fn classify(groups: &DeclarationGroups) -> Self {
        let query = groups.contains(DeclarationGroup::Query);
        let transaction = groups.contains(DeclarationGroup::Transaction);
        if query && !transaction { Self::ReadOnly } else { Self::Mutating }
    }

    /// Returns true for mutating operations.
    #[must_use]
    pub const fn mutates(self) -> bool {
        matches!(self, Self::Mutating)
    }
}

// ============================================================================
// SECTION: Schema Types
// ============================================================================

/// Named, typed operation parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter name as declared.
    pub name: String,
    /// Declared parameter type.
    #[serde(rename = "type")]
    pub ty: TypeToken,
}

impl Parameter {
    /// Creates a parameter from a name and raw type.
    #[must_use]
    pub fn new(name: impl Into<String>, ty: impl Into<TypeToken>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
        }
    }
}

/// Single contract entry point.
///
/// # Invariants
/// - When produced by the schema extractor, `description` is `Some` and non-empty.
/// - `parameters` preserve declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    /// Operation name (unique within a schema).
    pub name: String,
    /// Ordered parameters.
    pub parameters: Vec<Parameter>,
    /// Declared return type.
    pub return_type: TypeToken,
    /// Mutability classification.
    pub mutability: Mutability,
    /// Human-readable description.
    pub description: Option<String>,
}

impl Operation {
    /// Returns true when invoking the operation may change ledger state.
    #[must_use]
    pub const fn mutates(&self) -> bool {
        self.mutability.mutates()
    }

    /// Returns the description, synthesizing the default when absent.
    #[must_use]
    pub fn description_or_default(&self) -> String {
        match &self.description {
            Some(text) if !text.trim().is_empty() => text.clone(),
            _ => default_description(&self.name),
        }
    }
}

/// Returns the deterministic default description for an operation.
#[must_use]
pub fn default_description(name: &str) -> String {
    format!("Execute {name}")
}

/// Private-input provider declared by a contract.
///
/// Witnesses are recorded for display and codegen; they are never executed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Witness {
    /// Witness name.
    pub name: String,
    /// Ledger type visible to the witness.
    pub ledger_type: TypeToken,
    /// Private state type threaded through the witness.
    pub private_type: TypeToken,
    /// Ordered result types.
    pub returns: Vec<TypeToken>,
}

/// Normalized schema of a single contract module.
///
/// # Invariants
/// - Operation names are unique (checked by [`ContractSchema::new`]).
/// - Derived from exactly one resolved contract module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractSchema {
    /// Contract module name.
    pub name: String,
    /// Operations in discovery order.
    pub operations: Vec<Operation>,
    /// Ledger field types keyed by field name.
    pub ledger_fields: BTreeMap<String, TypeToken>,
    /// Witness bindings in declaration order.
    pub witnesses: Vec<Witness>,
}

/// Errors raised when assembling a schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// Two operations share a name.
    #[error("duplicate operation: {0}")]
    DuplicateOperation(String),
}

impl ContractSchema {
    /// Assembles a schema, enforcing unique operation names.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::DuplicateOperation`] when two operations share a name.
    pub fn new(
        name: impl Into<String>,
        operations: Vec<Operation>,
        ledger_fields: BTreeMap<String, TypeToken>,
        witnesses: Vec<Witness>,
    ) -> Result<Self, SchemaError> {
        let mut seen = BTreeSet::new();
        for operation in &operations {
            if !seen.insert(operation.name.as_str()) {
                return Err(SchemaError::DuplicateOperation(operation.name.clone()));
            }
        }
        Ok(Self {
            name: name.into(),
            operations,
            ledger_fields,
            witnesses,
        })
    }

    /// Looks up an operation by name.
    #[must_use]
    pub fn operation(&self, name: &str) -> Option<&Operation> {
        self.operations.iter().find(|operation| operation.name == name)
    }

    /// Returns the number of read-only operations.
    #[must_use]
    pub fn read_only_count(&self) -> usize {
        self.operations.iter().filter(|operation| !operation.mutates()).count()
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
