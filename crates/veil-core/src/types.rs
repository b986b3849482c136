// crates/veil-core/src/types.rs
// ============================================================================
// Module: Type Mapper
// Description: Canonical semantic kinds for raw contract type tokens.
// Purpose: Map type tokens to a closed sum type and coerce operator input.
// Dependencies: bigdecimal, hex, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! [`map_type`] is a pure, total function from a [`TypeToken`] to a
//! [`SemanticKind`]. Recognized tokens keep everything they encode (integer
//! bit widths and ranges, fixed byte widths); anything else becomes
//! [`SemanticKind::OpaqueUnknown`] carrying the raw token. Mapping never fails.
//!
//! [`coerce`] turns a line of operator text into an [`ArgValue`] according to
//! a kind. Integers are arbitrary precision: bounds are checked with
//! `BigDecimal` and the value is carried as its canonical decimal digits.
//! Opaque values are forwarded untouched and are never inspected.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::schema::TypeToken;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Runtime namespace qualifier stripped before matching.
const RUNTIME_QUALIFIER: &str = "__compactRuntime.";
/// Largest integer bit width recognized as a bounded integer.
pub const MAX_INTEGER_BITS: u32 = 1024;

// ============================================================================
// SECTION: Semantic Kinds
// ============================================================================

/// Value range accepted by an integer kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "range", content = "bound", rename_all = "snake_case")]
pub enum IntegerRange {
    /// Any signed integer.
    Signed,
    /// Any integer greater than or equal to zero.
    NonNegative,
    /// Unsigned integer representable in the given number of bits.
    Bits(u32),
    /// Unsigned integer strictly below the given bound.
    Below(u128),
}

impl fmt::Display for IntegerRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Signed => f.write_str("any integer"),
            Self::NonNegative => f.write_str(">= 0"),
            Self::Bits(bits) => write!(f, "0 ..< 2^{bits}"),
            Self::Below(bound) => write!(f, "0 ..< {bound}"),
        }
    }
}

/// Canonical semantic category of a type token.
///
/// # Invariants
/// - The variant set is closed; unrecognized tokens always land in
///   [`SemanticKind::OpaqueUnknown`].
/// - `OpaqueUnknown` payloads must not be branched on by consumers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SemanticKind {
    /// Arbitrary-precision integer with a value range.
    Integer {
        /// Accepted range.
        range: IntegerRange,
    },
    /// Boolean value.
    Boolean,
    /// Byte sequence, optionally fixed width.
    Bytes {
        /// Exact width in bytes when declared.
        width: Option<usize>,
    },
    /// UTF-8 text.
    Text,
    /// Unrecognized token, carried verbatim.
    OpaqueUnknown {
        /// Raw token text.
        raw: String,
    },
}

impl SemanticKind {
    /// Returns a short stable label for the kind.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Integer {
                ..
            } => "integer",
            Self::Boolean => "boolean",
            Self::Bytes {
                ..
            } => "bytes",
            Self::Text => "text",
            Self::OpaqueUnknown {
                ..
            } => "unknown",
        }
    }

    /// Returns true for the opaque fallback kind.
    #[must_use]
    pub const fn is_opaque(&self) -> bool {
        matches!(self, Self::OpaqueUnknown { .. })
    }
}

/// Maps a raw type token to its semantic kind.
///
/// Matching ignores whitespace and the compact runtime qualifier. The
/// function is total: every input yields a kind.
#[must_use]
pub fn map_type(token: &TypeToken) -> SemanticKind {
    let compact: String = token.as_str().chars().filter(|ch| !ch.is_whitespace()).collect();
    let name = compact.strip_prefix(RUNTIME_QUALIFIER).unwrap_or(&compact);
    let recognized = match name {
        "bigint" | "number" => Some(SemanticKind::Integer {
            range: IntegerRange::Signed,
        }),
        "Field" | "Counter" => Some(SemanticKind::Integer {
            range: IntegerRange::NonNegative,
        }),
        "boolean" | "Boolean" => Some(SemanticKind::Boolean),
        "Uint8Array" => Some(SemanticKind::Bytes {
            width: None,
        }),
        "string" | "Opaque<\"string\">" | "Opaque<'string'>" => Some(SemanticKind::Text),
        _ => map_generic(name),
    };
    recognized.unwrap_or_else(|| SemanticKind::OpaqueUnknown {
        raw: token.as_str().to_string(),
    })
}

/// Maps parameterized tokens such as `Uint<64>`, `Uint<0..10>`, and `Bytes<32>`.
fn map_generic(name: &str) -> Option<SemanticKind> {
    if let Some(argument) = generic_argument(name, "Uint") {
        if let Some((lower, upper)) = argument.split_once("..") {
            if lower != "0" {
                return None;
            }
            let bound = upper.parse::<u128>().ok().filter(|bound| *bound > 0)?;
            return Some(SemanticKind::Integer {
                range: IntegerRange::Below(bound),
            });
        }
        let bits =
            argument.parse::<u32>().ok().filter(|bits| (1 ..= MAX_INTEGER_BITS).contains(bits))?;
        return Some(SemanticKind::Integer {
            range: IntegerRange::Bits(bits),
        });
    }
    if let Some(argument) = generic_argument(name, "Bytes") {
        let width = argument.parse::<usize>().ok()?;
        return Some(SemanticKind::Bytes {
            width: Some(width),
        });
    }
    None
}

/// Returns the single generic argument of `Name<arg>`.
fn generic_argument<'a>(name: &'a str, head: &str) -> Option<&'a str> {
    name.strip_prefix(head)?.strip_prefix('<')?.strip_suffix('>')
}

// ============================================================================
// SECTION: Argument Values
// ============================================================================

/// Typed argument value produced by coercion.
///
/// # Invariants
/// - `Integer` holds canonical base-10 digits: optional `-`, no leading zeros, never `-0`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgValue {
    /// Arbitrary-precision integer in canonical decimal form.
    Integer(String),
    /// Boolean value.
    Boolean(bool),
    /// Raw bytes.
    Bytes(Vec<u8>),
    /// UTF-8 text.
    Text(String),
    /// Uninterpreted payload for opaque kinds.
    Opaque(Value),
}

impl ArgValue {
    /// Encodes the value for the gateway wire protocol.
    ///
    /// Integers travel as decimal strings and bytes as `0x`-prefixed hex.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Integer(digits) => Value::String(digits.clone()),
            Self::Boolean(value) => Value::Bool(*value),
            Self::Bytes(bytes) => Value::String(format!("0x{}", hex::encode(bytes))),
            Self::Text(text) => Value::String(text.clone()),
            Self::Opaque(value) => value.clone(),
        }
    }
}

impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(digits) => f.write_str(digits),
            Self::Boolean(value) => write!(f, "{value}"),
            Self::Bytes(bytes) => write!(f, "0x{}", hex::encode(bytes)),
            Self::Text(text) => f.write_str(text),
            Self::Opaque(value) => write!(f, "{value}"),
        }
    }
}

// ============================================================================
// SECTION: Coercion
// ============================================================================

/// Errors raised when operator input does not fit a semantic kind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoercionError {
    /// Input is not a base-10 integer.
    #[error("not an integer: {0:?}")]
    InvalidInteger(String),
    /// Integer is outside the accepted range.
    #[error("{value} is outside the accepted range ({range})")]
    OutOfRange {
        /// Canonical value that was rejected.
        value: String,
        /// Accepted range.
        range: IntegerRange,
    },
    /// Input is not a recognized boolean literal.
    #[error("not a boolean (expected true/false, yes/no, 1/0): {0:?}")]
    InvalidBoolean(String),
    /// Input is not valid hex.
    #[error("not hex-encoded bytes: {0:?}")]
    InvalidBytes(String),
    /// Decoded byte length does not match the declared width.
    #[error("expected {expected} bytes, got {actual}")]
    WidthMismatch {
        /// Declared width.
        expected: usize,
        /// Decoded length.
        actual: usize,
    },
}

/// Coerces raw operator input into a value of the given kind.
///
/// # Errors
///
/// Returns [`CoercionError`] when the input cannot represent a value of `kind`.
pub fn coerce(kind: &SemanticKind, raw: &str) -> Result<ArgValue, CoercionError> {
    match kind {
        SemanticKind::Integer {
            range,
        } => coerce_integer(*range, raw),
        SemanticKind::Boolean => coerce_boolean(raw),
        SemanticKind::Bytes {
            width,
        } => coerce_bytes(*width, raw),
        SemanticKind::Text => Ok(ArgValue::Text(raw.to_string())),
        SemanticKind::OpaqueUnknown {
            ..
        } => Ok(ArgValue::Opaque(
            serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string())),
        )),
    }
}

/// Parses and range-checks a base-10 integer.
fn coerce_integer(range: IntegerRange, raw: &str) -> Result<ArgValue, CoercionError> {
    let digits =
        canonical_digits(raw).ok_or_else(|| CoercionError::InvalidInteger(raw.to_string()))?;
    let value = BigDecimal::from_str(&digits)
        .map_err(|_| CoercionError::InvalidInteger(raw.to_string()))?;
    let zero = BigDecimal::from(0u64);
    let in_range = match range {
        IntegerRange::Signed => true,
        IntegerRange::NonNegative => value >= zero,
        IntegerRange::Bits(bits) => value >= zero && value < power_of_two(bits),
        IntegerRange::Below(bound) => {
            value >= zero
                && BigDecimal::from_str(&bound.to_string()).is_ok_and(|limit| value < limit)
        }
    };
    if !in_range {
        return Err(CoercionError::OutOfRange {
            value: digits,
            range,
        });
    }
    Ok(ArgValue::Integer(digits))
}

/// Normalizes integer text to canonical digits, or `None` when malformed.
///
/// Accepts an optional sign and `_` separators between digits.
fn canonical_digits(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let (negative, body) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    if body.is_empty() || body.starts_with('_') || body.ends_with('_') {
        return None;
    }
    if !body.chars().all(|ch| ch.is_ascii_digit() || ch == '_') {
        return None;
    }
    let digits: String = body.chars().filter(char::is_ascii_digit).collect();
    let stripped = digits.trim_start_matches('0');
    if stripped.is_empty() {
        return Some("0".to_string());
    }
    if negative { Some(format!("-{stripped}")) } else { Some(stripped.to_string()) }
}

/// Computes `2^bits` exactly.
fn power_of_two(bits: u32) -> BigDecimal {
    let two = BigDecimal::from(2u64);
    (0 .. bits).fold(BigDecimal::from(1u64), |acc, _| acc * &two)
}

/// Parses a boolean literal.
fn coerce_boolean(raw: &str) -> Result<ArgValue, CoercionError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "y" | "1" => Ok(ArgValue::Boolean(true)),
        "false" | "no" | "n" | "0" => Ok(ArgValue::Boolean(false)),
        _ => Err(CoercionError::InvalidBoolean(raw.to_string())),
    }
}

/// Decodes hex input and enforces the declared width.
fn coerce_bytes(width: Option<usize>, raw: &str) -> Result<ArgValue, CoercionError> {
    let trimmed = raw.trim();
    let body = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    let bytes = hex::decode(body).map_err(|_| CoercionError::InvalidBytes(raw.to_string()))?;
    if let Some(expected) = width
        && bytes.len() != expected
    {
        return Err(CoercionError::WidthMismatch {
            expected,
            actual: bytes.len(),
        });
    }
    Ok(ArgValue::Bytes(bytes))
}

// ============================================================================
// SECTION: Tests
// ============================================================================
