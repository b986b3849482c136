// crates/veil-cli/src/menu.rs
// ============================================================================
// Module: Menu Builder
// Description: Turns a contract schema into numbered session actions.
// Purpose: Keep menu construction pure and deterministic.
// Dependencies: veil-core
// ============================================================================

//! ## Overview
//! [`build_menu`] maps each schema operation to a [`MenuItem`] in discovery
//! order and appends one fixed ledger-display item. Labels are derived from
//! operation names by splitting on `_`, `-`, and camel-case boundaries and
//! capitalizing each word, so `get_votes` becomes "Get Votes". Nothing here
//! performs I/O or touches a contract handle.

// ============================================================================
// SECTION: Imports
// ============================================================================

use veil_core::ContractSchema;

use crate::t;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Identifier of the fixed ledger-display item.
pub const LEDGER_ITEM_ID: &str = "display_ledger_state";

/// Inputs that end a session at the selection prompt.
pub const QUIT_INPUTS: [&str; 3] = ["q", "quit", "exit"];

/// Action bound to a menu item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    /// Invoke the operation at this index in the schema.
    Invoke(usize),
    /// Read and display every ledger field.
    DisplayLedger,
}

/// One selectable menu entry.
///
/// # Invariants
/// - `id` is the operation name, or [`LEDGER_ITEM_ID`] for the ledger item.
/// - `read_only` mirrors the bound operation's classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItem {
    /// Stable identifier.
    pub id: String,
    /// Human-readable label.
    pub label: String,
    /// One-line description.
    pub description: String,
    /// True when selecting this item cannot change ledger state.
    pub read_only: bool,
    /// Bound action.
    pub action: MenuAction,
}

// ============================================================================
// SECTION: Construction
// ============================================================================

/// Builds the ordered menu for a schema.
#[must_use]
pub fn build_menu(schema: &ContractSchema) -> Vec<MenuItem> {
    let mut items: Vec<MenuItem> = schema
        .operations
        .iter()
        .enumerate()
        .map(|(index, operation)| MenuItem {
            id: operation.name.clone(),
            label: humanize_label(&operation.name),
            description: operation.description_or_default(),
            read_only: !operation.mutates(),
            action: MenuAction::Invoke(index),
        })
        .collect();
    items.push(MenuItem {
        id: LEDGER_ITEM_ID.to_string(),
        label: t!("menu.ledger.label"),
        description: t!("menu.ledger.description"),
        read_only: true,
        action: MenuAction::DisplayLedger,
    });
    items
}

/// Converts an identifier into a capitalized, space-separated label.
#[must_use]
pub fn humanize_label(name: &str) -> String {
    label_words(name).iter().map(|word| capitalize(word)).collect::<Vec<_>>().join(" ")
}

/// Splits an identifier on separators and lower-to-upper case boundaries.
fn label_words(name: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut previous_lower = false;
    for ch in name.chars() {
        if ch == '_' || ch == '-' {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            previous_lower = false;
            continue;
        }
        if ch.is_uppercase() && previous_lower && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        previous_lower = ch.is_lowercase() || ch.is_ascii_digit();
        current.push(ch);
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

/// Uppercases the first character of a word.
fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    chars.next().map_or_else(String::new, |first| first.to_uppercase().chain(chars).collect())
}

// ============================================================================
// SECTION: Rendering and Selection
// ============================================================================

/// Renders the numbered menu question followed by the quit hint.
#[must_use]
pub fn render_menu_question(items: &[MenuItem]) -> String {
    let mut out = t!("menu.header");
    out.push('\n');
    for (index, item) in items.iter().enumerate() {
        out.push_str(&(index + 1).to_string());
        out.push_str(". ");
        out.push_str(&item.label);
        if item.read_only {
            out.push(' ');
            out.push_str(&t!("menu.read_only"));
        }
        out.push('\n');
    }
    out.push_str(&t!("menu.quit_hint"));
    out.push('\n');
    out
}

/// Resolves operator input to a menu index.
///
/// Accepts a 1-based number, an item id, or a label (case-insensitive).
#[must_use]
pub fn select(items: &[MenuItem], input: &str) -> Option<usize> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(number) = trimmed.parse::<usize>() {
        if number == 0 || number > items.len() {
            return None;
        }
        return Some(number - 1);
    }
    items.iter().position(|item| {
        item.id.eq_ignore_ascii_case(trimmed) || item.label.eq_ignore_ascii_case(trimmed)
    })
}

/// Returns true when the input asks to end the session.
#[must_use]
pub fn is_quit(input: &str) -> bool {
    let trimmed = input.trim();
    QUIT_INPUTS.iter().any(|quit| quit.eq_ignore_ascii_case(trimmed))
}

// ============================================================================
// SECTION: Tests
// ============================================================================

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
    fn labels_split_on_separators_and_camel_case() {
        assert_eq!(humanize_label("get_votes"), "Get Votes");
        assert_eq!(humanize_label("vote"), "Vote");
        assert_eq!(humanize_label("resetRound"), "Reset Round");
        assert_eq!(humanize_label("close-poll_now"), "Close Poll Now");
        assert_eq!(humanize_label("__private"), "Private");
        assert_eq!(humanize_label("mintNFT"), "Mint NFT");
        assert_eq!(humanize_label("level2Up"), "Level2 Up");
    }

    #[test]
    fn quit_inputs_are_case_insensitive() {
        assert!(is_quit("q"));
        assert!(is_quit(" QUIT "));
        assert!(is_quit("Exit"));
        assert!(!is_quit("1"));
    }
}
