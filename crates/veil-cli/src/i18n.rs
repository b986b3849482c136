// crates/veil-cli/src/i18n.rs
// ============================================================================
// Module: CLI Internationalization Helpers
// Description: Provides message catalog and translation utilities for the CLI.
// Purpose: Centralize user-facing strings for the shell and session runner.
// Dependencies: Standard library collections and formatting utilities.
// ============================================================================

//! ## Overview
//! The Veil CLI stores user-facing strings in a small translation catalog so
//! menu prompts, session output, and command results stay consistent. All
//! runtime output should be routed through the [`t!`](crate::t) macro.
//!
//! ## Invariants
//! - The catalog is initialized once and read-only thereafter.
//! - Missing keys fall back to English and then to the key itself.
//! - Placeholder substitutions preserve deterministic order.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::sync::OnceLock;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Supported CLI locales.
///
/// # Invariants
/// - Variants are stable for CLI parsing and catalog lookup.
/// - [`Locale::En`] is the default fallback locale.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Locale {
    /// English (default).
    En,
    /// Catalan.
    Ca,
}

impl Locale {
    /// Returns the canonical locale label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Ca => "ca",
        }
    }

    /// Attempts to parse a locale value (case-insensitive, tolerant of region tags).
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }
        let normalized = value.to_ascii_lowercase();
        let lang = normalized.split(['-', '_']).next().unwrap_or("");
        match lang {
            "en" => Some(Self::En),
            "ca" => Some(Self::Ca),
            _ => None,
        }
    }
}

/// Ordered list of supported CLI locales.
pub const SUPPORTED_LOCALES: &[Locale] = &[Locale::En, Locale::Ca];

/// A formatted message argument captured by the [`macro@crate::t`] macro.
///
/// # Invariants
/// - `key` matches a placeholder name without braces (for example, `path`).
#[derive(Clone)]
pub struct MessageArg {
    /// The placeholder name used in message templates (e.g., `"path"`).
    pub key: &'static str,
    /// The formatted string value to substitute for this placeholder.
    pub value: String,
}

impl MessageArg {
    /// Constructs a new [`MessageArg`] from a key and displayable value.
    pub fn new(key: &'static str, value: impl Into<String>) -> Self {
        Self {
            key,
            value: value.into(),
        }
    }
}

// ============================================================================
// SECTION: Locale Selection
// ============================================================================

/// Global locale selection for CLI output.
static CURRENT_LOCALE: OnceLock<Locale> = OnceLock::new();

/// Sets the CLI locale. Only the first call wins.
pub fn set_locale(locale: Locale) {
    let _ = CURRENT_LOCALE.set(locale);
}

/// Returns the current CLI locale (defaults to English).
#[must_use]
pub fn current_locale() -> Locale {
    CURRENT_LOCALE.get().copied().unwrap_or(Locale::En)
}

// ============================================================================
// SECTION: Catalog
// ============================================================================

/// Static English catalog entries.
const CATALOG_EN: &[(&str, &str)] = &[
    ("main.version", "veil {version}"),
    ("output.stream.stdout", "stdout"),
    ("output.stream.stderr", "stderr"),
    ("output.stream.unknown", "output"),
    ("output.write_failed", "Failed to write to {stream}: {error}"),
    ("i18n.lang.invalid_env", "Invalid value for {env}: {value}. Expected 'en' or 'ca'."),
    (
        "i18n.disclaimer.machine_translated",
        "Note: non-English output is machine-translated and may be inaccurate.",
    ),
    ("config.load_failed", "Failed to load configuration: {error}"),
    ("extract.failed", "Failed to analyze contract: {error}"),
    ("analyze.header", "Contract: {name}"),
    (
        "analyze.summary",
        "{operations} operations ({read_only} read-only), {ledger} ledger fields, {witnesses} \
         witnesses",
    ),
    ("analyze.section.operations", "Operations:"),
    ("analyze.section.ledger", "Ledger state:"),
    ("analyze.section.witnesses", "Witnesses:"),
    ("analyze.operation", "  {name}({params}) -> {returns} [{mutability}]"),
    ("analyze.operation.description", "      {description}"),
    ("analyze.ledger_field", "  {name}: {ty} ({kind})"),
    ("analyze.witness", "  {name}: ledger {ledger}, private state {private}"),
    ("analyze.none", "  (none)"),
    ("analyze.mutating", "mutating"),
    ("analyze.read_only", "read-only"),
    ("analyze.json_failed", "Failed to serialize schema: {error}"),
    ("generate.written", "Wrote {count} wrappers for {contract} to {path}"),
    ("generate.failed", "Failed to generate wrappers: {error}"),
    ("check.ok", "Wrappers at {path} are up to date."),
    ("check.failed", "Wrapper check failed: {error}"),
    ("log.open_failed", "Failed to open session log {path}: {error}"),
    (
        "run.address_missing",
        "No contract address configured; pass --address or set network.contract_address.",
    ),
    ("run.gateway_failed", "Failed to create gateway client: {error}"),
    (
        "run.network",
        "Network {profile}: node {node}, indexer {indexer}, proof server {proof_server}",
    ),
    ("run.gateway", "Gateway {url} for contract {address}"),
    ("run.io_failed", "Session input/output failed: {error}"),
    ("run.summary", "Session ended ({reason}): {attempted} invocations, {failures} failures."),
    ("menu.header", "Select an action:"),
    ("menu.read_only", "[read-only]"),
    ("menu.quit_hint", "Enter a number, or q to quit."),
    ("menu.ledger.label", "Display ledger state"),
    ("menu.ledger.description", "Show every ledger field and its current value"),
    ("runner.prompt", "> "),
    ("runner.error", "Error: {error}"),
    ("runner.param.prompt", "{name} ({kind}): "),
    ("runner.param.choices", "{name}: choose one of {choices}"),
    ("runner.param.choice", "  {number}. {label}"),
    ("runner.param.cancelled", "Cancelled; back to the menu."),
    ("runner.invoking", "Calling {operation}..."),
    ("runner.tx", "Transaction {tx_id} added in block {block_height}"),
    ("runner.tx.hash", "Block hash: {hash}"),
    ("runner.result", "Result: {value}"),
    ("runner.ledger.header", "Ledger state:"),
    ("runner.ledger.field", "  {name}: {value}"),
    ("runner.ledger.unavailable", "<unavailable>"),
    ("runner.ledger.empty", "  (no ledger fields)"),
    ("runner.goodbye", "Goodbye."),
    ("runner.connection_lost", "Connection to the contract was lost; ending session."),
];

/// Static Catalan catalog entries.
const CATALOG_CA: &[(&str, &str)] = &[
    ("main.version", "veil {version}"),
    ("output.stream.stdout", "stdout"),
    ("output.stream.stderr", "stderr"),
    ("output.stream.unknown", "sortida"),
    ("output.write_failed", "No s'ha pogut escriure a {stream}: {error}"),
    ("i18n.lang.invalid_env", "Valor no vàlid per a {env}: {value}. S'esperava 'en' o 'ca'."),
    (
        "i18n.disclaimer.machine_translated",
        "Nota: la sortida que no és en anglès està traduïda automàticament i pot ser inexacta.",
    ),
    ("config.load_failed", "No s'ha pogut carregar la configuració: {error}"),
    ("extract.failed", "No s'ha pogut analitzar el contracte: {error}"),
    ("analyze.header", "Contracte: {name}"),
    (
        "analyze.summary",
        "{operations} operacions ({read_only} de només lectura), {ledger} camps del registre, \
         {witnesses} testimonis",
    ),
    ("analyze.section.operations", "Operacions:"),
    ("analyze.section.ledger", "Estat del registre:"),
    ("analyze.section.witnesses", "Testimonis:"),
    ("analyze.operation", "  {name}({params}) -> {returns} [{mutability}]"),
    ("analyze.operation.description", "      {description}"),
    ("analyze.ledger_field", "  {name}: {ty} ({kind})"),
    ("analyze.witness", "  {name}: registre {ledger}, estat privat {private}"),
    ("analyze.none", "  (cap)"),
    ("analyze.mutating", "modifica"),
    ("analyze.read_only", "només lectura"),
    ("analyze.json_failed", "No s'ha pogut serialitzar l'esquema: {error}"),
    ("generate.written", "S'han escrit {count} embolcalls per a {contract} a {path}"),
    ("generate.failed", "No s'han pogut generar els embolcalls: {error}"),
    ("check.ok", "Els embolcalls de {path} estan al dia."),
    ("check.failed", "La comprovació dels embolcalls ha fallat: {error}"),
    ("log.open_failed", "No s'ha pogut obrir el registre de sessió {path}: {error}"),
    (
        "run.address_missing",
        "No hi ha cap adreça de contracte configurada; feu servir --address o definiu \
         network.contract_address.",
    ),
    ("run.gateway_failed", "No s'ha pogut crear el client de la passarel·la: {error}"),
    (
        "run.network",
        "Xarxa {profile}: node {node}, indexador {indexer}, servidor de proves {proof_server}",
    ),
    ("run.gateway", "Passarel·la {url} per al contracte {address}"),
    ("run.io_failed", "L'entrada/sortida de la sessió ha fallat: {error}"),
    (
        "run.summary",
        "Sessió finalitzada ({reason}): {attempted} invocacions, {failures} errors.",
    ),
    ("menu.header", "Seleccioneu una acció:"),
    ("menu.read_only", "[només lectura]"),
    ("menu.quit_hint", "Introduïu un número, o q per sortir."),
    ("menu.ledger.label", "Mostra l'estat del registre"),
    ("menu.ledger.description", "Mostra cada camp del registre i el seu valor actual"),
    ("runner.prompt", "> "),
    ("runner.error", "Error: {error}"),
    ("runner.param.prompt", "{name} ({kind}): "),
    ("runner.param.choices", "{name}: trieu una de {choices}"),
    ("runner.param.choice", "  {number}. {label}"),
    ("runner.param.cancelled", "Cancel·lat; tornem al menú."),
    ("runner.invoking", "S'està cridant {operation}..."),
    ("runner.tx", "Transacció {tx_id} afegida al bloc {block_height}"),
    ("runner.tx.hash", "Hash del bloc: {hash}"),
    ("runner.result", "Resultat: {value}"),
    ("runner.ledger.header", "Estat del registre:"),
    ("runner.ledger.field", "  {name}: {value}"),
    ("runner.ledger.unavailable", "<no disponible>"),
    ("runner.ledger.empty", "  (cap camp al registre)"),
    ("runner.goodbye", "Adéu."),
    ("runner.connection_lost", "S'ha perdut la connexió amb el contracte; es tanca la sessió."),
];

/// Returns the raw catalog entries for the requested locale.
#[cfg(test)]
pub(crate) const fn catalog_entries_for(locale: Locale) -> &'static [(&'static str, &'static str)] {
    match locale {
        Locale::En => CATALOG_EN,
        Locale::Ca => CATALOG_CA,
    }
}

/// Returns the message catalog for the requested locale.
pub(crate) fn catalog_for(locale: Locale) -> &'static HashMap<&'static str, &'static str> {
    static CATALOG_EN_MAP: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();
    static CATALOG_CA_MAP: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();
    match locale {
        Locale::En => CATALOG_EN_MAP.get_or_init(|| CATALOG_EN.iter().copied().collect()),
        Locale::Ca => CATALOG_CA_MAP.get_or_init(|| CATALOG_CA.iter().copied().collect()),
    }
}

// ============================================================================
// SECTION: Translation
// ============================================================================

/// Translates `key` using the selected locale while substituting `args`.
#[must_use]
pub fn translate(key: &str, args: Vec<MessageArg>) -> String {
    translate_for(current_locale(), key, args)
}

/// Translates `key` for an explicit locale.
#[must_use]
pub fn translate_for(locale: Locale, key: &str, args: Vec<MessageArg>) -> String {
    let template = catalog_for(locale)
        .get(key)
        .copied()
        .or_else(|| catalog_for(Locale::En).get(key).copied())
        .unwrap_or(key);
    if args.is_empty() {
        return template.to_string();
    }

    let mut result = template.to_string();
    for arg in args {
        let placeholder = format!("{{{}}}", arg.key);
        result = result.replace(&placeholder, &arg.value);
    }
    result
}

// ============================================================================
// SECTION: Macro
// ============================================================================

/// Formats a localized message from a key and named arguments.
///
/// # Arguments
///
/// - `$key` must match a catalog entry.
/// - Named arguments are substituted into `{placeholder}` positions.
#[macro_export]
macro_rules! t {
    ($key:literal $(, $name:ident = $value:expr )* $(,)?) => {{
        let args = ::std::vec![
            $(
                $crate::i18n::MessageArg::new(stringify!($name), $value.to_string()),
            )*
        ];
        $crate::i18n::translate($key, args)
    }};
}
