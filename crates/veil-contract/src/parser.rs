// crates/veil-contract/src/parser.rs
// ============================================================================
// Module: Declaration Parser
// Description: Derives a contract schema from declaration-artifact tokens.
// Purpose: Discover operations, ledger fields, and witnesses deterministically.
// Dependencies: veil-core
// ============================================================================

//! ## Overview
//! The parser locates the top-level `export type <Group> = { ... }`
//! declarations emitted by the contract compiler and splits each body into
//! members. Operation groups yield signatures, the ledger group yields
//! `name: Type` properties, and the witness group yields witness bindings.
//!
//! ### Grammar assumptions
//! - Members are separated by `;` or `,` at the top level of a group body, or
//!   by a line break when the previous line cannot continue.
//! - A `/** ... */` comment directly before a member is its description.
//! - Delimiters `()[]{}<>` must balance across the whole artifact.
//!
//! Type text is re-rendered from tokens with canonical spacing so schemas do
//! not depend on how the artifact was formatted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use veil_core::ContractSchema;
use veil_core::DeclarationGroup;
use veil_core::DeclarationGroups;
use veil_core::Mutability;
use veil_core::Operation;
use veil_core::Parameter;
use veil_core::TypeToken;
use veil_core::Witness;
use veil_core::default_description;

use crate::lexer::LexError;
use crate::lexer::Token;
use crate::lexer::TokenKind;
use crate::lexer::tokenize;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Declaration name of the state-mutating operation group.
pub const TRANSACTION_GROUP: &str = "ImpureCircuits";
/// Declaration name of the read-only operation group.
pub const QUERY_GROUP: &str = "PureCircuits";
/// Declaration name of the combined operation group.
pub const COMBINED_GROUP: &str = "Circuits";
/// Declaration name of the ledger shape.
pub const LEDGER_GROUP: &str = "Ledger";
/// Declaration name of the witness group.
pub const WITNESS_GROUP: &str = "Witnesses";

/// Operation groups in the order they are scanned.
const OPERATION_GROUPS: [(&str, DeclarationGroup); 3] = [
    (TRANSACTION_GROUP, DeclarationGroup::Transaction),
    (QUERY_GROUP, DeclarationGroup::Query),
    (COMBINED_GROUP, DeclarationGroup::Combined),
];

/// Group preference when an operation is declared more than once.
const SIGNATURE_PREFERENCE: [DeclarationGroup; 3] =
    [DeclarationGroup::Query, DeclarationGroup::Transaction, DeclarationGroup::Combined];

/// Runtime context type dropped from operation parameters.
const CIRCUIT_CONTEXT: &str = "CircuitContext";
/// Runtime result wrapper unwrapped from operation returns.
const CIRCUIT_RESULTS: &str = "CircuitResults";
/// Runtime context type carried by witnesses.
const WITNESS_CONTEXT: &str = "WitnessContext";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Syntax failure with the 1-based line it was detected on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    /// 1-based line.
    pub line: usize,
    /// Failure description.
    pub message: String,
}

impl SyntaxError {
    /// Builds an error at `line`.
    fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

impl From<LexError> for SyntaxError {
    fn from(err: LexError) -> Self {
        Self {
            line: err.line,
            message: err.message,
        }
    }
}

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// Parses declaration text into a contract schema.
///
/// # Errors
///
/// Returns [`SyntaxError`] when the mandatory operation groups are missing or
/// any declaration group cannot be tokenized into members.
pub fn parse_schema(name: &str, source: &str) -> Result<ContractSchema, SyntaxError> {
    let tokens = tokenize(source)?;
    check_balance(&tokens)?;
    let groups = find_groups(&tokens)?;
    if !OPERATION_GROUPS.iter().any(|(group_name, _)| groups.contains_key(group_name)) {
        return Err(SyntaxError::new(
            1,
            format!(
                "no operation declarations found (expected {TRANSACTION_GROUP}, {QUERY_GROUP}, \
                 or {COMBINED_GROUP})"
            ),
        ));
    }
    let operations = discover_operations(&groups)?;
    let ledger_fields = match groups.get(LEDGER_GROUP) {
        Some(group) => discover_ledger(group)?,
        None => BTreeMap::new(),
    };
    let witnesses = match groups.get(WITNESS_GROUP) {
        Some(group) => discover_witnesses(group)?,
        None => Vec::new(),
    };
    ContractSchema::new(name, operations, ledger_fields, witnesses)
        .map_err(|err| SyntaxError::new(1, err.to_string()))
}

// ============================================================================
// SECTION: Declaration Groups
// ============================================================================

/// Body of a top-level `export type Name = { ... }` declaration.
struct Group<'t> {
    /// Group name.
    name: &'static str,
    /// Tokens between the braces.
    body: &'t [Token],
}

/// Returns the opening delimiter matched by `close`.
const fn opener_for(close: char) -> Option<char> {
    match close {
        ')' => Some('('),
        ']' => Some('['),
        '}' => Some('{'),
        '>' => Some('<'),
        _ => None,
    }
}

/// Returns true for opening delimiters.
const fn is_opener(ch: char) -> bool {
    matches!(ch, '(' | '[' | '{' | '<')
}

/// Returns the delimiter depth change contributed by `token`.
fn depth_delta(token: &Token) -> isize {
    match token.kind {
        TokenKind::Punct(ch) if is_opener(ch) => 1,
        TokenKind::Punct(ch) if opener_for(ch).is_some() => -1,
        _ => 0,
    }
}

/// Verifies that every delimiter in the artifact is balanced.
fn check_balance(tokens: &[Token]) -> Result<(), SyntaxError> {
    let mut stack: Vec<(char, usize)> = Vec::new();
    for token in tokens {
        let TokenKind::Punct(ch) = token.kind else {
            continue;
        };
        if is_opener(ch) {
            stack.push((ch, token.line));
        } else if let Some(open) = opener_for(ch) {
            match stack.pop() {
                Some((top, _)) if top == open => {}
                _ => {
                    return Err(SyntaxError::new(
                        token.line,
                        format!("unbalanced delimiter `{ch}`"),
                    ));
                }
            }
        }
    }
    match stack.pop() {
        Some((open, line)) => Err(SyntaxError::new(line, format!("unclosed delimiter `{open}`"))),
        None => Ok(()),
    }
}

/// Returns the index of the delimiter closing the opener at `open`.
///
/// Assumes the token stream passed [`check_balance`].
fn matching(tokens: &[Token], open: usize) -> Option<usize> {
    let mut depth: isize = 0;
    for (index, token) in tokens.iter().enumerate().skip(open) {
        depth += depth_delta(token);
        if depth == 0 {
            return Some(index);
        }
    }
    None
}

/// Maps a declaration name to its static group name.
fn known_group(name: &str) -> Option<&'static str> {
    [TRANSACTION_GROUP, QUERY_GROUP, COMBINED_GROUP, LEDGER_GROUP, WITNESS_GROUP]
        .into_iter()
        .find(|group| *group == name)
}

/// Finds the known top-level declaration groups.
fn find_groups(tokens: &[Token]) -> Result<BTreeMap<&'static str, Group<'_>>, SyntaxError> {
    let mut groups = BTreeMap::new();
    let mut depth: isize = 0;
    let mut index = 0;
    while let Some(token) = tokens.get(index) {
        if depth == 0
            && token.is_ident("export")
            && tokens.get(index + 1).is_some_and(|next| next.is_ident("type"))
            && let Some(name) = tokens.get(index + 2).and_then(Token::ident).and_then(known_group)
            && let Some((open, close)) = group_braces(tokens, index + 3)
        {
            let body = tokens.get(open + 1 .. close).unwrap_or_default();
            let group = Group {
                name,
                body,
            };
            if groups.insert(name, group).is_some() {
                return Err(SyntaxError::new(
                    token.line,
                    format!("duplicate declaration of `{name}`"),
                ));
            }
            index = close + 1;
            continue;
        }
        depth += depth_delta(token);
        index += 1;
    }
    Ok(groups)
}

/// Locates `<...>? = {` starting at `cursor` and returns the brace indices.
fn group_braces(tokens: &[Token], mut cursor: usize) -> Option<(usize, usize)> {
    if tokens.get(cursor)?.is_punct('<') {
        cursor = matching(tokens, cursor)? + 1;
    }
    if !tokens.get(cursor)?.is_punct('=') || !tokens.get(cursor + 1)?.is_punct('{') {
        return None;
    }
    let open = cursor + 1;
    Some((open, matching(tokens, open)?))
}

// ============================================================================
// SECTION: Members
// ============================================================================

/// One member of a declaration group body.
struct Member<'t> {
    /// Member tokens, excluding separators and the leading doc comment.
    tokens: &'t [Token],
    /// Leading doc comment, when present.
    doc: Option<String>,
    /// 1-based line of the first token.
    line: usize,
}

/// Returns true when a line break between `prev` and `next` cannot end a member.
fn continues(prev: &Token, next: &Token) -> bool {
    let trailing = match prev.kind {
        TokenKind::Arrow => true,
        TokenKind::Punct(ch) => matches!(ch, ':' | '|' | '&' | '.' | '=' | '?'),
        _ => false,
    };
    let leading = match next.kind {
        TokenKind::Arrow => true,
        TokenKind::Punct(ch) => matches!(ch, ':' | '|' | '&' | '.' | '=' | '?' | ')' | ']' | '>'),
        _ => false,
    };
    trailing || leading
}

/// Splits a group body into members.
fn split_members(body: &[Token]) -> Vec<Member<'_>> {
    let mut members = Vec::new();
    let mut depth: isize = 0;
    let mut start: Option<usize> = None;
    let mut pending_doc: Option<String> = None;
    let mut member_doc: Option<String> = None;
    let mut prev: Option<&Token> = None;
    let mut flush = |start: &mut Option<usize>, end: usize, doc: &mut Option<String>| {
        if let Some(first) = start.take()
            && let Some(tokens) = body.get(first .. end)
            && let Some(head) = tokens.first()
        {
            members.push(Member {
                tokens,
                doc: doc.take(),
                line: head.line,
            });
        }
    };
    for (index, token) in body.iter().enumerate() {
        if depth == 0 {
            match &token.kind {
                TokenKind::Doc(text) => {
                    flush(&mut start, index, &mut member_doc);
                    pending_doc = Some(text.clone());
                    continue;
                }
                TokenKind::Punct(';' | ',') => {
                    flush(&mut start, index, &mut member_doc);
                    prev = Some(token);
                    continue;
                }
                _ => {}
            }
            if start.is_some()
                && let Some(previous) = prev
                && token.line > previous.line
                && !continues(previous, token)
            {
                flush(&mut start, index, &mut member_doc);
            }
        }
        if start.is_none() && !matches!(token.kind, TokenKind::Doc(_)) {
            start = Some(index);
            member_doc = pending_doc.take();
        }
        if !matches!(token.kind, TokenKind::Doc(_)) {
            prev = Some(token);
        }
        depth += depth_delta(token);
    }
    flush(&mut start, body.len(), &mut member_doc);
    members
}

/// Splits tokens on a top-level separator, dropping empty parts.
fn split_top_level(tokens: &[Token], separator: char) -> Vec<&[Token]> {
    let mut parts = Vec::new();
    let mut depth: isize = 0;
    let mut start = 0;
    for (index, token) in tokens.iter().enumerate() {
        if depth == 0 && token.is_punct(separator) {
            parts.push(tokens.get(start .. index).unwrap_or_default());
            start = index + 1;
            continue;
        }
        depth += depth_delta(token);
    }
    parts.push(tokens.get(start ..).unwrap_or_default());
    parts.into_iter().filter(|part| part.iter().any(|token| !is_doc(token))).collect()
}

/// Returns true for doc-comment tokens.
const fn is_doc(token: &Token) -> bool {
    matches!(token.kind, TokenKind::Doc(_))
}

// ============================================================================
// SECTION: Type Rendering
// ============================================================================

/// Returns true for tokens that read as words.
const fn is_word(token: &Token) -> bool {
    matches!(token.kind, TokenKind::Ident(_) | TokenKind::Number(_) | TokenKind::Str(_))
}

/// Renders type tokens with canonical spacing.
fn render(tokens: &[Token]) -> String {
    let mut out = String::new();
    let mut prev: Option<&Token> = None;
    for token in tokens.iter().filter(|token| !is_doc(token)) {
        if let Some(previous) = prev {
            let space_before = (is_word(previous) && is_word(token))
                || matches!(token.kind, TokenKind::Arrow | TokenKind::Punct('|' | '&' | '=' | '}'));
            let space_after = matches!(
                previous.kind,
                TokenKind::Arrow | TokenKind::Punct(',' | ':' | ';' | '|' | '&' | '=' | '{')
            );
            if space_before || space_after {
                out.push(' ');
            }
        }
        out.push_str(&token.text());
        prev = Some(token);
    }
    out
}

/// Splits `Qualified.Name<A, B>` into its final name and generic arguments.
fn generic_parts(tokens: &[Token]) -> Option<(&str, Vec<&[Token]>)> {
    let open = tokens.iter().position(|token| token.is_punct('<'))?;
    if matching(tokens, open)? + 1 != tokens.len() {
        return None;
    }
    let head = tokens.get(.. open)?;
    if !head.iter().all(|token| token.ident().is_some() || token.is_punct('.')) {
        return None;
    }
    let name = head.last()?.ident()?;
    let inner = tokens.get(open + 1 .. tokens.len() - 1)?;
    Some((name, split_top_level(inner, ',')))
}

// ============================================================================
// SECTION: Signatures
// ============================================================================

/// Parsed callable member.
struct Signature<'t> {
    /// Member name.
    name: String,
    /// Parameter names with their type tokens.
    params: Vec<(String, &'t [Token])>,
    /// Return type tokens.
    returns: &'t [Token],
}

/// Parses `name(params): Ret` or `name: (params) => Ret`.
///
/// Returns `Ok(None)` when the member is not callable.
fn parse_signature<'t>(member: &Member<'t>) -> Result<Option<Signature<'t>>, SyntaxError> {
    let tokens = member.tokens;
    let Some(name) = tokens.first().and_then(Token::ident) else {
        return Ok(None);
    };
    let mut cursor = 1;
    if tokens.get(cursor).is_some_and(|token| token.is_punct('?')) {
        cursor += 1;
    }
    let arrow_form = tokens.get(cursor).is_some_and(|token| token.is_punct(':'))
        && tokens.get(cursor + 1).is_some_and(|token| token.is_punct('('));
    if arrow_form {
        cursor += 1;
    }
    if tokens.get(cursor).is_some_and(|token| token.is_punct('<')) {
        cursor = matching(tokens, cursor).map_or(tokens.len(), |close| close + 1);
    }
    if !tokens.get(cursor).is_some_and(|token| token.is_punct('(')) {
        return Ok(None);
    }
    let close = matching(tokens, cursor)
        .ok_or_else(|| SyntaxError::new(member.line, format!("unclosed parameters in `{name}`")))?;
    let mut params = Vec::new();
    for part in split_top_level(tokens.get(cursor + 1 .. close).unwrap_or_default(), ',') {
        params.push(parse_parameter(name, part, member.line)?);
    }
    let separator = tokens.get(close + 1);
    let separated = separator.is_some_and(|token| {
        if arrow_form { token.kind == TokenKind::Arrow } else { token.is_punct(':') }
    });
    let returns = tokens.get(close + 2 ..).unwrap_or_default();
    if !separated || returns.is_empty() {
        return Err(SyntaxError::new(member.line, format!("missing return type for `{name}`")));
    }
    Ok(Some(Signature {
        name: name.to_string(),
        params,
        returns,
    }))
}

/// Parses one `name?: Type` parameter.
fn parse_parameter<'t>(
    owner: &str,
    tokens: &'t [Token],
    line: usize,
) -> Result<(String, &'t [Token]), SyntaxError> {
    let tokens = tokens.iter().position(|token| !is_doc(token)).map_or(tokens, |first| {
        tokens.get(first ..).unwrap_or_default()
    });
    let malformed =
        || SyntaxError::new(line, format!("malformed parameter in `{owner}`: {}", render(tokens)));
    let name = tokens.first().and_then(Token::ident).ok_or_else(malformed)?;
    let mut cursor = 1;
    if tokens.get(cursor).is_some_and(|token| token.is_punct('?')) {
        cursor += 1;
    }
    if !tokens.get(cursor).is_some_and(|token| token.is_punct(':')) {
        return Err(malformed());
    }
    let ty = tokens.get(cursor + 1 ..).unwrap_or_default();
    if ty.is_empty() {
        return Err(malformed());
    }
    Ok((name.to_string(), ty))
}

// ============================================================================
// SECTION: Operations
// ============================================================================

/// One declaration of an operation within a group.
struct Declared {
    /// Parameters without the runtime context.
    parameters: Vec<Parameter>,
    /// Unwrapped return type.
    return_type: TypeToken,
    /// Doc comment, when present.
    doc: Option<String>,
}

/// Operation accumulated across groups.
struct Discovered {
    /// Operation name.
    name: String,
    /// Byte offset of the first appearance.
    first_seen: usize,
    /// Groups the name was declared in.
    groups: DeclarationGroups,
    /// Declarations keyed by group.
    declarations: BTreeMap<DeclarationGroup, Declared>,
}

/// Discovers operations across the operation groups.
fn discover_operations(
    groups: &BTreeMap<&'static str, Group<'_>>,
) -> Result<Vec<Operation>, SyntaxError> {
    let mut discovered: Vec<Discovered> = Vec::new();
    let mut by_name: BTreeMap<String, usize> = BTreeMap::new();
    for (group_name, kind) in OPERATION_GROUPS {
        let Some(group) = groups.get(group_name) else {
            continue;
        };
        let mut seen = BTreeSet::new();
        for member in split_members(group.body) {
            let signature = parse_signature(&member)?.ok_or_else(|| {
                SyntaxError::new(
                    member.line,
                    format!("malformed signature in {}: {}", group.name, render(member.tokens)),
                )
            })?;
            if !seen.insert(signature.name.clone()) {
                return Err(SyntaxError::new(
                    member.line,
                    format!("duplicate operation `{}` in {}", signature.name, group.name),
                ));
            }
            let first_seen = member.tokens.first().map_or(0, |token| token.start);
            let declared = declare_operation(&signature, member.doc);
            let slot = match by_name.get(&signature.name) {
                Some(slot) => *slot,
                None => {
                    by_name.insert(signature.name.clone(), discovered.len());
                    discovered.push(Discovered {
                        name: signature.name.clone(),
                        first_seen,
                        groups: DeclarationGroups::new(),
                        declarations: BTreeMap::new(),
                    });
                    discovered.len() - 1
                }
            };
            if let Some(entry) = discovered.get_mut(slot) {
                entry.first_seen = entry.first_seen.min(first_seen);
                entry.groups.insert(kind);
                entry.declarations.insert(kind, declared);
            }
        }
    }
    discovered.sort_by_key(|entry| entry.first_seen);
    Ok(discovered.into_iter().filter_map(finish_operation).collect())
}

/// Converts a parsed signature into a group declaration.
fn declare_operation(signature: &Signature<'_>, doc: Option<String>) -> Declared {
    let mut params = signature.params.as_slice();
    if let Some(((_, first), rest)) = params.split_first()
        && generic_parts(first).is_some_and(|(name, _)| name == CIRCUIT_CONTEXT)
    {
        params = rest;
    }
    let parameters =
        params.iter().map(|(name, ty)| Parameter::new(name.clone(), render(ty).as_str())).collect();
    let return_type = match generic_parts(signature.returns) {
        Some((CIRCUIT_RESULTS, args)) if args.len() == 2 => {
            args.get(1).map_or_else(TypeToken::unit, |result| TypeToken::new(render(result)))
        }
        _ => TypeToken::new(render(signature.returns)),
    };
    Declared {
        parameters,
        return_type,
        doc: doc.filter(|text| !text.is_empty()),
    }
}

/// Picks the preferred declaration and classifies mutability.
fn finish_operation(mut entry: Discovered) -> Option<Operation> {
    let mutability = Mutability::classify(&entry.groups);
    let description = SIGNATURE_PREFERENCE
        .iter()
        .find_map(|group| entry.declarations.get(group).and_then(|declared| declared.doc.clone()))
        .unwrap_or_else(|| default_description(&entry.name));
    let declared = SIGNATURE_PREFERENCE.iter().find_map(|group| entry.declarations.remove(group))?;
    Some(Operation {
        name: entry.name,
        parameters: declared.parameters,
        return_type: declared.return_type,
        mutability,
        description: Some(description),
    })
}

// ============================================================================
// SECTION: Ledger and Witnesses
// ============================================================================

/// Discovers `readonly? name: Type` ledger properties, skipping other members.
fn discover_ledger(group: &Group<'_>) -> Result<BTreeMap<String, TypeToken>, SyntaxError> {
    let mut fields = BTreeMap::new();
    for member in split_members(group.body) {
        let Some((name, ty)) = ledger_property(member.tokens) else {
            continue;
        };
        if fields.insert(name.to_string(), TypeToken::new(render(ty))).is_some() {
            return Err(SyntaxError::new(
                member.line,
                format!("duplicate ledger field `{name}` in {}", group.name),
            ));
        }
    }
    Ok(fields)
}

/// Matches a `readonly? name?: Type` property member.
fn ledger_property(tokens: &[Token]) -> Option<(&str, &[Token])> {
    let mut cursor = 0;
    if tokens.first()?.is_ident("readonly") && tokens.get(1)?.ident().is_some() {
        cursor = 1;
    }
    let name = tokens.get(cursor)?.ident()?;
    cursor += 1;
    if tokens.get(cursor)?.is_punct('?') {
        cursor += 1;
    }
    if !tokens.get(cursor)?.is_punct(':') {
        return None;
    }
    let ty = tokens.get(cursor + 1 ..)?;
    if ty.is_empty() { None } else { Some((name, ty)) }
}

/// Discovers witness bindings in declaration order.
fn discover_witnesses(group: &Group<'_>) -> Result<Vec<Witness>, SyntaxError> {
    let mut witnesses = Vec::new();
    let mut seen = BTreeSet::new();
    for member in split_members(group.body) {
        let malformed = |detail: &str| {
            SyntaxError::new(member.line, format!("malformed witness in {}: {detail}", group.name))
        };
        let signature =
            parse_signature(&member)?.ok_or_else(|| malformed(&render(member.tokens)))?;
        let context = signature.params.first().and_then(|(_, ty)| generic_parts(ty));
        let Some((WITNESS_CONTEXT, args)) = context else {
            return Err(malformed(&format!(
                "`{}` must take a {WITNESS_CONTEXT} as its first parameter",
                signature.name
            )));
        };
        let [ledger, private] = args.as_slice() else {
            return Err(malformed(&format!(
                "`{}` has a {WITNESS_CONTEXT} without two type arguments",
                signature.name
            )));
        };
        if !seen.insert(signature.name.clone()) {
            return Err(SyntaxError::new(
                member.line,
                format!("duplicate witness `{}` in {}", signature.name, group.name),
            ));
        }
        witnesses.push(Witness {
            name: signature.name,
            ledger_type: TypeToken::new(render(ledger)),
            private_type: TypeToken::new(render(private)),
            returns: tuple_elements(signature.returns),
        });
    }
    Ok(witnesses)
}

/// Splits a `[A, B]` tuple type into element tokens; other types are a single element.
fn tuple_elements(tokens: &[Token]) -> Vec<TypeToken> {
    let is_tuple = tokens.first().is_some_and(|token| token.is_punct('['))
        && matching(tokens, 0).is_some_and(|close| close + 1 == tokens.len());
    if !is_tuple {
        return vec![TypeToken::new(render(tokens))];
    }
    let inner = tokens.get(1 .. tokens.len() - 1).unwrap_or_default();
    split_top_level(inner, ',').into_iter().map(|part| TypeToken::new(render(part))).collect()
}

// ============================================================================
// SECTION: Tests
// ============================================================================
