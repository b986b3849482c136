// crates/veil-contract/src/lexer.rs
// ============================================================================
// Module: Declaration Lexer
// Description: Tokenizer for generated TypeScript declaration artifacts.
// Purpose: Produce line-tagged tokens with doc comments preserved.
// Dependencies: none
// ============================================================================

//! ## Overview
//! The artifact grammar is treated as opaque text. The lexer only knows enough
//! to separate identifiers, punctuation, literals, and comments so the parser
//! can find declaration groups and member boundaries. Ordinary comments are
//! dropped; `/** ... */` doc comments are kept as [`TokenKind::Doc`] with
//! their text normalized.

// ============================================================================
// SECTION: Types
// ============================================================================

/// Token category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// Identifier or keyword (including `$` and `_`).
    Ident(String),
    /// Single punctuation character.
    Punct(char),
    /// `=>` arrow.
    Arrow,
    /// String or template literal, quotes included.
    Str(String),
    /// Numeric literal.
    Number(String),
    /// Normalized doc comment text.
    Doc(String),
}

/// Token with its source position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Token category and payload.
    pub kind: TokenKind,
    /// 1-based line of the first character.
    pub line: usize,
    /// Byte offset of the first character.
    pub start: usize,
}

impl Token {
    /// Returns true when the token is the given punctuation character.
    #[must_use]
    pub fn is_punct(&self, ch: char) -> bool {
        self.kind == TokenKind::Punct(ch)
    }

    /// Returns the identifier text when the token is an identifier.
    #[must_use]
    pub fn ident(&self) -> Option<&str> {
        match &self.kind {
            TokenKind::Ident(name) => Some(name),
            _ => None,
        }
    }

    /// Returns true when the token is the given identifier.
    #[must_use]
    pub fn is_ident(&self, name: &str) -> bool {
        self.ident() == Some(name)
    }

    /// Returns the token text as it should appear in rendered type text.
    #[must_use]
    pub fn text(&self) -> String {
        match &self.kind {
            TokenKind::Ident(text) | TokenKind::Str(text) | TokenKind::Number(text) => {
                text.clone()
            }
            TokenKind::Punct(ch) => ch.to_string(),
            TokenKind::Arrow => "=>".to_string(),
            TokenKind::Doc(_) => String::new(),
        }
    }
}

/// Lexical failure with its line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    /// 1-based line where the failure was detected.
    pub line: usize,
    /// Failure description.
    pub message: String,
}

// ============================================================================
// SECTION: Tokenizer
// ============================================================================

/// Tokenizes declaration text.
///
/// # Errors
///
/// Returns [`LexError`] for unterminated comments or string literals.
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    let mut cursor = Cursor::new(source);
    let mut tokens = Vec::new();
    while let Some(ch) = cursor.peek() {
        let start = cursor.offset;
        let line = cursor.line;
        if ch.is_whitespace() {
            cursor.bump();
            continue;
        }
        if cursor.starts_with("//") {
            cursor.skip_line();
            continue;
        }
        if cursor.starts_with("/*") {
            let doc = cursor.starts_with("/**") && !cursor.starts_with("/**/");
            let body = cursor.block_comment().ok_or_else(|| LexError {
                line,
                message: "unterminated comment".to_string(),
            })?;
            if doc {
                tokens.push(Token {
                    kind: TokenKind::Doc(normalize_doc_comment(body)),
                    line,
                    start,
                });
            }
            continue;
        }
        let kind = if is_ident_start(ch) {
            TokenKind::Ident(cursor.take_while(is_ident_continue).to_string())
        } else if ch.is_ascii_digit() {
            let digits = cursor.take_while(|c| c.is_ascii_alphanumeric() || c == '.');
            TokenKind::Number(digits.to_string())
        } else if matches!(ch, '"' | '\'' | '`') {
            let literal = cursor.string_literal(ch).ok_or_else(|| LexError {
                line,
                message: "unterminated string literal".to_string(),
            })?;
            TokenKind::Str(literal.to_string())
        } else if cursor.starts_with("=>") {
            cursor.bump();
            cursor.bump();
            TokenKind::Arrow
        } else {
            cursor.bump();
            TokenKind::Punct(ch)
        };
        tokens.push(Token {
            kind,
            line,
            start,
        });
    }
    Ok(tokens)
}

/// Collapses a doc comment body into a single line of prose.
///
/// Leading `*` gutters are removed and `@tag` lines are dropped.
fn normalize_doc_comment(body: &str) -> String {
    let mut words = Vec::new();
    for line in body.lines() {
        let line = line.trim().trim_start_matches('*').trim();
        if line.starts_with('@') {
            continue;
        }
        words.extend(line.split_whitespace());
    }
    words.join(" ")
}

/// Returns true for characters that can start an identifier.
fn is_ident_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_' || ch == '$'
}

/// Returns true for characters that can continue an identifier.
fn is_ident_continue(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || ch == '$'
}

// ============================================================================
// SECTION: Cursor
// ============================================================================

/// Character cursor tracking byte offset and line.
struct Cursor<'a> {
    /// Source text.
    source: &'a str,
    /// Current byte offset.
    offset: usize,
    /// Current 1-based line.
    line: usize,
}

impl<'a> Cursor<'a> {
    /// Creates a cursor at the start of `source`.
    const fn new(source: &'a str) -> Self {
        Self {
            source,
            offset: 0,
            line: 1,
        }
    }

    /// Returns the remaining text.
    fn rest(&self) -> &'a str {
        self.source.get(self.offset ..).unwrap_or_default()
    }

    /// Returns the next character without consuming it.
    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    /// Returns true when the remaining text starts with `prefix`.
    fn starts_with(&self, prefix: &str) -> bool {
        self.rest().starts_with(prefix)
    }

    /// Consumes one character.
    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.offset += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
        }
        Some(ch)
    }

    /// Consumes characters while `predicate` holds and returns them.
    fn take_while(&mut self, predicate: impl Fn(char) -> bool) -> &'a str {
        let start = self.offset;
        while let Some(ch) = self.peek() {
            if !predicate(ch) {
                break;
            }
            self.bump();
        }
        self.source.get(start .. self.offset).unwrap_or_default()
    }

    /// Consumes through the end of the current line.
    fn skip_line(&mut self) {
        while let Some(ch) = self.bump() {
            if ch == '\n' {
                break;
            }
        }
    }

    /// Consumes a `/* ... */` comment and returns its body.
    fn block_comment(&mut self) -> Option<&'a str> {
        self.bump();
        self.bump();
        let start = self.offset;
        loop {
            if self.starts_with("*/") {
                let body = self.source.get(start .. self.offset).unwrap_or_default();
                self.bump();
                self.bump();
                return Some(body);
            }
            self.bump()?;
        }
    }

    /// Consumes a quoted literal and returns it with its quotes.
    fn string_literal(&mut self, quote: char) -> Option<&'a str> {
        let start = self.offset;
        self.bump();
        loop {
            match self.bump()? {
                '\\' => {
                    self.bump()?;
                }
                '\n' if quote != '`' => return None,
                ch if ch == quote => {
                    return Some(self.source.get(start .. self.offset).unwrap_or_default());
                }
                _ => {}
            }
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
