/*
 * This module implements a tokenizer and recursive-descent parser for Valve's
 * VDF ("KeyValues") text format, used by the Steam client for its library
 * index (`libraryfolders.vdf`) and per-game manifests (`appmanifest_*.acf`).
 *
 * A document is a sequence of quoted keys, each followed by either a quoted
 * scalar value or a brace-delimited block of further key/value pairs.
 * Backslash is an escape character inside quotes. Whitespace between tokens
 * is insignificant. There is no comment syntax.
 *
 * These files are written by an external program and are regularly found
 * truncated or otherwise malformed on real disks, so parsing is best-effort:
 * a fault is always local. The parser records a diagnostic, re-synchronizes
 * at the nearest balanced brace boundary, and keeps going, so well-formed
 * siblings of a broken subtree are still recovered. `parse` never fails for
 * a whole document; it returns whatever root-level mapping was completed
 * together with the list of diagnostics.
 */
use std::fmt;

/*
 * One parsed value: either a scalar string or a nested block. Duplicate keys
 * are resolved at insertion time by `VdfBlock::insert`: last write wins for
 * scalars, blocks merge recursively.
 */
#[derive(Debug, Clone, PartialEq)]
pub enum VdfValue {
    Scalar(String),
    Block(VdfBlock),
}

impl VdfValue {
    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            VdfValue::Scalar(s) => Some(s),
            VdfValue::Block(_) => None,
        }
    }

    pub fn as_block(&self) -> Option<&VdfBlock> {
        match self {
            VdfValue::Scalar(_) => None,
            VdfValue::Block(b) => Some(b),
        }
    }
}

/*
 * An ordered mapping from key to `VdfValue`. Entry order is the order of
 * first appearance in the document. Lookups are ASCII case-insensitive
 * because the Steam client treats VDF keys that way (manifest fields mix
 * `appid` with `SizeOnDisk` and `StateFlags`).
 */
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VdfBlock {
    entries: Vec<(String, VdfValue)>,
}

impl VdfBlock {
    pub fn new() -> Self {
        VdfBlock {
            entries: Vec::new(),
        }
    }

    /*
     * Inserts a key/value pair, applying the duplicate-key policy: a scalar
     * under an existing key replaces the previous value, a block under an
     * existing block key merges entry by entry. The policy applies during
     * construction only; it is never re-applied retroactively.
     */
    pub fn insert(&mut self, key: String, value: VdfValue) {
        if let Some(entry) = self
            .entries
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(&key))
        {
            match (&mut entry.1, value) {
                (VdfValue::Block(existing), VdfValue::Block(incoming)) => {
                    for (child_key, child_value) in incoming.entries {
                        existing.insert(child_key, child_value);
                    }
                }
                (slot, incoming) => *slot = incoming,
            }
        } else {
            self.entries.push((key, value));
        }
    }

    pub fn get(&self, key: &str) -> Option<&VdfValue> {
        self.entries
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(key))
            .map(|(_, value)| value)
    }

    pub fn get_scalar(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(VdfValue::as_scalar)
    }

    pub fn get_block(&self, key: &str) -> Option<&VdfBlock> {
        self.get(key).and_then(VdfValue::as_block)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &VdfValue)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/*
 * A non-fatal local parse fault. Offsets are byte offsets into the source
 * text where available. Diagnostics are data for the caller to surface;
 * they are never used as control flow.
 */
#[derive(Debug, Clone, PartialEq)]
pub enum VdfDiagnostic {
    UnterminatedString { offset: usize },
    StrayText { offset: usize },
    KeyWithoutValue { key: String },
    BlockWithoutKey,
    UnmatchedCloseBrace,
    UnbalancedDocument,
}

impl fmt::Display for VdfDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VdfDiagnostic::UnterminatedString { offset } => {
                write!(f, "unterminated quoted string at byte {offset}")
            }
            VdfDiagnostic::StrayText { offset } => {
                write!(f, "unquoted text outside any token at byte {offset}")
            }
            VdfDiagnostic::KeyWithoutValue { key } => {
                write!(f, "key \"{key}\" has no following value or block")
            }
            VdfDiagnostic::BlockWithoutKey => write!(f, "block opened without a preceding key"),
            VdfDiagnostic::UnmatchedCloseBrace => {
                write!(f, "closing brace with no open block")
            }
            VdfDiagnostic::UnbalancedDocument => {
                write!(f, "end of input reached inside an open block")
            }
        }
    }
}

/*
 * The result of parsing one document: the completed root mapping plus every
 * diagnostic collected along the way. An empty diagnostics list means the
 * document was fully well-formed.
 */
#[derive(Debug, Clone, PartialEq)]
pub struct ParseOutcome {
    pub root: VdfBlock,
    pub diagnostics: Vec<VdfDiagnostic>,
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Quoted(String),
    OpenBrace,
    CloseBrace,
}

/*
 * Single-pass lexer. Emits quoted strings (with escapes resolved) and the
 * two brace tokens. An unterminated string ends the token stream, since
 * everything after the runaway quote has been consumed by it; truncation is
 * the common real-world corruption and this keeps everything lexed before
 * the fault usable. Runs of bare characters outside quotes are not part of
 * the grammar and are discarded with one diagnostic per run.
 */
fn lex(text: &str, diagnostics: &mut Vec<VdfDiagnostic>) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = text.char_indices().peekable();

    while let Some(&(offset, ch)) = chars.peek() {
        if ch.is_whitespace() {
            chars.next();
            continue;
        }
        match ch {
            '{' => {
                chars.next();
                tokens.push(Token::OpenBrace);
            }
            '}' => {
                chars.next();
                tokens.push(Token::CloseBrace);
            }
            '"' => {
                chars.next();
                let mut value = String::new();
                let mut terminated = false;
                while let Some((_, c)) = chars.next() {
                    match c {
                        '"' => {
                            terminated = true;
                            break;
                        }
                        '\\' => match chars.next() {
                            Some((_, 'n')) => value.push('\n'),
                            Some((_, 't')) => value.push('\t'),
                            Some((_, escaped)) => value.push(escaped),
                            None => break,
                        },
                        other => value.push(other),
                    }
                }
                if terminated {
                    tokens.push(Token::Quoted(value));
                } else {
                    diagnostics.push(VdfDiagnostic::UnterminatedString { offset });
                    break;
                }
            }
            _ => {
                diagnostics.push(VdfDiagnostic::StrayText { offset });
                while let Some(&(_, c)) = chars.peek() {
                    if c.is_whitespace() || c == '"' || c == '{' || c == '}' {
                        break;
                    }
                    chars.next();
                }
            }
        }
    }
    tokens
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    diagnostics: Vec<VdfDiagnostic>,
    eof_reported: bool,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /*
     * Consumes key/value pairs until the block closes or input runs out.
     * `depth` 0 is the document root, which has no closing brace; a close
     * brace seen there is an unmatched stray and is skipped. Running out of
     * input inside a nested block is reported once, at the innermost point
     * where it is first observed.
     */
    fn parse_block(&mut self, depth: usize) -> VdfBlock {
        let mut block = VdfBlock::new();
        loop {
            let Some(token) = self.next() else {
                if depth > 0 && !self.eof_reported {
                    self.diagnostics.push(VdfDiagnostic::UnbalancedDocument);
                    self.eof_reported = true;
                }
                return block;
            };
            match token {
                Token::CloseBrace => {
                    if depth == 0 {
                        self.diagnostics.push(VdfDiagnostic::UnmatchedCloseBrace);
                        continue;
                    }
                    return block;
                }
                Token::OpenBrace => {
                    // A block with no key cannot be attached anywhere; skip
                    // past its matching close so siblings still parse.
                    self.diagnostics.push(VdfDiagnostic::BlockWithoutKey);
                    self.skip_balanced();
                }
                Token::Quoted(key) => match self.peek() {
                    Some(Token::OpenBrace) => {
                        self.pos += 1;
                        let child = self.parse_block(depth + 1);
                        block.insert(key, VdfValue::Block(child));
                    }
                    Some(Token::Quoted(_)) => {
                        if let Some(Token::Quoted(value)) = self.next() {
                            block.insert(key, VdfValue::Scalar(value));
                        }
                    }
                    Some(Token::CloseBrace) | None => {
                        // The close brace (if any) is left for the loop so
                        // the enclosing block still terminates normally.
                        self.diagnostics.push(VdfDiagnostic::KeyWithoutValue { key });
                    }
                },
            }
        }
    }

    fn skip_balanced(&mut self) {
        let mut depth = 1usize;
        while let Some(token) = self.next() {
            match token {
                Token::OpenBrace => depth += 1,
                Token::CloseBrace => {
                    depth -= 1;
                    if depth == 0 {
                        return;
                    }
                }
                Token::Quoted(_) => {}
            }
        }
    }
}

/*
 * Parses one VDF document. Always returns a root mapping; faults are
 * reported through `ParseOutcome::diagnostics` rather than an error, so a
 * single corrupt manifest can never abort a whole library scan. Parsing is
 * idempotent: identical text always yields a structurally equal tree.
 */
pub fn parse(text: &str) -> ParseOutcome {
    let mut diagnostics = Vec::new();
    let tokens = lex(text, &mut diagnostics);
    let mut parser = Parser {
        tokens,
        pos: 0,
        diagnostics,
        eof_reported: false,
    };
    let root = parser.parse_block(0);
    if !parser.diagnostics.is_empty() {
        log::debug!(
            "VdfParser: Document parsed with {} diagnostic(s).",
            parser.diagnostics.len()
        );
    }
    ParseOutcome {
        root,
        diagnostics: parser.diagnostics,
    }
}
