//! Module `scanner` implements a one-pass, streaming lexer for the minipy
//! source language.
//!
//! It transforms a byte slice (`&[u8]`) into a sequence of [`Token`]s,
//! skipping whitespace and `#` comments, and emitting exactly one `EOF`
//! token at the end.  Designed as a `FusedIterator`, it can be chained
//! safely with other iterator adapters.
//!
//! Block structure is significant indentation, Python-style: the scanner
//! tracks an indentation stack and synthesizes `NEWLINE` at the end of
//! each logical line plus `INDENT`/`DEDENT` pairs around nested blocks.
//! Newlines inside parentheses, brackets or braces are insignificant
//! (implicit line joining); blank and comment-only lines emit nothing.
//! At end of input the scanner flushes a final `NEWLINE` (when a logical
//! line is open), any pending `DEDENT`s, then `EOF`.

use crate::error::{MiniPyError, Result};
use crate::token::{Token, TokenType};
use log::{debug, info};
use memchr::memchr;
use phf::phf_map;
use std::collections::VecDeque;
use std::iter::FusedIterator;

// ─────────────────────────────────────────────────────────────────────────────
// Static keyword map (compile-time perfect hash)
// ─────────────────────────────────────────────────────────────────────────────

static KEYWORDS: phf::Map<&'static [u8], TokenType> = phf_map! {
    b"and"    => TokenType::AND,
    b"class"  => TokenType::CLASS,
    b"def"    => TokenType::DEF,
    b"elif"   => TokenType::ELIF,
    b"else"   => TokenType::ELSE,
    b"if"     => TokenType::IF,
    b"not"    => TokenType::NOT,
    b"or"     => TokenType::OR,
    b"pass"   => TokenType::PASS,
    b"return" => TokenType::RETURN,
    b"while"  => TokenType::WHILE,
};

/// A single-pass **scanner / lexer** that converts raw UTF-8 bytes into a
/// sequence of [`Token`]s.
pub struct Scanner<'a> {
    src: &'a [u8],               // entire source file
    start: usize,                // index of the *first* byte of the current lexeme
    curr: usize,                 // index *one past* the last byte examined
    line: usize,                 // 1-based line counter (\n increments)
    pending: VecDeque<Token>,    // queued NEWLINE/INDENT/DEDENT/EOF bursts
    indents: Vec<usize>,         // indentation stack; always starts at [0]
    bracket_depth: usize,        // ( [ { nesting for implicit line joining
    at_line_start: bool,         // next bytes are this line's indentation
    line_open: bool,             // a real token has been emitted on this line
    done: bool,                  // EOF already yielded
}

impl<'a> Scanner<'a> {
    /// Create a new lexer over `src`.
    #[inline]
    pub fn new(src: &'a [u8]) -> Self {
        info!("Scanner created over {} bytes", src.len());

        Self {
            src,
            start: 0,
            curr: 0,
            line: 1,
            pending: VecDeque::new(),
            indents: vec![0],
            bracket_depth: 0,
            at_line_start: true,
            line_open: false,
            done: false,
        }
    }

    // ───────────────────────── primitive helpers ────────────────────────

    #[inline(always)]
    const fn len(&self) -> usize {
        self.src.len()
    }

    #[inline(always)]
    fn is_at_end(&self) -> bool {
        self.curr >= self.len()
    }

    /// Advance one byte and return it.  Callers guard with [`is_at_end`].
    #[inline(always)]
    fn advance(&mut self) -> u8 {
        let b = self.src[self.curr];
        self.curr += 1;
        b
    }

    /// Peek at the current byte without consuming it.  Returns `0` past
    /// EOF to avoid branching at call-site.
    #[inline(always)]
    fn peek(&self) -> u8 {
        if self.is_at_end() {
            0
        } else {
            self.src[self.curr]
        }
    }

    /// Conditionally consume a byte **iff** it matches `expected`.
    #[inline(always)]
    fn match_byte(&mut self, expected: u8) -> bool {
        if !self.is_at_end() && self.peek() == expected {
            self.advance();
            true
        } else {
            false
        }
    }

    /// The lexeme scanned so far, as owned text.
    fn lexeme(&self) -> String {
        String::from_utf8_lossy(&self.src[self.start..self.curr]).into_owned()
    }

    /// Fast-forward past a `#` comment to the next newline (not consumed).
    fn skip_comment(&mut self) {
        if let Some(pos) = memchr(b'\n', &self.src[self.curr..]) {
            self.curr += pos;
        } else {
            self.curr = self.len();
        }
    }

    // ───────────────────────── indentation handling ─────────────────────

    /// Measure the indentation of the line starting at `self.curr` and
    /// queue `INDENT`/`DEDENT` tokens against the indentation stack.
    /// Blank and comment-only lines are consumed without effect.
    fn handle_line_start(&mut self) -> Result<()> {
        let mut width: usize = 0;

        loop {
            match self.peek() {
                b' ' => {
                    width += 1;
                    self.advance();
                }

                b'\r' => {
                    self.advance();
                }

                b'\t' => {
                    return Err(MiniPyError::lex(
                        self.line,
                        "Tabs are not allowed in indentation",
                    ));
                }

                _ => break,
            }
        }

        if self.peek() == b'#' {
            self.skip_comment();
        }

        // Blank or comment-only line: stays insignificant.
        if self.peek() == b'\n' {
            self.advance();
            self.line += 1;
            return Ok(());
        }

        if self.is_at_end() {
            return Ok(());
        }

        self.at_line_start = false;

        let current = *self.indents.last().unwrap_or(&0);

        if width > current {
            debug!("INDENT to width {} on line {}", width, self.line);
            self.indents.push(width);
            self.pending
                .push_back(Token::new(TokenType::INDENT, "", self.line));
        } else if width < current {
            while self.indents.last().is_some_and(|&w| w > width) {
                self.indents.pop();
                self.pending
                    .push_back(Token::new(TokenType::DEDENT, "", self.line));
            }

            if *self.indents.last().unwrap_or(&0) != width {
                return Err(MiniPyError::lex(
                    self.line,
                    "Unindent does not match any outer indentation level",
                ));
            }
        }

        Ok(())
    }

    /// Flush the end-of-input burst: a final `NEWLINE` when a logical
    /// line is open, remaining `DEDENT`s, then exactly one `EOF`.
    fn flush_eof(&mut self) {
        if self.line_open {
            self.line_open = false;
            self.pending
                .push_back(Token::new(TokenType::NEWLINE, "", self.line));
        }

        while self.indents.last().is_some_and(|&w| w > 0) {
            self.indents.pop();
            self.pending
                .push_back(Token::new(TokenType::DEDENT, "", self.line));
        }

        self.pending
            .push_back(Token::new(TokenType::EOF, "", self.line));
        self.done = true;
    }

    // ───────────────────────────── core lexing ──────────────────────────

    /// Scan a *single* token starting at `self.curr`.  `Ok(Some(tt))`
    /// recognizes a lexeme; whitespace and comments return `Ok(None)`.
    fn scan_token(&mut self) -> Result<Option<TokenType>> {
        let b = self.advance();

        let tt = match b {
            // ── grouping (tracks implicit line joining) ──────────────────
            b'(' => {
                self.bracket_depth += 1;
                TokenType::LEFT_PAREN
            }
            b')' => {
                self.bracket_depth = self.bracket_depth.saturating_sub(1);
                TokenType::RIGHT_PAREN
            }
            b'[' => {
                self.bracket_depth += 1;
                TokenType::LEFT_BRACKET
            }
            b']' => {
                self.bracket_depth = self.bracket_depth.saturating_sub(1);
                TokenType::RIGHT_BRACKET
            }
            b'{' => {
                self.bracket_depth += 1;
                TokenType::LEFT_BRACE
            }
            b'}' => {
                self.bracket_depth = self.bracket_depth.saturating_sub(1);
                TokenType::RIGHT_BRACE
            }

            // ── single-character punctuators ─────────────────────────────
            b',' => TokenType::COMMA,
            b'.' => TokenType::DOT,
            b':' => TokenType::COLON,

            // ── operators and their augmented-assignment forms ───────────
            b'+' => {
                if self.match_byte(b'=') {
                    TokenType::PLUS_EQUAL
                } else {
                    TokenType::PLUS
                }
            }

            b'-' => {
                if self.match_byte(b'=') {
                    TokenType::MINUS_EQUAL
                } else {
                    TokenType::MINUS
                }
            }

            b'*' => {
                if self.match_byte(b'=') {
                    TokenType::STAR_EQUAL
                } else {
                    TokenType::STAR
                }
            }

            b'/' => {
                if self.match_byte(b'=') {
                    TokenType::SLASH_EQUAL
                } else {
                    TokenType::SLASH
                }
            }

            b'=' => {
                if self.match_byte(b'=') {
                    TokenType::EQUAL_EQUAL
                } else {
                    TokenType::EQUAL
                }
            }

            b'<' => TokenType::LESS,
            b'>' => TokenType::GREATER,

            // ── whitespace ───────────────────────────────────────────────
            b' ' | b'\r' | b'\t' => return Ok(None),

            // ── logical end of line ──────────────────────────────────────
            b'\n' => {
                self.line += 1;

                if self.bracket_depth == 0 {
                    self.at_line_start = true;

                    if self.line_open {
                        self.line_open = false;
                        return Ok(Some(TokenType::NEWLINE));
                    }
                }

                return Ok(None);
            }

            // ── comments (# ... until newline) ───────────────────────────
            b'#' => {
                self.skip_comment();
                return Ok(None);
            }

            // ── string literal ───────────────────────────────────────────
            b'"' | b'\'' => return self.parse_string(b).map(Some),

            // ── integer literal ──────────────────────────────────────────
            b'0'..=b'9' => return self.parse_int().map(Some),

            // ── identifiers / keywords ───────────────────────────────────
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.parse_identifier(),

            // ── unexpected character ─────────────────────────────────────
            _ => {
                return Err(MiniPyError::lex(
                    self.line,
                    format!("Unexpected character: {}", b as char),
                ));
            }
        };

        Ok(Some(tt))
    }

    /// Parse a quoted string literal, decoding the basic escapes.
    /// Strings are single-line; `quote` is the opening delimiter.
    fn parse_string(&mut self, quote: u8) -> Result<TokenType> {
        let mut value = String::new();

        loop {
            if self.is_at_end() || self.peek() == b'\n' {
                return Err(MiniPyError::lex(self.line, "Unterminated string literal"));
            }

            let b = self.advance();

            if b == quote {
                break;
            }

            if b == b'\\' {
                if self.is_at_end() {
                    return Err(MiniPyError::lex(self.line, "Unterminated string literal"));
                }

                match self.advance() {
                    b'n' => value.push('\n'),
                    b't' => value.push('\t'),
                    b'\\' => value.push('\\'),
                    b'\'' => value.push('\''),
                    b'"' => value.push('"'),

                    other => {
                        return Err(MiniPyError::lex(
                            self.line,
                            format!("Unknown escape sequence: \\{}", other as char),
                        ));
                    }
                }

                continue;
            }

            value.push(b as char);
        }

        Ok(TokenType::STRING(value))
    }

    /// Parse an integer literal (`123`).  No fractional part exists in
    /// the language.
    fn parse_int(&mut self) -> Result<TokenType> {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        let s = self.lexeme();

        s.parse::<i64>()
            .map(TokenType::INT)
            .map_err(|_| MiniPyError::lex(self.line, format!("Integer literal too large: {}", s)))
    }

    /// Parse an identifier and decide if it is a **keyword** or a generic
    /// `IDENTIFIER` token.
    fn parse_identifier(&mut self) -> TokenType {
        while {
            let c: u8 = self.peek();
            c.is_ascii_alphanumeric() || c == b'_'
        } {
            self.advance();
        }

        KEYWORDS
            .get(&self.src[self.start..self.curr])
            .cloned()
            .unwrap_or(TokenType::IDENTIFIER)
    }
}

// ───────────────────────── Iterator implementation ─────────────────────────

impl Iterator for Scanner<'_> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            // 1. Drain any queued structural tokens first.
            if let Some(token) = self.pending.pop_front() {
                return Some(Ok(token));
            }

            if self.done {
                return None;
            }

            // 2. EOF: flush NEWLINE/DEDENT burst, then the EOF token.
            if self.is_at_end() {
                self.flush_eof();
                continue;
            }

            // 3. At a line start (outside brackets), resolve indentation.
            if self.at_line_start && self.bracket_depth == 0 {
                if let Err(e) = self.handle_line_start() {
                    self.done = true;
                    return Some(Err(e));
                }

                continue;
            }

            // 4. Scan one token.
            self.start = self.curr;
            let line = self.line;

            match self.scan_token() {
                Err(e) => return Some(Err(e)),

                Ok(Some(TokenType::NEWLINE)) => {
                    // Synthesized with an empty lexeme; `line` is the
                    // line the logical line started ending on.
                    return Some(Ok(Token::new(TokenType::NEWLINE, "", line)));
                }

                Ok(Some(tt)) => {
                    self.line_open = true;
                    let lexeme = self.lexeme();
                    debug!("Scanned token ({:?}) on line {}", tt, self.line);

                    return Some(Ok(Token::new(tt, lexeme, self.line)));
                }

                // Whitespace / comment → continue loop.
                Ok(None) => {}
            }
        }
    }
}

impl FusedIterator for Scanner<'_> {}
