//! Centralised error hierarchy for the **minipy runtime**.
//!
//! Front-end failures (scanner, parser) are [`MiniPyError`] values carrying
//! a message and source line; the crate-wide `Result<T>` alias and the
//! `std::error::Error` impl give ergonomic inter-operation with `anyhow`
//! at the binary boundary.
//!
//! Runtime failures travel separately as [`Raised`]: a language-level
//! exception object (kind tag + message) paired with the ordered
//! diagnostic frames captured while the raise unwound the evaluation
//! stack.  The module **does not** print diagnostics itself; traceback
//! rendering belongs to the caller.

use std::fmt;
use std::rc::Rc;

use log::info;
use thiserror::Error;

use crate::object::ExceptionObj;

/// One diagnostic frame: the source position of a statement or call
/// boundary crossed while an exception unwound.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceFrame {
    /// 1-based line number in the source.
    pub line: usize,

    /// The raw text of that source line.
    pub text: String,
}

/// A raised exception together with its traceback.
///
/// The frame list is captured from the evaluator's frame stack at the
/// moment of raising and is never mutated afterwards; frames are ordered
/// outermost first (render with the most recent call last).
#[derive(Debug, Clone)]
pub struct Raised {
    pub exception: Rc<ExceptionObj>,
    pub traceback: Vec<TraceFrame>,
}

impl Raised {
    pub fn new(exception: ExceptionObj, traceback: Vec<TraceFrame>) -> Self {
        Self {
            exception: Rc::new(exception),
            traceback,
        }
    }
}

impl fmt::Display for Raised {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.exception.kind, self.exception.message)
    }
}

/// Canonical front-end error type.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MiniPyError {
    /// Lexical (scanner) error with source line information.
    #[error("[line {line}] Error: {message}")]
    Lex {
        /// Human-readable description.
        message: String,

        /// 1-based line where the error occurred.
        line: usize,
    },

    /// Syntactic (parser) error.
    #[error("[line {line}] Error: {message}")]
    Parse { message: String, line: usize },
}

impl MiniPyError {
    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Lex error: line={}, msg={}", line, message);

        MiniPyError::Lex { message, line }
    }

    /// Helper constructor for the **parser**.
    pub fn parse<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Parse error: line={}, msg={}", line, message);

        MiniPyError::Parse { message, line }
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, MiniPyError>;
