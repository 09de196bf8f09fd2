//! Formula error types

use thiserror::Error;

/// Result type for parsing operations
pub type ParseResult<T> = std::result::Result<T, ParseError>;

/// Result type for evaluation operations
pub type EvalResult<T> = std::result::Result<T, EvalError>;

/// Error raised while turning formula text into a [`Program`](crate::ast::Program)
///
/// Always detected at load time, before any execution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("parse error at line {line}: {message}")]
pub struct ParseError {
    /// 1-based source line the error was detected on
    pub line: usize,
    pub message: String,
}

impl ParseError {
    pub(crate) fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

/// Semantic error raised while running a program
///
/// Any of these aborts the entire run; there are no partial results.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    /// Call target is neither a user-defined function nor a builtin
    #[error("no function named '{0}'")]
    UnknownFunction(String),

    /// Wrong number of arguments in a function call
    #[error("wrong number of arguments for {function}: expected {expected}, got {actual}")]
    ArgumentCount {
        function: String,
        expected: String,
        actual: usize,
    },

    /// An identifier was read while not visible in any scope, or visible
    /// but never assigned a value
    #[error("variable '{0}' is not set")]
    UnsetVariable(String),

    /// A `break` unwound out of a function body without an enclosing loop
    #[error("break used outside of a loop")]
    BreakOutsideLoop,
}
