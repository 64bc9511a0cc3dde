//! Error results that can be returned from the css filter
use thiserror::Error;

pub use veil_shared::errors::{FilterError, FilterResult};

/// Reasons a declaration value cannot be split into tokens. These never abort the filter, the
/// enclosing declaration is dropped instead.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum LexError {
    #[error("comma without a preceding value")]
    LeadingComma,

    #[error("unterminated string")]
    UnterminatedString,

    #[error("escaped newline outside of a string")]
    EscapedNewline,

    #[error("dangling escape at end of value")]
    DanglingEscape,

    #[error("unbalanced parenthesis")]
    UnbalancedParenthesis,

    #[error("malformed string: {0}")]
    MalformedString(String),

    #[error("malformed url(): {0}")]
    MalformedUrl(String),

    #[error("malformed attr(): {0}")]
    MalformedAttr(String),

    #[error("malformed counter: {0}")]
    MalformedCounter(String),
}

/// Errors while compiling a grammar pattern
#[derive(Clone, Debug, Error, PartialEq)]
pub enum GrammarError {
    #[error("grammar: compilation error: {0}")]
    Compile(String),

    #[error("grammar: unknown rule '{0}'")]
    UnknownRule(String),
}

/// Errors returned by a uri callback. Any of them drops the construct holding the uri.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum UriError {
    #[error("uri rejected: {0}")]
    Rejected(String),

    #[error("uri could not be parsed: {0}")]
    Malformed(String),
}
