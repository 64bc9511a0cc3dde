//! Fatal errors that abort a whole filter call
use thiserror::Error;

/// Errors that cannot be recovered from by dropping part of the input. Anything else a filter
/// encounters is handled by removing the offending construct.
#[derive(Debug, Error)]
pub enum FilterError {
    #[error("unsupported charset: {0}")]
    UnsupportedCharset(String),

    #[error("charset mismatch: stylesheet declares {declared} but was decoded as {decoding}")]
    CharsetMismatch { declared: String, decoding: String },

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("write error")]
    Write(#[from] std::fmt::Error),
}

pub type FilterResult<T> = Result<T, FilterError>;
