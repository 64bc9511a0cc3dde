//! Shared functionality
//!
//! This crate supplies the pieces that the veil filters have in common: the fatal error type,
//! source locations, a character stream and the byte level charset helpers.
//!

pub mod char_stream;
pub mod encoding;
pub mod errors;
