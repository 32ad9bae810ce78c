use thiserror::Error;

use crate::token::TokenId;

/// Structural failures surfaced by the tokenizer and the token stream.
///
/// Heuristic non-matches never show up here; a rule that does not apply
/// simply hands control to the next one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("cannot parse an empty filename")]
    EmptyFilename,

    #[error("filename produced no tokens")]
    EmptyStream,

    #[error("token {0:?} is not part of the stream")]
    TokenNotFound(TokenId),

    #[error("index {index} is out of range for a stream of {len} tokens")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("end token precedes begin token")]
    InvertedRange,
}
