use crate::span::Span;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LexError {
    #[error("Unexpected character '{found}'")]
    UnexpectedCharacter { found: char, span: Span },

    #[error("Unterminated string literal")]
    UnterminatedString { span: Span },

    #[error("Invalid escape sequence '\\{found}'")]
    InvalidEscape { found: char, span: Span },

    #[error("Unterminated block comment")]
    UnterminatedComment { span: Span },

    #[error("Unclosed '{open}'")]
    UnclosedDelimiter { open: char, span: Span },

    #[error("Unexpected closing '{found}'")]
    UnexpectedClosing { found: char, span: Span },

    #[error("Mismatched delimiter: '{open}' closed by '{found}'")]
    MismatchedDelimiter {
        open: char,
        found: char,
        open_span: Span,
        span: Span,
    },
}

impl LexError {
    /// Every location involved in the error, primary location first.
    pub fn spans(&self) -> Vec<Span> {
        match self {
            LexError::MismatchedDelimiter {
                open_span, span, ..
            } => vec![*span, *open_span],
            LexError::UnexpectedCharacter { span, .. }
            | LexError::UnterminatedString { span }
            | LexError::InvalidEscape { span, .. }
            | LexError::UnterminatedComment { span }
            | LexError::UnclosedDelimiter { span, .. }
            | LexError::UnexpectedClosing { span, .. } => vec![*span],
        }
    }
}
