//! Token stream for JEL sources.
//!
//! The lexer turns source text into a flat-per-level, already bracket-matched
//! token tree: every `{}`, `[]` and `()` pair becomes a [`ContainerToken`]
//! holding its children. Whitespace is dropped; adjacency is recovered from
//! spans. Parsers walk a level with a [`Cursor`].

pub mod cursor;
pub mod error;
mod lexer;
pub mod span;
pub mod token;

pub use cursor::Cursor;
pub use error::LexError;
pub use lexer::tokenize;
pub use span::Span;
pub use token::{ContainerToken, Delimiter, LeafToken, Token, TokenKind};
