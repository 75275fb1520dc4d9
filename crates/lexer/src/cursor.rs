//! A position within one level of the token tree.
use crate::token::Token;

/// Walks a token slice. Parsers receive a cursor positioned at the start of
/// their construct together with an exclusive end index.
#[derive(Debug, Clone)]
pub struct Cursor<'t> {
    tokens: &'t [Token],
    position: usize,
}

impl<'t> Cursor<'t> {
    pub fn new(tokens: &'t [Token]) -> Self {
        Self {
            tokens,
            position: 0,
        }
    }

    pub fn at(tokens: &'t [Token], position: usize) -> Self {
        Self { tokens, position }
    }

    pub fn tokens(&self) -> &'t [Token] {
        self.tokens
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// The token `k` places ahead of the current one (`peek(0)` is the current token).
    pub fn peek(&self, k: usize) -> Option<&'t Token> {
        self.tokens.get(self.position + k)
    }

    pub fn current(&self) -> Option<&'t Token> {
        self.peek(0)
    }

    pub fn get(&self, index: usize) -> Option<&'t Token> {
        self.tokens.get(index)
    }

    pub fn advance(&mut self) -> Option<&'t Token> {
        let token = self.tokens.get(self.position);
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    pub fn skip_to(&mut self, index: usize) {
        self.position = index.min(self.tokens.len());
    }

    /// Moves past comments and line breaks, never beyond `end`.
    pub fn skip_trivia(&mut self, end: usize) {
        while self.position < end && self.tokens[self.position].is_trivia() {
            self.position += 1;
        }
    }

    /// Source text spanned by tokens `[from, to)`, including the whitespace between them.
    pub fn text<'s>(&self, source: &'s str, from: usize, to: usize) -> &'s str {
        if from >= to || to > self.tokens.len() {
            return "";
        }
        let start = self.tokens[from].span().start;
        let end = self.tokens[to - 1].span().end;
        source.get(start..end).unwrap_or("")
    }
}
