//! Token types produced by the lexer.
use crate::span::Span;
use std::fmt;

/// Kinds of leaf tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Word,
    String,
    Number,
    Symbol,
    Comment,
    LineBreak,
}

/// The three paired delimiters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Delimiter {
    Brace,
    Bracket,
    Paren,
}

impl Delimiter {
    pub fn open(self) -> char {
        match self {
            Delimiter::Brace => '{',
            Delimiter::Bracket => '[',
            Delimiter::Paren => '(',
        }
    }

    pub fn close(self) -> char {
        match self {
            Delimiter::Brace => '}',
            Delimiter::Bracket => ']',
            Delimiter::Paren => ')',
        }
    }

    pub(crate) fn from_open(c: char) -> Option<Self> {
        match c {
            '{' => Some(Delimiter::Brace),
            '[' => Some(Delimiter::Bracket),
            '(' => Some(Delimiter::Paren),
            _ => None,
        }
    }
}

/// A single lexeme.
#[derive(Debug, Clone, PartialEq)]
pub struct LeafToken {
    pub kind: TokenKind,
    pub span: Span,
    /// Raw source text of the token.
    pub text: String,
    /// Unescaped content for strings; equal to `text` for every other kind.
    pub value: String,
}

/// A delimiter pair and everything between it.
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerToken {
    pub delimiter: Delimiter,
    pub span: Span,
    pub open: Span,
    pub close: Span,
    pub children: Vec<Token>,
}

impl ContainerToken {
    /// Children that carry meaning (no comments, no line breaks).
    pub fn significant_children(&self) -> impl Iterator<Item = &Token> {
        self.children.iter().filter(|t| !t.is_trivia())
    }

    pub fn is_empty(&self) -> bool {
        self.significant_children().next().is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Leaf(LeafToken),
    Container(ContainerToken),
}

impl Token {
    pub fn span(&self) -> Span {
        match self {
            Token::Leaf(leaf) => leaf.span,
            Token::Container(container) => container.span,
        }
    }

    pub fn kind(&self) -> Option<TokenKind> {
        match self {
            Token::Leaf(leaf) => Some(leaf.kind),
            Token::Container(_) => None,
        }
    }

    pub fn as_leaf(&self) -> Option<&LeafToken> {
        match self {
            Token::Leaf(leaf) => Some(leaf),
            Token::Container(_) => None,
        }
    }

    pub fn as_container(&self) -> Option<&ContainerToken> {
        match self {
            Token::Container(container) => Some(container),
            Token::Leaf(_) => None,
        }
    }

    /// Raw text for leaves, empty for containers.
    pub fn text(&self) -> &str {
        match self {
            Token::Leaf(leaf) => &leaf.text,
            Token::Container(_) => "",
        }
    }

    pub fn is_kind(&self, kind: TokenKind) -> bool {
        self.kind() == Some(kind)
    }

    pub fn is_symbol(&self, symbol: &str) -> bool {
        matches!(self, Token::Leaf(leaf) if leaf.kind == TokenKind::Symbol && leaf.text == symbol)
    }

    pub fn is_word(&self, word: &str) -> bool {
        matches!(self, Token::Leaf(leaf) if leaf.kind == TokenKind::Word && leaf.text == word)
    }

    pub fn is_container(&self, delimiter: Delimiter) -> bool {
        matches!(self, Token::Container(c) if c.delimiter == delimiter)
    }

    pub fn is_line_break(&self) -> bool {
        self.is_kind(TokenKind::LineBreak)
    }

    pub fn is_comment(&self) -> bool {
        self.is_kind(TokenKind::Comment)
    }

    /// Comments and line breaks.
    pub fn is_trivia(&self) -> bool {
        self.is_comment() || self.is_line_break()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Leaf(leaf) if leaf.kind == TokenKind::LineBreak => write!(f, "line break"),
            Token::Leaf(leaf) => write!(f, "'{}'", leaf.text),
            Token::Container(c) => write!(f, "'{}…{}'", c.delimiter.open(), c.delimiter.close()),
        }
    }
}
