//! The scanner. Lexeme recognizers are `nom` combinators; the driver tracks
//! line/column positions and pairs delimiters into containers.
use crate::error::LexError;
use crate::span::Span;
use crate::token::{ContainerToken, Delimiter, LeafToken, Token, TokenKind};
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_until, take_while},
    character::complete::{char, digit1, one_of, satisfy},
    combinator::{opt, recognize},
    sequence::pair,
};

// --- Lexeme recognizers ---

fn word(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        satisfy(|c| c.is_ascii_alphabetic() || c == '_'),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_'),
    ))
    .parse(input)
}

fn number(input: &str) -> IResult<&str, &str> {
    recognize((
        digit1,
        opt((char('.'), digit1)),
        opt((one_of("eE"), opt(one_of("+-")), digit1)),
    ))
    .parse(input)
}

fn symbol(input: &str) -> IResult<&str, &str> {
    alt((
        tag("&&"),
        tag("||"),
        tag("=="),
        tag("!="),
        tag("<="),
        tag(">="),
        tag(".."),
        recognize(one_of("+-*/%<>!:,$.=?;@&|~^")),
    ))
    .parse(input)
}

fn line_comment(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        alt((tag("//"), tag("#"))),
        take_while(|c: char| c != '\n'),
    ))
    .parse(input)
}

fn block_comment(input: &str) -> IResult<&str, &str> {
    recognize((tag("/*"), take_until("*/"), tag("*/"))).parse(input)
}

// --- String literals ---

enum StringFault {
    Unterminated,
    Escape { offset: usize, found: char },
}

/// Scans a quoted literal at the start of `rest`. Returns the byte length of
/// the literal including both quotes and its unescaped value.
fn scan_string(rest: &str, quote: char) -> Result<(usize, String), StringFault> {
    let mut value = String::new();
    let mut chars = rest.char_indices().skip(1).peekable();
    while let Some((i, c)) = chars.next() {
        if c == quote {
            return Ok((i + c.len_utf8(), value));
        }
        match c {
            '\n' => return Err(StringFault::Unterminated),
            '\\' => {
                let Some((_, escaped)) = chars.next() else {
                    return Err(StringFault::Unterminated);
                };
                let resolved = match escaped {
                    '"' => '"',
                    '\'' => '\'',
                    '\\' => '\\',
                    '/' => '/',
                    '$' => '$',
                    'b' => '\u{8}',
                    'f' => '\u{c}',
                    'n' => '\n',
                    'r' => '\r',
                    't' => '\t',
                    'u' => {
                        let mut code = 0u32;
                        for _ in 0..4 {
                            let digit = chars
                                .next()
                                .and_then(|(_, h)| h.to_digit(16))
                                .ok_or(StringFault::Escape {
                                    offset: i,
                                    found: 'u',
                                })?;
                            code = code * 16 + digit;
                        }
                        if (0xD800..0xDC00).contains(&code) {
                            // High surrogate: a `\uDC00`-`\uDFFF` escape must follow.
                            let mut low = 0u32;
                            let backslash = chars.next().map(|(_, c)| c);
                            let letter = chars.next().map(|(_, c)| c);
                            if backslash != Some('\\') || letter != Some('u') {
                                return Err(StringFault::Escape {
                                    offset: i,
                                    found: 'u',
                                });
                            }
                            for _ in 0..4 {
                                let digit = chars
                                    .next()
                                    .and_then(|(_, h)| h.to_digit(16))
                                    .ok_or(StringFault::Escape {
                                        offset: i,
                                        found: 'u',
                                    })?;
                                low = low * 16 + digit;
                            }
                            code = 0x10000 + ((code - 0xD800) << 10) + (low.wrapping_sub(0xDC00) & 0x3FF);
                        }
                        char::from_u32(code).ok_or(StringFault::Escape {
                            offset: i,
                            found: 'u',
                        })?
                    }
                    other => {
                        return Err(StringFault::Escape {
                            offset: i,
                            found: other,
                        });
                    }
                };
                value.push(resolved);
            }
            c => value.push(c),
        }
    }
    Err(StringFault::Unterminated)
}

// --- Driver ---

struct OpenContainer {
    delimiter: Delimiter,
    open: Span,
    children: Vec<Token>,
}

struct Scanner<'s> {
    source: &'s str,
    pos: usize,
    line: usize,
    line_start: usize,
    stack: Vec<OpenContainer>,
    root: Vec<Token>,
}

impl<'s> Scanner<'s> {
    fn new(source: &'s str) -> Self {
        Self {
            source,
            pos: 0,
            line: 1,
            line_start: 0,
            stack: Vec::new(),
            root: Vec::new(),
        }
    }

    fn column(&self) -> usize {
        self.pos - self.line_start + 1
    }

    fn level(&mut self) -> &mut Vec<Token> {
        match self.stack.last_mut() {
            Some(open) => &mut open.children,
            None => &mut self.root,
        }
    }

    fn last_token(&self) -> Option<&Token> {
        match self.stack.last() {
            Some(open) => open.children.last(),
            None => self.root.last(),
        }
    }

    /// Span for `len` bytes at the current position; advances line tracking
    /// past any newline inside the lexeme.
    fn consume(&mut self, len: usize) -> Span {
        let start = self.pos;
        let line = self.line;
        let column = self.column();
        let text = &self.source[start..start + len];
        for (offset, c) in text.char_indices() {
            if c == '\n' {
                self.line += 1;
                self.line_start = start + offset + 1;
            }
        }
        self.pos = start + len;
        Span::new(start, start + len, line, column, self.line)
    }

    fn push_leaf(&mut self, kind: TokenKind, len: usize, value: Option<String>) {
        let start = self.pos;
        let span = self.consume(len);
        let text = self.source[start..start + len].to_string();
        let value = value.unwrap_or_else(|| text.clone());
        self.level().push(Token::Leaf(LeafToken {
            kind,
            span,
            text,
            value,
        }));
    }

    fn follows_dot(&self) -> bool {
        matches!(self.last_token(), Some(t) if t.is_symbol(".") && t.span().end == self.pos)
    }

    fn run(mut self) -> Result<Vec<Token>, LexError> {
        let source = self.source;
        while self.pos < source.len() {
            let rest = &source[self.pos..];
            let Some(c) = rest.chars().next() else { break };

            match c {
                ' ' | '\t' | '\r' | '\u{feff}' => {
                    self.pos += c.len_utf8();
                }
                '\n' => self.push_leaf(TokenKind::LineBreak, 1, None),
                '"' | '\'' => match scan_string(rest, c) {
                    Ok((len, value)) => self.push_leaf(TokenKind::String, len, Some(value)),
                    Err(StringFault::Unterminated) => {
                        let len = rest.find('\n').unwrap_or(rest.len());
                        let span = self.consume(len);
                        return Err(LexError::UnterminatedString { span });
                    }
                    Err(StringFault::Escape { offset, found }) => {
                        self.pos += offset;
                        let span = self.consume(1 + found.len_utf8());
                        return Err(LexError::InvalidEscape { found, span });
                    }
                },
                '{' | '[' | '(' => {
                    let Some(delimiter) = Delimiter::from_open(c) else {
                        unreachable!("opening delimiter")
                    };
                    let open = self.consume(1);
                    self.stack.push(OpenContainer {
                        delimiter,
                        open,
                        children: Vec::new(),
                    });
                }
                '}' | ']' | ')' => {
                    let close = self.consume(1);
                    let Some(open) = self.stack.pop() else {
                        return Err(LexError::UnexpectedClosing {
                            found: c,
                            span: close,
                        });
                    };
                    if open.delimiter.close() != c {
                        return Err(LexError::MismatchedDelimiter {
                            open: open.delimiter.open(),
                            found: c,
                            open_span: open.open,
                            span: close,
                        });
                    }
                    let container = ContainerToken {
                        delimiter: open.delimiter,
                        span: open.open.to(&close),
                        open: open.open,
                        close,
                        children: open.children,
                    };
                    self.level().push(Token::Container(container));
                }
                _ => self.scan_lexeme(rest, c)?,
            }
        }

        if let Some(open) = self.stack.pop() {
            return Err(LexError::UnclosedDelimiter {
                open: open.delimiter.open(),
                span: open.open,
            });
        }
        Ok(self.root)
    }

    fn scan_lexeme(&mut self, rest: &'s str, c: char) -> Result<(), LexError> {
        if rest.starts_with("/*") {
            return match block_comment(rest) {
                Ok((remaining, _)) => {
                    self.push_leaf(TokenKind::Comment, rest.len() - remaining.len(), None);
                    Ok(())
                }
                Err(_) => {
                    let span = self.consume(2);
                    Err(LexError::UnterminatedComment { span })
                }
            };
        }
        if let Ok((remaining, _)) = line_comment(rest) {
            self.push_leaf(TokenKind::Comment, rest.len() - remaining.len(), None);
            return Ok(());
        }
        if c.is_ascii_digit() {
            // `$list.0.1` must lex as two indices, not the number `0.1`.
            let recognized = if self.follows_dot() {
                digit1::<&str, nom::error::Error<&str>>(rest)
            } else {
                number(rest)
            };
            if let Ok((remaining, _)) = recognized {
                self.push_leaf(TokenKind::Number, rest.len() - remaining.len(), None);
                return Ok(());
            }
        }
        if let Ok((remaining, _)) = word(rest) {
            self.push_leaf(TokenKind::Word, rest.len() - remaining.len(), None);
            return Ok(());
        }
        if let Ok((remaining, _)) = symbol(rest) {
            self.push_leaf(TokenKind::Symbol, rest.len() - remaining.len(), None);
            return Ok(());
        }
        let span = self.consume(c.len_utf8());
        Err(LexError::UnexpectedCharacter { found: c, span })
    }
}

/// Tokenizes `source` into a bracket-paired token tree.
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    Scanner::new(source).run()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(tokens: &[Token]) -> Vec<Option<TokenKind>> {
        tokens.iter().map(Token::kind).collect()
    }

    #[test]
    fn test_tokenize_member() {
        let tokens = tokenize("a: $b.c + 12.5e3").unwrap();
        let texts: Vec<&str> = tokens.iter().map(Token::text).collect();
        assert_eq!(texts, vec!["a", ":", "$", "b", ".", "c", "+", "12.5e3"]);
        assert_eq!(tokens[7].kind(), Some(TokenKind::Number));
    }

    #[test]
    fn test_containers_are_paired() {
        let tokens = tokenize("{ a: [1, (2)] }").unwrap();
        assert_eq!(tokens.len(), 1);
        let object = tokens[0].as_container().unwrap();
        assert_eq!(object.delimiter, Delimiter::Brace);
        let array = object.children[2].as_container().unwrap();
        assert_eq!(array.delimiter, Delimiter::Bracket);
        assert!(array.children[2].is_container(Delimiter::Paren));
        assert_eq!(object.span.start, 0);
        assert_eq!(object.span.end, 15);
    }

    #[test]
    fn test_string_escapes() {
        let tokens = tokenize(r#""a\n\"b\" A" 'it\'s'"#).unwrap();
        let first = tokens[0].as_leaf().unwrap();
        assert_eq!(first.value, "a\n\"b\" A");
        assert_eq!(tokens[1].as_leaf().unwrap().value, "it's");
    }

    #[test]
    fn test_comments_and_line_breaks() {
        let tokens = tokenize("a # note\n/* block\n */ b // tail").unwrap();
        assert_eq!(
            kinds(&tokens),
            vec![
                Some(TokenKind::Word),
                Some(TokenKind::Comment),
                Some(TokenKind::LineBreak),
                Some(TokenKind::Comment),
                Some(TokenKind::Word),
                Some(TokenKind::Comment),
            ]
        );
        let b = &tokens[4];
        assert_eq!(b.span().line, 3);
        assert_eq!(tokens[3].span().last_line, 3);
    }

    #[test]
    fn test_multi_char_symbols() {
        let tokens = tokenize("a<=b && c!=d || $x..").unwrap();
        let texts: Vec<&str> = tokens.iter().map(Token::text).collect();
        assert_eq!(
            texts,
            vec!["a", "<=", "b", "&&", "c", "!=", "d", "||", "$", "x", ".."]
        );
    }

    #[test]
    fn test_index_after_dot_is_integer() {
        let tokens = tokenize("$a.0.1").unwrap();
        let texts: Vec<&str> = tokens.iter().map(Token::text).collect();
        assert_eq!(texts, vec!["$", "a", ".", "0", ".", "1"]);
    }

    #[test]
    fn test_mismatched_delimiter_reports_both_spans() {
        let err = tokenize("{ [ }").unwrap_err();
        assert!(matches!(err, LexError::MismatchedDelimiter { open: '[', found: '}', .. }));
        assert_eq!(err.spans().len(), 2);
    }

    #[test]
    fn test_unclosed_and_unterminated() {
        assert!(matches!(
            tokenize("[1, 2").unwrap_err(),
            LexError::UnclosedDelimiter { open: '[', .. }
        ));
        assert!(matches!(
            tokenize("\"abc").unwrap_err(),
            LexError::UnterminatedString { .. }
        ));
        assert!(matches!(
            tokenize("/* open").unwrap_err(),
            LexError::UnterminatedComment { .. }
        ));
    }

    #[test]
    fn test_column_tracking() {
        let tokens = tokenize("x\n  yy").unwrap();
        let yy = tokens[2].span();
        assert_eq!((yy.line, yy.column, yy.start, yy.end), (2, 3, 4, 6));
    }
}
