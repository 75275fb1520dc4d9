//! Token-slice inspection shared by the parser modules.
use crate::error::JelError;
use jel_json::Format;
use jel_lexer::{Cursor, Span, Token, TokenKind};

/// One member or element worth of tokens, with the comments and blank lines
/// written before it.
#[derive(Debug, Clone)]
pub(crate) struct Run<'t> {
    pub tokens: &'t [Token],
    pub format: Format,
}

impl Run<'_> {
    pub fn span(&self) -> Span {
        span_of(self.tokens)
    }
}

/// Strips leading and trailing comments and line breaks.
pub(crate) fn trim(tokens: &[Token]) -> &[Token] {
    let start = tokens.iter().position(|t| !t.is_trivia()).unwrap_or(tokens.len());
    let end = tokens.iter().rposition(|t| !t.is_trivia()).map_or(start, |i| i + 1);
    &tokens[start..end]
}

pub(crate) fn span_of(tokens: &[Token]) -> Span {
    Span::covering(trim(tokens).iter().map(Token::span)).unwrap_or_default()
}

pub(crate) fn significant(tokens: &[Token]) -> impl Iterator<Item = &Token> {
    tokens.iter().filter(|t| !t.is_trivia())
}

/// Index of the first significant token at or after `from`.
pub(crate) fn next_significant(tokens: &[Token], from: usize) -> usize {
    let mut cursor = Cursor::at(tokens, from);
    cursor.skip_trivia(tokens.len());
    cursor.position()
}

/// Index of the first top-level `symbol`. Containers are opaque.
pub(crate) fn find_symbol(tokens: &[Token], symbol: &str) -> Option<usize> {
    tokens.iter().position(|t| t.is_symbol(symbol))
}

pub(crate) fn adjacent(previous: &Token, next: &Token) -> bool {
    previous.span().is_adjacent_to(&next.span())
}

pub(crate) fn is_word(token: &Token) -> bool {
    token.is_kind(TokenKind::Word)
}

/// Symbols that join two operands.
pub(crate) fn is_binary_operator(token: &Token) -> bool {
    matches!(
        token.as_leaf(),
        Some(leaf) if leaf.kind == TokenKind::Symbol
            && matches!(
                leaf.text.as_str(),
                "+" | "-" | "*" | "/" | "%" | "&&" | "||" | "==" | "!=" | "<" | "<=" | ">" | ">="
            )
    )
}

/// A line whose last significant token is an operator or `:` continues on
/// the next line.
fn continues(tokens: &[Token]) -> bool {
    trim(tokens)
        .last()
        .is_some_and(|t| is_binary_operator(t) || t.is_symbol(":"))
}

/// Splits a container body into runs separated by `,` or line breaks.
pub(crate) fn split_runs(tokens: &[Token]) -> Result<Vec<Run<'_>>, JelError> {
    let mut runs = Vec::new();
    let mut start: Option<usize> = None;
    let mut comments: Vec<String> = Vec::new();
    let mut breaks = 0usize;

    let mut finish = |from: usize, to: usize, comments: &mut Vec<String>, breaks: usize| {
        runs.push(Run {
            tokens: trim(&tokens[from..to]),
            format: Format {
                comments: std::mem::take(comments),
                blank_lines: breaks.saturating_sub(1),
            },
        });
    };

    for (i, token) in tokens.iter().enumerate() {
        if token.is_comment() {
            if start.is_none() {
                comments.push(token.text().to_string());
            }
            continue;
        }
        if token.is_line_break() {
            match start {
                Some(from) if continues(&tokens[from..i]) => {}
                Some(from) => {
                    finish(from, i, &mut comments, breaks);
                    start = None;
                    breaks = 1;
                }
                // Blank lines are counted above the comment block only.
                None if comments.is_empty() => breaks += 1,
                None => {}
            }
            continue;
        }
        if token.is_symbol(",") {
            match start {
                Some(from) => {
                    finish(from, i, &mut comments, breaks);
                    start = None;
                    breaks = 0;
                }
                None => return Err(JelError::syntax("unexpected ','", token.span())),
            }
            continue;
        }
        if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(from) = start {
        finish(from, tokens.len(), &mut comments, breaks);
    }
    Ok(runs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jel_lexer::tokenize;

    fn texts(run: &Run) -> Vec<String> {
        run.tokens
            .iter()
            .filter(|t| !t.is_trivia())
            .map(|t| t.text().to_string())
            .collect()
    }

    #[test]
    fn test_runs_split_on_commas_and_line_breaks() {
        let tokens = tokenize("a: 1, b: 2\nc: 3").unwrap();
        let runs = split_runs(&tokens).unwrap();
        assert_eq!(runs.len(), 3);
        assert_eq!(texts(&runs[2]), vec!["c", ":", "3"]);
    }

    #[test]
    fn test_trailing_operator_continues_the_line() {
        let tokens = tokenize("total: 1 +\n  2\nnext: 3").unwrap();
        let runs = split_runs(&tokens).unwrap();
        assert_eq!(runs.len(), 2);
        assert_eq!(texts(&runs[0]), vec!["total", ":", "1", "+", "2"]);
    }

    #[test]
    fn test_comments_and_blank_lines_attach_to_next_run() {
        let tokens = tokenize("a: 1\n\n// about b\nb: 2").unwrap();
        let runs = split_runs(&tokens).unwrap();
        assert_eq!(runs[0].format, Format::default());
        assert_eq!(runs[1].format.comments, vec!["// about b".to_string()]);
        assert_eq!(runs[1].format.blank_lines, 1);
    }

    #[test]
    fn test_comment_lines_are_not_blank_lines() {
        let tokens = tokenize("a: 1
// one
// two
b: 2


c: 3").unwrap();
        let runs = split_runs(&tokens).unwrap();
        assert_eq!(runs[1].format.comments.len(), 2);
        assert_eq!(runs[1].format.blank_lines, 0);
        assert_eq!(runs[2].format.blank_lines, 2);
    }

    #[test]
    fn test_empty_element_is_an_error() {
        let tokens = tokenize("1,,2").unwrap();
        let error = split_runs(&tokens).unwrap_err();
        assert_eq!(error.message, "unexpected ','");
    }

    #[test]
    fn test_trailing_comma_is_allowed() {
        let tokens = tokenize("1, 2,").unwrap();
        assert_eq!(split_runs(&tokens).unwrap().len(), 2);
    }
}
