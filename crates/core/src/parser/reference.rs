//! `$references`: where they end and what they designate.
use super::lookahead::{adjacent, is_word, significant, split_runs};
use super::{Parser, ValueMode};
use crate::error::JelError;
use crate::path::{JsonPath, PathComponent};
use crate::sequence::{Sequence, SequenceKind};
use jel_lexer::{ContainerToken, Delimiter, Token, TokenKind};

/// End (exclusive) of the reference starting at `start`, if one starts
/// there. Every component must touch the previous token.
pub(crate) fn reference_end(tokens: &[Token], start: usize) -> Option<usize> {
    let dollar = tokens.get(start)?;
    let name = tokens.get(start + 1)?;
    if !dollar.is_symbol("$") || !is_word(name) || !adjacent(dollar, name) {
        return None;
    }
    Some(steps_end(tokens, start + 2))
}

/// End (exclusive) of an array or object literal directly followed by at
/// least one path step, as in `[1, 2, 3][-1]`.
pub(crate) fn indexed_literal_end(tokens: &[Token], start: usize) -> Option<usize> {
    let literal = tokens.get(start)?;
    if !literal.is_container(Delimiter::Bracket) && !literal.is_container(Delimiter::Brace) {
        return None;
    }
    let end = steps_end(tokens, start + 1);
    (end > start + 1).then_some(end)
}

/// End of either kind of path starting at `start`.
pub(crate) fn path_end(tokens: &[Token], start: usize) -> Option<usize> {
    reference_end(tokens, start).or_else(|| indexed_literal_end(tokens, start))
}

fn steps_end(tokens: &[Token], mut end: usize) -> usize {
    while let Some(next) = tokens.get(end) {
        if !adjacent(&tokens[end - 1], next) {
            break;
        }
        if next.is_symbol(".") {
            match tokens.get(end + 1) {
                Some(segment) if adjacent(next, segment) && (is_word(segment) || segment.is_kind(TokenKind::Number)) => {
                    end += 2;
                }
                _ => break,
            }
        } else if next.is_container(Delimiter::Bracket) || next.is_container(Delimiter::Paren) {
            end += 1;
        } else if next.is_symbol("..") {
            end += 1;
            break;
        } else {
            break;
        }
    }
    end
}

/// Parses an optionally negative integer written as one or two tokens.
fn signed_integer(tokens: &[&Token]) -> Option<i64> {
    match tokens {
        [number] if number.is_kind(TokenKind::Number) => number.text().parse().ok(),
        [minus, number] if minus.is_symbol("-") && number.is_kind(TokenKind::Number) => {
            number.text().parse::<i64>().ok().map(|n| -n)
        }
        _ => None,
    }
}

impl Parser<'_> {
    /// Parses the tokens of exactly one path, as delimited by [`path_end`].
    pub(crate) fn reference(&self, tokens: &[Token]) -> Result<JsonPath, JelError> {
        let (root, mut i) = match &tokens[0] {
            Token::Container(literal) => (PathComponent::Inline(self.container(literal)?), 1),
            _ => (PathComponent::Key(tokens[1].text().to_string()), 2),
        };
        let mut components = vec![root];
        let mut expansion = false;
        while i < tokens.len() {
            let token = &tokens[i];
            match token {
                _ if token.is_symbol(".") => {
                    let segment = &tokens[i + 1];
                    let component = if segment.is_kind(TokenKind::Number) {
                        let index = segment.text().parse().map_err(|_| {
                            JelError::syntax(format!("'{}' is not an index", segment.text()), segment.span())
                        })?;
                        PathComponent::Index(index)
                    } else {
                        PathComponent::Key(segment.text().to_string())
                    };
                    components.push(component);
                    i += 1;
                }
                Token::Container(container) if container.delimiter == Delimiter::Paren => {
                    let arguments = self.tuple(container)?;
                    match components.pop() {
                        Some(PathComponent::Call { name, arguments: mut lists }) => {
                            lists.push(arguments);
                            components.push(PathComponent::Call { name, arguments: lists });
                        }
                        Some(PathComponent::Key(name)) => components.push(PathComponent::Call {
                            name,
                            arguments: vec![arguments],
                        }),
                        _ => {
                            return Err(JelError::syntax("only named path segments can be called", container.span));
                        }
                    }
                }
                Token::Container(container) => components.push(self.index(container)?),
                _ if token.is_symbol("..") => expansion = true,
                other => return Err(JelError::syntax(format!("unexpected {} in reference", other), other.span())),
            }
            i += 1;
        }
        let sequence = Sequence::primitive(SequenceKind::Reference, tokens.to_vec());
        Ok(JsonPath {
            components,
            expansion,
            text: self.text(sequence.span).to_string(),
            sequence,
        })
    }

    /// `[n]`, `[-n]`, `[a:b]`, `["key"]` or `[expression]`.
    fn index(&self, container: &ContainerToken) -> Result<PathComponent, JelError> {
        let children: Vec<&Token> = significant(&container.children).collect();
        if children.is_empty() {
            return Err(JelError::syntax("empty index", container.span));
        }
        if let Some(colon) = children.iter().position(|t| t.is_symbol(":")) {
            let bound = |side: &[&Token]| -> Result<Option<i64>, JelError> {
                if side.is_empty() {
                    return Ok(None);
                }
                signed_integer(side)
                    .map(Some)
                    .ok_or_else(|| JelError::syntax("range bounds must be integers", container.span))
            };
            return Ok(PathComponent::Range(bound(&children[..colon])?, bound(&children[colon + 1..])?));
        }
        if let Some(index) = signed_integer(&children) {
            return Ok(PathComponent::Index(index));
        }
        let quoted = match children.as_slice() {
            [key] => key.as_leaf().filter(|l| l.kind == TokenKind::String),
            _ => None,
        };
        if let Some(leaf) = quoted {
            return Ok(PathComponent::Key(leaf.value.clone()));
        }
        if split_runs(&container.children)?.len() > 1 {
            return Err(JelError::syntax("an index holds a single expression", container.span));
        }
        Ok(PathComponent::Inline(self.value(
            &container.children,
            ValueMode::Default,
            container.span,
        )?))
    }
}
