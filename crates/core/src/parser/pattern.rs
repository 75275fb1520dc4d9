//! Destructuring patterns written in key position.
use super::Parser;
use super::lookahead::{is_word, significant, span_of, split_runs};
use crate::ast::{Param, Pattern, PatternField, PatternKind};
use crate::error::JelError;
use crate::sequence::{Sequence, SequenceKind};
use jel_lexer::{ContainerToken, Token, TokenKind};
use std::rc::Rc;

impl Parser<'_> {
    /// `{ a, "b c": d }`
    pub(crate) fn object_pattern(&self, container: &ContainerToken) -> Result<Pattern, JelError> {
        let mut fields: Vec<PatternField> = Vec::new();
        for run in split_runs(&container.children)? {
            let parts: Vec<&Token> = significant(run.tokens).collect();
            let field = match parts.as_slice() {
                [key] => {
                    let key = field_key(key)?;
                    PatternField {
                        binding: Param {
                            name: key.clone(),
                            span: run.span(),
                        },
                        key,
                    }
                }
                [key, colon, binding] if colon.is_symbol(":") && is_word(binding) => PatternField {
                    key: field_key(key)?,
                    binding: Param {
                        name: binding.text().to_string(),
                        span: binding.span(),
                    },
                },
                _ => return Err(JelError::syntax("expected `key` or `key: name` in pattern", run.span())),
            };
            fields.push(field);
        }
        Ok(Pattern {
            kind: PatternKind::Object(fields),
            sequence: pattern_sequence(container),
        })
    }

    /// `[a, _, c]`: `_` skips an element.
    pub(crate) fn array_pattern(&self, container: &ContainerToken) -> Result<Pattern, JelError> {
        let mut slots = Vec::new();
        for run in split_runs(&container.children)? {
            let parts: Vec<&Token> = significant(run.tokens).collect();
            match parts.as_slice() {
                [word] if word.is_word("_") => slots.push(None),
                [word] if is_word(word) => slots.push(Some(Param {
                    name: word.text().to_string(),
                    span: word.span(),
                })),
                _ => return Err(JelError::syntax("expected a name or `_` in pattern", span_of(run.tokens))),
            }
        }
        Ok(Pattern {
            kind: PatternKind::Array(slots),
            sequence: pattern_sequence(container),
        })
    }
}

fn field_key(token: &Token) -> Result<String, JelError> {
    match token.as_leaf() {
        Some(leaf) if matches!(leaf.kind, TokenKind::Word | TokenKind::String) => Ok(leaf.value.clone()),
        _ => Err(JelError::syntax(format!("unexpected {} in pattern", token), token.span())),
    }
}

fn pattern_sequence(container: &ContainerToken) -> Rc<Sequence> {
    Sequence::primitive(SequenceKind::Pattern, vec![Token::Container(container.clone())])
}
