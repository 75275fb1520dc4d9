//! Token tree to AST.
//!
//! The lexer has already paired every delimiter, so parsing works one
//! container level at a time: a level is split into runs (members or
//! elements), each run is split at its first `:` into a key segment and a
//! value, and the value is classified by looking at its tokens. Modifiers
//! that force a value mode (`if`, `match`, `math`) are known before the value
//! is parsed.

mod branches;
mod interpolation;
mod lookahead;
mod member;
mod operator;
mod pattern;
mod reference;
mod tuple;

use crate::ast::{ArrayExpression, Document, Expression, ForcedValue, Literal, ObjectExpression};
use crate::error::JelError;
use crate::path::JsonPath;
use crate::sequence::{Sequence, SequenceKind};
use jel_json::{Number, Value};
use jel_lexer::{ContainerToken, Delimiter, Span, Token, TokenKind, tokenize};
use lookahead::{find_symbol, span_of, split_runs, trim};
use member::MemberContext;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// How a member value is to be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ValueMode {
    Default,
    Conditional,
    Match,
    /// Flat numeric expression (`math`).
    Operator,
}

impl From<Option<ForcedValue>> for ValueMode {
    fn from(forced: Option<ForcedValue>) -> Self {
        match forced {
            Some(ForcedValue::Conditional) => ValueMode::Conditional,
            Some(ForcedValue::Match) => ValueMode::Match,
            Some(ForcedValue::Operator) => ValueMode::Operator,
            None => ValueMode::Default,
        }
    }
}

/// Parses JEL source that has no file name.
pub fn parse(source: &str) -> Result<Document, JelError> {
    parse_named(source, None)
}

/// Parses JEL source; errors carry `path`.
pub fn parse_named(source: &str, path: Option<&Path>) -> Result<Document, JelError> {
    let tokens = tokenize(source).map_err(|e| JelError::from(e).in_file(path))?;
    let root = Parser::new(source).document(&tokens).map_err(|e| e.in_file(path))?;
    Ok(Document {
        root,
        source: Rc::from(source),
        path: path.map(PathBuf::from),
    })
}

pub fn parse_file(path: impl AsRef<Path>) -> Result<Document, JelError> {
    let path = path.as_ref();
    let source = std::fs::read_to_string(path)
        .map_err(|e| JelError::import(format!("cannot read '{}': {}", path.display(), e)))?;
    parse_named(&source, Some(path))
}

/// Parses standalone path text such as `a.b[0]` or `$a.b[0]`.
pub fn parse_path(text: &str) -> Result<JsonPath, JelError> {
    let text = text.trim();
    let source = if text.starts_with('$') {
        text.to_string()
    } else {
        format!("${}", text)
    };
    let tokens = tokenize(&source)?;
    let tokens = trim(&tokens);
    if reference::reference_end(tokens, 0) != Some(tokens.len()) {
        return Err(JelError::syntax(format!("'{}' is not a path", text), span_of(tokens)));
    }
    Parser::new(&source).reference(tokens)
}

pub(crate) struct Parser<'s> {
    source: &'s str,
}

impl<'s> Parser<'s> {
    pub fn new(source: &'s str) -> Self {
        Self { source }
    }

    fn text(&self, span: Span) -> &'s str {
        span.text(self.source)
    }

    /// A document is one value, or a brace-less object when its top level
    /// contains a `:`.
    fn document(&self, tokens: &[Token]) -> Result<Rc<Expression>, JelError> {
        let body = trim(tokens);
        if body.is_empty() {
            return Ok(Rc::new(Expression::Literal(Literal {
                value: Value::Null,
                sequence: Sequence::synthetic(SequenceKind::Document, Span::default()),
            })));
        }
        if find_symbol(body, ":").is_some() {
            let members = self.members(tokens, MemberContext::Object)?;
            let sequence = Sequence::enclosed(
                SequenceKind::Document,
                span_of(body),
                members.iter().map(|m| m.sequence.clone()).collect(),
            );
            return Ok(Rc::new(Expression::Object(ObjectExpression { members, sequence })));
        }
        let runs = split_runs(tokens)?;
        if let Some(extra) = runs.get(1) {
            return Err(JelError::syntax("unexpected content after the document value", extra.span()));
        }
        self.value(runs[0].tokens, ValueMode::Default, span_of(body))
    }

    /// Parses a value. `at` locates the error when `tokens` is empty.
    pub(crate) fn value(&self, tokens: &[Token], mode: ValueMode, at: Span) -> Result<Rc<Expression>, JelError> {
        let tokens = trim(tokens);
        if tokens.is_empty() {
            return Err(JelError::syntax("expected a value", at));
        }
        match mode {
            ValueMode::Conditional => return self.conditional(tokens),
            ValueMode::Match => return self.match_expression(tokens),
            ValueMode::Operator => return self.math(tokens),
            ValueMode::Default => {}
        }
        if tokens.len() == 1 {
            return self.single(&tokens[0]);
        }
        if reference::path_end(tokens, 0) == Some(tokens.len()) {
            return Ok(Rc::new(Expression::Reference(self.reference(tokens)?)));
        }
        if let Some(expression) = self.operation(tokens)? {
            return Ok(expression);
        }
        self.interpolation(tokens)
    }

    /// A value made of one token.
    fn single(&self, token: &Token) -> Result<Rc<Expression>, JelError> {
        let leaf = match token {
            Token::Container(container) => return self.container(container),
            Token::Leaf(leaf) => leaf,
        };
        let (kind, value) = match leaf.kind {
            TokenKind::String => (SequenceKind::String, Value::String(leaf.value.clone())),
            TokenKind::Number => {
                let number = Number::parse(&leaf.text)
                    .ok_or_else(|| JelError::syntax(format!("invalid number '{}'", leaf.text), leaf.span))?;
                (SequenceKind::Number, Value::Number(number))
            }
            TokenKind::Word => match leaf.text.as_str() {
                "true" => (SequenceKind::Boolean, Value::Bool(true)),
                "false" => (SequenceKind::Boolean, Value::Bool(false)),
                "null" => (SequenceKind::Null, Value::Null),
                word => (SequenceKind::String, Value::from(word)),
            },
            _ => return Err(JelError::syntax(format!("unexpected {}", token), leaf.span)),
        };
        Ok(Rc::new(Expression::Literal(Literal {
            value,
            sequence: Sequence::primitive(kind, vec![token.clone()]),
        })))
    }

    fn container(&self, container: &ContainerToken) -> Result<Rc<Expression>, JelError> {
        match container.delimiter {
            Delimiter::Brace => self.object(container),
            Delimiter::Bracket => self.array(container),
            Delimiter::Paren => self.value(&container.children, ValueMode::Default, container.span),
        }
    }

    fn object(&self, container: &ContainerToken) -> Result<Rc<Expression>, JelError> {
        let members = self.members(&container.children, MemberContext::Object)?;
        let sequence = Sequence::enclosed(
            SequenceKind::Object,
            container.span,
            members.iter().map(|m| m.sequence.clone()).collect(),
        );
        Ok(Rc::new(Expression::Object(ObjectExpression { members, sequence })))
    }

    fn array(&self, container: &ContainerToken) -> Result<Rc<Expression>, JelError> {
        let members = self.members(&container.children, MemberContext::Array)?;
        let sequence = Sequence::enclosed(
            SequenceKind::Array,
            container.span,
            members.iter().map(|m| m.sequence.clone()).collect(),
        );
        Ok(Rc::new(Expression::Array(ArrayExpression { members, sequence })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Alias, Fragment, ModifierKind};

    fn root(source: &str) -> Rc<Expression> {
        parse(source).unwrap().root
    }

    fn literal(expression: &Expression) -> &Value {
        match expression {
            Expression::Literal(literal) => &literal.value,
            other => panic!("expected a literal, got {:?}", other),
        }
    }

    #[test]
    fn test_single_token_values() {
        assert_eq!(literal(&root("42")), &Value::from(42));
        assert_eq!(literal(&root("\"a\\nb\"")), &Value::from("a\nb"));
        assert_eq!(literal(&root("null")), &Value::Null);
        assert_eq!(literal(&root("hello")), &Value::from("hello"));
        assert!(matches!(literal(&root("")), Value::Null));
    }

    #[test]
    fn test_braceless_document_is_an_object() {
        let document = root("a: 1\nb: 2");
        let Expression::Object(object) = document.as_ref() else {
            panic!("expected object");
        };
        assert_eq!(object.members.len(), 2);
        assert_eq!(object.members[1].key(), Some("b"));
    }

    #[test]
    fn test_member_with_modifiers_and_key() {
        let document = root("{ private noinline secret: 1 }");
        let Expression::Object(object) = document.as_ref() else {
            panic!("expected object");
        };
        let member = &object.members[0];
        assert_eq!(member.key(), Some("secret"));
        let names: Vec<_> = member.modifiers.iter().map(|m| m.kind.name()).collect();
        assert_eq!(names, vec!["private", "noinline"]);
    }

    #[test]
    fn test_keyword_alone_is_a_key() {
        let document = root("{ set: 1, merge: { a: 1 } }");
        let Expression::Object(object) = document.as_ref() else {
            panic!("expected object");
        };
        assert_eq!(object.members[0].key(), Some("set"));
        assert!(object.members[1].alias.is_none());
        assert!(matches!(object.members[1].modifiers[0].kind, ModifierKind::Merge));
    }

    #[test]
    fn test_path_alias_with_assignment_modifier() {
        let document = root("{ set $config.port: 80 }");
        let Expression::Object(object) = document.as_ref() else {
            panic!("expected object");
        };
        assert!(matches!(&object.members[0].alias, Some(Alias::Path(p)) if p.text == "$config.port"));
    }

    #[test]
    fn test_mixed_tokens_interpolate() {
        let document = root("{ greeting: Hello  $name! }");
        let Expression::Object(object) = document.as_ref() else {
            panic!("expected object");
        };
        let Expression::Interpolation(interpolation) = object.members[0].value.as_ref() else {
            panic!("expected interpolation");
        };
        assert!(matches!(&interpolation.parts[0], Fragment::Text(t) if t == "Hello  "));
        assert!(matches!(&interpolation.parts[1], Fragment::Reference(p) if p.text == "$name"));
        assert!(matches!(&interpolation.parts[2], Fragment::Text(t) if t == "!"));
    }

    #[test]
    fn test_extra_document_content_is_rejected() {
        let error = parse("[1]\n[2]").unwrap_err();
        assert_eq!(error.message, "unexpected content after the document value");
    }

    #[test]
    fn test_out_of_range_numbers_are_rejected() {
        let error = parse("big: 1e400").unwrap_err();
        assert!(error.is_syntax());
        assert_eq!(error.message, "invalid number '1e400'");
    }

    #[test]
    fn test_parse_path_adds_dollar() {
        let path = parse_path("a.b[0]").unwrap();
        assert_eq!(path.root_name(), "a");
        assert_eq!(path.components.len(), 3);
        assert!(parse_path("a b").is_err());
    }

    #[test]
    fn test_errors_carry_file() {
        let error = parse_named("{ a: }", Some(Path::new("x.jel"))).unwrap_err();
        assert_eq!(error.file.as_deref(), Some(Path::new("x.jel")));
    }
}
