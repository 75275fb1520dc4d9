//! Values forced by `if` and `match`.
use super::lookahead::{span_of, trim};
use super::member::MemberContext;
use super::{Parser, ValueMode};
use crate::ast::{Conditional, Expression, MatchExpression};
use crate::error::JelError;
use crate::sequence::{Sequence, SequenceKind};
use jel_lexer::{ContainerToken, Delimiter, Token};
use std::rc::Rc;

fn block(token: Option<&Token>) -> Option<&ContainerToken> {
    token
        .and_then(Token::as_container)
        .filter(|c| c.delimiter == Delimiter::Brace)
}

impl Parser<'_> {
    /// `{ condition: value, …, else: value }`
    pub(crate) fn conditional(&self, tokens: &[Token]) -> Result<Rc<Expression>, JelError> {
        let body = match tokens {
            [token] => block(Some(token)),
            _ => None,
        }
        .ok_or_else(|| JelError::syntax("'if' expects a block of `condition: value` branches", span_of(tokens)))?;
        let branches = self.members(&body.children, MemberContext::Conditional)?;
        let sequence = Sequence::enclosed(
            SequenceKind::Conditional,
            body.span,
            branches.iter().map(|b| b.sequence.clone()).collect(),
        );
        Ok(Rc::new(Expression::Conditional(Conditional { branches, sequence })))
    }

    /// `<subject> { key: value, …, default: value }`
    pub(crate) fn match_expression(&self, tokens: &[Token]) -> Result<Rc<Expression>, JelError> {
        let (last, subject) = tokens
            .split_last()
            .ok_or_else(|| JelError::syntax("expected a match subject", span_of(tokens)))?;
        let body = block(Some(last)).ok_or_else(|| {
            JelError::syntax("'match' expects a block of `key: value` branches", last.span())
        })?;
        let subject = trim(subject);
        if subject.is_empty() {
            return Err(JelError::syntax("'match' needs a subject before its branches", body.span));
        }
        let subject = self.value(subject, ValueMode::Default, body.span)?;
        let branches = self.members(&body.children, MemberContext::Match)?;
        let mut children = vec![subject.sequence().clone()];
        children.extend(branches.iter().map(|b| b.sequence.clone()));
        let sequence = Sequence::enclosed(SequenceKind::Match, span_of(tokens), children);
        Ok(Rc::new(Expression::Match(MatchExpression {
            subject,
            branches,
            sequence,
        })))
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::{Alias, Condition, Expression, MatchKey};
    use crate::parser::parse;

    fn value(source: &str) -> std::rc::Rc<Expression> {
        let document = parse(source).unwrap();
        let Expression::Object(object) = document.root.as_ref() else {
            panic!("expected object");
        };
        object.members[0].value.clone()
    }

    #[test]
    fn test_conditional_branches_in_order() {
        let value = value("if size: {\n  $n < 10: small\n  $n < 100: medium\n  else: large\n}");
        let Expression::Conditional(conditional) = value.as_ref() else {
            panic!("expected conditional");
        };
        assert_eq!(conditional.branches.len(), 3);
        assert!(matches!(
            conditional.branches[2].alias,
            Some(Alias::Condition(Condition::Always(_)))
        ));
    }

    #[test]
    fn test_match_subject_and_keys() {
        let value = value("match label: $code { 200: ok, 404: missing, default: other }");
        let Expression::Match(expression) = value.as_ref() else {
            panic!("expected match");
        };
        assert!(matches!(expression.subject.as_ref(), Expression::Reference(p) if p.text == "$code"));
        assert!(matches!(
            &expression.branches[0].alias,
            Some(Alias::Expression(MatchKey::Value(_)))
        ));
        assert!(matches!(
            &expression.branches[2].alias,
            Some(Alias::Expression(MatchKey::Default(_)))
        ));
    }

    #[test]
    fn test_forced_value_shape_errors() {
        assert!(
            parse("if x: 5")
                .unwrap_err()
                .message
                .starts_with("'if' expects a block")
        );
        assert_eq!(
            parse("match x: { a: 1 }").unwrap_err().message,
            "'match' needs a subject before its branches"
        );
    }
}
