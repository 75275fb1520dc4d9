//! Operator expressions.
//!
//! A run is an operator expression only if it alternates cleanly between
//! operands and binary operators; anything else is left to interpolation.
//! `*`, `/` and `%` bind tighter than `+` and `-`, comparisons join two
//! arithmetic sides, and `&&` binds tighter than `||`. Under `math` the
//! expression is flat and evaluated left to right.
use super::lookahead::{is_binary_operator, next_significant, span_of};
use super::reference::path_end;
use super::{Parser, ValueMode};
use crate::ast::{
    ArithmeticExpression, ArithmeticOperator, Clause, Expression, Literal, LogicalExpression, LogicalOperator,
    Operand, RelationalOperator, StrongType, UnaryOperator,
};
use crate::error::JelError;
use crate::sequence::{Sequence, SequenceKind};
use jel_json::Value;
use jel_lexer::{Delimiter, Span, Token, TokenKind};
use std::rc::Rc;

enum Piece<'t> {
    Operand {
        unary: Option<(UnaryOperator, &'t Token)>,
        tokens: &'t [Token],
    },
    Operator(&'t Token),
    /// Multiplication implied by `2 (3)` or `$a ($b)`.
    Implicit(Span),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Arithmetic(ArithmeticOperator),
    Relational(RelationalOperator),
    Logical(LogicalOperator),
}

impl Op {
    fn from_symbol(symbol: &str) -> Option<Op> {
        if let Some(op) = ArithmeticOperator::from_symbol(symbol) {
            return Some(Op::Arithmetic(op));
        }
        if let Some(op) = RelationalOperator::from_symbol(symbol) {
            return Some(Op::Relational(op));
        }
        match symbol {
            "&&" => Some(Op::Logical(LogicalOperator::And)),
            "||" => Some(Op::Logical(LogicalOperator::Or)),
            _ => None,
        }
    }
}

/// An operator between two operands together with its source, if written.
struct Joint {
    op: Op,
    span: Span,
    sequence: Option<Rc<Sequence>>,
}

fn starts_operand(tokens: &[Token], index: usize) -> bool {
    let Some(token) = tokens.get(index) else {
        return false;
    };
    path_end(tokens, index).is_some()
        || token.is_container(Delimiter::Paren)
        || token.is_kind(TokenKind::Number)
}

fn is_plain_operand(token: &Token) -> bool {
    match token {
        Token::Leaf(leaf) => match leaf.kind {
            TokenKind::Number | TokenKind::String => true,
            TokenKind::Word => matches!(leaf.text.as_str(), "true" | "false" | "null"),
            _ => false,
        },
        Token::Container(_) => true,
    }
}

impl Parser<'_> {
    /// Splits `tokens` into alternating operands and operators, or `None`
    /// when the run is not an operator expression.
    fn pieces<'t>(&self, tokens: &'t [Token]) -> Result<Option<Vec<Piece<'t>>>, JelError> {
        let mut pieces = Vec::new();
        let mut expect_operand = true;
        let mut i = next_significant(tokens, 0);
        while i < tokens.len() {
            let token = &tokens[i];
            if expect_operand {
                let mut unary = None;
                let mut start = i;
                if token.is_symbol("-") || token.is_symbol("!") {
                    let next = next_significant(tokens, i + 1);
                    if !starts_operand(tokens, next) {
                        if pieces.is_empty() {
                            return Err(JelError::syntax("illegal modifying operator usage", token.span()));
                        }
                        return Ok(None);
                    }
                    let op = if token.is_symbol("-") {
                        UnaryOperator::Negate
                    } else {
                        UnaryOperator::Not
                    };
                    unary = Some((op, token));
                    start = next;
                }
                let end = match path_end(tokens, start) {
                    Some(end) => end,
                    None if is_plain_operand(&tokens[start]) => start + 1,
                    None => return Ok(None),
                };
                pieces.push(Piece::Operand {
                    unary,
                    tokens: &tokens[start..end],
                });
                expect_operand = false;
                i = next_significant(tokens, end);
            } else if is_binary_operator(token) {
                pieces.push(Piece::Operator(token));
                expect_operand = true;
                i = next_significant(tokens, i + 1);
            } else if token.is_container(Delimiter::Paren) {
                pieces.push(Piece::Implicit(token.span()));
                expect_operand = true;
            } else {
                return Ok(None);
            }
        }
        if expect_operand {
            return Ok(None);
        }
        Ok(Some(pieces))
    }

    /// Parses `tokens` as an operator expression if they form one. A lone
    /// operand only counts when it carries a unary operator.
    pub(crate) fn operation(&self, tokens: &[Token]) -> Result<Option<Rc<Expression>>, JelError> {
        let Some(pieces) = self.pieces(tokens)? else {
            return Ok(None);
        };
        if let [Piece::Operand { unary: None, .. }] = pieces.as_slice() {
            return Ok(None);
        }
        self.build(pieces, tokens, false).map(Some)
    }

    /// The value of a `math` member.
    pub(crate) fn math(&self, tokens: &[Token]) -> Result<Rc<Expression>, JelError> {
        let pieces = self.pieces(tokens)?.ok_or_else(|| {
            JelError::syntax("'math' expects an arithmetic expression", span_of(tokens))
        })?;
        self.build(pieces, tokens, true)
    }

    fn build(&self, pieces: Vec<Piece<'_>>, tokens: &[Token], flat: bool) -> Result<Rc<Expression>, JelError> {
        let mut operands = Vec::new();
        let mut joints = Vec::new();
        for piece in pieces {
            match piece {
                Piece::Operand { unary, tokens } => operands.push(self.operand(unary, tokens, flat)?),
                Piece::Operator(token) => {
                    let op = Op::from_symbol(token.text())
                        .ok_or_else(|| JelError::syntax(format!("unknown operator {}", token), token.span()))?;
                    joints.push(Joint {
                        op,
                        span: token.span(),
                        sequence: Some(Sequence::primitive(SequenceKind::Operator, vec![token.clone()])),
                    });
                }
                Piece::Implicit(span) => joints.push(Joint {
                    op: Op::Arithmetic(ArithmeticOperator::Multiply),
                    span,
                    sequence: None,
                }),
            }
        }

        if flat {
            if let Some(joint) = joints.iter().find(|j| !matches!(j.op, Op::Arithmetic(_))) {
                return Err(JelError::syntax("'math' only allows arithmetic operators", joint.span));
            }
            return Ok(self.arithmetic_flat(operands, joints, true));
        }
        if joints.iter().any(|j| !matches!(j.op, Op::Arithmetic(_))) {
            return self.logical(operands, joints, tokens);
        }
        Ok(self.arithmetic(operands, joints))
    }

    fn operand(
        &self,
        unary: Option<(UnaryOperator, &Token)>,
        tokens: &[Token],
        flat: bool,
    ) -> Result<Operand, JelError> {
        let expression = match tokens {
            [Token::Container(group)] if group.delimiter == Delimiter::Paren && flat => {
                self.value(&group.children, ValueMode::Operator, group.span)?
            }
            [single] => self.single(single)?,
            _ => Rc::new(Expression::Reference(self.reference(tokens)?)),
        };
        let mismatch = expression.strong_type().filter(|t| *t != StrongType::Number);
        if let (true, Some(found)) = (flat, mismatch) {
            return Err(JelError::syntax(
                format!("'math' expects numbers, found a {}", found),
                expression.span(),
            ));
        }
        let span = match unary {
            Some((_, token)) => token.span().to(&expression.span()),
            None => expression.span(),
        };

        // `-5` is a literal, not a negation.
        if let (Some((UnaryOperator::Negate, minus)), Expression::Literal(literal)) = (unary, expression.as_ref()) {
            if let Value::Number(number) = &literal.value {
                let mut tokens = vec![minus.clone()];
                tokens.extend(tokens_of(&literal.sequence));
                return Ok(Operand {
                    unary: None,
                    expression: Rc::new(Expression::Literal(Literal {
                        value: Value::Number(number.neg()),
                        sequence: Sequence::primitive(SequenceKind::Number, tokens),
                    })),
                    span,
                });
            }
        }
        Ok(Operand {
            unary: unary.map(|(op, _)| op),
            expression,
            span,
        })
    }

    /// Precedence-aware arithmetic: multiplicative runs become nested terms.
    fn arithmetic(&self, operands: Vec<Operand>, joints: Vec<Joint>) -> Rc<Expression> {
        let mut terms: Vec<(Vec<Operand>, Vec<Joint>)> = Vec::new();
        let mut additive: Vec<Joint> = Vec::new();
        let mut operands = operands.into_iter();
        let mut current: (Vec<Operand>, Vec<Joint>) = (operands.next().into_iter().collect(), Vec::new());
        for (joint, operand) in joints.into_iter().zip(operands) {
            let multiplicative = matches!(joint.op, Op::Arithmetic(op) if op.is_multiplicative());
            if multiplicative {
                current.0.push(operand);
                current.1.push(joint);
            } else {
                terms.push(std::mem::replace(&mut current, (vec![operand], Vec::new())));
                additive.push(joint);
            }
        }
        terms.push(current);

        let mut term_operands: Vec<Operand> = terms
            .into_iter()
            .map(|(operands, joints)| {
                let expression = self.arithmetic_flat(operands, joints, false);
                Operand {
                    unary: None,
                    span: expression.span(),
                    expression,
                }
            })
            .collect();
        if additive.is_empty() {
            if let Some(only) = term_operands.pop() {
                return only.expression;
            }
        }
        self.arithmetic_flat(term_operands, additive, false)
    }

    /// One left-to-right chain. A single operand without a unary operator is
    /// returned as is.
    fn arithmetic_flat(&self, mut operands: Vec<Operand>, joints: Vec<Joint>, numeric: bool) -> Rc<Expression> {
        if joints.is_empty() && !numeric && operands.len() == 1 && operands[0].unary.is_none() {
            if let Some(only) = operands.pop() {
                return only.expression;
            }
        }
        let mut children = Vec::new();
        let mut operators = Vec::new();
        let mut joints = joints.into_iter();
        for (index, operand) in operands.iter().enumerate() {
            if index > 0 {
                if let Some(joint) = joints.next() {
                    if let Op::Arithmetic(op) = joint.op {
                        operators.push((op, joint.span));
                    }
                    children.extend(joint.sequence);
                }
            }
            children.push(operand.expression.sequence().clone());
        }
        Rc::new(Expression::Arithmetic(ArithmeticExpression {
            operands,
            operators,
            numeric,
            sequence: Sequence::parent(SequenceKind::Arithmetic, children),
        }))
    }

    fn logical(&self, operands: Vec<Operand>, joints: Vec<Joint>, tokens: &[Token]) -> Result<Rc<Expression>, JelError> {
        let mut disjuncts: Vec<Vec<Clause>> = Vec::new();
        let mut conjunction: Vec<Clause> = Vec::new();
        let mut clause: (Vec<Operand>, Vec<Joint>) = (Vec::new(), Vec::new());
        let mut operands = operands.into_iter();
        clause.0.extend(operands.next());

        for (joint, operand) in joints.into_iter().zip(operands) {
            match joint.op {
                Op::Logical(op) => {
                    let (clause_operands, clause_joints) = std::mem::replace(&mut clause, (vec![operand], Vec::new()));
                    conjunction.push(self.clause(clause_operands, clause_joints)?);
                    if op == LogicalOperator::Or {
                        disjuncts.push(std::mem::take(&mut conjunction));
                    }
                }
                _ => {
                    clause.0.push(operand);
                    clause.1.push(joint);
                }
            }
        }
        conjunction.push(self.clause(clause.0, clause.1)?);
        disjuncts.push(conjunction);

        Ok(Rc::new(Expression::Logical(LogicalExpression {
            disjuncts,
            sequence: Sequence::primitive(SequenceKind::Logical, tokens.to_vec()),
        })))
    }

    /// `a`, or `a <op> b` where both sides are arithmetic.
    fn clause(&self, mut operands: Vec<Operand>, mut joints: Vec<Joint>) -> Result<Clause, JelError> {
        let relations: Vec<usize> = joints
            .iter()
            .enumerate()
            .filter(|(_, j)| matches!(j.op, Op::Relational(_)))
            .map(|(i, _)| i)
            .collect();
        match relations.as_slice() {
            [] => Ok(Clause::Truthy(self.arithmetic(operands, joints))),
            [at] => {
                let right_operands = operands.split_off(at + 1);
                let right_joints = joints.split_off(at + 1);
                let Some(relation) = joints.pop() else {
                    unreachable!("relation index is within the joints");
                };
                let Op::Relational(operator) = relation.op else {
                    unreachable!("filtered to relational operators");
                };
                let left = self.arithmetic(operands, joints);
                let right = self.arithmetic(right_operands, right_joints);
                Ok(Clause::Comparison {
                    span: left.span().to(&right.span()),
                    left,
                    operator,
                    right,
                })
            }
            [_, second, ..] => Err(JelError::syntax("comparisons cannot be chained", joints[*second].span)),
        }
    }
}

fn tokens_of(sequence: &Sequence) -> Vec<Token> {
    match &sequence.children {
        crate::sequence::Children::Primitive(tokens) => tokens.clone(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::{ArithmeticOperator, Clause, Expression, LogicalExpression, UnaryOperator};
    use crate::parser::parse;
    use jel_json::Value;

    fn root(source: &str) -> std::rc::Rc<Expression> {
        parse(source).unwrap().root
    }

    fn logical(expression: &Expression) -> &LogicalExpression {
        match expression {
            Expression::Logical(logical) => logical,
            other => panic!("expected logical, got {:?}", other),
        }
    }

    #[test]
    fn test_multiplication_binds_tighter() {
        let expression = root("1 + 2 * 3");
        let Expression::Arithmetic(sum) = expression.as_ref() else {
            panic!("expected arithmetic");
        };
        assert_eq!(sum.operators.len(), 1);
        assert_eq!(sum.operators[0].0, ArithmeticOperator::Add);
        assert!(matches!(sum.operands[1].expression.as_ref(), Expression::Arithmetic(product)
            if product.operators[0].0 == ArithmeticOperator::Multiply));
    }

    #[test]
    fn test_negative_literal_folds() {
        let expression = root("-5");
        assert!(matches!(expression.as_ref(), Expression::Literal(l) if l.value == Value::from(-5)));
        let expression = root("-$x");
        let Expression::Arithmetic(negation) = expression.as_ref() else {
            panic!("expected arithmetic");
        };
        assert_eq!(negation.operands[0].unary, Some(UnaryOperator::Negate));
    }

    #[test]
    fn test_implicit_multiplication_before_group() {
        let expression = root("2 ($x + 1)");
        let Expression::Arithmetic(product) = expression.as_ref() else {
            panic!("expected arithmetic");
        };
        assert_eq!(product.operators[0].0, ArithmeticOperator::Multiply);
    }

    #[test]
    fn test_and_binds_tighter_than_or() {
        let expression = root("$a && $b || $c > 1");
        let logical = logical(&expression);
        assert_eq!(logical.disjuncts.len(), 2);
        assert_eq!(logical.disjuncts[0].len(), 2);
        assert!(matches!(logical.disjuncts[1][0], Clause::Comparison { .. }));
    }

    #[test]
    fn test_non_expressions_fall_back_to_strings() {
        assert!(matches!(root("$count items").as_ref(), Expression::Interpolation(_)));
        assert!(matches!(root("1 +").as_ref(), Expression::Interpolation(_)));
        assert!(matches!(root("a - b").as_ref(), Expression::Interpolation(_)));
    }

    #[test]
    fn test_operator_errors() {
        assert_eq!(parse("- x").unwrap_err().message, "illegal modifying operator usage");
        assert_eq!(parse("$a < $b < $c").unwrap_err().message, "comparisons cannot be chained");
        assert_eq!(
            parse("math x: 1 + \"a\"").unwrap_err().message,
            "'math' expects numbers, found a string"
        );
        assert_eq!(
            parse("math x: $a > 1").unwrap_err().message,
            "'math' only allows arithmetic operators"
        );
    }

    #[test]
    fn test_math_is_flat() {
        let document = parse("math x: 1 + 2 * 3").unwrap();
        let Expression::Object(object) = document.root.as_ref() else {
            panic!("expected object");
        };
        let Expression::Arithmetic(flat) = object.members[0].value.as_ref() else {
            panic!("expected arithmetic");
        };
        assert!(flat.numeric);
        assert_eq!(flat.operands.len(), 3);
    }
}
