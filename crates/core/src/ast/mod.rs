//! Expression tree produced by the parser.
//!
//! Core types: [`Document`], [`Expression`], [`Member`], [`Modifier`].
//!
//! Every node keeps the [`Sequence`] it was parsed from. Children are shared
//! through `Rc` so modifiers can wrap a value without copying the subtree.

mod member;
mod modifier;

pub use member::{Alias, AliasKind, Bindings, Condition, Key, MatchKey, Member, Param, Pattern, PatternField, PatternKind};
pub use modifier::{ForcedValue, Modifier, ModifierChain, ModifierKind};

use crate::error::ExitKind;
use crate::path::JsonPath;
use crate::sequence::{Sequence, SequenceKind};
use jel_json::Value;
use jel_lexer::Span;
use std::fmt;
use std::path::PathBuf;
use std::rc::Rc;

/// A parsed source file.
#[derive(Debug, Clone)]
pub struct Document {
    pub root: Rc<Expression>,
    pub source: Rc<str>,
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub enum Expression {
    Literal(Literal),
    Arithmetic(ArithmeticExpression),
    Logical(LogicalExpression),
    Interpolation(Interpolation),
    Object(ObjectExpression),
    Array(ArrayExpression),
    Reference(JsonPath),
    Conditional(Conditional),
    Match(MatchExpression),
    Template(TemplateExpression),
    Generator(ArrayGenerator),
    Delegate(DelegateCall),
    Effect(Effect),
}

/// The statically known result type of an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrongType {
    Null,
    Boolean,
    Number,
    String,
}

impl fmt::Display for StrongType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StrongType::Null => "null",
            StrongType::Boolean => "boolean",
            StrongType::Number => "number",
            StrongType::String => "string",
        };
        f.write_str(name)
    }
}

impl Expression {
    pub fn sequence(&self) -> &Rc<Sequence> {
        match self {
            Expression::Literal(e) => &e.sequence,
            Expression::Arithmetic(e) => &e.sequence,
            Expression::Logical(e) => &e.sequence,
            Expression::Interpolation(e) => &e.sequence,
            Expression::Object(e) => &e.sequence,
            Expression::Array(e) => &e.sequence,
            Expression::Reference(path) => &path.sequence,
            Expression::Conditional(e) => &e.sequence,
            Expression::Match(e) => &e.sequence,
            Expression::Template(e) => &e.sequence,
            Expression::Generator(e) => &e.sequence,
            Expression::Delegate(e) => &e.sequence,
            Expression::Effect(e) => &e.sequence,
        }
    }

    pub fn span(&self) -> Span {
        self.sequence().span
    }

    /// A literal standing in for a value computed at runtime.
    pub fn constant(value: Value, span: Span) -> Rc<Expression> {
        Rc::new(Expression::Literal(Literal {
            value,
            sequence: Sequence::synthetic(SequenceKind::Constant, span),
        }))
    }

    pub fn strong_type(&self) -> Option<StrongType> {
        match self {
            Expression::Literal(literal) => match &literal.value {
                Value::Null => Some(StrongType::Null),
                Value::Bool(_) => Some(StrongType::Boolean),
                Value::Number(_) => Some(StrongType::Number),
                Value::String(_) => Some(StrongType::String),
                _ => None,
            },
            Expression::Arithmetic(arithmetic) if arithmetic.numeric => Some(StrongType::Number),
            Expression::Logical(_) => Some(StrongType::Boolean),
            Expression::Interpolation(_) => Some(StrongType::String),
            _ => None,
        }
    }

    /// True for `$path..` references whose array value is spliced.
    pub fn is_expansion(&self) -> bool {
        matches!(self, Expression::Reference(path) if path.expansion)
    }
}

#[derive(Debug, Clone)]
pub struct Literal {
    pub value: Value,
    pub sequence: Rc<Sequence>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
}

impl ArithmeticOperator {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "+" => Some(Self::Add),
            "-" => Some(Self::Subtract),
            "*" => Some(Self::Multiply),
            "/" => Some(Self::Divide),
            "%" => Some(Self::Modulo),
            _ => None,
        }
    }

    pub fn is_multiplicative(self) -> bool {
        matches!(self, Self::Multiply | Self::Divide | Self::Modulo)
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Subtract => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
            Self::Modulo => "%",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationalOperator {
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
}

impl RelationalOperator {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "==" => Some(Self::Equal),
            "!=" => Some(Self::NotEqual),
            "<" => Some(Self::Less),
            "<=" => Some(Self::LessEqual),
            ">" => Some(Self::Greater),
            ">=" => Some(Self::GreaterEqual),
            _ => None,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::Less => "<",
            Self::LessEqual => "<=",
            Self::Greater => ">",
            Self::GreaterEqual => ">=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOperator {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Negate,
    Not,
}

#[derive(Debug, Clone)]
pub struct Operand {
    pub unary: Option<UnaryOperator>,
    pub expression: Rc<Expression>,
    pub span: Span,
}

/// Operands joined by operators, evaluated strictly left to right.
/// Precedence is encoded by nesting groups as operands.
#[derive(Debug, Clone)]
pub struct ArithmeticExpression {
    pub operands: Vec<Operand>,
    pub operators: Vec<(ArithmeticOperator, Span)>,
    /// Set under `math`: the result must be a number.
    pub numeric: bool,
    pub sequence: Rc<Sequence>,
}

#[derive(Debug, Clone)]
pub enum Clause {
    Comparison {
        left: Rc<Expression>,
        operator: RelationalOperator,
        right: Rc<Expression>,
        span: Span,
    },
    Truthy(Rc<Expression>),
}

/// Disjunction of conjunctions: `a && b || c` is `[[a, b], [c]]`.
#[derive(Debug, Clone)]
pub struct LogicalExpression {
    pub disjuncts: Vec<Vec<Clause>>,
    pub sequence: Rc<Sequence>,
}

#[derive(Debug, Clone)]
pub enum Fragment {
    Text(String),
    Reference(JsonPath),
}

#[derive(Debug, Clone)]
pub struct Interpolation {
    pub parts: Vec<Fragment>,
    pub sequence: Rc<Sequence>,
}

#[derive(Debug, Clone)]
pub struct ObjectExpression {
    pub members: Vec<Member>,
    pub sequence: Rc<Sequence>,
}

#[derive(Debug, Clone)]
pub struct ArrayExpression {
    pub members: Vec<Member>,
    pub sequence: Rc<Sequence>,
}

#[derive(Debug, Clone)]
pub struct Conditional {
    /// Members aliased by [`Alias::Condition`].
    pub branches: Vec<Member>,
    pub sequence: Rc<Sequence>,
}

#[derive(Debug, Clone)]
pub struct MatchExpression {
    pub subject: Rc<Expression>,
    /// Members aliased by [`Alias::Expression`].
    pub branches: Vec<Member>,
    pub sequence: Rc<Sequence>,
}

#[derive(Debug, Clone)]
pub struct Tuple {
    pub items: Vec<Rc<Expression>>,
    pub sequence: Rc<Sequence>,
}

#[derive(Debug, Clone)]
pub struct TemplateExpression {
    /// The key the template is bound to, for messages.
    pub name: Option<String>,
    pub params: Vec<Param>,
    pub body: Rc<Expression>,
    /// Modifiers written after the parameter list, applied to the body on
    /// every call.
    pub captured: Vec<Modifier>,
    pub sequence: Rc<Sequence>,
}

#[derive(Debug, Clone)]
pub struct ArrayGenerator {
    pub bindings: Bindings,
    pub sources: Tuple,
    pub body: Rc<Expression>,
    pub sequence: Rc<Sequence>,
}

#[derive(Debug, Clone)]
pub struct DelegateCall {
    pub callee: JsonPath,
    pub value: Rc<Expression>,
    pub sequence: Rc<Sequence>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectKind {
    /// `discard` drops the value after logging it.
    Log { discard: bool },
    Raise,
    Exit(ExitKind),
}

/// A value wrapped by a side-effecting modifier.
#[derive(Debug, Clone)]
pub struct Effect {
    pub kind: EffectKind,
    pub inner: Rc<Expression>,
    pub sequence: Rc<Sequence>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_is_synthetic_literal() {
        let span = Span::new(0, 3, 1, 1, 1);
        let constant = Expression::constant(Value::from(3), span);
        assert_eq!(constant.strong_type(), Some(StrongType::Number));
        assert!(constant.sequence().is_synthetic());
        assert!(!constant.is_expansion());
    }

    #[test]
    fn test_operator_symbols() {
        assert_eq!(ArithmeticOperator::from_symbol("%"), Some(ArithmeticOperator::Modulo));
        assert!(ArithmeticOperator::Divide.is_multiplicative());
        assert!(!ArithmeticOperator::Subtract.is_multiplicative());
        assert_eq!(RelationalOperator::from_symbol("<="), Some(RelationalOperator::LessEqual));
        assert_eq!(RelationalOperator::from_symbol("="), None);
    }
}
