//! Evaluation of parsed documents.
//!
//! Entry point: [`evaluate`] with a [`JelContext`]. Every node implements
//! [`Expression::apply`]; `return`/`yield` travel up as [`Interrupt::Exit`]
//! until a template call or generator iteration consumes them.

mod branches;
mod call;
mod construct;
mod effect;
mod generator;
mod operation;
mod pipeline;
mod resolve;

use crate::ast::{Document, Expression, Tuple};
use crate::context::JelContext;
use crate::error::{Eval, JelError};
use jel_json::{Number, Value};

/// Evaluates `document` in `ctx`. An early exit that reaches the document
/// root is reported as a misuse error.
pub fn evaluate(document: &Document, ctx: &mut JelContext) -> Result<Value, JelError> {
    log::debug!(
        "evaluating {}",
        document
            .path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<input>".to_string())
    );
    document
        .root
        .apply(ctx)
        .map_err(|interrupt| interrupt.into_error().in_file(document.path.as_deref()))
}

impl Expression {
    pub fn apply(&self, ctx: &mut JelContext) -> Eval<Value> {
        match self {
            Expression::Literal(literal) => Ok(literal.value.clone()),
            Expression::Arithmetic(expression) => operation::arithmetic(expression, ctx),
            Expression::Logical(expression) => operation::logical(expression, ctx),
            Expression::Interpolation(interpolation) => operation::interpolate(interpolation, ctx),
            Expression::Object(object) => construct::object(object, ctx),
            Expression::Array(array) => construct::array(array, ctx),
            // Reading a container through a reference yields a copy; writes
            // go through `set`/`add`/`merge` and reach the original.
            Expression::Reference(path) => Ok(path.evaluate(ctx)?.deep_copy(true)),
            Expression::Conditional(conditional) => branches::conditional(conditional, ctx),
            Expression::Match(expression) => branches::match_value(expression, ctx),
            Expression::Template(template) => Ok(call::closure(template, ctx)),
            Expression::Generator(generator) => generator::generate(generator, ctx),
            Expression::Delegate(delegate) => call::delegate(delegate, ctx),
            Expression::Effect(effect) => effect::apply(effect, ctx),
        }
    }

    pub fn apply_number(&self, ctx: &mut JelContext) -> Eval<Number> {
        match self.apply(ctx)? {
            Value::Number(number) => Ok(number),
            other => Err(self.coercion_error("a number", &other).into()),
        }
    }

    pub fn apply_string(&self, ctx: &mut JelContext) -> Eval<String> {
        match self.apply(ctx)? {
            Value::String(text) => Ok(text),
            other => Err(self.coercion_error("a string", &other).into()),
        }
    }

    pub fn apply_bool(&self, ctx: &mut JelContext) -> Eval<bool> {
        match self.apply(ctx)? {
            Value::Bool(flag) => Ok(flag),
            other => Err(self.coercion_error("a boolean", &other).into()),
        }
    }

    fn coercion_error(&self, expected: &str, found: &Value) -> JelError {
        JelError::evaluation(format!("expected {}, found {}", expected, found.type_name())).with_span(self.span())
    }
}

/// Values of a tuple. `$path..` items splice their array; a null expansion
/// contributes nothing.
pub(crate) fn evaluate_tuple(tuple: &Tuple, ctx: &mut JelContext) -> Eval<Vec<Value>> {
    let mut values = Vec::with_capacity(tuple.items.len());
    for item in &tuple.items {
        let value = item.apply(ctx)?;
        if !item.is_expansion() {
            values.push(value);
            continue;
        }
        match value {
            Value::Array(array) => values.extend(array.values()),
            Value::Null => {}
            other => {
                return Err(JelError::evaluation(format!("cannot expand a {}, expected an array", other.type_name()))
                    .with_span(item.span())
                    .into());
            }
        }
    }
    Ok(values)
}
