//! Arithmetic, logical and interpolated values.
use crate::ast::{ArithmeticExpression, Clause, Fragment, Interpolation, LogicalExpression, Operand};
use crate::context::JelContext;
use crate::error::{Eval, Interrupt, JelError};
use crate::operators::{evaluate_arithmetic, evaluate_comparison, evaluate_unary};
use itertools::Itertools;
use jel_json::Value;

/// Strictly left to right; precedence is already encoded as nested groups.
pub(super) fn arithmetic(expression: &ArithmeticExpression, ctx: &mut JelContext) -> Eval<Value> {
    let Some((first, rest)) = expression.operands.split_first() else {
        return Ok(Value::Null);
    };
    let mut accumulator = operand(first, ctx)?;
    for (right, (operator, span)) in rest.iter().zip(&expression.operators) {
        let value = operand(right, ctx)?;
        accumulator = evaluate_arithmetic(*operator, &accumulator, &value)
            .map_err(|e| e.with_span(*span).with_span(right.span))?;
    }
    if expression.numeric && !matches!(accumulator, Value::Number(_)) {
        return Err(JelError::evaluation(format!(
            "'math' produced {}, expected a number",
            accumulator.type_name()
        ))
        .with_span(expression.sequence.span)
        .into());
    }
    Ok(accumulator)
}

fn operand(operand: &Operand, ctx: &mut JelContext) -> Eval<Value> {
    let value = operand.expression.apply(ctx)?;
    match operand.unary {
        Some(op) => evaluate_unary(op, &value).map_err(|e| Interrupt::from(e.with_span(operand.span))),
        None => Ok(value),
    }
}

/// `a && b || c`: short-circuits on the first true conjunction.
pub(super) fn logical(expression: &LogicalExpression, ctx: &mut JelContext) -> Eval<Value> {
    for conjunction in &expression.disjuncts {
        let mut holds = true;
        for clause in conjunction {
            if !clause_holds(clause, ctx)? {
                holds = false;
                break;
            }
        }
        if holds {
            return Ok(Value::Bool(true));
        }
    }
    Ok(Value::Bool(false))
}

fn clause_holds(clause: &Clause, ctx: &mut JelContext) -> Eval<bool> {
    match clause {
        Clause::Comparison {
            left,
            operator,
            right,
            span,
        } => {
            let left = left.apply(ctx)?;
            let right = right.apply(ctx)?;
            evaluate_comparison(*operator, &left, &right).map_err(|e| Interrupt::from(e.with_span(*span)))
        }
        Clause::Truthy(expression) => Ok(expression.apply(ctx)?.truthy()),
    }
}

pub(super) fn interpolate(interpolation: &Interpolation, ctx: &mut JelContext) -> Eval<Value> {
    let mut pieces = Vec::with_capacity(interpolation.parts.len());
    for part in &interpolation.parts {
        match part {
            Fragment::Text(text) => pieces.push(text.clone()),
            Fragment::Reference(path) => pieces.push(path.evaluate(ctx)?.to_display_string()),
        }
    }
    Ok(Value::String(pieces.into_iter().join("")))
}
