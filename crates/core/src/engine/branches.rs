//! `if` and `match` values. The first applicable branch wins.
use super::pipeline;
use crate::ast::{Alias, Condition, Conditional, Expression, MatchExpression, MatchKey, Member};
use crate::context::JelContext;
use crate::error::{Eval, Interrupt, JelError};
use jel_json::Value;
use jel_lexer::Span;

pub(super) fn conditional(conditional: &Conditional, ctx: &mut JelContext) -> Eval<Value> {
    for branch in &conditional.branches {
        let holds = match &branch.alias {
            Some(Alias::Condition(Condition::Always(_))) => true,
            Some(Alias::Condition(Condition::Test(test))) => test.apply(ctx)?.truthy(),
            _ => return Err(malformed(branch)),
        };
        if holds {
            return branch_value(branch, ctx);
        }
    }
    unmatched(ctx, "no condition of the 'if' holds".to_string(), conditional.sequence.span)
}

pub(super) fn match_value(expression: &MatchExpression, ctx: &mut JelContext) -> Eval<Value> {
    let subject = expression.subject.apply(ctx)?;
    for branch in &expression.branches {
        let matched = match &branch.alias {
            Some(Alias::Expression(MatchKey::Default(_))) => true,
            Some(Alias::Expression(MatchKey::Value(key))) => matches_key(key, &subject, ctx)?,
            _ => return Err(malformed(branch)),
        };
        if matched {
            return branch_value(branch, ctx);
        }
    }
    unmatched(
        ctx,
        format!("no branch of the 'match' applies to {}", subject.to_display_string()),
        expression.sequence.span,
    )
}

/// Boolean keys (`$n > 10: …`) test the condition; any other key is compared
/// with the subject.
fn matches_key(key: &Expression, subject: &Value, ctx: &mut JelContext) -> Eval<bool> {
    let value = key.apply(ctx)?;
    match key {
        Expression::Logical(_) => Ok(value.truthy()),
        _ => Ok(value == *subject),
    }
}

fn branch_value(branch: &Member, ctx: &mut JelContext) -> Eval<Value> {
    let outputs = pipeline::run(ctx, branch)?;
    match outputs.as_slice() {
        [] => Ok(Value::Null),
        [only] => only.value.apply(ctx),
        _ => Err(JelError::evaluation("a branch producing several members is not supported")
            .with_span(branch.span())
            .into()),
    }
}

fn unmatched(ctx: &JelContext, message: String, span: Span) -> Eval<Value> {
    if ctx.config().strict_pathing {
        return Err(JelError::evaluation(message).with_span(span).into());
    }
    Ok(Value::Null)
}

fn malformed(branch: &Member) -> Interrupt {
    JelError::evaluation("branch without a condition")
        .with_span(branch.span())
        .into()
}

#[cfg(test)]
mod tests {
    use crate::config::EvaluationConfig;
    use crate::context::JelContext;
    use crate::engine::tests::{eval, eval_with};
    use serde_json::json;

    #[test]
    fn test_first_true_condition_wins() {
        let source = "n: 42\nif size: {\n  $n < 10: small\n  $n < 100: medium\n  else: large\n}";
        assert_eq!(eval(source)["size"], json!("medium"));
    }

    #[test]
    fn test_no_branch_is_null_unless_strict() {
        let source = "n: 1\nif size: { $n > 10: big }";
        assert_eq!(eval(source)["size"], json!(null));
        let mut ctx = JelContext::with_config(EvaluationConfig::default().strict(true));
        let error = eval_with(source, &mut ctx).unwrap_err();
        assert_eq!(error.message, "no condition of the 'if' holds");
    }

    #[test]
    fn test_match_compares_with_subject() {
        let source = "code: 404\nmatch label: $code { 200: ok, 404: missing, default: unknown }";
        assert_eq!(eval(source)["label"], json!("missing"));
        let fallback = "code: 500\nmatch label: $code { 200: ok, default: unknown }";
        assert_eq!(eval(fallback)["label"], json!("unknown"));
    }

    #[test]
    fn test_match_on_strings_and_conditions() {
        let source = "kind: cat\nn: 12\nmatch sound: $kind { dog: woof, cat: meow }\nmatch band: $n { $n >= 10: high, default: low }";
        let value = eval(source);
        assert_eq!(value["sound"], json!("meow"));
        assert_eq!(value["band"], json!("high"));
    }

    #[test]
    fn test_strict_match_reports_subject() {
        let mut ctx = JelContext::with_config(EvaluationConfig::default().strict(true));
        let error = eval_with("match v: 3 { 1: one }", &mut ctx).unwrap_err();
        assert_eq!(error.message, "no branch of the 'match' applies to 3");
    }

    #[test]
    fn test_branch_value_can_be_logged() {
        let value = eval("n: 3\nif parity: { log $n % 2 == 1: odd, else: even }");
        assert_eq!(value["parity"], json!("odd"));
    }
}
