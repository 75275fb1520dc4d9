//! Template closures, call segments and delegates.
use super::{evaluate_tuple, pipeline};
use crate::ast::{Alias, DelegateCall, Key, Member, TemplateExpression, Tuple};
use crate::context::JelContext;
use crate::error::{EarlyExit, Eval, ExitKind, Interrupt, JelError, misplaced_exit};
use crate::functions::{Closure, Function, as_function};
use crate::path::{Accessor, Reference};
use crate::scope::Scope;
use jel_json::{Callable, Format, Value};
use jel_lexer::Span;
use std::rc::Rc;

/// Closes a template over the current scope.
pub(super) fn closure(template: &TemplateExpression, ctx: &mut JelContext) -> Value {
    let closure = Closure {
        name: template.name.clone(),
        params: template.params.clone(),
        body: template.body.clone(),
        captured: template.captured.clone(),
        scope: ctx.scope().capture(),
    };
    Value::Callable(Rc::new(Function::Template(closure)))
}

/// `name(args)(args)…`, optionally on a previous path step.
///
/// The callee is the target's own member `name` when it has one. Otherwise it
/// is looked up in scope and then among the built-ins, and the target becomes
/// the first argument.
pub(crate) fn call_path(
    ctx: &mut JelContext,
    target: Option<&Reference>,
    name: &str,
    arguments: &[Tuple],
    span: Span,
) -> Eval<Value> {
    let (mut current, mut receiver, this) = callee(ctx, target, name, span)?;
    for (position, list) in arguments.iter().enumerate() {
        let function = match &current {
            Value::Callable(function) => function.clone(),
            other => {
                let message = if position == 0 {
                    format!("'{}' is not callable (found {})", name, other.type_name())
                } else {
                    format!("the result of '{}' is not callable (found {})", name, other.type_name())
                };
                return Err(JelError::evaluation(message).with_span(span).into());
            }
        };
        let mut values: Vec<Value> = receiver.take().into_iter().collect();
        values.extend(evaluate_tuple(list, ctx)?);
        let this = if position == 0 { this.clone() } else { None };
        current = invoke(ctx, &function, Some(name), values, this, span)?;
    }
    Ok(current)
}

/// `(callee, receiver, this)`: the receiver is prepended to the first
/// argument list, `this` is bound while a member template runs.
fn callee(
    ctx: &mut JelContext,
    target: Option<&Reference>,
    name: &str,
    span: Span,
) -> Eval<(Value, Option<Value>, Option<Value>)> {
    if let Some(target) = target {
        if let Some(member) = target.child(name) {
            return Ok((member.get(), None, Some(target.get())));
        }
    }
    let found = match ctx.scope().lookup(name) {
        Some(reference) => Some(reference.get()),
        None => ctx
            .functions()
            .lookup(name, ctx.privileges())
            .map_err(|e| e.with_span(span))?
            .map(|function| {
                let callable: Rc<dyn Callable> = function;
                Value::Callable(callable)
            }),
    };
    match found {
        Some(callee) => Ok((callee, target.map(Reference::get), None)),
        None => Err(JelError::evaluation(format!("unknown function '{}'", name))
            .with_span(span)
            .into()),
    }
}

/// Calls `callable` with already evaluated arguments.
pub(crate) fn invoke(
    ctx: &mut JelContext,
    callable: &Rc<dyn Callable>,
    name: Option<&str>,
    arguments: Vec<Value>,
    this: Option<Value>,
    span: Span,
) -> Eval<Value> {
    let name = callable.name().or(name).unwrap_or("anonymous").to_string();
    let function = as_function(callable)
        .ok_or_else(|| JelError::evaluation(format!("'{}' cannot be called here", name)).with_span(span))?;
    match function {
        Function::Builtin(builtin) => {
            if let Some(arity) = builtin.arity {
                check_arity(&name, arity, arguments.len(), span)?;
            }
            ctx.require(builtin.privileges, builtin.name).map_err(|e| e.at(span))?;
            log::trace!("calling built-in {}", builtin.name);
            (builtin.func)(ctx, arguments).map_err(|e| e.at(span).into())
        }
        Function::Template(closure) => {
            check_arity(&name, closure.params.len(), arguments.len(), span)?;
            call_template(ctx, closure, &name, arguments, this, span)
        }
    }
}

fn check_arity(name: &str, expected: usize, found: usize, span: Span) -> Result<(), JelError> {
    if expected == found {
        return Ok(());
    }
    let plural = if expected == 1 { "" } else { "s" };
    Err(JelError::evaluation(format!(
        "'{}' expects {} argument{}, got {}",
        name, expected, plural, found
    ))
    .with_span(span))
}

fn call_template(
    ctx: &mut JelContext,
    closure: &Closure,
    name: &str,
    arguments: Vec<Value>,
    this: Option<Value>,
    span: Span,
) -> Eval<Value> {
    ctx.enter_call(span)?;
    // A template defined outside every frame sees the caller's scope.
    let scope = if closure.scope.is_empty() {
        ctx.scope().clone()
    } else {
        Scope::from_captured(closure.scope.clone())
    };
    let caller = ctx.replace_scope(scope);
    let locals = closure.params.iter().map(|p| p.name.clone()).zip(arguments);
    ctx.scope_mut().push_locals(locals);
    let bound = this.is_some();
    if let Some(this) = this {
        ctx.push_parent(this);
    }

    let result = body_value(ctx, &body(closure, name));

    if bound {
        ctx.drop_parent();
    }
    ctx.replace_scope(caller);
    ctx.leave_call();

    match result {
        Err(Interrupt::Exit(EarlyExit {
            kind: ExitKind::Return,
            value,
            ..
        })) => Ok(value),
        Err(Interrupt::Exit(exit)) => Err(misplaced_exit(&exit).into()),
        other => other,
    }
}

/// The body as a member keyed by the template name, carrying the captured
/// modifiers.
fn body(closure: &Closure, name: &str) -> Member {
    let key = Key {
        name: name.to_string(),
        span: closure.body.span(),
    };
    Member::new(
        Some(Alias::Key(key)),
        closure.captured.clone(),
        closure.body.clone(),
        Format::default(),
        closure.body.sequence().clone(),
    )
}

fn body_value(ctx: &mut JelContext, body: &Member) -> Eval<Value> {
    let outputs = pipeline::run(ctx, body)?;
    match outputs.as_slice() {
        [] => Ok(Value::Null),
        [only] => only.value.apply(ctx),
        _ => Err(JelError::evaluation("a template body producing several members is not supported")
            .with_span(body.span())
            .into()),
    }
}

/// `$callee key: value` passes the value through the callee.
pub(super) fn delegate(delegate: &DelegateCall, ctx: &mut JelContext) -> Eval<Value> {
    let function = match delegate.callee.get(ctx)? {
        Value::Callable(function) => function,
        other => {
            return Err(JelError::evaluation(format!(
                "delegate '{}' is not callable (found {})",
                delegate.callee.text,
                other.type_name()
            ))
            .with_span(delegate.callee.span())
            .into());
        }
    };
    let value = delegate.value.apply(ctx)?;
    let this = ctx.parent().cloned();
    invoke(
        ctx,
        &function,
        Some(delegate.callee.root_name()),
        vec![value],
        this,
        delegate.callee.span(),
    )
}

#[cfg(test)]
mod tests {
    use crate::ast::Param;
    use crate::config::EvaluationConfig;
    use crate::context::{JelContext, RecordingSink};
    use crate::engine::tests::{eval, eval_err, eval_with};
    use crate::error::ErrorKind;
    use crate::functions::Closure;
    use crate::scope::Scope;
    use jel_json::Value;
    use jel_lexer::Span;
    use serde_json::json;
    use std::rc::Rc;

    #[test]
    fn test_template_call() {
        let value = eval("greet (name): Hello $name\nmessage: $greet(world)");
        assert_eq!(value, json!({ "message": "Hello world" }));
    }

    #[test]
    fn test_curried_template() {
        let value = eval("(a) (b) add: $a + $b\nsum: $add(1)(2)");
        assert_eq!(value, json!({ "sum": 3 }));
    }

    #[test]
    fn test_template_sees_later_siblings_and_recursion() {
        let value = eval("(n) if fact: { $n <= 1: 1, else: $n * $fact($n - 1) }\nv: $fact(5)");
        assert_eq!(value["v"], json!(120));
    }

    #[test]
    fn test_return_exits_template() {
        let value = eval(
            "(n) match sign: $n { 0: zero, default: other }\n(n) check: { if early: { return $n < 0: negative, else: null }, rest: $sign($n) }\na: $check(-1)\nb: $check(0)",
        );
        assert_eq!(value["a"], json!("negative"));
        assert_eq!(value["b"], json!({ "early": null, "rest": "zero" }));
    }

    #[test]
    fn test_uniform_call_syntax() {
        let value = eval("xs: [1, 2, 3]\nn: $xs.size()\nname: ann\nshout: $name.upper()\nlater: $this.missing.upper()");
        assert_eq!(value["n"], json!(3));
        assert_eq!(value["shout"], json!("ANN"));
        assert_eq!(value["later"], json!(null));
    }

    #[test]
    fn test_member_template_binds_this() {
        let value = eval("counter: { start: 5, (n) next: $this.start + $n }\nv: $counter.next(2)");
        assert_eq!(value["v"], json!(7));
    }

    #[test]
    fn test_arity_and_unknown_functions() {
        assert_eq!(eval_err("(a, b) f: $a\nv: $f(1)").message, "'f' expects 2 arguments, got 1");
        assert_eq!(eval_err("v: $nothing(1)").message, "unknown function 'nothing'");
        assert_eq!(eval_err("x: 5\nv: $x(1)").message, "'x' is not callable (found number)");
    }

    #[test]
    fn test_recursion_depth_is_bounded() {
        let mut ctx = JelContext::with_config(EvaluationConfig {
            max_depth: 16,
            ..EvaluationConfig::default()
        });
        let error = eval_with("(n) loop: $loop($n)\nv: $loop(1)", &mut ctx).unwrap_err();
        assert_eq!(error.kind, ErrorKind::Evaluation);
        assert!(error.message.starts_with("maximum call depth"));
    }

    #[test]
    fn test_delegate_passes_value_through() {
        let value = eval("(s) shout: $s.upper()\n$shout title: hello");
        assert_eq!(value, json!({ "title": "HELLO" }));
    }

    #[test]
    fn test_captured_log_runs_on_every_call() {
        let sink = Rc::new(RecordingSink::new());
        let mut ctx = JelContext::new().with_sink(sink.clone());
        let value = eval_with("(name) log greet: hi $name\na: $greet(x)\nb: $greet(y)", &mut ctx).unwrap();
        assert_eq!(value, json!({ "a": "hi x", "b": "hi y" }));
        assert_eq!(sink.messages(), vec!["hi x", "hi y"]);
    }

    #[test]
    fn test_yield_inside_template_is_misuse() {
        let error = eval_err("(n) f: { yield: $n }\nv: $f(1)");
        assert_eq!(error.message, "'yield' used outside of an array generator");
    }

    #[test]
    fn test_template_without_captured_frames_sees_the_caller() {
        let body = crate::parser::parse("$x + $base").unwrap().root;
        let closure = Closure {
            name: Some("f".to_string()),
            params: vec![Param {
                name: "x".to_string(),
                span: Span::default(),
            }],
            body,
            captured: Vec::new(),
            scope: Scope::new().capture(),
        };
        let mut ctx = JelContext::new();
        ctx.scope_mut().push_locals([("base".to_string(), Value::from(10))]);
        let value = super::call_template(&mut ctx, &closure, "f", vec![Value::from(1)], None, Span::default()).unwrap();
        assert_eq!(value.to_json(), json!(11));
        assert!(ctx.scope().lookup("x").is_none());
    }
}
