//! The modifier pipeline.
//!
//! A member goes in and a list of output members comes out. Modifiers run
//! in declaration order, so the leftmost modifier wraps the value as written
//! and each later one wraps the result of those before it. Stages that
//! rewrite the value wrap the value expression; stages that write (`set`, `add`, `merge`, `defaults`) produce
//! no output; `import`/`from` and destructuring replace the member.
use crate::ast::{
    Alias, ArrayGenerator, DelegateCall, Effect, EffectKind, Expression, Key, Member, Modifier, ModifierKind,
    Pattern, PatternKind, TemplateExpression,
};
use crate::context::JelContext;
use crate::error::{Eval, ExitKind, JelError};
use crate::path::JsonPath;
use crate::sequence::{Sequence, SequenceKind};
use jel_json::{Flags, Object, Value};
use std::rc::Rc;

pub(super) fn run(ctx: &mut JelContext, member: &Member) -> Eval<Vec<Member>> {
    // Output members have been through the pipeline already.
    if member.is_modified() {
        return Ok(vec![member.clone()]);
    }
    let mut members = vec![member.derive(member.alias.clone(), member.value.clone())];
    for modifier in &member.modifiers {
        let mut next = Vec::with_capacity(members.len());
        for output in members {
            next.extend(stage(ctx, modifier, output)?);
        }
        if next.is_empty() {
            log::trace!("'{}' consumed the member", modifier.kind.name());
            return Ok(next);
        }
        members = next;
    }

    let mut outputs = Vec::with_capacity(members.len());
    for output in members {
        match &output.alias {
            Some(Alias::Pattern(pattern)) => {
                let pattern = pattern.clone();
                outputs.extend(destructure(ctx, &pattern, output)?);
            }
            _ => outputs.push(output),
        }
    }
    Ok(outputs)
}

fn stage(ctx: &mut JelContext, modifier: &Modifier, mut member: Member) -> Eval<Vec<Member>> {
    log::trace!("applying '{}' at {}:{}", modifier.kind.name(), modifier.span().line, modifier.span().column);
    match &modifier.kind {
        ModifierKind::Private => member.flags.insert(Flags::PRIVATE),
        ModifierKind::Var => member.flags.insert(Flags::VAR),
        ModifierKind::NoInline => member.flags.insert(Flags::NOINLINE),
        // Shape the value at parse time only.
        ModifierKind::Match | ModifierKind::If | ModifierKind::Math => {}
        ModifierKind::Import | ModifierKind::From => {
            let imported = import(ctx, &member.value)?;
            if member.alias.is_none() {
                member.spread = true;
            }
            member.value = Expression::constant(imported, member.value.span());
        }
        ModifierKind::Set => {
            let value = member.value.apply(ctx)?;
            let target = write_target(&member)?;
            let reference = target.writable_reference(ctx)?;
            reference.set(value).map_err(|e| e.at(target.span()))?;
            return Ok(Vec::new());
        }
        ModifierKind::Add => {
            let value = member.value.apply(ctx)?;
            let target = write_target(&member)?;
            add(ctx, target, value)?;
            return Ok(Vec::new());
        }
        ModifierKind::Merge => {
            let value = member.value.apply(ctx)?;
            match &member.alias {
                Some(Alias::Path(target)) => {
                    let reference = target.writable_reference(ctx)?;
                    match reference.get() {
                        Value::Null => reference.set(value).map_err(|e| e.at(target.span()))?,
                        existing => merge_into(&existing, value).map_err(|e| e.at(target.span()))?,
                    }
                }
                _ => {
                    let parent = ctx.parent().cloned().ok_or_else(|| {
                        JelError::evaluation("'merge' without a target needs an enclosing container")
                            .with_span(modifier.span())
                    })?;
                    merge_into(&parent, value).map_err(|e| e.at(member.value.span()))?;
                }
            }
            return Ok(Vec::new());
        }
        ModifierKind::Defaults => {
            let value = member.value.apply(ctx)?;
            let target = write_target(&member)?;
            defaults(ctx, target, value)?;
            return Ok(Vec::new());
        }
        ModifierKind::Raise => wrap_effect(&mut member, modifier, EffectKind::Raise),
        ModifierKind::Yield => wrap_effect(&mut member, modifier, EffectKind::Exit(ExitKind::Yield)),
        ModifierKind::Return => wrap_effect(&mut member, modifier, EffectKind::Exit(ExitKind::Return)),
        ModifierKind::Log => {
            let discard = member.alias.is_none();
            wrap_effect(&mut member, modifier, EffectKind::Log { discard });
        }
        ModifierKind::Template { params, captured } => {
            let template = TemplateExpression {
                name: member.key().map(str::to_string),
                params: params.clone(),
                body: member.value.clone(),
                captured: captured.clone(),
                sequence: wrapped_sequence(SequenceKind::Template, modifier, &member.value),
            };
            member.value = Rc::new(Expression::Template(template));
        }
        ModifierKind::Generator { bindings, sources } => {
            let generator = ArrayGenerator {
                bindings: bindings.clone(),
                sources: sources.clone(),
                body: member.value.clone(),
                sequence: wrapped_sequence(SequenceKind::Generator, modifier, &member.value),
            };
            member.value = Rc::new(Expression::Generator(generator));
            if member.alias.is_none() {
                member.spread = true;
            }
        }
        ModifierKind::Delegate { callee } => {
            let delegate = DelegateCall {
                callee: callee.clone(),
                value: member.value.clone(),
                sequence: wrapped_sequence(SequenceKind::Delegate, modifier, &member.value),
            };
            member.value = Rc::new(Expression::Delegate(delegate));
        }
    }
    Ok(vec![member])
}

fn wrapped_sequence(kind: SequenceKind, modifier: &Modifier, value: &Rc<Expression>) -> Rc<Sequence> {
    Sequence::parent(kind, vec![modifier.sequence.clone(), value.sequence().clone()])
}

fn wrap_effect(member: &mut Member, modifier: &Modifier, kind: EffectKind) {
    let effect = Effect {
        kind,
        inner: member.value.clone(),
        sequence: wrapped_sequence(SequenceKind::Modifier, modifier, &member.value),
    };
    member.value = Rc::new(Expression::Effect(effect));
}

fn write_target(member: &Member) -> Result<&JsonPath, JelError> {
    match &member.alias {
        Some(Alias::Path(path)) => Ok(path),
        _ => Err(JelError::evaluation("a write needs a `$path` key").with_span(member.span())),
    }
}

/// Evaluated file named by `value`. The result is a private copy so writes
/// never reach the import cache.
fn import(ctx: &mut JelContext, value: &Expression) -> Eval<Value> {
    let path = value.apply_string(ctx)?;
    let imported = ctx.get(&path).map_err(|e| e.at(value.span()))?;
    Ok(imported.deep_copy(true))
}

/// Pushes onto an array target or copies keys into an object target.
fn add(ctx: &mut JelContext, target: &JsonPath, value: Value) -> Eval<()> {
    let reference = target.writable_reference(ctx)?;
    match (reference.get(), value) {
        (Value::Array(array), value) => array.push(value),
        (Value::Object(object), Value::Object(source)) => {
            for (key, entry) in source.entries() {
                object.insert_entry(key, entry);
            }
        }
        (Value::Object(_), other) => {
            return Err(JelError::evaluation(format!("cannot add a {} to an object", other.type_name()))
                .with_span(target.span())
                .into());
        }
        (existing, _) => {
            return Err(JelError::evaluation(format!(
                "'add' needs an array or object at '{}', found {}",
                target.text,
                existing.type_name()
            ))
            .with_span(target.span())
            .into());
        }
    }
    Ok(())
}

/// Fills keys missing from the target object.
fn defaults(ctx: &mut JelContext, target: &JsonPath, value: Value) -> Eval<()> {
    let Value::Object(source) = value else {
        return Err(JelError::evaluation(format!("'defaults' expects an object, found {}", value.type_name()))
            .with_span(target.span())
            .into());
    };
    let reference = target.writable_reference(ctx)?;
    match reference.get() {
        Value::Null => reference.set(Value::Object(source)).map_err(|e| e.at(target.span()))?,
        Value::Object(object) => fill_missing(&object, &source),
        existing => {
            return Err(JelError::evaluation(format!(
                "'defaults' needs an object at '{}', found {}",
                target.text,
                existing.type_name()
            ))
            .with_span(target.span())
            .into());
        }
    }
    Ok(())
}

fn fill_missing(object: &Object, source: &Object) {
    for (key, entry) in source.entries() {
        match object.get(&key) {
            None => {
                object.insert_entry(key, entry);
            }
            Some(Value::Object(nested)) => {
                if let Value::Object(defaults) = &entry.value {
                    fill_missing(&nested, defaults);
                }
            }
            Some(_) => {}
        }
    }
}

/// Deep merge: nested objects merge key by key, arrays append, anything else
/// is replaced by the source.
pub(super) fn merge_into(target: &Value, source: Value) -> Result<(), JelError> {
    match (target, source) {
        (Value::Object(object), Value::Object(source)) => {
            for (key, entry) in source.entries() {
                let existing = object.get(&key);
                let nested = matches!(
                    (&existing, &entry.value),
                    (Some(Value::Object(_)), Value::Object(_)) | (Some(Value::Array(_)), Value::Array(_))
                );
                match existing {
                    Some(existing) if nested => merge_into(&existing, entry.value)?,
                    _ => {
                        object.insert_entry(key, entry);
                    }
                }
            }
            Ok(())
        }
        (Value::Array(array), Value::Array(source)) => {
            for entry in source.entries() {
                array.push_entry(entry);
            }
            Ok(())
        }
        (_, Value::Null) => Ok(()),
        (target, source) => Err(JelError::evaluation(format!(
            "cannot merge a {} into a {}",
            source.type_name(),
            target.type_name()
        ))),
    }
}

fn destructure(ctx: &mut JelContext, pattern: &Pattern, member: Member) -> Eval<Vec<Member>> {
    let value = member.value.apply(ctx)?;
    let strict = ctx.config().strict_pathing;
    let span = pattern.sequence.span;
    let bind = |name: &str, value: Value, at| {
        member.derive(
            Some(Alias::Key(Key {
                name: name.to_string(),
                span: at,
            })),
            Expression::constant(value, at),
        )
    };
    match &pattern.kind {
        PatternKind::Object(fields) => {
            let Value::Object(object) = &value else {
                return Err(JelError::evaluation(format!(
                    "expected an object to destructure, found {}",
                    value.type_name()
                ))
                .with_span(span)
                .into());
            };
            let mut outputs = Vec::with_capacity(fields.len());
            for field in fields {
                let found = object.entry(&field.key).filter(|e| !e.flags.contains(Flags::PRIVATE));
                let value = match found {
                    Some(entry) => entry.value,
                    None if strict => {
                        return Err(JelError::evaluation(format!("key '{}' is missing", field.key))
                            .with_span(field.binding.span)
                            .into());
                    }
                    None => Value::Null,
                };
                outputs.push(bind(&field.binding.name, value, field.binding.span));
            }
            Ok(outputs)
        }
        PatternKind::Array(slots) => {
            let Value::Array(array) = &value else {
                return Err(JelError::evaluation(format!(
                    "expected an array to destructure, found {}",
                    value.type_name()
                ))
                .with_span(span)
                .into());
            };
            let mut outputs = Vec::with_capacity(slots.len());
            for (index, slot) in slots.iter().enumerate() {
                let Some(param) = slot else {
                    continue;
                };
                let value = match array.get(index) {
                    Some(value) => value,
                    None if strict => {
                        return Err(JelError::evaluation(format!("index {} is out of bounds", index))
                            .with_span(param.span)
                            .into());
                    }
                    None => Value::Null,
                };
                outputs.push(bind(&param.name, value, param.span));
            }
            Ok(outputs)
        }
    }
}
