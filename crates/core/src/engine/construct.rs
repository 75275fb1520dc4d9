//! Object and array construction.
use super::pipeline;
use crate::ast::{Alias, ArrayExpression, ObjectExpression};
use crate::context::JelContext;
use crate::error::{Eval, JelError};
use jel_json::{Array, Entry, Flags, Object, Value};
use jel_lexer::Span;

/// Members are inserted as they are produced, so later members (and
/// templates defined here) see earlier ones by name.
pub(super) fn object(expression: &ObjectExpression, ctx: &mut JelContext) -> Eval<Value> {
    let object = Object::new();
    ctx.push_parent(Value::Object(object.clone()));
    ctx.scope_mut().push_container(object.clone());
    let result = fill_object(expression, &object, ctx);
    ctx.scope_mut().pop();
    ctx.drop_parent();
    result?;
    Ok(Value::Object(object))
}

fn fill_object(expression: &ObjectExpression, object: &Object, ctx: &mut JelContext) -> Eval<()> {
    for member in &expression.members {
        for output in pipeline::run(ctx, member)? {
            let value = output.value.apply(ctx)?;
            if output.spread {
                splice_into_object(object, value, output.flags, output.span())?;
                continue;
            }
            match &output.alias {
                Some(Alias::Key(key)) => {
                    let entry = Entry {
                        value,
                        flags: output.flags,
                        format: output.format.clone(),
                    };
                    object.insert_entry(key.name.clone(), entry);
                }
                // Effects such as `log:` or `raise:` leave nothing behind.
                None => {}
                Some(other) => {
                    return Err(JelError::evaluation(format!(
                        "{} cannot be used as an object key",
                        other.kind().describe()
                    ))
                    .with_span(other.span())
                    .into());
                }
            }
        }
    }
    Ok(())
}

/// Spliced entries keep their own flags and gain those of the splicing member.
fn splice_into_object(object: &Object, value: Value, flags: Flags, span: Span) -> Result<(), JelError> {
    match value {
        Value::Object(source) => {
            for (key, mut entry) in source.entries() {
                entry.flags.insert(flags);
                object.insert_entry(key, entry);
            }
            Ok(())
        }
        Value::Null => Ok(()),
        other => Err(JelError::evaluation(format!("cannot splice a {} into an object", other.type_name())).with_span(span)),
    }
}

pub(super) fn array(expression: &ArrayExpression, ctx: &mut JelContext) -> Eval<Value> {
    let array = Array::new();
    ctx.push_parent(Value::Array(array.clone()));
    let result = fill_array(expression, &array, ctx);
    ctx.drop_parent();
    result?;
    Ok(Value::Array(array))
}

/// Elements whose modifiers left a null behind (a discarded `log`, an `if`
/// without a matching branch) are dropped; a literal `null` is kept.
fn fill_array(expression: &ArrayExpression, array: &Array, ctx: &mut JelContext) -> Eval<()> {
    for member in &expression.members {
        let modified = !member.modifiers.is_empty();
        for output in pipeline::run(ctx, member)? {
            let value = output.value.apply(ctx)?;
            if output.spread || output.value.is_expansion() {
                match value {
                    Value::Array(source) => {
                        for mut entry in source.entries() {
                            entry.flags.insert(output.flags);
                            array.push_entry(entry);
                        }
                    }
                    Value::Null => {}
                    other => array.push(other),
                }
                continue;
            }
            if let Some(alias) = &output.alias {
                return Err(JelError::evaluation("array elements cannot have keys")
                    .with_span(alias.span())
                    .into());
            }
            if modified && value.is_null() {
                continue;
            }
            array.push_entry(Entry {
                value,
                flags: output.flags,
                format: output.format.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::context::{InMemoryLoader, JelContext};
    use crate::engine::tests::{eval, eval_with};
    use jel_json::Value;
    use serde_json::json;
    use std::rc::Rc;

    #[test]
    fn test_nulls_from_modifiers_are_dropped_in_arrays() {
        let value = eval("n: 1\nxs: [null, if: { $n > 5: big }, log: note, 2]");
        assert_eq!(value["xs"], json!([null, 2]));
    }

    #[test]
    fn test_expansion_splices_into_arrays() {
        let value = eval("a: [1, 2]\nb: [0, $a.., 3]\nc: [$a]");
        assert_eq!(value["b"], json!([0, 1, 2, 3]));
        assert_eq!(value["c"], json!([[1, 2]]));
    }

    #[test]
    fn test_later_members_override_earlier() {
        assert_eq!(eval("a: 1\na: 2"), json!({ "a": 2 }));
    }

    #[test]
    fn test_import_without_key_into_array_splices() {
        let loader = InMemoryLoader::new().with_file("list.jel", "[2, 3]");
        let mut ctx = JelContext::new().with_loader(Rc::new(loader));
        let value = eval_with("[1, import: \"list.jel\", 4]", &mut ctx).unwrap();
        assert_eq!(value, json!([1, 2, 3, 4]));
    }

    #[test]
    fn test_splicing_a_scalar_into_an_object_fails() {
        let loader = InMemoryLoader::new().with_file("n.jel", "5");
        let mut ctx = JelContext::new().with_loader(Rc::new(loader));
        let error = eval_with("import: \"n.jel\"", &mut ctx).unwrap_err();
        assert_eq!(error.message, "cannot splice a number into an object");
    }

    #[test]
    fn test_flags_of_a_keyless_import_reach_spliced_entries() {
        let loader = InMemoryLoader::new()
            .with_file("lib.jel", "{ secret: 1, other: 2 }")
            .with_file("list.jel", "[2, 3]");
        let mut ctx = JelContext::new().with_loader(Rc::new(loader));
        let value = eval_with("private import: \"lib.jel\"\nsum: $secret + $other", &mut ctx).unwrap();
        assert_eq!(value, json!({ "sum": 3 }));
        let value = eval_with("var import: \"lib.jel\"", &mut ctx).unwrap();
        assert_eq!(value, json!({}));
        let value = eval_with("xs: [0, private import: \"list.jel\"]", &mut ctx).unwrap();
        assert_eq!(value, json!({ "xs": [0] }));
    }

    #[test]
    fn test_comments_and_blank_lines_are_kept_on_entries() {
        let document = crate::parser::parse("// first\na: 1\n\n\nb: 2").unwrap();
        let mut ctx = JelContext::new();
        let Value::Object(object) = crate::engine::evaluate(&document, &mut ctx).unwrap() else {
            panic!("expected object");
        };
        assert_eq!(object.entry("a").unwrap().format.comments, vec!["// first".to_string()]);
        assert_eq!(object.entry("b").unwrap().format.blank_lines, 2);
    }

    #[test]
    fn test_object_scope_is_dropped_after_construction() {
        let value = eval("inner: { x: 1 }\nouter: $x\nreached: $inner.x");
        assert_eq!(value["outer"], json!(null));
        assert_eq!(value["reached"], json!(1));
    }
}
