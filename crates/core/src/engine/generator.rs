//! Array generators: `[value, index] (sources…) key: body`.
use super::evaluate_tuple;
use crate::ast::ArrayGenerator;
use crate::context::JelContext;
use crate::error::{EarlyExit, Eval, ExitKind, Interrupt};
use jel_json::{Array, Value};

/// One body evaluation per source element, each in a fresh frame binding the
/// element and its index. `yield` ends an iteration with its value; null
/// results are dropped.
pub(super) fn generate(generator: &ArrayGenerator, ctx: &mut JelContext) -> Eval<Value> {
    let items = evaluate_tuple(&generator.sources, ctx)?;
    let output = Array::new();
    for (index, item) in items.into_iter().enumerate() {
        let mut locals = vec![(generator.bindings.value.name.clone(), item)];
        if let Some(binding) = &generator.bindings.index {
            locals.push((binding.name.clone(), Value::from(index)));
        }
        ctx.scope_mut().push_locals(locals);
        let result = generator.body.apply(ctx);
        ctx.scope_mut().pop();

        let value = match result {
            Ok(value) => value,
            Err(Interrupt::Exit(EarlyExit {
                kind: ExitKind::Yield,
                value,
                ..
            })) => value,
            Err(interrupt) => return Err(interrupt),
        };
        if !value.is_null() {
            output.push(value);
        }
    }
    Ok(Value::Array(output))
}

#[cfg(test)]
mod tests {
    use crate::engine::tests::{eval, eval_err};
    use serde_json::json;

    #[test]
    fn test_generator_maps_sources() {
        let value = eval("xs: [1, 2, 3]\n[v, i] ($xs..) doubled: $v * 2 + $i");
        assert_eq!(value["doubled"], json!([2, 5, 8]));
    }

    #[test]
    fn test_sources_mix_single_values_and_expansions() {
        let value = eval("xs: [2, 3]\n[v] (1, $xs.., 4) all: $v");
        assert_eq!(value["all"], json!([1, 2, 3, 4]));
    }

    #[test]
    fn test_null_results_are_filtered() {
        let value = eval("xs: [1, 2, 3, 4]\n[v] ($xs..) if even: { $v % 2 == 0: $v, else: null }");
        assert_eq!(value["even"], json!([2, 4]));
    }

    #[test]
    fn test_yield_ends_an_iteration() {
        let value = eval("xs: [1, 5, 10]\n[v] ($xs..) sizes: { if label: { yield $v > 4: big, else: small }, never: 1 }");
        assert_eq!(value["sizes"], json!([{ "label": "small", "never": 1 }, "big", "big"]));
    }

    #[test]
    fn test_generator_element_without_key_splices() {
        let value = eval("xs: [1, 2]\nys: [0, [v] ($xs..): $v * 10, 99]");
        assert_eq!(value["ys"], json!([0, 10, 20, 99]));
    }

    #[test]
    fn test_expanding_a_non_array_fails() {
        let error = eval_err("n: 5\n[v] ($n..) xs: $v");
        assert_eq!(error.message, "cannot expand a number, expected an array");
    }
}
