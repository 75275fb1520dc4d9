mod common;

use common::{eval, eval_strict};
use serde_json::json;

#[test]
fn test_plain_json_document_is_unchanged() {
    let source = r#"{
        "name": "widget",
        "sizes": [1, 2.5, -3],
        "nested": { "ok": true, "none": null, "empty": {}, "list": [] }
    }"#;
    let expected: serde_json::Value = serde_json::from_str(source).unwrap();
    assert_eq!(eval(source), expected);
}

#[test]
fn test_order_totals() {
    let source = r#"
// line items
order: {
  items: [
    { name: apple, price: 2, qty: 3 }
    { name: pear, price: 3, qty: 1 }
  ]
}
[item] ($order.items..) totals: $item.price * $item.qty
count: $order.items.size()
first: $order.items[0].name
last: $order.items[-1].name
"#;
    let value = eval(source);
    assert_eq!(value["totals"], json!([6, 3]));
    assert_eq!(value["count"], json!(2));
    assert_eq!(value["first"], json!("apple"));
    assert_eq!(value["last"], json!("pear"));
}

#[test]
fn test_operator_properties() {
    let value = eval(
        "sum: 1 + 2 * 3\nmath flat: 1 + 2 * 3\ndiff: {a: 1, b: [2, 3, 4]} - {a: null, b: [2, 4]}\nxs: [1, 2, 3, 4, 5]\nneg: $xs[-2]",
    );
    assert_eq!(value["sum"], json!(7));
    assert_eq!(value["flat"], json!(9));
    assert_eq!(value["diff"], json!({ "b": [3] }));
    assert_eq!(value["neg"], json!(4));
}

#[test]
fn test_range_fan_out_then_key() {
    let value = eval("rows: [{ id: 1 }, { id: 2 }, { id: 3 }]\nids: $rows[1:2].id\nback: $rows[2:0].id");
    assert_eq!(value["ids"], json!([2, 3]));
    assert_eq!(value["back"], json!([1, 2, 3]));
}

#[test]
fn test_templates_grade_marks() {
    let source = "(n) if grade: {\n  $n >= 90: A\n  $n >= 80: B\n  else: C\n}\nmarks: [95, 85, 20]\n[m] ($marks..) grades: $grade($m)\n(a) (b) add: $a + $b\nseven: $add(3)(4)";
    let value = eval(source);
    assert_eq!(value["grades"], json!(["A", "B", "C"]));
    assert_eq!(value["seven"], json!(7));
    assert_eq!(value["grade"], json!(null));
}

#[test]
fn test_template_arity_is_exact() {
    let error = eval_strict("(a, b) pair: [$a, $b]\nv: $pair(1)").unwrap_err();
    assert_eq!(error.message, "'pair' expects 2 arguments, got 1");
}

#[test]
fn test_private_and_var_visibility() {
    let value = eval("inner: { private p: 1, var v: 2, sum: $p + $v }\nhidden: $inner.p\nshared: $inner.v");
    assert_eq!(value["inner"], json!({ "sum": 3 }));
    assert_eq!(value["hidden"], json!(null));
    assert_eq!(value["shared"], json!(2));
}

#[test]
fn test_strict_mode_reports_missing_references() {
    assert_eq!(eval("v: $nothing.here")["v"], json!(null));
    let error = eval_strict("v: $nothing.here").unwrap_err();
    assert_eq!(error.message, "unresolved reference '$nothing.here'");
}

#[test]
fn test_conditional_without_match_is_null_unless_strict() {
    let source = "n: 1\nif big: { $n > 10: yes }\nmatch word: $n { 2: two }";
    let value = eval(source);
    assert_eq!(value["big"], json!(null));
    assert_eq!(value["word"], json!(null));
    assert!(eval_strict(source).is_err());
}

#[test]
fn test_writes_reach_referenced_containers() {
    let value = eval(
        "config: { debug: false, tags: [a] }\nset $config.debug: true\nadd $config.tags: b\ndefaults $config: { level: 1, debug: false }",
    );
    assert_eq!(value["config"], json!({ "debug": true, "tags": ["a", "b"], "level": 1 }));
}

#[test]
fn test_interpolated_strings_keep_spacing() {
    let value = eval("name: ann\ncity: oslo\ngreeting: hello $name from $city");
    assert_eq!(value["greeting"], json!("hello ann from oslo"));
}

#[test]
fn test_builtins_are_gated_by_privileges() {
    let error = common::eval_config("home: $env(HOME)", jel::EvaluationConfig::default()).unwrap_err();
    assert_eq!(error.message, "'env' requires the 'env' privilege");
    assert_eq!(eval("r: $range(1, 3)\nn: $r.size()")["n"], json!(3));
}
