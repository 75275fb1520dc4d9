//! `$reference.paths` and their resolution.
//!
//! Resolution is written once against the [`Accessor`] trait and runs over
//! live document storage ([`Reference`]) during evaluation, or over a plain
//! `serde_json::Value` for read-only queries.
//!
//! Every path step maps each current result to zero or more results, so
//! `get_all` is the primitive and `get` takes the first result. Ranges
//! (`[a:b]`) fan out; a path containing one evaluates to an array.

mod reference;

pub use reference::Reference;

use crate::ast::{Expression, Tuple};
use crate::context::JelContext;
use crate::error::{Eval, Interrupt, JelError};
use crate::sequence::Sequence;
use jel_json::{Array, Value};
use jel_lexer::Span;
use std::rc::Rc;

#[derive(Debug, Clone)]
pub enum PathComponent {
    Key(String),
    /// Negative indices count from the end.
    Index(i64),
    /// Inclusive on both ends; open ends default to the array bounds.
    Range(Option<i64>, Option<i64>),
    /// `name(args)(args)…`
    Call { name: String, arguments: Vec<Tuple> },
    /// `[expr]`: a number indexes, a string selects a key.
    Inline(Rc<Expression>),
}

#[derive(Debug, Clone)]
pub struct JsonPath {
    /// The first component is the root: a [`PathComponent::Key`] looked up in
    /// scope, a [`PathComponent::Call`], or a container literal held by
    /// [`PathComponent::Inline`].
    pub components: Vec<PathComponent>,
    /// Trailing `..`: the array value is spliced into the surrounding list.
    pub expansion: bool,
    pub text: String,
    pub sequence: Rc<Sequence>,
}

/// A position inside some JSON storage that path steps can descend from.
pub trait Accessor: Clone {
    fn child(&self, key: &str) -> Option<Self>;
    fn element(&self, index: usize) -> Option<Self>;
    /// Element count when this is an array.
    fn length(&self) -> Option<usize>;
}

/// Supplies what plain storage cannot: root lookup, inline expressions and
/// calls.
pub trait Resolver<A: Accessor> {
    fn root(&mut self, name: &str, span: Span) -> Eval<Option<A>>;
    /// A root computed from an expression rather than looked up.
    fn literal(&mut self, expression: &Expression) -> Eval<Option<A>>;
    fn inline(&mut self, expression: &Expression) -> Eval<Value>;
    fn call(&mut self, target: Option<&A>, name: &str, arguments: &[Tuple], span: Span) -> Eval<Option<A>>;
}

/// Resolves `components` to every location they designate.
pub fn resolve_components<A, R>(components: &[PathComponent], span: Span, resolver: &mut R) -> Eval<Vec<A>>
where
    A: Accessor,
    R: Resolver<A>,
{
    let Some((root, rest)) = components.split_first() else {
        return Ok(Vec::new());
    };
    let mut current: Vec<A> = match root {
        PathComponent::Key(name) => resolver.root(name, span)?.into_iter().collect(),
        PathComponent::Call { name, arguments } => resolver.call(None, name, arguments, span)?.into_iter().collect(),
        PathComponent::Inline(expression) => resolver.literal(expression)?.into_iter().collect(),
        _ => return Err(JelError::syntax("a path must start with a name", span).into()),
    };
    for component in rest {
        if current.is_empty() {
            break;
        }
        let mut next = Vec::with_capacity(current.len());
        for accessor in &current {
            step(accessor, component, span, resolver, &mut next)?;
        }
        current = next;
    }
    Ok(current)
}

fn step<A, R>(accessor: &A, component: &PathComponent, span: Span, resolver: &mut R, out: &mut Vec<A>) -> Eval<()>
where
    A: Accessor,
    R: Resolver<A>,
{
    match component {
        PathComponent::Key(key) => out.extend(accessor.child(key)),
        PathComponent::Index(index) => {
            if let Some(i) = accessor.length().and_then(|len| normalize_index(*index, len)) {
                out.extend(accessor.element(i));
            }
        }
        PathComponent::Range(start, end) => {
            if let Some(len) = accessor.length() {
                out.extend(range_indices(*start, *end, len).into_iter().filter_map(|i| accessor.element(i)));
            }
        }
        PathComponent::Inline(expression) => match resolver.inline(expression)? {
            Value::Number(number) => {
                let index = number.as_i64().ok_or_else(|| {
                    JelError::evaluation(format!("index {} is not an integer", number)).with_span(expression.span())
                })?;
                return step(accessor, &PathComponent::Index(index), span, resolver, out);
            }
            Value::String(key) => out.extend(accessor.child(&key)),
            other => {
                return Err(JelError::evaluation(format!("cannot use a {} as a path component", other.type_name()))
                    .with_span(expression.span())
                    .into());
            }
        },
        PathComponent::Call { name, arguments } => out.extend(resolver.call(Some(accessor), name, arguments, span)?),
    }
    Ok(())
}

/// Maps a possibly negative index onto `0..len`.
pub fn normalize_index(index: i64, len: usize) -> Option<usize> {
    let len = len as i64;
    let index = if index < 0 { index + len } else { index };
    (0..len).contains(&index).then_some(index as usize)
}

/// Indices selected by an inclusive range. Negative bounds wrap, reversed
/// bounds are swapped, and bounds are clamped to the array.
pub fn range_indices(start: Option<i64>, end: Option<i64>, len: usize) -> Vec<usize> {
    if len == 0 {
        return Vec::new();
    }
    let last = len as i64 - 1;
    let wrap = |i: i64| if i < 0 { i + len as i64 } else { i };
    let mut from = start.map(wrap).unwrap_or(0);
    let mut to = end.map(wrap).unwrap_or(last);
    if from > to {
        std::mem::swap(&mut from, &mut to);
    }
    if to < 0 || from > last {
        return Vec::new();
    }
    (from.max(0)..=to.min(last)).map(|i| i as usize).collect()
}

impl JsonPath {
    /// Parses standalone path text such as `$a.b[0]`. The leading `$` is
    /// optional.
    pub fn parse(text: &str) -> Result<JsonPath, JelError> {
        crate::parser::parse_path(text)
    }

    pub fn span(&self) -> Span {
        self.sequence.span
    }

    /// The name looked up in scope (or called) first.
    pub fn root_name(&self) -> &str {
        match self.components.first() {
            Some(PathComponent::Key(name)) | Some(PathComponent::Call { name, .. }) => name,
            _ => "",
        }
    }

    /// Whether the path can designate more than one location.
    pub fn fans_out(&self) -> bool {
        self.components.iter().any(|c| matches!(c, PathComponent::Range(..)))
    }

    fn unresolved(&self) -> Interrupt {
        JelError::evaluation(format!("unresolved reference '{}'", self.text))
            .with_span(self.span())
            .into()
    }

    pub fn get_all(&self, ctx: &mut JelContext) -> Eval<Vec<Reference>> {
        resolve_components(&self.components, self.span(), ctx)
    }

    pub fn get_reference(&self, ctx: &mut JelContext) -> Eval<Option<Reference>> {
        Ok(self.get_all(ctx)?.into_iter().next())
    }

    /// The first designated value. A missing value is `null`, or an error
    /// under strict pathing.
    pub fn get(&self, ctx: &mut JelContext) -> Eval<Value> {
        match self.get_reference(ctx)? {
            Some(reference) => Ok(reference.get()),
            None if ctx.config().strict_pathing => Err(self.unresolved()),
            None => Ok(Value::Null),
        }
    }

    /// The value of the path as an expression: an array of every result for
    /// fanning paths, the single result otherwise.
    pub fn evaluate(&self, ctx: &mut JelContext) -> Eval<Value> {
        if self.fans_out() {
            let values = self.get_all(ctx)?.iter().map(Reference::get).collect();
            Ok(Value::Array(Array::from_values(values)))
        } else {
            self.get(ctx)
        }
    }

    /// A reference that can be assigned even if the last key does not exist
    /// yet. Every component before the last must resolve.
    pub fn writable_reference(&self, ctx: &mut JelContext) -> Eval<Reference> {
        let span = self.span();
        if self.components.len() == 1 {
            return match &self.components[0] {
                PathComponent::Key(name) => ctx.scope().lookup(name).ok_or_else(|| self.unresolved()),
                _ => Err(JelError::evaluation(format!("cannot assign to '{}'", self.text))
                    .with_span(span)
                    .into()),
            };
        }
        let (last, prefix) = self.components.split_last().ok_or_else(|| self.unresolved())?;
        let parent = resolve_components::<Reference, _>(prefix, span, ctx)?
            .into_iter()
            .next()
            .ok_or_else(|| self.unresolved())?;
        let target = match (last, parent.get()) {
            (PathComponent::Key(key), Value::Object(object)) => Some(Reference::Key(object, key.clone())),
            (PathComponent::Index(index), Value::Array(array)) => {
                normalize_index(*index, array.len()).map(|i| Reference::Index(array, i))
            }
            (PathComponent::Inline(_) | PathComponent::Range(..) | PathComponent::Call { .. }, _) => {
                return Err(JelError::evaluation(format!("cannot assign to '{}'", self.text))
                    .with_span(span)
                    .into());
            }
            _ => None,
        };
        target.ok_or_else(|| self.unresolved())
    }

    /// Every location designated in a plain JSON document. The root name
    /// selects a key of `root`; `$this` is `root` itself.
    pub fn query_all<'a>(&self, root: &'a serde_json::Value) -> Result<Vec<&'a serde_json::Value>, JelError> {
        let mut resolver = PlainResolver { root };
        resolve_components(&self.components, self.span(), &mut resolver).map_err(Interrupt::into_error)
    }

    pub fn query<'a>(&self, root: &'a serde_json::Value) -> Result<Option<&'a serde_json::Value>, JelError> {
        Ok(self.query_all(root)?.into_iter().next())
    }
}

fn needs_context(expression: &Expression) -> Interrupt {
    JelError::evaluation("inline expressions need an evaluation context")
        .with_span(expression.span())
        .into()
}

struct PlainResolver<'a> {
    root: &'a serde_json::Value,
}

impl<'a> Resolver<&'a serde_json::Value> for PlainResolver<'a> {
    fn root(&mut self, name: &str, _span: Span) -> Eval<Option<&'a serde_json::Value>> {
        if name == "this" {
            return Ok(Some(self.root));
        }
        Ok(self.root.get(name))
    }

    fn literal(&mut self, expression: &Expression) -> Eval<Option<&'a serde_json::Value>> {
        Err(needs_context(expression))
    }

    fn inline(&mut self, expression: &Expression) -> Eval<Value> {
        Err(needs_context(expression))
    }

    fn call(
        &mut self,
        _target: Option<&&'a serde_json::Value>,
        name: &str,
        _arguments: &[Tuple],
        span: Span,
    ) -> Eval<Option<&'a serde_json::Value>> {
        Err(JelError::evaluation(format!("cannot call '{}' on a plain document", name))
            .with_span(span)
            .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_index_wraps_negatives() {
        assert_eq!(normalize_index(0, 3), Some(0));
        assert_eq!(normalize_index(-1, 3), Some(2));
        assert_eq!(normalize_index(3, 3), None);
        assert_eq!(normalize_index(-4, 3), None);
    }

    #[test]
    fn test_range_indices() {
        assert_eq!(range_indices(Some(1), Some(2), 5), vec![1, 2]);
        assert_eq!(range_indices(Some(3), Some(1), 5), vec![1, 2, 3]);
        assert_eq!(range_indices(Some(-2), None, 5), vec![3, 4]);
        assert_eq!(range_indices(None, Some(10), 3), vec![0, 1, 2]);
        assert_eq!(range_indices(Some(7), Some(9), 3), Vec::<usize>::new());
        assert_eq!(range_indices(None, None, 0), Vec::<usize>::new());
    }

    #[test]
    fn test_query_plain_document() {
        let document = json!({ "a": { "b": [10, 20, 30] } });
        let path = JsonPath::parse("$a.b[-1]").unwrap();
        assert_eq!(path.query(&document).unwrap(), Some(&json!(30)));

        let range = JsonPath::parse("a.b[0:1]").unwrap();
        assert!(range.fans_out());
        assert_eq!(range.query_all(&document).unwrap(), vec![&json!(10), &json!(20)]);

        let missing = JsonPath::parse("$a.c.d").unwrap();
        assert_eq!(missing.query(&document).unwrap(), None);
    }

    #[test]
    fn test_query_rejects_calls() {
        let path = JsonPath::parse("$size($a)").unwrap();
        assert!(path.query(&json!({ "a": [] })).is_err());
    }
}
