//! Path resolution over live storage.
use super::call;
use crate::ast::{Expression, Tuple};
use crate::context::JelContext;
use crate::error::{Eval, Interrupt};
use crate::path::{Reference, Resolver};
use jel_json::{Callable, Value};
use jel_lexer::Span;
use std::rc::Rc;

impl Resolver<Reference> for JelContext {
    /// `$this`, then the scope, then built-ins as callable values.
    fn root(&mut self, name: &str, span: Span) -> Eval<Option<Reference>> {
        if name == "this" {
            return Ok(self.parent().cloned().map(Reference::Value));
        }
        if let Some(found) = self.scope().lookup(name) {
            return Ok(Some(found));
        }
        let builtin = self
            .functions()
            .lookup(name, self.privileges())
            .map_err(|e| Interrupt::from(e.with_span(span)))?;
        Ok(builtin.map(|function| {
            let callable: Rc<dyn Callable> = function;
            Reference::Value(Value::Callable(callable))
        }))
    }

    fn literal(&mut self, expression: &Expression) -> Eval<Option<Reference>> {
        expression.apply(self).map(|value| Some(Reference::Value(value)))
    }

    fn inline(&mut self, expression: &Expression) -> Eval<Value> {
        expression.apply(self)
    }

    fn call(&mut self, target: Option<&Reference>, name: &str, arguments: &[Tuple], span: Span) -> Eval<Option<Reference>> {
        call::call_path(self, target, name, arguments, span).map(|value| Some(Reference::Value(value)))
    }
}
