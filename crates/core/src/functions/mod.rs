//! Callable values: user templates and the built-in function registry.
mod builtins;

use crate::ast::{Expression, Modifier, Param};
use crate::config::Privileges;
use crate::context::JelContext;
use crate::error::JelError;
use crate::scope::CapturedScope;
use jel_json::{Callable, Value};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// The signature of a built-in function.
pub type BuiltinFn = fn(ctx: &mut JelContext, args: Vec<Value>) -> Result<Value, JelError>;

#[derive(Clone, Copy)]
pub struct Builtin {
    pub name: &'static str,
    /// `None` for variadic functions.
    pub arity: Option<usize>,
    /// Required bits of the context's privilege mask.
    pub privileges: Privileges,
    pub func: BuiltinFn,
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builtin")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .field("privileges", &self.privileges)
            .finish()
    }
}

/// A template closed over the scope it was defined in.
#[derive(Debug, Clone)]
pub struct Closure {
    pub name: Option<String>,
    pub params: Vec<Param>,
    pub body: Rc<Expression>,
    /// Applied to the body on every call.
    pub captured: Vec<Modifier>,
    pub scope: CapturedScope,
}

#[derive(Debug)]
pub enum Function {
    Builtin(Builtin),
    Template(Closure),
}

impl Callable for Function {
    fn name(&self) -> Option<&str> {
        match self {
            Function::Builtin(builtin) => Some(builtin.name),
            Function::Template(closure) => closure.name.as_deref(),
        }
    }

    fn arity(&self) -> Option<usize> {
        match self {
            Function::Builtin(builtin) => builtin.arity,
            Function::Template(closure) => Some(closure.params.len()),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Name to built-in lookup, gated by privileges.
#[derive(Debug, Clone)]
pub struct FunctionRegistry {
    functions: HashMap<String, Rc<Function>>,
}

impl FunctionRegistry {
    /// Creates a registry without any functions.
    pub fn new() -> Self {
        Self {
            functions: HashMap::new(),
        }
    }

    pub fn register(&mut self, builtin: Builtin) {
        self.functions
            .insert(builtin.name.to_string(), Rc::new(Function::Builtin(builtin)));
    }

    /// The function called `name`, if `granted` covers its privileges.
    pub fn get(&self, name: &str, granted: Privileges) -> Option<Rc<Function>> {
        self.lookup(name, granted).ok().flatten()
    }

    /// Like [`FunctionRegistry::get`] but distinguishes an unknown name
    /// (`Ok(None)`) from a function the mask does not allow (`Err`).
    pub fn lookup(&self, name: &str, granted: Privileges) -> Result<Option<Rc<Function>>, JelError> {
        let Some(function) = self.functions.get(name) else {
            return Ok(None);
        };
        let required = match function.as_ref() {
            Function::Builtin(builtin) => builtin.privileges,
            Function::Template(_) => Privileges::NONE,
        };
        if granted.contains(required) {
            Ok(Some(function.clone()))
        } else {
            Err(JelError::evaluation(format!(
                "'{}' requires the '{}' privilege",
                name, required
            )))
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for FunctionRegistry {
    /// Creates a registry populated with all built-in functions.
    fn default() -> Self {
        let mut registry = Self::new();
        builtins::register_all(&mut registry);
        registry
    }
}

/// Callables are stored as values and unwrapped here.
pub fn as_function(callable: &Rc<dyn Callable>) -> Option<&Function> {
    callable.as_any().downcast_ref::<Function>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_gated_by_privileges() {
        let registry = FunctionRegistry::default();
        assert!(registry.get("size", Privileges::NONE).is_some());
        assert!(registry.get("env", Privileges::FILES).is_none());
        assert!(registry.get("env", Privileges::ENV).is_some());
        let error = registry.lookup("read", Privileges::NONE).unwrap_err();
        assert_eq!(error.message, "'read' requires the 'files' privilege");
        assert!(registry.lookup("nope", Privileges::ALL).unwrap().is_none());
    }

    #[test]
    fn test_builtin_downcasts_from_value() {
        let registry = FunctionRegistry::default();
        let function: Rc<dyn Callable> = registry.get("upper", Privileges::NONE).unwrap();
        let value = Value::Callable(function);
        let callable = value.as_callable().unwrap();
        assert_eq!(callable.name(), Some("upper"));
        assert_eq!(callable.arity(), Some(1));
        assert!(matches!(as_function(callable), Some(Function::Builtin(_))));
    }
}
