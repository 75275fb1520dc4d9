use std::any::Any;
use std::fmt;

/// A function stored as a value (closures and built-ins).
///
/// The value model does not know how to invoke a callable; the evaluator
/// downcasts through [`Callable::as_any`] to its own function type.
pub trait Callable: fmt::Debug {
    fn name(&self) -> Option<&str> {
        None
    }

    /// Fixed number of parameters, `None` for variadic built-ins.
    fn arity(&self) -> Option<usize>;

    fn as_any(&self) -> &dyn Any;
}
