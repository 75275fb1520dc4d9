//! Lexical name resolution.
//!
//! A scope is a persistent linked stack of frames. Pushing never mutates an
//! existing frame, so a [`CapturedScope`] taken by a template keeps seeing
//! exactly the frames that were visible at definition time. Container frames
//! hold the live object under construction, so members added later are still
//! found (templates can refer to themselves and to later siblings).
use crate::path::Reference;
use indexmap::IndexMap;
use jel_json::{Object, Value};
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug)]
enum Bindings {
    Container(Object),
    Locals(RefCell<IndexMap<String, Value>>),
}

#[derive(Debug)]
pub struct Frame {
    bindings: Bindings,
    parent: Option<Rc<Frame>>,
}

impl Frame {
    pub(crate) fn local(&self, name: &str) -> Option<Value> {
        match &self.bindings {
            Bindings::Locals(locals) => locals.borrow().get(name).cloned(),
            Bindings::Container(object) => object.get(name),
        }
    }

    pub(crate) fn set_local(&self, name: &str, value: Value) {
        match &self.bindings {
            Bindings::Locals(locals) => {
                locals.borrow_mut().insert(name.to_string(), value);
            }
            Bindings::Container(object) => {
                object.insert(name.to_string(), value);
            }
        }
    }

    fn find(self: &Rc<Frame>, name: &str) -> Option<Reference> {
        match &self.bindings {
            Bindings::Container(object) if object.contains_key(name) => {
                Some(Reference::Key(object.clone(), name.to_string()))
            }
            Bindings::Locals(locals) if locals.borrow().contains_key(name) => {
                Some(Reference::Local(self.clone(), name.to_string()))
            }
            _ => None,
        }
    }
}

/// Frames visible to a template at the point it was defined.
#[derive(Debug, Clone)]
pub struct CapturedScope(Option<Rc<Frame>>);

impl CapturedScope {
    /// Nothing was in scope when the template was defined.
    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Scope {
    top: Option<Rc<Frame>>,
    depth: usize,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_captured(captured: CapturedScope) -> Self {
        let depth = std::iter::successors(captured.0.as_ref(), |f| f.parent.as_ref()).count();
        Self {
            top: captured.0,
            depth,
        }
    }

    pub fn capture(&self) -> CapturedScope {
        CapturedScope(self.top.clone())
    }

    /// Makes the keys of `object` visible by name.
    pub fn push_container(&mut self, object: Object) {
        self.push(Bindings::Container(object));
    }

    pub fn push_locals(&mut self, bindings: impl IntoIterator<Item = (String, Value)>) {
        self.push(Bindings::Locals(RefCell::new(bindings.into_iter().collect())));
    }

    fn push(&mut self, bindings: Bindings) {
        let parent = self.top.take();
        self.top = Some(Rc::new(Frame { bindings, parent }));
        self.depth += 1;
        log::trace!("scope push (depth {})", self.depth);
    }

    /// Removes the innermost frame. Returns false when the scope is empty.
    pub fn pop(&mut self) -> bool {
        match self.top.take() {
            Some(frame) => {
                self.top = frame.parent.clone();
                self.depth -= 1;
                log::trace!("scope pop (depth {})", self.depth);
                true
            }
            None => false,
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Innermost binding of `name`.
    pub fn lookup(&self, name: &str) -> Option<Reference> {
        std::iter::successors(self.top.as_ref(), |f| f.parent.as_ref()).find_map(|f| f.find(name))
    }

    /// Binds `name` in the innermost frame, pushing a locals frame when the
    /// scope is empty.
    pub fn define(&mut self, name: &str, value: Value) {
        if self.top.is_none() {
            self.push_locals([]);
        }
        if let Some(frame) = &self.top {
            frame.set_local(name, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inner_frames_shadow_outer() {
        let mut scope = Scope::new();
        scope.push_locals([("x".to_string(), Value::from(1))]);
        scope.push_locals([("x".to_string(), Value::from(2))]);
        assert_eq!(scope.lookup("x").unwrap().get(), Value::from(2));
        assert!(scope.pop());
        assert_eq!(scope.lookup("x").unwrap().get(), Value::from(1));
        assert!(scope.pop());
        assert!(!scope.pop());
        assert!(scope.lookup("x").is_none());
    }

    #[test]
    fn test_capture_is_unaffected_by_later_pushes() {
        let mut scope = Scope::new();
        scope.push_locals([("a".to_string(), Value::from(1))]);
        let captured = scope.capture();
        scope.push_locals([("b".to_string(), Value::from(2))]);

        let restored = Scope::from_captured(captured);
        assert_eq!(restored.depth(), 1);
        assert!(restored.lookup("a").is_some());
        assert!(restored.lookup("b").is_none());
    }

    #[test]
    fn test_container_frames_see_later_keys() {
        let object = Object::new();
        let mut scope = Scope::new();
        scope.push_container(object.clone());
        let captured = scope.capture();
        object.insert("late".to_string(), Value::from("here"));
        let restored = Scope::from_captured(captured);
        assert_eq!(restored.lookup("late").unwrap().get(), Value::from("here"));
    }

    #[test]
    fn test_writes_through_local_reference() {
        let mut scope = Scope::new();
        scope.define("n", Value::from(1));
        let reference = scope.lookup("n").unwrap();
        reference.set(Value::from(5)).unwrap();
        assert_eq!(scope.lookup("n").unwrap().get(), Value::from(5));
    }
}
