//! JSON value model used by the JEL evaluator.
//!
//! Containers are shared cells: cloning a [`Value`] aliases the same storage,
//! so a reference resolved against a document and written through is visible
//! everywhere the container is held. [`Value::deep_copy`] breaks the aliasing.
//!
//! Every container slot is an [`Entry`] carrying [`Flags`] (private, var,
//! generated, noinline) and [`Format`] metadata (comments, blank lines).

pub mod callable;
pub mod container;
pub mod flags;
pub mod pretty;
mod serde_impl;
pub mod value;

pub use callable::Callable;
pub use container::{Array, Entry, Object};
pub use flags::{Flags, Format};
pub use pretty::{PrettyOptions, to_string_pretty};
pub use value::{Number, Value};
