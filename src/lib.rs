//! JEL: a JSON superset with references, operators, conditionals, templates
//! and per-member modifiers.
//!
//! This crate bundles the workspace crates behind one dependency and hosts
//! the `jel` command line tool.
//!
//! ```no_run
//! use jel::{EvaluationConfig, evaluate_str};
//!
//! let value = evaluate_str("a: 2\nb: $a * 21", EvaluationConfig::default()).unwrap();
//! assert_eq!(value.to_json()["b"], 42);
//! ```

pub mod cli;

pub use jel_core::*;
pub use jel_json as json;
pub use jel_lexer as lexer;
