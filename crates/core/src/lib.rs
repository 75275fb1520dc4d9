//! Parser and evaluator for JEL, a JSON superset with references, operators,
//! conditionals, templates and per-member modifiers.
//!
//! Source text is tokenized by `jel-lexer`, parsed into a [`Document`] and
//! evaluated against a [`JelContext`] into a [`Value`] from `jel-json`.

pub mod ast;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod functions;
pub mod operators;
mod parser;
pub mod path;
pub mod scope;
pub mod sequence;

// --- Public API ---
pub use ast::{Document, Expression, Member};
pub use config::{EvaluationConfig, Privileges};
pub use context::{FilesystemLoader, InMemoryLoader, JelContext, LogSink, RecordingSink, SourceLoader};
pub use engine::evaluate;
pub use error::{ErrorKind, JelError};
pub use functions::{Builtin, FunctionRegistry};
pub use jel_json::{PrettyOptions, Value, to_string_pretty};
pub use parser::{parse, parse_file, parse_named, parse_path};
pub use path::{JsonPath, PathComponent};

/// Parses and evaluates `source` in a fresh context built from `config`.
pub fn evaluate_str(source: &str, config: EvaluationConfig) -> Result<Value, JelError> {
    let document = parse(source)?;
    let mut ctx = JelContext::with_config(config);
    evaluate(&document, &mut ctx)
}
