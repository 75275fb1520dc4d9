#![allow(dead_code)]

use jel::{EvaluationConfig, JelContext, JelError};
use serde_json::Value;
use std::path::PathBuf;
use tempfile::TempDir;

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

/// Evaluates `source` with default settings, panicking with the rendered
/// error on failure.
pub fn eval(source: &str) -> Value {
    eval_config(source, EvaluationConfig::default()).unwrap_or_else(|e| panic!("{}", e.render(source)))
}

pub fn eval_config(source: &str, config: EvaluationConfig) -> Result<Value, JelError> {
    jel::evaluate_str(source, config).map(|value| value.to_json())
}

pub fn eval_strict(source: &str) -> Result<Value, JelError> {
    eval_config(source, EvaluationConfig::default().strict(true))
}

/// A directory of `.jel` files on disk, for import tests.
pub struct Project {
    dir: TempDir,
}

impl Project {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("temporary directory"),
        }
    }

    pub fn file(self, name: &str, source: &str) -> Self {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create directories");
        }
        std::fs::write(&path, source).expect("write source");
        self
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn evaluate(&self, name: &str) -> Result<Value, JelError> {
        self.evaluate_in(&mut JelContext::new(), name)
    }

    pub fn evaluate_in(&self, ctx: &mut JelContext, name: &str) -> Result<Value, JelError> {
        ctx.evaluate_file(self.path(name)).map(|value| value.to_json())
    }
}
