//! Mutable state threaded through an evaluation.
//!
//! [`JelContext`] owns the scope stack, the stack of parent containers under
//! construction, the import cache, the privilege mask, the built-in registry
//! and the log sink. One context can evaluate several documents; imports are
//! cached across them.

mod imports;
mod loader;
mod sink;

pub use imports::{ImportCache, Imported};
pub use loader::{FilesystemLoader, InMemoryLoader, LoadError, SourceLoader};
pub use sink::{FacadeSink, LogSink, RecordingSink};

use crate::config::{EvaluationConfig, Privileges};
use crate::error::JelError;
use crate::functions::FunctionRegistry;
use crate::scope::Scope;
use jel_json::Value;
use jel_lexer::Span;
use log::Level;
use std::path::{Path, PathBuf};
use std::rc::Rc;

#[derive(Debug)]
pub struct JelContext {
    scope: Scope,
    parents: Vec<Value>,
    imports: ImportCache,
    files: Vec<PathBuf>,
    config: EvaluationConfig,
    functions: Rc<FunctionRegistry>,
    sink: Rc<dyn LogSink>,
    loader: Rc<dyn SourceLoader>,
    call_depth: usize,
}

impl Default for JelContext {
    fn default() -> Self {
        Self::new()
    }
}

impl JelContext {
    pub fn new() -> Self {
        Self::with_config(EvaluationConfig::default())
    }

    pub fn with_config(config: EvaluationConfig) -> Self {
        Self {
            scope: Scope::new(),
            parents: Vec::new(),
            imports: ImportCache::default(),
            files: Vec::new(),
            config,
            functions: Rc::new(FunctionRegistry::default()),
            sink: Rc::new(FacadeSink),
            loader: Rc::new(FilesystemLoader),
            call_depth: 0,
        }
    }

    pub fn with_loader(mut self, loader: Rc<dyn SourceLoader>) -> Self {
        self.loader = loader;
        self
    }

    pub fn with_sink(mut self, sink: Rc<dyn LogSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_functions(mut self, functions: FunctionRegistry) -> Self {
        self.functions = Rc::new(functions);
        self
    }

    pub fn config(&self) -> &EvaluationConfig {
        &self.config
    }

    pub fn privileges(&self) -> Privileges {
        self.config.privileges
    }

    pub fn functions(&self) -> &FunctionRegistry {
        &self.functions
    }

    pub fn loader(&self) -> &dyn SourceLoader {
        self.loader.as_ref()
    }

    pub fn imports(&self) -> &ImportCache {
        &self.imports
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn scope_mut(&mut self) -> &mut Scope {
        &mut self.scope
    }

    /// Pushes an empty frame for host-defined variables.
    pub fn push_scope(&mut self) {
        self.scope.push_locals([]);
    }

    pub fn drop_scope(&mut self) -> bool {
        self.scope.pop()
    }

    /// Binds a variable in the innermost frame.
    pub fn define(&mut self, name: &str, value: Value) {
        self.scope.define(name, value);
    }

    pub(crate) fn replace_scope(&mut self, scope: Scope) -> Scope {
        std::mem::replace(&mut self.scope, scope)
    }

    /// Marks `value` as the container currently being built (`$this`).
    pub fn push_parent(&mut self, value: Value) {
        self.parents.push(value);
    }

    pub fn drop_parent(&mut self) -> Option<Value> {
        self.parents.pop()
    }

    pub fn parent(&self) -> Option<&Value> {
        self.parents.last()
    }

    pub fn current_file(&self) -> Option<&Path> {
        self.files.last().map(PathBuf::as_path)
    }

    pub fn log(&self, level: Level, message: &str) {
        self.sink.log(level, message);
    }

    /// Fails unless every bit of `privileges` is granted.
    pub fn require(&self, privileges: Privileges, what: &str) -> Result<(), JelError> {
        if self.config.privileges.contains(privileges) {
            Ok(())
        } else {
            Err(JelError::evaluation(format!(
                "'{}' requires the '{}' privilege",
                what, privileges
            )))
        }
    }

    pub(crate) fn enter_call(&mut self, span: Span) -> Result<(), JelError> {
        if self.call_depth >= self.config.max_depth {
            return Err(JelError::evaluation(format!(
                "maximum call depth of {} exceeded",
                self.config.max_depth
            ))
            .with_span(span));
        }
        self.call_depth += 1;
        Ok(())
    }

    pub(crate) fn leave_call(&mut self) {
        self.call_depth = self.call_depth.saturating_sub(1);
    }

    /// The evaluated value of the file at `path`, relative to the file being
    /// evaluated. Each file is loaded at most once per context; a file whose
    /// load failed is reported as not loaded without a second attempt.
    pub fn get(&mut self, path: &str) -> Result<Value, JelError> {
        self.require(Privileges::FILES, "import")?;
        let base = self.current_file().and_then(Path::parent).map(Path::to_path_buf);
        let resolved = self
            .loader
            .resolve(base.as_deref(), path)
            .map_err(|e| JelError::import(format!("cannot import '{}': {}", path, e)))?;

        match self.imports.lookup(&resolved) {
            Some(Imported::Loaded(value)) => {
                log::trace!("import cache hit for {}", resolved.display());
                return Ok(value.clone());
            }
            Some(Imported::Erred(cause)) => {
                return Err(
                    JelError::import(format!("dependency '{}' not loaded", path)).with_cause(cause.clone())
                );
            }
            None => {}
        }
        if self.imports.is_loading(&resolved) {
            let requester = self
                .current_file()
                .map(|f| f.display().to_string())
                .unwrap_or_else(|| "<input>".to_string());
            return Err(JelError::import(format!(
                "unhandled cyclical reference: '{}' is imported by '{}' while it is still loading",
                resolved.display(),
                requester
            )));
        }
        self.load(resolved)
            .map_err(|cause| JelError::import(format!("failed to import '{}'", path)).with_cause(cause))
    }

    /// Loads and evaluates a top-level file. The file takes part in cycle
    /// detection like any import.
    pub fn evaluate_file(&mut self, path: impl AsRef<Path>) -> Result<Value, JelError> {
        let requested = path.as_ref().to_string_lossy().into_owned();
        let resolved = self
            .loader
            .resolve(None, &requested)
            .map_err(|e| JelError::import(e.to_string()))?;
        if let Some(Imported::Loaded(value)) = self.imports.lookup(&resolved) {
            return Ok(value.clone());
        }
        self.load(resolved)
    }

    fn load(&mut self, path: PathBuf) -> Result<Value, JelError> {
        log::debug!("loading {} through {}", path.display(), self.loader.name());
        self.imports.begin(path.clone());
        let result = self.load_uncached(&path);
        self.imports.finish(path, &result);
        result
    }

    fn load_uncached(&mut self, path: &Path) -> Result<Value, JelError> {
        let source = self
            .loader
            .load(path)
            .map_err(|e| JelError::import(e.to_string()).in_file(Some(path)))?;
        let document = crate::parser::parse_named(&source, Some(path))?;

        let scope = self.replace_scope(Scope::new());
        let parents = std::mem::take(&mut self.parents);
        self.files.push(path.to_path_buf());
        let result = crate::engine::evaluate(&document, self);
        self.files.pop();
        self.parents = parents;
        self.scope = scope;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(loader: InMemoryLoader) -> (JelContext, Rc<InMemoryLoader>) {
        let loader = Rc::new(loader);
        let context = JelContext::new().with_loader(loader.clone());
        (context, loader)
    }

    #[test]
    fn test_get_memoizes_loaded_files() {
        let (mut ctx, loader) = context(InMemoryLoader::new().with_file("a.jel", "{ n: 1 }"));
        let first = ctx.get("a.jel").unwrap();
        let second = ctx.get("./a.jel").unwrap();
        assert_eq!(first, second);
        assert_eq!(loader.reads(), 1);
    }

    #[test]
    fn test_failed_import_is_not_retried() {
        let (mut ctx, loader) = context(InMemoryLoader::new().with_file("bad.jel", "{ n: }"));
        let first = ctx.get("bad.jel").unwrap_err();
        assert_eq!(first.message, "failed to import 'bad.jel'");
        let second = ctx.get("bad.jel").unwrap_err();
        assert_eq!(second.message, "dependency 'bad.jel' not loaded");
        assert!(second.cause.as_ref().is_some_and(|c| c.is_syntax()));
        assert_eq!(loader.reads(), 1);
    }

    #[test]
    fn test_cycle_names_both_files() {
        let loader = InMemoryLoader::new()
            .with_file("a.jel", "{ import b: \"b.jel\" }")
            .with_file("b.jel", "{ import a: \"a.jel\" }");
        let (mut ctx, _) = context(loader);
        let error = ctx.evaluate_file("a.jel").unwrap_err();
        let cycle = error
            .chain()
            .find(|e| e.message.contains("cyclical"))
            .expect("cycle error in chain");
        assert!(cycle.message.contains("'a.jel'"));
        assert!(cycle.message.contains("'b.jel'"));
    }

    #[test]
    fn test_imports_require_file_privilege() {
        let loader = Rc::new(InMemoryLoader::new().with_file("a.jel", "1"));
        let mut ctx = JelContext::with_config(EvaluationConfig::default().with_privileges(Privileges::NONE))
            .with_loader(loader.clone());
        let error = ctx.get("a.jel").unwrap_err();
        assert_eq!(error.message, "'import' requires the 'files' privilege");
        assert_eq!(loader.reads(), 0);
    }

    #[test]
    fn test_call_depth_is_bounded() {
        let mut ctx = JelContext::with_config(EvaluationConfig {
            max_depth: 2,
            ..EvaluationConfig::default()
        });
        assert!(ctx.enter_call(Span::default()).is_ok());
        assert!(ctx.enter_call(Span::default()).is_ok());
        assert!(ctx.enter_call(Span::default()).is_err());
        ctx.leave_call();
        assert!(ctx.enter_call(Span::default()).is_ok());
    }
}
