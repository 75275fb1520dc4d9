//! Memoized import results and cycle tracking.
use crate::error::JelError;
use jel_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Outcome of a finished load.
#[derive(Debug, Clone)]
pub enum Imported {
    Loaded(Value),
    /// The load failed; later imports of the same file must not retry it.
    Erred(JelError),
}

#[derive(Debug, Default)]
pub struct ImportCache {
    finished: HashMap<PathBuf, Imported>,
    /// Files currently being loaded, outermost first.
    loading: Vec<PathBuf>,
}

impl ImportCache {
    pub fn lookup(&self, path: &Path) -> Option<&Imported> {
        self.finished.get(path)
    }

    pub fn is_loading(&self, path: &Path) -> bool {
        self.loading.iter().any(|p| p == path)
    }

    pub fn begin(&mut self, path: PathBuf) {
        self.loading.push(path);
    }

    pub fn finish(&mut self, path: PathBuf, result: &Result<Value, JelError>) {
        self.loading.retain(|p| p != &path);
        let outcome = match result {
            Ok(value) => Imported::Loaded(value.clone()),
            Err(error) => Imported::Erred(error.clone()),
        };
        self.finished.insert(path, outcome);
    }

    pub fn len(&self) -> usize {
        self.finished.len()
    }

    pub fn is_empty(&self) -> bool {
        self.finished.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finish_clears_loading_and_memoizes() {
        let mut cache = ImportCache::default();
        let path = PathBuf::from("a.jel");
        cache.begin(path.clone());
        assert!(cache.is_loading(&path));
        cache.finish(path.clone(), &Ok(Value::from(1)));
        assert!(!cache.is_loading(&path));
        assert!(matches!(cache.lookup(&path), Some(Imported::Loaded(v)) if *v == Value::from(1)));
    }

    #[test]
    fn test_failures_are_remembered() {
        let mut cache = ImportCache::default();
        let path = PathBuf::from("bad.jel");
        cache.begin(path.clone());
        cache.finish(path.clone(), &Err(JelError::evaluation("boom")));
        assert!(matches!(cache.lookup(&path), Some(Imported::Erred(e)) if e.message == "boom"));
        assert_eq!(cache.len(), 1);
    }
}
