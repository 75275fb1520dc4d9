//! Source loading for imports.
//!
//! The evaluator never touches the filesystem directly: it asks a
//! [`SourceLoader`] to resolve an import path against the importing file and
//! to read the resolved file.
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt::Debug;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum LoadError {
    #[error("file not found: {0}")]
    NotFound(String),

    #[error("failed to read '{path}': {message}")]
    ReadFailed { path: String, message: String },
}

pub trait SourceLoader: Debug {
    /// Resolves `path` relative to the directory of the importing file, or
    /// to the working directory for top-level loads.
    fn resolve(&self, base: Option<&Path>, path: &str) -> Result<PathBuf, LoadError>;

    fn load(&self, path: &Path) -> Result<String, LoadError>;

    /// A short name for logging.
    fn name(&self) -> &'static str;
}

/// Loads sources from the local filesystem. Resolved paths are canonical so
/// the same file imported through different relative paths is cached once.
#[derive(Debug, Default, Clone, Copy)]
pub struct FilesystemLoader;

impl SourceLoader for FilesystemLoader {
    fn resolve(&self, base: Option<&Path>, path: &str) -> Result<PathBuf, LoadError> {
        let joined = match base {
            Some(base) => base.join(path),
            None => PathBuf::from(path),
        };
        joined.canonicalize().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                LoadError::NotFound(joined.display().to_string())
            } else {
                LoadError::ReadFailed {
                    path: joined.display().to_string(),
                    message: e.to_string(),
                }
            }
        })
    }

    fn load(&self, path: &Path) -> Result<String, LoadError> {
        std::fs::read_to_string(path).map_err(|e| LoadError::ReadFailed {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    fn name(&self) -> &'static str {
        "FilesystemLoader"
    }
}

/// Sources held in memory, keyed by normalized path. Counts reads so callers
/// can observe caching.
#[derive(Debug, Default)]
pub struct InMemoryLoader {
    files: RefCell<HashMap<PathBuf, String>>,
    reads: Cell<usize>,
}

impl InMemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, path: impl AsRef<Path>, source: impl Into<String>) {
        self.files
            .borrow_mut()
            .insert(normalize(path.as_ref()), source.into());
    }

    pub fn with_file(self, path: impl AsRef<Path>, source: impl Into<String>) -> Self {
        self.add(path, source);
        self
    }

    pub fn reads(&self) -> usize {
        self.reads.get()
    }
}

impl SourceLoader for InMemoryLoader {
    fn resolve(&self, base: Option<&Path>, path: &str) -> Result<PathBuf, LoadError> {
        let joined = match base {
            Some(base) => base.join(path),
            None => PathBuf::from(path),
        };
        let resolved = normalize(&joined);
        if self.files.borrow().contains_key(&resolved) {
            Ok(resolved)
        } else {
            Err(LoadError::NotFound(resolved.display().to_string()))
        }
    }

    fn load(&self, path: &Path) -> Result<String, LoadError> {
        self.reads.set(self.reads.get() + 1);
        self.files
            .borrow()
            .get(path)
            .cloned()
            .ok_or_else(|| LoadError::NotFound(path.display().to_string()))
    }

    fn name(&self) -> &'static str {
        "InMemoryLoader"
    }
}

/// Lexically removes `.` and `..` components.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_in_memory_resolves_relative_to_base() {
        let loader = InMemoryLoader::new().with_file("lib/util.jel", "1");
        let resolved = loader.resolve(Some(Path::new("lib/sub/..")), "./util.jel").unwrap();
        assert_eq!(resolved, PathBuf::from("lib/util.jel"));
        assert_eq!(loader.load(&resolved).unwrap(), "1");
        assert_eq!(loader.reads(), 1);
        assert!(matches!(loader.resolve(None, "missing.jel"), Err(LoadError::NotFound(_))));
    }

    #[test]
    fn test_filesystem_resolves_to_canonical_path() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = std::fs::File::create(dir.path().join("a.jel")).unwrap();
        writeln!(file, "{{ a: 1 }}").unwrap();

        let loader = FilesystemLoader;
        let resolved = loader.resolve(Some(dir.path()), "./a.jel").unwrap();
        assert!(resolved.is_absolute());
        assert!(loader.load(&resolved).unwrap().contains("a: 1"));
        assert!(matches!(loader.resolve(Some(dir.path()), "b.jel"), Err(LoadError::NotFound(_))));
    }
}
