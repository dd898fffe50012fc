//! Template source loading
//!
//! `include` and `parse` read other templates through a [`Loader`]. The
//! renderer performs no other I/O.
//!
//! - [`FileSystemLoader`]: reads files below a root directory, on demand
//! - [`MemoryLoader`]: serves sources registered in memory
//!
//! Paths are normalized before use: forward slashes, no leading `./`.

use rustc_hash::FxHashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Failure to read a template source
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadError {
    #[error("template '{0}' not found")]
    NotFound(String),
    #[error("failed to read template '{path}': {message}")]
    Io { path: String, message: String },
}

impl LoadError {
    pub fn path(&self) -> &str {
        match self {
            LoadError::NotFound(path) => path,
            LoadError::Io { path, .. } => path,
        }
    }

    fn from_io(path: &str, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => LoadError::NotFound(path.to_string()),
            _ => LoadError::Io {
                path: path.to_string(),
                message: err.to_string(),
            },
        }
    }
}

/// Source of template text for `include` and `parse`. Synchronous; any
/// caching is up to the implementation.
pub trait Loader {
    fn read_text(&self, path: &str) -> Result<String, LoadError>;
}

impl<L: Loader + ?Sized> Loader for &L {
    fn read_text(&self, path: &str) -> Result<String, LoadError> {
        (**self).read_text(path)
    }
}

impl<L: Loader + ?Sized> Loader for Box<L> {
    fn read_text(&self, path: &str) -> Result<String, LoadError> {
        (**self).read_text(path)
    }
}

impl<L: Loader + ?Sized> Loader for Arc<L> {
    fn read_text(&self, path: &str) -> Result<String, LoadError> {
        (**self).read_text(path)
    }
}

pub(crate) fn normalize_path(path: &str) -> String {
    let mut p = path.replace('\\', "/");
    while let Some(rest) = p.strip_prefix("./") {
        p = rest.to_string();
    }
    p
}

/// Reads templates from disk, relative to a root directory
#[derive(Debug, Clone)]
pub struct FileSystemLoader {
    root: PathBuf,
}

impl FileSystemLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FileSystemLoader { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Loader for FileSystemLoader {
    fn read_text(&self, path: &str) -> Result<String, LoadError> {
        let full_path = self.root.join(normalize_path(path));
        tracing::trace!(path = %full_path.display(), "reading template");
        std::fs::read_to_string(&full_path).map_err(|err| LoadError::from_io(path, err))
    }
}

/// Serves template sources registered in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    sources: FxHashMap<String, String>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, path: &str, source: impl Into<String>) -> &mut Self {
        self.sources.insert(normalize_path(path), source.into());
        self
    }

    pub fn with(mut self, path: &str, source: impl Into<String>) -> Self {
        self.add(path, source);
        self
    }

    pub fn contains(&self, path: &str) -> bool {
        self.sources.contains_key(&normalize_path(path))
    }
}

impl Loader for MemoryLoader {
    fn read_text(&self, path: &str) -> Result<String, LoadError> {
        self.sources
            .get(&normalize_path(path))
            .cloned()
            .ok_or_else(|| LoadError::NotFound(path.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_loader() {
        let loader = MemoryLoader::new().with("partials/head.html", "<head>");
        assert_eq!(loader.read_text("./partials/head.html").unwrap(), "<head>");
        assert!(loader.contains("partials/head.html"));
        assert_eq!(
            loader.read_text("missing.html"),
            Err(LoadError::NotFound("missing.html".to_string()))
        );
    }

    #[test]
    fn test_file_system_loader() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("page.html"), "hello").unwrap();

        let loader = FileSystemLoader::new(dir.path());
        assert_eq!(loader.read_text("page.html").unwrap(), "hello");

        let err = loader.read_text("nope.html").unwrap_err();
        assert!(matches!(err, LoadError::NotFound(_)));
        assert_eq!(err.path(), "nope.html");
    }

    #[test]
    fn test_forwarding_impls() {
        fn read(loader: impl Loader) -> String {
            loader.read_text("a").unwrap()
        }

        let loader = MemoryLoader::new().with("a", "x");
        let boxed: Box<dyn Loader> = Box::new(loader.clone());
        assert_eq!(read(&loader), "x");
        assert_eq!(read(boxed), "x");
        assert_eq!(read(Arc::new(loader)), "x");
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("./././a/b"), "a/b");
        assert_eq!(normalize_path("a\\b"), "a/b");
    }
}
