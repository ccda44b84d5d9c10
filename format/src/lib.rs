//! File formats for pipeline resources.
//!
//! A [`FormatHandler`] binds a set of file extensions to a read and a write
//! operation for one in-memory value type. Handlers are collected into a
//! [`FormatRegistry`], which dispatches each path to the first registered
//! handler that accepts it. A registry is itself a handler, so composite
//! formats (e.g. "numeric arrays, as text or as binary") nest inside larger
//! registries without any extra mechanism.
//!
//! Dispatch is strictly by registration order: a wildcard handler (one with no
//! extensions) accepts every path and must therefore be registered last.

use std::path::{Path, PathBuf};

mod registry;
pub use registry::FormatRegistry;

/// Plain text handlers
mod text;
pub use text::{AnyText, PlainText};

/// Numeric array handlers
mod numbers;
pub use numbers::{BinaryNumbers, DelimitedNumbers};

/// serde-backed object handlers
mod object;
pub use object::{CborObject, JsonObject};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("No format handler accepts {0:?}")]
    Unsupported(PathBuf),
    #[error("I/O error on {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed {format} content in {path:?}")]
    Parse {
        format: &'static str,
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },
    #[error("Unable to encode value as {format} for {path:?}")]
    Encode {
        format: &'static str,
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },
    #[error("Format handler '{0}' reported {1:?} but no file was written there")]
    SaveFailure(String, PathBuf),
}

impl Error {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn parse(format: &'static str, path: &Path, source: impl Into<anyhow::Error>) -> Self {
        Self::Parse {
            format,
            path: path.to_path_buf(),
            source: source.into(),
        }
    }

    pub(crate) fn encode(format: &'static str, path: &Path, source: impl Into<anyhow::Error>) -> Self {
        Self::Encode {
            format,
            path: path.to_path_buf(),
            source: source.into(),
        }
    }
}

/// One concrete file format for values of type `T`.
pub trait FormatHandler<T>: Send + Sync {
    /// Short name used in log messages.
    fn name(&self) -> &str;

    /// Accepted extensions. Matching ignores case and a leading dot.
    /// An empty list means the handler accepts any file.
    fn extensions(&self) -> Vec<&str>;

    /// True if this handler accepts every path regardless of extension.
    fn is_wildcard(&self) -> bool {
        self.extensions().is_empty()
    }

    /// Extension appended on write when the target name doesn't carry one.
    fn default_extension(&self) -> Option<&str> {
        self.extensions().first().map(|ext| ext.trim_start_matches('.'))
    }

    /// True if `path` has one of this handler's extensions (case-insensitive),
    /// or if this handler is a wildcard.
    fn accepts(&self, path: &Path) -> bool {
        if self.is_wildcard() {
            return true;
        }
        match util::lowercase_extension(path) {
            Some(ext) => self
                .extensions()
                .into_iter()
                .any(|accepted| normalize_extension(accepted) == ext),
            None => false,
        }
    }

    /// Read a value from `path`.
    fn read(&self, path: &Path) -> Result<T, Error>;

    /// Write `value` to `target` (`directory/name`), returning the path actually written.
    /// If `target` has no extension, the handler's default extension is appended.
    fn write(&self, value: &T, target: &Path) -> Result<PathBuf, Error>;
}

/// Lowercase `ext` and strip its leading dot, the form extensions are matched in.
pub fn normalize_extension(ext: &str) -> String {
    ext.trim_start_matches('.').to_ascii_lowercase()
}

/// Resolve the path a handler should write to.
pub(crate) fn output_path(target: &Path, default_ext: Option<&str>) -> PathBuf {
    match (target.extension(), default_ext) {
        (None, Some(ext)) => target.with_extension(ext),
        _ => target.to_path_buf(),
    }
}
