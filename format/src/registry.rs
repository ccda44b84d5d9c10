use std::path::{Path, PathBuf};

use util::HashSet;

use crate::{Error, FormatHandler};

/// A registered handler and its extensions, normalized once on registration.
struct Entry<T> {
    handler: Box<dyn FormatHandler<T>>,
    /// lowercase, no leading dot, sorted
    extensions: Vec<String>,
    wildcard: bool,
}

impl<T> Entry<T> {
    fn new(handler: Box<dyn FormatHandler<T>>) -> Self {
        let wildcard = handler.is_wildcard();
        let mut extensions: Vec<String> = handler
            .extensions()
            .into_iter()
            .map(crate::normalize_extension)
            .collect();
        extensions.sort_unstable();
        extensions.dedup();
        Self {
            handler,
            extensions,
            wildcard,
        }
    }

    fn accepts(&self, path: &Path) -> bool {
        self.wildcard || accepts_extension(&self.extensions, path)
    }
}

fn accepts_extension(sorted: &[String], path: &Path) -> bool {
    match util::lowercase_extension(path) {
        Some(ext) => sorted.binary_search(&ext).is_ok(),
        None => false,
    }
}

/// Ordered collection of format handlers with first-match dispatch.
///
/// Built once (with [`FormatRegistry::with`] or [`FormatRegistry::register`])
/// and treated as immutable afterwards; share it behind an `Arc`.
/// Dispatch and [`FormatHandler::accepts`] both match on the normalized
/// extensions, so every path the registry accepts reaches a handler.
pub struct FormatRegistry<T> {
    /// name used in log messages
    name: String,
    /// handlers, in dispatch order
    entries: Vec<Entry<T>>,
    /// sorted union of all handlers' extensions
    extensions: Vec<String>,
    /// true if any handler accepts every path
    wildcard: bool,
}

impl<T> FormatRegistry<T> {
    /// Create an empty registry.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::with_capacity(4),
            extensions: Vec::with_capacity(0),
            wildcard: false,
        }
    }

    /// Builder-style [`FormatRegistry::register`].
    pub fn with(mut self, handler: impl FormatHandler<T> + 'static) -> Self {
        self.register(handler);
        self
    }

    /// Append `handler` to the end of the dispatch order.
    pub fn register(&mut self, handler: impl FormatHandler<T> + 'static) {
        log::trace!(
            "{}: registering handler '{}' at index {}",
            self.name,
            handler.name(),
            self.entries.len()
        );
        let entry = Entry::new(Box::new(handler));
        self.wildcard |= entry.wildcard;
        self.entries.push(entry);

        let mut union: HashSet<String> = HashSet::default();
        for entry in &self.entries {
            union.extend(entry.extensions.iter().cloned());
        }
        self.extensions = union.into_iter().collect();
        self.extensions.sort_unstable();
    }

    /// Number of registered handlers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no handlers are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Names of the registered handlers, in dispatch order.
    pub fn handler_names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.handler.name()).collect()
    }

    /// Index and handler that `read` would dispatch `path` to.
    pub fn handler_for(&self, path: &Path) -> Option<(usize, &dyn FormatHandler<T>)> {
        self.entries
            .iter()
            .enumerate()
            .find(|(_, e)| e.accepts(path))
            .map(|(i, e)| (i, e.handler.as_ref()))
    }

    /// Index and handler that `write` would dispatch `target` to.
    /// A target without an extension goes to the first registered handler.
    pub fn handler_for_write(&self, target: &Path) -> Option<(usize, &dyn FormatHandler<T>)> {
        if target.extension().is_none() {
            self.entries.first().map(|e| (0, e.handler.as_ref()))
        } else {
            self.handler_for(target)
        }
    }
}

impl<T> FormatHandler<T> for FormatRegistry<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn extensions(&self) -> Vec<&str> {
        self.extensions.iter().map(String::as_str).collect()
    }

    fn is_wildcard(&self) -> bool {
        self.wildcard
    }

    fn default_extension(&self) -> Option<&str> {
        self.entries.first().and_then(|e| e.handler.default_extension())
    }

    fn accepts(&self, path: &Path) -> bool {
        self.wildcard || accepts_extension(&self.extensions, path)
    }

    fn read(&self, path: &Path) -> Result<T, Error> {
        let (idx, handler) = self
            .handler_for(path)
            .ok_or_else(|| Error::Unsupported(path.to_path_buf()))?;
        log::debug!(
            "{}: reading {:?} with handler '{}' ({idx})",
            self.name,
            path,
            handler.name()
        );
        handler.read(path)
    }

    fn write(&self, value: &T, target: &Path) -> Result<PathBuf, Error> {
        let (idx, handler) = self
            .handler_for_write(target)
            .ok_or_else(|| Error::Unsupported(target.to_path_buf()))?;
        log::debug!(
            "{}: writing {:?} with handler '{}' ({idx})",
            self.name,
            target,
            handler.name()
        );
        let written = handler.write(value, target)?;
        if !written.is_file() {
            return Err(Error::SaveFailure(handler.name().to_owned(), written));
        }
        Ok(written)
    }
}

impl<T> std::fmt::Debug for FormatRegistry<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormatRegistry")
            .field("name", &self.name)
            .field("handlers", &self.handler_names())
            .field("extensions", &self.extensions)
            .field("wildcard", &self.wildcard)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AnyText, BinaryNumbers, DelimitedNumbers, PlainText};
    use anyhow::Result;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::tempdir;

    /// Records how many times it was asked to read.
    struct Probe {
        name: &'static str,
        exts: &'static [&'static str],
        reads: Arc<AtomicUsize>,
    }

    impl Probe {
        fn new(name: &'static str, exts: &'static [&'static str]) -> (Self, Arc<AtomicUsize>) {
            let reads = Arc::new(AtomicUsize::new(0));
            let probe = Self {
                name,
                exts,
                reads: reads.clone(),
            };
            (probe, reads)
        }
    }

    impl FormatHandler<String> for Probe {
        fn name(&self) -> &str {
            self.name
        }
        fn extensions(&self) -> Vec<&str> {
            self.exts.to_vec()
        }
        fn read(&self, _path: &Path) -> Result<String, Error> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            Ok(self.name.to_owned())
        }
        fn write(&self, _value: &String, target: &Path) -> Result<PathBuf, Error> {
            Ok(target.to_path_buf())
        }
    }

    #[test]
    fn test_first_accepting_handler_wins() -> Result<()> {
        let (a, a_reads) = Probe::new("a", &["txt"]);
        let (b, b_reads) = Probe::new("b", &[]);
        let registry = FormatRegistry::new("test").with(a).with(b);

        assert_eq!(registry.read(Path::new("x.txt"))?, "a");
        assert_eq!(registry.read(Path::new("x.bin"))?, "b");
        assert_eq!(registry.read(Path::new("x"))?, "b");
        assert_eq!(a_reads.load(Ordering::SeqCst), 1);
        assert_eq!(b_reads.load(Ordering::SeqCst), 2);
        Ok(())
    }

    #[test]
    fn test_wildcard_registered_first_shadows_everything() -> Result<()> {
        let (b, _) = Probe::new("b", &[]);
        let (a, a_reads) = Probe::new("a", &["txt"]);
        let registry = FormatRegistry::new("test").with(b).with(a);

        assert_eq!(registry.read(Path::new("x.txt"))?, "b");
        assert_eq!(a_reads.load(Ordering::SeqCst), 0);
        Ok(())
    }

    #[test]
    fn test_overlapping_specific_extensions_use_order() {
        let (first, _) = Probe::new("first", &["csv", "txt"]);
        let (second, _) = Probe::new("second", &["txt"]);
        let registry = FormatRegistry::new("test").with(first).with(second);

        let (idx, handler) = registry.handler_for(Path::new("data.TXT")).unwrap();
        assert_eq!(idx, 0);
        assert_eq!(handler.name(), "first");
    }

    #[test]
    fn test_empty_registry_is_unsupported() {
        let registry: FormatRegistry<String> = FormatRegistry::new("empty");
        assert!(!registry.accepts(Path::new("x.txt")));
        let err = registry.read(Path::new("x.txt")).unwrap_err();
        assert!(matches!(err, Error::Unsupported(_)));
        let err = registry.write(&String::new(), Path::new("x.txt")).unwrap_err();
        assert!(matches!(err, Error::Unsupported(_)));
    }

    #[test]
    fn test_extension_union() {
        let (a, _) = Probe::new("a", &["txt", "csv"]);
        let (b, _) = Probe::new("b", &["CSV", ".dat"]);
        let registry = FormatRegistry::new("test").with(a).with(b);

        assert_eq!(registry.extensions(), vec!["csv", "dat", "txt"]);
        assert!(!registry.is_wildcard());
        assert!(registry.accepts(Path::new("x.Dat")));
        assert!(!registry.accepts(Path::new("x.bin")));

        let (w, _) = Probe::new("w", &[]);
        let registry = registry.with(w);
        assert!(registry.is_wildcard());
        assert!(registry.accepts(Path::new("x.bin")));
    }

    #[test]
    fn test_accepted_paths_are_dispatched() -> Result<()> {
        let (dat, dat_reads) = Probe::new("dat", &[".DAT"]);
        let registry = FormatRegistry::new("test").with(dat);
        assert_eq!(registry.extensions(), vec!["dat"]);

        for name in ["x.dat", "x.DAT", "x.Dat", "x.bin", "x"] {
            let path = Path::new(name);
            assert_eq!(registry.accepts(path), registry.read(path).is_ok(), "{name}");
        }
        assert_eq!(dat_reads.load(Ordering::SeqCst), 3);

        let (idx, handler) = registry.handler_for_write(Path::new("out.dat")).unwrap();
        assert_eq!((idx, handler.name()), (0, "dat"));
        Ok(())
    }

    #[test]
    fn test_handler_accepts_ignores_dot_and_case() {
        let (dat, _) = Probe::new("dat", &[".DAT"]);
        assert!(dat.accepts(Path::new("x.dat")));
        assert!(!dat.accepts(Path::new("x.bin")));
        assert_eq!(dat.default_extension(), Some("DAT"));
    }

    #[test]
    fn test_handler_failure_is_not_retried() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("broken.csv");
        std::fs::write(&path, "1.0, two, 3.0")?;

        // the accepting handler's own failure comes back unchanged:
        let registry = FormatRegistry::new("numbers")
            .with(DelimitedNumbers)
            .with(BinaryNumbers);
        let err = registry.read(&path).unwrap_err();
        assert!(matches!(err, Error::Parse { format: "delimited", .. }));

        let missing = dir.path().join("missing.csv");
        let err = registry.read(&missing).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
        Ok(())
    }

    #[test]
    fn test_nested_registries_dispatch_recursively() -> Result<()> {
        let dir = tempdir()?;
        let text = FormatRegistry::new("text").with(PlainText);
        let outer = FormatRegistry::new("outer").with(text).with(AnyText);

        assert_eq!(outer.handler_names(), vec!["text", "any-text"]);

        let written = outer.write(&"hello".to_owned(), &dir.path().join("notes"))?;
        assert_eq!(written, dir.path().join("notes.txt"));
        assert_eq!(outer.read(&written)?, "hello");

        let written = outer.write(&"raw".to_owned(), &dir.path().join("notes.cfg"))?;
        assert_eq!(written, dir.path().join("notes.cfg"));
        let (idx, _) = outer.handler_for(&written).unwrap();
        assert_eq!(idx, 1);
        Ok(())
    }

    #[test]
    fn test_write_without_output_is_save_failure() {
        let (a, _) = Probe::new("a", &["txt"]);
        let registry = FormatRegistry::new("test").with(a);
        let err = registry
            .write(&String::new(), Path::new("/nonexistent/dir/x.txt"))
            .unwrap_err();
        assert!(matches!(err, Error::SaveFailure(name, _) if name == "a"));
    }
}
