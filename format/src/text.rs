use std::fs;
use std::path::{Path, PathBuf};

use crate::{output_path, Error, FormatHandler};

/// UTF-8 text files with a known text extension.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainText;

impl FormatHandler<String> for PlainText {
    fn name(&self) -> &str {
        "text"
    }

    fn extensions(&self) -> Vec<&str> {
        vec!["txt", "text", "md", "log"]
    }

    fn read(&self, path: &Path) -> Result<String, Error> {
        fs::read_to_string(path).map_err(|e| Error::io(path, e))
    }

    fn write(&self, value: &String, target: &Path) -> Result<PathBuf, Error> {
        let path = output_path(target, self.default_extension());
        fs::write(&path, value).map_err(|e| Error::io(&path, e))?;
        Ok(path)
    }
}

/// Any file at all, read as UTF-8 text.
/// Accepts every path, so it must be the last handler in a registry.
#[derive(Debug, Default, Clone, Copy)]
pub struct AnyText;

impl FormatHandler<String> for AnyText {
    fn name(&self) -> &str {
        "any-text"
    }

    fn extensions(&self) -> Vec<&str> {
        Vec::with_capacity(0)
    }

    fn read(&self, path: &Path) -> Result<String, Error> {
        let bytes = fs::read(path).map_err(|e| Error::io(path, e))?;
        String::from_utf8(bytes).map_err(|e| Error::parse("utf-8", path, e))
    }

    fn write(&self, value: &String, target: &Path) -> Result<PathBuf, Error> {
        fs::write(target, value).map_err(|e| Error::io(target, e))?;
        Ok(target.to_path_buf())
    }
}
