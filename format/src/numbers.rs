use std::fs;
use std::path::{Path, PathBuf};

use anyhow::anyhow;

use crate::{output_path, Error, FormatHandler};

const FORMAT_DELIMITED: &str = "delimited";
const FORMAT_BINARY: &str = "f64-binary";

/// Numbers as text, separated by commas and/or whitespace.
/// `#` starts a comment that runs to the end of the line.
/// Written one value per line.
#[derive(Debug, Default, Clone, Copy)]
pub struct DelimitedNumbers;

impl DelimitedNumbers {
    fn parse(text: &str) -> Result<Vec<f64>, anyhow::Error> {
        let mut values = Vec::with_capacity(text.len() / 4);
        for (line_no, line) in text.lines().enumerate() {
            let line = match line.split_once('#') {
                Some((before, _comment)) => before,
                None => line,
            };
            for token in line
                .split(|c: char| c == ',' || c.is_whitespace())
                .filter(|t| !t.is_empty())
            {
                let value = token
                    .parse::<f64>()
                    .map_err(|e| anyhow!("line {}: '{token}': {e}", line_no + 1))?;
                values.push(value);
            }
        }
        Ok(values)
    }
}

impl FormatHandler<Vec<f64>> for DelimitedNumbers {
    fn name(&self) -> &str {
        FORMAT_DELIMITED
    }

    fn extensions(&self) -> Vec<&str> {
        vec!["csv", "txt", "dat"]
    }

    fn read(&self, path: &Path) -> Result<Vec<f64>, Error> {
        let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::parse(&text).map_err(|e| Error::parse(FORMAT_DELIMITED, path, e))
    }

    fn write(&self, value: &Vec<f64>, target: &Path) -> Result<PathBuf, Error> {
        use std::fmt::Write;
        let path = output_path(target, self.default_extension());
        // f64's Display is the shortest representation that parses back exactly.
        let mut text = String::with_capacity(value.len() * 8);
        for v in value {
            writeln!(text, "{v}").map_err(|e| Error::encode(FORMAT_DELIMITED, &path, e))?;
        }
        fs::write(&path, text).map_err(|e| Error::io(&path, e))?;
        Ok(path)
    }
}

/// Numbers as raw little-endian IEEE-754 doubles, no header.
#[derive(Debug, Default, Clone, Copy)]
pub struct BinaryNumbers;

impl FormatHandler<Vec<f64>> for BinaryNumbers {
    fn name(&self) -> &str {
        FORMAT_BINARY
    }

    fn extensions(&self) -> Vec<&str> {
        vec!["f64", "bin", "raw"]
    }

    fn read(&self, path: &Path) -> Result<Vec<f64>, Error> {
        let bytes = fs::read(path).map_err(|e| Error::io(path, e))?;
        if bytes.len() % 8 != 0 {
            return Err(Error::parse(
                FORMAT_BINARY,
                path,
                anyhow!("length {} is not a multiple of 8", bytes.len()),
            ));
        }
        let values = bytes
            .chunks_exact(8)
            .map(|chunk| {
                let mut buf = [0u8; 8];
                buf.copy_from_slice(chunk);
                f64::from_le_bytes(buf)
            })
            .collect();
        Ok(values)
    }

    fn write(&self, value: &Vec<f64>, target: &Path) -> Result<PathBuf, Error> {
        let path = output_path(target, self.default_extension());
        let bytes: Vec<u8> = value.iter().flat_map(|v| v.to_le_bytes()).collect();
        fs::write(&path, bytes).map_err(|e| Error::io(&path, e))?;
        Ok(path)
    }
}
