use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};

use crate::{output_path, Error, FormatHandler};

const FORMAT_JSON: &str = "json";
const FORMAT_CBOR: &str = "cbor";

/// Any serde-serializable value, stored as pretty-printed JSON.
pub struct JsonObject<T> {
    _phantom: PhantomData<fn() -> T>,
}

impl<T> JsonObject<T> {
    pub fn new() -> Self {
        Self {
            _phantom: PhantomData,
        }
    }
}

impl<T> Default for JsonObject<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Serialize + DeserializeOwned> FormatHandler<T> for JsonObject<T> {
    fn name(&self) -> &str {
        FORMAT_JSON
    }

    fn extensions(&self) -> Vec<&str> {
        vec!["json"]
    }

    fn read(&self, path: &Path) -> Result<T, Error> {
        let file = File::open(path).map_err(|e| Error::io(path, e))?;
        serde_json::from_reader(BufReader::new(file)).map_err(|e| {
            if e.is_io() {
                Error::io(path, e.into())
            } else {
                Error::parse(FORMAT_JSON, path, e)
            }
        })
    }

    fn write(&self, value: &T, target: &Path) -> Result<PathBuf, Error> {
        let path = output_path(target, self.default_extension());
        let file = File::create(&path).map_err(|e| Error::io(&path, e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, value).map_err(|e| {
            if e.is_io() {
                Error::io(&path, e.into())
            } else {
                Error::encode(FORMAT_JSON, &path, e)
            }
        })?;
        writer.flush().map_err(|e| Error::io(&path, e))?;
        Ok(path)
    }
}

/// Any serde-serializable value, stored as CBOR.
pub struct CborObject<T> {
    _phantom: PhantomData<fn() -> T>,
}

impl<T> CborObject<T> {
    pub fn new() -> Self {
        Self {
            _phantom: PhantomData,
        }
    }
}

impl<T> Default for CborObject<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Serialize + DeserializeOwned> FormatHandler<T> for CborObject<T> {
    fn name(&self) -> &str {
        FORMAT_CBOR
    }

    fn extensions(&self) -> Vec<&str> {
        vec!["cbor"]
    }

    fn read(&self, path: &Path) -> Result<T, Error> {
        use ciborium::de::Error as DeError;
        let file = File::open(path).map_err(|e| Error::io(path, e))?;
        ciborium::from_reader(BufReader::new(file)).map_err(|e| match e {
            DeError::Io(io) => Error::io(path, io),
            other => Error::parse(FORMAT_CBOR, path, other),
        })
    }

    fn write(&self, value: &T, target: &Path) -> Result<PathBuf, Error> {
        use ciborium::ser::Error as SerError;
        let path = output_path(target, self.default_extension());
        let file = File::create(&path).map_err(|e| Error::io(&path, e))?;
        let mut writer = BufWriter::new(file);
        ciborium::into_writer(value, &mut writer).map_err(|e| match e {
            SerError::Io(io) => Error::io(&path, io),
            other => Error::encode(FORMAT_CBOR, &path, other),
        })?;
        writer.flush().map_err(|e| Error::io(&path, e))?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use serde::Deserialize;
    use tempfile::tempdir;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Calibration {
        name: String,
        offsets: Vec<f64>,
        enabled: bool,
    }

    fn sample() -> Calibration {
        Calibration {
            name: "detector-a".to_owned(),
            offsets: vec![0.25, -3.0, 1e9],
            enabled: true,
        }
    }

    #[test]
    fn test_json_round_trip() -> Result<()> {
        let dir = tempdir()?;
        let handler = JsonObject::<Calibration>::new();
        let written = handler.write(&sample(), &dir.path().join("calibration"))?;
        assert_eq!(written, dir.path().join("calibration.json"));
        assert_eq!(handler.read(&written)?, sample());
        Ok(())
    }

    #[test]
    fn test_cbor_round_trip() -> Result<()> {
        let dir = tempdir()?;
        let handler = CborObject::<Calibration>::new();
        let written = handler.write(&sample(), &dir.path().join("calibration.cbor"))?;
        assert_eq!(handler.read(&written)?, sample());
        Ok(())
    }

    #[test]
    fn test_json_shape_mismatch_is_parse_error() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("wrong.json");
        std::fs::write(&path, r#"{"name": 3}"#)?;
        let handler = JsonObject::<Calibration>::new();
        assert!(matches!(
            handler.read(&path),
            Err(Error::Parse { format: FORMAT_JSON, .. })
        ));
        Ok(())
    }
}
