use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use format::{FormatHandler, FormatRegistry};

use crate::Error;

/// An in-memory object that a resource parameter can hold.
#[derive(Debug, Clone, PartialEq)]
pub enum Resource {
    Text(String),
    Numbers(Vec<f64>),
    /// Any serializable object, in its serde data model form.
    Document(serde_json::Value),
}

impl Resource {
    pub fn resource_type(&self) -> ResourceType {
        match self {
            Self::Text(_) => ResourceType::Text,
            Self::Numbers(_) => ResourceType::Numbers,
            Self::Document(_) => ResourceType::Document,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceType {
    Text,
    Numbers,
    Document,
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Text => "text",
            Self::Numbers => "numbers",
            Self::Document => "document",
        };
        f.write_str(name)
    }
}

/// Value types that have a [`Resource`] form.
pub trait ResourceValue: Sized {
    const TYPE: ResourceType;

    fn into_resource(self) -> Resource;

    fn from_resource(resource: &Resource) -> Option<&Self>;
}

impl ResourceValue for String {
    const TYPE: ResourceType = ResourceType::Text;

    fn into_resource(self) -> Resource {
        Resource::Text(self)
    }

    fn from_resource(resource: &Resource) -> Option<&Self> {
        match resource {
            Resource::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl ResourceValue for Vec<f64> {
    const TYPE: ResourceType = ResourceType::Numbers;

    fn into_resource(self) -> Resource {
        Resource::Numbers(self)
    }

    fn from_resource(resource: &Resource) -> Option<&Self> {
        match resource {
            Resource::Numbers(v) => Some(v),
            _ => None,
        }
    }
}

impl ResourceValue for serde_json::Value {
    const TYPE: ResourceType = ResourceType::Document;

    fn into_resource(self) -> Resource {
        Resource::Document(self)
    }

    fn from_resource(resource: &Resource) -> Option<&Self> {
        match resource {
            Resource::Document(v) => Some(v),
            _ => None,
        }
    }
}

/// Type-erased codec: reads and writes [`Resource`]s of one [`ResourceType`].
pub trait ResourceCodec: Send + Sync {
    fn codec_name(&self) -> &str;

    fn resource_type(&self) -> ResourceType;

    /// Union of accepted extensions, for file-chooser filters.
    fn file_extensions(&self) -> Vec<&str>;

    fn accepts_path(&self, path: &Path) -> bool;

    fn read_resource(&self, path: &Path) -> Result<Resource, Error>;

    fn write_resource(&self, resource: &Resource, target: &Path) -> Result<PathBuf, Error>;
}

impl<T: ResourceValue> ResourceCodec for FormatRegistry<T> {
    fn codec_name(&self) -> &str {
        FormatHandler::name(self)
    }

    fn resource_type(&self) -> ResourceType {
        T::TYPE
    }

    fn file_extensions(&self) -> Vec<&str> {
        FormatHandler::extensions(self)
    }

    fn accepts_path(&self, path: &Path) -> bool {
        FormatHandler::accepts(self, path)
    }

    fn read_resource(&self, path: &Path) -> Result<Resource, Error> {
        Ok(FormatHandler::read(self, path)?.into_resource())
    }

    fn write_resource(&self, resource: &Resource, target: &Path) -> Result<PathBuf, Error> {
        let value = T::from_resource(resource).ok_or(Error::WrongResource {
            expected: T::TYPE,
            found: resource.resource_type(),
        })?;
        Ok(FormatHandler::write(self, value, target)?)
    }
}

/// Where a resource slot is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceState {
    /// no path and no object
    Unbound,
    /// a path, object not loaded
    PathOnly,
    /// object in memory (the path, if any, may be stale until the next save)
    Materialized,
}

/// A file path bound to an optionally-materialized object and its codec.
///
/// `Unbound → PathOnly` when a path is bound, `PathOnly → Materialized` on
/// [`ResourceSlot::load`], `Materialized → PathOnly` on a successful
/// [`ResourceSlot::save`] (the object is released and the path points at the
/// file just written).
#[derive(Clone)]
pub struct ResourceSlot {
    /// fixed at construction
    resource_type: ResourceType,
    path: Option<PathBuf>,
    object: Option<Resource>,
    codec: Option<Arc<dyn ResourceCodec>>,
}

impl ResourceSlot {
    /// An unbound slot with no codec.
    pub fn new(resource_type: ResourceType) -> Self {
        Self {
            resource_type,
            path: None,
            object: None,
            codec: None,
        }
    }

    /// An unbound slot using `codec`; the slot takes the codec's resource type.
    pub fn with_codec(codec: Arc<dyn ResourceCodec>) -> Self {
        Self {
            resource_type: codec.resource_type(),
            path: None,
            object: None,
            codec: Some(codec),
        }
    }

    pub fn resource_type(&self) -> ResourceType {
        self.resource_type
    }

    pub fn state(&self) -> ResourceState {
        match (&self.object, &self.path) {
            (Some(_), _) => ResourceState::Materialized,
            (None, Some(_)) => ResourceState::PathOnly,
            (None, None) => ResourceState::Unbound,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn object(&self) -> Option<&Resource> {
        self.object.as_ref()
    }

    pub fn codec(&self) -> Option<&Arc<dyn ResourceCodec>> {
        self.codec.as_ref()
    }

    /// Bind a codec. Fails if it produces a different resource type.
    pub fn bind_codec(&mut self, codec: Arc<dyn ResourceCodec>) -> Result<(), Error> {
        if codec.resource_type() != self.resource_type {
            return Err(Error::WrongResource {
                expected: self.resource_type,
                found: codec.resource_type(),
            });
        }
        self.codec = Some(codec);
        Ok(())
    }

    /// Bind a path; any loaded object is dropped so it will be re-read from there.
    pub fn set_path(&mut self, path: impl Into<PathBuf>) {
        self.path = Some(path.into());
        self.object = None;
    }

    /// Use `name` as the file name for the next save without touching the object.
    /// The path is a naming hint until the object is saved or loaded.
    pub fn set_file_name(&mut self, name: impl Into<PathBuf>) {
        self.path = Some(name.into());
    }

    /// Put an object in memory. The path is kept as a naming hint for the next save.
    pub fn set_object(&mut self, object: Resource) -> Result<(), Error> {
        if object.resource_type() != self.resource_type {
            return Err(Error::WrongResource {
                expected: self.resource_type,
                found: object.resource_type(),
            });
        }
        self.object = Some(object);
        Ok(())
    }

    /// Take over another slot's path and object. Our codec is kept if we have one.
    pub(crate) fn copy_from(&mut self, other: &ResourceSlot) -> bool {
        if other.resource_type != self.resource_type {
            return false;
        }
        self.path = other.path.clone();
        self.object = other.object.clone();
        if self.codec.is_none() {
            self.codec = other.codec.clone();
        }
        true
    }

    /// Release the in-memory object, keeping the path.
    pub fn take_object(&mut self) -> Option<Resource> {
        self.object.take()
    }

    /// The in-memory object, reading it through the codec first if only the path is bound.
    pub fn load(&mut self) -> Result<&Resource, Error> {
        if self.object.is_none() {
            let path = self.path.as_deref().ok_or(Error::NoPath)?;
            let codec = self.codec.as_ref().ok_or(Error::NoCodec)?;
            log::debug!("loading {path:?} with codec '{}'", codec.codec_name());
            let object = codec.read_resource(path)?;
            // codec types are checked on bind, but a custom codec could still lie:
            if object.resource_type() != self.resource_type {
                return Err(Error::WrongResource {
                    expected: self.resource_type,
                    found: object.resource_type(),
                });
            }
            self.object = Some(object);
        }
        match &self.object {
            Some(object) => Ok(object),
            None => Err(Error::NoPath),
        }
    }

    /// Typed view of the loaded object (see [`ResourceSlot::load`]).
    pub fn load_as<T: ResourceValue>(&mut self) -> Result<&T, Error> {
        let resource_type = self.resource_type;
        let object = self.load()?;
        T::from_resource(object).ok_or(Error::WrongResource {
            expected: T::TYPE,
            found: resource_type,
        })
    }

    /// Write the in-memory object into `dir` through the codec.
    ///
    /// The file is named after the current path's file name if there is one,
    /// otherwise `default_name` (the codec then picks the extension).
    /// Returns `Ok(None)` without touching the disk if nothing is in memory.
    pub fn save(&mut self, dir: &Path, default_name: &str) -> Result<Option<PathBuf>, Error> {
        let Some(object) = &self.object else {
            return Ok(None);
        };
        let codec = self.codec.as_ref().ok_or(Error::NoCodec)?;
        let name = self
            .path
            .as_deref()
            .and_then(Path::file_name)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(default_name));
        let written = codec.write_resource(object, &dir.join(name))?;
        log::debug!("saved resource to {written:?} with codec '{}'", codec.codec_name());
        self.path = Some(written.clone());
        self.object = None;
        Ok(Some(written))
    }
}

impl PartialEq for ResourceSlot {
    /// Value equality: same type, path and object. Codecs are not compared.
    fn eq(&self, other: &Self) -> bool {
        self.resource_type == other.resource_type
            && self.path == other.path
            && self.object == other.object
    }
}

impl fmt::Debug for ResourceSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceSlot")
            .field("resource_type", &self.resource_type)
            .field("state", &self.state())
            .field("path", &self.path)
            .field("codec", &self.codec.as_ref().map(|c| c.codec_name().to_owned()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Codecs;
    use anyhow::Result;
    use tempfile::tempdir;

    #[test]
    fn test_state_transitions() -> Result<()> {
        let dir = tempdir()?;
        let codecs = Codecs::standard();
        let mut slot = codecs.slot(ResourceType::Numbers);
        assert_eq!(slot.state(), ResourceState::Unbound);

        slot.set_object(Resource::Numbers(vec![1.0, 2.0]))?;
        assert_eq!(slot.state(), ResourceState::Materialized);

        let written = slot.save(dir.path(), "signal")?.unwrap();
        assert_eq!(written, dir.path().join("signal.csv"));
        assert_eq!(slot.state(), ResourceState::PathOnly);
        assert_eq!(slot.path(), Some(written.as_path()));

        assert_eq!(slot.load_as::<Vec<f64>>()?, &vec![1.0, 2.0]);
        assert_eq!(slot.state(), ResourceState::Materialized);
        Ok(())
    }

    #[test]
    fn test_save_keeps_file_name_hint() -> Result<()> {
        let dir = tempdir()?;
        let codecs = Codecs::standard();
        let mut slot = codecs.slot(ResourceType::Numbers);
        slot.set_file_name("scaled.f64");
        slot.set_object(Resource::Numbers(vec![0.5]))?;
        let written = slot.save(dir.path(), "ignored")?.unwrap();
        assert_eq!(written, dir.path().join("scaled.f64"));
        assert_eq!(std::fs::metadata(&written)?.len(), 8);
        Ok(())
    }

    #[test]
    fn test_nothing_to_save_is_ok_and_touches_nothing() -> Result<()> {
        let dir = tempdir()?;
        let mut slot = ResourceSlot::new(ResourceType::Text);
        assert_eq!(slot.save(&dir.path().join("missing"), "x")?, None);
        assert!(!dir.path().join("missing").exists());
        assert_eq!(slot.state(), ResourceState::Unbound);
        Ok(())
    }

    #[test]
    fn test_object_without_codec_cannot_save() -> Result<()> {
        let dir = tempdir()?;
        let mut slot = ResourceSlot::new(ResourceType::Text);
        slot.set_object(Resource::Text("x".into()))?;
        assert!(matches!(slot.save(dir.path(), "x"), Err(Error::NoCodec)));
        assert_eq!(slot.state(), ResourceState::Materialized);
        Ok(())
    }

    #[test]
    fn test_type_is_fixed() {
        let codecs = Codecs::standard();
        let mut slot = codecs.slot(ResourceType::Text);
        assert!(matches!(
            slot.set_object(Resource::Numbers(vec![])),
            Err(Error::WrongResource { .. })
        ));
        assert!(slot.bind_codec(codecs.codec(ResourceType::Numbers)).is_err());
        assert!(slot.bind_codec(codecs.codec(ResourceType::Text)).is_ok());
    }

    #[test]
    fn test_load_without_path_or_codec() {
        let mut slot = ResourceSlot::new(ResourceType::Text);
        assert!(matches!(slot.load(), Err(Error::NoPath)));
        slot.set_path("notes.txt");
        assert!(matches!(slot.load(), Err(Error::NoCodec)));
    }

    #[test]
    fn test_failed_write_keeps_object() -> Result<()> {
        let dir = tempdir()?;
        let codecs = Codecs::standard();
        let mut slot = codecs.slot(ResourceType::Text);
        slot.set_object(Resource::Text("x".into()))?;
        let err = slot.save(&dir.path().join("no/such/dir"), "notes").unwrap_err();
        assert!(matches!(err, Error::Format(format::Error::Io { .. })));
        assert_eq!(slot.state(), ResourceState::Materialized);
        Ok(())
    }
}
