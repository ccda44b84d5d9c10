use std::sync::Arc;

use format::{
    AnyText, BinaryNumbers, CborObject, DelimitedNumbers, FormatRegistry, JsonObject, PlainText,
};
use util::HashSet;

use crate::{ResourceCodec, ResourceSlot, ResourceType};

/// The codec for each resource type.
///
/// Built once at startup and passed to whatever constructs parameter trees;
/// registries are immutable once built, so this is cheap to clone and share.
#[derive(Debug, Clone)]
pub struct Codecs {
    text: Arc<FormatRegistry<String>>,
    numbers: Arc<FormatRegistry<Vec<f64>>>,
    documents: Arc<FormatRegistry<serde_json::Value>>,
}

impl Codecs {
    /// The standard formats. Order within each registry is dispatch order,
    /// so catch-all handlers come last.
    pub fn standard() -> Self {
        let text = FormatRegistry::new("text").with(PlainText).with(AnyText);
        let numbers = FormatRegistry::new("numbers")
            .with(DelimitedNumbers)
            .with(BinaryNumbers);
        let documents = FormatRegistry::new("documents")
            .with(JsonObject::<serde_json::Value>::new())
            .with(CborObject::<serde_json::Value>::new());
        Self::new(text, numbers, documents)
    }

    /// Use custom registries.
    pub fn new(
        text: FormatRegistry<String>,
        numbers: FormatRegistry<Vec<f64>>,
        documents: FormatRegistry<serde_json::Value>,
    ) -> Self {
        Self {
            text: Arc::new(text),
            numbers: Arc::new(numbers),
            documents: Arc::new(documents),
        }
    }

    pub fn text(&self) -> &Arc<FormatRegistry<String>> {
        &self.text
    }

    pub fn numbers(&self) -> &Arc<FormatRegistry<Vec<f64>>> {
        &self.numbers
    }

    pub fn documents(&self) -> &Arc<FormatRegistry<serde_json::Value>> {
        &self.documents
    }

    /// Type-erased codec for `resource_type`.
    pub fn codec(&self, resource_type: ResourceType) -> Arc<dyn ResourceCodec> {
        match resource_type {
            ResourceType::Text => self.text.clone() as Arc<dyn ResourceCodec>,
            ResourceType::Numbers => self.numbers.clone() as Arc<dyn ResourceCodec>,
            ResourceType::Document => self.documents.clone() as Arc<dyn ResourceCodec>,
        }
    }

    /// An unbound slot with the matching codec bound.
    pub fn slot(&self, resource_type: ResourceType) -> ResourceSlot {
        ResourceSlot::with_codec(self.codec(resource_type))
    }

    /// Sorted union of every extension any codec accepts, for file-chooser filters.
    pub fn extensions(&self) -> Vec<String> {
        let codecs: [&dyn ResourceCodec; 3] = [
            self.text.as_ref(),
            self.numbers.as_ref(),
            self.documents.as_ref(),
        ];
        let mut union: HashSet<String> = HashSet::default();
        for codec in codecs {
            union.extend(codec.file_extensions().into_iter().map(str::to_owned));
        }
        let mut extensions: Vec<_> = union.into_iter().collect();
        extensions.sort_unstable();
        extensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Resource;
    use anyhow::Result;
    use tempfile::tempdir;

    #[test]
    fn test_extension_union() {
        let codecs = Codecs::standard();
        assert_eq!(
            codecs.extensions(),
            vec!["bin", "cbor", "csv", "dat", "f64", "json", "log", "md", "raw", "text", "txt"]
        );
        assert!(codecs.codec(ResourceType::Text).accepts_path("anything.xyz".as_ref()));
        assert!(!codecs.codec(ResourceType::Numbers).accepts_path("a.json".as_ref()));
    }

    /// write then read gives back the same value, for every standard handler.
    #[test]
    fn test_round_trip_every_handler() -> Result<()> {
        let dir = tempdir()?;
        let codecs = Codecs::standard();
        let document = serde_json::json!({
            "name": "run-7",
            "thresholds": [0.5, 1.25],
            "nested": {"enabled": true, "count": 3}
        });
        let cases = [
            ("notes.txt", Resource::Text("line one\nline two\n".into())),
            ("notes.cfg", Resource::Text("key = value\n".into())),
            ("signal.csv", Resource::Numbers(vec![1.0, -2.5, 1e-12])),
            ("signal.f64", Resource::Numbers(vec![1.0, -2.5, 1e-12])),
            ("meta.json", Resource::Document(document.clone())),
            ("meta.cbor", Resource::Document(document)),
        ];
        for (name, value) in cases {
            let codec = codecs.codec(value.resource_type());
            let written = codec.write_resource(&value, &dir.path().join(name))?;
            assert_eq!(written, dir.path().join(name));
            assert_eq!(codec.read_resource(&written)?, value, "round trip through {name}");
        }
        Ok(())
    }

    #[test]
    fn test_codec_rejects_wrong_resource() {
        let codecs = Codecs::standard();
        let err = codecs
            .codec(ResourceType::Numbers)
            .write_resource(&Resource::Text("x".into()), "x.csv".as_ref())
            .unwrap_err();
        assert!(matches!(err, crate::Error::WrongResource { .. }));
    }
}
