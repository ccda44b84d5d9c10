use std::path::{Path, PathBuf};

use serde::Deserialize;

use param::{Codecs, Param, ResourceType};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Unable to parse manifest")]
    Parse(#[from] toml::de::Error),
    #[error("Manifest declares no steps")]
    NoSteps,
    #[error("Step '{0}' is declared more than once")]
    DuplicateStep(String),
    #[error("Input '{id}' of step '{step}' needs a 'path'")]
    MissingPath { step: String, id: String },
    #[error("Input '{id}' of step '{step}' needs a {kind} 'value'")]
    MissingValue {
        step: String,
        id: String,
        kind: InputKind,
    },
    #[error("Input '{id}' of step '{step}': 'codec' only applies to object inputs")]
    StrayCodec { step: String, id: String },
    #[error(transparent)]
    Param(#[from] param::Error),
}

/// A pipeline manifest: an ordered list of steps.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(default, rename = "step")]
    pub steps: Vec<StepSpec>,
}

/// One step: a built-in algorithm, the values staged for its inputs,
/// and the file names of its outputs.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StepSpec {
    pub name: String,
    pub algorithm: String,
    #[serde(default, rename = "input")]
    pub inputs: Vec<InputSpec>,
    #[serde(default, rename = "output")]
    pub outputs: Vec<OutputSpec>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InputSpec {
    pub id: String,
    pub kind: InputKind,
    pub path: Option<PathBuf>,
    pub value: Option<ValueSpec>,
    pub label: Option<String>,
    #[serde(default)]
    pub hidden: bool,
    pub codec: Option<CodecName>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    Number,
    Numbers,
    Text,
    File,
    Object,
}

impl std::fmt::Display for InputKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Number => "number",
            Self::Numbers => "numbers",
            Self::Text => "text",
            Self::File => "file",
            Self::Object => "object",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodecName {
    Text,
    Numbers,
    Document,
}

impl From<CodecName> for ResourceType {
    fn from(codec: CodecName) -> Self {
        match codec {
            CodecName::Text => ResourceType::Text,
            CodecName::Numbers => ResourceType::Numbers,
            CodecName::Document => ResourceType::Document,
        }
    }
}

/// Inline value of an input.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ValueSpec {
    Number(f64),
    Numbers(Vec<f64>),
    Text(String),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputSpec {
    pub id: String,
    /// File name inside the output's directory; the codec picks the format from it.
    pub file: Option<PathBuf>,
}

impl Manifest {
    /// Parse a manifest, resolving relative input paths against `base_dir`.
    pub fn parse(text: &str, base_dir: &Path) -> Result<Self, Error> {
        let mut manifest: Manifest = toml::from_str(text)?;
        if manifest.steps.is_empty() {
            return Err(Error::NoSteps);
        }

        let mut names = util::HashSet::default();
        for step in &mut manifest.steps {
            if !names.insert(step.name.clone()) {
                return Err(Error::DuplicateStep(step.name.clone()));
            }
            for input in &mut step.inputs {
                if let Some(path) = &mut input.path {
                    if path.is_relative() {
                        *path = base_dir.join(&*path);
                    }
                }
            }
        }
        log::debug!("parsed manifest with {} steps", manifest.steps.len());
        Ok(manifest)
    }

    pub fn step(&self, name: &str) -> Option<&StepSpec> {
        self.steps.iter().find(|s| s.name == name)
    }
}

impl StepSpec {
    /// Build the foreign parameters staged by this step's inputs, in manifest order.
    pub fn staged_inputs(&self, codecs: &Codecs) -> Result<Vec<Param>, Error> {
        self.inputs
            .iter()
            .map(|input| input.to_param(&self.name, codecs))
            .collect()
    }
}

impl InputSpec {
    fn to_param(&self, step: &str, codecs: &Codecs) -> Result<Param, Error> {
        if self.codec.is_some() && self.kind != InputKind::Object {
            return Err(Error::StrayCodec {
                step: step.to_owned(),
                id: self.id.clone(),
            });
        }
        let missing_value = || Error::MissingValue {
            step: step.to_owned(),
            id: self.id.clone(),
            kind: self.kind,
        };
        let path = || {
            self.path.clone().ok_or_else(|| Error::MissingPath {
                step: step.to_owned(),
                id: self.id.clone(),
            })
        };

        let id = self.id.as_str();
        let param = match (self.kind, &self.value) {
            // a single number stages into numeric arrays as well:
            (InputKind::Number | InputKind::Numbers, Some(ValueSpec::Number(v))) => {
                Param::number(id, *v)
            }
            (InputKind::Numbers, Some(ValueSpec::Numbers(vs))) => Param::numbers(id, vs.clone()),
            (InputKind::Text, Some(ValueSpec::Text(s))) => Param::text(id, s.as_str()),
            (InputKind::File, _) => Param::file(id, Some(path()?)),
            (InputKind::Object, _) => match self.codec {
                Some(codec) => {
                    let mut slot = codecs.slot(codec.into());
                    slot.set_path(path()?);
                    Param::object(id, slot)
                }
                None => Param::file(id, Some(path()?)),
            },
            _ => return Err(missing_value()),
        };
        Ok(param)
    }
}
