//! Typed parameter trees.
//!
//! Every algorithm node in a pipeline describes its inputs and outputs as a
//! tree of [`Param`]s. Leaves hold numbers, numeric arrays, strings, file paths,
//! or resource slots (a path bound to an optionally-loaded in-memory object and
//! the codec that reads and writes it). Collections group children in order.
//!
//! Before a step runs, values staged in a *foreign* tree (parsed from a
//! manifest, typed on the command line, or produced by an earlier step) are
//! copied in with [`Param::load_resources`]; after it runs,
//! [`Param::save_resources`] persists every materialized output through its codec.
//!
//! Views are built lazily per node through an injected [`ViewProvider`], so
//! parameters never depend on a concrete rendering.

use std::path::PathBuf;

/// Parameter kinds and values
mod value;
pub use value::{ParamKind, ParamValue};

/// In-memory resources and the codecs that persist them
mod resource;
pub use resource::{Resource, ResourceCodec, ResourceSlot, ResourceState, ResourceType, ResourceValue};

/// Standard codec set
mod codecs;
pub use codecs::Codecs;

/// Parameter nodes and collections
mod param;
pub use param::{Param, ParamCollection, ID_PATH_DELIM};

/// Lazily-constructed views
mod view;
pub use view::{ParamView, TextView, TextViews, ViewFactory, ViewHandle, ViewProvider, ViewRole};

/// Loading staged values and saving resources
mod staging;
pub use staging::SaveReport;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Invalid operation on parameter '{id}': {msg}")]
    InvalidOperation { id: String, msg: String },
    #[error("Duplicate parameter id '{0}' in collection '{1}'")]
    DuplicateId(String, String),
    #[error("Collection '{0}' is sealed; its children can't change during execution")]
    Sealed(String),
    #[error("No parameter with id '{0}'")]
    NotFound(String),
    #[error("Resource has no path to load from")]
    NoPath,
    #[error("Resource has no codec bound")]
    NoCodec,
    #[error("Expected a {expected} resource, found {found}")]
    WrongResource {
        expected: ResourceType,
        found: ResourceType,
    },
    #[error("Unable to parse '{text}' as {kind}")]
    ParseValue { kind: ParamKind, text: String },
    #[error("Unable to create output directory {0:?}")]
    CreateDir(PathBuf, #[source] std::io::Error),
    #[error(transparent)]
    Format(#[from] format::Error),
}

impl Error {
    pub(crate) fn invalid(id: &str, msg: impl Into<String>) -> Self {
        Self::InvalidOperation {
            id: id.to_owned(),
            msg: msg.into(),
        }
    }
}
