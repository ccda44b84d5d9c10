use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::{
    Error, ParamKind, ParamValue, Resource, ResourceCodec, ResourceSlot, ViewFactory, ViewHandle,
    ViewProvider,
};

/// Separates ids in a path to a nested parameter, e.g. `"filters.cutoff"`.
pub const ID_PATH_DELIM: char = '.';

/// One node of a parameter tree.
///
/// Equality compares values only: two distinct nodes holding equal values are
/// equal regardless of id, label, visibility or views.
pub struct Param {
    /// unique within the parent collection
    id: String,
    /// display label
    label: String,
    /// ignored for collections, whose visibility derives from their children
    hidden: bool,
    /// current value; the variant never changes after construction
    value: ParamValue,
    /// lazily-built views
    views: ViewFactory,
}

// CONSTRUCTION ////////////////
impl Param {
    /// A visible node labelled with its id.
    pub fn from_value(id: impl Into<String>, value: ParamValue) -> Self {
        let id = id.into();
        Self {
            label: id.clone(),
            id,
            hidden: false,
            value,
            views: ViewFactory::default(),
        }
    }

    pub fn number(id: impl Into<String>, value: f64) -> Self {
        Self::from_value(id, ParamValue::Number(value))
    }

    pub fn numbers(id: impl Into<String>, values: Vec<f64>) -> Self {
        Self::from_value(id, ParamValue::NumberCollection(values))
    }

    pub fn text(id: impl Into<String>, value: impl Into<String>) -> Self {
        Self::from_value(id, ParamValue::Text(value.into()))
    }

    pub fn file(id: impl Into<String>, path: Option<PathBuf>) -> Self {
        Self::from_value(id, ParamValue::File(path))
    }

    pub fn object(id: impl Into<String>, slot: ResourceSlot) -> Self {
        Self::from_value(id, ParamValue::Object(slot))
    }

    pub fn collection(id: impl Into<String>) -> Self {
        Self::from_value(id, ParamValue::Collection(ParamCollection::default()))
    }

    /// Builder-style label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Builder-style [`Param::set_hidden`]`(true)`.
    pub fn hidden(mut self) -> Self {
        self.set_hidden(true);
        self
    }

    /// Builder-style [`Param::add`].
    pub fn with_child(mut self, child: Param) -> Result<Self, Error> {
        self.add(child)?;
        Ok(self)
    }

    /// Append `child` to this collection.
    pub fn add(&mut self, child: Param) -> Result<(), Error> {
        let id = &self.id;
        match &mut self.value {
            ParamValue::Collection(c) => c.add(id, child),
            _ => Err(Error::invalid(id, "only collections have children")),
        }
    }

    /// End the construction phase for this subtree: collections can no longer
    /// gain, lose or reorder children. Values stay mutable.
    pub fn seal(&mut self) {
        if let ParamValue::Collection(c) = &mut self.value {
            c.sealed = true;
            for child in &mut c.children {
                child.seal();
            }
        }
    }

    /// Replace the view provider for this subtree; previously built views are dropped.
    pub fn set_view_provider(&mut self, provider: Rc<dyn ViewProvider>) {
        self.views = ViewFactory::new(provider.clone());
        if let ParamValue::Collection(c) = &mut self.value {
            for child in &mut c.children {
                child.set_view_provider(provider.clone());
            }
        }
    }
}

// ACCESS //////////////////////
impl Param {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Views already built keep the label they were built with.
    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = label.into();
    }

    pub fn kind(&self) -> ParamKind {
        self.value.kind()
    }

    pub fn value(&self) -> &ParamValue {
        &self.value
    }

    /// Replace the value. The new value must be of the same kind,
    /// and collections have no value to replace.
    pub fn set_value(&mut self, value: ParamValue) -> Result<(), Error> {
        if self.kind() == ParamKind::Collection {
            return Err(Error::invalid(&self.id, "collections hold no value of their own"));
        }
        if value.kind() != self.kind() {
            return Err(Error::invalid(
                &self.id,
                format!("can't assign a {} value to a {} parameter", value.kind(), self.kind()),
            ));
        }
        self.value = value;
        self.update();
        Ok(())
    }

    /// Hidden nodes are skipped when building views and by bulk load/save.
    /// A collection is hidden when none of its children is visible.
    pub fn is_hidden(&self) -> bool {
        match &self.value {
            ParamValue::Collection(c) => c.children.iter().all(Param::is_hidden),
            _ => self.hidden,
        }
    }

    /// On a collection this applies to every child.
    pub fn set_hidden(&mut self, hidden: bool) {
        self.hidden = hidden;
        if let ParamValue::Collection(c) = &mut self.value {
            for child in &mut c.children {
                child.set_hidden(hidden);
            }
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self.value {
            ParamValue::Number(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_numbers(&self) -> Option<&[f64]> {
        match &self.value {
            ParamValue::NumberCollection(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match &self.value {
            ParamValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Path of a file parameter, or the bound path of a resource parameter.
    pub fn as_path(&self) -> Option<&Path> {
        match &self.value {
            ParamValue::File(p) => p.as_deref(),
            ParamValue::Object(slot) => slot.path(),
            _ => None,
        }
    }

    pub fn resource(&self) -> Option<&ResourceSlot> {
        match &self.value {
            ParamValue::Object(slot) => Some(slot),
            _ => None,
        }
    }

    pub fn resource_mut(&mut self) -> Result<&mut ResourceSlot, Error> {
        match &mut self.value {
            ParamValue::Object(slot) => Ok(slot),
            _ => Err(Error::invalid(&self.id, "not a resource parameter")),
        }
    }

    /// Store an in-memory object in this resource parameter and refresh its views.
    pub fn set_object(&mut self, object: Resource) -> Result<(), Error> {
        self.resource_mut()?.set_object(object)?;
        self.update();
        Ok(())
    }

    /// Bind a codec to this resource parameter.
    pub fn bind_codec(&mut self, codec: std::sync::Arc<dyn ResourceCodec>) -> Result<(), Error> {
        self.resource_mut()?.bind_codec(codec)
    }

    pub fn collection_ref(&self) -> Option<&ParamCollection> {
        match &self.value {
            ParamValue::Collection(c) => Some(c),
            _ => None,
        }
    }

    pub fn collection_mut(&mut self) -> Option<&mut ParamCollection> {
        match &mut self.value {
            ParamValue::Collection(c) => Some(c),
            _ => None,
        }
    }

    pub(crate) fn value_mut(&mut self) -> &mut ParamValue {
        &mut self.value
    }

    /// The live ordered child list of a collection.
    pub fn children(&self) -> Result<&[Param], Error> {
        self.collection_ref()
            .map(|c| c.children.as_slice())
            .ok_or_else(|| Error::invalid(&self.id, "only collections have children"))
    }

    /// Mutable child list; only available until the collection is sealed.
    pub fn children_mut(&mut self) -> Result<&mut [Param], Error> {
        let id = &self.id;
        match &mut self.value {
            ParamValue::Collection(c) if c.sealed => Err(Error::Sealed(id.clone())),
            ParamValue::Collection(c) => Ok(c.children.as_mut_slice()),
            _ => Err(Error::invalid(id, "only collections have children")),
        }
    }

    /// Find a descendant by dotted id path (`"outer.inner"`).
    pub fn find(&self, path: &str) -> Option<&Param> {
        let mut node = self;
        for id in path.split(ID_PATH_DELIM) {
            node = node.collection_ref()?.get(id)?;
        }
        Some(node)
    }

    /// Mutable [`Param::find`]. Values of a sealed tree stay mutable.
    pub fn find_mut(&mut self, path: &str) -> Option<&mut Param> {
        let mut node = self;
        for id in path.split(ID_PATH_DELIM) {
            node = node.collection_mut()?.get_mut(id)?;
        }
        Some(node)
    }

    /// Like [`Param::find_mut`], but a missing parameter is an error.
    pub fn get_mut(&mut self, path: &str) -> Result<&mut Param, Error> {
        self.find_mut(path)
            .ok_or_else(|| Error::NotFound(path.to_owned()))
    }

    /// Depth-first walk over visible nodes (the root included, if visible),
    /// calling `f` with each node and its depth.
    pub fn walk_visible(&self, f: &mut impl FnMut(&Param, usize)) {
        self.walk_visible_at(0, f);
    }

    fn walk_visible_at(&self, depth: usize, f: &mut impl FnMut(&Param, usize)) {
        if self.is_hidden() {
            return;
        }
        f(self, depth);
        if let ParamValue::Collection(c) = &self.value {
            for child in &c.children {
                child.walk_visible_at(depth + 1, f);
            }
        }
    }
}

// VIEWS ///////////////////////
impl Param {
    /// This node's input view, built on first call and cached for the node's lifetime.
    pub fn input_view(&self) -> ViewHandle {
        self.views.input_view(self.kind(), &self.label, &self.value)
    }

    /// This node's output view, built on first call and cached for the node's lifetime.
    pub fn output_view(&self) -> ViewHandle {
        self.views.output_view(self.kind(), &self.label, &self.value)
    }

    /// Push the current value into whichever views have been built.
    pub fn update(&self) {
        self.views.update(&self.value);
    }
}

impl Clone for Param {
    /// Clones get their own (empty) view caches, sharing the view provider.
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            label: self.label.clone(),
            hidden: self.hidden,
            value: self.value.clone(),
            views: self.views.fresh(),
        }
    }
}

impl PartialEq for Param {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl fmt::Debug for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Param")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("hidden", &self.hidden)
            .field("value", &self.value)
            .finish()
    }
}

/// Ordered children of a collection parameter, with unique ids.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ParamCollection {
    pub(crate) children: Vec<Param>,
    pub(crate) sealed: bool,
}

impl ParamCollection {
    fn add(&mut self, owner: &str, child: Param) -> Result<(), Error> {
        if self.sealed {
            return Err(Error::Sealed(owner.to_owned()));
        }
        if self.get(&child.id).is_some() {
            return Err(Error::DuplicateId(child.id, owner.to_owned()));
        }
        self.children.push(child);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Param> {
        self.children.iter()
    }

    /// Children that bulk operations act on.
    pub fn visible(&self) -> impl Iterator<Item = &Param> {
        self.children.iter().filter(|c| !c.is_hidden())
    }

    pub fn get(&self, id: &str) -> Option<&Param> {
        self.children.iter().find(|c| c.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Param> {
        self.children.iter_mut().find(|c| c.id == id)
    }
}
