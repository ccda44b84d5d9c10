use std::sync::Arc;

use crate::{CalcId, CalculationTree, Error, Units};

/// Handle to one node of a shared [`CalculationTree`].
///
/// Cheap to clone and `Send + Sync`: hand one to the worker running a step
/// and another to whatever polls its progress.
#[derive(Clone)]
pub struct Calculation {
    tree: Arc<CalculationTree>,
    id: CalcId,
}

impl Calculation {
    /// Create a root calculation in a fresh tree.
    pub fn root(label: impl Into<String>) -> Self {
        Self::new(Arc::new(CalculationTree::new()), label)
    }

    /// Create a root calculation in an existing tree.
    pub fn new(tree: Arc<CalculationTree>, label: impl Into<String>) -> Self {
        let id = tree.create(label);
        Self { tree, id }
    }

    pub fn id(&self) -> CalcId {
        self.id
    }

    pub fn tree(&self) -> &Arc<CalculationTree> {
        &self.tree
    }

    /// Create a sub-calculation appended to this one's children.
    pub fn child(&self, label: impl Into<String>) -> Self {
        let id = self.tree.create_child(self.id, label);
        Self {
            tree: self.tree.clone(),
            id,
        }
    }

    /// Append an existing calculation from the same tree to this one's children.
    pub fn add(&self, child: &Calculation) -> Result<(), Error> {
        if !Arc::ptr_eq(&self.tree, &child.tree) {
            return Err(Error::ForeignTree);
        }
        self.tree.add(self.id, child.id)
    }

    /// Detach from the parent, if any. Returns true if something was detached.
    pub fn detach(&self) -> bool {
        self.tree.detach(self.id).is_some()
    }

    pub fn label(&self) -> String {
        self.tree.label(self.id)
    }

    pub fn parent(&self) -> Option<Self> {
        self.tree.parent(self.id).map(|id| self.sibling_handle(id))
    }

    pub fn children(&self) -> Vec<Self> {
        self.tree
            .children(self.id)
            .into_iter()
            .map(|id| self.sibling_handle(id))
            .collect()
    }

    fn sibling_handle(&self, id: CalcId) -> Self {
        Self {
            tree: self.tree.clone(),
            id,
        }
    }

    pub fn set_total_units(&self, total: u64) {
        self.tree.set_total_units(self.id, total);
    }

    pub fn increment_completed_units(&self, n: u64) {
        self.tree.increment_completed_units(self.id, n);
    }

    pub fn decrement_completed_units(&self, n: u64) {
        self.tree.decrement_completed_units(self.id, n);
    }

    /// One more unit done.
    pub fn increment(&self) {
        self.increment_completed_units(1);
    }

    /// One unit fewer done.
    pub fn decrement(&self) {
        self.decrement_completed_units(1);
    }

    /// Mark the node's own count as done.
    pub fn finish(&self) {
        self.increment_completed_units(u64::MAX);
    }

    pub fn units(&self) -> Units {
        self.tree.units(self.id)
    }

    pub fn own_units(&self) -> Units {
        self.tree.own_units(self.id)
    }

    pub fn total_units(&self) -> u64 {
        self.tree.total_units(self.id)
    }

    pub fn completed_units(&self) -> u64 {
        self.tree.completed_units(self.id)
    }

    pub fn progress(&self) -> f64 {
        self.tree.progress(self.id)
    }

    pub fn is_completed(&self) -> bool {
        self.tree.is_completed(self.id)
    }
}

impl std::fmt::Debug for Calculation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Calculation")
            .field("id", &self.id)
            .field("label", &self.label())
            .field("units", &self.units())
            .finish()
    }
}
