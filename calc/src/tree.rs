use std::sync::{Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use util::IdVec;

use crate::{CalcId, Error, Units};

/// One node of the arena.
#[derive(Debug)]
struct Node {
    /// display label
    label: String,
    /// this node's own counters; locked independently of the arena
    units: Mutex<Units>,
    /// non-owning back-reference, only used to detach
    parent: Option<CalcId>,
    /// children, in registration order; the first one is the active sub-task
    children: Vec<CalcId>,
}

impl Node {
    fn new(label: String) -> Self {
        Self {
            label,
            units: Mutex::new(Units::default()),
            parent: None,
            children: Vec::with_capacity(0),
        }
    }

    fn with_units<R>(&self, f: impl FnOnce(&mut Units) -> R) -> R {
        // counters are plain integers, always valid even if a holder panicked:
        let mut units = self.units.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut units)
    }
}

/// Arena of calculation nodes.
///
/// The arena owns every node; parents refer to children (and children to
/// their parent) by [`CalcId`]. Counter updates and reads only take the
/// arena's read lock plus the one node's mutex, so a worker updating a node
/// never waits on a poller reading another one. Structural changes
/// ([`CalculationTree::create`], [`CalculationTree::add`], ...) take the write lock.
///
/// All methods taking a `CalcId` panic if the id was not created by this tree.
#[derive(Debug, Default)]
pub struct CalculationTree {
    nodes: RwLock<IdVec<CalcId, Node>>,
}

impl CalculationTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    fn nodes(&self) -> RwLockReadGuard<'_, IdVec<CalcId, Node>> {
        self.nodes.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn nodes_mut(&self) -> RwLockWriteGuard<'_, IdVec<CalcId, Node>> {
        self.nodes.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of nodes ever created in this tree.
    pub fn len(&self) -> usize {
        self.nodes().len()
    }

    /// True if no nodes have been created.
    pub fn is_empty(&self) -> bool {
        self.nodes().is_empty()
    }

    /// True if `id` belongs to this tree.
    pub fn contains(&self, id: CalcId) -> bool {
        self.nodes().try_get(id).is_some()
    }

    // STRUCTURE ////////////////

    /// Create a new root (parentless) node.
    pub fn create(&self, label: impl Into<String>) -> CalcId {
        let label = label.into();
        log::trace!("creating calculation '{label}'");
        self.nodes_mut().push(Node::new(label))
    }

    /// Create a new node and append it to `parent`'s children.
    pub fn create_child(&self, parent: CalcId, label: impl Into<String>) -> CalcId {
        let label = label.into();
        let mut nodes = self.nodes_mut();
        log::trace!("creating calculation '{label}' under '{}'", nodes.get(parent).label);
        let child = nodes.push(Node::new(label));
        nodes.get_mut(child).parent = Some(parent);
        nodes.get_mut(parent).children.push(child);
        child
    }

    /// Append `child` to `parent`'s children.
    ///
    /// Existing children of `parent` are kept. If `child` is currently attached
    /// elsewhere (or already under `parent`), it is detached first, so a node has
    /// at most one parent and appears at most once in any child list.
    pub fn add(&self, parent: CalcId, child: CalcId) -> Result<(), Error> {
        let mut nodes = self.nodes_mut();
        for id in [parent, child] {
            if nodes.try_get(id).is_none() {
                return Err(Error::UnknownNode(id));
            }
        }

        // walk up from the new parent; meeting `child` means it's an ancestor:
        let mut cursor = Some(parent);
        while let Some(id) = cursor {
            if id == child {
                return Err(Error::Cycle { parent, child });
            }
            cursor = nodes.get(id).parent;
        }

        detach_locked(&mut nodes, child);
        nodes.get_mut(child).parent = Some(parent);
        nodes.get_mut(parent).children.push(child);
        log::trace!(
            "attached '{}' under '{}'",
            nodes.get(child).label,
            nodes.get(parent).label
        );
        Ok(())
    }

    /// Detach `child` from its parent, returning the former parent.
    /// The child keeps its own children and counters.
    pub fn detach(&self, child: CalcId) -> Option<CalcId> {
        detach_locked(&mut self.nodes_mut(), child)
    }

    /// Label given to `id` at creation.
    pub fn label(&self, id: CalcId) -> String {
        self.nodes().get(id).label.clone()
    }

    /// Parent of `id`, if it is attached.
    pub fn parent(&self, id: CalcId) -> Option<CalcId> {
        self.nodes().get(id).parent
    }

    /// Children of `id` in registration order.
    pub fn children(&self, id: CalcId) -> Vec<CalcId> {
        self.nodes().get(id).children.clone()
    }

    /// The node whose counters `id` reports: follow first children down to a leaf.
    pub fn active(&self, id: CalcId) -> CalcId {
        active_locked(&self.nodes(), id)
    }

    // COUNTERS /////////////////

    /// Set this node's total and restart its count at zero.
    pub fn set_total_units(&self, id: CalcId, total: u64) {
        self.nodes().get(id).with_units(|u| u.set_total(total));
    }

    /// Add `n` completed units, saturating at the total.
    pub fn increment_completed_units(&self, id: CalcId, n: u64) {
        self.nodes().get(id).with_units(|u| u.increment(n));
    }

    /// Remove `n` completed units, saturating at zero.
    pub fn decrement_completed_units(&self, id: CalcId, n: u64) {
        self.nodes().get(id).with_units(|u| u.decrement(n));
    }

    /// This node's own counters, ignoring children.
    pub fn own_units(&self, id: CalcId) -> Units {
        self.nodes().get(id).with_units(|u| *u)
    }

    /// Displayed counters: those of the first child, recursively.
    /// Both values are read under one lock, so the pair is consistent.
    pub fn units(&self, id: CalcId) -> Units {
        let nodes = self.nodes();
        let active = active_locked(&nodes, id);
        nodes.get(active).with_units(|u| *u)
    }

    /// Displayed total units (see [`CalculationTree::units`]).
    pub fn total_units(&self, id: CalcId) -> u64 {
        self.units(id).total
    }

    /// Displayed completed units (see [`CalculationTree::units`]).
    pub fn completed_units(&self, id: CalcId) -> u64 {
        self.units(id).completed
    }

    /// Displayed progress in `[0.0, 1.0]`, from one consistent snapshot.
    pub fn progress(&self, id: CalcId) -> f64 {
        self.units(id).progress()
    }

    /// True if this node's *own* completed count equals its own total.
    pub fn is_completed(&self, id: CalcId) -> bool {
        self.own_units(id).is_completed()
    }
}

fn active_locked(nodes: &IdVec<CalcId, Node>, mut id: CalcId) -> CalcId {
    // `add` rejects cycles, so this always reaches a leaf.
    while let Some(&first) = nodes.get(id).children.first() {
        id = first;
    }
    id
}

fn detach_locked(nodes: &mut IdVec<CalcId, Node>, child: CalcId) -> Option<CalcId> {
    let parent = nodes.get_mut(child).parent.take()?;
    nodes.get_mut(parent).children.retain(|&c| c != child);
    Some(parent)
}
