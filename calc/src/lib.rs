//! Hierarchical progress tracking.
//!
//! A [`CalculationTree`] is an arena of calculation nodes, each representing
//! one unit of observable work. Nodes are created when an algorithm step
//! begins and can be nested under the node of the enclosing step. Counters are
//! updated by the worker running the step while a poller reads them, so every
//! accessor is safe to call from any thread.
//!
//! A node with children reports the counters of its *first* child, recursively:
//! nested work is assumed to be sequential, and the active sub-task is kept in
//! the first child slot. [`CalculationTree::is_completed`] is the exception and
//! always looks at the node's own counters.
//!
//! [`Calculation`] bundles a shared tree with one node id, and is the handle
//! algorithms and pollers normally work with.

mod id;
pub use id::CalcId;

mod units;
pub use units::Units;

mod tree;
pub use tree::CalculationTree;

mod calculation;
pub use calculation::Calculation;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Calculation {0:?} does not belong to this tree")]
    UnknownNode(CalcId),
    #[error("Cannot add calculation {child:?} under {parent:?}: it is an ancestor of (or equal to) its new parent")]
    Cycle { parent: CalcId, child: CalcId },
    #[error("Cannot add a calculation from a different tree")]
    ForeignTree,
}
