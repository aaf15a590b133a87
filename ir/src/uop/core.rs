//! Core UOp struct and graph traversal.

use std::collections::HashSet;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use smallvec::SmallVec;

use crate::op::{Op, OpKey};
use tessel_dtype::DType;

static NEXT_ID: AtomicU64 = AtomicU64::new(0);

/// A node in the IR value DAG.
///
/// Nodes are immutable once built; rewrites create replacement nodes and the
/// engine links originals to results. The stable `id` gives identity-based
/// hashing without touching the operand graph.
pub struct UOp {
    /// Unique stable id for this node instance.
    pub id: u64,
    pub(crate) op: Op,
    pub(crate) dtype: DType,
}

impl std::fmt::Debug for UOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Children are printed as kinds only: a full recursive print of a
        // DAG repeats shared subgraphs exponentially.
        f.debug_struct("UOp")
            .field("id", &self.id)
            .field("kind", &OpKey::from_op(&self.op))
            .field("dtype", &self.dtype)
            .field("sources", &self.op.sources().iter().map(|s| s.id).collect::<Vec<_>>())
            .finish()
    }
}

/// Wrapper for `Arc<UOp>` that implements Hash and Eq on the stable id, for
/// use as a map key in rewrite caches and side tables.
#[derive(Clone)]
pub struct UOpKey(pub Arc<UOp>);

impl std::fmt::Debug for UOpKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "UOpKey(id={})", self.0.id)
    }
}

impl PartialEq for UOpKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for UOpKey {}

impl Hash for UOpKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

impl UOp {
    /// Create a node. Constructors in [`crate::uop::constructors`] validate
    /// operands before calling this.
    pub fn new(op: Op, dtype: DType) -> Arc<Self> {
        Arc::new(Self { id: NEXT_ID.fetch_add(1, Ordering::Relaxed), op, dtype })
    }

    pub fn op(&self) -> &Op {
        &self.op
    }

    pub fn dtype(&self) -> DType {
        self.dtype.clone()
    }

    pub fn key(&self) -> OpKey {
        OpKey::from_op(&self.op)
    }

    /// Operand nodes in canonical order.
    pub fn sources(&self) -> SmallVec<[Arc<UOp>; 4]> {
        self.op.sources()
    }

    /// Rebuild this node with replacement operands (same op kind, same
    /// dtype). Returns `self` when there are no operands to replace.
    pub fn with_sources(self: &Arc<Self>, new_srcs: Vec<Arc<UOp>>) -> Arc<Self> {
        if new_srcs.is_empty() && self.op.sources().is_empty() {
            return self.clone();
        }
        Self::new(self.op.with_sources(&new_srcs), self.dtype.clone())
    }

    /// Static dimensions when this value is a ranked tensor or descriptor.
    pub fn dims(&self) -> Option<&[i64]> {
        self.dtype.dims()
    }

    /// Every node reachable from `self`, children before parents, each once.
    pub fn toposort(self: &Arc<Self>) -> Vec<Arc<UOp>> {
        let mut order = Vec::new();
        let mut visited: HashSet<u64> = HashSet::new();
        // (node, children_pushed)
        let mut stack: Vec<(Arc<UOp>, bool)> = vec![(self.clone(), false)];

        while let Some((node, children_pushed)) = stack.pop() {
            if children_pushed {
                order.push(node);
                continue;
            }
            if !visited.insert(node.id) {
                continue;
            }
            let sources = node.sources();
            stack.push((node, true));
            for child in sources.iter().rev() {
                if !visited.contains(&child.id) {
                    stack.push((child.clone(), false));
                }
            }
        }
        order
    }
}
