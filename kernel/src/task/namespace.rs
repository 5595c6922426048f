//! Namespace forest: nested containment scopes for processes.
//!
//! A namespace *contains* itself and every namespace below it: a process
//! in an outer namespace can observe processes in all nested namespaces,
//! never the other way round.
//!
//! Nodes are written exactly once, when created, and are immutable after
//! that, so readers walk parent links without taking any lock. The forest
//! shape is validated at creation time instead of on every walk:
//! - a parent must already exist, so a child always has a higher index
//!   than its parent and no cycle can be built;
//! - depth is capped at `MAX_NS_DEPTH`, which bounds every walk.

use core::fmt;
use core::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use spin::Once;

use crate::config::{MAX_NS_DEPTH, NNAMESPACES};

/// Index of a namespace node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NsId(u32);

impl NsId {
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NsId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ns{}", self.0)
    }
}

/// One node of the forest.
#[derive(Debug)]
pub struct NsNode {
    id: NsId,
    parent: Option<NsId>,
    depth: u32,
    /// Next namespace-local pid (see `NsLocalResolver`).
    next_local_pid: AtomicU32,
}

impl NsNode {
    pub fn id(&self) -> NsId {
        self.id
    }

    pub fn parent(&self) -> Option<NsId> {
        self.parent
    }

    /// Distance from the root of this node's tree.
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Hand out the next namespace-local pid. The first process created in
    /// a namespace gets 1; `None` once the next one would not fit an `i32`.
    pub(crate) fn alloc_local_pid(&self) -> Option<u32> {
        self.next_local_pid
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |next| {
                (next <= i32::MAX as u32).then_some(next + 1)
            })
            .ok()
    }
}

/// Errors from `NamespaceTree::create`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NsError {
    /// All `NNAMESPACES` nodes are in use.
    TableFull,
    /// The requested parent has not been created.
    NoSuchParent(NsId),
    /// The new node would be deeper than `MAX_NS_DEPTH`.
    TooDeep,
}

impl fmt::Display for NsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NsError::TableFull => f.write_str("namespace table full"),
            NsError::NoSuchParent(id) => write!(f, "parent namespace {} does not exist", id),
            NsError::TooDeep => write!(f, "namespace nesting deeper than {}", MAX_NS_DEPTH),
        }
    }
}

/// Fixed-capacity namespace forest.
pub struct NamespaceTree {
    nodes: [Once<NsNode>; NNAMESPACES],
    /// Next unclaimed index.
    claimed: AtomicUsize,
}

impl NamespaceTree {
    pub const fn new() -> Self {
        Self {
            nodes: [const { Once::new() }; NNAMESPACES],
            claimed: AtomicUsize::new(0),
        }
    }

    /// Create a namespace, nested under `parent` or as a new root.
    pub fn create(&self, parent: Option<NsId>) -> Result<NsId, NsError> {
        let depth = match parent {
            None => 0,
            Some(p) => self.get(p).ok_or(NsError::NoSuchParent(p))?.depth + 1,
        };
        if depth > MAX_NS_DEPTH {
            return Err(NsError::TooDeep);
        }

        let index = self
            .claimed
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < NNAMESPACES).then_some(n + 1)
            })
            .map_err(|_| NsError::TableFull)?;

        let id = NsId(index as u32);
        self.nodes[index].call_once(|| NsNode {
            id,
            parent,
            depth,
            next_local_pid: AtomicU32::new(1),
        });
        klog::debug!("[ns] created {} (parent {:?}, depth {})", id, parent, depth);
        Ok(id)
    }

    /// Look up a published node.
    pub fn get(&self, id: NsId) -> Option<&NsNode> {
        self.nodes.get(id.index())?.get()
    }

    /// Does `outer` contain `inner`?
    ///
    /// Walks `inner` toward its root; zero steps count, so every namespace
    /// contains itself. Cost is O(depth).
    pub fn contains(&self, outer: NsId, inner: NsId) -> bool {
        if outer == inner {
            return true;
        }
        let mut current = self.get(inner).and_then(NsNode::parent);
        for _ in 0..MAX_NS_DEPTH {
            match current {
                Some(ns) if ns == outer => return true,
                Some(ns) => current = self.get(ns).and_then(NsNode::parent),
                None => return false,
            }
        }
        false
    }

    /// Number of namespaces created so far.
    pub fn len(&self) -> usize {
        self.claimed.load(Ordering::Acquire)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for NamespaceTree {
    fn default() -> Self {
        Self::new()
    }
}
