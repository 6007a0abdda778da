use std::cell::RefCell;
use std::sync::atomic::{AtomicU32, Ordering};

use gxhash::{HashMap, HashMapExt};

use crate::node::{Child, Node, NodeId, StackValue};

static NEXT_EPOCH: AtomicU32 = AtomicU32::new(0);

/// A hash-consing store for tree nodes.
///
/// Every distinct `(lhs, rhs)` pair exists at most once per arena
/// chain, so two trees are equal exactly when their [NodeId]s are
/// equal. All stack and string operations rely on that: suffix checks
/// compare ids, never tree contents.
///
/// An arena may be created with a parent. Lookups walk the whole parent
/// chain and return the ancestor's canonical id when one exists;
/// insertions always go into the arena they were requested on. This
/// supports scratch arenas for short-lived indexing work that can be
/// dropped wholesale without growing a long-lived shared arena.
///
/// Nodes are never freed individually; they live as long as their
/// arena. Interning goes through interior mutability so strings and
/// stacks can share one arena through plain references, which also
/// means an arena is single-threaded by construction.
pub struct TreeArena<'p, V> {
    epoch: u32,
    parent: Option<&'p TreeArena<'p, V>>,
    inner: RefCell<Inner<V>>,
}

struct Inner<V> {
    slots: Vec<Node<V>>,
    interned: HashMap<Node<V>, u32>,
}

impl<'p, V: StackValue> TreeArena<'p, V> {
    /// Creates a new root arena.
    pub fn new() -> Self {
        Self::construct(None)
    }

    /// Creates an arena that consults `parent` on lookup but interns
    /// new nodes into itself.
    pub fn with_parent(parent: &'p TreeArena<'p, V>) -> Self {
        Self::construct(Some(parent))
    }

    fn construct(parent: Option<&'p TreeArena<'p, V>>) -> Self {
        TreeArena {
            epoch: NEXT_EPOCH.fetch_add(1, Ordering::Relaxed),
            parent,
            inner: RefCell::new(Inner {
                slots: Vec::new(),
                interned: HashMap::new(),
            }),
        }
    }

    /// Returns the canonical id for the node `(lhs, rhs)`, interning it
    /// into this arena if no arena in the chain holds it yet.
    pub fn intern(&self, lhs: Child<V>, rhs: Child<V>) -> NodeId {
        let node = Node { lhs, rhs };
        let mut ancestor = self.parent;
        while let Some(arena) = ancestor {
            if let Some(&slot) = arena.inner.borrow().interned.get(&node) {
                return NodeId::new(arena.epoch, slot);
            }
            ancestor = arena.parent;
        }
        let mut inner = self.inner.borrow_mut();
        if let Some(&slot) = inner.interned.get(&node) {
            return NodeId::new(self.epoch, slot);
        }
        let slot = inner.slots.len() as u32;
        inner.slots.push(node);
        inner.interned.insert(node, slot);
        NodeId::new(self.epoch, slot)
    }

    /// Resolves an id to its node, walking the parent chain to the
    /// arena whose epoch matches.
    ///
    /// Panics if the id belongs to no arena in this chain. Feeding a
    /// stack or cursor an id interned elsewhere is a caller bug, and
    /// the epoch check turns it into a trap rather than a wrong answer.
    pub fn node(&self, id: NodeId) -> Node<V> {
        let mut arena = self;
        loop {
            if arena.epoch == id.epoch() {
                return arena.inner.borrow().slots[id.slot()];
            }
            match arena.parent {
                Some(parent) => arena = parent,
                None => panic!("{:?} does not belong to this arena chain", id),
            }
        }
    }

    /// Number of nodes interned into this arena (excluding ancestors).
    pub fn len(&self) -> usize {
        self.inner.borrow().slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
