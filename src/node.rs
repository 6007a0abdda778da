use core::fmt;
use core::hash::Hash;

/// Values that can sit in the leaves of a stack tree.
///
/// Leaves are stored inline in child slots and flow through the intern
/// table, so they have to be cheap to copy and comparable by bits.
/// Anything pointer-sized or smaller qualifies; wider payloads belong
/// behind a handle the caller maintains on the side.
pub trait StackValue: Copy + Eq + Hash + fmt::Debug {}
impl<T: Copy + Eq + Hash + fmt::Debug> StackValue for T {}

/// The identifier of an interned node within an arena chain.
///
/// The high half carries the epoch of the arena that owns the node, the
/// low half its slot in that arena. Carrying the epoch costs a word of
/// comparison on resolution but means an id handed to the wrong arena
/// chain traps instead of silently reading another tree's node.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u64);

impl NodeId {
    pub(crate) fn new(epoch: u32, slot: u32) -> Self {
        NodeId((epoch as u64) << 32 | slot as u64)
    }
    pub(crate) fn epoch(self) -> u32 {
        (self.0 >> 32) as u32
    }
    pub(crate) fn slot(self) -> usize {
        self.0 as u32 as usize
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({}:{})", self.epoch(), self.slot())
    }
}

/// One child slot of a tree: either a link to an interned node or a
/// leaf value held inline.
///
/// Which variant a slot holds is implied by depth: at bit-class 0 both
/// slots of a node are leaves, above that both are node links. The tag
/// makes the invariant checkable rather than assumed.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Child<V> {
    Node(NodeId),
    Leaf(V),
}

impl<V: StackValue> Child<V> {
    /// Unwraps a leaf slot. Panics when called on a node link, which
    /// only happens if the depth accounting is broken.
    pub fn leaf(self) -> V {
        match self {
            Child::Leaf(v) => v,
            Child::Node(id) => panic!("expected a leaf, found inner node {:?}", id),
        }
    }

    pub(crate) fn node_id(self) -> NodeId {
        match self {
            Child::Node(id) => id,
            Child::Leaf(_) => unreachable!("leaf child at nonzero depth"),
        }
    }
}

/// An inner tree node: an ordered pair of children, each covering half
/// of the node's leaves. A node of bit-class b covers exactly 2^b
/// leaves, `lhs` the first half and `rhs` the second.
///
/// Nodes are immutable once interned; equality and hashing go over the
/// two child slots, which is what the intern table keys on.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Node<V> {
    pub lhs: Child<V>,
    pub rhs: Child<V>,
}

impl<V: StackValue> Node<V> {
    /// Selects a child by direction, `false` for `lhs` and `true` for `rhs`.
    #[inline]
    pub fn child(self, right: bool) -> Child<V> {
        if right {
            self.rhs
        } else {
            self.lhs
        }
    }
}
