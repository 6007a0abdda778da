//! Pre-indexed strings for grafting onto a suffix stack.
//!
//! A stack of length S holds one perfect tree per set bit of S. To
//! append or compare a string of length N in logarithmic time, the
//! stack needs the string already decomposed into perfect trees. Not
//! just one decomposition either, but the decomposition for *every*
//! way the string can be divided between "trees that graft directly
//! onto the stack's low bits" and "leaves that get folded into a
//! carry".
//!
//! [TreeString] therefore stores N+1 [Split]s, one per division point.
//! Split k, addressed from the right end, holds two rows, each indexed
//! by bit-class with `None` at absent bits:
//!
//! - `right`: the perfect trees covering the *last* k leaves, smallest
//!   class covering the very end. This is the same shape a stack's own
//!   tree row has, so the two can be compared or copied slot by slot;
//! - `left`: the perfect trees covering the *first* N-k leaves,
//!   smallest class covering the earliest leaves, which is the order a
//!   carry chain consumes them.
//!
//! ## Construction
//!
//! All splits are built in one bottom-up pass over bit-classes. A
//! working row starts as the raw leaves; at class b every split whose
//! size has bit b set receives its class-b tree from the working row
//! (and its mirror split receives the symmetric tree from the other
//! end), then adjacent entries are paired through the arena to form the
//! class-(b+1) working row. Pairing interns every intermediate perfect
//! tree the string can produce at any alignment, so stack operations
//! later find all the ids they need without touching the arena again.
//!
//! Time and space are O(N log N): N+1 splits with at most one entry per
//! bit-class on each side.

use smallvec::SmallVec;

use crate::arena::TreeArena;
use crate::node::{Child, StackValue};

/// A row of perfect trees indexed by bit-class, `None` where the
/// corresponding bit is absent.
pub(crate) type TreeRow<V> = SmallVec<[Option<Child<V>>; 8]>;

/// One division of a string: `left` covers the leading leaves, `right`
/// the trailing ones.
pub struct Split<V> {
    pub(crate) left: TreeRow<V>,
    pub(crate) right: TreeRow<V>,
}

impl<V> Default for Split<V> {
    fn default() -> Self {
        Split {
            left: SmallVec::new(),
            right: SmallVec::new(),
        }
    }
}

/// A flat sequence preprocessed into every perfect-tree decomposition a
/// suffix stack can ask of it.
///
/// Built once against an arena, then usable for any number of
/// [append](crate::stack::SuffixStack::append) and
/// [has_suffix](crate::stack::SuffixStack::has_suffix) calls on stacks
/// sharing that arena (or an arena chained to it).
pub struct TreeString<V> {
    splits: Vec<Split<V>>,
}

impl<V: StackValue> TreeString<V> {
    /// Indexes `leaves` against `arena`.
    pub fn from_slice(arena: &TreeArena<'_, V>, leaves: &[V]) -> Self {
        let n = leaves.len();
        let mut splits: Vec<Split<V>> = (0..=n).map(|_| Split::default()).collect();
        if n == 0 {
            return TreeString { splits };
        }

        let mut paired: Vec<Child<V>> = leaves.iter().map(|&v| Child::Leaf(v)).collect();
        let mut bit = 0usize;
        loop {
            let bit_m = 1usize << bit;
            for sz in bit_m..=n {
                if sz & bit_m != 0 {
                    let offset = sz & (bit_m - 1);
                    splits[sz].left.push(Some(paired[offset]));
                    splits[n - sz]
                        .right
                        .push(Some(paired[paired.len() - 1 - offset]));
                } else {
                    splits[sz].left.push(None);
                    splits[n - sz].right.push(None);
                }
            }
            if bit_m << 1 > n {
                break;
            }
            let pairings = paired.len() - bit_m;
            for i in 0..pairings {
                paired[i] = Child::Node(arena.intern(paired[i], paired[i + bit_m]));
            }
            paired.truncate(pairings);
            bit += 1;
        }
        TreeString { splits }
    }

    /// A one-leaf string. Needs no arena: a single leaf is its own
    /// decomposition on either side of both splits.
    pub fn single(value: V) -> Self {
        let leaf = Child::Leaf(value);
        let mut all = Split::default();
        let mut none = Split::default();
        all.right.push(Some(leaf));
        none.left.push(Some(leaf));
        TreeString {
            splits: vec![all, none],
        }
    }

    /// Number of leaves.
    pub fn len(&self) -> usize {
        self.splits.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The split placing the last `on_right` leaves on the right side.
    pub(crate) fn split(&self, on_right: usize) -> &Split<V> {
        &self.splits[self.len() - on_right]
    }
}
