use smallvec::SmallVec;

use crate::arena::TreeArena;
use crate::bit_width;
use crate::cursor::RevIter;
use crate::node::{Child, StackValue};
use crate::tree_string::{TreeRow, TreeString};

/// Returns how many trailing elements of a stack of length `stack_len`
/// line up, tree for tree, with the end of a string of length
/// `query_len`.
///
/// This is the largest value not exceeding `query_len` that agrees
/// with `stack_len` on the low bits. The aligned part can be matched
/// or planted slot by slot against the stack's smallest trees; the
/// remainder has to go through a carry (append) or a borrow
/// (has_suffix, truncate) against the next larger stack tree.
pub(crate) fn aligned_suffix_len(stack_len: usize, query_len: usize) -> usize {
    let mask = (1usize << bit_width(query_len)) - 1;
    let masked = stack_len & mask;
    if masked <= query_len {
        masked
    } else {
        stack_len & (mask >> 1)
    }
}

/// A stack with logarithmic-time append, truncate, and suffix check.
///
/// The stack is stored as at most one interned perfect tree per set
/// bit of its length, smallest class covering the newest elements.
/// Appending a pre-indexed [TreeString] mirrors binary addition on the
/// length with tree slots as digits; truncation mirrors subtraction by
/// borrowing. Suffix checks reuse the truncation decomposition without
/// mutating anything: they compare canonical node ids, which the
/// shared [TreeArena] guarantees coincide exactly for equal trees.
///
/// ```
/// use suffix_stack::arena::TreeArena;
/// use suffix_stack::stack::SuffixStack;
/// use suffix_stack::tree_string::TreeString;
///
/// let arena = TreeArena::new();
/// let mut stack = SuffixStack::new(&arena);
/// stack.append(&TreeString::from_slice(&arena, &[1, 1, 2, 3]));
/// assert!(stack.has_suffix(&TreeString::from_slice(&arena, &[2, 3])));
/// assert_eq!(stack.back(), Some(3));
/// stack.pop(2);
/// assert_eq!(stack.rev_iter().collect::<Vec<_>>(), vec![1, 1]);
/// ```
pub struct SuffixStack<'a, V: StackValue> {
    arena: &'a TreeArena<'a, V>,
    trees: TreeRow<V>,
    len: usize,
}

impl<'a, V: StackValue> SuffixStack<'a, V> {
    /// Creates an empty stack interning into `arena`. Strings fed to
    /// this stack must be indexed against the same arena (or one
    /// chained to it).
    pub fn new(arena: &'a TreeArena<'a, V>) -> Self {
        SuffixStack {
            arena,
            trees: SmallVec::new(),
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub(crate) fn arena(&self) -> &'a TreeArena<'a, V> {
        self.arena
    }

    /// The root of the occupied class-`bit` tree.
    pub(crate) fn tree(&self, bit: usize) -> Child<V> {
        self.trees[bit].unwrap()
    }

    /// Number of bit-classes the tree row currently spans.
    pub(crate) fn class_count(&self) -> usize {
        self.trees.len()
    }

    /// The occupied `(bit-class, root)` pairs, smallest class first.
    pub(crate) fn occupied_classes(&self) -> Vec<(usize, Child<V>)> {
        self.trees
            .iter()
            .enumerate()
            .filter_map(|(bit, slot)| slot.map(|tree| (bit, tree)))
            .collect()
    }

    /// Tests whether the stack ends with the contents of `string`.
    ///
    /// O(log(len) + log(string.len())) id comparisons and descents; no
    /// allocation, no interning.
    pub fn has_suffix(&self, string: &TreeString<V>) -> bool {
        if self.len < string.len() {
            return false;
        }
        if string.is_empty() {
            return true;
        }

        let on_right = aligned_suffix_len(self.len, string.len());
        let on_left = string.len() - on_right;
        let split = string.split(on_right);

        // the aligned trees must coincide slot by slot, nulls included
        if self.trees[..split.right.len()] != split.right[..] {
            return false;
        }
        if on_left == 0 {
            return true;
        }

        // descend the smallest stack tree above the aligned region,
        // peeling unused right halves until it spans exactly the
        // remaining leaves
        let mut borrowed_bit = (self.len - on_right).trailing_zeros() as usize;
        let mut borrowed = self.trees[borrowed_bit].unwrap();
        let left_len = split.left.len();
        while borrowed_bit > left_len {
            borrowed = self.arena.node(borrowed.node_id()).rhs;
            borrowed_bit -= 1;
        }
        for left_bit in (0..left_len).rev() {
            let node = self.arena.node(borrowed.node_id());
            if on_left & (1 << left_bit) != 0 {
                if split.left[left_bit] != Some(node.rhs) {
                    return false;
                }
                borrowed = node.lhs;
            } else {
                borrowed = node.rhs;
            }
        }
        true
    }

    /// Appends the contents of `string` to the top of the stack in
    /// O(log(len) + log(string.len())) time.
    pub fn append(&mut self, string: &TreeString<V>) {
        if string.is_empty() {
            return;
        }

        let new_len = self.len + string.len();
        let on_right = aligned_suffix_len(new_len, string.len());
        let on_left = string.len() - on_right;
        let split = string.split(on_right);

        self.trees.resize(bit_width(new_len), None);

        if on_left > 0 {
            // fold the unaligned leading trees into the stack exactly
            // like adding on_left to the length: a set bit takes a tree
            // from the string as the new right half, a clear bit takes
            // the occupied stack slot as the new left half
            let mut bit_no = on_left.trailing_zeros() as usize;
            let mut constructing = self.trees[bit_no].take().unwrap();
            let mut bit = 1usize << bit_no;
            while bit <= on_left {
                if on_left & bit != 0 {
                    let rhs = split.left[bit_no].unwrap();
                    constructing = Child::Node(self.arena.intern(constructing, rhs));
                } else {
                    let lhs = self.trees[bit_no].take().unwrap();
                    constructing = Child::Node(self.arena.intern(lhs, constructing));
                }
                bit_no += 1;
                bit <<= 1;
            }
            // ride the carry up through any further occupied slots
            while let Some(lhs) = self.trees[bit_no].take() {
                constructing = Child::Node(self.arena.intern(lhs, constructing));
                bit_no += 1;
            }
            self.trees[bit_no] = Some(constructing);
        }

        // the aligned trailing trees drop straight into empty slots
        let mut remaining = on_right;
        let mut slot = 0usize;
        while remaining != 0 {
            let step = remaining.trailing_zeros() as usize;
            slot += step;
            debug_assert!(self.trees[slot].is_none());
            self.trees[slot] = split.right[slot];
            slot += 1;
            remaining >>= step + 1;
        }

        self.len = new_len;
    }

    /// Shrinks the stack to its first `new_len` elements in
    /// O(log(len)) time. Panics if `new_len` exceeds the current
    /// length; use [pop](Self::pop) to remove with clamping.
    ///
    /// Never interns: the kept prefix is made of left descendants of
    /// existing trees, and the discarded halves just become
    /// unreferenced in the arena.
    pub fn truncate(&mut self, new_len: usize) {
        assert!(
            new_len <= self.len,
            "truncate({}) on a stack of length {}",
            new_len,
            self.len
        );
        let to_remove = self.len - new_len;
        let on_right = aligned_suffix_len(self.len, to_remove);
        let on_left = to_remove - on_right;

        // aligned trees vanish whole, like clearing low bits
        let mut remaining = on_right;
        let mut slot = 0usize;
        while remaining != 0 {
            let step = remaining.trailing_zeros() as usize;
            slot += step;
            debug_assert!(self.trees[slot].is_some());
            self.trees[slot] = None;
            slot += 1;
            remaining >>= step + 1;
        }

        if on_left > 0 {
            // borrow from the next occupied slot: walking down the
            // borrowed tree, a kept bit deposits the left half back
            // into the stack and continues right, a dropped bit
            // continues left
            let to_deconstruct = (self.len - on_right).trailing_zeros() as usize;
            let to_remain = (1usize << to_deconstruct) - on_left;
            let mut splitting = self.trees[to_deconstruct].take().unwrap();
            for bit_no in (0..to_deconstruct).rev() {
                let node = self.arena.node(splitting.node_id());
                if to_remain & (1 << bit_no) != 0 {
                    self.trees[bit_no] = Some(node.lhs);
                    splitting = node.rhs;
                } else {
                    splitting = node.lhs;
                }
            }
        }

        self.len = new_len;
        self.trees.truncate(bit_width(self.len));
    }

    /// Removes the newest `count` elements, clamping at empty.
    pub fn pop(&mut self, count: usize) {
        self.truncate(self.len.saturating_sub(count));
    }

    /// The newest element, or `None` on an empty stack. O(log(len)).
    pub fn back(&self) -> Option<V> {
        if self.len == 0 {
            return None;
        }
        let bit = self.len.trailing_zeros() as usize;
        let mut tree = self.trees[bit].unwrap();
        for _ in 0..bit {
            tree = self.arena.node(tree.node_id()).rhs;
        }
        Some(tree.leaf())
    }

    /// Iterates the stack's values newest to oldest.
    pub fn rev_iter(&self) -> RevIter<'_, 'a, V> {
        RevIter::new(self)
    }

    /// The stack's contents in sequence order. O(len); intended for
    /// diagnostics and tests, not for the hot path.
    pub fn to_vec(&self) -> Vec<V> {
        let mut values: Vec<V> = self.rev_iter().collect();
        values.reverse();
        values
    }

    /// Audits the slot/length correspondence.
    #[cfg(test)]
    pub(crate) fn check_shape(&self) {
        assert_eq!(self.trees.len(), bit_width(self.len));
        for (bit, slot) in self.trees.iter().enumerate() {
            assert_eq!(
                slot.is_some(),
                self.len & (1 << bit) != 0,
                "slot {} out of step with length {}",
                bit,
                self.len
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{aligned_suffix_len, SuffixStack};
    use crate::arena::TreeArena;
    use crate::bit_width;
    use crate::tree_string::TreeString;

    #[test]
    fn aligned_suffix_len_laws() {
        for stack_len in 0..512usize {
            for query_len in 0..=stack_len {
                let aligned = aligned_suffix_len(stack_len, query_len);
                assert!(aligned <= query_len);
                if query_len > 0 {
                    // always congruent to the stack length below the
                    // query's top bit
                    let low = (1usize << (bit_width(query_len) - 1)) - 1;
                    assert_eq!(aligned & low, stack_len & low);
                }
                // and equal to the full low bitfield whenever that fits
                let mask = (1usize << bit_width(query_len)) - 1;
                if stack_len & mask <= query_len {
                    assert_eq!(aligned, stack_len & mask);
                }
            }
        }
    }

    #[test]
    fn aligned_suffix_len_examples() {
        assert_eq!(aligned_suffix_len(0, 0), 0);
        assert_eq!(aligned_suffix_len(5, 2), 1);
        assert_eq!(aligned_suffix_len(5, 5), 5);
        assert_eq!(aligned_suffix_len(6, 3), 2);
        assert_eq!(aligned_suffix_len(7, 4), 3);
        assert_eq!(aligned_suffix_len(8, 3), 0);
        assert_eq!(aligned_suffix_len(10, 6), 2);
    }

    #[test]
    fn append_keeps_one_tree_per_bit() {
        let arena = TreeArena::new();
        let mut stack = SuffixStack::new(&arena);
        let chunk: Vec<i32> = (0..5).collect();
        let string = TreeString::from_slice(&arena, &chunk);
        for round in 1..=20 {
            stack.append(&string);
            assert_eq!(stack.len(), round * 5);
            stack.check_shape();
        }
    }

    #[test]
    fn truncate_hits_every_length() {
        let arena = TreeArena::new();
        let values: Vec<i32> = (0..100).collect();
        for keep in 0..=100usize {
            let mut stack = SuffixStack::new(&arena);
            stack.append(&TreeString::from_slice(&arena, &values));
            stack.truncate(keep);
            stack.check_shape();
            assert_eq!(stack.to_vec(), values[..keep]);
            assert_eq!(stack.back(), keep.checked_sub(1).map(|i| values[i]));
        }
    }

    #[test]
    fn truncate_is_idempotent() {
        let arena = TreeArena::new();
        let mut stack = SuffixStack::new(&arena);
        stack.append(&TreeString::from_slice(&arena, &(0..37).collect::<Vec<i32>>()));
        stack.truncate(21);
        let once = stack.to_vec();
        stack.truncate(21);
        stack.check_shape();
        assert_eq!(stack.to_vec(), once);
    }

    #[test]
    #[should_panic(expected = "truncate(9) on a stack of length 3")]
    fn truncate_cannot_grow() {
        let arena = TreeArena::new();
        let mut stack = SuffixStack::new(&arena);
        stack.append(&TreeString::from_slice(&arena, &[1, 2, 3]));
        stack.truncate(9);
    }

    #[test]
    fn append_then_pop_restores() {
        let arena = TreeArena::new();
        let mut stack = SuffixStack::new(&arena);
        stack.append(&TreeString::from_slice(&arena, &(0..11).collect::<Vec<i32>>()));
        let before = stack.to_vec();

        let extra = TreeString::from_slice(&arena, &[7, 7, 7, 7, 7, 7, 7]);
        stack.append(&extra);
        assert_eq!(stack.len(), 18);
        stack.pop(extra.len());
        stack.check_shape();
        assert_eq!(stack.to_vec(), before);
    }

    #[test]
    fn pop_clamps_at_empty() {
        let arena = TreeArena::new();
        let mut stack = SuffixStack::new(&arena);
        stack.append(&TreeString::from_slice(&arena, &[4, 5, 6]));
        stack.pop(1000);
        assert!(stack.is_empty());
        assert_eq!(stack.back(), None);
        stack.check_shape();
    }

    #[test]
    fn suffix_checks_at_every_boundary() {
        let arena = TreeArena::new();
        let values: Vec<i32> = (0..50).map(|i| i % 4).collect();
        let mut stack = SuffixStack::new(&arena);
        stack.append(&TreeString::from_slice(&arena, &values));

        for take in 0..=values.len() {
            let tail = TreeString::from_slice(&arena, &values[values.len() - take..]);
            assert!(stack.has_suffix(&tail), "length-{} suffix rejected", take);
        }

        // a single altered element defeats the check at any length
        for take in 1..=values.len() {
            let mut altered = values[values.len() - take..].to_vec();
            altered[0] += 1;
            let probe = TreeString::from_slice(&arena, &altered);
            assert!(!stack.has_suffix(&probe), "altered length-{} suffix accepted", take);
        }
    }

    #[test]
    fn oversized_suffix_rejected() {
        let arena = TreeArena::new();
        let mut stack = SuffixStack::new(&arena);
        stack.append(&TreeString::from_slice(&arena, &[1, 2]));
        let longer = TreeString::from_slice(&arena, &[0, 1, 2]);
        assert!(!stack.has_suffix(&longer));
    }

    #[test]
    fn empty_suffix_always_matches() {
        let arena = TreeArena::new();
        let empty = TreeString::from_slice(&arena, &[]);
        let mut stack = SuffixStack::new(&arena);
        assert!(stack.has_suffix(&empty));
        stack.append(&TreeString::from_slice(&arena, &[9]));
        assert!(stack.has_suffix(&empty));
    }

    #[test]
    fn scratch_arena_strings_interoperate() {
        let shared = TreeArena::new();
        let mut stack = SuffixStack::new(&shared);
        stack.append(&TreeString::from_slice(&shared, &(0..9).collect::<Vec<i32>>()));

        // a probe indexed in a scratch arena chained to the shared one
        // still resolves, and equal trees still share ids
        let scratch = TreeArena::with_parent(&shared);
        let probe = TreeString::from_slice(&scratch, &[5, 6, 7, 8]);
        assert!(stack.has_suffix(&probe));
        let miss = TreeString::from_slice(&scratch, &[6, 6, 7, 8]);
        assert!(!stack.has_suffix(&miss));
    }
}
