pub mod arena;
pub mod counters;
pub mod cursor;
pub mod fuzzer;
pub mod node;
pub mod stack;
pub mod tree_string;

/// Number of bits needed to represent `x`; 0 for 0.
///
/// Tree rows are indexed by bit-class, so this is also the row length
/// for a stack or string of a given size.
pub(crate) fn bit_width(x: usize) -> usize {
    (usize::BITS - x.leading_zeros()) as usize
}
