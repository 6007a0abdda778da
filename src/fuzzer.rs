//! Random workload generation for exercising the tree-backed stack
//! against a flat reference implementation.
//!
//! The flat [VecStack] is the behavioral oracle: every operation is a
//! one-liner over a `Vec`, linear where the tree stack is logarithmic.
//! [random_op] draws the next step of a workload (pops, appends of
//! random runs, and suffix probes sampled from the oracle's own tail)
//! so a driver can mirror the same step onto both implementations and
//! compare.

use rand::Rng;
use rand_distr::{Distribution, Uniform};

use crate::node::StackValue;

/// Flat reference stack. Append, truncate, and suffix checks are
/// linear scans over a `Vec`; correct by inspection, which is the
/// whole point.
#[derive(Default, Clone)]
pub struct VecStack<V> {
    values: Vec<V>,
}

impl<V: StackValue> VecStack<V> {
    pub fn new() -> Self {
        VecStack { values: Vec::new() }
    }

    pub fn has_suffix(&self, suffix: &[V]) -> bool {
        suffix.len() <= self.values.len()
            && self.values[self.values.len() - suffix.len()..] == *suffix
    }

    pub fn append(&mut self, suffix: &[V]) {
        self.values.extend_from_slice(suffix);
    }

    pub fn truncate(&mut self, len: usize) {
        self.values.truncate(len);
    }

    pub fn pop(&mut self, count: usize) {
        let keep = self.values.len().saturating_sub(count);
        self.truncate(keep);
    }

    pub fn back(&self) -> Option<V> {
        self.values.last().copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn rev_iter(&self) -> impl Iterator<Item = V> + '_ {
        self.values.iter().rev().copied()
    }

    pub fn values(&self) -> &[V] {
        &self.values
    }
}

/// Shape of a generated workload.
pub struct WorkloadCfg {
    /// Upper bound (inclusive) on the length of one appended run.
    pub max_push: usize,
    /// Pop counts are a random fraction of the stack divided by this.
    pub pop_ratio: usize,
    /// Appended values are drawn from `0..value_limit`; a small
    /// alphabet keeps the arena sharing realistic.
    pub value_limit: i32,
}

impl Default for WorkloadCfg {
    fn default() -> Self {
        WorkloadCfg {
            max_push: 1024,
            pop_ratio: 2,
            value_limit: 128,
        }
    }
}

/// One step of a random workload.
#[derive(Debug, Clone)]
pub enum Op {
    /// Remove this many of the newest elements.
    Pop(usize),
    /// Append this run.
    Append(Vec<i32>),
    /// Probe whether this run is a suffix. Usually sampled from the
    /// oracle's genuine tail, sometimes perturbed so negative answers
    /// get exercised too.
    Check(Vec<i32>),
}

/// Draws the next workload step, uniform over the three operations.
/// Pops and probes fall back to appends while the stack is empty.
pub fn random_op<R: Rng>(rng: &mut R, cfg: &WorkloadCfg, oracle: &VecStack<i32>) -> Op {
    let kind = rng.random_range(0..3u32);
    if !oracle.is_empty() && kind == 0 {
        let count = rng.random_range(0..=oracle.len()) / cfg.pop_ratio;
        return Op::Pop(count);
    }
    if !oracle.is_empty() && kind == 2 {
        let count = rng.random_range(0..=oracle.len());
        let mut probe = oracle.values()[oracle.len() - count..].to_vec();
        if !probe.is_empty() && rng.random_range(0..4u32) == 0 {
            let at = rng.random_range(0..probe.len());
            probe[at] ^= 1;
        }
        return Op::Check(probe);
    }
    let count = rng.random_range(0..=cfg.max_push);
    let value = Uniform::try_from(0..cfg.value_limit).unwrap();
    Op::Append((0..count).map(|_| value.sample(rng)).collect())
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::{random_op, Op, VecStack, WorkloadCfg};
    use crate::arena::TreeArena;
    use crate::stack::SuffixStack;
    use crate::tree_string::TreeString;

    #[test]
    fn vec_stack_oracle_basics() {
        let mut stack = VecStack::new();
        assert!(stack.is_empty());
        assert!(stack.has_suffix(&[]));
        assert!(!stack.has_suffix(&[1]));

        stack.append(&[1, 2, 3, 4]);
        assert_eq!(stack.len(), 4);
        assert_eq!(stack.back(), Some(4));
        assert!(stack.has_suffix(&[3, 4]));
        assert!(!stack.has_suffix(&[2, 4]));

        stack.pop(2);
        assert_eq!(stack.rev_iter().collect::<Vec<_>>(), vec![2, 1]);
        stack.truncate(0);
        assert_eq!(stack.back(), None);
        stack.pop(5);
        assert!(stack.is_empty());
    }

    fn mirrored_run(seed: u64, steps: usize, cfg: &WorkloadCfg) {
        let mut rng = StdRng::seed_from_u64(seed);
        let arena = TreeArena::new();
        let mut stack = SuffixStack::new(&arena);
        let mut oracle = VecStack::new();

        for step in 0..steps {
            match random_op(&mut rng, cfg, &oracle) {
                Op::Pop(count) => {
                    stack.pop(count);
                    oracle.pop(count);
                }
                Op::Append(values) => {
                    let string = TreeString::from_slice(&arena, &values);
                    stack.append(&string);
                    oracle.append(&values);
                }
                Op::Check(probe) => {
                    let string = TreeString::from_slice(&arena, &probe);
                    assert_eq!(
                        stack.has_suffix(&string),
                        oracle.has_suffix(&probe),
                        "suffix divergence at step {} on probe of length {}",
                        step,
                        probe.len()
                    );
                }
            }
            assert_eq!(stack.len(), oracle.len(), "length divergence at step {}", step);
            assert_eq!(stack.back(), oracle.back(), "back divergence at step {}", step);
            if step % 128 == 0 {
                assert!(stack.rev_iter().eq(oracle.rev_iter()));
            }
        }
        assert!(stack.rev_iter().eq(oracle.rev_iter()));
    }

    #[test]
    fn randomised_against_vec_stack() {
        let cfg = WorkloadCfg {
            max_push: 256,
            ..WorkloadCfg::default()
        };
        mirrored_run(0, 1024, &cfg);
    }

    #[test]
    fn randomised_short_runs_heavy_pops() {
        let cfg = WorkloadCfg {
            max_push: 9,
            pop_ratio: 1,
            value_limit: 3,
        };
        mirrored_run(7, 2048, &cfg);
    }

    #[test]
    fn randomised_long_runs() {
        let cfg = WorkloadCfg {
            max_push: 700,
            pop_ratio: 4,
            value_limit: 2,
        };
        mirrored_run(42, 256, &cfg);
    }
}
