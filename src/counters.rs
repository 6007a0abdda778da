use gxhash::{HashSet, HashSetExt};

use crate::node::{Child, NodeId, StackValue};
use crate::stack::SuffixStack;

/// Occupancy and sharing statistics for a stack's trees.
///
/// ```ignore
/// let counters = suffix_stack::counters::Counters::count_stack(&stack);
/// counters.print_histogram();
/// println!("sharing {:.2}", counters.sharing_ratio());
/// ```
pub struct Counters {
    /// Inner nodes visited at each bit-class, multiplicity included.
    nodes_by_class: Vec<usize>,
    /// Distinct inner nodes at each bit-class.
    distinct_by_class: Vec<usize>,
    leaves: usize,
    /// Nodes interned into the stack's own arena, reachable or not.
    arena_nodes: usize,
}

impl Counters {
    /// Walks every tree of `stack` and tallies nodes per bit-class,
    /// counting each shared subtree once for `distinct` and at every
    /// occurrence for the visit totals.
    pub fn count_stack<V: StackValue>(stack: &SuffixStack<'_, V>) -> Counters {
        let classes = stack.occupied_classes();
        let mut counters = Counters {
            nodes_by_class: vec![0; stack.class_count()],
            distinct_by_class: vec![0; stack.class_count()],
            leaves: 0,
            arena_nodes: stack.arena().len(),
        };
        let mut seen: HashSet<NodeId> = HashSet::new();
        for (bit, root) in classes {
            counters.visit(stack, root, bit, &mut seen);
        }
        counters
    }

    fn visit<V: StackValue>(
        &mut self,
        stack: &SuffixStack<'_, V>,
        tree: Child<V>,
        class: usize,
        seen: &mut HashSet<NodeId>,
    ) {
        if class == 0 {
            self.leaves += 1;
            return;
        }
        let id = tree.node_id();
        self.nodes_by_class[class] += 1;
        if seen.insert(id) {
            self.distinct_by_class[class] += 1;
        }
        let node = stack.arena().node(id);
        self.visit(stack, node.lhs, class - 1, seen);
        self.visit(stack, node.rhs, class - 1, seen);
    }

    pub fn total_nodes(&self) -> usize {
        self.nodes_by_class.iter().sum()
    }

    pub fn distinct_nodes(&self) -> usize {
        self.distinct_by_class.iter().sum()
    }

    pub fn leaves(&self) -> usize {
        self.leaves
    }

    pub fn arena_nodes(&self) -> usize {
        self.arena_nodes
    }

    /// Visited-to-distinct ratio; 1.0 means no structural sharing at
    /// all, higher means the interning is paying off.
    pub fn sharing_ratio(&self) -> f64 {
        if self.distinct_nodes() == 0 {
            return 1.0;
        }
        self.total_nodes() as f64 / self.distinct_nodes() as f64
    }

    pub fn print_histogram(&self) {
        println!("class\tnodes\tdistinct");
        for class in (1..self.nodes_by_class.len()).rev() {
            println!(
                "{}\t{}\t{}",
                class, self.nodes_by_class[class], self.distinct_by_class[class]
            );
        }
        println!(
            "TOTAL nodes: {}, distinct: {}, leaves: {}, arena: {}, sharing: {:.3}",
            self.total_nodes(),
            self.distinct_nodes(),
            self.leaves,
            self.arena_nodes,
            self.sharing_ratio()
        );
    }
}
