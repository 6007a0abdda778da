//! Randomized comparison harness for the suffix stack.
//!
//! Mirrors a random workload onto the tree-backed stack and the flat
//! reference stack, checking agreement at every step and accumulating
//! per-operation wall-clock totals for both sides.
//!
//! Configured through the environment: `RANDOM_COUNT` ops, `MAX_PUSH`
//! run length, `POP_RATIO`, `RANDOM_SEED`, plus `PRINT_OPS` /
//! `PRINT_VECS` for tracing and `NO_LOG_CONFIG` to silence the
//! settings echo.
//!
//! Tip: pipe the output through `column -s $'\t' -t` for aligned tables.

use std::collections::BTreeMap;
use std::hint::black_box;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::SeedableRng;

use suffix_stack::arena::TreeArena;
use suffix_stack::counters::Counters;
use suffix_stack::fuzzer::{random_op, Op, VecStack, WorkloadCfg};
use suffix_stack::stack::SuffixStack;
use suffix_stack::tree_string::TreeString;

struct Config {
    print_ops: bool,
    print_vecs: bool,
    max_push: usize,
    pop_ratio: usize,
    random_count: usize,
    seed: u64,
}

impl Config {
    fn from_env() -> Self {
        let quiet = env_flag("NO_LOG_CONFIG");
        Config {
            print_ops: env_flag("PRINT_OPS"),
            print_vecs: env_flag("PRINT_VECS"),
            max_push: env_integer("MAX_PUSH", 1024, quiet) as usize,
            pop_ratio: env_integer("POP_RATIO", 2, quiet) as usize,
            random_count: env_integer("RANDOM_COUNT", 1 << 10, quiet) as usize,
            seed: env_integer("RANDOM_SEED", 0, quiet),
        }
    }
}

fn env_flag(name: &str) -> bool {
    std::env::var_os(name).is_some()
}

fn env_integer(name: &str, default: u64, quiet: bool) -> u64 {
    match std::env::var(name) {
        Ok(text) => {
            let value = text
                .parse()
                .unwrap_or_else(|_| panic!("{} must be an integer, got {:?}", name, text));
            if !quiet {
                println!("{}={}", name, value);
            }
            value
        }
        Err(_) => default,
    }
}

#[derive(Default, Clone, Copy)]
struct OpTotal {
    duration: Duration,
    count: usize,
}

/// Accumulates wall-clock time per operation tag.
#[derive(Default)]
struct CumulativeTimer {
    totals: BTreeMap<&'static str, OpTotal>,
}

impl CumulativeTimer {
    fn time<R>(&mut self, tag: &'static str, f: impl FnOnce() -> R) -> R {
        let start = Instant::now();
        let ret = black_box(f());
        let elapsed = start.elapsed();
        let total = self.totals.entry(tag).or_default();
        total.duration += elapsed;
        total.count += 1;
        ret
    }

    fn print(&self) {
        println!("Operation\tTime\tCount");
        for (tag, total) in &self.totals {
            println!("{}\t{:?}\t{}", tag, total.duration, total.count);
        }
    }
}

fn main() {
    let cfg = Config::from_env();
    let workload = WorkloadCfg {
        max_push: cfg.max_push,
        pop_ratio: cfg.pop_ratio,
        ..WorkloadCfg::default()
    };

    let mut rng = StdRng::seed_from_u64(cfg.seed);
    let arena = TreeArena::new();
    let mut stack = SuffixStack::new(&arena);
    let mut oracle = VecStack::new();

    let mut baseline_clk = CumulativeTimer::default();
    let mut impl_clk = CumulativeTimer::default();
    let mut total_height = 0f64;

    for _ in 0..cfg.random_count {
        match random_op(&mut rng, &workload, &oracle) {
            Op::Pop(count) => {
                if cfg.print_ops {
                    println!("Popping p={}", count);
                }
                baseline_clk.time("truncate", || oracle.pop(count));
                impl_clk.time("truncate", || stack.pop(count));
            }
            Op::Append(values) => {
                if cfg.print_ops {
                    println!("Appending p={}", values.len());
                }
                let indexed = impl_clk.time("index", || TreeString::from_slice(&arena, &values));
                baseline_clk.time("append", || oracle.append(&values));
                impl_clk.time("append", || stack.append(&indexed));
            }
            Op::Check(probe) => {
                if cfg.print_ops {
                    println!("Checking suffix p={}", probe.len());
                    if cfg.print_vecs {
                        println!(" v = {:?}", probe);
                    }
                }
                let indexed = impl_clk.time("index", || TreeString::from_slice(&arena, &probe));
                let expected = baseline_clk.time("has_suffix", || oracle.has_suffix(&probe));
                let got = impl_clk.time("has_suffix", || stack.has_suffix(&indexed));
                if got != expected {
                    println!("Failed, incorrect suffix answer ({} vs {})", got, expected);
                    if cfg.print_vecs {
                        println!(" Expected: {:?}", oracle.values());
                        println!("   Actual: {:?}", stack.to_vec());
                    }
                    std::process::exit(1);
                }
            }
        }

        if cfg.print_ops {
            println!("Checking length n={}", oracle.len());
        }
        if stack.len() != oracle.len() || stack.back() != oracle.back() {
            println!(
                "Failed, diverged: len {} vs {}, back {:?} vs {:?}",
                stack.len(),
                oracle.len(),
                stack.back(),
                oracle.back()
            );
            std::process::exit(1);
        }
        if cfg.print_vecs {
            println!(" Expected: {:?}", oracle.values());
            println!("   Actual: {:?}", stack.to_vec());
        }

        total_height += oracle.len() as f64;
    }

    println!("=========\t=========\t======");
    println!("Average height:\t{}", total_height / cfg.random_count as f64);
    println!("=========\t=========\t======");
    println!("Baseline:\n---");
    baseline_clk.print();
    println!("=========\t=========\t======");
    println!("Benchmarked:\n---");
    impl_clk.print();
    println!("=========\t=========\t======");
    Counters::count_stack(&stack).print_histogram();
}
