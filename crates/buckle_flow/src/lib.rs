//! buckle_flow: Control-flow analysis over lowered bodies.
//!
//! Partitions a flat label/goto body into basic blocks, connects them, prunes
//! unreachable blocks to a fixpoint, and answers whether every path through
//! the body ends in a `return`. Graphs can be exported as Graphviz DOT.

pub mod graph;

pub use graph::{all_paths_return, BasicBlock, BasicBlockBranch, BasicBlockKind, BlockId, ControlFlowGraph};
