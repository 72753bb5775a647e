//! buckle_transformers: Bound tree transformations.
//!
//! - `BoundTreeRewriter`: a structural-sharing rewrite pass over bound nodes.
//!   Unchanged subtrees are returned by pointer; compound assignments are
//!   desugared by default.
//! - `Lowerer`: rewrites structured control flow into labels and gotos and
//!   flattens the result into a single block.

pub mod lowerer;
pub mod rewriter;

pub use lowerer::Lowerer;
pub use rewriter::BoundTreeRewriter;
