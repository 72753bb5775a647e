//! buckle_parser: Recursive descent parser for Buckle.
//!
//! Builds an arena-allocated `CompilationUnit` from source text, reporting
//! syntax errors as diagnostics. Missing tokens are synthesized so parsing
//! always terminates.

pub mod parser;
pub mod precedence;

pub use parser::{Parser, SyntaxTree};
