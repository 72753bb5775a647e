//! buckle_ast: Syntax tree definitions for the Buckle language.
//!
//! Defines `SyntaxKind` together with the syntax facts the scanner and parser
//! share, and the arena-allocated syntax nodes consumed by the binder.

pub mod node;
pub mod syntax_kind;

pub use node::*;
pub use syntax_kind::SyntaxKind;
