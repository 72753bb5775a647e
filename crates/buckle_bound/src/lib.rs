//! buckle_bound: The typed intermediate representation.
//!
//! Holds the type clause model, symbols, the bound node model and the facts
//! every later pass shares about them: operator tables, constant folding,
//! built-in functions and runtime values.

pub mod builtins;
pub mod constant_folding;
pub mod operators;
pub mod printer;
pub mod symbols;
pub mod tree;
pub mod types;
pub mod value;

pub use operators::{BoundBinaryOperator, BoundBinaryOperatorKind, BoundUnaryOperator, BoundUnaryOperatorKind};
pub use printer::BoundTreePrinter;
pub use symbols::{FunctionSymbol, Symbol, SymbolId, SymbolKind, VariableKind, VariableSymbol};
pub use tree::{BoundBlockStatement, BoundExpression, BoundLabel, BoundNodeKind, BoundStatement};
pub use types::{TypeClause, TypeFlags, TypeSymbol};
pub use value::{BoundConstant, Value};
