//! buckle_binder: Name and type resolution.
//!
//! Turns syntax trees into bound trees:
//! - `BoundScope`: the lexical scope chain, seeded with built-ins
//! - `Conversion`: cast classification between type clauses
//! - `Binder`: binds one submission into a `BoundGlobalScope`
//! - `bind_program`: lowers a global scope into an executable `BoundProgram`

pub mod binder;
pub mod conversion;
pub mod program;
pub mod scope;

pub use binder::{Binder, EVAL_NAME, MAIN_NAME};
pub use conversion::Conversion;
pub use program::{bind_program, BoundGlobalScope, BoundProgram};
pub use scope::BoundScope;
