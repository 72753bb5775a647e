//! Evaluation of lowered bound programs.

mod console;
mod evaluator;
mod fault;

pub use console::{BufferConsole, Console, StdConsole};
pub use evaluator::{Evaluator, Globals, MAX_CALL_DEPTH};
pub use fault::{EvaluationError, RuntimeFault};
