//! buckle_scanner: Lexer for Buckle source code.
//!
//! Converts source text into tokens on demand. Whitespace and comments are
//! skipped as trivia; literal tokens carry their decoded value.

mod scanner;
mod token;

pub use scanner::Scanner;
pub use token::{LiteralValue, TokenInfo};
