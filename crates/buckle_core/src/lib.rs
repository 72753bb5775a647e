//! buckle_core: Core utilities shared by every stage of the Buckle pipeline.
//!
//! Provides text spans and the line-indexed `SourceText` used by the scanner,
//! the parser and diagnostic reporting.

pub mod text;

pub use text::{SourceText, TextLine, TextSpan};
