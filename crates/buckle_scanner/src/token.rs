//! Token information produced by the scanner.

use buckle_ast::syntax_kind::SyntaxKind;
use buckle_core::text::TextSpan;

/// The decoded value of a literal token.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    None,
    Int(i64),
    Decimal(f64),
    String(String),
}

/// Information about a scanned token.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenInfo {
    pub kind: SyntaxKind,
    pub span: TextSpan,
    /// Raw source text of the token.
    pub text: String,
    pub value: LiteralValue,
}

impl TokenInfo {
    pub fn new(kind: SyntaxKind, span: TextSpan, text: String) -> Self {
        Self {
            kind,
            span,
            text,
            value: LiteralValue::None,
        }
    }

    pub fn with_value(mut self, value: LiteralValue) -> Self {
        self.value = value;
        self
    }
}
