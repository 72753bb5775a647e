//! buckle_diagnostics: Diagnostic messages and error reporting infrastructure.
//!
//! Every stage appends to a caller-supplied `DiagnosticQueue`. Message
//! templates live in [`messages`]; codes are displayed as `BU0017`.

mod internal;

pub use internal::InternalError;

use buckle_core::text::TextSpan;
use std::collections::VecDeque;
use std::fmt;

/// Diagnostic severity. `Fatal` covers unsupported constructs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DiagnosticSeverity {
    Warning,
    Error,
    Fatal,
}

impl fmt::Display for DiagnosticSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticSeverity::Warning => write!(f, "warning"),
            DiagnosticSeverity::Error => write!(f, "error"),
            DiagnosticSeverity::Fatal => write!(f, "fatal"),
        }
    }
}

/// A diagnostic message template with a code and severity.
#[derive(Debug, Clone)]
pub struct DiagnosticMessage {
    pub code: u32,
    pub severity: DiagnosticSeverity,
    /// The message template. May contain `{0}`, `{1}`, etc. placeholders.
    pub message: &'static str,
}

/// A realized diagnostic with location information and resolved message text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub code: u32,
    pub severity: DiagnosticSeverity,
    /// The source span, if the diagnostic is tied to one.
    pub span: Option<TextSpan>,
    pub message: String,
}

impl Diagnostic {
    /// Create a diagnostic without location info.
    pub fn new(message: &DiagnosticMessage, args: &[&str]) -> Self {
        Self {
            code: message.code,
            severity: message.severity,
            span: None,
            message: format_message(message.message, args),
        }
    }

    pub fn with_location(span: TextSpan, message: &DiagnosticMessage, args: &[&str]) -> Self {
        Self {
            span: Some(span),
            ..Self::new(message, args)
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity >= DiagnosticSeverity::Error
    }

    pub fn is_warning(&self) -> bool {
        self.severity == DiagnosticSeverity::Warning
    }

    /// The code as displayed to users, e.g. `BU0017`.
    pub fn code_text(&self) -> String {
        format!("BU{:04}", self.code)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(span) = self.span {
            write!(f, "({}): ", span.start)?;
        }
        write!(f, "{} {}: {}", self.severity, self.code_text(), self.message)
    }
}

/// Format a message template by replacing `{0}`, `{1}`, etc. with arguments.
pub fn format_message(template: &str, args: &[&str]) -> String {
    let mut result = template.to_string();
    for (i, arg) in args.iter().enumerate() {
        result = result.replace(&format!("{{{}}}", i), arg);
    }
    result
}

/// An ordered queue of diagnostics. New diagnostics go to the back and
/// `pop` takes from the front, so consumers see them in report order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiagnosticQueue {
    diagnostics: VecDeque<Diagnostic>,
}

impl DiagnosticQueue {
    pub fn new() -> Self {
        Self {
            diagnostics: VecDeque::new(),
        }
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push_back(diagnostic);
    }

    /// Report `message` at `span`.
    pub fn report(&mut self, span: TextSpan, message: &DiagnosticMessage, args: &[&str]) {
        self.push(Diagnostic::with_location(span, message, args));
    }

    pub fn pop(&mut self) -> Option<Diagnostic> {
        self.diagnostics.pop_front()
    }

    /// Whether any diagnostic is an error or fatal.
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn has_fatal(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == DiagnosticSeverity::Fatal)
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
    }

    /// A copy of this queue without diagnostics of the given severity.
    pub fn filter_out(&self, severity: DiagnosticSeverity) -> DiagnosticQueue {
        Self {
            diagnostics: self
                .diagnostics
                .iter()
                .filter(|d| d.severity != severity)
                .cloned()
                .collect(),
        }
    }

    /// Move every diagnostic out of `other` onto the back of this queue.
    pub fn move_from(&mut self, other: &mut DiagnosticQueue) {
        self.diagnostics.append(&mut other.diagnostics);
    }

    pub fn append(&mut self, mut other: DiagnosticQueue) {
        self.move_from(&mut other);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn clear(&mut self) {
        self.diagnostics.clear();
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.diagnostics.into()
    }

    /// Stable sort by source position; diagnostics without a span go first.
    pub fn sort(&mut self) {
        self.diagnostics
            .make_contiguous()
            .sort_by_key(|d| d.span.map(|s| s.start));
    }
}

impl Extend<Diagnostic> for DiagnosticQueue {
    fn extend<T: IntoIterator<Item = Diagnostic>>(&mut self, iter: T) {
        self.diagnostics.extend(iter);
    }
}

impl IntoIterator for DiagnosticQueue {
    type Item = Diagnostic;
    type IntoIter = std::collections::vec_deque::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.diagnostics.into_iter()
    }
}

// ============================================================================
// Diagnostic Messages
// ============================================================================

pub mod messages {
    use super::*;

    macro_rules! diag {
        ($code:expr, Warning, $msg:expr) => {
            DiagnosticMessage { code: $code, severity: DiagnosticSeverity::Warning, message: $msg }
        };
        ($code:expr, Error, $msg:expr) => {
            DiagnosticMessage { code: $code, severity: DiagnosticSeverity::Error, message: $msg }
        };
        ($code:expr, Fatal, $msg:expr) => {
            DiagnosticMessage { code: $code, severity: DiagnosticSeverity::Fatal, message: $msg }
        };
    }

    // ========================================================================
    // Warnings
    // ========================================================================
    pub const ALWAYS_VALUE: DiagnosticMessage = diag!(1, Warning, "expression will always result in '{0}'");

    // ========================================================================
    // Scanner and parser errors
    // ========================================================================
    pub const INVALID_TYPE: DiagnosticMessage = diag!(4, Error, "'{0}' is not a valid '{1}'");
    pub const BAD_CHARACTER: DiagnosticMessage = diag!(5, Error, "unexpected character '{0}'");
    pub const UNEXPECTED_TOKEN: DiagnosticMessage = diag!(6, Error, "unexpected token '{0}', expected {1}");
    pub const UNTERMINATED_STRING: DiagnosticMessage = diag!(27, Error, "unterminated string literal");
    pub const UNTERMINATED_COMMENT: DiagnosticMessage = diag!(41, Error, "unterminated multi-line comment");
    pub const EXPECTED_TOKEN: DiagnosticMessage = diag!(56, Error, "expected {0} at end of input");

    // ========================================================================
    // Binder errors
    // ========================================================================
    pub const CANNOT_CONVERT_IMPLICITLY: DiagnosticMessage = diag!(7, Error, "cannot convert from type '{0}' to '{1}' implicitly; an explicit conversion exists (are you missing a cast?)");
    pub const INVALID_UNARY_OPERATOR_USE: DiagnosticMessage = diag!(8, Error, "operator '{0}' is not defined for type '{1}'");
    pub const INVALID_BINARY_OPERATOR_USE: DiagnosticMessage = diag!(11, Error, "operator '{0}' is not defined for types '{1}' and '{2}'");
    pub const PARAMETER_ALREADY_DECLARED: DiagnosticMessage = diag!(13, Error, "redefinition of parameter '{0}'");
    pub const INVALID_MAIN: DiagnosticMessage = diag!(14, Error, "invalid main signature: must return void or int and take no arguments");
    pub const MAIN_AND_GLOBALS: DiagnosticMessage = diag!(16, Error, "declaring a main function and using global statements creates an ambiguous entry point");
    pub const UNDEFINED_NAME: DiagnosticMessage = diag!(17, Error, "undefined symbol '{0}'");
    pub const FUNCTION_ALREADY_DECLARED: DiagnosticMessage = diag!(18, Error, "redefinition of function '{0}'");
    pub const NOT_ALL_PATHS_RETURN: DiagnosticMessage = diag!(19, Error, "not all code paths return a value");
    pub const CANNOT_CONVERT: DiagnosticMessage = diag!(20, Error, "cannot convert from type '{0}' to '{1}'");
    pub const ALREADY_DECLARED: DiagnosticMessage = diag!(21, Error, "redefinition of '{0}'");
    pub const CONSTANT_ASSIGNMENT: DiagnosticMessage = diag!(22, Error, "assignment of read-only variable '{0}'");
    pub const NO_VALUE: DiagnosticMessage = diag!(24, Error, "expression must have a value");
    pub const CANNOT_APPLY_INDEXING: DiagnosticMessage = diag!(25, Error, "cannot apply indexing with [] to an expression of type '{0}'");
    pub const UNDEFINED_FUNCTION: DiagnosticMessage = diag!(28, Error, "undefined function '{0}'");
    pub const INCORRECT_ARGUMENT_COUNT: DiagnosticMessage = diag!(29, Error, "function '{0}' expects {1} arguments, got {2}");
    pub const INVALID_ARGUMENT_TYPE: DiagnosticMessage = diag!(31, Error, "argument {0}: cannot implicitly pass type '{1}' into parameter of type '{2}'");
    pub const CANNOT_CALL_NON_FUNCTION: DiagnosticMessage = diag!(32, Error, "called object '{0}' is not a function");
    pub const INVALID_EXPRESSION_STATEMENT: DiagnosticMessage = diag!(33, Error, "only assignment and call expressions can be used as a statement");
    pub const UNKNOWN_TYPE: DiagnosticMessage = diag!(34, Error, "unknown type '{0}'");
    pub const INVALID_BREAK_OR_CONTINUE: DiagnosticMessage = diag!(35, Error, "{0} statements can only be used within a loop");
    pub const UNEXPECTED_RETURN_VALUE: DiagnosticMessage = diag!(37, Error, "cannot return a value in a function returning void");
    pub const MISSING_RETURN_VALUE: DiagnosticMessage = diag!(38, Error, "cannot return without a value in a function returning non-void");
    pub const NOT_A_VARIABLE: DiagnosticMessage = diag!(39, Error, "function '{0}' cannot be used as a variable");
    pub const NO_INIT_ON_IMPLICIT: DiagnosticMessage = diag!(40, Error, "implicitly-typed variable must have an initializer");
    pub const NULL_ASSIGN_ON_IMPLICIT: DiagnosticMessage = diag!(42, Error, "cannot initialize an implicitly-typed variable with 'null'");
    pub const EMPTY_INITIALIZER_LIST_ON_IMPLICIT: DiagnosticMessage = diag!(43, Error, "cannot initialize an implicitly-typed variable with an empty initializer list");
    pub const IMPLIED_DIMENSIONS: DiagnosticMessage = diag!(44, Error, "collection dimensions on implicit types are inferred and not necessary");
    pub const CANNOT_USE_IMPLICIT: DiagnosticMessage = diag!(45, Error, "cannot use implicit-typing in this context");
    pub const NO_CATCH_OR_FINALLY: DiagnosticMessage = diag!(46, Error, "try statement must have a catch or finally");
    pub const REFERENCE_NO_INITIALIZATION: DiagnosticMessage = diag!(48, Error, "a declaration of a by-reference variable must have an initializer");
    pub const REFERENCE_WRONG_INITIALIZATION: DiagnosticMessage = diag!(49, Error, "a by-reference variable must be initialized with a reference");
    pub const WRONG_INITIALIZATION_REFERENCE: DiagnosticMessage = diag!(50, Error, "cannot initialize a by-value variable with a reference");
    pub const UNKNOWN_ATTRIBUTE: DiagnosticMessage = diag!(51, Error, "unknown attribute '{0}'");
    pub const NULL_ASSIGN_NOT_NULL: DiagnosticMessage = diag!(52, Error, "cannot assign 'null' to a non-nullable variable");
    pub const INCONSISTENT_RETURN_TYPES: DiagnosticMessage = diag!(53, Error, "not all code paths return the same type");
    pub const MISSING_RETURN_STATEMENT: DiagnosticMessage = diag!(54, Error, "missing return statement in inline function");
    pub const VOID_VARIABLE: DiagnosticMessage = diag!(55, Error, "cannot use void as a type");

    // ========================================================================
    // Runtime errors
    // ========================================================================
    pub const UNHANDLED_EXCEPTION: DiagnosticMessage = diag!(57, Error, "unhandled exception: {0}");

    // ========================================================================
    // Unsupported (9000+)
    // ========================================================================
    pub const GLOBAL_RETURN_VALUE: DiagnosticMessage = diag!(9000, Fatal, "unsupported: global return cannot return a value");
    pub const IS_WITHOUT_NULL: DiagnosticMessage = diag!(9004, Fatal, "unsupported: cannot use 'is' or 'isnt' operators with non-null types");
    pub const LOCAL_FUNCTION: DiagnosticMessage = diag!(9005, Fatal, "unsupported: local functions are not supported");
}
