//! Internal errors: contract violations between pipeline stages.
//!
//! These are never user diagnostics. They abort the current compilation or
//! evaluation request and propagate to the caller.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InternalError {
    #[error("unexpected statement '{kind}' during {stage}")]
    UnexpectedStatement {
        kind: &'static str,
        stage: &'static str,
    },

    #[error("unexpected expression '{kind}' during {stage}")]
    UnexpectedExpression {
        kind: &'static str,
        stage: &'static str,
    },

    #[error("label '{0}' is not defined in the executing body")]
    MissingLabel(String),

    #[error("no body was bound for function '{0}'")]
    MissingFunctionBody(String),

    #[error("expected a value of type '{expected}', found '{found}'")]
    UnexpectedValue {
        expected: &'static str,
        found: String,
    },

    #[error("variable '{0}' has no storage in the current frame")]
    UnboundVariable(String),

    #[error("call stack is empty")]
    EmptyCallStack,
}
