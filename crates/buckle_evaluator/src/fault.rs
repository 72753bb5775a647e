//! Evaluation failures.

use buckle_bound::value::ConversionFault;
use buckle_bound::operators::OperatorFault;
use buckle_diagnostics::InternalError;
use thiserror::Error;

/// A fault raised by the user program. A `try` statement can catch it;
/// otherwise it ends the evaluation request.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeFault {
    #[error("attempted to divide by zero")]
    DivideByZero,

    #[error("nullable value is null")]
    NullValue,

    #[error("index {index} is outside the bounds of an array of length {length}")]
    IndexOutOfRange { index: i64, length: usize },

    #[error("cannot index into a null array")]
    NullArray,

    #[error("cannot convert '{value}' to type '{target}'")]
    InvalidConversion { value: String, target: String },

    #[error("stack overflow: call depth exceeded {0}")]
    StackOverflow(usize),

    #[error("console I/O failed: {0}")]
    Io(String),
}

impl From<ConversionFault> for RuntimeFault {
    fn from(fault: ConversionFault) -> Self {
        RuntimeFault::InvalidConversion {
            value: fault.value,
            target: fault.target.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvaluationError {
    #[error(transparent)]
    Fault(#[from] RuntimeFault),

    #[error(transparent)]
    Internal(#[from] InternalError),
}

impl EvaluationError {
    pub(crate) fn from_operator(fault: OperatorFault, found: &str) -> Self {
        match fault {
            OperatorFault::DivideByZero => RuntimeFault::DivideByZero.into(),
            OperatorFault::InvalidOperands => InternalError::UnexpectedValue {
                expected: "operands matching the bound operator",
                found: found.to_string(),
            }
            .into(),
        }
    }
}
