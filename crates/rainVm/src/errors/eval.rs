use thiserror::Error;

use super::math::MathError;

/// Runtime failures that abort an in-flight evaluation.
///
/// Any of these discards the whole run: the stack and scratch store built so
/// far are dropped, mirroring the host's all-or-nothing transaction model.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EvalError {
    #[error(transparent)]
    Math(#[from] MathError),

    /// A sentinel scan reached the stack base without a match.
    #[error("no list sentinel found above the stack base")]
    MissingSentinel,

    /// A call chain nested deeper than the machine permits.
    #[error("call nesting exceeds the maximum depth of {max}")]
    CallDepthExceeded { max: usize },

    /// An instruction named a source the program does not have.
    #[error("source index {index} out of range: program has {count} sources")]
    MissingSource { index: usize, count: usize },
}
