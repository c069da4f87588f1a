use thiserror::Error;

pub mod bytecode;
pub mod eval;
pub mod integrity;
pub mod math;

/// Umbrella error for callers that register and evaluate in one step.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VmError {
    #[error(transparent)]
    Bytecode(#[from] bytecode::BytecodeError),
    #[error(transparent)]
    Integrity(#[from] integrity::IntegrityError),
    #[error(transparent)]
    Eval(#[from] eval::EvalError),
}
