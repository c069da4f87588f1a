use thiserror::Error;

use crate::constant::Word;

/// Arithmetic failures from the checked opcode variants.
///
/// The saturating variants clamp instead of raising these.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MathError {
    #[error("arithmetic overflow combining {a} and {b}")]
    Overflow { a: Word, b: Word },

    #[error("arithmetic underflow: {a} - {b}")]
    Underflow { a: Word, b: Word },

    #[error("division by zero")]
    DivisionByZero,
}
