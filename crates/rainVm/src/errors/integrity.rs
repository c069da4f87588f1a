use thiserror::Error;

use crate::bytecode::opcode::Opcode;

/// Static-analysis failures raised before any evaluation runs.
///
/// Each violation is distinct and named so that script authors can diagnose
/// a rejected program without executing it. A program raising any of these
/// must never be accepted for evaluation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IntegrityError {
    /// An instruction reads a constant index past the end of the pool.
    #[error("constant read out of bounds: index {index} with only {len} constants")]
    OutOfBoundsConstantRead { index: usize, len: usize },

    /// An instruction reads a stack slot not provably below the stack top at
    /// that program point, or pops more values than the stack holds.
    #[error("stack read out of bounds: index {index} with provable height {height}")]
    OutOfBoundsStackRead { index: usize, height: usize },

    /// A storage read names a slot outside the host's permitted range.
    #[error("storage slot {slot} outside the permitted range [{start}, {end})")]
    DisallowedStorageSlot { slot: u64, start: u64, end: u64 },

    /// The simulated stack would grow past the machine's hard cap.
    #[error("stack would grow to {height} slots, past the maximum of {max}")]
    StackOverflow { height: usize, max: usize },

    /// The source leaves fewer values on the stack than its caller requires.
    #[error("source leaves {actual} values on the stack but at least {minimum} are required")]
    InsufficientFinalStack { actual: usize, minimum: usize },

    /// An operand fails the opcode's own validity rule.
    #[error("malformed operand {operand:#06x} for {opcode:?}")]
    MalformedOperand { opcode: Opcode, operand: u16 },

    /// An instruction or entrypoint names a source the program does not have.
    #[error("source index {index} out of range: program has {count} sources")]
    MissingSource { index: usize, count: usize },

    /// The call graph nests deeper than the machine permits.
    #[error("call nesting exceeds the maximum depth of {max}")]
    CallDepthExceeded { max: usize },
}
