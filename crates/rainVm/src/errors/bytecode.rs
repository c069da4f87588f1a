use thiserror::Error;

/// Errors raised while decoding or assembling a program from its wire form.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BytecodeError {
    /// The byte stream does not divide into whole instruction cells.
    #[error("source of {len} bytes is not a whole number of 4-byte instruction cells")]
    TruncatedSource { len: usize },

    /// An instruction cell names an opcode number this build does not define.
    #[error("unknown opcode {code:#06x}")]
    UnknownOpcode { code: u16 },

    /// The designated entrypoint does not name an existing source.
    #[error("entrypoint {index} out of range: program has {count} sources")]
    InvalidEntrypoint { index: usize, count: usize },
}
