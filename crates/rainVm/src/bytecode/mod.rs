use instruction::Instruction;

use crate::{constant::Word, errors::bytecode::BytecodeError};

pub mod instruction;
pub mod opcode;
pub mod operand;

/// One compiled unit of instructions within a program.
///
/// Immutable once decoded; the wire form is a stream of 4-byte big-endian
/// instruction cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Source(pub Vec<Instruction>);

impl Source {
    /// Decodes a source from its wire bytes.
    ///
    /// Rejects streams that do not divide into whole cells and cells naming
    /// opcode numbers this build does not define.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, BytecodeError> {
        if bytes.len() % Instruction::WIRE_SIZE != 0 {
            return Err(BytecodeError::TruncatedSource { len: bytes.len() });
        }
        bytes
            .chunks_exact(Instruction::WIRE_SIZE)
            .map(|chunk| {
                let cell = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
                Instruction::from_cell(cell)
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }

    /// Encodes the source back to its wire bytes.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        self.0
            .iter()
            .flat_map(|instruction| instruction.to_cell().to_be_bytes())
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One deployable program: an ordered list of sources, a constants pool and
/// the designated entrypoint. Constructed once, immutable thereafter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    pub sources: Vec<Source>,
    pub constants: Vec<Word>,
    pub entrypoint: usize,
}

impl Program {
    /// Assembles a program, rejecting an entrypoint that names no source.
    pub fn new(
        sources: Vec<Source>,
        constants: Vec<Word>,
        entrypoint: usize,
    ) -> Result<Self, BytecodeError> {
        if entrypoint >= sources.len() {
            return Err(BytecodeError::InvalidEntrypoint {
                index: entrypoint,
                count: sources.len(),
            });
        }
        Ok(Self {
            sources,
            constants,
            entrypoint,
        })
    }
}
