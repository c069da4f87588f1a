use super::opcode::Opcode;
use crate::errors::bytecode::BytecodeError;

/// One instruction, packed on the wire into a single 32-bit big-endian cell:
/// the opcode number in the high 16 bits, the operand in the low 16.
///
/// The cell layout is frozen: deployed programs are addressed by raw bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Instruction {
    /// Which operation to dispatch.
    pub opcode: Opcode,
    /// The small argument packed alongside the opcode. Its meaning is
    /// per-opcode; see [`super::operand`] for the multi-field layouts.
    pub operand: u16,
}

impl Instruction {
    /// Bytes one instruction occupies on the wire.
    pub const WIRE_SIZE: usize = 4;

    #[must_use]
    pub const fn new(opcode: Opcode, operand: u16) -> Self {
        Self { opcode, operand }
    }

    /// Packs the instruction into its wire cell.
    #[must_use]
    pub const fn to_cell(self) -> u32 {
        ((self.opcode.code() as u32) << 16) | self.operand as u32
    }

    /// Unpacks a wire cell, rejecting opcode numbers this build does not know.
    pub fn from_cell(cell: u32) -> Result<Self, BytecodeError> {
        let code = (cell >> 16) as u16;
        let opcode =
            Opcode::try_from(code).map_err(|_| BytecodeError::UnknownOpcode { code })?;
        Ok(Self {
            opcode,
            operand: cell as u16,
        })
    }
}
