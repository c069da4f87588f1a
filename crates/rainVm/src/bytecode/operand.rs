//! Multi-field operand layouts.
//!
//! Most opcodes read their operand as a plain index or count; the ones below
//! split it into packed fields. Encodings are part of the frozen wire format.

/// Operand layout for [`Context`](super::opcode::Opcode::Context) reads:
/// row in the high byte, column in the low byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextRead {
    pub row: u8,
    pub column: u8,
}

impl ContextRead {
    #[must_use]
    pub const fn decode(operand: u16) -> Self {
        Self {
            row: (operand >> 8) as u8,
            column: operand as u8,
        }
    }

    #[must_use]
    pub const fn encode(self) -> u16 {
        ((self.row as u16) << 8) | self.column as u16
    }
}

/// Operand layout for [`Call`](super::opcode::Opcode::Call): input count in
/// bits 0..4, output count in bits 4..8, callee source index in the high byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallTarget {
    pub inputs: u8,
    pub outputs: u8,
    pub source: u8,
}

impl CallTarget {
    #[must_use]
    pub const fn decode(operand: u16) -> Self {
        Self {
            inputs: (operand & 0xf) as u8,
            outputs: ((operand >> 4) & 0xf) as u8,
            source: (operand >> 8) as u8,
        }
    }

    #[must_use]
    pub const fn encode(self) -> u16 {
        (self.inputs as u16 & 0xf)
            | ((self.outputs as u16 & 0xf) << 4)
            | ((self.source as u16) << 8)
    }
}

/// Operand layout for
/// [`UpdateTimesForTierRange`](super::opcode::Opcode::UpdateTimesForTierRange):
/// start tier in bits 4..8, end tier in bits 0..4. The range covers sub-field
/// indices `start..end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierRange {
    pub start: u8,
    pub end: u8,
}

impl TierRange {
    #[must_use]
    pub const fn decode(operand: u16) -> Self {
        Self {
            start: ((operand >> 4) & 0xf) as u8,
            end: (operand & 0xf) as u8,
        }
    }

    #[must_use]
    pub const fn encode(self) -> u16 {
        ((self.start as u16 & 0xf) << 4) | (self.end as u16 & 0xf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_read_layout() {
        let read = ContextRead { row: 3, column: 7 };
        assert_eq!(read.encode(), 0x0307);
        assert_eq!(ContextRead::decode(0x0307), read);
    }

    #[test]
    fn test_call_target_layout() {
        let target = CallTarget {
            inputs: 2,
            outputs: 1,
            source: 5,
        };
        assert_eq!(target.encode(), 0x0512);
        assert_eq!(CallTarget::decode(0x0512), target);
    }

    #[test]
    fn test_tier_range_layout() {
        let range = TierRange { start: 2, end: 8 };
        assert_eq!(range.encode(), 0x0028);
        assert_eq!(TierRange::decode(0x0028), range);
    }
}
