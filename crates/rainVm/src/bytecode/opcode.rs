use num_enum::{IntoPrimitive, TryFromPrimitive};
use strum_macros::{EnumCount, EnumIter};

/// The instruction set, one variant per stable opcode number.
///
/// Numbers are part of the wire format: already-deployed programs embed them
/// raw, so a new opcode must take a fresh discriminant and existing ones are
/// never renumbered or reordered. Gaps between families are deliberate
/// growing room.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumCount, EnumIter, TryFromPrimitive, IntoPrimitive,
)]
#[repr(u16)]
pub enum Opcode {
    /// Push one value from the constants pool. Operand: constant index.
    Constant = 0x00,
    /// Copy an existing stack slot to the top. Operand: absolute slot index.
    StackCopy = 0x01,
    /// Push one cell of the caller-supplied context. Operand: row and column.
    Context = 0x02,
    /// Push one persistent storage slot. Operand: slot number.
    Storage = 0x03,
    /// Evaluate another source on its own stack. Operand: inputs, outputs and
    /// callee source index.
    Call = 0x04,
    /// Pop a key and a value into the per-evaluation scratch store.
    KvSet = 0x05,
    /// Pop a key, push the stored value (zero if never set).
    KvGet = 0x06,
    /// Pop one word, push its eight 32-bit sub-fields, lowest first.
    Explode32 = 0x07,

    // Checked arithmetic folds. Operand: input count, at least two. Abort the
    // evaluation on overflow, underflow or a zero divisor.
    Add = 0x10,
    Sub = 0x11,
    Mul = 0x12,
    Div = 0x13,
    Mod = 0x14,

    // Saturating folds clamp to the word range instead of aborting.
    SaturatingAdd = 0x18,
    SaturatingSub = 0x19,
    SaturatingMul = 0x1a,

    /// Pop a newer and an older tier report, push their sub-field-wise
    /// saturating difference.
    TierSaturatingDiff = 0x20,
    /// Pop a report and a time, rewrite a tier range to that time.
    /// Operand: start and end tier.
    UpdateTimesForTierRange = 0x21,
    /// Pop a report, mark every tier at or above the operand as never reached.
    TruncateTiersAbove = 0x22,

    /// Pop a seed, a length and an index; push the id at that index of the
    /// seeded shuffle of `1..=length`, or zero when out of range.
    ShuffleIdAtIndex = 0x28,
}

impl Opcode {
    /// The stable wire number of this opcode.
    #[must_use]
    pub const fn code(self) -> u16 {
        self as u16
    }
}

#[cfg(test)]
mod tests {
    use strum::{EnumCount, IntoEnumIterator};

    use super::*;

    #[test]
    fn test_numbers_round_trip() {
        for op in Opcode::iter() {
            assert_eq!(Opcode::try_from(op.code()), Ok(op));
        }
    }

    #[test]
    fn test_numbers_are_unique() {
        let mut codes: Vec<u16> = Opcode::iter().map(Opcode::code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), Opcode::COUNT);
    }

    #[test]
    fn test_unknown_number_rejected() {
        assert!(Opcode::try_from(0xffffu16).is_err());
        // Gap between the core and math families.
        assert!(Opcode::try_from(0x0008u16).is_err());
    }
}
