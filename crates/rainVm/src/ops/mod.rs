//! The opcode library and the dispatch binding each opcode number to exactly
//! one integrity rule and one execution body.
//!
//! The two `match`es below are the single source of truth for arity: the arm
//! pairs sit side by side so a reviewer can confirm checker and engine agree
//! opcode by opcode.

use strum::IntoEnumIterator;

use crate::{
    bytecode::{opcode::Opcode, operand::TierRange},
    constant::{MAX_TIER, Word},
    errors::{eval::EvalError, integrity::IntegrityError, math::MathError},
    eval::{Machine, StateReader},
    integrity::IntegrityState,
};

pub(crate) mod core;
pub mod math;
pub mod rng;
pub mod tier;

/// Applies one opcode's integrity rule to the simulated stack.
pub(crate) fn integrity_dispatch(
    opcode: Opcode,
    state: &mut IntegrityState<'_>,
    operand: u16,
) -> Result<(), IntegrityError> {
    match opcode {
        Opcode::Constant => core::constant_integrity(state, operand),
        Opcode::StackCopy => core::stack_copy_integrity(state, operand),
        Opcode::Context => core::context_integrity(state, operand),
        Opcode::Storage => core::storage_integrity(state, operand),
        Opcode::Call => core::call_integrity(state, operand),
        Opcode::KvSet => core::kv_set_integrity(state, operand),
        Opcode::KvGet => core::kv_get_integrity(state, operand),
        Opcode::Explode32 => core::explode32_integrity(state, operand),

        Opcode::Add
        | Opcode::Sub
        | Opcode::Mul
        | Opcode::Div
        | Opcode::Mod
        | Opcode::SaturatingAdd
        | Opcode::SaturatingSub
        | Opcode::SaturatingMul => fold_integrity(opcode, state, operand),

        Opcode::TierSaturatingDiff => {
            state.pop(2)?;
            state.push(1)
        }
        Opcode::UpdateTimesForTierRange => {
            let range = TierRange::decode(operand);
            if range.end as usize > MAX_TIER || range.start > range.end {
                return Err(IntegrityError::MalformedOperand { opcode, operand });
            }
            state.pop(2)?;
            state.push(1)
        }
        Opcode::TruncateTiersAbove => {
            if operand as usize > MAX_TIER {
                return Err(IntegrityError::MalformedOperand { opcode, operand });
            }
            state.pop(1)?;
            state.push(1)
        }

        Opcode::ShuffleIdAtIndex => {
            state.pop(3)?;
            state.push(1)
        }
    }
}

/// Runs one opcode's execution body against the live machine.
pub(crate) fn eval_dispatch<S: StateReader>(
    opcode: Opcode,
    machine: &mut Machine<'_, S>,
    operand: u16,
) -> Result<(), EvalError> {
    match opcode {
        Opcode::Constant => core::constant_eval(machine, operand),
        Opcode::StackCopy => core::stack_copy_eval(machine, operand),
        Opcode::Context => core::context_eval(machine, operand),
        Opcode::Storage => core::storage_eval(machine, operand),
        Opcode::Call => core::call_eval(machine, operand),
        Opcode::KvSet => core::kv_set_eval(machine, operand),
        Opcode::KvGet => core::kv_get_eval(machine, operand),
        Opcode::Explode32 => core::explode32_eval(machine, operand),

        Opcode::Add => fold_eval(machine, operand, math::checked_add),
        Opcode::Sub => fold_eval(machine, operand, math::checked_sub),
        Opcode::Mul => fold_eval(machine, operand, math::checked_mul),
        Opcode::Div => fold_eval(machine, operand, math::checked_div),
        Opcode::Mod => fold_eval(machine, operand, math::checked_rem),
        Opcode::SaturatingAdd => fold_eval(machine, operand, infallible(math::saturating_add)),
        Opcode::SaturatingSub => fold_eval(machine, operand, infallible(math::saturating_sub)),
        Opcode::SaturatingMul => fold_eval(machine, operand, infallible(math::saturating_mul)),

        Opcode::TierSaturatingDiff => {
            let older = machine.stack.pop();
            let newer = machine.stack.pop();
            machine.stack.push(tier::saturating_diff(newer, older));
            Ok(())
        }
        Opcode::UpdateTimesForTierRange => {
            let range = TierRange::decode(operand);
            let time = machine.stack.pop();
            let report = machine.stack.pop();
            machine.stack.push(tier::update_times_for_tier_range(
                report,
                range.start as usize,
                range.end as usize,
                time,
            ));
            Ok(())
        }
        Opcode::TruncateTiersAbove => {
            let report = machine.stack.pop();
            machine
                .stack
                .push(tier::truncate_tiers_above(report, operand as usize));
            Ok(())
        }

        Opcode::ShuffleIdAtIndex => {
            let index = machine.stack.pop();
            let length = machine.stack.pop();
            let seed = machine.stack.pop();
            machine.stack.push(rng::id_at_index(seed, length, index));
            Ok(())
        }
    }
}

/// Arity rule shared by every arithmetic fold: the operand is the input
/// count, at least two, consumed for one output.
fn fold_integrity(
    opcode: Opcode,
    state: &mut IntegrityState<'_>,
    operand: u16,
) -> Result<(), IntegrityError> {
    if operand < 2 {
        return Err(IntegrityError::MalformedOperand { opcode, operand });
    }
    state.pop(operand as usize)?;
    state.push(1)
}

/// Folds the popped inputs left to right, deepest first.
fn fold_eval<S: StateReader>(
    machine: &mut Machine<'_, S>,
    operand: u16,
    combine: impl Fn(Word, Word) -> Result<Word, MathError>,
) -> Result<(), EvalError> {
    let inputs = machine.stack.pop_n(operand as usize);
    let mut folded = inputs[0];
    for &input in &inputs[1..] {
        folded = combine(folded, input)?;
    }
    machine.stack.push(folded);
    Ok(())
}

fn infallible(op: fn(Word, Word) -> Word) -> impl Fn(Word, Word) -> Result<Word, MathError> {
    move |a, b| Ok(op(a, b))
}

/// Packed export of the opcode table for downstream tooling that verifies
/// which opcodes a build supports and in what order: one 2-byte big-endian
/// cell per opcode, in declaration order, so the blob is exactly
/// `2 x opcode count` bytes long.
#[derive(Debug, Clone, Copy, Default)]
pub struct DispatchTable;

impl DispatchTable {
    /// Bytes per table cell.
    pub const CELL_SIZE: usize = 2;

    #[must_use]
    pub fn to_bytes(self) -> Vec<u8> {
        Opcode::iter()
            .flat_map(|opcode| opcode.code().to_be_bytes())
            .collect()
    }
}
