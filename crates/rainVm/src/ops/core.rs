//! The core opcodes: pool, stack, context and storage reads, nested source
//! calls, the scratch store and word explosion.
//!
//! Each opcode is two functions that must agree on arity: the integrity rule
//! applied by the static checker and the execution body run by the engine.
//! The eval bodies perform no bounds checks of their own; the matching
//! integrity rule has already proven every access in range.

use crate::{
    bytecode::operand::{CallTarget, ContextRead},
    constant::{MAX_CALL_DEPTH, Word},
    errors::{eval::EvalError, integrity::IntegrityError},
    eval::{Machine, StateReader},
    integrity::IntegrityState,
    memory::Stack,
};

pub(crate) fn constant_integrity(
    state: &mut IntegrityState<'_>,
    operand: u16,
) -> Result<(), IntegrityError> {
    let index = operand as usize;
    let len = state.constants_len();
    if index >= len {
        return Err(IntegrityError::OutOfBoundsConstantRead { index, len });
    }
    state.push(1)
}

pub(crate) fn constant_eval<S: StateReader>(
    machine: &mut Machine<'_, S>,
    operand: u16,
) -> Result<(), EvalError> {
    let value = machine.constant(operand as usize);
    machine.stack.push(value);
    Ok(())
}

pub(crate) fn stack_copy_integrity(
    state: &mut IntegrityState<'_>,
    operand: u16,
) -> Result<(), IntegrityError> {
    state.read_below_top(operand as usize)?;
    state.push(1)
}

pub(crate) fn stack_copy_eval<S: StateReader>(
    machine: &mut Machine<'_, S>,
    operand: u16,
) -> Result<(), EvalError> {
    let value = machine.stack.at(operand as usize);
    machine.stack.push(value);
    Ok(())
}

/// The context's shape is a contract between the program author and the
/// host, unknown at check time, so there is nothing to validate here.
pub(crate) fn context_integrity(
    state: &mut IntegrityState<'_>,
    _operand: u16,
) -> Result<(), IntegrityError> {
    state.push(1)
}

pub(crate) fn context_eval<S: StateReader>(
    machine: &mut Machine<'_, S>,
    operand: u16,
) -> Result<(), EvalError> {
    let ContextRead { row, column } = ContextRead::decode(operand);
    let value = machine.context_cell(row as usize, column as usize);
    machine.stack.push(value);
    Ok(())
}

pub(crate) fn storage_integrity(
    state: &mut IntegrityState<'_>,
    operand: u16,
) -> Result<(), IntegrityError> {
    let range = state.storage_range();
    let slot = u64::from(operand);
    if !range.contains(slot) {
        return Err(IntegrityError::DisallowedStorageSlot {
            slot,
            start: range.pointer,
            end: range.pointer + range.length,
        });
    }
    state.push(1)
}

pub(crate) fn storage_eval<S: StateReader>(
    machine: &mut Machine<'_, S>,
    operand: u16,
) -> Result<(), EvalError> {
    let value = machine.storage_at(u64::from(operand));
    machine.stack.push(value);
    Ok(())
}

pub(crate) fn call_integrity(
    state: &mut IntegrityState<'_>,
    operand: u16,
) -> Result<(), IntegrityError> {
    let target = CallTarget::decode(operand);
    state.pop(target.inputs as usize)?;
    state.nested_call(
        target.source as usize,
        target.inputs as usize,
        target.outputs as usize,
    )?;
    state.push(target.outputs as usize)
}

/// Runs the callee on a fresh stack seeded with the popped inputs, then
/// pushes its top `outputs` values back onto the caller's stack. The scratch
/// store is shared across frames; an error in the callee aborts the whole
/// evaluation.
pub(crate) fn call_eval<S: StateReader>(
    machine: &mut Machine<'_, S>,
    operand: u16,
) -> Result<(), EvalError> {
    let target = CallTarget::decode(operand);
    if machine.depth == MAX_CALL_DEPTH {
        return Err(EvalError::CallDepthExceeded {
            max: MAX_CALL_DEPTH,
        });
    }

    let mut callee_stack = Stack::with_capacity(machine.stack_capacity());
    for value in machine.stack.pop_n(target.inputs as usize) {
        callee_stack.push(value);
    }

    let caller_stack = std::mem::replace(&mut machine.stack, callee_stack);
    machine.depth += 1;
    let outcome = machine.eval_source(target.source as usize);
    machine.depth -= 1;
    let callee_stack = std::mem::replace(&mut machine.stack, caller_stack);
    outcome?;

    for value in callee_stack.tail(target.outputs as usize) {
        machine.stack.push(value);
    }
    Ok(())
}

pub(crate) fn kv_set_integrity(
    state: &mut IntegrityState<'_>,
    _operand: u16,
) -> Result<(), IntegrityError> {
    state.pop(2)
}

pub(crate) fn kv_set_eval<S: StateReader>(
    machine: &mut Machine<'_, S>,
    _operand: u16,
) -> Result<(), EvalError> {
    let value = machine.stack.pop();
    let key = machine.stack.pop();
    machine.kv.set(key, value);
    Ok(())
}

pub(crate) fn kv_get_integrity(
    state: &mut IntegrityState<'_>,
    _operand: u16,
) -> Result<(), IntegrityError> {
    state.pop(1)?;
    state.push(1)
}

pub(crate) fn kv_get_eval<S: StateReader>(
    machine: &mut Machine<'_, S>,
    _operand: u16,
) -> Result<(), EvalError> {
    let key = machine.stack.pop();
    let value = machine.kv.get(key).unwrap_or_default();
    machine.stack.push(value);
    Ok(())
}

pub(crate) fn explode32_integrity(
    state: &mut IntegrityState<'_>,
    _operand: u16,
) -> Result<(), IntegrityError> {
    state.pop(1)?;
    state.push(8)
}

pub(crate) fn explode32_eval<S: StateReader>(
    machine: &mut Machine<'_, S>,
    _operand: u16,
) -> Result<(), EvalError> {
    let word = machine.stack.pop();
    for field in 0usize..8 {
        machine
            .stack
            .push(Word::from((word >> (field * 32)).low_u32()));
    }
    Ok(())
}
