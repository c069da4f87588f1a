//! Static analysis proving memory safety before any evaluation.
//!
//! The checker walks every instruction of a source without executing it,
//! tracking a simulated stack top. Passing it proves the source can never
//! underflow or overflow the stack nor read an out-of-range constant, stack
//! slot or storage slot at runtime, and yields the maximum stack height so
//! callers can allocate exactly enough memory once.

use tracing::debug;

use crate::{
    bytecode::{Program, Source},
    constant::{MAX_CALL_DEPTH, MAX_STACK_HEIGHT},
    errors::integrity::IntegrityError,
    ops,
};

/// The half-open range `[pointer, pointer + length)` of persistent storage
/// slots a storage-read operand may name. Lets a host audit a source's
/// storage access statically, without executing it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StorageSlotRange {
    pub pointer: u64,
    pub length: u64,
}

impl StorageSlotRange {
    /// A range permitting no storage reads at all.
    pub const EMPTY: Self = Self {
        pointer: 0,
        length: 0,
    };

    #[must_use]
    pub const fn new(pointer: u64, length: u64) -> Self {
        Self { pointer, length }
    }

    #[must_use]
    pub const fn contains(&self, slot: u64) -> bool {
        slot >= self.pointer && slot - self.pointer < self.length
    }
}

/// Checks the program's entrypoint source, starting from an empty stack.
///
/// `min_final_stack` is the number of output values the host contractually
/// requires. Returns the maximum stack height any reachable program point can
/// need, across the entry source and everything it calls.
///
/// Pure: the checker only manipulates simulated offsets, so checking twice
/// yields identical results and no observable state change.
pub fn check_integrity(
    program: &Program,
    storage_range: StorageSlotRange,
    min_final_stack: usize,
) -> Result<usize, IntegrityError> {
    debug!(
        entrypoint = program.entrypoint,
        sources = program.sources.len(),
        constants = program.constants.len(),
        "integrity check"
    );
    let mut state = IntegrityState::new(&program.sources, program.constants.len(), storage_range);
    state.ensure_integrity(program.entrypoint, 0, min_final_stack)?;
    Ok(state.stack_max_top)
}

/// Transient analysis record for one integrity check.
///
/// Created at the start of a check, mutated opcode-by-opcode through the
/// shared dispatch, discarded after the check completes either way.
#[derive(Debug)]
pub struct IntegrityState<'a> {
    sources: &'a [Source],
    constants_len: usize,
    storage_range: StorageSlotRange,
    /// Simulated stack top for the source currently being walked.
    pub(crate) stack_top: usize,
    /// Highest simulated top seen so far, across nested calls.
    pub(crate) stack_max_top: usize,
    depth: usize,
}

impl<'a> IntegrityState<'a> {
    #[must_use]
    pub fn new(
        sources: &'a [Source],
        constants_len: usize,
        storage_range: StorageSlotRange,
    ) -> Self {
        Self {
            sources,
            constants_len,
            storage_range,
            stack_top: 0,
            stack_max_top: 0,
            depth: 0,
        }
    }

    /// Walks one source from `initial_stack_top`, applying every opcode's
    /// integrity rule in order, and requires the source to leave at least
    /// `min_final_stack` values above where it started.
    ///
    /// Returns the final simulated stack top.
    pub fn ensure_integrity(
        &mut self,
        source_index: usize,
        initial_stack_top: usize,
        min_final_stack: usize,
    ) -> Result<usize, IntegrityError> {
        let sources = self.sources;
        let source = sources
            .get(source_index)
            .ok_or(IntegrityError::MissingSource {
                index: source_index,
                count: sources.len(),
            })?;

        self.stack_top = initial_stack_top;
        self.sync_stack_max_top();
        for instruction in &source.0 {
            ops::integrity_dispatch(instruction.opcode, self, instruction.operand)?;
            self.sync_stack_max_top();
        }

        let actual = self.stack_top.saturating_sub(initial_stack_top);
        if actual < min_final_stack {
            return Err(IntegrityError::InsufficientFinalStack {
                actual,
                minimum: min_final_stack,
            });
        }
        Ok(self.stack_top)
    }

    /// Folds the current simulated top into the running maximum. Monotonic
    /// and idempotent; called after every opcode.
    pub(crate) fn sync_stack_max_top(&mut self) {
        self.stack_max_top = self.stack_max_top.max(self.stack_top);
    }

    /// Advances the simulated top by `n` pushed values.
    pub(crate) fn push(&mut self, n: usize) -> Result<(), IntegrityError> {
        let height = self.stack_top + n;
        if height > MAX_STACK_HEIGHT {
            return Err(IntegrityError::StackOverflow {
                height,
                max: MAX_STACK_HEIGHT,
            });
        }
        self.stack_top = height;
        Ok(())
    }

    /// Retreats the simulated top by `n` popped values, proving they exist.
    pub(crate) fn pop(&mut self, n: usize) -> Result<(), IntegrityError> {
        if self.stack_top < n {
            return Err(IntegrityError::OutOfBoundsStackRead {
                index: n,
                height: self.stack_top,
            });
        }
        self.stack_top -= n;
        Ok(())
    }

    /// Proves an absolute slot index is below the current simulated top.
    pub(crate) fn read_below_top(&self, index: usize) -> Result<(), IntegrityError> {
        if index >= self.stack_top {
            return Err(IntegrityError::OutOfBoundsStackRead {
                index,
                height: self.stack_top,
            });
        }
        Ok(())
    }

    pub(crate) const fn constants_len(&self) -> usize {
        self.constants_len
    }

    pub(crate) const fn storage_range(&self) -> StorageSlotRange {
        self.storage_range
    }

    /// Recursively checks a callee source with `inputs` values as its initial
    /// stack, restoring the caller's simulated top afterwards. The callee may
    /// consume its inputs; what matters is that its final stack holds at
    /// least the `outputs` values the caller will copy off its top. The
    /// running maximum threads through the recursion; depth is bounded so
    /// cyclic call graphs fail here.
    pub(crate) fn nested_call(
        &mut self,
        source_index: usize,
        inputs: usize,
        outputs: usize,
    ) -> Result<(), IntegrityError> {
        if self.depth == MAX_CALL_DEPTH {
            return Err(IntegrityError::CallDepthExceeded {
                max: MAX_CALL_DEPTH,
            });
        }
        let caller_top = self.stack_top;
        self.depth += 1;
        let final_top = self.ensure_integrity(source_index, inputs, 0)?;
        self.depth -= 1;
        self.stack_top = caller_top;
        if final_top < outputs {
            return Err(IntegrityError::InsufficientFinalStack {
                actual: final_top,
                minimum: outputs,
            });
        }
        Ok(())
    }
}
