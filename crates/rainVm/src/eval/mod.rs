//! The execution engine.
//!
//! Evaluates one already-checked program against a constants pool, a
//! caller-supplied context and a storage reader. The loop performs no bounds
//! checks of its own on stack or constant addressing; running a source that
//! has not passed [`check_integrity`](crate::integrity::check_integrity) is a
//! caller bug with undefined results. Evaluation is synchronous and
//! single-threaded: it runs to completion or aborts atomically, dropping
//! every stack and scratch-store mutation made along the way.

use std::collections::HashMap;

use tracing::{debug, trace};

use crate::{
    bytecode::Program,
    constant::Word,
    errors::{VmError, eval::EvalError},
    integrity::{StorageSlotRange, check_integrity},
    memory::{MemoryKv, Stack},
    ops,
};

/// Read access to the host's persistent storage.
///
/// Storage is the only cross-evaluation shared resource; the host's
/// transaction ordering keeps whole evaluations serialized, so the reader
/// sees a stable snapshot for the duration of one run.
pub trait StateReader {
    fn storage_at(&self, slot: u64) -> Word;
}

/// A [`StateReader`] with nothing in it.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyState;

impl StateReader for EmptyState {
    fn storage_at(&self, _slot: u64) -> Word {
        Word::zero()
    }
}

/// Map-backed [`StateReader`] for hosts and tests. Unset slots read as zero.
#[derive(Debug, Clone, Default)]
pub struct MemoryState(HashMap<u64, Word>);

impl MemoryState {
    pub fn set(&mut self, slot: u64, value: Word) {
        self.0.insert(slot, value);
    }
}

impl StateReader for MemoryState {
    fn storage_at(&self, slot: u64) -> Word {
        self.0.get(&slot).copied().unwrap_or_default()
    }
}

/// One evaluation in flight: the program and its runtime inputs plus the
/// stack and scratch store being built.
///
/// Constructed fresh per call and consumed by [`run`](Self::run); dropping it
/// on error is the transactional rollback.
#[derive(Debug)]
pub struct Machine<'a, S: StateReader> {
    program: &'a Program,
    context: &'a [Vec<Word>],
    storage: &'a S,
    stack_capacity: usize,
    pub(crate) stack: Stack,
    pub(crate) kv: MemoryKv,
    pub(crate) depth: usize,
}

impl<'a, S: StateReader> Machine<'a, S> {
    /// Readies an evaluation. `max_stack_height` is the value
    /// `check_integrity` reported for this program at registration time.
    #[must_use]
    pub fn new(
        program: &'a Program,
        context: &'a [Vec<Word>],
        storage: &'a S,
        max_stack_height: usize,
    ) -> Self {
        Self {
            program,
            context,
            storage,
            stack_capacity: max_stack_height,
            stack: Stack::with_capacity(max_stack_height),
            kv: MemoryKv::default(),
            depth: 0,
        }
    }

    /// Evaluates the entry source and returns the tail of the final stack:
    /// at most `max_outputs` values, those closest to the top.
    pub fn run(mut self, max_outputs: usize) -> Result<Vec<Word>, EvalError> {
        debug!(entrypoint = self.program.entrypoint, "eval");
        self.eval_source(self.program.entrypoint)?;
        Ok(self.stack.tail(max_outputs))
    }

    /// Evaluates the entry source and decodes the sentinel-delimited list the
    /// program left on the final stack: the values above the topmost
    /// `sentinel`, probed at `step`-word strides, bottom first.
    ///
    /// For hosts whose result is variable-length. Fails with
    /// [`EvalError::MissingSentinel`] when no sentinel sits above the stack
    /// base, which means the program broke its list-producing contract.
    pub fn run_list(mut self, sentinel: Word, step: usize) -> Result<Vec<Word>, EvalError> {
        debug!(entrypoint = self.program.entrypoint, "eval");
        self.eval_source(self.program.entrypoint)?;
        self.stack
            .consume_sentinel(sentinel, step)
            .ok_or(EvalError::MissingSentinel)
    }

    /// Evaluates the entry source and hands back the whole final stack and
    /// scratch store, for hosts that consume sentinel-delimited lists or
    /// persist the store afterwards.
    pub fn run_full(mut self) -> Result<(Stack, MemoryKv), EvalError> {
        debug!(entrypoint = self.program.entrypoint, "eval");
        self.eval_source(self.program.entrypoint)?;
        Ok((self.stack, self.kv))
    }

    /// The instruction loop for one source. Strictly in-order; opcodes pop
    /// their operands in the reverse of push order.
    pub(crate) fn eval_source(&mut self, source_index: usize) -> Result<(), EvalError> {
        let program = self.program;
        let source = program
            .sources
            .get(source_index)
            .ok_or(EvalError::MissingSource {
                index: source_index,
                count: program.sources.len(),
            })?;
        for (pc, instruction) in source.0.iter().enumerate() {
            trace!(source_index, pc, opcode = ?instruction.opcode, "step");
            ops::eval_dispatch(instruction.opcode, self, instruction.operand)?;
        }
        Ok(())
    }

    pub(crate) fn constant(&self, index: usize) -> Word {
        debug_assert!(index < self.program.constants.len());
        self.program.constants[index]
    }

    /// Absent cells read as zero: the context's shape is the host's contract
    /// with the program author, not something the interpreter can detect.
    pub(crate) fn context_cell(&self, row: usize, column: usize) -> Word {
        self.context
            .get(row)
            .and_then(|cells| cells.get(column))
            .copied()
            .unwrap_or_default()
    }

    pub(crate) fn storage_at(&self, slot: u64) -> Word {
        self.storage.storage_at(slot)
    }

    pub(crate) const fn stack_capacity(&self) -> usize {
        self.stack_capacity
    }
}

/// Registration and evaluation in one step: checks the program's integrity,
/// then evaluates it with a stack sized to the reported maximum.
///
/// Hosts that registered the program earlier should keep the height from
/// their own `check_integrity` call and use [`Machine`] directly.
pub fn eval<S: StateReader>(
    program: &Program,
    context: &[Vec<Word>],
    storage: &S,
    storage_range: StorageSlotRange,
    max_outputs: usize,
) -> Result<Vec<Word>, VmError> {
    let max_stack_height = check_integrity(program, storage_range, 0)?;
    Machine::new(program, context, storage, max_stack_height)
        .run(max_outputs)
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::{
        bytecode::{
            Source,
            instruction::Instruction,
            opcode::Opcode,
            operand::{CallTarget, ContextRead},
        },
        constant::{LIST_SENTINEL, MAX_TIER, NEVER_REPORT},
        errors::math::MathError,
    };

    fn single_source(instructions: Vec<Instruction>, constants: Vec<Word>) -> Program {
        Program::new(vec![Source(instructions)], constants, 0).unwrap()
    }

    fn run(program: &Program, max_outputs: usize) -> Result<Vec<Word>, VmError> {
        eval(program, &[], &EmptyState, StorageSlotRange::EMPTY, max_outputs)
    }

    #[test]
    fn test_constant_read_evaluates() {
        let program = single_source(
            vec![Instruction::new(Opcode::Constant, 0)],
            vec![Word::from(1337u64)],
        );
        assert_eq!(run(&program, 1).unwrap(), vec![Word::from(1337u64)]);
    }

    #[test]
    fn test_out_of_bounds_constant_never_evaluates() {
        let program = single_source(
            vec![Instruction::new(Opcode::Constant, 1)],
            vec![Word::from(1337u64)],
        );
        assert!(matches!(
            run(&program, 1),
            Err(VmError::Integrity(
                crate::errors::integrity::IntegrityError::OutOfBoundsConstantRead { index: 1, len: 1 }
            ))
        ));
    }

    #[test]
    fn test_max_outputs_keeps_the_tail() {
        let constants: Vec<Word> = (0u64..6).map(Word::from).collect();
        let instructions = (0..6)
            .map(|i| Instruction::new(Opcode::Constant, i))
            .collect();
        let program = single_source(instructions, constants);

        assert_eq!(
            run(&program, 3).unwrap(),
            vec![Word::from(3u64), Word::from(4u64), Word::from(5u64)]
        );
        assert_eq!(run(&program, 0).unwrap(), Vec::<Word>::new());
        assert_eq!(run(&program, 6).unwrap().len(), 6);
        assert_eq!(run(&program, 100).unwrap().len(), 6);
    }

    #[test]
    fn test_checked_add_aborts_saturating_add_clamps() {
        let constants = vec![Word::max_value(), Word::one()];
        let checked = single_source(
            vec![
                Instruction::new(Opcode::Constant, 0),
                Instruction::new(Opcode::Constant, 1),
                Instruction::new(Opcode::Add, 2),
            ],
            constants.clone(),
        );
        assert_eq!(
            run(&checked, 1),
            Err(VmError::Eval(EvalError::Math(MathError::Overflow {
                a: Word::max_value(),
                b: Word::one()
            })))
        );

        let saturating = single_source(
            vec![
                Instruction::new(Opcode::Constant, 0),
                Instruction::new(Opcode::Constant, 1),
                Instruction::new(Opcode::SaturatingAdd, 2),
            ],
            constants,
        );
        assert_eq!(run(&saturating, 1).unwrap(), vec![Word::max_value()]);
    }

    #[test]
    fn test_fold_is_left_to_right_deepest_first() {
        // 100 - 30 - 20 pushed bottom to top.
        let program = single_source(
            vec![
                Instruction::new(Opcode::Constant, 0),
                Instruction::new(Opcode::Constant, 1),
                Instruction::new(Opcode::Constant, 2),
                Instruction::new(Opcode::Sub, 3),
            ],
            vec![Word::from(100u64), Word::from(30u64), Word::from(20u64)],
        );
        assert_eq!(run(&program, 1).unwrap(), vec![Word::from(50u64)]);
    }

    #[test]
    fn test_context_read() {
        let program = single_source(
            vec![Instruction::new(
                Opcode::Context,
                ContextRead { row: 1, column: 2 }.encode(),
            )],
            vec![],
        );
        let context = vec![
            vec![Word::zero()],
            vec![Word::zero(), Word::zero(), Word::from(777u64)],
        ];
        let result = eval(&program, &context, &EmptyState, StorageSlotRange::EMPTY, 1).unwrap();
        assert_eq!(result, vec![Word::from(777u64)]);

        // Absent cells are the host's contract: they read as zero.
        let result = eval(&program, &[], &EmptyState, StorageSlotRange::EMPTY, 1).unwrap();
        assert_eq!(result, vec![Word::zero()]);
    }

    #[test]
    fn test_storage_read_through_state_reader() {
        let mut state = MemoryState::default();
        state.set(9, Word::from(4242u64));
        let program = single_source(vec![Instruction::new(Opcode::Storage, 9)], vec![]);
        let result = eval(&program, &[], &state, StorageSlotRange::new(8, 4), 1).unwrap();
        assert_eq!(result, vec![Word::from(4242u64)]);
    }

    #[test]
    fn test_kv_set_then_get() {
        let program = single_source(
            vec![
                Instruction::new(Opcode::Constant, 0), // key
                Instruction::new(Opcode::Constant, 1), // value
                Instruction::new(Opcode::KvSet, 0),
                Instruction::new(Opcode::Constant, 0), // key again
                Instruction::new(Opcode::KvGet, 0),
            ],
            vec![Word::from(68u64), Word::from(1337u64)],
        );
        assert_eq!(run(&program, 1).unwrap(), vec![Word::from(1337u64)]);
    }

    #[test]
    fn test_kv_get_unset_key_reads_zero() {
        let program = single_source(
            vec![
                Instruction::new(Opcode::Constant, 0),
                Instruction::new(Opcode::KvGet, 0),
            ],
            vec![Word::from(68u64)],
        );
        assert_eq!(run(&program, 1).unwrap(), vec![Word::zero()]);
    }

    #[test]
    fn test_call_runs_callee_on_fresh_stack() {
        // Callee doubles its single input; the caller keeps one output.
        let callee = Source(vec![
            Instruction::new(Opcode::StackCopy, 0),
            Instruction::new(Opcode::Add, 2),
        ]);
        let caller = Source(vec![
            Instruction::new(Opcode::Constant, 0),
            Instruction::new(
                Opcode::Call,
                CallTarget {
                    inputs: 1,
                    outputs: 1,
                    source: 1,
                }
                .encode(),
            ),
        ]);
        let program = Program::new(vec![caller, callee], vec![Word::from(21u64)], 0).unwrap();
        let result = eval(&program, &[], &EmptyState, StorageSlotRange::EMPTY, 1).unwrap();
        assert_eq!(result, vec![Word::from(42u64)]);
    }

    #[test]
    fn test_explode32_pushes_fields_lowest_first() {
        let packed = (Word::from(7u64) << 224usize) | Word::from(3u64);
        let program = single_source(
            vec![
                Instruction::new(Opcode::Constant, 0),
                Instruction::new(Opcode::Explode32, 0),
            ],
            vec![packed],
        );
        let result = run(&program, 8).unwrap();
        assert_eq!(result[0], Word::from(3u64));
        assert_eq!(result[7], Word::from(7u64));
        assert!(result[1..7].iter().all(Word::is_zero));
    }

    #[test]
    fn test_tier_ops_end_to_end() {
        let program = single_source(
            vec![
                Instruction::new(Opcode::Constant, 0),
                Instruction::new(Opcode::TruncateTiersAbove, 4),
            ],
            vec![Word::zero()],
        );
        let result = run(&program, 1).unwrap();
        assert_eq!(result, vec![NEVER_REPORT << (4usize * 32)]);

        // end > MAX_TIER is rejected statically, never evaluated.
        let program = single_source(
            vec![
                Instruction::new(Opcode::Constant, 0),
                Instruction::new(Opcode::TruncateTiersAbove, MAX_TIER as u16 + 1),
            ],
            vec![Word::zero()],
        );
        assert!(matches!(run(&program, 1), Err(VmError::Integrity(_))));
    }

    #[test]
    fn test_shuffle_opcode_is_deterministic() {
        let instructions = vec![
            Instruction::new(Opcode::Constant, 0), // seed
            Instruction::new(Opcode::Constant, 1), // length
            Instruction::new(Opcode::Constant, 2), // index
            Instruction::new(Opcode::ShuffleIdAtIndex, 0),
        ];
        let program = single_source(
            instructions,
            vec![Word::from(42u64), Word::from(10u64), Word::from(3u64)],
        );
        let first = run(&program, 1).unwrap();
        let second = run(&program, 1).unwrap();
        assert_eq!(first, second);
        assert!(!first[0].is_zero() && first[0] <= Word::from(10u64));
    }

    #[test]
    fn test_host_consumes_sentinel_delimited_results() {
        // The program leaves [sentinel, a, b] for its host.
        let program = single_source(
            vec![
                Instruction::new(Opcode::Constant, 0),
                Instruction::new(Opcode::Constant, 1),
                Instruction::new(Opcode::Constant, 2),
            ],
            vec![LIST_SENTINEL, Word::from(5u64), Word::from(6u64)],
        );
        let max = check_integrity(&program, StorageSlotRange::EMPTY, 1).unwrap();
        let (mut stack, _kv) =
            Machine::new(&program, &[], &EmptyState, max).run_full().unwrap();
        let consumed = stack.consume_sentinel(LIST_SENTINEL, 1).unwrap();
        assert_eq!(consumed, vec![Word::from(5u64), Word::from(6u64)]);
        assert_eq!(stack.height(), 0);
    }

    #[test]
    fn test_run_list_returns_values_above_the_sentinel() {
        let program = single_source(
            vec![
                Instruction::new(Opcode::Constant, 0),
                Instruction::new(Opcode::Constant, 1),
                Instruction::new(Opcode::Constant, 2),
            ],
            vec![LIST_SENTINEL, Word::from(5u64), Word::from(6u64)],
        );
        let max = check_integrity(&program, StorageSlotRange::EMPTY, 1).unwrap();
        let list = Machine::new(&program, &[], &EmptyState, max)
            .run_list(LIST_SENTINEL, 1)
            .unwrap();
        assert_eq!(list, vec![Word::from(5u64), Word::from(6u64)]);
    }

    #[test]
    fn test_run_list_without_sentinel_fails() {
        // The program leaves plain values and no sentinel at all.
        let program = single_source(
            vec![
                Instruction::new(Opcode::Constant, 0),
                Instruction::new(Opcode::Constant, 0),
            ],
            vec![Word::one()],
        );
        let max = check_integrity(&program, StorageSlotRange::EMPTY, 1).unwrap();
        let result = Machine::new(&program, &[], &EmptyState, max).run_list(LIST_SENTINEL, 1);
        assert_eq!(result, Err(EvalError::MissingSentinel));
    }

    fn arb_instruction() -> impl Strategy<Value = Instruction> {
        prop_oneof![
            (0u16..6).prop_map(|i| Instruction::new(Opcode::Constant, i)),
            (0u16..6).prop_map(|i| Instruction::new(Opcode::StackCopy, i)),
            (2u16..5).prop_map(|n| Instruction::new(Opcode::SaturatingAdd, n)),
            (2u16..5).prop_map(|n| Instruction::new(Opcode::SaturatingMul, n)),
            Just(Instruction::new(Opcode::Explode32, 0)),
            Just(Instruction::new(Opcode::KvSet, 0)),
            Just(Instruction::new(Opcode::KvGet, 0)),
        ]
    }

    proptest! {
        /// Any program the checker accepts evaluates without ever touching a
        /// slot outside the proven region: the run cannot panic, and the
        /// final height fits the reported maximum. Only infallible opcodes
        /// are generated, so acceptance implies successful evaluation.
        #[test]
        fn prop_checked_programs_evaluate_in_bounds(
            instructions in prop::collection::vec(arb_instruction(), 0..32),
            constants in prop::collection::vec(any::<u64>(), 1..6),
        ) {
            let constants: Vec<Word> = constants.into_iter().map(Word::from).collect();
            let program = Program::new(vec![Source(instructions)], constants, 0).unwrap();
            if let Ok(max) = check_integrity(&program, StorageSlotRange::EMPTY, 0) {
                let (stack, _kv) = Machine::new(&program, &[], &EmptyState, max)
                    .run_full()
                    .unwrap();
                prop_assert!(stack.height() <= max);
            }
        }
    }
}
