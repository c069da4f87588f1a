use ethereum_types::U256;

/// The machine word.
///
/// Stack slots, constants, context cells and storage values are all 256-bit
/// unsigned integers, matching the word width of the host chain.
pub type Word = U256;

/// Hard cap on the simulated stack height.
///
/// The integrity checker rejects any program that could grow its stack past
/// this many words, so the evaluator never allocates more than this.
pub const MAX_STACK_HEIGHT: usize = 0xFFFF;

/// Maximum nesting of source-to-source calls.
///
/// Enforced identically by the integrity checker and the evaluator, which
/// also bounds the cost of cyclic call graphs: a self-recursive source fails
/// the check instead of looping forever.
pub const MAX_CALL_DEPTH: usize = 8;

/// Number of tiers packed into one report word, 32 bits each.
pub const MAX_TIER: usize = 8;

/// Sub-field value marking a tier that was never reached.
pub const NEVER_TIME: u32 = u32::MAX;

/// A report with every tier unreached.
pub const NEVER_REPORT: Word = U256([u64::MAX; 4]);

/// Reserved word delimiting the end of a variable-length list on the stack.
///
/// The high limb carries a fixed random pattern so that a collision with a
/// computed value is vanishingly unlikely.
pub const LIST_SENTINEL: Word = U256([0, 0, 0, 0xF7A6_5399_683C_D911]);

/// Longest index range the shuffle opcode will permute.
///
/// Lookups against a longer range behave as if no shuffle state exists and
/// yield zero, keeping worst-case evaluation cost bounded.
pub const MAX_SHUFFLE_LENGTH: u64 = 0xFFFF;
