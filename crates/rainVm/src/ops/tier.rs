//! Tier-report bit packing.
//!
//! A report is one word packed into eight 32-bit sub-fields; sub-field `i`
//! holds the time at which tier `i + 1` was reached, with an all-ones
//! sub-field meaning "never reached".

use crate::constant::{MAX_TIER, NEVER_REPORT, NEVER_TIME, Word};

/// Reads sub-field `tier` of a report.
#[must_use]
pub fn tier_time(report: Word, tier: usize) -> u32 {
    debug_assert!(tier < MAX_TIER);
    (report >> (tier * 32)).low_u32()
}

/// Subtracts two reports sub-field by sub-field, saturating at zero so the
/// result never underflows.
#[must_use]
pub fn saturating_diff(newer: Word, older: Word) -> Word {
    let mut diff = Word::zero();
    for tier in 0..MAX_TIER {
        let field = tier_time(newer, tier).saturating_sub(tier_time(older, tier));
        diff = diff | (Word::from(field) << (tier * 32));
    }
    diff
}

/// Rewrites sub-fields `start..end` to the low 32 bits of `time`, leaving the
/// rest untouched. Callers must have validated `end <= MAX_TIER`.
#[must_use]
pub fn update_times_for_tier_range(report: Word, start: usize, end: usize, time: Word) -> Word {
    debug_assert!(end <= MAX_TIER);
    let field = Word::from(time.low_u32());
    let mut updated = report;
    for tier in start..end {
        let cleared = updated & !(Word::from(NEVER_TIME) << (tier * 32));
        updated = cleared | (field << (tier * 32));
    }
    updated
}

/// Forces every sub-field at index `tier` and above to the never-reached
/// marker, leaving lower sub-fields untouched.
#[must_use]
pub fn truncate_tiers_above(report: Word, tier: usize) -> Word {
    if tier >= MAX_TIER {
        return report;
    }
    report | (NEVER_REPORT << (tier * 32))
}
