//! Word arithmetic in two flavors: checked variants abort the evaluation on
//! overflow, underflow or a zero divisor; saturating variants clamp to the
//! representable range. Programs choose per opcode, not via a runtime flag.

use crate::{constant::Word, errors::math::MathError};

pub fn checked_add(a: Word, b: Word) -> Result<Word, MathError> {
    a.checked_add(b).ok_or(MathError::Overflow { a, b })
}

pub fn checked_sub(a: Word, b: Word) -> Result<Word, MathError> {
    a.checked_sub(b).ok_or(MathError::Underflow { a, b })
}

pub fn checked_mul(a: Word, b: Word) -> Result<Word, MathError> {
    a.checked_mul(b).ok_or(MathError::Overflow { a, b })
}

pub fn checked_div(a: Word, b: Word) -> Result<Word, MathError> {
    a.checked_div(b).ok_or(MathError::DivisionByZero)
}

pub fn checked_rem(a: Word, b: Word) -> Result<Word, MathError> {
    a.checked_rem(b).ok_or(MathError::DivisionByZero)
}

/// `min(a + b, MAX)`.
#[must_use]
pub fn saturating_add(a: Word, b: Word) -> Word {
    a.checked_add(b).unwrap_or_else(Word::max_value)
}

/// `max(a - b, 0)`.
#[must_use]
pub fn saturating_sub(a: Word, b: Word) -> Word {
    a.checked_sub(b).unwrap_or_else(Word::zero)
}

/// `min(a * b, MAX)`.
#[must_use]
pub fn saturating_mul(a: Word, b: Word) -> Word {
    a.checked_mul(b).unwrap_or_else(Word::max_value)
}
