//! Deterministic seeded shuffles.
//!
//! A shuffle is the Fisher-Yates permutation of the ids `1..=length`, driven
//! by a ChaCha20 stream keyed from an explicit seed word. The same seed and
//! length always yield the same permutation, on every host.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

use crate::constant::{MAX_SHUFFLE_LENGTH, Word};

fn rng_from_seed(seed: Word) -> ChaCha20Rng {
    let mut key = [0u8; 32];
    seed.to_big_endian(&mut key);
    ChaCha20Rng::from_seed(key)
}

/// The full permutation of `1..=length` for a seed.
#[must_use]
pub fn shuffled_ids(seed: Word, length: u64) -> Vec<u64> {
    let mut ids: Vec<u64> = (1..=length).collect();
    let mut rng = rng_from_seed(seed);
    for i in (1..ids.len()).rev() {
        let j = rng.gen_range(0..=i);
        ids.swap(i, j);
    }
    ids
}

/// The id at `index` of the seeded shuffle of `1..=length`.
///
/// Yields zero, never an error, for an out-of-range index, a zero length, or
/// a length past [`MAX_SHUFFLE_LENGTH`] (treated as absent shuffle state).
#[must_use]
pub fn id_at_index(seed: Word, length: Word, index: Word) -> Word {
    if length.is_zero() || length > Word::from(MAX_SHUFFLE_LENGTH) || index >= length {
        return Word::zero();
    }
    let ids = shuffled_ids(seed, length.low_u64());
    Word::from(ids[index.low_u64() as usize])
}
