//! Exact, bit-for-bit packing between the word-oriented stack and the
//! byte-oriented buffers external callers expect at trust boundaries.

use crate::constant::Word;

/// Packs each word as 32 big-endian bytes.
#[must_use]
pub fn words_to_bytes(words: &[Word]) -> Vec<u8> {
    let mut bytes = vec![0u8; words.len() * 32];
    for (word, chunk) in words.iter().zip(bytes.chunks_exact_mut(32)) {
        word.to_big_endian(chunk);
    }
    bytes
}

/// Inverse of [`words_to_bytes`]. `None` unless the buffer is a whole number
/// of 32-byte fields.
#[must_use]
pub fn bytes_to_words(bytes: &[u8]) -> Option<Vec<Word>> {
    if bytes.len() % 32 != 0 {
        return None;
    }
    Some(bytes.chunks_exact(32).map(Word::from_big_endian).collect())
}

/// Packs the low 32 bits of each word as 4 big-endian bytes, the compact form
/// for callers that know their values fit 32 bits.
#[must_use]
pub fn words_to_bytes_packed32(words: &[Word]) -> Vec<u8> {
    words
        .iter()
        .flat_map(|word| word.low_u32().to_be_bytes())
        .collect()
}

/// Inverse of [`words_to_bytes_packed32`]. `None` unless the buffer is a
/// whole number of 4-byte fields.
#[must_use]
pub fn bytes_packed32_to_words(bytes: &[u8]) -> Option<Vec<Word>> {
    if bytes.len() % 4 != 0 {
        return None;
    }
    Some(
        bytes
            .chunks_exact(4)
            .map(|chunk| Word::from(u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]])))
            .collect(),
    )
}
