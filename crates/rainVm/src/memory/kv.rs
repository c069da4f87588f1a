use crate::constant::Word;

/// Index into a [`MemoryKv`] returned by a successful key lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KvPtr(usize);

/// Per-evaluation key-value scratch store.
///
/// An append-only association list: the first write to a key fixes its
/// position in iteration order, later writes to the same key overwrite the
/// stored value in place. Keys are unique within one evaluation and the whole
/// store lives exactly one evaluation call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryKv(Vec<(Word, Word)>);

impl MemoryKv {
    /// Writes `value` under `key`, overwriting any earlier value.
    pub fn set(&mut self, key: Word, value: Word) {
        match self.0.iter_mut().find(|(existing, _)| *existing == key) {
            Some(entry) => entry.1 = value,
            None => self.0.push((key, value)),
        }
    }

    /// Looks up `key`. `None` is the "not found" marker; a key never set must
    /// yield it rather than a crash.
    #[must_use]
    pub fn ptr(&self, key: Word) -> Option<KvPtr> {
        self.0
            .iter()
            .position(|(existing, _)| *existing == key)
            .map(KvPtr)
    }

    /// Dereferences a pointer obtained from [`Self::ptr`].
    #[must_use]
    pub fn value_at(&self, ptr: KvPtr) -> Word {
        self.0[ptr.0].1
    }

    /// Convenience lookup straight to the value.
    #[must_use]
    pub fn get(&self, key: Word) -> Option<Word> {
        self.ptr(key).map(|ptr| self.value_at(ptr))
    }

    /// Entries in first-write order, for hosts that persist the store after a
    /// successful evaluation.
    pub fn iter(&self) -> impl Iterator<Item = &(Word, Word)> {
        self.0.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_key_is_not_found() {
        let kv = MemoryKv::default();
        assert_eq!(kv.ptr(Word::from(1u64)), None);
        assert_eq!(kv.get(Word::from(1u64)), None);
    }

    #[test]
    fn test_set_then_read_through_ptr() {
        let mut kv = MemoryKv::default();
        kv.set(Word::from(68u64), Word::from(1337u64));
        let ptr = kv.ptr(Word::from(68u64)).unwrap();
        assert_eq!(kv.value_at(ptr), Word::from(1337u64));
    }

    #[test]
    fn test_overwrite_keeps_first_write_position() {
        let mut kv = MemoryKv::default();
        kv.set(Word::from(1u64), Word::from(10u64));
        kv.set(Word::from(2u64), Word::from(20u64));
        kv.set(Word::from(1u64), Word::from(11u64));

        assert_eq!(kv.len(), 2);
        let entries: Vec<_> = kv.iter().copied().collect();
        assert_eq!(entries[0], (Word::from(1u64), Word::from(11u64)));
        assert_eq!(entries[1], (Word::from(2u64), Word::from(20u64)));
    }
}
