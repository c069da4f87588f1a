use crate::constant::Word;

/// The evaluation stack: a contiguous region of words plus a top offset.
///
/// The top is the index of the next free slot and doubles as the current
/// height. The region is sized up front from the integrity-computed maximum,
/// so the mutating methods do not range-check in release builds; the
/// `debug_assert!`s exist to catch checker/executor disagreement during
/// development. Calling them on a source that never passed the integrity
/// check is a caller bug.
#[derive(Debug, Clone, Default)]
pub struct Stack {
    cells: Vec<Word>,
    top: usize,
}

impl Stack {
    /// Allocates a stack able to hold `max_height` words.
    #[must_use]
    pub fn with_capacity(max_height: usize) -> Self {
        Self {
            cells: vec![Word::zero(); max_height],
            top: 0,
        }
    }

    /// Current height in words.
    #[must_use]
    pub const fn height(&self) -> usize {
        self.top
    }

    /// The live region, bottom first.
    #[must_use]
    pub fn as_slice(&self) -> &[Word] {
        &self.cells[..self.top]
    }

    pub fn push(&mut self, value: Word) {
        debug_assert!(self.top < self.cells.len(), "push past allocated stack");
        self.cells[self.top] = value;
        self.top += 1;
    }

    pub fn pop(&mut self) -> Word {
        debug_assert!(self.top > 0, "pop on empty stack");
        self.top -= 1;
        self.cells[self.top]
    }

    /// Pops `n` values, returned bottom first (the order they were pushed).
    pub fn pop_n(&mut self, n: usize) -> Vec<Word> {
        debug_assert!(self.top >= n, "pop_n below stack base");
        let values = self.cells[self.top - n..self.top].to_vec();
        self.top -= n;
        values
    }

    /// Reads the value just below the top without consuming it.
    #[must_use]
    pub fn peek(&self) -> Word {
        debug_assert!(self.top > 0, "peek on empty stack");
        self.cells[self.top - 1]
    }

    /// Reads an absolute slot below the proven top.
    #[must_use]
    pub fn at(&self, index: usize) -> Word {
        debug_assert!(index < self.top, "read above stack top");
        self.cells[index]
    }

    /// The last `max_outputs` values, bottom first; the whole stack when it
    /// is shorter, empty when `max_outputs` is zero.
    #[must_use]
    pub fn tail(&self, max_outputs: usize) -> Vec<Word> {
        let start = self.top.saturating_sub(max_outputs);
        self.cells[start..self.top].to_vec()
    }

    /// Scans downward for `sentinel` delimiting whole `step`-word groups:
    /// candidates are the word just below the top, then every `step` words
    /// further down, so the sentinel is found however many groups sit above
    /// it.
    ///
    /// On a match, returns the values that sat above the sentinel (bottom
    /// first) and leaves the top just below it. Returns `None` when the scan
    /// passes the stack base, which bounds the search by the live region; a
    /// failed scan does not move the top.
    pub fn consume_sentinel(&mut self, sentinel: Word, step: usize) -> Option<Vec<Word>> {
        debug_assert!(step > 0, "zero-stride sentinel scan");
        let mut index = self.top.checked_sub(1)?;
        loop {
            if self.cells[index] == sentinel {
                let consumed = self.cells[index + 1..self.top].to_vec();
                self.top = index;
                return Some(consumed);
            }
            index = index.checked_sub(step)?;
        }
    }
}
