use std::{
    error::Error,
    fmt::{self, Display},
};

const WORD: usize = u64::BITS as usize;

/// Error returned by `PendingSet::take` when a slot can't be marked as received.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingErr {
    OutOfRange { slot: usize, len: usize },
    Duplicate { slot: usize },
}

impl Display for PendingErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange { slot, len } => {
                write!(f, "slot {slot} is out of range for {len} slots")
            }
            Self::Duplicate { slot } => write!(f, "slot {slot} was already received"),
        }
    }
}

impl Error for PendingErr {}

/// Tracks which of a fixed number of slots have not delivered their signal yet in the
/// current round.
///
/// Backed by a bitset, a set bit means the slot is still pending.
#[derive(Debug, Clone)]
pub struct PendingSet {
    words: Box<[u64]>,
    len: usize,
    remaining: usize,
}

impl PendingSet {
    /// Creates a new `PendingSet` with every slot pending.
    ///
    /// # Arguments
    /// * `len` - The amount of slots to track.
    ///
    /// # Returns
    /// A new `PendingSet` instance.
    pub fn new(len: usize) -> Self {
        let mut set = Self {
            words: vec![0; len.div_ceil(WORD)].into_boxed_slice(),
            len,
            remaining: 0,
        };

        set.reset();
        set
    }

    /// Marks every slot as pending again.
    pub fn reset(&mut self) {
        for (i, word) in self.words.iter_mut().enumerate() {
            let bits = (self.len - i * WORD).min(WORD);
            *word = if bits == WORD {
                u64::MAX
            } else {
                (1 << bits) - 1
            };
        }

        self.remaining = self.len;
    }

    /// Marks `slot` as received.
    ///
    /// # Arguments
    /// * `slot` - The slot that delivered its signal.
    ///
    /// # Returns
    /// An error if the slot doesn't exist or was already received this round.
    pub fn take(&mut self, slot: usize) -> Result<(), PendingErr> {
        if slot >= self.len {
            return Err(PendingErr::OutOfRange {
                slot,
                len: self.len,
            });
        }

        let mask = 1 << (slot % WORD);
        let word = &mut self.words[slot / WORD];

        if *word & mask == 0 {
            return Err(PendingErr::Duplicate { slot });
        }

        *word &= !mask;
        self.remaining -= 1;
        Ok(())
    }

    /// Whether `slot` still has to deliver its signal.
    pub fn is_pending(&self, slot: usize) -> bool {
        slot < self.len && self.words[slot / WORD] & (1 << (slot % WORD)) != 0
    }

    /// Whether every slot was received.
    pub fn is_complete(&self) -> bool {
        self.remaining == 0
    }

    pub fn remaining(&self) -> usize {
        self.remaining
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
