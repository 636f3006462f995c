/// Delegate memory — a sliding window over the most recent dialogue.

use std::collections::VecDeque;

use crate::schema::dialogue::DialogueRecord;

/// Lines a delegate remembers before the oldest is forgotten.
pub const HISTORY_LIMIT: usize = 20;

/// Ordered, oldest first. Never holds more than its limit.
#[derive(Debug, Clone)]
pub struct BoundedHistory {
    /// Kept contiguous after every `record`, so `as_slice` sees all of it.
    entries: VecDeque<DialogueRecord>,
    limit: usize,
}

impl Default for BoundedHistory {
    fn default() -> Self {
        Self::with_limit(HISTORY_LIMIT)
    }
}

impl BoundedHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(limit),
            limit,
        }
    }

    pub fn record(&mut self, entry: DialogueRecord) {
        if self.limit == 0 {
            return;
        }
        if self.entries.len() == self.limit {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
        self.entries.make_contiguous();
    }

    /// Record the tail of `log` that fits.
    pub fn seed_from(&mut self, log: &[DialogueRecord]) {
        let start = log.len().saturating_sub(self.limit);
        for entry in &log[start..] {
            self.record(entry.clone());
        }
    }

    pub fn as_slice(&self) -> &[DialogueRecord] {
        self.entries.as_slices().0
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

}
