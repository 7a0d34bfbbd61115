use std::collections::HashSet;

use catalog_protocol::Entry;

use crate::filter::Epoch;

/// Entries fetched so far for one epoch, in arrival order and unique by id.
#[derive(Debug, Clone, Default)]
pub struct ResultAccumulator {
    epoch: Epoch,
    entries: Vec<Entry>,
    ids: HashSet<u64>,
    total: Option<u64>,
    exhausted: bool,
    not_found: bool,
}

impl ResultAccumulator {
    #[must_use]
    pub fn new(epoch: Epoch) -> Self {
        Self {
            epoch,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn epoch(&self) -> Epoch {
        self.epoch
    }

    #[must_use]
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Server-reported size of the full result set, once a page has arrived.
    #[must_use]
    pub const fn total(&self) -> Option<u64> {
        self.total
    }

    #[must_use]
    pub fn has_more(&self) -> bool {
        if self.exhausted {
            return false;
        }
        self.total
            .is_some_and(|total| total > self.entries.len() as u64)
    }

    /// Set after an id lookup that matched nothing.
    #[must_use]
    pub const fn not_found(&self) -> bool {
        self.not_found
    }

    /// Appends one search page, skipping ids already present. Returns how many were new.
    pub fn append(&mut self, entries: Vec<Entry>, total: u64) -> usize {
        let before = self.entries.len();
        for entry in entries {
            if self.ids.insert(entry.id) {
                self.entries.push(entry);
            } else {
                log::debug!("Skipping duplicate entry {} in epoch {}", entry.id, self.epoch.value());
            }
        }
        self.total = Some(total);
        self.entries.len() - before
    }

    /// Stores the result of an id lookup; nothing more can follow it.
    pub fn set_lookup(&mut self, entry: Option<Entry>) {
        self.entries.clear();
        self.ids.clear();
        self.exhausted = true;
        self.not_found = entry.is_none();
        if let Some(entry) = entry {
            self.ids.insert(entry.id);
            self.entries.push(entry);
        }
        self.total = Some(self.entries.len() as u64);
    }
}
