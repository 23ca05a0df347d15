/// Id used before the first successful fetch.
pub const NEVER_POLLED: i64 = -1;

/// Outcome of comparing a fetched `max_id` with the last one seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    Unchanged,
    Updated { previous: i64 },
}

/// Remembers the newest search result id across poll cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeDetector {
    last_seen_id: i64,
}

impl Default for ChangeDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeDetector {
    pub fn new() -> Self {
        Self {
            last_seen_id: NEVER_POLLED,
        }
    }

    pub fn last_seen_id(&self) -> i64 {
        self.last_seen_id
    }

    /// Record `max_id` from a successful fetch. Always leaves `last_seen_id == max_id`.
    pub fn observe(&mut self, max_id: i64) -> Change {
        if max_id == self.last_seen_id {
            return Change::Unchanged;
        }
        let previous = std::mem::replace(&mut self.last_seen_id, max_id);
        Change::Updated { previous }
    }
}
