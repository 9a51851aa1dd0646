//! Linear undo/redo history over document snapshots.
//!
//! ```text
//!   entries:  [s0] [s1] [s2] [s3]
//!                        ^cursor
//!   undo -> s1, redo -> s3, record(s4) -> [s0] [s1] [s2] [s4]
//! ```
//!
//! Recording after an undo discards everything past the cursor; branching
//! history is not kept.

/// Identifies a run of edits that may collapse into one history entry: the
/// same element and the same set of patched fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoalesceKey {
    /// Target element id.
    pub element: String,
    /// Sorted patched field names.
    pub fields: Vec<String>,
}

/// History behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryConfig {
    /// Oldest snapshots are evicted beyond this many; `None` (the default)
    /// keeps all.
    pub max_entries: Option<usize>,
    /// Collapse consecutive edits sharing a [`CoalesceKey`] into one entry.
    pub coalesce: bool,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_entries: None,
            coalesce: false,
        }
    }
}

/// Snapshot stack with a cursor.
#[derive(Debug, Clone)]
pub struct History<T> {
    entries: Vec<T>,
    /// Index of the current snapshot; `None` while empty.
    cursor: Option<usize>,
    config: HistoryConfig,
    last_key: Option<CoalesceKey>,
}

impl<T> Default for History<T> {
    fn default() -> Self {
        Self::new(HistoryConfig::default())
    }
}

impl<T> History<T> {
    /// Create an empty history.
    #[must_use]
    pub fn new(config: HistoryConfig) -> Self {
        Self {
            entries: Vec::new(),
            cursor: None,
            config,
            last_key: None,
        }
    }

    /// Record a snapshot as the new current state.
    pub fn record(&mut self, snapshot: T) {
        self.push(snapshot, None);
    }

    /// Record a snapshot that may replace the current entry when it continues
    /// the previous edit run.
    pub fn record_coalesced(&mut self, snapshot: T, key: CoalesceKey) {
        self.push(snapshot, Some(key));
    }

    fn push(&mut self, snapshot: T, key: Option<CoalesceKey>) {
        let at_top = self.cursor.is_some() && self.cursor == self.entries.len().checked_sub(1);
        if self.config.coalesce && at_top && key.is_some() && key == self.last_key {
            if let Some(top) = self.entries.last_mut() {
                *top = snapshot;
                tracing::trace!("history: coalesced into entry {}", self.entries.len() - 1);
                return;
            }
        }

        let keep = self.cursor.map_or(0, |c| c + 1);
        let discarded = self.entries.len().saturating_sub(keep);
        self.entries.truncate(keep);
        self.entries.push(snapshot);
        self.last_key = key;

        if let Some(max) = self.config.max_entries {
            let max = max.max(1);
            if self.entries.len() > max {
                let excess = self.entries.len() - max;
                self.entries.drain(..excess);
            }
        }
        self.cursor = Some(self.entries.len() - 1);

        tracing::debug!(
            "history: recorded entry {} ({} redo states discarded)",
            self.entries.len() - 1,
            discarded
        );
    }

    /// Step back one snapshot. No-op at the oldest entry.
    pub fn undo(&mut self) -> Option<&T> {
        match self.cursor {
            Some(c) if c > 0 => {
                self.cursor = Some(c - 1);
                self.last_key = None;
                tracing::debug!("history: undo to entry {}", c - 1);
                self.entries.get(c - 1)
            }
            _ => None,
        }
    }

    /// Step forward one snapshot. No-op at the newest entry.
    pub fn redo(&mut self) -> Option<&T> {
        match self.cursor {
            Some(c) if c + 1 < self.entries.len() => {
                self.cursor = Some(c + 1);
                self.last_key = None;
                tracing::debug!("history: redo to entry {}", c + 1);
                self.entries.get(c + 1)
            }
            _ => None,
        }
    }

    /// The snapshot at the cursor.
    #[must_use]
    pub fn current(&self) -> Option<&T> {
        self.cursor.and_then(|c| self.entries.get(c))
    }

    /// Cursor position; `None` while empty.
    #[must_use]
    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// Whether `undo` would move.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.cursor.is_some_and(|c| c > 0)
    }

    /// Whether `redo` would move.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.cursor.is_some_and(|c| c + 1 < self.entries.len())
    }

    /// Number of stored snapshots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop all snapshots.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = None;
        self.last_key = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(element: &str, field: &str) -> CoalesceKey {
        CoalesceKey {
            element: element.to_string(),
            fields: vec![field.to_string()],
        }
    }

    #[test]
    fn test_empty_history() {
        let mut history: History<u32> = History::default();
        assert!(history.is_empty());
        assert_eq!(history.cursor(), None);
        assert_eq!(history.undo(), None);
        assert_eq!(history.redo(), None);
        assert_eq!(history.current(), None);
    }

    #[test]
    fn test_undo_redo_walks_the_stack() {
        let mut history = History::default();
        for n in 0..4 {
            history.record(n);
        }
        assert_eq!(history.cursor(), Some(3));

        assert_eq!(history.undo(), Some(&2));
        assert_eq!(history.undo(), Some(&1));
        assert_eq!(history.undo(), Some(&0));
        assert_eq!(history.undo(), None);
        assert_eq!(history.current(), Some(&0));

        assert_eq!(history.redo(), Some(&1));
        assert_eq!(history.redo(), Some(&2));
        assert_eq!(history.redo(), Some(&3));
        assert_eq!(history.redo(), None);
        assert_eq!(history.current(), Some(&3));
    }

    #[test]
    fn test_record_after_undo_truncates_redo() {
        let mut history = History::default();
        history.record("a");
        history.record("b");
        history.record("c");
        history.undo();
        history.undo();
        history.record("d");

        assert_eq!(history.len(), 2);
        assert!(!history.can_redo());
        assert_eq!(history.current(), Some(&"d"));
        assert_eq!(history.undo(), Some(&"a"));
    }

    #[test]
    fn test_max_entries_evicts_oldest() {
        let mut history = History::new(HistoryConfig {
            max_entries: Some(3),
            coalesce: false,
        });
        for n in 0..5 {
            history.record(n);
        }
        assert_eq!(history.len(), 3);
        assert_eq!(history.current(), Some(&4));
        assert_eq!(history.undo(), Some(&3));
        assert_eq!(history.undo(), Some(&2));
        assert_eq!(history.undo(), None);
    }

    #[test]
    fn test_coalescing_replaces_top_entry() {
        let mut history = History::new(HistoryConfig {
            max_entries: None,
            coalesce: true,
        });
        history.record(0);
        history.record_coalesced(1, key("a", "fill"));
        history.record_coalesced(2, key("a", "fill"));
        history.record_coalesced(3, key("a", "fill"));
        assert_eq!(history.len(), 2);
        assert_eq!(history.current(), Some(&3));

        history.record_coalesced(4, key("a", "x"));
        assert_eq!(history.len(), 3);
        assert_eq!(history.undo(), Some(&3));
        assert_eq!(history.undo(), Some(&0));
    }

    #[test]
    fn test_coalescing_disabled_keeps_every_entry() {
        let mut history = History::default();
        history.record_coalesced(1, key("a", "fill"));
        history.record_coalesced(2, key("a", "fill"));
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn test_undo_breaks_coalescing_run() {
        let mut history = History::new(HistoryConfig {
            max_entries: None,
            coalesce: true,
        });
        history.record(0);
        history.record_coalesced(1, key("a", "fill"));
        history.record(2);
        history.undo();
        history.record_coalesced(3, key("a", "fill"));
        assert_eq!(history.len(), 3);
        assert_eq!(history.current(), Some(&3));
    }
}
