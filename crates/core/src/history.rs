//! Snapshot-based undo/redo history
//!
//! History is a single linear timeline: an ordered sequence of snapshots
//! plus a cursor pointing at the current one. Committing after an undo
//! truncates everything beyond the cursor, so there is never a tree of
//! alternative futures.

use serde::{Deserialize, Serialize};

/// Configuration for the history engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Maximum number of snapshots kept, including the current one.
    /// `None` keeps the whole session history.
    pub max_snapshots: Option<usize>,
}

impl HistoryConfig {
    /// Unlimited history
    pub fn unlimited() -> Self {
        Self { max_snapshots: None }
    }

    /// Cap the number of retained snapshots. Values below 2 are raised to 2
    /// so that at least one undo step remains possible.
    pub fn with_max_snapshots(mut self, max: usize) -> Self {
        self.max_snapshots = Some(max.max(2));
        self
    }
}

/// Linear undo/redo history over immutable snapshots
#[derive(Debug, Clone)]
pub struct History<T> {
    /// Snapshots in commit order; never empty
    snapshots: Vec<T>,

    /// Index of the current snapshot
    cursor: usize,

    config: HistoryConfig,
}

impl<T: Clone> History<T> {
    /// Create a history whose only snapshot is `initial`
    pub fn new(initial: T) -> Self {
        Self::with_config(initial, HistoryConfig::default())
    }

    /// Create a history with explicit configuration
    pub fn with_config(initial: T, config: HistoryConfig) -> Self {
        Self { snapshots: vec![initial], cursor: 0, config }
    }

    /// Record a new current state.
    ///
    /// Any snapshots after the cursor (the redo branch) are discarded first.
    pub fn commit(&mut self, snapshot: T) {
        self.snapshots.truncate(self.cursor + 1);
        self.snapshots.push(snapshot);
        self.cursor += 1;

        if let Some(max) = self.config.max_snapshots {
            if self.snapshots.len() > max {
                let overflow = self.snapshots.len() - max;
                self.snapshots.drain(..overflow);
                self.cursor -= overflow;
                log::debug!("history cap reached, dropped {overflow} oldest snapshot(s)");
            }
        }
    }

    /// Step back one snapshot and return the state to restore.
    ///
    /// Returns `None` at the start of history.
    pub fn undo(&mut self) -> Option<T> {
        if self.cursor == 0 {
            log::debug!("nothing to undo");
            return None;
        }
        self.cursor -= 1;
        Some(self.snapshots[self.cursor].clone())
    }

    /// Step forward one snapshot and return the state to restore.
    ///
    /// Returns `None` when already at the newest snapshot.
    pub fn redo(&mut self) -> Option<T> {
        if self.cursor + 1 >= self.snapshots.len() {
            log::debug!("nothing to redo");
            return None;
        }
        self.cursor += 1;
        Some(self.snapshots[self.cursor].clone())
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.snapshots.len()
    }

    /// The snapshot at the cursor
    pub fn current(&self) -> &T {
        &self.snapshots[self.cursor]
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Number of snapshots held, including the current one
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Always false; a history holds at least its initial snapshot.
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Drop the whole timeline and start over from `snapshot`
    pub fn reset(&mut self, snapshot: T) {
        self.snapshots.clear();
        self.snapshots.push(snapshot);
        self.cursor = 0;
    }
}
