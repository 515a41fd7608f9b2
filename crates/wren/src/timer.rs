use std::collections::BTreeMap;
use std::time::Duration;

use crate::enhance::CopyControlId;

/// Identifies a scheduled task so it can be cancelled.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy)]
pub struct TimerId(u64);

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum TimerTask {
    /// Puts a copy control's label back after the "copied" feedback.
    ResetCopyLabel(CopyControlId),
}

/// Tasks scheduled against the page's own notion of elapsed time.
///
/// Nothing runs on its own: the host moves time forward with
/// [`Timers::advance`] and receives the tasks that came due.
#[derive(Debug, Default)]
pub struct Timers {
    now: Duration,
    next_id: u64,
    pending: BTreeMap<(Duration, TimerId), TimerTask>,
}

impl Timers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Time elapsed since the page was opened.
    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn schedule(&mut self, delay: Duration, task: TimerTask) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.pending.insert((self.now + delay, id), task);
        id
    }

    /// Cancels a pending task. Returns `false` if it already ran or was
    /// cancelled before.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let key = self.pending.keys().find(|(_, pending)| *pending == id).copied();

        match key {
            Some(key) => self.pending.remove(&key).is_some(),
            None => false,
        }
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.pending.keys().any(|(_, pending)| *pending == id)
    }

    /// Moves time forward by `by` and returns the tasks that came due, in the
    /// order they were due.
    pub fn advance(&mut self, by: Duration) -> Vec<(TimerId, TimerTask)> {
        self.now += by;

        let mut due = Vec::new();
        while let Some(entry) = self.pending.first_entry() {
            if entry.key().0 > self.now {
                break;
            }

            let (_, id) = *entry.key();
            due.push((id, entry.remove()));
        }

        due
    }
}
