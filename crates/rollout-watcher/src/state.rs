//! Bucket bookkeeping for one watch run.
//!
//! Resources are referred to by their index in the watcher's collection.
//! Every index is in exactly one of `pending`, `succeeded`, `failed` or
//! `timed_out`; it only ever moves out of `pending`, never back.

use crate::resource::TerminalState;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug)]
pub struct WatchState {
    pending: Vec<usize>,
    succeeded: Vec<usize>,
    failed: Vec<usize>,
    timed_out: Vec<usize>,
    start_time: Instant,
    started_at: Vec<Instant>,
    last_reminder_time: Instant,
}

impl WatchState {
    /// All `count` resources pending, in input order, all started at `now`
    pub fn new(count: usize, now: Instant) -> Self {
        Self {
            pending: (0..count).collect(),
            succeeded: Vec::new(),
            failed: Vec::new(),
            timed_out: Vec::new(),
            start_time: now,
            started_at: vec![now; count],
            last_reminder_time: now,
        }
    }

    pub fn pending(&self) -> &[usize] {
        &self.pending
    }

    pub fn is_done(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn bucket(&self, state: TerminalState) -> &[usize] {
        match state {
            TerminalState::Succeeded => &self.succeeded,
            TerminalState::Failed => &self.failed,
            TerminalState::TimedOut => &self.timed_out,
        }
    }

    /// Number of resources across all buckets
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.pending.len() + self.succeeded.len() + self.failed.len() + self.timed_out.len()
    }

    pub fn elapsed(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.start_time)
    }

    /// Time `index` has been watched as of `now`
    pub fn elapsed_for(&self, index: usize, now: Instant) -> Duration {
        self.started_at
            .get(index)
            .map_or_else(|| self.elapsed(now), |started| now.saturating_duration_since(*started))
    }

    /// Move every pending index `classify` maps to a terminal state into its
    /// bucket. Returns the moved indices in input order.
    pub fn reclassify<F>(&mut self, mut classify: F) -> Vec<(usize, TerminalState)>
    where
        F: FnMut(usize) -> Option<TerminalState>,
    {
        let mut finished = Vec::new();
        self.pending.retain(|&index| match classify(index) {
            Some(state) => {
                finished.push((index, state));
                false
            }
            None => true,
        });

        for &(index, state) in &finished {
            match state {
                TerminalState::Succeeded => self.succeeded.push(index),
                TerminalState::Failed => self.failed.push(index),
                TerminalState::TimedOut => self.timed_out.push(index),
            }
        }

        finished
    }

    pub fn reminder_due(&self, now: Instant, interval: Duration) -> bool {
        now.saturating_duration_since(self.last_reminder_time) >= interval
    }

    pub fn reset_reminder(&mut self, now: Instant) {
        self.last_reminder_time = now;
    }
}
