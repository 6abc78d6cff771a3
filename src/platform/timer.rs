//! Cancellable one-shot timers
//!
//! Timers live outside the tick: the scheduler polls them against the host's
//! monotonic clock before each step. Handles are never reused, so a cancelled
//! or replaced timer can't be confused with a newer one.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimerHandle(u64);

#[derive(Debug, Clone)]
struct Pending<T> {
    handle: TimerHandle,
    deadline_ms: f64,
    task: T,
}

/// Set of pending one-shot timers carrying a task payload
#[derive(Debug, Clone)]
pub struct Timers<T> {
    next_id: u64,
    pending: Vec<Pending<T>>,
}

impl<T> Default for Timers<T> {
    fn default() -> Self {
        Self {
            next_id: 1,
            pending: Vec::new(),
        }
    }
}

impl<T> Timers<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm a timer firing `delay_ms` after `now_ms`
    pub fn schedule(&mut self, now_ms: f64, delay_ms: f64, task: T) -> TimerHandle {
        let handle = TimerHandle(self.next_id);
        self.next_id += 1;
        self.pending.push(Pending {
            handle,
            deadline_ms: now_ms + delay_ms.max(0.0),
            task,
        });
        handle
    }

    /// Returns true if the timer was still pending
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        let before = self.pending.len();
        self.pending.retain(|p| p.handle != handle);
        self.pending.len() != before
    }

    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.pending.iter().any(|p| p.handle == handle)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Drop every pending timer
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Remove and return all timers due at `now_ms`, earliest first
    pub fn expire(&mut self, now_ms: f64) -> Vec<(TimerHandle, T)> {
        let mut due = Vec::new();
        let mut i = 0;
        while i < self.pending.len() {
            if self.pending[i].deadline_ms <= now_ms {
                due.push(self.pending.remove(i));
            } else {
                i += 1;
            }
        }
        due.sort_by(|a, b| a.deadline_ms.total_cmp(&b.deadline_ms));
        due.into_iter().map(|p| (p.handle, p.task)).collect()
    }
}
