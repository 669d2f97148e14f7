//! One-shot timer queue backing timeout-bearing watches.
//!
//! A binary heap of deadline entries drained by a single lazily-spawned
//! worker thread that parks on a condvar until the earliest deadline.
//! Cancellation is best-effort by id; callers needing exactly-once
//! semantics guard their callbacks with their own settle state.

use std::collections::{BinaryHeap, HashSet};
use std::sync::{Arc, Weak};
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex, MutexGuard};

type TimerCallback = Box<dyn FnOnce() + Send>;

/// A pending timer entry.
struct TimerEntry {
    deadline: Instant,
    /// Unique id, used for cancellation and stable ordering.
    id: u64,
    callback: TimerCallback,
}

impl PartialEq for TimerEntry {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline && self.id == other.id
    }
}

impl Eq for TimerEntry {}

impl PartialOrd for TimerEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimerEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Reverse order for min-heap behavior (earliest deadline first)
        other
            .deadline
            .cmp(&self.deadline)
            .then_with(|| other.id.cmp(&self.id))
    }
}

struct TimerState {
    pending: BinaryHeap<TimerEntry>,
    cancelled: HashSet<u64>,
    next_id: u64,
    worker_alive: bool,
    shutdown: bool,
}

struct TimerShared {
    state: Mutex<TimerState>,
    tick: Condvar,
}

/// A queue of one-shot timers served by one background worker thread.
///
/// Dropping the queue shuts the worker down; callbacks still pending at
/// that point are never run.
pub(crate) struct TimerQueue {
    inner: Arc<TimerShared>,
}

impl TimerQueue {
    pub(crate) fn new() -> Self {
        Self {
            inner: Arc::new(TimerShared {
                state: Mutex::new(TimerState {
                    pending: BinaryHeap::new(),
                    cancelled: HashSet::new(),
                    next_id: 0,
                    worker_alive: false,
                    shutdown: false,
                }),
                tick: Condvar::new(),
            }),
        }
    }

    /// Schedules `callback` to run on the worker thread after `delay`.
    pub(crate) fn schedule(
        &self,
        delay: Duration,
        callback: impl FnOnce() + Send + 'static,
    ) -> TimerHandle {
        let id = {
            let mut state = self.inner.state.lock();
            let id = state.next_id;
            state.next_id += 1;
            state.pending.push(TimerEntry {
                deadline: Instant::now() + delay,
                id,
                callback: Box::new(callback),
            });
            if !state.worker_alive {
                state.worker_alive = true;
                let shared = Arc::clone(&self.inner);
                thread::spawn(move || run_worker(&shared));
            }
            id
        };
        self.inner.tick.notify_one();
        TimerHandle {
            id,
            shared: Arc::downgrade(&self.inner),
        }
    }
}

impl Drop for TimerQueue {
    fn drop(&mut self) {
        let mut state = self.inner.state.lock();
        state.shutdown = true;
        drop(state);
        self.inner.tick.notify_one();
    }
}

/// A handle to one scheduled timer; cancellation is best-effort.
#[derive(Debug)]
pub(crate) struct TimerHandle {
    id: u64,
    shared: Weak<TimerShared>,
}

impl TimerHandle {
    /// Prevents the callback from running if it has not started yet.
    pub(crate) fn cancel(&self) {
        let Some(shared) = self.shared.upgrade() else {
            return;
        };
        let mut state = shared.state.lock();
        if state.pending.iter().any(|entry| entry.id == self.id) {
            state.cancelled.insert(self.id);
        }
        drop(state);
        shared.tick.notify_one();
    }
}

fn run_worker(shared: &TimerShared) {
    let mut state = shared.state.lock();
    loop {
        // Discard cancelled entries sitting at the front of the queue.
        {
            let TimerState {
                pending, cancelled, ..
            } = &mut *state;
            while let Some(entry) = pending.peek() {
                if cancelled.remove(&entry.id) {
                    pending.pop();
                } else {
                    break;
                }
            }
        }

        if state.shutdown {
            state.worker_alive = false;
            return;
        }

        let Some(deadline) = state.pending.peek().map(|entry| entry.deadline) else {
            shared.tick.wait(&mut state);
            continue;
        };

        if deadline <= Instant::now() {
            if let Some(entry) = state.pending.pop() {
                // Run the callback with the lock released so it may
                // schedule or cancel timers itself.
                MutexGuard::unlocked(&mut state, entry.callback);
            }
        } else {
            // Either the deadline passes or a schedule/cancel re-wakes us;
            // both cases just re-run the loop.
            let _ = shared.tick.wait_until(&mut state, deadline);
        }
    }
}
