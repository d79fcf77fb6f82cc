//! Virtual clock and cooperative timer scheduler.
//!
//! RULE: Nothing in the core reads wall-clock time.
//! Every delay, cadence and timestamp comes from the Scheduler, which only
//! moves when the engine advances it. Tests drive time explicitly.
//!
//! Timers fire in (due time, scheduling order) order. A repeating timer is
//! re-armed before its owner sees the fire, so cancelling it from inside the
//! handler is always safe.

use crate::types::Millis;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

#[derive(Debug, Clone, Copy)]
struct TimerEntry {
    due:      Millis,
    seq:      u64,
    interval: Option<Millis>,
}

#[derive(Debug, Default)]
pub struct Scheduler {
    now:      Millis,
    next_id:  u64,
    next_seq: u64,
    queue:    BTreeMap<(Millis, u64), TimerId>,
    timers:   HashMap<TimerId, TimerEntry>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Millis {
        self.now
    }

    /// Fire once, `delay` ms from now. A zero delay fires on the next drain
    /// of due timers, never synchronously.
    pub fn schedule_once(&mut self, delay: Millis) -> TimerId {
        self.insert(delay, None)
    }

    /// Fire every `interval` ms, first fire one interval from now.
    pub fn schedule_repeating(&mut self, interval: Millis) -> TimerId {
        assert!(interval > 0, "repeating timer needs a positive interval");
        self.insert(interval, Some(interval))
    }

    /// Cancel a timer. Returns false if it already fired (one-shot) or was
    /// already cancelled; either way the call is harmless.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        match self.timers.remove(&id) {
            Some(entry) => {
                self.queue.remove(&(entry.due, entry.seq));
                true
            }
            None => false,
        }
    }

    pub fn is_active(&self, id: TimerId) -> bool {
        self.timers.contains_key(&id)
    }

    pub fn active_count(&self) -> usize {
        self.timers.len()
    }

    /// Pop the earliest timer due at or before `until`, moving the clock to
    /// its due time. Repeating timers are re-armed.
    pub fn pop_due(&mut self, until: Millis) -> Option<TimerId> {
        let (&(due, seq), &id) = self.queue.iter().next()?;
        if due > until {
            return None;
        }
        self.queue.remove(&(due, seq));
        self.now = self.now.max(due);

        let entry = self.timers.get(&id).copied();
        match entry.and_then(|e| e.interval) {
            Some(interval) => {
                let seq = self.bump_seq();
                let next = TimerEntry { due: due + interval, seq, interval: Some(interval) };
                self.queue.insert((next.due, next.seq), id);
                self.timers.insert(id, next);
            }
            None => {
                self.timers.remove(&id);
            }
        }
        Some(id)
    }

    /// Move the clock forward to `until` once no timers are due before it.
    pub fn settle(&mut self, until: Millis) {
        debug_assert!(
            self.queue.keys().next().is_none_or(|&(due, _)| due > until),
            "settle() called with timers still due"
        );
        self.now = self.now.max(until);
    }

    fn insert(&mut self, delay: Millis, interval: Option<Millis>) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        let seq = self.bump_seq();
        let entry = TimerEntry { due: self.now + delay, seq, interval };
        self.queue.insert((entry.due, entry.seq), id);
        self.timers.insert(id, entry);
        id
    }

    fn bump_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }
}

/// An owned, optional timer handle.
///
/// Cancelling is idempotent: twice, or after a one-shot already fired, is a
/// no-op.
#[derive(Debug, Default)]
pub struct TimerSlot(Option<TimerId>);

impl TimerSlot {
    pub fn empty() -> Self {
        Self(None)
    }

    /// Store a new handle, cancelling whatever was held before.
    pub fn arm(&mut self, scheduler: &mut Scheduler, id: TimerId) {
        self.cancel(scheduler);
        self.0 = Some(id);
    }

    pub fn cancel(&mut self, scheduler: &mut Scheduler) {
        if let Some(id) = self.0.take() {
            scheduler.cancel(id);
        }
    }

    /// True when `id` is the timer held here.
    pub fn holds(&self, id: TimerId) -> bool {
        self.0 == Some(id)
    }

    /// Forget a one-shot handle that has just fired.
    pub fn clear_fired(&mut self, id: TimerId) {
        if self.holds(id) {
            self.0 = None;
        }
    }

    pub fn is_armed(&self) -> bool {
        self.0.is_some()
    }
}
