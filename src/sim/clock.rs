//! Simulation clock with deferred callbacks
//!
//! Time is measured in milliseconds since the clock was created. Deferred
//! work is represented as typed events rather than closures: the owner
//! schedules an `E`, and [`Clock::advance`] hands back every event that came
//! due during the step, in due-time order. Pausing freezes both time and
//! timers.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

/// Identifier of a scheduled timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// A timer that came due during [`Clock::advance`]
#[derive(Debug, Clone, PartialEq)]
pub struct Fired<E> {
    pub id: TimerId,
    /// Timestamp the timer was due at (not the end of the step)
    pub at_ms: f64,
    pub event: E,
}

#[derive(Debug, Clone)]
struct Timer<E> {
    due_ms: f64,
    repeat_ms: Option<f64>,
    event: E,
}

/// Heap entry ordered by earliest due time, then by scheduling order
#[derive(Debug, Clone, Copy)]
struct Slot {
    due_ms: f64,
    seq: u64,
    id: TimerId,
}

impl PartialEq for Slot {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Slot {}

impl PartialOrd for Slot {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Slot {
    // Reversed so BinaryHeap pops the earliest slot first
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .due_ms
            .total_cmp(&self.due_ms)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Monotonic simulation clock
#[derive(Debug)]
pub struct Clock<E> {
    now_ms: f64,
    delta_ms: f64,
    paused: bool,
    next_id: u64,
    next_seq: u64,
    timers: HashMap<TimerId, Timer<E>>,
    queue: BinaryHeap<Slot>,
}

impl<E> Default for Clock<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Clock<E> {
    pub fn new() -> Self {
        Self {
            now_ms: 0.0,
            delta_ms: 0.0,
            paused: false,
            next_id: 1,
            next_seq: 0,
            timers: HashMap::new(),
            queue: BinaryHeap::new(),
        }
    }

    /// Current simulation time
    pub fn now_ms(&self) -> f64 {
        self.now_ms
    }

    /// Length of the last non-paused step
    pub fn delta_ms(&self) -> f64 {
        self.delta_ms
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_paused(&mut self, paused: bool) {
        if self.paused != paused {
            log::info!("Clock {}", if paused { "paused" } else { "resumed" });
        }
        self.paused = paused;
    }

    /// Number of timers still scheduled
    pub fn pending(&self) -> usize {
        self.timers.len()
    }

    pub fn is_scheduled(&self, id: TimerId) -> bool {
        self.timers.contains_key(&id)
    }

    /// Schedule a one-shot event `delay_ms` from now
    pub fn after(&mut self, delay_ms: f64, event: E) -> TimerId {
        self.schedule(delay_ms.max(0.0), None, event)
    }

    /// Schedule a repeating event, first firing `interval_ms` from now
    ///
    /// Non-positive intervals are clamped to 1ms so a bad value cannot stall
    /// [`Clock::advance`].
    pub fn every(&mut self, interval_ms: f64, event: E) -> TimerId {
        let interval = interval_ms.max(1.0);
        self.schedule(interval, Some(interval), event)
    }

    /// Remove a timer; returns false if it had already fired or been cancelled
    pub fn cancel(&mut self, id: TimerId) -> bool {
        self.timers.remove(&id).is_some()
    }

    fn schedule(&mut self, delay_ms: f64, repeat_ms: Option<f64>, event: E) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        let due_ms = self.now_ms + delay_ms;
        self.timers.insert(
            id,
            Timer {
                due_ms,
                repeat_ms,
                event,
            },
        );
        self.push_slot(id, due_ms);
        id
    }

    fn push_slot(&mut self, id: TimerId, due_ms: f64) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Slot { due_ms, seq, id });
    }
}

impl<E: Clone> Clock<E> {
    /// Advance time by `dt_ms` and return every timer that came due
    ///
    /// Returns nothing (and leaves time untouched) while paused.
    pub fn advance(&mut self, dt_ms: f64) -> Vec<Fired<E>> {
        if self.paused {
            return Vec::new();
        }

        let dt = dt_ms.max(0.0);
        self.delta_ms = dt;
        self.now_ms += dt;

        let mut fired = Vec::new();
        while let Some(slot) = self.queue.peek().copied() {
            if slot.due_ms > self.now_ms {
                break;
            }
            self.queue.pop();

            // Cancelled, or superseded by a re-armed slot
            let Some(timer) = self.timers.get_mut(&slot.id) else {
                continue;
            };
            if timer.due_ms != slot.due_ms {
                continue;
            }

            fired.push(Fired {
                id: slot.id,
                at_ms: slot.due_ms,
                event: timer.event.clone(),
            });

            let repeat = timer.repeat_ms;
            match repeat {
                Some(interval) => {
                    let due = slot.due_ms + interval;
                    timer.due_ms = due;
                    self.push_slot(slot.id, due);
                }
                None => {
                    self.timers.remove(&slot.id);
                }
            }
        }
        fired
    }
}
