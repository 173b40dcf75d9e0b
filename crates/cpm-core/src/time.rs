//! Virtual time
//!
//! The interaction layer never reads a wall clock. Timers and animation-frame
//! callbacks are queued on a [`Scheduler`] and released by whoever drives it:
//! tests advance it explicitly, the async host driver maps tokio time onto it.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

/// Milliseconds since the console started.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Console start.
    pub const ZERO: Self = Self(0);

    /// Wrap a raw millisecond count.
    pub const fn from_millis(ms: u64) -> Self {
        Self(ms)
    }

    /// Raw millisecond count.
    pub const fn as_millis(self) -> u64 {
        self.0
    }

    /// The instant `ms` later, saturating.
    #[must_use]
    pub const fn plus_millis(self, ms: u64) -> Self {
        Self(self.0.saturating_add(ms))
    }

    /// Milliseconds from `earlier` to `self`, zero if `earlier` is later.
    pub const fn millis_since(self, earlier: Self) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

/// Handle to a pending timer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// Handle to a pending animation-frame callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameId(u64);

/// Single-threaded timer and animation-frame queue over a virtual clock.
///
/// Timers due at the same instant fire in scheduling order.
#[derive(Debug)]
pub struct Scheduler<T> {
    now: Timestamp,
    timers: BTreeMap<(Timestamp, u64), (TimerId, T)>,
    deadlines: HashMap<TimerId, Timestamp>,
    frames: Vec<(FrameId, T)>,
    next_seq: u64,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self {
            now: Timestamp::ZERO,
            timers: BTreeMap::new(),
            deadlines: HashMap::new(),
            frames: Vec::new(),
            next_seq: 0,
        }
    }
}

impl<T> Scheduler<T> {
    /// A scheduler at time zero with nothing queued.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time.
    pub fn now(&self) -> Timestamp {
        self.now
    }

    /// Run `task` once `delay_ms` have elapsed from now.
    pub fn schedule(&mut self, delay_ms: u64, task: T) -> TimerId {
        let seq = self.bump();
        let id = TimerId(seq);
        let deadline = self.now.plus_millis(delay_ms);
        self.timers.insert((deadline, seq), (id, task));
        self.deadlines.insert(id, deadline);
        id
    }

    /// Cancel a pending timer, returning its task if it had not fired yet.
    pub fn cancel(&mut self, id: TimerId) -> Option<T> {
        let deadline = self.deadlines.remove(&id)?;
        self.timers.remove(&(deadline, id.0)).map(|(_, task)| task)
    }

    /// Whether the timer is still queued.
    pub fn is_pending(&self, id: TimerId) -> bool {
        self.deadlines.contains_key(&id)
    }

    /// When the timer will fire, if still queued.
    pub fn deadline(&self, id: TimerId) -> Option<Timestamp> {
        self.deadlines.get(&id).copied()
    }

    /// Number of queued timers.
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Earliest pending timer deadline.
    pub fn next_deadline(&self) -> Option<Timestamp> {
        self.timers.keys().next().map(|(deadline, _)| *deadline)
    }

    /// Pop the earliest timer due at or before `limit`, moving the clock to its deadline.
    pub fn pop_due(&mut self, limit: Timestamp) -> Option<(TimerId, T)> {
        let key = *self.timers.keys().next()?;
        if key.0 > limit {
            return None;
        }
        let (id, task) = self.timers.remove(&key)?;
        self.deadlines.remove(&id);
        self.now = self.now.max(key.0);
        Some((id, task))
    }

    /// Move the clock forward without firing anything. Never moves backwards.
    pub fn advance_clock(&mut self, to: Timestamp) {
        self.now = self.now.max(to);
    }

    /// Queue `task` for the next animation frame.
    pub fn request_frame(&mut self, task: T) -> FrameId {
        let id = FrameId(self.bump());
        self.frames.push((id, task));
        id
    }

    /// Cancel a frame callback that has not run yet.
    pub fn cancel_frame(&mut self, id: FrameId) -> Option<T> {
        let pos = self.frames.iter().position(|(frame, _)| *frame == id)?;
        Some(self.frames.remove(pos).1)
    }

    /// Whether any frame callback is queued.
    pub fn has_frames(&self) -> bool {
        !self.frames.is_empty()
    }

    /// Drain the callbacks for the current frame. Callbacks requested while
    /// these run belong to the following frame.
    pub fn take_frame(&mut self) -> Vec<T> {
        std::mem::take(&mut self.frames)
            .into_iter()
            .map(|(_, task)| task)
            .collect()
    }

    fn bump(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }
}
