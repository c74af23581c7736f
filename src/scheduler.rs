//! Deferred-callback scheduling for the animation loop.
//!
//! The scheduler only hands out and fires opaque [`TimerHandle`]s; the
//! owner of a handle decides what a firing means. This keeps the
//! cancellation contract in one place: a handle that was cancelled, or
//! has already fired, is simply never returned again.

use std::collections::{BTreeSet, HashMap};
use std::time::{Duration, Instant};

/// Reference to one scheduled callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

impl TimerHandle {
    #[inline]
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Single-threaded timer source.
///
/// Time is measured as an offset from an arbitrary origin chosen by the
/// driver (virtual time in tests, `Instant` elapsed time at runtime).
pub trait Scheduler {
    /// Arrange for `handle` to become due `delay` after [`Scheduler::now`].
    fn schedule(&mut self, delay: Duration) -> TimerHandle;

    /// Forget a timer. Unknown, fired or already cancelled handles are ignored.
    fn cancel(&mut self, handle: TimerHandle);

    /// Remove and return the earliest timer due at or before `now`.
    ///
    /// The scheduler clock moves to `now`, the time the wakeup was
    /// observed, so a timer scheduled by whoever handles the firing is
    /// measured from then and is never already due.
    fn pop_due(&mut self, now: Duration) -> Option<TimerHandle>;

    /// Deadline of the earliest outstanding timer.
    fn next_deadline(&self) -> Option<Duration>;

    /// Current scheduler clock.
    fn now(&self) -> Duration;

    /// Move the clock forward. Never moves it backwards.
    fn advance_to(&mut self, now: Duration);
}

/// Time source for a [`TimerQueue`].
pub trait Clock {
    /// Time elapsed since the clock's origin.
    fn elapsed(&self) -> Duration;
}

/// A clock that never moves on its own. Time only advances through
/// [`Scheduler::advance_to`] and [`Scheduler::pop_due`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ManualClock;

impl Clock for ManualClock {
    fn elapsed(&self) -> Duration {
        Duration::ZERO
    }
}

/// Wall clock measured from the moment it was created.
#[derive(Clone, Copy, Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn elapsed(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Ordered timer queue.
///
/// The queue clock is the later of the time it was last told about and
/// the time read from `C`. With [`SystemClock`] a timer scheduled after
/// a long blocking call (a decode, say) is measured from when it was
/// actually scheduled, even if nobody advanced the queue in between.
#[derive(Clone, Debug, Default)]
pub struct TimerQueue<C = ManualClock> {
    clock: C,
    now: Duration,
    next_id: u64,
    by_deadline: BTreeSet<(Duration, u64)>,
    deadlines: HashMap<u64, Duration>,
}

impl TimerQueue {
    /// Queue driven purely by [`Scheduler::advance_to`] and
    /// [`Scheduler::pop_due`].
    pub fn new() -> Self {
        Self::with_clock(ManualClock)
    }
}

impl TimerQueue<SystemClock> {
    /// Queue that follows the wall clock, starting now.
    pub fn realtime() -> Self {
        Self::with_clock(SystemClock::new())
    }
}

impl<C: Clock> TimerQueue<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            clock,
            now: Duration::ZERO,
            next_id: 0,
            by_deadline: BTreeSet::new(),
            deadlines: HashMap::new(),
        }
    }

    #[inline]
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Number of outstanding timers.
    pub fn len(&self) -> usize {
        self.deadlines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deadlines.is_empty()
    }

    /// Whether `handle` is still waiting to fire.
    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.deadlines.contains_key(&handle.0)
    }

    fn sync(&mut self) -> Duration {
        self.now = self.now.max(self.clock.elapsed());
        self.now
    }
}

impl<C: Clock> Scheduler for TimerQueue<C> {
    fn schedule(&mut self, delay: Duration) -> TimerHandle {
        let id = self.next_id;
        self.next_id += 1;
        let deadline = self.sync() + delay;
        self.by_deadline.insert((deadline, id));
        self.deadlines.insert(id, deadline);
        TimerHandle(id)
    }

    fn cancel(&mut self, handle: TimerHandle) {
        if let Some(deadline) = self.deadlines.remove(&handle.0) {
            self.by_deadline.remove(&(deadline, handle.0));
        }
    }

    fn pop_due(&mut self, now: Duration) -> Option<TimerHandle> {
        self.advance_to(now);
        let now = self.sync();
        let &(deadline, id) = self.by_deadline.first()?;
        if deadline > now {
            return None;
        }
        self.by_deadline.remove(&(deadline, id));
        self.deadlines.remove(&id);
        Some(TimerHandle(id))
    }

    fn next_deadline(&self) -> Option<Duration> {
        self.by_deadline.first().map(|&(deadline, _)| deadline)
    }

    fn now(&self) -> Duration {
        self.now.max(self.clock.elapsed())
    }

    fn advance_to(&mut self, now: Duration) {
        self.now = self.now.max(now);
    }
}
