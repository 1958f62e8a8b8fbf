//! Host scheduling services.
//!
//! The show is driven by two host services: a display-refresh
//! [`FrameScheduler`] (single-shot "call me before the next repaint") and a
//! repeating [`TimerService`]. Both are single-threaded; callbacks run on
//! the same execution context, one at a time.
//!
//! [`HostLoop`] implements both on a virtual clock. It fires timers and
//! repaints in time order and can be driven deterministically from tests
//! or paced against the wall clock by the engine.
//!
//! Callbacks are taken out of the queue before they run, so a callback may
//! call back into the host to request the next frame or clear an interval.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use tracing::trace;

/// Default display refresh rate.
pub const DEFAULT_REFRESH_HZ: u32 = 60;

/// Smallest interval period; shorter periods are rounded up.
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Shortest time between repaints, whatever the refresh rate.
pub const MIN_FRAME_PERIOD: Duration = Duration::from_nanos(1);

/// Callback run before a repaint. Receives the host time of the repaint.
pub type FrameCallback = Box<dyn FnOnce(Duration)>;

/// Callback run every interval period.
pub type IntervalCallback = Box<dyn FnMut()>;

/// Identifier of a pending frame request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FrameRequestId(u64);

/// Identifier of a repeating interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IntervalId(u64);

/// Display-refresh scheduler.
pub trait FrameScheduler {
    /// Runs `callback` once before the next repaint.
    fn request_frame(&self, callback: FrameCallback) -> FrameRequestId;

    /// Cancels a pending request. Unknown or already-run ids are ignored.
    fn cancel_frame(&self, id: FrameRequestId);
}

/// Repeating wall-clock timer service.
pub trait TimerService {
    /// Runs `callback` every `period` until cleared.
    fn set_interval(&self, period: Duration, callback: IntervalCallback) -> IntervalId;

    /// Stops an interval. Unknown or already-cleared ids are ignored.
    fn clear_interval(&self, id: IntervalId);
}

/// Owned cancellation handle for an interval.
///
/// Dropping the handle clears the interval.
pub struct IntervalHandle {
    timers: Rc<dyn TimerService>,
    id: Option<IntervalId>,
}

impl IntervalHandle {
    /// Wraps an interval id.
    #[must_use]
    pub fn new(timers: Rc<dyn TimerService>, id: IntervalId) -> Self {
        Self {
            timers,
            id: Some(id),
        }
    }

    /// The interval id, while not cancelled.
    #[must_use]
    pub fn id(&self) -> Option<IntervalId> {
        self.id
    }

    /// Whether `cancel` has not been called yet.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.id.is_some()
    }

    /// Clears the interval.
    pub fn cancel(&mut self) {
        if let Some(id) = self.id.take() {
            self.timers.clear_interval(id);
        }
    }
}

impl Drop for IntervalHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl fmt::Debug for IntervalHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntervalHandle").field("id", &self.id).finish()
    }
}

struct IntervalEntry {
    period: Duration,
    next_due: Duration,
    // Taken out while the callback runs.
    callback: Option<IntervalCallback>,
}

enum Due {
    Interval(IntervalId, Duration),
    Frame(Duration),
}

/// Single-threaded host loop on a virtual clock.
pub struct HostLoop {
    now: Cell<Duration>,
    frame_period: Duration,
    next_frame_at: Cell<Duration>,
    next_id: Cell<u64>,
    frames: RefCell<Vec<(FrameRequestId, FrameCallback)>>,
    intervals: RefCell<BTreeMap<IntervalId, IntervalEntry>>,
    frames_fired: Cell<u64>,
}

impl Default for HostLoop {
    fn default() -> Self {
        Self::new(DEFAULT_REFRESH_HZ)
    }
}

impl HostLoop {
    /// Creates a host repainting `refresh_hz` times per second.
    #[must_use]
    pub fn new(refresh_hz: u32) -> Self {
        // Never zero, or the clock could not move past a repaint.
        let frame_period = Duration::from_secs_f64(1.0 / f64::from(refresh_hz.max(1)))
            .max(MIN_FRAME_PERIOD);
        Self {
            now: Cell::new(Duration::ZERO),
            frame_period,
            next_frame_at: Cell::new(frame_period),
            next_id: Cell::new(1),
            frames: RefCell::new(Vec::new()),
            intervals: RefCell::new(BTreeMap::new()),
            frames_fired: Cell::new(0),
        }
    }

    /// Current host time.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.now.get()
    }

    /// Time between repaints.
    #[must_use]
    pub fn frame_period(&self) -> Duration {
        self.frame_period
    }

    /// Number of repaints that ran at least one callback.
    #[must_use]
    pub fn frames_fired(&self) -> u64 {
        self.frames_fired.get()
    }

    /// Pending frame requests.
    #[must_use]
    pub fn pending_frames(&self) -> usize {
        self.frames.borrow().len()
    }

    /// Active intervals.
    #[must_use]
    pub fn active_intervals(&self) -> usize {
        self.intervals.borrow().len()
    }

    /// Everything that could still call back into the show.
    #[must_use]
    pub fn pending_callbacks(&self) -> usize {
        self.pending_frames() + self.active_intervals()
    }

    /// Advances the clock by `delta`, running every timer and repaint that
    /// falls due on the way, in time order. Timers due at the same instant
    /// as a repaint run first.
    pub fn advance(&self, delta: Duration) {
        let target = self.now.get() + delta;
        while let Some(due) = self.next_due(target) {
            match due {
                Due::Interval(id, at) => {
                    self.now.set(at);
                    self.run_interval(id);
                },
                Due::Frame(at) => {
                    self.now.set(at);
                    self.next_frame_at.set(at + self.frame_period);
                    self.run_frame(at);
                },
            }
        }
        self.now.set(target);
    }

    /// Advances to the next repaint and runs it.
    pub fn advance_frame(&self) {
        let until_repaint = self.next_frame_at.get().saturating_sub(self.now.get());
        self.advance(until_repaint);
    }

    fn next_due(&self, target: Duration) -> Option<Due> {
        let interval = self
            .intervals
            .borrow()
            .iter()
            .filter(|(_, entry)| entry.callback.is_some())
            .map(|(id, entry)| (*id, entry.next_due))
            .min_by_key(|(_, due)| *due);
        let frame_at = self.next_frame_at.get();

        match interval {
            Some((id, at)) if at <= target && at <= frame_at => Some(Due::Interval(id, at)),
            _ if frame_at <= target => Some(Due::Frame(frame_at)),
            _ => None,
        }
    }

    fn run_interval(&self, id: IntervalId) {
        let callback = {
            let mut intervals = self.intervals.borrow_mut();
            let Some(entry) = intervals.get_mut(&id) else {
                return;
            };
            entry.next_due += entry.period;
            entry.callback.take()
        };

        if let Some(mut callback) = callback {
            callback();
            // The callback may have cleared its own interval.
            if let Some(entry) = self.intervals.borrow_mut().get_mut(&id) {
                entry.callback = Some(callback);
            }
        }
    }

    fn run_frame(&self, at: Duration) {
        let due = std::mem::take(&mut *self.frames.borrow_mut());
        if due.is_empty() {
            return;
        }
        self.frames_fired.set(self.frames_fired.get() + 1);
        trace!("Repaint at {:?}: {} callbacks", at, due.len());
        for (_, callback) in due {
            callback(at);
        }
    }

    fn next_id(&self) -> u64 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        id
    }
}

impl FrameScheduler for HostLoop {
    fn request_frame(&self, callback: FrameCallback) -> FrameRequestId {
        let id = FrameRequestId(self.next_id());
        self.frames.borrow_mut().push((id, callback));
        id
    }

    fn cancel_frame(&self, id: FrameRequestId) {
        self.frames.borrow_mut().retain(|(pending, _)| *pending != id);
    }
}

impl TimerService for HostLoop {
    fn set_interval(&self, period: Duration, callback: IntervalCallback) -> IntervalId {
        let period = period.max(MIN_INTERVAL);
        let id = IntervalId(self.next_id());
        self.intervals.borrow_mut().insert(
            id,
            IntervalEntry {
                period,
                next_due: self.now.get() + period,
                callback: Some(callback),
            },
        );
        id
    }

    fn clear_interval(&self, id: IntervalId) {
        self.intervals.borrow_mut().remove(&id);
    }
}

impl fmt::Debug for HostLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostLoop")
            .field("now", &self.now.get())
            .field("frame_period", &self.frame_period)
            .field("pending_frames", &self.pending_frames())
            .field("active_intervals", &self.active_intervals())
            .finish_non_exhaustive()
    }
}
