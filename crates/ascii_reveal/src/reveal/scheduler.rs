use std::time::{Duration, Instant};

/// Identifies one requested frame callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameHandle(u64);

impl FrameHandle {
    pub fn id(self) -> u64 {
        self.0
    }
}

/// Host capability: "run me before the next display refresh".
///
/// The host answers a request by calling `AsciiRenderer::on_frame` with the
/// returned handle. Cancelling an unknown or already cancelled handle is a no-op.
pub trait FrameScheduler {
    fn request_frame(&mut self) -> FrameHandle;
    fn cancel_frame(&mut self, handle: FrameHandle);
}

impl<T: FrameScheduler + ?Sized> FrameScheduler for &mut T {
    fn request_frame(&mut self) -> FrameHandle {
        (**self).request_frame()
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        (**self).cancel_frame(handle)
    }
}

/// Records requests and leaves delivery to the caller.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    next_id: u64,
    pending: Vec<FrameHandle>,
    requested: usize,
    cancelled: usize,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> &[FrameHandle] {
        &self.pending
    }

    pub fn take_pending(&mut self) -> Vec<FrameHandle> {
        std::mem::take(&mut self.pending)
    }

    /// Total requests made so far.
    pub fn requested(&self) -> usize {
        self.requested
    }

    /// Requests that were cancelled while still pending.
    pub fn cancelled(&self) -> usize {
        self.cancelled
    }
}

impl FrameScheduler for ManualScheduler {
    fn request_frame(&mut self) -> FrameHandle {
        self.next_id += 1;
        self.requested += 1;
        let handle = FrameHandle(self.next_id);
        self.pending.push(handle);
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        let before = self.pending.len();
        self.pending.retain(|pending| *pending != handle);
        if self.pending.len() != before {
            self.cancelled += 1;
        }
    }
}

pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_micros(16_667);

/// Fixed-rate scheduler for hosts without a display-refresh signal.
#[derive(Debug)]
pub struct PacedScheduler {
    interval: Duration,
    next_id: u64,
    last_deadline: Option<Instant>,
    pending: Vec<(FrameHandle, Instant)>,
}

impl PacedScheduler {
    pub fn new(interval: Duration) -> Self {
        Self { interval, next_id: 0, last_deadline: None, pending: Vec::new() }
    }

    pub fn with_fps(fps: f32) -> Self {
        if !fps.is_finite() || fps <= 0.0 {
            return Self::default();
        }
        Self::new(Duration::from_secs_f32(1.0 / fps))
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Earliest pending deadline.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.iter().map(|(_, deadline)| *deadline).min()
    }

    /// Removes and returns every handle due at `now`, oldest first.
    pub fn take_due(&mut self, now: Instant) -> Vec<FrameHandle> {
        let mut due = Vec::new();
        self.pending.retain(|(handle, deadline)| {
            if *deadline <= now {
                due.push(*handle);
                false
            } else {
                true
            }
        });
        due.sort_unstable();
        due
    }

    fn deadline_after(&mut self, now: Instant) -> Instant {
        let deadline = match self.last_deadline {
            Some(last) => (last + self.interval).max(now),
            None => now + self.interval,
        };
        self.last_deadline = Some(deadline);
        deadline
    }
}

impl Default for PacedScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_FRAME_INTERVAL)
    }
}

impl FrameScheduler for PacedScheduler {
    fn request_frame(&mut self) -> FrameHandle {
        self.next_id += 1;
        let handle = FrameHandle(self.next_id);
        let deadline = self.deadline_after(Instant::now());
        self.pending.push((handle, deadline));
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        self.pending.retain(|(pending, _)| *pending != handle);
    }
}
