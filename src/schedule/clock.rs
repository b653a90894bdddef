use std::time::{Duration, Instant};

/// Default display refresh rate for the live drivers.
pub const DEFAULT_REFRESH_HZ: u32 = 60;

/// Source of the two suspension points a driver has: the next display refresh and a fixed wait.
pub trait FrameClock {
    /// Block until the next refresh; returns the time since the previous one.
    fn wait_refresh(&mut self) -> Duration;

    /// Block for `interval`.
    fn wait(&mut self, interval: Duration);
}

/// Real-time clock that paces refreshes at a fixed rate with `thread::sleep`.
#[derive(Debug)]
pub struct IntervalClock {
    refresh: Duration,
    last: Option<Instant>,
}

impl IntervalClock {
    /// Clock refreshing `hz` times per second (at least once).
    pub fn new(hz: u32) -> Self {
        Self {
            refresh: Duration::from_secs_f64(1.0 / f64::from(hz.max(1))),
            last: None,
        }
    }

    pub fn refresh_interval(&self) -> Duration {
        self.refresh
    }
}

impl Default for IntervalClock {
    fn default() -> Self {
        Self::new(DEFAULT_REFRESH_HZ)
    }
}

impl FrameClock for IntervalClock {
    fn wait_refresh(&mut self) -> Duration {
        let now = Instant::now();
        let Some(last) = self.last else {
            self.last = Some(now);
            return self.refresh;
        };
        let deadline = last + self.refresh;
        if deadline > now {
            std::thread::sleep(deadline - now);
        }
        let now = Instant::now();
        self.last = Some(now);
        now - last
    }

    fn wait(&mut self, interval: Duration) {
        std::thread::sleep(interval);
    }
}

/// One suspension recorded by [`ManualClock`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClockEvent {
    /// A refresh tick of the given length.
    Refresh(Duration),
    /// A fixed wait.
    Wait(Duration),
}

/// Clock that never sleeps: every refresh is exactly one nominal interval and every wait is
/// logged. Used by headless batch exports and tests.
#[derive(Clone, Debug)]
pub struct ManualClock {
    refresh: Duration,
    elapsed: Duration,
    events: Vec<ClockEvent>,
}

impl ManualClock {
    /// Clock with a nominal refresh of `hz` per second.
    pub fn new(hz: u32) -> Self {
        Self {
            refresh: Duration::from_secs_f64(1.0 / f64::from(hz.max(1))),
            elapsed: Duration::ZERO,
            events: Vec::new(),
        }
    }

    /// Virtual time spent in refreshes and waits.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Everything the driver waited on, in order.
    pub fn events(&self) -> &[ClockEvent] {
        &self.events
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(DEFAULT_REFRESH_HZ)
    }
}

impl FrameClock for ManualClock {
    fn wait_refresh(&mut self) -> Duration {
        self.elapsed += self.refresh;
        self.events.push(ClockEvent::Refresh(self.refresh));
        self.refresh
    }

    fn wait(&mut self, interval: Duration) {
        self.elapsed += interval;
        self.events.push(ClockEvent::Wait(interval));
    }
}
