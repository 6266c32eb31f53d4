use std::time::{Duration, Instant};

/// Fixed-period timer owned by a screen. Dropping the screen drops the timer.
///
/// A tick is not fired again while the previous one is still in flight.
#[derive(Debug, Clone)]
pub struct Interval {
    period: Option<Duration>,
    next: Option<Instant>,
    in_flight: bool,
}

impl Interval {
    /// The first tick is due immediately.
    pub fn new(period: Duration, now: Instant) -> Self {
        Self {
            period: Some(period),
            next: Some(now),
            in_flight: false,
        }
    }

    /// Fires once right away, then only after [`Interval::trigger`].
    pub fn once(now: Instant) -> Self {
        Self {
            period: None,
            next: Some(now),
            in_flight: false,
        }
    }

    /// Claims the tick when due; the caller must call [`Interval::complete`] afterwards.
    pub fn fire(&mut self, now: Instant) -> bool {
        if self.in_flight || !self.next.is_some_and(|next| now >= next) {
            return false;
        }
        self.in_flight = true;
        self.next = self.period.map(|period| now + period);
        true
    }

    pub fn complete(&mut self) {
        self.in_flight = false;
    }

    /// Makes the next tick due right away.
    pub fn trigger(&mut self, now: Instant) {
        self.next = Some(now);
    }

    /// Forgets an outstanding tick whose result will never arrive, and fires again now.
    pub fn restart(&mut self, now: Instant) {
        self.in_flight = false;
        self.next = Some(now);
    }
}
