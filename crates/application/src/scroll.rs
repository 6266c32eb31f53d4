use std::time::{Duration, Instant};

pub const SCROLL_DURATION: Duration = Duration::from_millis(800);

/// First visible row that keeps `focused_row` in the middle of the viewport.
pub fn centered_offset(focused_row: usize, total_rows: usize, visible_rows: usize) -> usize {
    if visible_rows == 0 || total_rows <= visible_rows {
        return 0;
    }
    let max_offset = total_rows - visible_rows;
    focused_row.saturating_sub(visible_rows / 2).min(max_offset)
}

fn ease_in_out_cubic(t: f32) -> f32 {
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Animation {
    from: f32,
    to: usize,
    started: Instant,
    duration: Duration,
}

/// Scroll offset that glides to new targets instead of jumping.
#[derive(Debug, Clone, PartialEq)]
pub struct Scroller {
    offset: usize,
    animation: Option<Animation>,
}

impl Default for Scroller {
    fn default() -> Self {
        Self::new()
    }
}

impl Scroller {
    pub fn new() -> Self {
        Self {
            offset: 0,
            animation: None,
        }
    }

    pub fn target(&self) -> usize {
        self.animation.as_ref().map_or(self.offset, |anim| anim.to)
    }

    pub fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    /// Starts an eased move from wherever the view currently is.
    pub fn animate_to(&mut self, to: usize, now: Instant) {
        if to == self.target() {
            return;
        }
        let from = self.position(now);
        self.animation = Some(Animation {
            from,
            to,
            started: now,
            duration: SCROLL_DURATION,
        });
    }

    pub fn jump_to(&mut self, to: usize) {
        self.offset = to;
        self.animation = None;
    }

    fn position(&self, now: Instant) -> f32 {
        let Some(anim) = &self.animation else {
            return self.offset as f32;
        };
        let elapsed = now.saturating_duration_since(anim.started);
        let t = (elapsed.as_secs_f32() / anim.duration.as_secs_f32()).clamp(0.0, 1.0);
        anim.from + (anim.to as f32 - anim.from) * ease_in_out_cubic(t)
    }

    /// Advances the animation; returns true while it is still running.
    pub fn tick(&mut self, now: Instant) -> bool {
        let Some(anim) = &self.animation else {
            return false;
        };
        if now.saturating_duration_since(anim.started) >= anim.duration {
            self.offset = anim.to;
            self.animation = None;
            return false;
        }
        self.offset = self.position(now).round().max(0.0) as usize;
        true
    }

    pub fn offset(&self) -> usize {
        self.offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centers_when_room_allows() {
        assert_eq!(centered_offset(10, 30, 5), 8);
        assert_eq!(centered_offset(1, 30, 5), 0);
        assert_eq!(centered_offset(29, 30, 5), 25);
        assert_eq!(centered_offset(3, 4, 5), 0);
    }

    #[test]
    fn animation_finishes_within_bound() {
        let start = Instant::now();
        let mut scroller = Scroller::new();
        scroller.animate_to(20, start);
        assert!(scroller.tick(start + Duration::from_millis(400)));
        let midway = scroller.offset();
        assert!(midway > 0 && midway < 20, "midway was {midway}");
        assert!(!scroller.tick(start + SCROLL_DURATION));
        assert_eq!(scroller.offset(), 20);
        assert!(!scroller.is_animating());
    }

    #[test]
    fn retargeting_starts_from_current_position() {
        let start = Instant::now();
        let mut scroller = Scroller::new();
        scroller.animate_to(20, start);
        let later = start + Duration::from_millis(400);
        scroller.tick(later);
        let reached = scroller.offset();
        scroller.animate_to(0, later);
        assert_eq!(scroller.target(), 0);
        scroller.tick(later + Duration::from_millis(1));
        assert!(scroller.offset() <= reached);
        scroller.tick(later + SCROLL_DURATION);
        assert_eq!(scroller.offset(), 0);
    }

    #[test]
    fn ease_is_monotonic_at_endpoints() {
        assert_eq!(ease_in_out_cubic(0.0), 0.0);
        assert_eq!(ease_in_out_cubic(1.0), 1.0);
        assert!(ease_in_out_cubic(0.25) < ease_in_out_cubic(0.75));
    }
}
