//! Incremental page loading for the image viewer.
//!
//! The pager owns the contiguous range of page slots currently in the viewer
//! and the fetch state of each one. It never issues network requests itself:
//! callers drain [`PageRequest`]s with [`Pager::take_requests`] and report back
//! through [`Pager::on_loaded`] / [`Pager::on_failed`], tagged with the attempt
//! number so late answers from abandoned attempts are ignored.

use std::collections::VecDeque;
use std::ops::Range;
use std::time::{Duration, Instant};

pub const BACKWARD_BATCH: u32 = 5;
pub const MAX_RETRIES: u32 = 3;
pub const RETRY_DELAY: Duration = Duration::from_secs(1);
/// Consecutive "up" presses at the top before earlier pages are pulled in.
pub const UP_PRESSES_FOR_EARLIER: u32 = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageState {
    Loading { deadline: Instant },
    Waiting { retry_at: Instant, error: String },
    Loaded,
    Failed { error: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub attempt: u32,
}

#[derive(Debug, Clone)]
struct Slot {
    state: PageState,
    attempt: u32,
    failures: u32,
}

#[derive(Debug, Clone)]
pub struct Pager {
    pages: u32,
    first: u32,
    slots: VecDeque<Slot>,
    requests: Vec<PageRequest>,
    timeout: Duration,
    current: u32,
    up_presses: u32,
}

impl Pager {
    /// Starts with exactly one slot: the resume page, clamped to the last page.
    pub fn new(pages: u32, resume_page: u32, timeout: Duration, now: Instant) -> Self {
        let first = resume_page.min(pages.saturating_sub(1));
        let mut pager = Self {
            pages,
            first,
            slots: VecDeque::new(),
            requests: Vec::new(),
            timeout,
            current: first,
            up_presses: 0,
        };
        if pages > 0 {
            pager.slots.push_back(Slot::new(now));
            pager.begin(first, now);
        }
        pager
    }

    pub fn pages(&self) -> u32 {
        self.pages
    }

    pub fn current(&self) -> u32 {
        self.current
    }

    /// Pages with a slot in the viewer, in display order.
    pub fn loaded_pages(&self) -> Range<u32> {
        self.first..self.end()
    }

    fn end(&self) -> u32 {
        self.first + self.slots.len() as u32
    }

    pub fn state(&self, page: u32) -> Option<&PageState> {
        self.slot(page).map(|slot| &slot.state)
    }

    fn slot(&self, page: u32) -> Option<&Slot> {
        let index = page.checked_sub(self.first)?;
        self.slots.get(index as usize)
    }

    fn slot_mut(&mut self, page: u32) -> Option<&mut Slot> {
        let index = page.checked_sub(self.first)?;
        self.slots.get_mut(index as usize)
    }

    pub fn take_requests(&mut self) -> Vec<PageRequest> {
        std::mem::take(&mut self.requests)
    }

    fn begin(&mut self, page: u32, now: Instant) {
        let deadline = now + self.timeout;
        let Some(slot) = self.slot_mut(page) else {
            return;
        };
        slot.attempt += 1;
        slot.state = PageState::Loading { deadline };
        let attempt = slot.attempt;
        self.requests.push(PageRequest { page, attempt });
    }

    /// True once the final page of the volume has a slot.
    pub fn reached_end(&self) -> bool {
        self.end() >= self.pages
    }

    /// Every page of the volume is loaded.
    pub fn is_complete(&self) -> bool {
        self.pages > 0
            && self.first == 0
            && self.reached_end()
            && self
                .slots
                .iter()
                .all(|slot| slot.state == PageState::Loaded)
    }

    /// The last slot scrolled into view: append the next page once the last one has settled,
    /// either loaded or failed for good.
    ///
    /// Repeated signals for the same last page are ignored.
    pub fn on_bottom_visible(&mut self, now: Instant) -> bool {
        if self.reached_end() {
            return false;
        }
        let last_settled = self.slots.back().is_some_and(|slot| {
            matches!(slot.state, PageState::Loaded | PageState::Failed { .. })
        });
        if !last_settled {
            return false;
        }
        let page = self.end();
        self.slots.push_back(Slot::new(now));
        self.begin(page, now);
        tracing::debug!(page, "prefetch next page");
        true
    }

    /// Prepends up to [`BACKWARD_BATCH`] earlier pages. Returns how many were added.
    pub fn load_earlier(&mut self, now: Instant) -> u32 {
        self.up_presses = 0;
        let count = self.first.min(BACKWARD_BATCH);
        if count == 0 {
            return 0;
        }
        for _ in 0..count {
            self.slots.push_front(Slot::new(now));
        }
        self.first -= count;
        for page in self.first..self.first + count {
            self.begin(page, now);
        }
        tracing::debug!(from = self.first, count, "load earlier pages");
        count
    }

    /// "Up" pressed while already at the top of the scroll area.
    pub fn up_at_top(&mut self, now: Instant) -> u32 {
        self.up_presses += 1;
        if self.up_presses < UP_PRESSES_FOR_EARLIER {
            return 0;
        }
        self.load_earlier(now)
    }

    pub fn reset_up_presses(&mut self) {
        self.up_presses = 0;
    }

    /// Applies a successful fetch. Answers from superseded attempts are dropped.
    pub fn on_loaded(&mut self, page: u32, attempt: u32) -> bool {
        let Some(slot) = self.slot_mut(page) else {
            return false;
        };
        if slot.attempt != attempt {
            return false;
        }
        match slot.state {
            PageState::Loading { .. } | PageState::Waiting { .. } => {
                slot.state = PageState::Loaded;
                true
            }
            PageState::Loaded | PageState::Failed { .. } => false,
        }
    }

    pub fn on_failed(&mut self, page: u32, attempt: u32, error: String, now: Instant) -> bool {
        let Some(slot) = self.slot_mut(page) else {
            return false;
        };
        if slot.attempt != attempt || !matches!(slot.state, PageState::Loading { .. }) {
            return false;
        }
        slot.failures += 1;
        if slot.failures > MAX_RETRIES {
            tracing::warn!(page, error = %error, "page failed after retries");
            slot.state = PageState::Failed { error };
        } else {
            tracing::debug!(page, attempt, error = %error, "page failed, retrying");
            slot.state = PageState::Waiting {
                retry_at: now + RETRY_DELAY,
                error,
            };
        }
        true
    }

    /// Expires timed-out attempts and restarts pages whose retry delay has passed.
    pub fn poll(&mut self, now: Instant) -> bool {
        let mut changed = false;
        let mut timed_out = Vec::new();
        let mut due = Vec::new();
        for (offset, slot) in self.slots.iter().enumerate() {
            let page = self.first + offset as u32;
            match &slot.state {
                PageState::Loading { deadline } if *deadline <= now => {
                    timed_out.push((page, slot.attempt));
                }
                PageState::Waiting { retry_at, .. } if *retry_at <= now => due.push(page),
                _ => {}
            }
        }
        for (page, attempt) in timed_out {
            let secs = self.timeout.as_secs();
            changed |= self.on_failed(page, attempt, format!("timed out after {secs}s"), now);
        }
        for page in due {
            self.begin(page, now);
            changed = true;
        }
        changed
    }

    /// Manual retry of a page in the terminal error state; the retry budget starts over.
    pub fn retry(&mut self, page: u32, now: Instant) -> bool {
        let Some(slot) = self.slot_mut(page) else {
            return false;
        };
        if !matches!(slot.state, PageState::Failed { .. }) {
            return false;
        }
        slot.failures = 0;
        self.begin(page, now);
        true
    }

    pub fn retry_failed(&mut self, now: Instant) -> usize {
        let failed = self.failed_pages();
        failed
            .into_iter()
            .filter(|&page| self.retry(page, now))
            .count()
    }

    pub fn failed_pages(&self) -> Vec<u32> {
        self.loaded_pages()
            .filter(|&page| matches!(self.state(page), Some(PageState::Failed { .. })))
            .collect()
    }

    /// Recomputes the current page from the slot under the viewport's center row.
    ///
    /// Slots are stacked top to bottom, each `page_height` rows tall.
    pub fn update_current(&mut self, page_height: u32, offset: u32, viewport: u32) -> u32 {
        if self.slots.is_empty() || page_height == 0 {
            return self.current;
        }
        let center = offset.saturating_add(viewport / 2);
        let index = (center / page_height).min(self.slots.len() as u32 - 1);
        self.current = self.first + index;
        self.current
    }

    /// Whether the last slot intersects the viewport.
    pub fn last_slot_visible(&self, page_height: u32, offset: u32, viewport: u32) -> bool {
        if self.slots.is_empty() {
            return false;
        }
        let top = (self.slots.len() as u32 - 1) * page_height;
        top < offset.saturating_add(viewport)
    }

    /// Total scrollable height in rows.
    pub fn content_height(&self, page_height: u32) -> u32 {
        self.slots.len() as u32 * page_height
    }

    /// Row offset of `page`'s slot.
    pub fn slot_top(&self, page: u32, page_height: u32) -> Option<u32> {
        self.slot(page)?;
        Some((page - self.first) * page_height)
    }
}

impl Slot {
    fn new(now: Instant) -> Self {
        Self {
            state: PageState::Loading { deadline: now },
            attempt: 0,
            failures: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMEOUT: Duration = Duration::from_secs(12);

    fn load_all_pending(pager: &mut Pager) {
        for request in pager.take_requests() {
            assert!(pager.on_loaded(request.page, request.attempt));
        }
    }

    #[test]
    fn starts_with_resume_page_only() {
        let now = Instant::now();
        let mut pager = Pager::new(10, 3, TIMEOUT, now);
        assert_eq!(pager.loaded_pages(), 3..4);
        assert_eq!(
            pager.take_requests(),
            vec![PageRequest {
                page: 3,
                attempt: 1
            }]
        );
        assert_eq!(pager.current(), 3);
    }

    #[test]
    fn resume_past_end_is_clamped() {
        let pager = Pager::new(10, 10, TIMEOUT, Instant::now());
        assert_eq!(pager.loaded_pages(), 9..10);
        assert!(pager.reached_end());
    }

    #[test]
    fn empty_volume_has_no_slots() {
        let mut pager = Pager::new(0, 0, TIMEOUT, Instant::now());
        assert!(pager.loaded_pages().is_empty());
        assert!(pager.take_requests().is_empty());
        assert!(!pager.on_bottom_visible(Instant::now()));
        assert!(!pager.is_complete());
    }

    #[test]
    fn bottom_signals_extend_one_page_at_a_time() {
        let now = Instant::now();
        let mut pager = Pager::new(10, 3, TIMEOUT, now);
        let mut seen = vec![pager.loaded_pages().collect::<Vec<_>>()];
        load_all_pending(&mut pager);

        for _ in 0..20 {
            // Repeated signals before the new page arrives are ignored.
            let extended = pager.on_bottom_visible(now);
            assert!(!pager.on_bottom_visible(now));
            if extended {
                seen.push(pager.loaded_pages().collect());
            }
            load_all_pending(&mut pager);
        }

        let expected: Vec<Vec<u32>> = (4..=10).map(|end| (3..end).collect()).collect();
        assert_eq!(seen, expected);
        assert!(pager.reached_end());
        assert!(!pager.is_complete());
    }

    #[test]
    fn load_earlier_prepends_without_duplicates() {
        let now = Instant::now();
        let mut pager = Pager::new(10, 7, TIMEOUT, now);
        load_all_pending(&mut pager);

        assert_eq!(pager.load_earlier(now), 5);
        assert_eq!(pager.loaded_pages(), 2..8);
        let pages: Vec<u32> = pager.take_requests().iter().map(|r| r.page).collect();
        assert_eq!(pages, vec![2, 3, 4, 5, 6]);

        assert_eq!(pager.load_earlier(now), 2);
        assert_eq!(pager.loaded_pages(), 0..8);
        assert_eq!(pager.load_earlier(now), 0);
        assert_eq!(pager.take_requests().len(), 2);
    }

    #[test]
    fn second_up_at_top_loads_earlier() {
        let now = Instant::now();
        let mut pager = Pager::new(10, 4, TIMEOUT, now);
        assert_eq!(pager.up_at_top(now), 0);
        assert_eq!(pager.up_at_top(now), 4);
        assert_eq!(pager.loaded_pages(), 0..5);

        pager.reset_up_presses();
        assert_eq!(pager.up_at_top(now), 0);
    }

    #[test]
    fn failing_page_retries_three_times_then_stops() {
        let start = Instant::now();
        let mut pager = Pager::new(5, 0, TIMEOUT, start);
        let mut now = start;
        let mut requests = 0;

        loop {
            let pending = pager.take_requests();
            if pending.is_empty() {
                now += RETRY_DELAY;
                if !pager.poll(now) {
                    break;
                }
                continue;
            }
            for request in pending {
                requests += 1;
                pager.on_failed(request.page, request.attempt, "boom".to_string(), now);
            }
        }

        assert_eq!(requests, 1 + MAX_RETRIES);
        assert_eq!(
            pager.state(0),
            Some(&PageState::Failed {
                error: "boom".to_string()
            })
        );
        assert_eq!(pager.failed_pages(), vec![0]);

        assert!(pager.retry(0, now));
        let retry = pager.take_requests();
        assert_eq!(retry.len(), 1);
        assert!(pager.on_loaded(0, retry[0].attempt));
        assert!(pager.failed_pages().is_empty());
    }

    #[test]
    fn timeout_counts_as_failure_and_stale_answers_are_ignored() {
        let start = Instant::now();
        let mut pager = Pager::new(5, 2, TIMEOUT, start);
        let first = pager.take_requests()[0];

        assert!(!pager.poll(start + Duration::from_secs(5)));
        assert!(pager.poll(start + TIMEOUT));
        assert!(matches!(pager.state(2), Some(PageState::Waiting { .. })));

        assert!(pager.poll(start + TIMEOUT + RETRY_DELAY));
        let second = pager.take_requests()[0];
        assert_eq!(second.attempt, first.attempt + 1);

        assert!(!pager.on_loaded(2, first.attempt));
        assert!(pager.on_loaded(2, second.attempt));
        assert_eq!(pager.state(2), Some(&PageState::Loaded));
    }

    #[test]
    fn failures_stay_scoped_to_their_page() {
        let now = Instant::now();
        let mut pager = Pager::new(10, 5, TIMEOUT, now);
        load_all_pending(&mut pager);
        pager.load_earlier(now);
        for request in pager.take_requests() {
            if request.page == 3 {
                pager.on_failed(request.page, request.attempt, "404".to_string(), now);
            } else {
                pager.on_loaded(request.page, request.attempt);
            }
        }
        assert!(matches!(pager.state(3), Some(PageState::Waiting { .. })));
        assert_eq!(pager.state(4), Some(&PageState::Loaded));
        assert!(pager.on_bottom_visible(now));
    }

    #[test]
    fn terminally_failed_last_page_does_not_end_the_volume() {
        let start = Instant::now();
        let mut pager = Pager::new(10, 3, TIMEOUT, start);
        let mut now = start;
        loop {
            let pending = pager.take_requests();
            if pending.is_empty() {
                now += RETRY_DELAY;
                if !pager.poll(now) {
                    break;
                }
                continue;
            }
            for request in pending {
                pager.on_failed(request.page, request.attempt, "500".to_string(), now);
            }
        }
        assert!(matches!(pager.state(3), Some(PageState::Failed { .. })));

        let extended = (0..10).filter(|_| pager.on_bottom_visible(now)).count();
        assert_eq!(extended, 1);
        assert_eq!(pager.loaded_pages(), 3..5);
        let next = pager.take_requests();
        assert_eq!(next, vec![PageRequest { page: 4, attempt: 1 }]);
        assert!(pager.on_loaded(4, 1));
        assert!(pager.on_bottom_visible(now));
        assert_eq!(pager.loaded_pages(), 3..6);
    }

    #[test]
    fn current_page_tracks_viewport_center() {
        let now = Instant::now();
        let mut pager = Pager::new(10, 3, TIMEOUT, now);
        load_all_pending(&mut pager);
        pager.on_bottom_visible(now);
        load_all_pending(&mut pager);
        pager.on_bottom_visible(now);
        load_all_pending(&mut pager);
        assert_eq!(pager.loaded_pages(), 3..6);

        assert_eq!(pager.update_current(40, 0, 40), 3);
        // Page 4 only fills the bottom quarter, page 3 still holds the center.
        assert_eq!(pager.update_current(40, 10, 40), 3);
        assert_eq!(pager.update_current(40, 25, 40), 4);
        assert_eq!(pager.update_current(40, 500, 40), 5);
        assert!(pager.last_slot_visible(40, 45, 40));
        assert!(!pager.last_slot_visible(40, 40, 40));
    }

    #[test]
    fn complete_when_every_page_is_loaded() {
        let now = Instant::now();
        let mut pager = Pager::new(3, 1, TIMEOUT, now);
        load_all_pending(&mut pager);
        assert!(pager.on_bottom_visible(now));
        load_all_pending(&mut pager);
        assert!(!pager.is_complete());
        pager.load_earlier(now);
        load_all_pending(&mut pager);
        assert!(pager.is_complete());
        assert!(!pager.on_bottom_visible(now));
    }
}
