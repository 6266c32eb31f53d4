use std::collections::HashMap;
use std::time::{Duration, Instant};

use ratatui::layout::Rect;
use ratatui_image::Resize;
use ratatui_image::picker::Picker;
use ratatui_image::protocol::Protocol as ImageProtocol;
use shelfdeck_application::{PageRequest, PageState, Pager, Scroller};
use shelfdeck_core::Volume;

const LINE_STEP: u16 = 3;
pub(crate) const BACKGROUND: image::Rgba<u8> = image::Rgba([24u8, 24u8, 27u8, 255u8]);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RenderKey {
    offset: usize,
    width: u16,
    height: u16,
    font: (u16, u16),
    revision: u64,
}

/// Image viewer state: the pager plus decoded pages and the composed viewport.
pub(crate) struct ViewerScreen {
    pub volume: Volume,
    pub pager: Pager,
    scroller: Scroller,
    images: HashMap<u32, image::DynamicImage>,
    fitted: HashMap<u32, image::DynamicImage>,
    fitted_size: (u32, u32),
    viewport_rows: u16,
    revision: u64,
    render_key: Option<RenderKey>,
    rendered: Option<ImageProtocol>,
}

impl ViewerScreen {
    pub fn new(volume: Volume, timeout: Duration, now: Instant) -> Self {
        let pager = Pager::new(volume.pages, volume.resume_page(), timeout, now);
        Self {
            volume,
            pager,
            scroller: Scroller::new(),
            images: HashMap::new(),
            fitted: HashMap::new(),
            fitted_size: (0, 0),
            viewport_rows: 0,
            revision: 0,
            render_key: None,
            rendered: None,
        }
    }

    pub fn take_requests(&mut self) -> Vec<PageRequest> {
        self.pager.take_requests()
    }

    /// Each page slot is one viewport tall.
    fn page_rows(&self) -> u32 {
        u32::from(self.viewport_rows.max(1))
    }

    fn max_offset(&self) -> usize {
        let content = self.pager.content_height(self.page_rows());
        content.saturating_sub(u32::from(self.viewport_rows)) as usize
    }

    pub fn offset(&self) -> usize {
        self.scroller.offset()
    }

    pub fn on_page_loaded(
        &mut self,
        request: PageRequest,
        image: image::DynamicImage,
        now: Instant,
    ) -> bool {
        if !self.pager.on_loaded(request.page, request.attempt) {
            return false;
        }
        self.images.insert(request.page, image);
        self.revision += 1;
        self.after_scroll(now);
        true
    }

    pub fn on_page_failed(&mut self, request: PageRequest, error: String, now: Instant) -> bool {
        let changed = self.pager.on_failed(request.page, request.attempt, error, now);
        if changed {
            self.revision += 1;
            self.after_scroll(now);
        }
        changed
    }

    /// Timers: page timeouts, retry delays, scroll animation.
    pub fn tick(&mut self, now: Instant) -> bool {
        let mut changed = self.pager.poll(now);
        if self.scroller.tick(now) || changed {
            self.after_scroll(now);
            changed = true;
        }
        changed || self.scroller.is_animating()
    }

    pub fn set_viewport(&mut self, rows: u16, now: Instant) {
        if rows == self.viewport_rows || rows == 0 {
            return;
        }
        // Keep the current page at the top of the view across resizes.
        let current = self.pager.current();
        self.viewport_rows = rows;
        let top = self
            .pager
            .slot_top(current, self.page_rows())
            .unwrap_or(0) as usize;
        self.scroller.jump_to(top.min(self.max_offset()));
        self.render_key = None;
        self.after_scroll(now);
    }

    fn after_scroll(&mut self, now: Instant) {
        let page_rows = self.page_rows();
        let offset = self.scroller.offset() as u32;
        let viewport = u32::from(self.viewport_rows);
        self.pager.update_current(page_rows, offset, viewport);
        if self.pager.last_slot_visible(page_rows, offset, viewport) {
            self.pager.on_bottom_visible(now);
        }
    }

    pub fn scroll_down(&mut self, now: Instant) {
        self.pager.reset_up_presses();
        let next = (self.scroller.target() + usize::from(LINE_STEP)).min(self.max_offset());
        self.scroller.jump_to(next);
        self.after_scroll(now);
    }

    pub fn scroll_up(&mut self, now: Instant) {
        if self.scroller.target() == 0 {
            let added = self.pager.up_at_top(now);
            self.prepended(added, now);
            return;
        }
        let next = self.scroller.target().saturating_sub(usize::from(LINE_STEP));
        self.scroller.jump_to(next);
        self.after_scroll(now);
    }

    pub fn page_down(&mut self, now: Instant) {
        self.pager.reset_up_presses();
        let page_rows = self.page_rows() as usize;
        let next = (self.scroller.target() / page_rows + 1) * page_rows;
        self.scroller.animate_to(next.min(self.max_offset()), now);
    }

    pub fn page_up(&mut self, now: Instant) {
        let page_rows = self.page_rows() as usize;
        let target = self.scroller.target();
        if target == 0 {
            let added = self.pager.up_at_top(now);
            self.prepended(added, now);
            return;
        }
        let next = (target.div_ceil(page_rows).saturating_sub(1)) * page_rows;
        self.scroller.animate_to(next, now);
    }

    pub fn load_earlier(&mut self, now: Instant) -> u32 {
        let added = self.pager.load_earlier(now);
        self.prepended(added, now);
        added
    }

    /// Shifts the view so prepended slots do not move what is on screen.
    fn prepended(&mut self, added: u32, now: Instant) {
        if added == 0 {
            return;
        }
        let shift = (added * self.page_rows()) as usize;
        self.scroller.jump_to(self.scroller.offset() + shift);
        self.revision += 1;
        self.after_scroll(now);
    }

    pub fn retry_failed(&mut self, now: Instant) -> usize {
        let retried = self.pager.retry_failed(now);
        if retried > 0 {
            self.revision += 1;
        }
        retried
    }

    /// Slots overlapping the viewport with their visible row span inside it.
    pub fn visible_slots(&self) -> Vec<(u32, u16, u16)> {
        let page_rows = self.page_rows();
        let offset = self.scroller.offset() as u32;
        let bottom = offset + u32::from(self.viewport_rows);
        self.pager
            .loaded_pages()
            .filter_map(|page| {
                let top = self.pager.slot_top(page, page_rows)?;
                let end = top + page_rows;
                if end <= offset || top >= bottom {
                    return None;
                }
                let from = top.max(offset) - offset;
                let to = end.min(bottom) - offset;
                Some((page, from as u16, (to - from) as u16))
            })
            .collect()
    }

    pub fn state(&self, page: u32) -> Option<&PageState> {
        self.pager.state(page)
    }

    /// Composes every visible page into one picture of the viewport and encodes it.
    pub fn protocol(&mut self, area: Rect, picker: &Picker) -> Option<&ImageProtocol> {
        let font = picker.font_size();
        let key = RenderKey {
            offset: self.scroller.offset(),
            width: area.width,
            height: area.height,
            font,
            revision: self.revision,
        };
        if self.render_key != Some(key) {
            self.render_key = Some(key);
            self.rendered = self.compose(area, font, picker);
        }
        self.rendered.as_ref()
    }

    fn compose(&mut self, area: Rect, font: (u16, u16), picker: &Picker) -> Option<ImageProtocol> {
        let (font_w, font_h) = (u32::from(font.0.max(1)), u32::from(font.1.max(1)));
        let viewport_w_px = u32::from(area.width).saturating_mul(font_w).max(1);
        let viewport_h_px = u32::from(area.height).saturating_mul(font_h).max(1);
        let slot_h_px = self.page_rows().saturating_mul(font_h);

        if self.fitted_size != (viewport_w_px, slot_h_px) {
            self.fitted.clear();
            self.fitted_size = (viewport_w_px, slot_h_px);
        }

        let offset_px = (self.scroller.offset() as u32).saturating_mul(font_h);
        let page_rows = self.page_rows();
        let mut visible = Vec::new();
        for (page, _, _) in self.visible_slots() {
            let Some(source) = self.images.get(&page) else {
                continue;
            };
            let slot_top_px = self.pager.slot_top(page, page_rows)? * font_h;
            let fitted = self.fitted.entry(page).or_insert_with(|| {
                source.resize(
                    viewport_w_px,
                    slot_h_px,
                    image::imageops::FilterType::Triangle,
                )
            });
            visible.push((fitted.clone(), slot_top_px));
        }
        if visible.is_empty() {
            return None;
        }

        let viewport = compose_viewport(
            &visible,
            slot_h_px,
            viewport_w_px,
            viewport_h_px,
            offset_px,
        );
        picker
            .new_protocol(viewport, Rect::new(0, 0, area.width, area.height), Resize::Fit(None))
            .map_err(|err| tracing::warn!(error = %err, "viewer encode failed"))
            .ok()
    }
}

/// Overlays pre-fitted page images, stacked in slots of `slot_h_px`, onto a
/// viewport-sized canvas scrolled down by `offset_px`.
fn compose_viewport(
    pages: &[(image::DynamicImage, u32)],
    slot_h_px: u32,
    viewport_w_px: u32,
    viewport_h_px: u32,
    offset_px: u32,
) -> image::DynamicImage {
    let mut canvas: image::DynamicImage =
        image::ImageBuffer::from_pixel(viewport_w_px, viewport_h_px, BACKGROUND).into();
    for (page, slot_top_px) in pages {
        let dest_x = i64::from(viewport_w_px.saturating_sub(page.width()) / 2);
        let inset = i64::from(slot_h_px.saturating_sub(page.height()) / 2);
        let dest_y = i64::from(*slot_top_px) + inset - i64::from(offset_px);
        image::imageops::overlay(&mut canvas, page, dest_x, dest_y);
    }
    canvas
}

#[cfg(test)]
mod tests {
    use super::*;

    fn volume(pages: u32, read: u32) -> Volume {
        Volume {
            series_id: 1,
            volume_id: 2,
            chapter_id: 3,
            title: "Vol. 1".to_string(),
            pages,
            read,
            cached: true,
        }
    }

    fn solid(w: u32, h: u32, value: u8) -> image::DynamicImage {
        image::RgbaImage::from_pixel(w, h, image::Rgba([value, value, value, 255])).into()
    }

    fn deliver(viewer: &mut ViewerScreen, now: Instant) {
        for request in viewer.take_requests() {
            viewer.on_page_loaded(request, solid(4, 4, 200), now);
        }
    }

    #[test]
    fn loaded_first_page_prefetches_the_next() {
        let now = Instant::now();
        let mut viewer = ViewerScreen::new(volume(10, 3), Duration::from_secs(12), now);
        viewer.set_viewport(20, now);
        assert_eq!(viewer.pager.loaded_pages(), 3..4);

        deliver(&mut viewer, now);
        assert_eq!(viewer.pager.loaded_pages(), 3..5);
        assert_eq!(viewer.visible_slots(), vec![(3, 0, 20)]);
    }

    #[test]
    fn scrolling_splits_the_viewport_between_pages() {
        let now = Instant::now();
        let mut viewer = ViewerScreen::new(volume(10, 0), Duration::from_secs(12), now);
        viewer.set_viewport(20, now);
        deliver(&mut viewer, now);
        deliver(&mut viewer, now);

        for _ in 0..5 {
            viewer.scroll_down(now);
        }
        assert_eq!(viewer.offset(), 15);
        assert_eq!(viewer.visible_slots(), vec![(0, 0, 5), (1, 5, 15)]);
        assert_eq!(viewer.pager.current(), 1);
    }

    #[test]
    fn double_up_at_top_prepends_and_keeps_view() {
        let now = Instant::now();
        let mut viewer = ViewerScreen::new(volume(10, 6), Duration::from_secs(12), now);
        viewer.set_viewport(10, now);
        deliver(&mut viewer, now);

        viewer.scroll_up(now);
        assert_eq!(viewer.pager.loaded_pages().start, 6);
        viewer.scroll_up(now);
        assert_eq!(viewer.pager.loaded_pages().start, 1);
        assert_eq!(viewer.offset(), 50);
        assert_eq!(viewer.pager.current(), 6);
    }

    #[test]
    fn compose_places_pages_at_their_slots() {
        let pages = vec![(solid(10, 10, 255), 0), (solid(10, 10, 0), 10)];
        let canvas = compose_viewport(&pages, 10, 10, 10, 5).to_rgba8();
        assert_eq!(canvas.get_pixel(5, 0)[0], 255);
        assert_eq!(canvas.get_pixel(5, 9)[0], 0);
    }
}
