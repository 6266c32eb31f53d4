use std::collections::HashMap;

use ratatui::layout::Rect;
use ratatui_image::Resize;
use ratatui_image::picker::Picker;
use ratatui_image::protocol::Protocol as ImageProtocol;

use crate::worker::CoverKey;

const MAX_IN_FLIGHT: usize = 6;

enum CoverState {
    Pending,
    Ready {
        image: image::DynamicImage,
        rendered: Option<(u16, u16, ImageProtocol)>,
    },
    Failed,
}

/// Lazily fetched tile covers, kept for the whole session.
#[derive(Default)]
pub(crate) struct CoverCache {
    covers: HashMap<CoverKey, CoverState>,
}

impl CoverCache {
    fn in_flight(&self) -> usize {
        self.covers
            .values()
            .filter(|state| matches!(state, CoverState::Pending))
            .count()
    }

    /// Marks `key` as requested when it is unknown and there is room; the caller spawns the fetch.
    pub fn claim(&mut self, key: CoverKey) -> bool {
        if self.covers.contains_key(&key) || self.in_flight() >= MAX_IN_FLIGHT {
            return false;
        }
        self.covers.insert(key, CoverState::Pending);
        true
    }

    pub fn insert(&mut self, key: CoverKey, image: image::DynamicImage) {
        self.covers.insert(
            key,
            CoverState::Ready {
                image,
                rendered: None,
            },
        );
    }

    pub fn fail(&mut self, key: CoverKey) {
        self.covers.insert(key, CoverState::Failed);
    }

    /// Protocol sized for `area`, re-encoded only when the area changes.
    pub fn protocol(
        &mut self,
        key: CoverKey,
        area: Rect,
        picker: &Picker,
    ) -> Option<&mut ImageProtocol> {
        let Some(CoverState::Ready { image, rendered }) = self.covers.get_mut(&key) else {
            return None;
        };
        let stale = !matches!(rendered, Some((w, h, _)) if *w == area.width && *h == area.height);
        if stale {
            let size = Rect::new(0, 0, area.width, area.height);
            match picker.new_protocol(
                image.clone(),
                size,
                Resize::Fit(Some(image::imageops::FilterType::Triangle)),
            ) {
                Ok(protocol) => *rendered = Some((area.width, area.height, protocol)),
                Err(err) => {
                    tracing::debug!(?key, error = %err, "cover encode failed");
                    *rendered = None;
                }
            }
        }
        rendered.as_mut().map(|(_, _, protocol)| protocol)
    }
}
