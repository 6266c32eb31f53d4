//! Screen state machines for shelfdeck, independent of the terminal.

use std::collections::{HashMap, HashSet};

use shelfdeck_core::{ResumeKey, Settings};

mod dashboard;
mod grid;
mod input;
mod logs;
mod nav;
mod pager;
mod poll;
mod route;
mod scroll;
mod settings_form;
mod toast;

pub use dashboard::{ConnectionState, DashboardTile, DashboardTileKind, dashboard_tiles};
pub use grid::{Activation, FocusFallback, GridScreen, ResumeUpdate, Tile};
pub use input::Input;
pub use logs::{LOG_REFRESH, LogView};
pub use nav::{Direction, FocusState, GridNav};
pub use pager::{
    BACKWARD_BATCH, MAX_RETRIES, PageRequest, PageState, Pager, RETRY_DELAY,
    UP_PRESSES_FOR_EARLIER,
};
pub use poll::Interval;
pub use route::{Action, NavStack, Route, ScreenToken};
pub use scroll::{SCROLL_DURATION, Scroller, centered_offset};
pub use settings_form::{FormAction, FormField, SettingsForm};
pub use toast::{Toast, ToastKind, Toasts};

#[derive(Debug, Clone)]
pub struct AppContext {
    pub settings: Settings,
    pub resume_points: HashMap<ResumeKey, String>,
    pub dirty_resume_keys: HashSet<ResumeKey>,
}

impl AppContext {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            resume_points: HashMap::new(),
            dirty_resume_keys: HashSet::new(),
        }
    }

    pub fn with_resume_points(mut self, resume_points: HashMap<ResumeKey, String>) -> Self {
        self.resume_points = resume_points;
        self
    }

    pub fn resume_point(&self, key: ResumeKey) -> Option<String> {
        self.resume_points.get(&key).cloned()
    }

    pub fn record_resume(&mut self, update: &ResumeUpdate) {
        let key = update.key;
        if self.resume_points.get(&key) == Some(&update.item_id) {
            return;
        }
        self.resume_points.insert(key, update.item_id.clone());
        self.dirty_resume_keys.insert(key);
    }

    /// Resume points changed since the last call, for persisting.
    pub fn take_dirty_resume_points(&mut self) -> Vec<(ResumeKey, String)> {
        let mut out = self
            .dirty_resume_keys
            .drain()
            .filter_map(|key| {
                let item = self.resume_points.get(&key)?.clone();
                Some((key, item))
            })
            .collect::<Vec<_>>();
        out.sort();
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resume_points_are_tracked_dirty_once() {
        let mut ctx = AppContext::new(Settings::default()).with_resume_points(HashMap::from([(
            ResumeKey::Shelf,
            "1".to_string(),
        )]));
        assert_eq!(ctx.resume_point(ResumeKey::Shelf).as_deref(), Some("1"));

        ctx.record_resume(&ResumeUpdate {
            key: ResumeKey::Shelf,
            item_id: "1".to_string(),
        });
        assert!(ctx.take_dirty_resume_points().is_empty());

        ctx.record_resume(&ResumeUpdate {
            key: ResumeKey::Series(4),
            item_id: "40".to_string(),
        });
        ctx.record_resume(&ResumeUpdate {
            key: ResumeKey::Shelf,
            item_id: "2".to_string(),
        });
        assert_eq!(
            ctx.take_dirty_resume_points(),
            vec![
                (ResumeKey::Shelf, "2".to_string()),
                (ResumeKey::Series(4), "40".to_string()),
            ]
        );
        assert!(ctx.take_dirty_resume_points().is_empty());
    }
}
