use std::time::Instant;

use shelfdeck_core::{Library, ResumeKey, Series, Volume};

use crate::nav::{Direction, FocusState, GridNav};
use crate::route::{Action, Route};
use crate::scroll::{Scroller, centered_offset};

/// An item that can sit in a navigable grid.
pub trait Tile {
    /// Stable identity used to re-find the item after a refresh.
    fn id(&self) -> String;
    fn title(&self) -> &str;
    fn action(&self) -> Action;

    fn detail(&self) -> Option<String> {
        None
    }

    fn is_complete(&self) -> bool {
        false
    }
}

impl Tile for Library {
    fn id(&self) -> String {
        self.id.to_string()
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn action(&self) -> Action {
        Action::Open(Route::Library {
            id: self.id,
            title: self.title.clone(),
        })
    }
}

impl Tile for Series {
    fn id(&self) -> String {
        self.id.to_string()
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn action(&self) -> Action {
        Action::Open(Route::Series {
            id: self.id,
            title: self.title.clone(),
        })
    }

    fn detail(&self) -> Option<String> {
        let cached = if self.cached { " · cached" } else { "" };
        Some(format!("{:.0}%{cached}", self.read_percent))
    }

    fn is_complete(&self) -> bool {
        Series::is_complete(self)
    }
}

impl Tile for Volume {
    fn id(&self) -> String {
        self.volume_id.to_string()
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn action(&self) -> Action {
        Action::Open(Route::Viewer(self.clone()))
    }

    fn detail(&self) -> Option<String> {
        let cached = if self.cached { " · cached" } else { "" };
        Some(format!(
            "{}/{} ({:.0}%){cached}",
            self.read,
            self.pages,
            self.progress_percent()
        ))
    }

    fn is_complete(&self) -> bool {
        Volume::is_complete(self)
    }
}

/// Where focus lands when neither the previous item nor the resume point is found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusFallback {
    First,
    /// First unfinished item, or the last one when everything is finished.
    FirstIncomplete,
}

impl FocusFallback {
    fn index<T: Tile>(self, items: &[T]) -> usize {
        match self {
            FocusFallback::First => 0,
            FocusFallback::FirstIncomplete => items
                .iter()
                .position(|item| !item.is_complete())
                .unwrap_or(items.len().saturating_sub(1)),
        }
    }
}

/// Resume point to persist after an activation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumeUpdate {
    pub key: ResumeKey,
    pub item_id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Activation {
    pub action: Action,
    pub resume: Option<ResumeUpdate>,
}

/// A navigable grid of tiles with identity-based refocus and a remembered resume point.
#[derive(Debug, Clone)]
pub struct GridScreen<T> {
    items: Vec<T>,
    nav: GridNav,
    scroller: Scroller,
    visible_rows: usize,
    resume_key: Option<ResumeKey>,
    resume_id: Option<String>,
    fallback: FocusFallback,
    loaded: bool,
}

impl<T: Tile> GridScreen<T> {
    pub fn new(
        columns: usize,
        resume_key: Option<ResumeKey>,
        resume_id: Option<String>,
        fallback: FocusFallback,
    ) -> Self {
        Self {
            items: Vec::new(),
            nav: GridNav::new(columns),
            scroller: Scroller::new(),
            visible_rows: 0,
            resume_key,
            resume_id,
            fallback,
            loaded: false,
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn nav(&self) -> &GridNav {
        &self.nav
    }

    pub fn focus_state(&self) -> FocusState {
        self.nav.state()
    }

    pub fn focused_index(&self) -> Option<usize> {
        self.nav.focused()
    }

    pub fn focused_item(&self) -> Option<&T> {
        self.nav.focused().and_then(|index| self.items.get(index))
    }

    pub fn resume_id(&self) -> Option<&str> {
        self.resume_id.as_deref()
    }

    pub fn scroll_offset(&self) -> usize {
        self.scroller.offset()
    }

    /// Swaps in fresh data and re-anchors focus by identity.
    ///
    /// The item focused before the refresh wins, then the resume point, then
    /// the fallback position.
    pub fn replace_items(&mut self, items: Vec<T>, now: Instant) {
        let previous = self.focused_item().map(Tile::id);
        let first_load = !self.loaded;
        self.items = items;
        self.loaded = true;
        self.nav.set_len(self.items.len());
        if self.items.is_empty() {
            return;
        }

        let find = |id: Option<&str>| {
            id.and_then(|id| self.items.iter().position(|item| item.id() == id))
        };
        let index = find(previous.as_deref())
            .or_else(|| find(self.resume_id.as_deref()))
            .unwrap_or_else(|| self.fallback.index(&self.items));
        self.nav.focus(index);

        if first_load {
            self.snap_scroll();
        } else {
            self.follow_focus(now);
        }
    }

    pub fn move_focus(&mut self, direction: Direction, now: Instant) -> bool {
        let moved = self.nav.move_focus(direction);
        if moved {
            self.follow_focus(now);
        }
        moved
    }

    /// Records the focused item as the resume point and returns its action.
    pub fn activate(&mut self) -> Option<Activation> {
        let item = self.focused_item()?;
        let action = item.action();
        let item_id = item.id();
        self.resume_id = Some(item_id.clone());
        let resume = self.resume_key.map(|key| ResumeUpdate { key, item_id });
        Some(Activation { action, resume })
    }

    pub fn set_columns(&mut self, columns: usize, now: Instant) {
        if columns.max(1) == self.nav.columns() {
            return;
        }
        self.nav.set_columns(columns);
        self.follow_focus(now);
    }

    /// Tells the grid how many rows fit on screen; keeps the focused row centered.
    pub fn set_visible_rows(&mut self, rows: usize, now: Instant) {
        if rows == self.visible_rows {
            return;
        }
        self.visible_rows = rows;
        self.follow_focus(now);
    }

    pub fn tick(&mut self, now: Instant) -> bool {
        self.scroller.tick(now)
    }

    fn scroll_target(&self) -> usize {
        let row = self.nav.focused_row().unwrap_or(0);
        centered_offset(row, self.nav.rows(), self.visible_rows)
    }

    fn follow_focus(&mut self, now: Instant) {
        let target = self.scroll_target();
        self.scroller.animate_to(target, now);
    }

    fn snap_scroll(&mut self) {
        let target = self.scroll_target();
        self.scroller.jump_to(target);
    }
}
