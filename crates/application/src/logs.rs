use std::time::Duration;

use shelfdeck_core::{LogLevel, LogsResponse};

pub const LOG_REFRESH: Duration = Duration::from_secs(2);

/// Backend log lines with a case-insensitive filter. Follows the tail unless scrolled up.
#[derive(Debug, Clone)]
pub struct LogView {
    lines: Vec<String>,
    total: usize,
    filter: String,
    auto_refresh: bool,
    scroll_back: usize,
    loaded: bool,
}

impl Default for LogView {
    fn default() -> Self {
        Self {
            lines: Vec::new(),
            total: 0,
            filter: String::new(),
            auto_refresh: true,
            scroll_back: 0,
            loaded: false,
        }
    }
}

impl LogView {
    pub fn set_logs(&mut self, logs: LogsResponse) {
        self.total = logs.count.max(logs.logs.len());
        self.lines = logs.logs;
        self.loaded = true;
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn push_filter(&mut self, c: char) {
        self.filter.push(c);
        self.scroll_back = 0;
    }

    pub fn pop_filter(&mut self) {
        self.filter.pop();
        self.scroll_back = 0;
    }

    pub fn auto_refresh(&self) -> bool {
        self.auto_refresh
    }

    pub fn toggle_auto_refresh(&mut self) -> bool {
        self.auto_refresh = !self.auto_refresh;
        self.auto_refresh
    }

    pub fn visible(&self) -> Vec<(LogLevel, &str)> {
        let needle = self.filter.to_lowercase();
        self.lines
            .iter()
            .filter(|line| needle.is_empty() || line.to_lowercase().contains(&needle))
            .map(|line| (LogLevel::classify(line), line.as_str()))
            .collect()
    }

    pub fn summary(&self) -> String {
        format!("showing {} of {}", self.visible().len(), self.total)
    }

    pub fn scroll_up(&mut self, lines: usize) {
        let max = self.visible().len().saturating_sub(1);
        self.scroll_back = (self.scroll_back + lines).min(max);
    }

    pub fn scroll_down(&mut self, lines: usize) {
        self.scroll_back = self.scroll_back.saturating_sub(lines);
    }

    /// Lines to show in a window of `height` rows.
    pub fn window(&self, height: usize) -> Vec<(LogLevel, &str)> {
        let visible = self.visible();
        let end = visible.len().saturating_sub(self.scroll_back);
        let start = end.saturating_sub(height);
        visible[start..end].to_vec()
    }
}
