use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Library {
    pub id: u64,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub id: u64,
    pub title: String,
    /// Percentage of pages read, 0-100.
    #[serde(rename = "read", default)]
    pub read_percent: f32,
    #[serde(default)]
    pub cached: bool,
}

impl Series {
    pub fn is_complete(&self) -> bool {
        self.read_percent >= 100.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Volume {
    pub series_id: u64,
    pub volume_id: u64,
    pub chapter_id: u64,
    pub title: String,
    pub pages: u32,
    /// Pages consumed so far.
    pub read: u32,
    #[serde(default)]
    pub cached: bool,
}

impl Volume {
    pub fn is_complete(&self) -> bool {
        self.read == self.pages
    }

    pub fn progress_percent(&self) -> f32 {
        if self.pages == 0 {
            0.0
        } else {
            (self.read.min(self.pages) as f32 / self.pages as f32) * 100.0
        }
    }

    /// Zero-based page the reader should open on.
    pub fn resume_page(&self) -> u32 {
        self.read.min(self.pages.saturating_sub(1))
    }
}

/// In-progress series first, completed ones last; server order is kept inside each group.
pub fn order_series(series: Vec<Series>) -> Vec<Series> {
    let (mut in_progress, completed): (Vec<_>, Vec<_>) =
        series.into_iter().partition(|s| !s.is_complete());
    in_progress.extend(completed);
    in_progress
}
