use crate::Volume;

/// Fire-and-forget actions the backend executes on request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    UpdateLibrary,
    ClearCache,
    MarkRead { series_id: u64, volume_id: u64 },
    MarkUnread { series_id: u64, volume_id: u64 },
    StartCache { series_id: u64 },
    StopCache { series_id: u64 },
}

impl Command {
    pub fn label(&self) -> &'static str {
        match self {
            Command::UpdateLibrary => "Library update",
            Command::ClearCache => "Cache clean",
            Command::MarkRead { .. } => "Mark as read",
            Command::MarkUnread { .. } => "Mark as unread",
            Command::StartCache { .. } => "Series caching",
            Command::StopCache { .. } => "Stop caching",
        }
    }

    /// Mark read when the volume is unfinished, unread when it is complete.
    pub fn toggle_read(volume: &Volume) -> Self {
        let (series_id, volume_id) = (volume.series_id, volume.volume_id);
        if volume.is_complete() {
            Command::MarkUnread {
                series_id,
                volume_id,
            }
        } else {
            Command::MarkRead {
                series_id,
                volume_id,
            }
        }
    }

    /// Whether list data shown on screen is stale once the command succeeds.
    pub fn invalidates_lists(&self) -> bool {
        !matches!(self, Command::StartCache { .. } | Command::StopCache { .. })
    }
}
