use shelfdeck_core::{Command, ServerStatus};

use crate::grid::Tile;
use crate::route::{Action, Route};

#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionState {
    Unknown,
    Online(ServerStatus),
    Offline(String),
}

impl ConnectionState {
    pub fn is_online(&self) -> bool {
        matches!(self, ConnectionState::Online(status) if status.status)
    }

    pub fn label(&self) -> String {
        match self {
            ConnectionState::Unknown => "connecting...".to_string(),
            ConnectionState::Online(status) if status.status => {
                format!("connected as {}", status.logged_as)
            }
            ConnectionState::Online(_) => "backend up, not logged in".to_string(),
            ConnectionState::Offline(err) => format!("disconnected: {err}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardTileKind {
    Kavita,
    CleanCache,
    Update,
    Settings,
    Exit,
}

impl DashboardTileKind {
    pub const ALL: [DashboardTileKind; 5] = [
        DashboardTileKind::Kavita,
        DashboardTileKind::CleanCache,
        DashboardTileKind::Update,
        DashboardTileKind::Settings,
        DashboardTileKind::Exit,
    ];

    fn id(self) -> &'static str {
        match self {
            DashboardTileKind::Kavita => "kavita",
            DashboardTileKind::CleanCache => "clean-cache",
            DashboardTileKind::Update => "update",
            DashboardTileKind::Settings => "settings",
            DashboardTileKind::Exit => "exit",
        }
    }

    fn title(self) -> &'static str {
        match self {
            DashboardTileKind::Kavita => "Kavita",
            DashboardTileKind::CleanCache => "Clean cache",
            DashboardTileKind::Update => "Update",
            DashboardTileKind::Settings => "Settings",
            DashboardTileKind::Exit => "Exit",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardTile {
    pub kind: DashboardTileKind,
    detail: Option<String>,
}

impl Tile for DashboardTile {
    fn id(&self) -> String {
        self.kind.id().to_string()
    }

    fn title(&self) -> &str {
        self.kind.title()
    }

    fn action(&self) -> Action {
        match self.kind {
            DashboardTileKind::Kavita => Action::Open(Route::Shelf),
            DashboardTileKind::CleanCache => Action::Run(Command::ClearCache),
            DashboardTileKind::Update => Action::Run(Command::UpdateLibrary),
            DashboardTileKind::Settings => Action::Open(Route::ServerSettings),
            DashboardTileKind::Exit => Action::Exit,
        }
    }

    fn detail(&self) -> Option<String> {
        self.detail.clone()
    }
}

/// Tiles with details taken from the latest status poll.
pub fn dashboard_tiles(connection: &ConnectionState) -> Vec<DashboardTile> {
    let status = match connection {
        ConnectionState::Online(status) => Some(status),
        ConnectionState::Unknown | ConnectionState::Offline(_) => None,
    };
    DashboardTileKind::ALL
        .into_iter()
        .map(|kind| {
            let detail = match kind {
                DashboardTileKind::Kavita => status
                    .filter(|s| !s.ip.is_empty())
                    .map(|s| s.ip.clone()),
                DashboardTileKind::CleanCache => status.map(|s| format!("{:.2} GB", s.cache)),
                DashboardTileKind::Update | DashboardTileKind::Settings | DashboardTileKind::Exit => {
                    None
                }
            };
            DashboardTile { kind, detail }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn online() -> ConnectionState {
        ConnectionState::Online(ServerStatus {
            status: true,
            ip: "192.168.1.10:5000".to_string(),
            logged_as: "reader".to_string(),
            cache: 1.234,
        })
    }

    #[test]
    fn tiles_show_status_details() {
        let tiles = dashboard_tiles(&online());
        let details: Vec<Option<String>> = tiles.iter().map(Tile::detail).collect();
        assert_eq!(details[0].as_deref(), Some("192.168.1.10:5000"));
        assert_eq!(details[1].as_deref(), Some("1.23 GB"));
        assert_eq!(details[4], None);

        let offline = dashboard_tiles(&ConnectionState::Offline("refused".to_string()));
        assert!(offline.iter().all(|tile| tile.detail().is_none()));
    }

    #[test]
    fn tiles_map_to_actions() {
        let tiles = dashboard_tiles(&ConnectionState::Unknown);
        let actions: Vec<Action> = tiles.iter().map(Tile::action).collect();
        assert_eq!(
            actions,
            vec![
                Action::Open(Route::Shelf),
                Action::Run(Command::ClearCache),
                Action::Run(Command::UpdateLibrary),
                Action::Open(Route::ServerSettings),
                Action::Exit,
            ]
        );
    }

    #[test]
    fn connection_labels() {
        assert!(online().is_online());
        assert_eq!(online().label(), "connected as reader");
        assert!(!ConnectionState::Offline("x".to_string()).is_online());
    }
}
