use shelfdeck_core::{Command, ResumeKey, Volume};

#[derive(Debug, Clone, PartialEq)]
pub enum Route {
    Dashboard,
    Shelf,
    Library { id: u64, title: String },
    Series { id: u64, title: String },
    Viewer(Volume),
    ServerSettings,
    Logs,
}

impl Route {
    /// Key under which the screen's last activated item is remembered.
    pub fn resume_key(&self) -> Option<ResumeKey> {
        match self {
            Route::Dashboard => Some(ResumeKey::Dashboard),
            Route::Shelf => Some(ResumeKey::Shelf),
            Route::Library { id, .. } => Some(ResumeKey::Library(*id)),
            Route::Series { id, .. } => Some(ResumeKey::Series(*id)),
            Route::Viewer(_) | Route::ServerSettings | Route::Logs => None,
        }
    }

    pub fn title(&self) -> String {
        match self {
            Route::Dashboard => "Dashboard".to_string(),
            Route::Shelf => "Libraries".to_string(),
            Route::Library { title, .. } | Route::Series { title, .. } => title.clone(),
            Route::Viewer(volume) => volume.title.clone(),
            Route::ServerSettings => "Server settings".to_string(),
            Route::Logs => "Backend logs".to_string(),
        }
    }
}

/// What activating a tile does.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Open(Route),
    Run(Command),
    Exit,
}

/// Identifies one mounting of a screen; results addressed to an old token are stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScreenToken(u64);

#[derive(Debug, Clone)]
pub struct NavStack {
    entries: Vec<(Route, ScreenToken)>,
    next_token: u64,
}

impl NavStack {
    pub fn new(root: Route) -> Self {
        Self {
            entries: vec![(root, ScreenToken(0))],
            next_token: 1,
        }
    }

    pub fn push(&mut self, route: Route) -> ScreenToken {
        let token = ScreenToken(self.next_token);
        self.next_token += 1;
        tracing::info!(route = %route.title(), depth = self.entries.len() + 1, "open screen");
        self.entries.push((route, token));
        token
    }

    /// Leaves the current screen. The root screen is never popped.
    pub fn pop(&mut self) -> Option<Route> {
        if self.entries.len() <= 1 {
            return None;
        }
        let (route, _) = self.entries.pop()?;
        tracing::info!(route = %route.title(), "close screen");
        Some(route)
    }

    /// Re-mounts the current screen under a fresh token.
    pub fn remount(&mut self) -> ScreenToken {
        let token = ScreenToken(self.next_token);
        self.next_token += 1;
        if let Some(entry) = self.entries.last_mut() {
            entry.1 = token;
        }
        token
    }

    pub fn current(&self) -> &Route {
        // The root entry is never removed.
        &self.entries[self.entries.len() - 1].0
    }

    pub fn token(&self) -> ScreenToken {
        self.entries[self.entries.len() - 1].1
    }

    pub fn is_current(&self, token: ScreenToken) -> bool {
        self.token() == token
    }

    pub fn depth(&self) -> usize {
        self.entries.len()
    }

    pub fn breadcrumbs(&self) -> String {
        self.entries
            .iter()
            .map(|(route, _)| route.title())
            .collect::<Vec<_>>()
            .join(" › ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_survives_pop() {
        let mut stack = NavStack::new(Route::Dashboard);
        assert_eq!(stack.pop(), None);
        assert_eq!(stack.current(), &Route::Dashboard);
    }

    #[test]
    fn tokens_go_stale_after_pop_and_remount() {
        let mut stack = NavStack::new(Route::Dashboard);
        let shelf = stack.push(Route::Shelf);
        assert!(stack.is_current(shelf));

        let library = stack.push(Route::Library {
            id: 1,
            title: "Manga".to_string(),
        });
        assert!(!stack.is_current(shelf));
        stack.pop();
        assert!(stack.is_current(shelf));

        let again = stack.push(Route::Library {
            id: 1,
            title: "Manga".to_string(),
        });
        assert_ne!(library, again);

        let fresh = stack.remount();
        assert!(!stack.is_current(again));
        assert!(stack.is_current(fresh));
        assert_eq!(stack.breadcrumbs(), "Dashboard › Libraries › Manga");
    }

    #[test]
    fn list_routes_carry_resume_keys() {
        assert_eq!(Route::Shelf.resume_key(), Some(ResumeKey::Shelf));
        assert_eq!(
            Route::Series {
                id: 9,
                title: String::new()
            }
            .resume_key(),
            Some(ResumeKey::Series(9))
        );
        assert_eq!(Route::Logs.resume_key(), None);
    }
}
