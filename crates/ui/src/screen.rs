use std::time::{Duration, Instant};

use shelfdeck_application::{
    AppContext, ConnectionState, DashboardTile, FocusFallback, GridScreen, Interval, LOG_REFRESH,
    LogView, Route, SettingsForm, dashboard_tiles,
};
use shelfdeck_core::{Library, Series, Volume};

use crate::viewer::ViewerScreen;
use crate::worker::Job;

const DASHBOARD_COLUMNS: usize = 5;

/// A tile list fed by one backend endpoint.
pub(crate) struct ListScreen<T> {
    pub grid: GridScreen<T>,
    pub fetch: Interval,
    pub error: Option<String>,
}

impl<T> ListScreen<T> {
    fn new(grid: GridScreen<T>, fetch: Interval) -> Self {
        Self {
            grid,
            fetch,
            error: None,
        }
    }
}

pub(crate) struct DashboardScreen {
    pub grid: GridScreen<DashboardTile>,
    pub status: Interval,
}

pub(crate) struct SettingsScreen {
    pub form: SettingsForm,
    pub fetch: Interval,
    pub error: Option<String>,
}

pub(crate) struct LogsScreen {
    pub view: LogView,
    pub fetch: Interval,
    pub editing_filter: bool,
    pub error: Option<String>,
}

/// State of one mounted route. Lives exactly as long as its entry in the navigation stack.
pub(crate) enum Screen {
    Dashboard(DashboardScreen),
    Shelf(ListScreen<Library>),
    Library { id: u64, list: ListScreen<Series> },
    Series { id: u64, list: ListScreen<Volume> },
    Viewer(Box<ViewerScreen>),
    Settings(SettingsScreen),
    Logs(LogsScreen),
}

impl Screen {
    pub fn mount(
        route: &Route,
        ctx: &AppContext,
        connection: &ConnectionState,
        now: Instant,
    ) -> Self {
        let settings = &ctx.settings;
        let resume_key = route.resume_key();
        let resume_id = resume_key.and_then(|key| ctx.resume_point(key));
        let columns = settings.grid_columns;
        match route {
            Route::Dashboard => {
                let mut grid = GridScreen::new(
                    DASHBOARD_COLUMNS,
                    resume_key,
                    resume_id,
                    FocusFallback::First,
                );
                grid.replace_items(dashboard_tiles(connection), now);
                Screen::Dashboard(DashboardScreen {
                    grid,
                    status: Interval::new(Duration::from_secs(settings.status_poll_secs), now),
                })
            }
            Route::Shelf => Screen::Shelf(ListScreen::new(
                GridScreen::new(columns, resume_key, resume_id, FocusFallback::First),
                Interval::once(now),
            )),
            Route::Library { id, .. } => Screen::Library {
                id: *id,
                list: ListScreen::new(
                    GridScreen::new(columns, resume_key, resume_id, FocusFallback::First),
                    Interval::once(now),
                ),
            },
            Route::Series { id, .. } => Screen::Series {
                id: *id,
                list: ListScreen::new(
                    GridScreen::new(
                        columns,
                        resume_key,
                        resume_id,
                        FocusFallback::FirstIncomplete,
                    ),
                    Interval::new(Duration::from_secs(settings.volumes_poll_secs), now),
                ),
            },
            Route::Viewer(volume) => Screen::Viewer(Box::new(ViewerScreen::new(
                volume.clone(),
                Duration::from_secs(settings.page_timeout_secs),
                now,
            ))),
            Route::ServerSettings => Screen::Settings(SettingsScreen {
                form: SettingsForm::default(),
                fetch: Interval::once(now),
                error: None,
            }),
            Route::Logs => Screen::Logs(LogsScreen {
                view: LogView::default(),
                fetch: Interval::new(LOG_REFRESH, now),
                editing_filter: false,
                error: None,
            }),
        }
    }

    /// Backend calls that are due now.
    pub fn due_jobs(&mut self, now: Instant) -> Vec<Job> {
        match self {
            Screen::Dashboard(screen) => fire(&mut screen.status, now, Job::Status),
            Screen::Shelf(list) => fire(&mut list.fetch, now, Job::Libraries),
            Screen::Library { id, list } => fire(&mut list.fetch, now, Job::Series(*id)),
            Screen::Series { id, list } => fire(&mut list.fetch, now, Job::Volumes(*id)),
            Screen::Viewer(viewer) => {
                let volume = viewer.volume.clone();
                viewer
                    .take_requests()
                    .into_iter()
                    .map(|request| Job::Page {
                        volume: volume.clone(),
                        request,
                    })
                    .collect()
            }
            Screen::Settings(screen) => fire(&mut screen.fetch, now, Job::ServerSettings),
            Screen::Logs(screen) => {
                if screen.view.auto_refresh() || !screen.view.is_loaded() {
                    fire(&mut screen.fetch, now, Job::Logs)
                } else {
                    Vec::new()
                }
            }
        }
    }

    /// Animations and timers; true when the screen needs a redraw.
    pub fn tick(&mut self, now: Instant) -> bool {
        match self {
            Screen::Dashboard(screen) => screen.grid.tick(now),
            Screen::Shelf(list) => list.grid.tick(now),
            Screen::Library { list, .. } => list.grid.tick(now),
            Screen::Series { list, .. } => list.grid.tick(now),
            Screen::Viewer(viewer) => viewer.tick(now),
            Screen::Settings(_) | Screen::Logs(_) => false,
        }
    }

    /// Requests a fresh fetch of whatever the screen shows.
    pub fn refresh(&mut self, now: Instant) {
        match self {
            Screen::Dashboard(screen) => screen.status.trigger(now),
            Screen::Shelf(list) => list.fetch.trigger(now),
            Screen::Library { list, .. } => list.fetch.trigger(now),
            Screen::Series { list, .. } => list.fetch.trigger(now),
            Screen::Viewer(_) => {}
            Screen::Settings(screen) => screen.fetch.trigger(now),
            Screen::Logs(screen) => screen.fetch.trigger(now),
        }
    }

    /// Called when the screen becomes current again; results of its old mounting were dropped.
    pub fn resume(&mut self, now: Instant) {
        match self {
            Screen::Dashboard(screen) => screen.status.restart(now),
            Screen::Shelf(list) => list.fetch.restart(now),
            Screen::Library { list, .. } => list.fetch.restart(now),
            Screen::Series { list, .. } => list.fetch.restart(now),
            Screen::Viewer(_) => {}
            Screen::Settings(screen) => screen.fetch.restart(now),
            Screen::Logs(screen) => screen.fetch.restart(now),
        }
    }

    /// Text entry swallows letter keys that would otherwise be shortcuts.
    pub fn wants_text(&self) -> bool {
        match self {
            Screen::Settings(screen) => screen.form.focus().is_text(),
            Screen::Logs(screen) => screen.editing_filter,
            _ => false,
        }
    }
}

fn fire(interval: &mut Interval, now: Instant, job: Job) -> Vec<Job> {
    if interval.fire(now) {
        vec![job]
    } else {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shelfdeck_core::{ResumeKey, Settings};

    fn ctx() -> AppContext {
        AppContext::new(Settings::default())
    }

    #[test]
    fn lists_fetch_on_mount_and_again_only_on_refresh() {
        let now = Instant::now();
        let mut screen = Screen::mount(&Route::Shelf, &ctx(), &ConnectionState::Unknown, now);
        assert!(matches!(screen.due_jobs(now).as_slice(), [Job::Libraries]));

        if let Screen::Shelf(list) = &mut screen {
            list.fetch.complete();
        }
        assert!(screen.due_jobs(now + Duration::from_secs(30)).is_empty());

        screen.refresh(now);
        assert!(matches!(screen.due_jobs(now).as_slice(), [Job::Libraries]));
    }

    #[test]
    fn volumes_poll_every_second() {
        let now = Instant::now();
        let route = Route::Series {
            id: 4,
            title: "Berserk".to_string(),
        };
        let mut screen = Screen::mount(&route, &ctx(), &ConnectionState::Unknown, now);
        assert!(matches!(screen.due_jobs(now).as_slice(), [Job::Volumes(4)]));
        if let Screen::Series { list, .. } = &mut screen {
            list.fetch.complete();
        }
        assert!(screen.due_jobs(now + Duration::from_millis(500)).is_empty());
        assert!(matches!(
            screen.due_jobs(now + Duration::from_secs(1)).as_slice(),
            [Job::Volumes(4)]
        ));
    }

    #[test]
    fn resumed_screen_refetches_despite_lost_result() {
        let now = Instant::now();
        let mut screen = Screen::mount(&Route::Dashboard, &ctx(), &ConnectionState::Unknown, now);
        assert_eq!(screen.due_jobs(now).len(), 1);
        assert!(screen.due_jobs(now + Duration::from_secs(10)).is_empty());
        screen.resume(now);
        assert_eq!(screen.due_jobs(now).len(), 1);
    }

    #[test]
    fn dashboard_focuses_its_resume_point() {
        let now = Instant::now();
        let mut ctx = ctx();
        ctx.resume_points
            .insert(ResumeKey::Dashboard, "settings".to_string());
        let screen = Screen::mount(&Route::Dashboard, &ctx, &ConnectionState::Unknown, now);
        let Screen::Dashboard(dashboard) = screen else {
            panic!("expected dashboard");
        };
        assert_eq!(dashboard.grid.focused_index(), Some(3));
    }

    #[test]
    fn viewer_requests_its_resume_page() {
        let now = Instant::now();
        let volume = Volume {
            series_id: 1,
            volume_id: 2,
            chapter_id: 3,
            title: "Vol. 2".to_string(),
            pages: 20,
            read: 5,
            cached: false,
        };
        let mut screen = Screen::mount(&Route::Viewer(volume), &ctx(), &ConnectionState::Unknown, now);
        let jobs = screen.due_jobs(now);
        assert!(matches!(
            jobs.as_slice(),
            [Job::Page { request, .. }] if request.page == 5 && request.attempt == 1
        ));
    }
}
