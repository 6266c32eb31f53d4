//! ratatui-based UI.

use std::io::{self, Stdout};
use std::time::{Duration, Instant};

use anyhow::Context as _;
use crossbeam_channel::{Receiver, Sender, unbounded};
use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{event, terminal};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui_image::picker::Picker;
use shelfdeck_application::{
    Action, Activation, AppContext, ConnectionState, Direction as Move, FormAction, GridScreen,
    Input, NavStack, Route, Tile, ToastKind, Toasts, dashboard_tiles,
};
use shelfdeck_client::{BackendClient, ClientError, EventStream, StreamMessage};
use shelfdeck_core::{BackendEvent, Command, Series, ServerSettingsUpdate, Volume, order_series};

mod covers;
mod draw;
mod image_protocol;
mod screen;
mod viewer;
mod worker;

use covers::CoverCache;
use draw::{CoverSource, GridStyle, accent_color, key_hints};
use screen::{ListScreen, LogsScreen, Screen, SettingsScreen};
use viewer::ViewerScreen;
use worker::{CoverKey, Job, JobResult, Payload, Worker};

/// Redraw cadence while something animates.
const FRAME: Duration = Duration::from_millis(16);
const IDLE_TICK: Duration = Duration::from_millis(100);
const LOG_PAGE: usize = 10;

#[derive(Debug, Clone)]
pub struct UiOutcome {
    pub ctx: AppContext,
}

/// What a key press asks the UI to do once the screen has handled it.
enum Reaction {
    None,
    Back,
    Refresh,
    Activated(Activation),
    Open(Route),
    Run(Command),
    Save(ServerSettingsUpdate),
    Toast(ToastKind, String),
}

pub struct Ui {
    ctx: AppContext,
    stack: NavStack,
    /// One entry per route on `stack`, in the same order.
    screens: Vec<Screen>,
    worker: Worker,
    toasts: Toasts,
    connection: ConnectionState,
    covers: CoverCache,
    wanted_covers: Vec<CoverKey>,
    picker: Picker,
    stream_tx: Sender<StreamMessage>,
    stream_rx: Receiver<StreamMessage>,
}

impl Ui {
    pub fn new(mut ctx: AppContext) -> anyhow::Result<Self> {
        ctx.settings.normalize();
        let client = BackendClient::new(
            &ctx.settings.backend_url,
            Duration::from_secs(ctx.settings.page_timeout_secs),
        )
        .context("create backend client")?;
        let connection = ConnectionState::Unknown;
        let stack = NavStack::new(Route::Dashboard);
        let root = Screen::mount(stack.current(), &ctx, &connection, Instant::now());
        let (stream_tx, stream_rx) = unbounded();
        Ok(Self {
            ctx,
            stack,
            screens: vec![root],
            worker: Worker::new(client),
            toasts: Toasts::default(),
            connection,
            covers: CoverCache::default(),
            wanted_covers: Vec::new(),
            picker: Picker::halfblocks(),
            stream_tx,
            stream_rx,
        })
    }

    pub fn run(&mut self) -> anyhow::Result<UiOutcome> {
        let mut terminal = setup_terminal()?;
        self.picker = image_protocol::detect_picker(viewer::BACKGROUND);
        terminal.clear().ok();

        let tx = self.stream_tx.clone();
        let events = EventStream::spawn(self.ctx.settings.events_url(), move |message| {
            let _ = tx.send(message);
        });

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            self.event_loop(&mut terminal)
        }));
        let restore_result = restore_terminal(&mut terminal);
        drop(events);

        match (result, restore_result) {
            (Ok(Ok(())), Ok(())) => Ok(UiOutcome {
                ctx: self.ctx.clone(),
            }),
            (Ok(Err(err)), Ok(())) => Err(err),
            (Ok(_), Err(err)) => Err(err),
            (Err(panic), Ok(())) => Err(anyhow::anyhow!(panic_to_string(panic))),
            (Err(panic), Err(err)) => Err(anyhow::anyhow!(
                "{}\n(additionally failed to restore terminal: {err})",
                panic_to_string(panic)
            )),
        }
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> anyhow::Result<()> {
        let mut needs_redraw = true;

        loop {
            let now = Instant::now();
            let animating = self.tick(now);
            needs_redraw |= animating;
            needs_redraw |= self.drain_results(now);
            needs_redraw |= self.drain_stream(now);

            if needs_redraw {
                terminal.draw(|frame| self.draw(frame.area(), frame))?;
                needs_redraw = false;
            }

            let timeout = if animating { FRAME } else { IDLE_TICK };
            if !event::poll(timeout)? {
                continue;
            }

            match event::read()? {
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                Event::Key(key) => {
                    if key.kind == KeyEventKind::Release {
                        continue;
                    }
                    needs_redraw = true;
                    let Some(input) = map_key(key, self.text_entry()) else {
                        continue;
                    };
                    if self.handle_input(input, Instant::now()) {
                        return Ok(());
                    }
                }
                _ => {}
            }
        }
    }

    fn text_entry(&self) -> bool {
        self.screens.last().is_some_and(Screen::wants_text)
    }

    /// Timers, animations and due backend calls. True while the screen animates.
    fn tick(&mut self, now: Instant) -> bool {
        let mut dirty = self.toasts.expire(now);
        let token = self.stack.token();
        if let Some(screen) = self.screens.last_mut() {
            dirty |= screen.tick(now);
            for job in screen.due_jobs(now) {
                self.worker.spawn(token, job);
            }
        }
        for key in self.wanted_covers.drain(..) {
            self.worker.spawn(token, Job::Cover(key));
        }
        dirty
    }

    fn drain_results(&mut self, now: Instant) -> bool {
        let mut dirty = false;
        while let Ok(result) = self.worker.results().try_recv() {
            self.apply_result(result, now);
            dirty = true;
        }
        dirty
    }

    fn drain_stream(&mut self, now: Instant) -> bool {
        let mut dirty = false;
        while let Ok(message) = self.stream_rx.try_recv() {
            dirty = true;
            match message {
                StreamMessage::Connected => tracing::debug!("live updates connected"),
                StreamMessage::Disconnected(reason) => {
                    self.toasts
                        .warning(format!("Live updates paused: {reason}"), now);
                }
                StreamMessage::Event(event) => {
                    let kind = match event {
                        BackendEvent::ConnectionStatus { online: false } => ToastKind::Warning,
                        BackendEvent::ProgressUploadEnd | BackendEvent::CacheEnd { .. } => {
                            ToastKind::Success
                        }
                        _ => ToastKind::Info,
                    };
                    self.toasts.push(kind, event.message(), now);
                }
            }
        }
        dirty
    }

    fn note_reachable(&mut self) {
        if matches!(self.connection, ConnectionState::Offline(_)) {
            self.connection = ConnectionState::Unknown;
        }
    }

    fn apply_result(&mut self, result: JobResult, now: Instant) {
        let JobResult { token, job, outcome } = result;
        match job {
            Job::Command(command) => return self.on_command_done(command, outcome, now),
            Job::Cover(key) => {
                match outcome {
                    Ok(Payload::Image(image)) => self.covers.insert(key, image),
                    _ => self.covers.fail(key),
                }
                return;
            }
            _ => {}
        }
        if !self.stack.is_current(token) {
            tracing::debug!(?job, "dropping result for a screen that is gone");
            return;
        }
        let payload = match outcome {
            Ok(payload) => payload,
            Err(err) => return self.on_job_failed(job, err, now),
        };
        self.note_reachable();

        let Some(screen) = self.screens.last_mut() else {
            return;
        };
        match (screen, job, payload) {
            (Screen::Dashboard(dashboard), Job::Status, Payload::Status(status)) => {
                dashboard.status.complete();
                self.connection = ConnectionState::Online(status);
                dashboard
                    .grid
                    .replace_items(dashboard_tiles(&self.connection), now);
            }
            (Screen::Shelf(list), Job::Libraries, Payload::Libraries(libraries)) => {
                loaded(list, libraries, now);
            }
            (Screen::Library { list, .. }, Job::Series(_), Payload::Series(series)) => {
                loaded(list, order_series(series), now);
            }
            (Screen::Series { list, .. }, Job::Volumes(_), Payload::Volumes(volumes)) => {
                loaded(list, volumes, now);
            }
            (Screen::Viewer(viewer), Job::Page { request, .. }, Payload::Image(image)) => {
                viewer.on_page_loaded(request, image, now);
            }
            (Screen::Settings(screen), Job::ServerSettings, Payload::ServerSettings(current)) => {
                screen.fetch.complete();
                screen.error = None;
                screen.form.load(current);
            }
            (Screen::Settings(screen), _, Payload::SettingsSaved(response)) => {
                let message = screen.form.on_saved(response);
                self.toasts.success(message, now);
            }
            (Screen::Logs(screen), Job::Logs, Payload::Logs(logs)) => {
                screen.fetch.complete();
                screen.error = None;
                screen.view.set_logs(logs);
            }
            (_, job, _) => tracing::debug!(?job, "result does not match the current screen"),
        }
    }

    fn on_job_failed(&mut self, job: Job, err: ClientError, now: Instant) {
        if err.is_connectivity() {
            self.connection = ConnectionState::Offline(err.to_string());
        }
        let message = err.to_string();
        let Some(screen) = self.screens.last_mut() else {
            return;
        };
        match (screen, job) {
            (Screen::Dashboard(dashboard), Job::Status) => {
                dashboard.status.complete();
                dashboard
                    .grid
                    .replace_items(dashboard_tiles(&self.connection), now);
            }
            (Screen::Shelf(list), _) => failed(list, message),
            (Screen::Library { list, .. }, _) => failed(list, message),
            (Screen::Series { list, .. }, _) => failed(list, message),
            (Screen::Viewer(viewer), Job::Page { request, .. }) => {
                viewer.on_page_failed(request, message, now);
            }
            (Screen::Settings(screen), Job::ServerSettings) => {
                screen.fetch.complete();
                screen.error = Some(format!("Could not load settings: {message}"));
            }
            (Screen::Settings(screen), Job::SaveServerSettings(_)) => {
                screen.form.on_save_failed();
                self.toasts.error(format!("Saving failed: {message}"), now);
            }
            (Screen::Logs(screen), _) => {
                screen.fetch.complete();
                screen.error = Some(format!("Could not load logs: {message}"));
            }
            _ => {}
        }
    }

    fn on_command_done(
        &mut self,
        command: Command,
        outcome: Result<Payload, ClientError>,
        now: Instant,
    ) {
        match outcome {
            Ok(Payload::Command(status)) => {
                self.note_reachable();
                self.toasts
                    .success(format!("{}: {}", command.label(), status.status), now);
                if command.invalidates_lists()
                    && let Some(screen) = self.screens.last_mut()
                {
                    screen.refresh(now);
                }
            }
            Ok(_) => {}
            Err(err) => {
                if err.is_connectivity() {
                    self.connection = ConnectionState::Offline(err.to_string());
                }
                self.toasts
                    .error(format!("{} failed: {err}", command.label()), now);
            }
        }
    }

    /// Returns true when the app should quit.
    fn handle_input(&mut self, input: Input, now: Instant) -> bool {
        match input {
            Input::Quit => return true,
            Input::Dismiss => {
                self.toasts.dismiss_newest();
                return false;
            }
            _ => {}
        }
        let Some(screen) = self.screens.last_mut() else {
            return false;
        };
        let reaction = match screen {
            Screen::Dashboard(dashboard) => grid_input(&mut dashboard.grid, input, now),
            Screen::Shelf(list) => list_input(list, input, now, |_, _| None),
            Screen::Library { list, .. } => list_input(list, input, now, |series, input| {
                match input {
                    Input::StartCache => Some(Command::StartCache {
                        series_id: series.id,
                    }),
                    Input::StopCache => Some(Command::StopCache {
                        series_id: series.id,
                    }),
                    _ => None,
                }
            }),
            Screen::Series { list, .. } => list_input(list, input, now, |volume, input| {
                match input {
                    Input::ToggleRead => Some(Command::toggle_read(volume)),
                    Input::StartCache => Some(Command::StartCache {
                        series_id: volume.series_id,
                    }),
                    Input::StopCache => Some(Command::StopCache {
                        series_id: volume.series_id,
                    }),
                    _ => None,
                }
            }),
            Screen::Viewer(viewer) => viewer_input(viewer, input, now),
            Screen::Settings(screen) => settings_input(screen, input),
            Screen::Logs(screen) => logs_input(screen, input),
        };
        self.react(reaction, now)
    }

    fn react(&mut self, reaction: Reaction, now: Instant) -> bool {
        match reaction {
            Reaction::None => {}
            Reaction::Back => self.back(now),
            Reaction::Refresh => {
                if let Some(screen) = self.screens.last_mut() {
                    screen.refresh(now);
                }
            }
            Reaction::Activated(activation) => {
                if let Some(update) = &activation.resume {
                    self.ctx.record_resume(update);
                }
                match activation.action {
                    Action::Open(route) => self.open(route, now),
                    Action::Run(command) => self.run_command(command),
                    Action::Exit => return true,
                }
            }
            Reaction::Open(route) => self.open(route, now),
            Reaction::Run(command) => self.run_command(command),
            Reaction::Save(update) => {
                tracing::info!(ip = %update.ip, "saving media server settings");
                self.worker
                    .spawn(self.stack.token(), Job::SaveServerSettings(update));
            }
            Reaction::Toast(kind, message) => self.toasts.push(kind, message, now),
        }
        false
    }

    fn open(&mut self, route: Route, now: Instant) {
        let screen = Screen::mount(&route, &self.ctx, &self.connection, now);
        self.stack.push(route);
        self.screens.push(screen);
    }

    fn back(&mut self, now: Instant) {
        if self.stack.pop().is_none() {
            return;
        }
        self.screens.pop();
        self.stack.remount();
        if let Some(screen) = self.screens.last_mut() {
            screen.resume(now);
        }
    }

    fn run_command(&mut self, command: Command) {
        tracing::info!(?command, "running command");
        self.worker.spawn(self.stack.token(), Job::Command(command));
    }

    fn draw(&mut self, area: Rect, frame: &mut ratatui::Frame) {
        frame.render_widget(Clear, area);
        let accent = accent_color(self.ctx.settings.theme);
        let now = Instant::now();

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(0),
                Constraint::Length(2),
            ])
            .split(area);

        let header = Paragraph::new(Text::from(self.header_lines(accent)))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::BOTTOM));
        frame.render_widget(header, layout[0]);

        let body = layout[1];
        if let Some(screen) = self.screens.last_mut() {
            match screen {
                Screen::Dashboard(dashboard) => {
                    let style = GridStyle {
                        accent,
                        error: None,
                    };
                    draw::draw_grid(frame, body, &mut dashboard.grid, None, &style, now);
                }
                Screen::Shelf(list) => {
                    draw_list(frame, body, list, None, accent, now);
                }
                Screen::Library { list, .. } => {
                    let covers = CoverSource {
                        cache: &mut self.covers,
                        picker: &self.picker,
                        key: |series: &Series| CoverKey::Series(series.id),
                        wanted: &mut self.wanted_covers,
                    };
                    draw_list(frame, body, list, Some(covers), accent, now);
                }
                Screen::Series { list, .. } => {
                    let covers = CoverSource {
                        cache: &mut self.covers,
                        picker: &self.picker,
                        key: |volume: &Volume| CoverKey::Volume(volume.volume_id),
                        wanted: &mut self.wanted_covers,
                    };
                    draw_list(frame, body, list, Some(covers), accent, now);
                }
                Screen::Viewer(viewer) => {
                    draw::draw_viewer(frame, body, viewer, &self.picker, accent, now);
                }
                Screen::Settings(screen) => draw::draw_settings(frame, body, screen, accent),
                Screen::Logs(screen) => draw::draw_logs(frame, body, screen, accent),
            }
        }

        let footer = Paragraph::new(Text::from(self.footer_line()))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::TOP));
        frame.render_widget(footer, layout[2]);

        draw::draw_toasts(frame, area, &self.toasts);
    }

    fn header_lines(&self, accent: Color) -> Vec<Line<'static>> {
        let title = Line::from(vec![
            Span::styled(
                "shelfdeck",
                Style::default().fg(accent).add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!("  {}", self.stack.breadcrumbs())),
        ]);
        let status = match &self.connection {
            ConnectionState::Offline(err) => Line::styled(
                format!("Backend unreachable: {err} (retrying)"),
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ),
            ConnectionState::Online(_) if self.connection.is_online() => Line::styled(
                self.connection.label(),
                Style::default().fg(Color::Green),
            ),
            ConnectionState::Online(_) => Line::styled(
                self.connection.label(),
                Style::default().fg(Color::Yellow),
            ),
            ConnectionState::Unknown => Line::styled(
                self.connection.label(),
                Style::default().fg(Color::DarkGray),
            ),
        };
        vec![title, status]
    }

    fn footer_line(&self) -> Line<'static> {
        let Some(screen) = self.screens.last() else {
            return Line::raw("");
        };
        match screen {
            Screen::Dashboard(_) => key_hints(&[
                ("←/→", "move"),
                ("Enter", "open"),
                ("r", "refresh"),
                ("d", "dismiss"),
                ("q", "quit"),
            ]),
            Screen::Shelf(_) => key_hints(&[
                ("arrows", "move"),
                ("Enter", "open"),
                ("r", "refresh"),
                ("Esc", "back"),
                ("q", "quit"),
            ]),
            Screen::Library { .. } => key_hints(&[
                ("arrows", "move"),
                ("Enter", "open"),
                ("x", "cache"),
                ("z", "stop cache"),
                ("r", "refresh"),
                ("Esc", "back"),
            ]),
            Screen::Series { .. } => key_hints(&[
                ("arrows", "move"),
                ("Enter", "read"),
                ("y", "read/unread"),
                ("x", "cache"),
                ("z", "stop cache"),
                ("Esc", "back"),
            ]),
            Screen::Viewer(_) => key_hints(&[
                ("↑/↓", "scroll"),
                ("PgUp/PgDn", "page"),
                ("e", "earlier pages"),
                ("r", "retry"),
                ("Esc", "back"),
            ]),
            Screen::Settings(_) => key_hints(&[
                ("Tab", "next field"),
                ("Enter", "save / select"),
                ("Esc", "back"),
            ]),
            Screen::Logs(logs) if logs.editing_filter => {
                key_hints(&[("type", "filter"), ("Enter/Esc", "done")])
            }
            Screen::Logs(_) => key_hints(&[
                ("/", "filter"),
                ("a", "auto-refresh"),
                ("↑/↓", "scroll"),
                ("r", "refresh"),
                ("Esc", "back"),
            ]),
        }
    }
}

fn loaded<T: Tile>(list: &mut ListScreen<T>, items: Vec<T>, now: Instant) {
    list.fetch.complete();
    list.error = None;
    list.grid.replace_items(items, now);
}

fn failed<T>(list: &mut ListScreen<T>, message: String) {
    list.fetch.complete();
    list.error = Some(message);
}

fn draw_list<T: Tile>(
    frame: &mut ratatui::Frame,
    area: Rect,
    list: &mut ListScreen<T>,
    covers: Option<CoverSource<'_, T>>,
    accent: Color,
    now: Instant,
) {
    let mut title = format!("{} items", list.grid.items().len());
    if let Some(err) = &list.error
        && list.grid.is_loaded()
    {
        title.push_str(&format!(" · refresh failed: {err}"));
    }
    let block = Block::default()
        .borders(Borders::NONE)
        .title(Span::styled(title, Style::default().fg(Color::DarkGray)));
    let inner = block.inner(area);
    frame.render_widget(block, area);
    let style = GridStyle {
        accent,
        error: list.error.clone(),
    };
    draw::draw_grid(frame, inner, &mut list.grid, covers, &style, now);
}

fn grid_input<T: Tile>(grid: &mut GridScreen<T>, input: Input, now: Instant) -> Reaction {
    match input {
        Input::Move(direction) => {
            grid.move_focus(direction, now);
            Reaction::None
        }
        Input::Activate => grid
            .activate()
            .map_or(Reaction::None, Reaction::Activated),
        Input::Back => Reaction::Back,
        Input::Refresh => Reaction::Refresh,
        _ => Reaction::None,
    }
}

fn list_input<T: Tile>(
    list: &mut ListScreen<T>,
    input: Input,
    now: Instant,
    command: impl Fn(&T, Input) -> Option<Command>,
) -> Reaction {
    if matches!(
        input,
        Input::ToggleRead | Input::StartCache | Input::StopCache
    ) {
        return list
            .grid
            .focused_item()
            .and_then(|item| command(item, input))
            .map_or(Reaction::None, Reaction::Run);
    }
    grid_input(&mut list.grid, input, now)
}

fn viewer_input(viewer: &mut ViewerScreen, input: Input, now: Instant) -> Reaction {
    match input {
        Input::Move(Move::Up) => viewer.scroll_up(now),
        Input::Move(Move::Down) => viewer.scroll_down(now),
        Input::Move(Move::Left) | Input::PageUp => viewer.page_up(now),
        Input::Move(Move::Right) | Input::PageDown | Input::Activate => viewer.page_down(now),
        Input::LoadEarlier => {
            if viewer.load_earlier(now) == 0 {
                return Reaction::Toast(ToastKind::Info, "Already at the first page".to_string());
            }
        }
        Input::Refresh => {
            viewer.retry_failed(now);
        }
        Input::Back => return Reaction::Back,
        _ => {}
    }
    Reaction::None
}

fn settings_input(screen: &mut SettingsScreen, input: Input) -> Reaction {
    if input == Input::Refresh && !screen.form.focus().is_text() {
        return Reaction::Refresh;
    }
    match screen.form.handle(input) {
        FormAction::None => Reaction::None,
        FormAction::Submit(update) => Reaction::Save(update),
        FormAction::Invalid(err) => Reaction::Toast(ToastKind::Error, err.to_string()),
        FormAction::Back => Reaction::Back,
        FormAction::OpenLogs => Reaction::Open(Route::Logs),
    }
}

fn logs_input(screen: &mut LogsScreen, input: Input) -> Reaction {
    if screen.editing_filter {
        match input {
            Input::Char(c) => screen.view.push_filter(c),
            Input::Erase => screen.view.pop_filter(),
            Input::Activate | Input::Back => screen.editing_filter = false,
            _ => {}
        }
        return Reaction::None;
    }
    match input {
        Input::Char('/') => screen.editing_filter = true,
        Input::ToggleAutoRefresh => {
            let message = if screen.view.toggle_auto_refresh() {
                "Log auto-refresh on"
            } else {
                "Log auto-refresh off"
            };
            return Reaction::Toast(ToastKind::Info, message.to_string());
        }
        Input::Move(Move::Up) => screen.view.scroll_up(1),
        Input::Move(Move::Down) => screen.view.scroll_down(1),
        Input::PageUp => screen.view.scroll_up(LOG_PAGE),
        Input::PageDown => screen.view.scroll_down(LOG_PAGE),
        Input::Refresh => return Reaction::Refresh,
        Input::Back => return Reaction::Back,
        _ => {}
    }
    Reaction::None
}

/// Maps a key press to an [`Input`]. In text entry, letters are typed rather than used as shortcuts.
fn map_key(key: KeyEvent, text_entry: bool) -> Option<Input> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(Input::Quit);
    }
    let input = match key.code {
        KeyCode::Up => Input::Move(Move::Up),
        KeyCode::Down => Input::Move(Move::Down),
        KeyCode::Left => Input::Move(Move::Left),
        KeyCode::Right => Input::Move(Move::Right),
        KeyCode::Enter => Input::Activate,
        KeyCode::Esc => Input::Back,
        KeyCode::Backspace if text_entry => Input::Erase,
        KeyCode::Backspace => Input::Back,
        KeyCode::Tab => Input::NextField,
        KeyCode::BackTab => Input::PrevField,
        KeyCode::PageUp => Input::PageUp,
        KeyCode::PageDown => Input::PageDown,
        KeyCode::F(1) => Input::ToggleRead,
        KeyCode::F(2) => Input::StartCache,
        KeyCode::F(3) => Input::StopCache,
        KeyCode::Char(c) if text_entry => Input::Char(c),
        KeyCode::Char(' ') => Input::Activate,
        KeyCode::Char('k') => Input::Move(Move::Up),
        KeyCode::Char('j') => Input::Move(Move::Down),
        KeyCode::Char('h') => Input::Move(Move::Left),
        KeyCode::Char('l') => Input::Move(Move::Right),
        KeyCode::Char('y') => Input::ToggleRead,
        KeyCode::Char('x') => Input::StartCache,
        KeyCode::Char('z') => Input::StopCache,
        KeyCode::Char('r') => Input::Refresh,
        KeyCode::Char('e') => Input::LoadEarlier,
        KeyCode::Char('d') => Input::Dismiss,
        KeyCode::Char('a') => Input::ToggleAutoRefresh,
        KeyCode::Char('q') => Input::Quit,
        KeyCode::Char('/') => Input::Char('/'),
        _ => return None,
    };
    if text_entry && !input.is_text_safe() {
        return None;
    }
    Some(input)
}

fn setup_terminal() -> anyhow::Result<Terminal<CrosstermBackend<Stdout>>> {
    terminal::enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    crossterm::execute!(stdout, EnterAlternateScreen).context("enter alt screen")?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).context("create terminal")
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> anyhow::Result<()> {
    terminal::disable_raw_mode().context("disable raw mode")?;
    crossterm::execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("leave alt screen")?;
    Ok(())
}

fn panic_to_string(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("panic: {s}")
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("panic: {s}")
    } else {
        "panic: (unknown payload)".to_string()
    }
}
