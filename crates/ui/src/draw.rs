use std::time::Instant;

use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui_image::Image as ImageWidget;
use ratatui_image::picker::Picker;
use shelfdeck_application::{
    FormField, GridScreen, LogView, PageState, Tile, Toast, ToastKind, Toasts,
};
use shelfdeck_core::{LogLevel, Theme};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::covers::CoverCache;
use crate::screen::{LogsScreen, SettingsScreen};
use crate::viewer::ViewerScreen;
use crate::worker::CoverKey;

const TEXT_TILE_HEIGHT: u16 = 5;
const COVER_TILE_HEIGHT: u16 = 14;
const TOAST_WIDTH: u16 = 44;

pub(crate) fn accent_color(theme: Theme) -> Color {
    match theme {
        Theme::Light => Color::Blue,
        Theme::Dark => Color::Yellow,
    }
}

fn bold(text: impl Into<String>) -> Span<'static> {
    Span::styled(text.into(), Style::default().add_modifier(Modifier::BOLD))
}

/// Footer line of `key action` pairs.
pub(crate) fn key_hints(hints: &[(&str, &str)]) -> Line<'static> {
    let mut spans = Vec::with_capacity(hints.len() * 2);
    for (i, (key, action)) in hints.iter().enumerate() {
        spans.push(bold(*key));
        let sep = if i + 1 < hints.len() { "  " } else { "" };
        spans.push(Span::raw(format!(" {action}{sep}")));
    }
    Line::from(spans)
}

pub(crate) fn truncate(text: &str, width: usize) -> String {
    if UnicodeWidthStr::width(text) <= width {
        return text.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = UnicodeWidthChar::width(c).unwrap_or(0);
        if used + w + 1 > width {
            break;
        }
        used += w;
        out.push(c);
    }
    out.push('…');
    out
}

pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

fn placeholder(frame: &mut Frame, area: Rect, message: &str, style: Style) {
    let paragraph = Paragraph::new(Text::from(Line::styled(message.to_string(), style)))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    let row = Rect::new(area.x, area.y + area.height / 2, area.width, area.height.min(2));
    frame.render_widget(paragraph, row.intersection(area));
}

/// Where tile covers come from, and where missing ones are queued for fetching.
pub(crate) struct CoverSource<'a, T> {
    pub cache: &'a mut CoverCache,
    pub picker: &'a Picker,
    pub key: fn(&T) -> CoverKey,
    pub wanted: &'a mut Vec<CoverKey>,
}

pub(crate) struct GridStyle {
    pub accent: Color,
    pub error: Option<String>,
}

pub(crate) fn draw_grid<T: Tile>(
    frame: &mut Frame,
    area: Rect,
    grid: &mut GridScreen<T>,
    mut covers: Option<CoverSource<'_, T>>,
    style: &GridStyle,
    now: Instant,
) {
    if !grid.is_loaded() {
        let message = match &style.error {
            Some(err) => format!("Could not load: {err}  (r to retry)"),
            None => "Loading...".to_string(),
        };
        placeholder(frame, area, &message, Style::default().fg(Color::DarkGray));
        return;
    }
    if grid.items().is_empty() {
        placeholder(frame, area, "Nothing here yet", Style::default().fg(Color::DarkGray));
        return;
    }

    let columns = grid.nav().columns().max(1);
    let tile_h = if covers.is_some() {
        COVER_TILE_HEIGHT
    } else {
        TEXT_TILE_HEIGHT
    };
    let tile_w = area.width / columns as u16;
    let visible_rows = usize::from((area.height / tile_h).max(1));
    grid.set_visible_rows(visible_rows, now);

    let first_row = grid.scroll_offset();
    let focused = grid.focused_index();
    for row in 0..visible_rows {
        for col in 0..columns {
            let index = (first_row + row) * columns + col;
            let Some(item) = grid.items().get(index) else {
                break;
            };
            let rect = Rect::new(
                area.x + col as u16 * tile_w,
                area.y + row as u16 * tile_h,
                tile_w,
                tile_h,
            )
            .intersection(area);
            draw_tile(frame, rect, item, focused == Some(index), covers.as_mut(), style.accent);
        }
    }
}

fn draw_tile<T: Tile>(
    frame: &mut Frame,
    rect: Rect,
    item: &T,
    focused: bool,
    cover: Option<&mut CoverSource<'_, T>>,
    accent: Color,
) {
    let complete = item.is_complete();
    let style = if focused {
        Style::default().fg(accent).add_modifier(Modifier::BOLD)
    } else if complete {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default()
    };
    let title = truncate(item.title(), usize::from(rect.width.saturating_sub(4)));
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(style)
        .title(Span::styled(title, style));
    let inner = block.inner(rect);
    frame.render_widget(block, rect);
    if inner.height == 0 {
        return;
    }

    let mut detail = item.detail().unwrap_or_default();
    if complete {
        detail.push_str(" ✓");
    }
    let detail_area = Rect::new(inner.x, inner.bottom() - 1, inner.width, 1);
    let detail_line = Paragraph::new(Line::styled(
        truncate(detail.trim(), usize::from(inner.width)),
        style,
    ))
    .alignment(Alignment::Center);
    frame.render_widget(detail_line, detail_area);

    let Some(source) = cover else {
        return;
    };
    let image_area = Rect::new(inner.x, inner.y, inner.width, inner.height.saturating_sub(1));
    if image_area.height == 0 {
        return;
    }
    let key = (source.key)(item);
    if let Some(protocol) = source.cache.protocol(key, image_area, source.picker) {
        frame.render_widget(ImageWidget::new(protocol), image_area);
    } else if source.cache.claim(key) {
        source.wanted.push(key);
    }
}

pub(crate) fn draw_viewer(
    frame: &mut Frame,
    area: Rect,
    viewer: &mut ViewerScreen,
    picker: &Picker,
    accent: Color,
    now: Instant,
) {
    let pager = &viewer.pager;
    let status = if pager.is_complete() {
        " · complete"
    } else if pager.reached_end() {
        " · end of volume"
    } else {
        ""
    };
    let title = format!(
        "{} · page {}/{}{status}",
        viewer.volume.title,
        pager.current() + 1,
        pager.pages()
    );
    let block = Block::default().borders(Borders::ALL).title(Span::styled(
        title,
        Style::default().fg(accent).add_modifier(Modifier::BOLD),
    ));
    let inner = block.inner(area);
    frame.render_widget(block, area);
    if viewer.pager.pages() == 0 {
        placeholder(frame, inner, "This volume has no pages", Style::default());
        return;
    }
    viewer.set_viewport(inner.height, now);

    if let Some(protocol) = viewer.protocol(inner, picker) {
        frame.render_widget(ImageWidget::new(protocol), inner);
    }

    for (page, from, rows) in viewer.visible_slots() {
        let (message, style) = match viewer.state(page) {
            Some(PageState::Loading { .. }) => (
                format!("Loading page {}...", page + 1),
                Style::default().fg(Color::DarkGray),
            ),
            Some(PageState::Waiting { error, .. }) => (
                format!("Page {} failed ({error}), retrying...", page + 1),
                Style::default().fg(Color::Yellow),
            ),
            Some(PageState::Failed { error }) => (
                format!("Page {} could not be loaded: {error}   r retry · Esc back", page + 1),
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ),
            Some(PageState::Loaded) | None => continue,
        };
        let slot = Rect::new(inner.x, inner.y + from, inner.width, rows);
        frame.render_widget(Clear, slot);
        placeholder(frame, slot, &message, style);
    }
}

pub(crate) fn draw_settings(frame: &mut Frame, area: Rect, screen: &SettingsScreen, accent: Color) {
    let popup = centered_rect(60, 60, area);
    frame.render_widget(Clear, popup);
    let block = Block::default()
        .borders(Borders::ALL)
        .title(bold("Media server"));
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    let form = &screen.form;
    let focus = form.focus();
    let field_style = |field: FormField| {
        if field == focus {
            Style::default().fg(accent).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        }
    };
    let cursor = |field: FormField| if field == focus { "▏" } else { "" };
    let password = form.masked_password();

    let mut lines = vec![
        Line::from(vec![
            Span::styled("Address   ", field_style(FormField::Address)),
            Span::raw(format!("{}{}", form.address, cursor(FormField::Address))),
        ]),
        Line::from(vec![
            Span::styled("Username  ", field_style(FormField::Username)),
            Span::raw(format!("{}{}", form.username, cursor(FormField::Username))),
        ]),
        Line::from(vec![
            Span::styled("Password  ", field_style(FormField::Password)),
            Span::raw(format!("{password}{}", cursor(FormField::Password))),
        ]),
        Line::raw(""),
        Line::from(vec![
            Span::styled("[ Save ]", field_style(FormField::Save)),
            Span::raw("  "),
            Span::styled("[ Back ]", field_style(FormField::Back)),
            Span::raw("  "),
            Span::styled("[ Logs ]", field_style(FormField::Logs)),
        ]),
        Line::raw(""),
    ];
    if !form.is_loaded() {
        lines.push(Line::styled(
            "Loading current settings...",
            Style::default().fg(Color::DarkGray),
        ));
    }
    if form.is_saving() {
        lines.push(Line::styled("Saving...", Style::default().fg(Color::DarkGray)));
    }
    if let Some(err) = &screen.error {
        lines.push(Line::styled(err.clone(), Style::default().fg(Color::Red)));
    }
    lines.push(Line::styled(
        "Leave the password blank to keep the current one.",
        Style::default().fg(Color::DarkGray),
    ));
    frame.render_widget(Paragraph::new(Text::from(lines)).wrap(Wrap { trim: false }), inner);
}

fn level_style(level: LogLevel) -> Style {
    match level {
        LogLevel::Error => Style::default().fg(Color::Red),
        LogLevel::Warning => Style::default().fg(Color::Yellow),
        LogLevel::Info => Style::default(),
        LogLevel::Debug | LogLevel::Other => Style::default().fg(Color::DarkGray),
    }
}

pub(crate) fn draw_logs(frame: &mut Frame, area: Rect, screen: &LogsScreen, accent: Color) {
    let view: &LogView = &screen.view;
    let auto = if view.auto_refresh() { "auto-refresh on" } else { "auto-refresh off" };
    let filter = if screen.editing_filter {
        format!("filter: {}▏", view.filter())
    } else if view.filter().is_empty() {
        "no filter".to_string()
    } else {
        format!("filter: {}", view.filter())
    };
    let title = format!("{} · {auto} · {filter}", view.summary());
    let block = Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(title, Style::default().fg(accent)));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if let Some(err) = &screen.error {
        placeholder(frame, inner, err, Style::default().fg(Color::Red));
        return;
    }
    if !view.is_loaded() {
        placeholder(frame, inner, "Loading...", Style::default().fg(Color::DarkGray));
        return;
    }
    let lines = view
        .window(usize::from(inner.height))
        .into_iter()
        .map(|(level, line)| Line::styled(line.to_string(), level_style(level)))
        .collect::<Vec<_>>();
    frame.render_widget(Paragraph::new(Text::from(lines)), inner);
}

fn toast_style(toast: &Toast) -> (Style, &'static str) {
    match toast.kind {
        ToastKind::Success => (Style::default().fg(Color::Green), "ok"),
        ToastKind::Error => (Style::default().fg(Color::Red), "error"),
        ToastKind::Info => (Style::default().fg(Color::Cyan), "info"),
        ToastKind::Warning => (Style::default().fg(Color::Yellow), "warning"),
    }
}

/// Stacked in the top-right corner, newest on top.
pub(crate) fn draw_toasts(frame: &mut Frame, area: Rect, toasts: &Toasts) {
    let width = TOAST_WIDTH.min(area.width);
    let mut y = area.y + 1;
    for toast in toasts.iter() {
        if y + 3 > area.bottom() {
            break;
        }
        let rect = Rect::new(area.right().saturating_sub(width + 1), y, width, 3);
        let (style, label) = toast_style(toast);
        let message = truncate(&toast.message, usize::from(width.saturating_sub(2)));
        frame.render_widget(Clear, rect);
        frame.render_widget(
            Paragraph::new(Line::raw(message)).block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(style)
                    .title(Span::styled(label, style.add_modifier(Modifier::BOLD))),
            ),
            rect,
        );
        y += 3;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_respects_display_width() {
        assert_eq!(truncate("One Piece", 20), "One Piece");
        assert_eq!(truncate("One Piece", 5), "One …");
        assert_eq!(truncate("進撃の巨人", 5), "進撃…");
    }

    #[test]
    fn key_hints_alternate_bold_keys_and_actions() {
        let line = key_hints(&[("Esc", "back"), ("r", "refresh")]);
        let text = line
            .spans
            .iter()
            .map(|span| span.content.as_ref())
            .collect::<String>();
        assert_eq!(text, "Esc back  r refresh");
        assert!(line.spans[0].style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn centered_rect_stays_inside() {
        let outer = Rect::new(0, 0, 100, 40);
        let inner = centered_rect(60, 50, outer);
        assert_eq!(inner.width, 60);
        assert_eq!(inner.height, 20);
        assert_eq!(outer.intersection(inner), inner);
    }
}
