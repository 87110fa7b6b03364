#![forbid(unsafe_code)]

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Tabs};
use time::{OffsetDateTime, UtcOffset};
use tracing::{debug, info};
use unicode_width::UnicodeWidthStr as _;

use crate::api::ApiClient;
use crate::config::Config;
use crate::derive::timefmt;
use crate::poller::PollerHandle;
use crate::tui::state::{AppState, DisplayOptions, Mode, View};
use crate::tui::{self, TerminalGuard, activity_log, agent_detail, centered_rect, dashboard, kanban, theme};

#[derive(Debug, Clone)]
pub struct DashboardOptions {
    pub cfg: Config,
    pub base_url: String,
    pub local_offset: UtcOffset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    None,
    Quit,
    Refresh,
}

pub async fn run(opts: DashboardOptions) -> anyhow::Result<()> {
    let client = ApiClient::new(&opts.base_url, opts.cfg.request_timeout())?;
    info!(base_url = %client.base_url(), interval = ?opts.cfg.poll_interval(), "starting dashboard");

    let terminal = tui::init_terminal()?;
    let mut guard = TerminalGuard::new(terminal);

    let mut poller = PollerHandle::spawn(client, opts.cfg.poll_interval());
    let mut app = AppState::new(DisplayOptions {
        local_offset: opts.local_offset,
        brand: opts.cfg.ui.brand.clone(),
        emoji: opts.cfg.ui.emoji,
    });
    let tick = opts.cfg.tick_rate();

    loop {
        while let Some(ev) = poller.try_next() {
            app.apply(ev);
        }

        {
            let Some(terminal) = guard.terminal.as_mut() else {
                anyhow::bail!("terminal unavailable");
            };
            let now = OffsetDateTime::now_utc();
            terminal.draw(|f| draw(f, &app, now))?;
        }

        if event::poll(tick)?
            && let Event::Key(key) = event::read()?
            && key.kind != KeyEventKind::Release
        {
            match handle_key(key, &mut app) {
                Action::Quit => break,
                Action::Refresh => {
                    debug!("manual refresh");
                    poller.refresh_now();
                }
                Action::None => {}
            }
        }
    }

    poller.shutdown();
    info!("dashboard closed");
    Ok(())
}

pub fn handle_key(key: KeyEvent, app: &mut AppState) -> Action {
    if key.modifiers.contains(KeyModifiers::CONTROL) && matches!(key.code, KeyCode::Char('c')) {
        return Action::Quit;
    }

    if app.mode == Mode::Searching {
        match key.code {
            KeyCode::Esc | KeyCode::Enter => app.mode = Mode::Normal,
            KeyCode::Backspace => app.pop_search_char(),
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                app.push_search_char(c);
            }
            _ => {}
        }
        return Action::None;
    }

    match key.code {
        KeyCode::Char('q') => return Action::Quit,
        KeyCode::Char('r') => return Action::Refresh,
        KeyCode::Char('1') => app.show_dashboard(),
        KeyCode::Char('2') => app.show_kanban(),
        KeyCode::Char('3') => app.show_activity_log(),
        KeyCode::Tab => app.cycle_view(true),
        KeyCode::BackTab => app.cycle_view(false),
        _ => match app.view {
            View::Dashboard => dashboard_key(key, app),
            View::Kanban => kanban_key(key, app),
            View::Activity => activity_key(key, app),
            View::AgentDetail => detail_key(key, app),
        },
    }
    Action::None
}

fn dashboard_key(key: KeyEvent, app: &mut AppState) {
    match key.code {
        KeyCode::Left | KeyCode::Char('h') => app.move_tile_selection(-1, 0),
        KeyCode::Right | KeyCode::Char('l') => app.move_tile_selection(1, 0),
        KeyCode::Up | KeyCode::Char('k') => app.move_tile_selection(0, -1),
        KeyCode::Down | KeyCode::Char('j') => app.move_tile_selection(0, 1),
        KeyCode::Enter => {
            app.open_selected_agent();
        }
        _ => {}
    }
}

fn kanban_key(key: KeyEvent, app: &mut AppState) {
    match key.code {
        KeyCode::Left | KeyCode::Char('h') => app.focus_column(-1),
        KeyCode::Right | KeyCode::Char('l') => app.focus_column(1),
        KeyCode::Up | KeyCode::Char('k') => app.scroll_column(-1),
        KeyCode::Down | KeyCode::Char('j') => app.scroll_column(1),
        KeyCode::PageUp => app.scroll_column(-10),
        KeyCode::PageDown => app.scroll_column(10),
        _ => {}
    }
}

fn activity_key(key: KeyEvent, app: &mut AppState) {
    match key.code {
        KeyCode::Char('/') => app.mode = Mode::Searching,
        KeyCode::Char('a') => app.cycle_agent_filter(),
        KeyCode::Char('c') => app.clear_activity_filters(),
        KeyCode::Up | KeyCode::Char('k') => app.scroll_activity(-1),
        KeyCode::Down | KeyCode::Char('j') => app.scroll_activity(1),
        KeyCode::PageUp => app.scroll_activity(-10),
        KeyCode::PageDown => app.scroll_activity(10),
        _ => {}
    }
}

fn detail_key(key: KeyEvent, app: &mut AppState) {
    match key.code {
        KeyCode::Esc | KeyCode::Backspace | KeyCode::Char('b') => app.show_dashboard(),
        KeyCode::Up | KeyCode::Char('k') => app.scroll_detail(-1),
        KeyCode::Down | KeyCode::Char('j') => app.scroll_detail(1),
        _ => {}
    }
}

/// Draws one full frame.
pub fn draw(f: &mut Frame<'_>, app: &AppState, now: OffsetDateTime) {
    let area = f.area();

    if app.loading {
        draw_loading(f, area);
        return;
    }

    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(area);

    draw_header(f, root[0], app, now);
    draw_nav(f, root[1], app);
    match app.view {
        View::Dashboard => dashboard::draw(f, root[2], app, now),
        View::Kanban => kanban::draw(f, root[2], app, now),
        View::Activity => activity_log::draw(f, root[2], app),
        View::AgentDetail => agent_detail::draw(f, root[2], app, now),
    }
    draw_footer(f, root[3], app);
}

fn draw_loading(f: &mut Frame<'_>, area: Rect) {
    let popup = centered_rect(60, 20, area);
    let p = Paragraph::new(vec![
        Line::from(Span::styled("⟳", theme::TITLE_STYLE)),
        Line::from(Span::styled(
            "Loading Mission Base...",
            Style::default().fg(Color::Gray),
        )),
    ])
    .alignment(Alignment::Center);
    f.render_widget(p, popup);
}

fn draw_header(f: &mut Frame<'_>, area: Rect, app: &AppState, now: OffsetDateTime) {
    let mut right = Vec::new();
    if let Some(err) = &app.error {
        right.push(Span::styled(
            format!("Error: {err}"),
            Style::default().fg(theme::ERROR).add_modifier(Modifier::BOLD),
        ));
        right.push(Span::raw("  "));
    }
    right.push(Span::styled(
        format!(
            "Last updated: {}",
            timefmt::time_since_update(app.last_updated, now)
        ),
        theme::MUTED_STYLE,
    ));
    right.push(Span::raw("  "));
    right.push(Span::styled(
        app.display.brand.as_str(),
        Style::default().fg(theme::ACCENT),
    ));

    let right_width: usize = right.iter().map(|s| s.content.width()).sum();
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(16),
            Constraint::Length(u16::try_from(right_width).unwrap_or(u16::MAX)),
        ])
        .split(area);

    let glyph = if app.display.emoji { "🚀 " } else { "" };
    f.render_widget(
        Paragraph::new(Span::styled(format!("{glyph}Mission Base"), theme::TITLE_STYLE)),
        chunks[0],
    );
    f.render_widget(
        Paragraph::new(Line::from(right)).alignment(Alignment::Right),
        chunks[1],
    );
}

fn draw_nav(f: &mut Frame<'_>, area: Rect, app: &AppState) {
    let titles: Vec<Line> = View::TOP_LEVEL
        .iter()
        .enumerate()
        .map(|(i, v)| Line::from(format!("{} [{}]", v.title(), i + 1)))
        .collect();

    let tabs = Tabs::new(titles)
        .select(app.view.nav_index())
        .style(Style::default().fg(Color::Gray))
        .highlight_style(
            Style::default()
                .fg(Color::Black)
                .bg(theme::ACCENT)
                .add_modifier(Modifier::BOLD),
        )
        .divider(" | ");
    f.render_widget(tabs, area);
}

fn draw_footer(f: &mut Frame<'_>, area: Rect, app: &AppState) {
    let hints = match (app.mode, app.view) {
        (Mode::Searching, _) => "type to search • Enter/Esc done • Backspace delete",
        (Mode::Normal, View::Dashboard) => {
            "q quit • 1-3 views • arrows/hjkl select agent • Enter details • r refresh"
        }
        (Mode::Normal, View::Kanban) => "q quit • 1-3 views • h/l column • j/k scroll • r refresh",
        (Mode::Normal, View::Activity) => {
            "q quit • 1-3 views • / search • a agent • c clear • j/k scroll • r refresh"
        }
        (Mode::Normal, View::AgentDetail) => "q quit • Esc back • j/k scroll • r refresh",
    };

    let p = Paragraph::new(Line::from(Span::styled(
        hints,
        Style::default().fg(Color::White).bg(Color::Blue),
    )))
    .style(Style::default().bg(Color::Blue));
    f.render_widget(p, area);
}
