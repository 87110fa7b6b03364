#![forbid(unsafe_code)]

use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use unicode_width::UnicodeWidthStr as _;

use crate::derive::timefmt;
use crate::tui::state::{AppState, Mode};
use crate::tui::{scroll_offset, theme};

const STAMP_WIDTH: usize = 16;

pub fn draw(f: &mut Frame<'_>, area: Rect, app: &AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(area);

    let total = app.snapshot.activity.len();
    let filtered = app.filtered_activity();

    draw_header(f, chunks[0], filtered.len(), total);
    draw_filters(f, chunks[1], app);

    if filtered.is_empty() {
        let hint = if app.activity_log.filter.is_active() {
            "Try adjusting your search criteria"
        } else {
            "No activity data available"
        };
        let p = Paragraph::new(vec![
            Line::from(""),
            Line::from("🔍"),
            Line::from(Span::styled("No activities found", Style::default().fg(Color::Gray))),
            Line::from(Span::styled(hint, theme::MUTED_STYLE)),
        ])
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
        f.render_widget(p, chunks[2]);
        return;
    }

    let offset = app.display.local_offset;
    let mut lines = Vec::new();
    for item in &filtered {
        let stamp = timefmt::format_stamp_short(&item.timestamp, offset);
        let pad = STAMP_WIDTH.saturating_sub(stamp.width());
        lines.push(Line::from(vec![
            Span::styled(format!("{stamp}{}", " ".repeat(pad)), theme::MUTED_STYLE),
            Span::raw(" "),
            Span::styled(
                item.agent.as_str(),
                Style::default().fg(theme::ACCENT).add_modifier(Modifier::BOLD),
            ),
            Span::raw(" "),
            theme::badge(item.kind.as_str(), theme::activity_type_color(&item.kind)),
        ]));
        lines.push(Line::from(format!("{}{}", " ".repeat(STAMP_WIDTH + 1), item.text)));
        lines.push(Line::from(""));
    }
    let p = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .scroll(scroll_offset(app.activity_log.scroll))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(p, chunks[2]);

    if filtered.len() == total {
        let p = Paragraph::new(Span::styled(
            format!("Showing all {total} activities"),
            theme::MUTED_STYLE,
        ))
        .alignment(Alignment::Center);
        f.render_widget(p, chunks[3]);
    }
}

fn draw_header(f: &mut Frame<'_>, area: Rect, shown: usize, total: usize) {
    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);
    f.render_widget(
        Paragraph::new(Span::styled("Activity Log", theme::TITLE_STYLE)),
        halves[0],
    );
    f.render_widget(
        Paragraph::new(Span::styled(
            format!("{shown} of {total} activities"),
            theme::MUTED_STYLE,
        ))
        .alignment(Alignment::Right),
        halves[1],
    );
}

fn draw_filters(f: &mut Frame<'_>, area: Rect, app: &AppState) {
    let filter = &app.activity_log.filter;
    let searching = app.mode == Mode::Searching;

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(if searching {
            theme::SELECTED_BORDER
        } else {
            Style::default()
        });
    let inner = block.inner(area);

    let search = if filter.search.is_empty() && !searching {
        Span::styled("Search activities... (/)", theme::MUTED_STYLE)
    } else {
        Span::raw(filter.search.as_str())
    };
    let mut spans = vec![Span::raw("Search: "), search];
    spans.push(Span::raw("   Agent: "));
    spans.push(Span::styled(
        filter.agent.as_deref().unwrap_or("All Agents"),
        Style::default().add_modifier(Modifier::BOLD),
    ));
    spans.push(Span::styled(" (a)", theme::MUTED_STYLE));
    if filter.is_active() {
        spans.push(Span::raw("   "));
        spans.push(theme::badge("Clear (c)", Color::Gray));
    }

    f.render_widget(Paragraph::new(Line::from(spans)).block(block), area);

    if searching {
        let x = inner.x
            + u16::try_from("Search: ".len() + filter.search.width()).unwrap_or(0);
        f.set_cursor_position(Position::new(x.min(inner.right().saturating_sub(1)), inner.y));
    }
}
