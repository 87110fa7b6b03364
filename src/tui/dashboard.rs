#![forbid(unsafe_code)]

use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use time::OffsetDateTime;

use crate::derive::{self, AgentTile, RECENT_ACTIVITY_LIMIT, TaskStats, timefmt};
use crate::model::TaskStatus;
use crate::tui::state::{AppState, GRID_COLUMNS};
use crate::tui::theme;

const TILE_HEIGHT: u16 = 6;

pub fn draw(f: &mut Frame<'_>, area: Rect, app: &AppState, now: OffsetDateTime) {
    let snapshot = &app.snapshot;
    let tiles = derive::agent_tiles(&snapshot.agents, &snapshot.tasks, &snapshot.activity, now);
    let grid_rows = u16::try_from(tiles.len().div_ceil(GRID_COLUMNS).max(1)).unwrap_or(3);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Length(grid_rows * TILE_HEIGHT + 2),
            Constraint::Min(3),
        ])
        .split(area);

    draw_stats(f, chunks[0], &TaskStats::tally(&snapshot.tasks));
    draw_agent_grid(f, chunks[1], app, &tiles);
    draw_recent_activity(f, chunks[2], app);
}

/// Row of labelled number cards.
pub fn draw_stat_cards(f: &mut Frame<'_>, area: Rect, cards: &[(&str, usize, Color)]) {
    let constraints: Vec<Constraint> = cards
        .iter()
        .map(|_| Constraint::Ratio(1, u32::try_from(cards.len()).unwrap_or(1)))
        .collect();
    let cells = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(constraints)
        .split(area);

    for ((label, value, color), cell) in cards.iter().zip(cells.iter()) {
        let lines = vec![
            Line::from(Span::styled(
                value.to_string(),
                Style::default().fg(*color).add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(*label, theme::MUTED_STYLE)),
        ];
        let p = Paragraph::new(lines)
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL));
        f.render_widget(p, *cell);
    }
}

fn draw_stats(f: &mut Frame<'_>, area: Rect, stats: &TaskStats) {
    draw_stat_cards(f, area, &stat_cards(stats, "In Review"));
}

/// The six task tallies as cards; `review_label` differs between views.
pub fn stat_cards<'a>(stats: &TaskStats, review_label: &'a str) -> [(&'a str, usize, Color); 6] {
    [
        ("Total Tasks", stats.total, Color::White),
        ("Completed", stats.completed, theme::status_color(&TaskStatus::Done)),
        ("In Progress", stats.in_progress, theme::status_color(&TaskStatus::InProgress)),
        (review_label, stats.review, theme::status_color(&TaskStatus::Review)),
        ("Assigned", stats.assigned, theme::status_color(&TaskStatus::Assigned)),
        ("Backlog", stats.backlog, theme::status_color(&TaskStatus::Backlog)),
    ]
}

fn draw_agent_grid(f: &mut Frame<'_>, area: Rect, app: &AppState, tiles: &[AgentTile<'_>]) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(" Agent Status ", theme::TITLE_STYLE));
    let inner = block.inner(area);
    f.render_widget(block, area);

    if tiles.is_empty() {
        let p = Paragraph::new("No agents").style(theme::MUTED_STYLE);
        f.render_widget(p, inner);
        return;
    }

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            tiles
                .chunks(GRID_COLUMNS)
                .map(|_| Constraint::Length(TILE_HEIGHT))
                .collect::<Vec<_>>(),
        )
        .split(inner);

    for (row_idx, (row_tiles, row_area)) in tiles.chunks(GRID_COLUMNS).zip(rows.iter()).enumerate() {
        let cells = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Ratio(1, 3); GRID_COLUMNS])
            .split(*row_area);
        for (col_idx, (tile, cell)) in row_tiles.iter().zip(cells.iter()).enumerate() {
            let selected = row_idx * GRID_COLUMNS + col_idx == app.selected_tile;
            draw_tile(f, *cell, app, tile, selected);
        }
    }
}

fn draw_tile(f: &mut Frame<'_>, area: Rect, app: &AppState, tile: &AgentTile<'_>, selected: bool) {
    let status_color = theme::agent_status_color(tile.status);
    let border_style = if selected {
        theme::SELECTED_BORDER
    } else {
        Style::default().fg(status_color)
    };
    let block = Block::default().borders(Borders::ALL).border_style(border_style);

    let mut lines = vec![
        Line::from(vec![
            Span::raw(format!("{} ", app.display.glyph(&tile.agent.emoji))),
            Span::styled(
                tile.agent.name.as_str(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(Span::styled(tile.agent.role.as_str(), theme::MUTED_STYLE)),
        Line::from(vec![
            theme::badge(tile.status.as_str(), status_color),
            Span::raw(format!("  {} tasks", tile.open_tasks)),
        ]),
    ];
    if let Some(last) = &tile.last_activity {
        lines.push(Line::from(Span::styled(
            format!("Last: {last}"),
            theme::MUTED_STYLE,
        )));
    }
    let p = Paragraph::new(lines).block(block);
    f.render_widget(p, area);
}

fn draw_recent_activity(f: &mut Frame<'_>, area: Rect, app: &AppState) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(" Recent Activity ", theme::TITLE_STYLE));

    let activity = &app.snapshot.activity;
    if activity.is_empty() {
        let p = Paragraph::new("No recent activity")
            .style(theme::MUTED_STYLE)
            .alignment(Alignment::Center)
            .block(block);
        f.render_widget(p, area);
        return;
    }

    let mut lines = Vec::new();
    for item in activity.iter().take(RECENT_ACTIVITY_LIMIT) {
        lines.push(Line::from(vec![
            Span::styled(
                item.agent.as_str(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw(" "),
            theme::badge(item.kind.as_str(), theme::activity_type_color(&item.kind)),
            Span::raw(" "),
            Span::styled(
                timefmt::format_stamp_full(&item.timestamp, app.display.local_offset),
                theme::MUTED_STYLE,
            ),
        ]));
        lines.push(Line::from(format!("  {}", item.text)));
    }
    let p = Paragraph::new(lines).wrap(Wrap { trim: false }).block(block);
    f.render_widget(p, area);
}
