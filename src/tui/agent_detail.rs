#![forbid(unsafe_code)]

use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use time::OffsetDateTime;

use crate::derive::{self, AgentSummary, timefmt};
use crate::model::{ActivityItem, Agent, Task};
use crate::tui::dashboard::{draw_stat_cards, stat_cards};
use crate::tui::state::AppState;
use crate::tui::{scroll_offset, theme};

/// Renders nothing when no agent is selected.
pub fn draw(f: &mut Frame<'_>, area: Rect, app: &AppState, now: OffsetDateTime) {
    let Some(agent) = &app.selected_agent else {
        return;
    };
    let summary = derive::agent_summary(agent, &app.snapshot.tasks, &app.snapshot.activity);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(5),
            Constraint::Length(4),
            Constraint::Min(3),
        ])
        .split(area);

    f.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled("← Back to Dashboard (Esc)", theme::MUTED_STYLE),
            Span::raw("   "),
            Span::styled("Agent Details", theme::TITLE_STYLE),
        ])),
        chunks[0],
    );
    draw_agent_card(f, chunks[1], app, agent);
    draw_stat_cards(f, chunks[2], &stat_cards(&summary.stats, "Review"));

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[3]);
    draw_tasks(f, columns[0], app, &summary, now);
    draw_activity(f, columns[1], app, &summary.recent_activity);
}

fn draw_agent_card(f: &mut Frame<'_>, area: Rect, app: &AppState, agent: &Agent) {
    let lines = vec![
        Line::from(vec![
            Span::raw(format!("{} ", app.display.glyph(&agent.emoji))),
            Span::styled(
                agent.name.as_str(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(Span::styled(agent.role.as_str(), theme::MUTED_STYLE)),
        Line::from(Span::styled(
            format!("ID: {}", agent.id),
            Style::default().fg(theme::ACCENT),
        )),
    ];
    f.render_widget(
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL)),
        area,
    );
}

fn draw_tasks(f: &mut Frame<'_>, area: Rect, app: &AppState, summary: &AgentSummary<'_>, now: OffsetDateTime) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(
            format!(" Tasks ({}) ", summary.tasks.len()),
            theme::TITLE_STYLE,
        ));

    if summary.tasks.is_empty() {
        let p = Paragraph::new("No tasks assigned")
            .style(theme::MUTED_STYLE)
            .alignment(Alignment::Center)
            .block(block);
        f.render_widget(p, area);
        return;
    }

    let mut lines = Vec::new();
    for task in &summary.tasks {
        task_lines(&mut lines, app, task, now);
        lines.push(Line::from(""));
    }
    let p = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .scroll(scroll_offset(app.detail_scroll))
        .block(block);
    f.render_widget(p, area);
}

fn task_lines<'a>(lines: &mut Vec<Line<'a>>, app: &AppState, task: &'a Task, now: OffsetDateTime) {
    let offset = app.display.local_offset;
    lines.push(Line::from(vec![
        Span::styled(
            task.title.as_str(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        theme::badge(task.status.as_str(), theme::status_color(&task.status)),
        Span::raw(" "),
        theme::badge(task.priority_label(), theme::priority_color(task.priority.as_ref())),
    ]));
    if !task.description.is_empty() {
        lines.push(Line::from(Span::styled(
            task.description.as_str(),
            Style::default().fg(Color::Gray),
        )));
    }

    let (shown, hidden) = derive::visible_tags(&task.tags);
    if !shown.is_empty() {
        let mut tags: Vec<String> = shown.iter().map(|t| format!("[{t}]")).collect();
        if hidden > 0 {
            tags.push(format!("+{hidden}"));
        }
        lines.push(Line::from(Span::styled(tags.join(" "), theme::MUTED_STYLE)));
    }

    let mut dates = vec![Span::styled(
        format!("Created: {}", timefmt::format_date(&task.created_at, offset)),
        theme::MUTED_STYLE,
    )];
    if let Some(due) = &task.due_date {
        let style = if timefmt::is_overdue(due, now) {
            Style::default().fg(theme::ERROR)
        } else {
            theme::MUTED_STYLE
        };
        dates.push(Span::raw("  "));
        dates.push(Span::styled(
            format!("Due: {}", timefmt::format_date(due, offset)),
            style,
        ));
    }
    lines.push(Line::from(dates));
}

fn draw_activity(f: &mut Frame<'_>, area: Rect, app: &AppState, items: &[&ActivityItem]) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(
            format!(" Recent Activity ({}) ", items.len()),
            theme::TITLE_STYLE,
        ));

    if items.is_empty() {
        let p = Paragraph::new("No recent activity")
            .style(theme::MUTED_STYLE)
            .alignment(Alignment::Center)
            .block(block);
        f.render_widget(p, area);
        return;
    }

    let mut lines = Vec::new();
    for item in items {
        lines.push(Line::from(vec![
            theme::badge(item.kind.as_str(), Color::Gray),
            Span::raw(" "),
            Span::styled(
                timefmt::format_stamp_short(&item.timestamp, app.display.local_offset),
                theme::MUTED_STYLE,
            ),
        ]));
        lines.push(Line::from(item.text.as_str()));
        lines.push(Line::from(""));
    }
    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }).block(block), area);
}
