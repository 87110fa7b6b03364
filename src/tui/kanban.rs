#![forbid(unsafe_code)]

use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use time::OffsetDateTime;

use crate::derive::{self, KanbanColumn, timefmt};
use crate::model::Task;
use crate::tui::state::AppState;
use crate::tui::{scroll_offset, theme};

pub fn draw(f: &mut Frame<'_>, area: Rect, app: &AppState, now: OffsetDateTime) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(3)])
        .split(area);

    f.render_widget(
        Paragraph::new(Span::styled("Task Kanban Board", theme::TITLE_STYLE)),
        chunks[0],
    );

    let columns = derive::kanban_columns(&app.snapshot.tasks);
    let cells = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 5); 5])
        .split(chunks[1]);

    for (idx, (column, cell)) in columns.iter().zip(cells.iter()).enumerate() {
        let scroll = app.kanban.scroll.get(idx).copied().unwrap_or(0);
        let focused = idx == app.kanban.focused_column;
        draw_column(f, *cell, app, column, focused, scroll, now);
    }
}

fn draw_column(
    f: &mut Frame<'_>,
    area: Rect,
    app: &AppState,
    column: &KanbanColumn<'_>,
    focused: bool,
    scroll: usize,
    now: OffsetDateTime,
) {
    let color = theme::status_color(&column.status);
    let border_style = if focused {
        Style::default().fg(color).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(color)
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title_top(Line::from(Span::styled(
            format!(" {} ", column.title()),
            Style::default().add_modifier(Modifier::BOLD),
        )))
        .title_top(Line::from(format!(" {} ", column.tasks.len())).right_aligned());

    if column.tasks.is_empty() {
        let p = Paragraph::new(vec![Line::from(""), Line::from("📭"), Line::from("No tasks")])
            .style(theme::MUTED_STYLE)
            .alignment(Alignment::Center)
            .block(block);
        f.render_widget(p, area);
        return;
    }

    let mut lines = Vec::new();
    for task in &column.tasks {
        card_lines(&mut lines, app, task, now);
        lines.push(Line::from(""));
    }
    let p = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .scroll(scroll_offset(scroll))
        .block(block);
    f.render_widget(p, area);
}

fn card_lines<'a>(lines: &mut Vec<Line<'a>>, app: &'a AppState, task: &'a Task, now: OffsetDateTime) {
    let offset = app.display.local_offset;
    let assignee = derive::resolve_assignee(task.assignee.as_deref(), &app.snapshot.agents);

    lines.push(Line::from(Span::styled(
        task.title.as_str(),
        Style::default().add_modifier(Modifier::BOLD),
    )));
    lines.push(Line::from(vec![
        Span::raw(format!("{} ", app.display.glyph(assignee.emoji))),
        Span::raw(assignee.name),
        Span::raw(" "),
        theme::badge(task.priority_label(), theme::priority_color(task.priority.as_ref())),
    ]));

    if !task.tags.is_empty() {
        let (shown, hidden) = derive::visible_tags(&task.tags);
        let mut spans: Vec<Span<'a>> = Vec::new();
        for tag in shown {
            spans.push(Span::styled(format!("[{tag}]"), Style::default().fg(Color::Gray)));
            spans.push(Span::raw(" "));
        }
        if hidden > 0 {
            spans.push(Span::styled(format!("+{hidden}"), theme::MUTED_STYLE));
        }
        lines.push(Line::from(spans));
    }

    lines.push(Line::from(Span::styled(
        format!("Created: {}", timefmt::format_date(&task.created_at, offset)),
        theme::MUTED_STYLE,
    )));
    if let Some(due) = &task.due_date {
        let style = if timefmt::is_overdue(due, now) {
            Style::default().fg(theme::ERROR)
        } else {
            theme::MUTED_STYLE
        };
        lines.push(Line::from(Span::styled(
            format!("Due: {}", timefmt::format_date(due, offset)),
            style,
        )));
    }
    if !task.comments.is_empty() {
        lines.push(Line::from(Span::styled(
            format!("💬 {}", derive::comment_label(task.comments.len())),
            theme::MUTED_STYLE,
        )));
    }
}
