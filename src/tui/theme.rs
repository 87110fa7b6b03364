#![forbid(unsafe_code)]

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Span;

use crate::derive::AgentStatus;
use crate::model::{Priority, TaskStatus};

pub const ACCENT: Color = Color::Rgb(16, 185, 129);
pub const MUTED: Color = Color::DarkGray;
pub const ERROR: Color = Color::Rgb(239, 68, 68);

pub const TITLE_STYLE: Style = Style::new().fg(ACCENT).add_modifier(Modifier::BOLD);
pub const SELECTED_BORDER: Style = Style::new().fg(ACCENT).add_modifier(Modifier::BOLD);
pub const MUTED_STYLE: Style = Style::new().fg(MUTED);

pub fn status_color(status: &TaskStatus) -> Color {
    match status {
        TaskStatus::Backlog => Color::Gray,
        TaskStatus::Assigned => Color::Rgb(234, 179, 8),
        TaskStatus::InProgress => Color::Rgb(59, 130, 246),
        TaskStatus::Review => Color::Rgb(168, 85, 247),
        TaskStatus::Done => Color::Rgb(34, 197, 94),
        TaskStatus::Other(_) => MUTED,
    }
}

/// Missing priorities are labelled "medium" but keep the neutral colour.
pub fn priority_color(priority: Option<&Priority>) -> Color {
    match priority {
        Some(Priority::High) => ERROR,
        Some(Priority::Medium) => Color::Rgb(234, 179, 8),
        Some(Priority::Low) => Color::Rgb(34, 197, 94),
        Some(Priority::Other(_)) | None => Color::Gray,
    }
}

pub fn activity_type_color(kind: &str) -> Color {
    match kind.to_uppercase().as_str() {
        "TASK COMPLETED" => Color::Rgb(34, 197, 94),
        "PIPELINE CHECK" => Color::Rgb(59, 130, 246),
        "SYSTEM UPDATE" => Color::Rgb(168, 85, 247),
        "ERROR" => ERROR,
        _ => Color::Gray,
    }
}

pub fn agent_status_color(status: AgentStatus) -> Color {
    match status {
        AgentStatus::Active => Color::Rgb(34, 197, 94),
        AgentStatus::Idle => MUTED,
    }
}

/// Inverted pill: `text` on a `color` background.
pub fn badge(text: impl Into<String>, color: Color) -> Span<'static> {
    Span::styled(
        format!(" {} ", text.into()),
        Style::new()
            .fg(Color::Black)
            .bg(color)
            .add_modifier(Modifier::BOLD),
    )
}
