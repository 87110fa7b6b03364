#![forbid(unsafe_code)]

pub mod activity_log;
pub mod agent_detail;
pub mod app;
pub mod dashboard;
pub mod kanban;
pub mod state;
pub mod theme;

use std::io;
use std::io::IsTerminal as _;

use ratatui::layout::{Constraint, Direction, Layout, Rect};

use crate::error::MissionBaseError;

pub type CrosstermTerminal = ratatui::Terminal<ratatui::backend::CrosstermBackend<io::Stdout>>;

#[must_use]
pub fn is_tty() -> bool {
    std::io::stdout().is_terminal()
}

pub fn init_terminal() -> Result<CrosstermTerminal, MissionBaseError> {
    use crossterm::terminal::enable_raw_mode;
    use ratatui::backend::CrosstermBackend;

    enable_raw_mode()
        .map_err(|e| MissionBaseError::Terminal(format!("failed to enable raw mode: {e}")))?;
    let mut stdout = io::stdout();
    crossterm::execute!(stdout, crossterm::terminal::EnterAlternateScreen)
        .map_err(|e| MissionBaseError::Terminal(format!("failed to enter alt screen: {e}")))?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = ratatui::Terminal::new(backend)
        .map_err(|e| MissionBaseError::Terminal(format!("failed to create terminal: {e}")))?;
    Ok(terminal)
}

pub fn restore_terminal(mut terminal: CrosstermTerminal) -> Result<(), MissionBaseError> {
    use crossterm::terminal::disable_raw_mode;

    disable_raw_mode()
        .map_err(|e| MissionBaseError::Terminal(format!("failed to disable raw mode: {e}")))?;
    crossterm::execute!(
        terminal.backend_mut(),
        crossterm::terminal::LeaveAlternateScreen
    )
    .map_err(|e| MissionBaseError::Terminal(format!("failed to leave alt screen: {e}")))?;
    terminal
        .show_cursor()
        .map_err(|e| MissionBaseError::Terminal(format!("failed to show cursor: {e}")))?;
    Ok(())
}

/// Restores the terminal on every exit path, panics included.
pub struct TerminalGuard {
    pub terminal: Option<CrosstermTerminal>,
}

impl TerminalGuard {
    #[must_use]
    pub fn new(terminal: CrosstermTerminal) -> Self {
        Self {
            terminal: Some(terminal),
        }
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if let Some(terminal) = self.terminal.take() {
            let _ = restore_terminal(terminal);
        }
    }
}

#[must_use]
pub fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
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

/// Converts a scroll offset for `Paragraph::scroll`.
#[must_use]
pub fn scroll_offset(scroll: usize) -> (u16, u16) {
    (u16::try_from(scroll).unwrap_or(u16::MAX), 0)
}
