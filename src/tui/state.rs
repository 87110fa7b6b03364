#![forbid(unsafe_code)]

use time::{OffsetDateTime, UtcOffset};

use crate::derive::{self, ActivityFilter, AGENT_GRID_LIMIT};
use crate::model::{ActivityItem, Agent, Snapshot};
use crate::poller::PollEvent;

/// Agent tiles per dashboard row.
pub const GRID_COLUMNS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Dashboard,
    Kanban,
    Activity,
    AgentDetail,
}

impl View {
    /// Views reachable from the nav bar, in nav order.
    pub const TOP_LEVEL: [View; 3] = [View::Dashboard, View::Kanban, View::Activity];

    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            View::Dashboard => "Dashboard",
            View::Kanban => "Kanban",
            View::Activity => "Activity Log",
            View::AgentDetail => "Agent Details",
        }
    }

    /// Agent detail highlights the Dashboard nav item.
    #[must_use]
    pub fn nav_index(self) -> usize {
        match self {
            View::Dashboard | View::AgentDetail => 0,
            View::Kanban => 1,
            View::Activity => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Normal,
    Searching,
}

#[derive(Debug, Clone)]
pub struct DisplayOptions {
    pub local_offset: UtcOffset,
    pub brand: String,
    pub emoji: bool,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            local_offset: UtcOffset::UTC,
            brand: "AutomAI Innovations".to_owned(),
            emoji: true,
        }
    }
}

impl DisplayOptions {
    /// Agent glyph, or a plain marker when emoji are disabled or missing.
    #[must_use]
    pub fn glyph<'a>(&self, emoji: &'a str) -> &'a str {
        if !self.emoji {
            "*"
        } else if emoji.trim().is_empty() {
            derive::FALLBACK_EMOJI
        } else {
            emoji
        }
    }
}

#[derive(Debug, Default)]
pub struct KanbanState {
    pub focused_column: usize,
    pub scroll: [usize; 5],
}

#[derive(Debug, Default)]
pub struct ActivityLogState {
    pub filter: ActivityFilter,
    pub scroll: usize,
}

#[derive(Debug)]
pub struct AppState {
    pub snapshot: Snapshot,
    pub last_updated: Option<OffsetDateTime>,
    pub loading: bool,
    pub error: Option<String>,

    pub view: View,
    pub selected_agent: Option<Agent>,
    pub mode: Mode,

    pub selected_tile: usize,
    pub kanban: KanbanState,
    pub activity_log: ActivityLogState,
    pub detail_scroll: usize,

    pub display: DisplayOptions,
}

impl AppState {
    #[must_use]
    pub fn new(display: DisplayOptions) -> Self {
        Self {
            snapshot: Snapshot::default(),
            last_updated: None,
            loading: true,
            error: None,
            view: View::Dashboard,
            selected_agent: None,
            mode: Mode::Normal,
            selected_tile: 0,
            kanban: KanbanState::default(),
            activity_log: ActivityLogState::default(),
            detail_scroll: 0,
            display,
        }
    }

    /// Folds one poller report into the state.
    pub fn apply(&mut self, event: PollEvent) {
        match event {
            PollEvent::CycleStarted => {
                self.error = None;
            }
            PollEvent::Updated { snapshot, at } => {
                self.snapshot = snapshot;
                self.last_updated = Some(at);
                self.loading = false;
                self.clamp_selection();
            }
            PollEvent::Failed { message } => {
                self.error = Some(message);
                self.loading = false;
            }
        }
    }

    fn tile_count(&self) -> usize {
        self.snapshot.agents.len().min(AGENT_GRID_LIMIT)
    }

    fn clamp_selection(&mut self) {
        self.selected_tile = self.selected_tile.min(self.tile_count().saturating_sub(1));
    }

    fn enter_top_level(&mut self, view: View) {
        self.view = view;
        self.selected_agent = None;
        self.mode = Mode::Normal;
    }

    pub fn show_dashboard(&mut self) {
        self.enter_top_level(View::Dashboard);
    }

    pub fn show_kanban(&mut self) {
        self.enter_top_level(View::Kanban);
    }

    pub fn show_activity_log(&mut self) {
        self.enter_top_level(View::Activity);
    }

    pub fn show_agent_detail(&mut self, agent: Agent) {
        self.selected_agent = Some(agent);
        self.view = View::AgentDetail;
        self.mode = Mode::Normal;
        self.detail_scroll = 0;
    }

    /// Steps through the nav bar, wrapping at both ends.
    pub fn cycle_view(&mut self, forward: bool) {
        let len = View::TOP_LEVEL.len();
        let cur = self.view.nav_index();
        let next = if forward {
            (cur + 1) % len
        } else {
            (cur + len - 1) % len
        };
        self.enter_top_level(View::TOP_LEVEL[next]);
    }

    /// Returns `false` when there is no tile to open.
    pub fn open_selected_agent(&mut self) -> bool {
        let Some(agent) = self.snapshot.agents.get(self.selected_tile).cloned() else {
            return false;
        };
        if self.selected_tile >= AGENT_GRID_LIMIT {
            return false;
        }
        self.show_agent_detail(agent);
        true
    }

    /// Moves within the tile grid; moves off the grid edge are ignored.
    pub fn move_tile_selection(&mut self, dx: i64, dy: i64) {
        let count = self.tile_count();
        if count == 0 {
            return;
        }
        let cols = i64::try_from(GRID_COLUMNS).unwrap_or(3);
        let cur = i64::try_from(self.selected_tile).unwrap_or(0);
        let (row, col) = (cur / cols, cur % cols);
        let (row, col) = (row + dy, col + dx);
        if row < 0 || col < 0 || col >= cols {
            return;
        }
        let next = row * cols + col;
        if let Ok(next) = usize::try_from(next)
            && next < count
        {
            self.selected_tile = next;
        }
    }

    pub fn focus_column(&mut self, delta: i64) {
        let max = i64::try_from(self.kanban.scroll.len() - 1).unwrap_or(4);
        let cur = i64::try_from(self.kanban.focused_column).unwrap_or(0);
        self.kanban.focused_column = usize::try_from((cur + delta).clamp(0, max)).unwrap_or(0);
    }

    pub fn scroll_column(&mut self, delta: i64) {
        let col = self.kanban.focused_column;
        if let Some(scroll) = self.kanban.scroll.get_mut(col) {
            *scroll = apply_delta(*scroll, delta);
        }
    }

    pub fn scroll_activity(&mut self, delta: i64) {
        self.activity_log.scroll = apply_delta(self.activity_log.scroll, delta);
    }

    pub fn scroll_detail(&mut self, delta: i64) {
        self.detail_scroll = apply_delta(self.detail_scroll, delta);
    }

    /// All Agents, then each distinct agent in the feed, then back around.
    pub fn cycle_agent_filter(&mut self) {
        let agents = derive::activity_agents(&self.snapshot.activity);
        let filter = &mut self.activity_log.filter;
        filter.agent = match filter.agent.as_deref() {
            None => agents.first().cloned(),
            Some(current) => agents
                .iter()
                .position(|a| a == current)
                .and_then(|i| agents.get(i + 1))
                .cloned(),
        };
        self.activity_log.scroll = 0;
    }

    pub fn clear_activity_filters(&mut self) {
        self.activity_log.filter.clear();
        self.activity_log.scroll = 0;
    }

    pub fn push_search_char(&mut self, c: char) {
        self.activity_log.filter.search.push(c);
        self.activity_log.scroll = 0;
    }

    pub fn pop_search_char(&mut self) {
        self.activity_log.filter.search.pop();
        self.activity_log.scroll = 0;
    }

    #[must_use]
    pub fn filtered_activity(&self) -> Vec<&ActivityItem> {
        derive::filter_activity(&self.snapshot.activity, &self.activity_log.filter)
    }
}

fn apply_delta(value: usize, delta: i64) -> usize {
    let magnitude = usize::try_from(delta.unsigned_abs()).unwrap_or(usize::MAX);
    if delta < 0 {
        value.saturating_sub(magnitude)
    } else {
        value.saturating_add(magnitude)
    }
}
