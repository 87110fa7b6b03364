#![forbid(unsafe_code)]

//! Pure computations over a [`Snapshot`](crate::model::Snapshot). Views call
//! these on every frame; nothing here mutates fetched data.

pub mod timefmt;

use std::collections::BTreeSet;

use serde::Serialize;
use time::{Duration, OffsetDateTime};

use crate::model::{ActivityItem, Agent, Task, TaskStatus};

/// An agent with activity newer than this is considered active.
pub const ACTIVE_WINDOW: Duration = Duration::hours(4);
/// Agent tiles shown on the dashboard.
pub const AGENT_GRID_LIMIT: usize = 9;
/// Items in the dashboard's recent activity feed.
pub const RECENT_ACTIVITY_LIMIT: usize = 20;
/// Items in the agent detail activity list.
pub const AGENT_ACTIVITY_LIMIT: usize = 10;
/// Tags shown on a card before collapsing into "+N".
pub const VISIBLE_TAGS: usize = 3;

pub const FALLBACK_EMOJI: &str = "👤";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TaskStats {
    pub total: usize,
    pub completed: usize,
    pub in_progress: usize,
    pub review: usize,
    pub assigned: usize,
    pub backlog: usize,
}

impl TaskStats {
    /// Single pass; unknown statuses only count toward `total`.
    pub fn tally<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> Self {
        let mut stats = Self::default();
        for task in tasks {
            stats.total += 1;
            match task.status {
                TaskStatus::Done => stats.completed += 1,
                TaskStatus::InProgress => stats.in_progress += 1,
                TaskStatus::Review => stats.review += 1,
                TaskStatus::Assigned => stats.assigned += 1,
                TaskStatus::Backlog => stats.backlog += 1,
                TaskStatus::Other(_) => {}
            }
        }
        stats
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    Active,
    Idle,
}

impl AgentStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AgentStatus::Active => "active",
            AgentStatus::Idle => "idle",
        }
    }
}

/// Activity records carry the agent's display name, not its id.
#[must_use]
pub fn names_match(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

/// Activity attributed to `agent`, newest first (backend order).
pub fn agent_activity<'a>(
    agent: &'a Agent,
    activity: &'a [ActivityItem],
) -> impl Iterator<Item = &'a ActivityItem> + 'a {
    activity
        .iter()
        .filter(move |item| names_match(&item.agent, &agent.name))
}

#[must_use]
pub fn agent_status(agent: &Agent, activity: &[ActivityItem], now: OffsetDateTime) -> AgentStatus {
    let cutoff = now - ACTIVE_WINDOW;
    let recent = agent_activity(agent, activity).any(|item| item.time().is_some_and(|t| t > cutoff));
    if recent {
        AgentStatus::Active
    } else {
        AgentStatus::Idle
    }
}

/// Tasks assigned to the agent that are not done yet.
#[must_use]
pub fn open_task_count(agent_id: &str, tasks: &[Task]) -> usize {
    tasks
        .iter()
        .filter(|t| t.is_assigned_to(agent_id) && !t.is_done())
        .count()
}

#[must_use]
pub fn last_activity<'a>(agent: &'a Agent, activity: &'a [ActivityItem]) -> Option<&'a ActivityItem> {
    agent_activity(agent, activity).next()
}

/// Compact "Last: 5m ago" text for an agent tile. `None` when the agent has no
/// activity or its newest record carries no usable timestamp.
#[must_use]
pub fn last_activity_ago(agent: &Agent, activity: &[ActivityItem], now: OffsetDateTime) -> Option<String> {
    let item = last_activity(agent, activity)?;
    let t = item.time()?;
    Some(timefmt::format_ago_compact(now - t))
}

/// Everything an agent tile on the dashboard shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentTile<'a> {
    pub agent: &'a Agent,
    pub status: AgentStatus,
    pub open_tasks: usize,
    pub last_activity: Option<String>,
}

#[must_use]
pub fn agent_tiles<'a>(
    agents: &'a [Agent],
    tasks: &[Task],
    activity: &[ActivityItem],
    now: OffsetDateTime,
) -> Vec<AgentTile<'a>> {
    agents
        .iter()
        .take(AGENT_GRID_LIMIT)
        .map(|agent| AgentTile {
            agent,
            status: agent_status(agent, activity, now),
            open_tasks: open_task_count(&agent.id, tasks),
            last_activity: last_activity_ago(agent, activity, now),
        })
        .collect()
}

/// Activity log filter: free-text search AND an optional exact agent name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivityFilter {
    pub search: String,
    pub agent: Option<String>,
}

impl ActivityFilter {
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.search.is_empty() || self.agent.is_some()
    }

    #[must_use]
    pub fn matches(&self, item: &ActivityItem) -> bool {
        let matches_search = self.search.is_empty() || {
            let needle = self.search.to_lowercase();
            item.text.to_lowercase().contains(&needle)
                || item.kind.to_lowercase().contains(&needle)
                || item.agent.to_lowercase().contains(&needle)
        };
        let matches_agent = self
            .agent
            .as_deref()
            .is_none_or(|agent| names_match(&item.agent, agent));
        matches_search && matches_agent
    }

    pub fn clear(&mut self) {
        self.search.clear();
        self.agent = None;
    }
}

#[must_use]
pub fn filter_activity<'a>(activity: &'a [ActivityItem], filter: &ActivityFilter) -> Vec<&'a ActivityItem> {
    activity.iter().filter(|item| filter.matches(item)).collect()
}

/// Distinct agent names in the feed, sorted, for the agent selector.
#[must_use]
pub fn activity_agents(activity: &[ActivityItem]) -> Vec<String> {
    activity
        .iter()
        .map(|item| item.agent.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct KanbanColumn<'a> {
    pub status: TaskStatus,
    pub tasks: Vec<&'a Task>,
}

impl KanbanColumn<'_> {
    #[must_use]
    pub fn title(&self) -> &str {
        self.status.title()
    }
}

/// Five fixed columns in board order. Tasks with an unknown status land in none.
#[must_use]
pub fn kanban_columns(tasks: &[Task]) -> Vec<KanbanColumn<'_>> {
    TaskStatus::KNOWN
        .iter()
        .map(|status| KanbanColumn {
            status: status.clone(),
            tasks: tasks.iter().filter(|t| &t.status == status).collect(),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct AgentSummary<'a> {
    pub tasks: Vec<&'a Task>,
    pub stats: TaskStats,
    pub recent_activity: Vec<&'a ActivityItem>,
}

#[must_use]
pub fn agent_summary<'a>(
    agent: &'a Agent,
    tasks: &'a [Task],
    activity: &'a [ActivityItem],
) -> AgentSummary<'a> {
    let tasks: Vec<&Task> = tasks.iter().filter(|t| t.is_assigned_to(&agent.id)).collect();
    let stats = TaskStats::tally(tasks.iter().copied());
    let recent_activity = agent_activity(agent, activity)
        .take(AGENT_ACTIVITY_LIMIT)
        .collect();
    AgentSummary {
        tasks,
        stats,
        recent_activity,
    }
}

/// Display-only tag truncation: the first few tags plus how many were hidden.
#[must_use]
pub fn visible_tags(tags: &[String]) -> (&[String], usize) {
    let shown = tags.len().min(VISIBLE_TAGS);
    (&tags[..shown], tags.len() - shown)
}

/// Who a task card shows as assignee. Unknown ids get a placeholder identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignee<'a> {
    pub name: &'a str,
    pub emoji: &'a str,
}

#[must_use]
pub fn resolve_assignee<'a>(assignee: Option<&'a str>, agents: &'a [Agent]) -> Assignee<'a> {
    let found = assignee.and_then(|id| agents.iter().find(|a| a.id == id));
    match found {
        Some(agent) => Assignee {
            name: &agent.name,
            emoji: &agent.emoji,
        },
        None => Assignee {
            name: assignee.unwrap_or("unassigned"),
            emoji: FALLBACK_EMOJI,
        },
    }
}

#[must_use]
pub fn comment_label(count: usize) -> String {
    if count == 1 {
        "1 comment".to_owned()
    } else {
        format!("{count} comments")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: &str, status: &str, assignee: Option<&str>) -> Task {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "title": format!("task {id}"),
            "status": status,
            "assignee": assignee,
        }))
        .unwrap()
    }

    fn agent(id: &str, name: &str) -> Agent {
        Agent {
            id: id.to_owned(),
            name: name.to_owned(),
            role: "Engineer".to_owned(),
            emoji: "🤖".to_owned(),
        }
    }

    fn item(agent: &str, kind: &str, text: &str, at: OffsetDateTime) -> ActivityItem {
        ActivityItem {
            agent: agent.to_owned(),
            kind: kind.to_owned(),
            text: text.to_owned(),
            timestamp: at
                .format(&time::format_description::well_known::Rfc3339)
                .unwrap(),
        }
    }

    #[test]
    fn tally_counts_each_status_once() {
        let tasks = vec![task("1", "done", None), task("2", "backlog", None)];
        let stats = TaskStats::tally(&tasks);
        assert_eq!(stats.total, 2);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.backlog, 1);
        assert_eq!(stats.in_progress + stats.review + stats.assigned, 0);
    }

    #[test]
    fn tally_counts_unknown_status_only_in_total() {
        let tasks = vec![task("1", "blocked", None), task("2", "review", None)];
        let stats = TaskStats::tally(&tasks);
        assert_eq!(stats.total, 2);
        assert_eq!(stats.review, 1);
        assert_eq!(
            stats.completed + stats.in_progress + stats.assigned + stats.backlog,
            0
        );
    }

    #[test]
    fn agent_is_active_only_with_recent_matching_activity() {
        let now = OffsetDateTime::now_utc();
        let scout = agent("a1", "Scout");

        assert_eq!(agent_status(&scout, &[], now), AgentStatus::Idle);

        let stale = vec![item("scout", "PING", "x", now - Duration::hours(5))];
        assert_eq!(agent_status(&scout, &stale, now), AgentStatus::Idle);

        let other = vec![item("Forge", "PING", "x", now - Duration::minutes(1))];
        assert_eq!(agent_status(&scout, &other, now), AgentStatus::Idle);

        let fresh = vec![item("SCOUT", "PING", "x", now - Duration::hours(3))];
        assert_eq!(agent_status(&scout, &fresh, now), AgentStatus::Active);
    }

    #[test]
    fn activity_exactly_at_cutoff_is_not_recent() {
        let now = OffsetDateTime::now_utc().replace_nanosecond(0).unwrap();
        let scout = agent("a1", "Scout");
        let edge = vec![item("Scout", "PING", "x", now - ACTIVE_WINDOW)];
        assert_eq!(agent_status(&scout, &edge, now), AgentStatus::Idle);
    }

    #[test]
    fn unparseable_timestamps_never_count_as_recent() {
        let now = OffsetDateTime::now_utc();
        let scout = agent("a1", "Scout");
        let mut bad = item("Scout", "PING", "x", now);
        bad.timestamp = "a moment ago".to_owned();
        assert_eq!(agent_status(&scout, &[bad], now), AgentStatus::Idle);
    }

    #[test]
    fn open_task_count_skips_done_and_other_assignees() {
        let tasks = vec![
            task("1", "in-progress", Some("a1")),
            task("2", "done", Some("a1")),
            task("3", "backlog", Some("a2")),
            task("4", "review", Some("a1")),
        ];
        assert_eq!(open_task_count("a1", &tasks), 2);
        assert_eq!(open_task_count("a2", &tasks), 1);
        assert_eq!(open_task_count("nobody", &tasks), 0);
    }

    #[test]
    fn last_activity_uses_newest_matching_record() {
        let now = OffsetDateTime::now_utc();
        let scout = agent("a1", "Scout");
        let feed = vec![
            item("Forge", "PING", "f", now - Duration::minutes(1)),
            item("Scout", "PING", "s1", now - Duration::minutes(5)),
            item("Scout", "PING", "s2", now - Duration::hours(2)),
        ];
        assert_eq!(last_activity(&scout, &feed).map(|i| i.text.as_str()), Some("s1"));
        assert_eq!(last_activity_ago(&scout, &feed, now).as_deref(), Some("5m ago"));
        assert_eq!(last_activity_ago(&agent("a9", "Ghost"), &feed, now), None);
    }

    #[test]
    fn agent_tiles_are_capped_at_grid_limit() {
        let agents: Vec<Agent> = (0..12).map(|i| agent(&format!("a{i}"), &format!("Agent {i}"))).collect();
        let tiles = agent_tiles(&agents, &[], &[], OffsetDateTime::now_utc());
        assert_eq!(tiles.len(), AGENT_GRID_LIMIT);
        assert!(tiles.iter().all(|t| t.status == AgentStatus::Idle && t.open_tasks == 0));
    }

    #[test]
    fn filter_is_subset_and_requires_both_predicates() {
        let now = OffsetDateTime::now_utc();
        let feed = vec![
            item("Scout", "TASK COMPLETED", "Deployed api", now),
            item("Forge", "PIPELINE CHECK", "Build green", now),
            item("scout", "ERROR", "Deploy failed", now),
            item("Forge", "SYSTEM UPDATE", "Rotated keys", now),
        ];

        let everything = filter_activity(&feed, &ActivityFilter::default());
        assert_eq!(everything.len(), feed.len());

        let by_text = ActivityFilter {
            search: "DEPLOY".to_owned(),
            agent: None,
        };
        let hits: Vec<&str> = filter_activity(&feed, &by_text)
            .iter()
            .map(|i| i.text.as_str())
            .collect();
        assert_eq!(hits, ["Deployed api", "Deploy failed"]);

        let by_type = ActivityFilter {
            search: "pipeline".to_owned(),
            agent: None,
        };
        assert_eq!(filter_activity(&feed, &by_type).len(), 1);

        let by_agent_name_substring = ActivityFilter {
            search: "forg".to_owned(),
            agent: None,
        };
        assert_eq!(filter_activity(&feed, &by_agent_name_substring).len(), 2);

        let combined = ActivityFilter {
            search: "deploy".to_owned(),
            agent: Some("Scout".to_owned()),
        };
        let hits = filter_activity(&feed, &combined);
        assert_eq!(hits.len(), 2);
        for hit in &hits {
            assert!(feed.iter().any(|f| std::ptr::eq(f, *hit)));
            assert!(combined.matches(hit));
        }

        let none = ActivityFilter {
            search: "rotated".to_owned(),
            agent: Some("Scout".to_owned()),
        };
        assert!(filter_activity(&feed, &none).is_empty());
    }

    #[test]
    fn activity_agents_are_distinct_and_sorted() {
        let now = OffsetDateTime::now_utc();
        let feed = vec![
            item("Scout", "A", "", now),
            item("Forge", "A", "", now),
            item("Scout", "B", "", now),
        ];
        assert_eq!(activity_agents(&feed), ["Forge", "Scout"]);
    }

    #[test]
    fn kanban_places_known_statuses_in_exactly_one_column() {
        let tasks = vec![
            task("1", "backlog", None),
            task("2", "assigned", None),
            task("3", "in-progress", None),
            task("4", "review", None),
            task("5", "done", None),
            task("6", "done", None),
            task("7", "archived", None),
        ];
        let columns = kanban_columns(&tasks);
        let titles: Vec<&str> = columns.iter().map(KanbanColumn::title).collect();
        assert_eq!(titles, ["Backlog", "Assigned", "In Progress", "Review", "Done"]);

        for t in tasks.iter().filter(|t| t.status.is_known()) {
            let hits = columns
                .iter()
                .filter(|c| c.tasks.iter().any(|ct| ct.id == t.id))
                .count();
            assert_eq!(hits, 1, "task {} should be in one column", t.id);
        }
        assert!(columns.iter().all(|c| c.tasks.iter().all(|t| t.id != "7")));
        assert_eq!(columns[4].tasks.len(), 2);
        let placed: usize = columns.iter().map(|c| c.tasks.len()).sum();
        assert_eq!(placed, 6);
    }

    #[test]
    fn agent_summary_scopes_tasks_and_caps_activity() {
        let now = OffsetDateTime::now_utc();
        let scout = agent("a1", "Scout");
        let tasks = vec![
            task("1", "done", Some("a1")),
            task("2", "in-progress", Some("a1")),
            task("3", "backlog", Some("a2")),
        ];
        let feed: Vec<ActivityItem> = (0..15)
            .map(|i| item("Scout", "PING", &format!("n{i}"), now - Duration::minutes(i)))
            .collect();

        let summary = agent_summary(&scout, &tasks, &feed);
        assert_eq!(summary.tasks.len(), 2);
        assert_eq!(summary.stats.total, 2);
        assert_eq!(summary.stats.completed, 1);
        assert_eq!(summary.stats.in_progress, 1);
        assert_eq!(summary.recent_activity.len(), AGENT_ACTIVITY_LIMIT);
        assert_eq!(summary.recent_activity[0].text, "n0");
    }

    #[test]
    fn agent_summary_for_idle_agent_is_empty() {
        let ghost = agent("zz", "Ghost");
        let summary = agent_summary(&ghost, &[], &[]);
        assert_eq!(summary.stats, TaskStats::default());
        assert!(summary.tasks.is_empty());
        assert!(summary.recent_activity.is_empty());
    }

    #[test]
    fn tags_truncate_after_three() {
        let tags: Vec<String> = ["a", "b", "c", "d", "e"].iter().map(|s| (*s).to_owned()).collect();
        let (shown, hidden) = visible_tags(&tags);
        assert_eq!(shown, &tags[..3]);
        assert_eq!(hidden, 2);

        let (shown, hidden) = visible_tags(&tags[..2]);
        assert_eq!(shown.len(), 2);
        assert_eq!(hidden, 0);
    }

    #[test]
    fn unknown_assignee_gets_placeholder_identity() {
        let agents = vec![agent("a1", "Scout")];
        let known = resolve_assignee(Some("a1"), &agents);
        assert_eq!(known.name, "Scout");
        assert_eq!(known.emoji, "🤖");

        let unknown = resolve_assignee(Some("a42"), &agents);
        assert_eq!(unknown.name, "a42");
        assert_eq!(unknown.emoji, FALLBACK_EMOJI);

        assert_eq!(resolve_assignee(None, &agents).name, "unassigned");
    }

    #[test]
    fn comment_label_pluralizes() {
        assert_eq!(comment_label(1), "1 comment");
        assert_eq!(comment_label(3), "3 comments");
    }
}
