use ratatui::Terminal;
use ratatui::backend::TestBackend;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use mission_base::model::{ActivityItem, Agent, Snapshot};
use mission_base::poller::PollEvent;
use mission_base::tui::app::draw;
use mission_base::tui::state::{AppState, DisplayOptions};

fn now() -> OffsetDateTime {
    OffsetDateTime::parse("2024-05-01T12:05:00Z", &Rfc3339).unwrap()
}

fn render(app: &AppState) -> String {
    let mut terminal = Terminal::new(TestBackend::new(160, 50)).unwrap();
    terminal.draw(|f| draw(f, app, now())).unwrap();
    let buf = terminal.backend().buffer();
    let mut out = String::new();
    for y in 0..buf.area.height {
        for x in 0..buf.area.width {
            out.push_str(buf[(x, y)].symbol());
        }
        out.push('\n');
    }
    out
}

fn fixture() -> Snapshot {
    Snapshot {
        tasks: serde_json::from_value(serde_json::json!([
            {"id": 1, "title": "Write docs", "status": "done", "assignee": "scout",
             "createdAt": "2024-04-30T09:00:00Z"},
            {"id": 2, "title": "Triage inbox", "status": "backlog", "assignee": "ghost",
             "tags": ["ops", "mail", "urgent", "later"], "comments": [{}, {}],
             "createdAt": "2024-05-01T08:00:00Z"},
            {"id": 3, "title": "Odd one", "status": "blocked"}
        ]))
        .unwrap(),
        agents: vec![
            Agent {
                id: "scout".to_owned(),
                name: "Scout".to_owned(),
                role: "Research".to_owned(),
                emoji: "🔭".to_owned(),
            },
            Agent {
                id: "forge".to_owned(),
                name: "Forge".to_owned(),
                role: "Builder".to_owned(),
                emoji: "🔨".to_owned(),
            },
        ],
        activity: vec![
            ActivityItem {
                agent: "Scout".to_owned(),
                kind: "TASK COMPLETED".to_owned(),
                text: "Docs shipped".to_owned(),
                timestamp: "2024-05-01T12:00:00Z".to_owned(),
            },
            ActivityItem {
                agent: "Forge".to_owned(),
                kind: "SYSTEM UPDATE".to_owned(),
                text: "Rebuilt cache".to_owned(),
                timestamp: "2024-04-20T12:00:00Z".to_owned(),
            },
        ],
    }
}

fn loaded(snapshot: Snapshot) -> AppState {
    let mut app = AppState::new(DisplayOptions::default());
    app.apply(PollEvent::Updated {
        snapshot,
        at: now() - time::Duration::seconds(30),
    });
    app
}

#[test]
fn loading_screen_before_first_cycle() {
    let app = AppState::new(DisplayOptions::default());
    let screen = render(&app);
    assert!(screen.contains("Loading Mission Base..."));
    assert!(!screen.contains("Dashboard [1]"));
}

#[test]
fn header_shows_error_and_never_updated() {
    let mut app = AppState::new(DisplayOptions::default());
    app.apply(PollEvent::Failed {
        message: "Failed to fetch data from API".to_owned(),
    });
    let screen = render(&app);
    assert!(screen.contains("Error: Failed to fetch data from API"));
    assert!(screen.contains("Last updated: Never"));
    assert!(screen.contains("AutomAI Innovations"));
}

#[test]
fn dashboard_shows_stats_tiles_and_feed() {
    let app = loaded(fixture());
    let screen = render(&app);

    assert!(screen.contains("Last updated: 30 seconds ago"));
    assert!(screen.contains("Total Tasks"));
    assert!(screen.contains("In Review"));
    assert!(screen.contains("Agent Status"));
    assert!(screen.contains("Scout"));
    assert!(screen.contains("Research"));
    assert!(screen.contains(" active "));
    assert!(screen.contains(" idle "));
    assert!(screen.contains("Last: 5m ago"));
    assert!(screen.contains("Recent Activity"));
    assert!(screen.contains("Docs shipped"));
}

#[test]
fn dashboard_without_activity() {
    let mut snapshot = fixture();
    snapshot.activity.clear();
    let screen = render(&loaded(snapshot));
    assert!(screen.contains("No recent activity"));
    assert!(!screen.contains("Last: "));
}

#[test]
fn kanban_has_five_columns_and_card_details() {
    let mut app = loaded(fixture());
    app.show_kanban();
    let screen = render(&app);

    assert!(screen.contains("Task Kanban Board"));
    for title in ["Backlog", "Assigned", "In Progress", "Review", "Done"] {
        assert!(screen.contains(title), "missing column {title}");
    }
    assert!(screen.contains("No tasks"));
    assert!(screen.contains("Triage inbox"));
    // Unknown assignee falls back to the raw id.
    assert!(screen.contains("ghost"));
    assert!(screen.contains("medium"));
    assert!(screen.contains("[ops] [mail] [urgent] +1"));
    assert!(screen.contains("2 comments"));
    assert!(!screen.contains("Odd one"));
}

#[test]
fn activity_log_counts_and_filters() {
    let mut app = loaded(fixture());
    app.show_activity_log();
    let screen = render(&app);
    assert!(screen.contains("2 of 2 activities"));
    assert!(screen.contains("Showing all 2 activities"));
    assert!(screen.contains("All Agents"));

    app.cycle_agent_filter();
    let screen = render(&app);
    assert!(screen.contains("1 of 2 activities"));
    assert!(screen.contains("Clear (c)"));
    assert!(!screen.contains("Showing all"));

    for c in "zzz".chars() {
        app.push_search_char(c);
    }
    let screen = render(&app);
    assert!(screen.contains("0 of 2 activities"));
    assert!(screen.contains("No activities found"));
    assert!(screen.contains("Try adjusting your search criteria"));
}

#[test]
fn empty_activity_log_says_no_data() {
    let mut app = loaded(Snapshot::default());
    app.show_activity_log();
    let screen = render(&app);
    assert!(screen.contains("No activities found"));
    assert!(screen.contains("No activity data available"));
}

#[test]
fn agent_detail_for_idle_agent_without_tasks() {
    let mut app = loaded(fixture());
    app.show_agent_detail(Agent {
        id: "nobody".to_owned(),
        name: "Nobody".to_owned(),
        role: "Spare".to_owned(),
        emoji: String::new(),
    });
    let screen = render(&app);

    assert!(screen.contains("Back to Dashboard"));
    assert!(screen.contains("ID: nobody"));
    assert!(screen.contains("Tasks (0)"));
    assert!(screen.contains("No tasks assigned"));
    assert!(screen.contains("Recent Activity (0)"));
    assert!(screen.contains("No recent activity"));

    // Tally values sit on the row above their labels.
    let lines: Vec<&str> = screen.lines().collect();
    let label_row = lines
        .iter()
        .position(|l| l.contains("Total Tasks"))
        .unwrap();
    let values: String = lines[label_row - 1]
        .chars()
        .filter(char::is_ascii_digit)
        .collect();
    assert_eq!(values, "000000");
}

#[test]
fn agent_detail_lists_tasks_and_activity() {
    let mut app = loaded(fixture());
    app.open_selected_agent();
    let screen = render(&app);

    assert!(screen.contains("ID: scout"));
    assert!(screen.contains("Tasks (1)"));
    assert!(screen.contains("Write docs"));
    assert!(screen.contains(" done "));
    assert!(screen.contains("Recent Activity (1)"));
    assert!(screen.contains("Docs shipped"));
}

#[test]
fn agent_detail_without_selection_renders_empty_body() {
    let mut app = loaded(fixture());
    app.view = mission_base::tui::state::View::AgentDetail;
    let screen = render(&app);
    assert!(!screen.contains("Back to Dashboard"));
    assert!(screen.contains("Dashboard [1]"));
}
