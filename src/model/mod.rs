#![forbid(unsafe_code)]

//! Wire types for the Mission Base REST API.
//!
//! The backend owns every record; this crate only reads them. Decoding is
//! lenient: optional fields that are missing or malformed fall back to their
//! defaults so a single odd record never fails a whole poll cycle.

mod de;

use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TaskStatus {
    Backlog,
    Assigned,
    InProgress,
    Review,
    Done,
    Other(String),
}

impl TaskStatus {
    /// Kanban column order.
    pub const KNOWN: [TaskStatus; 5] = [
        TaskStatus::Backlog,
        TaskStatus::Assigned,
        TaskStatus::InProgress,
        TaskStatus::Review,
        TaskStatus::Done,
    ];

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            TaskStatus::Backlog => "backlog",
            TaskStatus::Assigned => "assigned",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Review => "review",
            TaskStatus::Done => "done",
            TaskStatus::Other(raw) => raw.as_str(),
        }
    }

    #[must_use]
    pub fn title(&self) -> &str {
        match self {
            TaskStatus::Backlog => "Backlog",
            TaskStatus::Assigned => "Assigned",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Review => "Review",
            TaskStatus::Done => "Done",
            TaskStatus::Other(raw) => raw.as_str(),
        }
    }

    #[must_use]
    pub fn is_known(&self) -> bool {
        !matches!(self, TaskStatus::Other(_))
    }
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::Other(String::new())
    }
}

impl From<String> for TaskStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "backlog" => TaskStatus::Backlog,
            "assigned" => TaskStatus::Assigned,
            "in-progress" => TaskStatus::InProgress,
            "review" => TaskStatus::Review,
            "done" => TaskStatus::Done,
            _ => TaskStatus::Other(raw),
        }
    }
}

impl From<TaskStatus> for String {
    fn from(status: TaskStatus) -> Self {
        match status {
            TaskStatus::Other(raw) => raw,
            known => known.as_str().to_owned(),
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Priority {
    High,
    Medium,
    Low,
    Other(String),
}

impl Priority {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
            Priority::Other(raw) => raw.as_str(),
        }
    }
}

impl From<String> for Priority {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "high" => Priority::High,
            "medium" => Priority::Medium,
            "low" => Priority::Low,
            _ => Priority::Other(raw),
        }
    }
}

impl From<Priority> for String {
    fn from(priority: Priority) -> Self {
        match priority {
            Priority::Other(raw) => raw,
            known => known.as_str().to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(default, deserialize_with = "de::string_or_number")]
    pub id: String,
    #[serde(default, deserialize_with = "de::lenient")]
    pub title: String,
    #[serde(default, deserialize_with = "de::lenient")]
    pub description: String,
    #[serde(default, deserialize_with = "de::lenient")]
    pub status: TaskStatus,
    #[serde(default, deserialize_with = "de::non_blank_string")]
    pub priority: Option<Priority>,
    #[serde(default, deserialize_with = "de::non_empty")]
    pub assignee: Option<String>,
    #[serde(default, deserialize_with = "de::lenient")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "de::lenient")]
    pub created_at: String,
    #[serde(default, deserialize_with = "de::non_blank_string")]
    pub due_date: Option<String>,
    #[serde(default, deserialize_with = "de::lenient")]
    pub comments: Vec<serde_json::Value>,
}

impl Task {
    /// Label shown on priority badges; a missing priority reads as "medium".
    #[must_use]
    pub fn priority_label(&self) -> &str {
        self.priority.as_ref().map_or("medium", Priority::as_str)
    }

    #[must_use]
    pub fn is_done(&self) -> bool {
        self.status == TaskStatus::Done
    }

    #[must_use]
    pub fn is_assigned_to(&self, agent_id: &str) -> bool {
        self.assignee.as_deref() == Some(agent_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Agent {
    #[serde(default, deserialize_with = "de::string_or_number")]
    pub id: String,
    #[serde(default, deserialize_with = "de::lenient")]
    pub name: String,
    #[serde(default, deserialize_with = "de::lenient")]
    pub role: String,
    #[serde(default, deserialize_with = "de::lenient")]
    pub emoji: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ActivityItem {
    #[serde(default, deserialize_with = "de::lenient")]
    pub agent: String,
    #[serde(rename = "type", default, deserialize_with = "de::lenient")]
    pub kind: String,
    #[serde(default, deserialize_with = "de::lenient")]
    pub text: String,
    #[serde(default, deserialize_with = "de::lenient")]
    pub timestamp: String,
}

impl ActivityItem {
    #[must_use]
    pub fn time(&self) -> Option<OffsetDateTime> {
        parse_timestamp(&self.timestamp)
    }
}

/// One poll cycle's worth of data. Replaced wholesale on every success.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Snapshot {
    pub tasks: Vec<Task>,
    pub agents: Vec<Agent>,
    pub activity: Vec<ActivityItem>,
}

/// Body of `GET /tasks`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TasksEnvelope {
    #[serde(default)]
    pub tasks: Option<Vec<Task>>,
}

/// Parses an RFC 3339 timestamp, or a bare `YYYY-MM-DD` date taken as UTC
/// midnight. Anything else is treated as absent.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<OffsetDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(t) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Some(t);
    }
    let date = time::Date::parse(raw, time::macros::format_description!("[year]-[month]-[day]"))
        .ok()?;
    Some(date.midnight().assume_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_decodes_with_numeric_id_and_missing_optionals() {
        let t: Task = serde_json::from_str(r#"{"id":1,"title":"Ship","status":"done"}"#).unwrap();
        assert_eq!(t.id, "1");
        assert_eq!(t.status, TaskStatus::Done);
        assert_eq!(t.priority, None);
        assert_eq!(t.priority_label(), "medium");
        assert!(t.tags.is_empty());
        assert!(t.comments.is_empty());
        assert_eq!(t.due_date, None);
    }

    #[test]
    fn unknown_status_is_preserved_not_rejected() {
        let t: Task = serde_json::from_str(r#"{"id":"a","status":"blocked"}"#).unwrap();
        assert_eq!(t.status, TaskStatus::Other("blocked".to_owned()));
        assert!(!t.status.is_known());
        assert_eq!(t.status.as_str(), "blocked");
    }

    #[test]
    fn malformed_optional_fields_decode_as_absent() {
        let t: Task = serde_json::from_str(
            r#"{"id":"x","status":"review","tags":"oops","comments":7,"dueDate":12,"priority":""}"#,
        )
        .unwrap();
        assert!(t.tags.is_empty());
        assert!(t.comments.is_empty());
        assert_eq!(t.due_date, None);
        assert_eq!(t.priority, None);
    }

    #[test]
    fn numeric_assignee_is_kept_but_numeric_priority_is_not() {
        let t: Task =
            serde_json::from_str(r#"{"id":"x","assignee":7,"priority":5,"dueDate":"  "}"#).unwrap();
        assert_eq!(t.assignee.as_deref(), Some("7"));
        assert_eq!(t.priority, None);
        assert_eq!(t.priority_label(), "medium");
        assert_eq!(t.due_date, None);
    }

    #[test]
    fn camel_case_fields_and_priority_round_trip() {
        let t: Task = serde_json::from_str(
            r#"{"id":"t1","priority":"high","assignee":"a1","createdAt":"2024-05-01T10:00:00Z","dueDate":"2024-05-03","tags":["x","y"],"comments":[{"text":"hi"}]}"#,
        )
        .unwrap();
        assert_eq!(t.priority, Some(Priority::High));
        assert!(t.is_assigned_to("a1"));
        assert_eq!(t.created_at, "2024-05-01T10:00:00Z");
        assert_eq!(t.due_date.as_deref(), Some("2024-05-03"));
        assert_eq!(t.comments.len(), 1);

        let json = serde_json::to_value(&t).unwrap();
        assert_eq!(json["createdAt"], "2024-05-01T10:00:00Z");
        assert_eq!(json["priority"], "high");
    }

    #[test]
    fn activity_type_field_maps_to_kind() {
        let a: ActivityItem = serde_json::from_str(
            r#"{"agent":"Scout","type":"TASK COMPLETED","text":"done","timestamp":"2024-05-01T10:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(a.kind, "TASK COMPLETED");
        assert!(a.time().is_some());
    }

    #[test]
    fn tasks_envelope_without_tasks_key_is_empty() {
        let env: TasksEnvelope = serde_json::from_str("{}").unwrap();
        assert!(env.tasks.unwrap_or_default().is_empty());
    }

    #[test]
    fn parse_timestamp_accepts_rfc3339_and_plain_dates() {
        assert!(parse_timestamp("2024-05-01T10:00:00.123Z").is_some());
        assert!(parse_timestamp("2024-05-01T10:00:00+02:00").is_some());
        let d = parse_timestamp("2024-05-01").unwrap();
        assert_eq!(d.hour(), 0);
        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_timestamp("").is_none());
    }
}
