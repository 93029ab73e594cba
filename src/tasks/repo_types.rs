use std::fmt;

use serde::{Serialize, Serializer};
use sqlx::FromRow;
use time::OffsetDateTime;

/// Raw row of the `ai_task_manager` table. Status and priority are free text in storage.
#[derive(Debug, FromRow)]
pub struct TaskRow {
    #[sqlx(rename = "TaskID")]
    pub task_id: i64,
    pub user_id: String,
    #[sqlx(rename = "Title")]
    pub title: String,
    #[sqlx(rename = "Description")]
    pub description: Option<String>,
    #[sqlx(rename = "Status")]
    pub status: String,
    #[sqlx(rename = "Priority")]
    pub priority: String,
    #[sqlx(rename = "DueDate")]
    pub due_date: Option<String>,
    #[sqlx(rename = "CreatedAt")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TaskStatus {
    NotStarted,
    Pending,
    Completed,
    /// Value written by some other process; tolerated on read, never accepted on write.
    Other(String),
}

impl TaskStatus {
    pub const KNOWN: [TaskStatus; 3] = [Self::NotStarted, Self::Pending, Self::Completed];

    pub fn as_str(&self) -> &str {
        match self {
            Self::NotStarted => "Not Started",
            Self::Pending => "Pending",
            Self::Completed => "Completed",
            Self::Other(s) => s,
        }
    }

    /// Strict parse used for writes.
    pub fn parse_known(s: &str) -> Option<Self> {
        match s {
            "Not Started" => Some(Self::NotStarted),
            "Pending" => Some(Self::Pending),
            "Completed" => Some(Self::Completed),
            _ => None,
        }
    }

    /// Board column order: Pending, Not Started, Completed, then anything else.
    pub fn board_rank(&self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::NotStarted => 1,
            Self::Completed => 2,
            Self::Other(_) => 3,
        }
    }
}

impl From<String> for TaskStatus {
    fn from(s: String) -> Self {
        Self::parse_known(&s).unwrap_or(Self::Other(s))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TaskPriority {
    High,
    Medium,
    Low,
    Other(String),
}

impl TaskPriority {
    pub const KNOWN: [TaskPriority; 3] = [Self::High, Self::Medium, Self::Low];

    pub fn as_str(&self) -> &str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
            Self::Other(s) => s,
        }
    }

    pub fn parse_known(s: &str) -> Option<Self> {
        match s {
            "High" => Some(Self::High),
            "Medium" => Some(Self::Medium),
            "Low" => Some(Self::Low),
            _ => None,
        }
    }
}

impl From<String> for TaskPriority {
    fn from(s: String) -> Self {
        Self::parse_known(&s).unwrap_or(Self::Other(s))
    }
}

macro_rules! str_enum_impls {
    ($ty:ty) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }
    };
}

str_enum_impls!(TaskStatus);
str_enum_impls!(TaskPriority);

/// A task as served to the board. Field names follow the table's column names.
#[derive(Debug, Clone, Serialize)]
pub struct Task {
    #[serde(rename = "TaskID")]
    pub task_id: i64,
    pub user_id: String,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Description")]
    pub description: Option<String>,
    #[serde(rename = "Status")]
    pub status: TaskStatus,
    #[serde(rename = "Priority")]
    pub priority: TaskPriority,
    #[serde(rename = "DueDate")]
    pub due_date: Option<String>,
    #[serde(rename = "CreatedAt", with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Task {
    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }
}

impl From<TaskRow> for Task {
    fn from(r: TaskRow) -> Self {
        Self {
            task_id: r.task_id,
            user_id: r.user_id,
            title: r.title,
            description: r.description,
            status: r.status.into(),
            priority: r.priority.into(),
            due_date: r.due_date,
            created_at: r.created_at,
        }
    }
}

/// Validated partial update. At least one field is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskPatch {
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        self.status.as_ref().map_or(true, |s| *s == task.status)
            && self.priority.as_ref().map_or(true, |p| *p == task.priority)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_values_round_trip_through_strings() {
        for s in TaskStatus::KNOWN {
            assert_eq!(TaskStatus::from(s.as_str().to_string()), s);
        }
        for p in TaskPriority::KNOWN {
            assert_eq!(TaskPriority::from(p.as_str().to_string()), p);
        }
    }

    #[test]
    fn unknown_values_are_kept_literally() {
        let s = TaskStatus::from("Archived".to_string());
        assert_eq!(s, TaskStatus::Other("Archived".into()));
        assert_eq!(s.as_str(), "Archived");
        assert!(TaskStatus::parse_known("Archived").is_none());
        assert!(TaskStatus::parse_known("pending").is_none());
        assert_eq!(
            TaskPriority::from("Urgent".to_string()),
            TaskPriority::Other("Urgent".into())
        );
    }

    #[test]
    fn board_rank_order() {
        assert!(TaskStatus::Pending.board_rank() < TaskStatus::NotStarted.board_rank());
        assert!(TaskStatus::NotStarted.board_rank() < TaskStatus::Completed.board_rank());
        assert!(TaskStatus::Completed.board_rank() < TaskStatus::Other("x".into()).board_rank());
    }

    #[test]
    fn task_serializes_with_column_names() {
        let task = Task::from(TaskRow {
            task_id: 7,
            user_id: "u1".into(),
            title: "Ship it".into(),
            description: None,
            status: "Not Started".into(),
            priority: "High".into(),
            due_date: Some("2026-10-20".into()),
            created_at: time::macros::datetime!(2026-10-01 08:00 UTC),
        });
        let v = serde_json::to_value(&task).unwrap();
        assert_eq!(v["TaskID"], 7);
        assert_eq!(v["Status"], "Not Started");
        assert_eq!(v["Priority"], "High");
        assert_eq!(v["DueDate"], "2026-10-20");
        assert_eq!(v["CreatedAt"], "2026-10-01T08:00:00Z");
    }

    #[test]
    fn filter_matches_on_both_fields() {
        let task = Task::from(TaskRow {
            task_id: 1,
            user_id: "u1".into(),
            title: "t".into(),
            description: None,
            status: "Pending".into(),
            priority: "Low".into(),
            due_date: None,
            created_at: OffsetDateTime::UNIX_EPOCH,
        });
        assert!(TaskFilter::default().matches(&task));
        assert!(TaskFilter {
            status: Some(TaskStatus::Pending),
            priority: Some(TaskPriority::Low),
        }
        .matches(&task));
        assert!(!TaskFilter {
            status: None,
            priority: Some(TaskPriority::High),
        }
        .matches(&task));
    }
}
