//! Dashboard aggregates and due-date notifications.
//!
//! Everything here is a pure function of a task list and the current UTC date. Due dates are
//! reduced to their UTC calendar day before any subtraction, so time-of-day never shifts
//! `days_remaining`.

use std::collections::BTreeMap;

use serde::Serialize;
use time::{
    format_description::{well_known::Rfc3339, FormatItem},
    macros::format_description,
    Date, OffsetDateTime, PrimitiveDateTime, UtcOffset,
};

use super::repo_types::{Task, TaskPriority, TaskStatus};

/// Non-completed tasks due within this many days count as urgent.
pub const URGENT_WINDOW_DAYS: i64 = 3;
/// Window for `upcomingDeadlines`.
pub const UPCOMING_WINDOW_DAYS: i64 = 7;
/// Notifications cover overdue tasks and those due within this many days.
pub const NOTIFY_WINDOW_DAYS: i64 = 3;

const SQL_DATETIME: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
const SQL_DATETIME_FRAC: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond]");
const ISO_NAIVE: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");
const ISO_NAIVE_FRAC: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]");
const DATE_ONLY: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Parse a stored due date into a UTC instant. Naive values are taken as UTC.
/// Returns `None` for anything unrecognised.
pub fn parse_due(raw: &str) -> Option<OffsetDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = OffsetDateTime::parse(raw, &Rfc3339) {
        // out of range once shifted to UTC
        return dt.checked_to_offset(UtcOffset::UTC);
    }
    for fmt in [SQL_DATETIME, SQL_DATETIME_FRAC, ISO_NAIVE, ISO_NAIVE_FRAC] {
        if let Ok(dt) = PrimitiveDateTime::parse(raw, fmt) {
            return Some(dt.assume_utc());
        }
    }
    Date::parse(raw, DATE_ONLY)
        .ok()
        .map(|d| d.midnight().assume_utc())
}

/// Whole days from `today` to the task's due day; `None` when there is no usable due date.
pub fn days_remaining(task: &Task, today: Date) -> Option<i64> {
    let due = parse_due(task.due_date.as_deref()?)?;
    Some((due.date() - today).whole_days())
}

#[derive(Debug, Clone, Serialize)]
pub struct UpcomingDeadline {
    #[serde(flatten)]
    pub task: Task,
    pub days_remaining: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStats {
    pub by_status: BTreeMap<String, u64>,
    pub by_priority: BTreeMap<String, u64>,
    pub total: u64,
    pub urgent: u64,
    pub upcoming_deadlines: Vec<UpcomingDeadline>,
}

pub fn compute_stats(tasks: &[Task], today: Date) -> TaskStats {
    let mut by_status: BTreeMap<String, u64> = TaskStatus::KNOWN
        .iter()
        .map(|s| (s.as_str().to_string(), 0))
        .collect();
    let mut by_priority: BTreeMap<String, u64> = TaskPriority::KNOWN
        .iter()
        .map(|p| (p.as_str().to_string(), 0))
        .collect();
    let mut urgent = 0;
    let mut upcoming = Vec::new();

    for task in tasks {
        *by_status.entry(task.status.as_str().to_string()).or_default() += 1;
        *by_priority.entry(task.priority.as_str().to_string()).or_default() += 1;

        if task.is_completed() {
            continue;
        }
        let Some(days) = days_remaining(task, today) else {
            continue;
        };
        if (0..=URGENT_WINDOW_DAYS).contains(&days) {
            urgent += 1;
        }
        if (0..=UPCOMING_WINDOW_DAYS).contains(&days) {
            upcoming.push(UpcomingDeadline {
                task: task.clone(),
                days_remaining: days,
            });
        }
    }

    upcoming.sort_by_key(|u| (u.days_remaining, u.task.task_id));

    TaskStats {
        by_status,
        by_priority,
        total: tasks.len() as u64,
        urgent,
        upcoming_deadlines: upcoming,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Urgent,
    Warning,
    Info,
}

impl Severity {
    pub fn for_days(days: i64) -> Self {
        if days < 0 {
            Self::Urgent
        } else if days <= 2 {
            Self::Warning
        } else {
            Self::Info
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    #[serde(rename = "TaskID")]
    pub task_id: i64,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "DueDate")]
    pub due_date: String,
    pub days_remaining: i64,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: Severity,
}

fn notification_message(title: &str, days: i64) -> String {
    match days {
        d if d < -1 => format!("Task \"{title}\" is overdue by {} days", -d),
        -1 => format!("Task \"{title}\" is overdue by 1 day"),
        0 => format!("Task \"{title}\" is due today"),
        1 => format!("Task \"{title}\" is due tomorrow"),
        d => format!("Task \"{title}\" is due in {d} days"),
    }
}

pub fn compute_notifications(tasks: &[Task], today: Date) -> Vec<Notification> {
    let mut due: Vec<(OffsetDateTime, Notification)> = tasks
        .iter()
        .filter(|t| !t.is_completed())
        .filter_map(|t| {
            let raw = t.due_date.as_deref()?;
            let at = parse_due(raw)?;
            let days = (at.date() - today).whole_days();
            (days <= NOTIFY_WINDOW_DAYS).then(|| {
                (
                    at,
                    Notification {
                        task_id: t.task_id,
                        title: t.title.clone(),
                        due_date: raw.to_string(),
                        days_remaining: days,
                        message: notification_message(&t.title, days),
                        kind: Severity::for_days(days),
                    },
                )
            })
        })
        .collect();

    due.sort_by_key(|(at, n)| (*at, n.task_id));
    due.into_iter().map(|(_, n)| n).collect()
}
