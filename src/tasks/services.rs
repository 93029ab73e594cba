use std::cmp::Ordering;

use time::OffsetDateTime;

use super::dto::{TaskQuery, UpdateTaskRequest};
use super::repo_types::{Task, TaskFilter, TaskPatch, TaskPriority, TaskStatus};
use super::stats::parse_due;
use crate::error::{AppError, AppResult};

/// Board order: status precedence, then due date ascending with missing dates last, then id.
pub fn sort_for_board(tasks: &mut [Task]) {
    fn due_key(t: &Task) -> Option<OffsetDateTime> {
        t.due_date.as_deref().and_then(parse_due)
    }

    tasks.sort_by(|a, b| {
        a.status
            .board_rank()
            .cmp(&b.status.board_rank())
            .then_with(|| match (due_key(a), due_key(b)) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            })
            .then_with(|| a.task_id.cmp(&b.task_id))
    });
}

/// Unknown status or priority values are rejected here; only the enumerated sets are written.
pub fn validate_patch(req: UpdateTaskRequest) -> AppResult<TaskPatch> {
    if req.status.is_none() && req.priority.is_none() {
        return Err(AppError::validation("Status or Priority is required"));
    }

    let status = req
        .status
        .map(|s| {
            TaskStatus::parse_known(s.trim())
                .ok_or_else(|| AppError::validation(format!("Invalid status '{s}'")))
        })
        .transpose()?;
    let priority = req
        .priority
        .map(|p| {
            TaskPriority::parse_known(p.trim())
                .ok_or_else(|| AppError::validation(format!("Invalid priority '{p}'")))
        })
        .transpose()?;

    Ok(TaskPatch { status, priority })
}

/// Filters are matched literally, so tasks carrying an unknown value can still be listed.
pub fn filter_from_query(q: TaskQuery) -> TaskFilter {
    TaskFilter {
        status: q.status.filter(|s| !s.is_empty()).map(TaskStatus::from),
        priority: q.priority.filter(|p| !p.is_empty()).map(TaskPriority::from),
    }
}
