use async_trait::async_trait;
use sqlx::PgPool;

use super::repo_types::{Task, TaskFilter, TaskPatch, TaskRow};
use crate::error::AppResult;

/// Access to the `ai_task_manager` table. Every call is scoped to the owning user.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    async fn list_by_user(&self, user_id: &str, filter: &TaskFilter) -> AppResult<Vec<Task>>;

    /// Returns `false` when no row matches `(task_id, user_id)`.
    async fn update(&self, user_id: &str, task_id: i64, patch: &TaskPatch) -> AppResult<bool>;

    /// Returns `false` when no row matches `(task_id, user_id)`.
    async fn delete(&self, user_id: &str, task_id: i64) -> AppResult<bool>;
}

#[derive(Clone)]
pub struct PgTaskRepository {
    db: PgPool,
}

impl PgTaskRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TaskRepository for PgTaskRepository {
    async fn list_by_user(&self, user_id: &str, filter: &TaskFilter) -> AppResult<Vec<Task>> {
        let rows = sqlx::query_as::<_, TaskRow>(
            r#"
            SELECT "TaskID", user_id, "Title", "Description", "Status", "Priority",
                   "DueDate", "CreatedAt"
              FROM ai_task_manager
             WHERE user_id = $1
               AND ($2::text IS NULL OR "Status" = $2)
               AND ($3::text IS NULL OR "Priority" = $3)
            "#,
        )
        .bind(user_id)
        .bind(filter.status.as_ref().map(|s| s.as_str()))
        .bind(filter.priority.as_ref().map(|p| p.as_str()))
        .fetch_all(&self.db)
        .await?;
        Ok(rows.into_iter().map(Task::from).collect())
    }

    async fn update(&self, user_id: &str, task_id: i64, patch: &TaskPatch) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE ai_task_manager
               SET "Status" = COALESCE($1, "Status"),
                   "Priority" = COALESCE($2, "Priority")
             WHERE "TaskID" = $3 AND user_id = $4
            "#,
        )
        .bind(patch.status.as_ref().map(|s| s.as_str()))
        .bind(patch.priority.as_ref().map(|p| p.as_str()))
        .bind(task_id)
        .bind(user_id)
        .execute(&self.db)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, user_id: &str, task_id: i64) -> AppResult<bool> {
        let result = sqlx::query(r#"DELETE FROM ai_task_manager WHERE "TaskID" = $1 AND user_id = $2"#)
            .bind(task_id)
            .bind(user_id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
