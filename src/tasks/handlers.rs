use axum::{
    extract::{Path, Query, State},
    routing::{get, put},
    Json, Router,
};
use axum_extra::extract::WithRejection;
use time::OffsetDateTime;
use tracing::{info, instrument, warn};

use super::{
    dto::{SuccessResponse, TaskQuery, UpdateTaskRequest},
    repo_types::{Task, TaskFilter, TaskStatus},
    services::{filter_from_query, sort_for_board, validate_patch},
    stats::{compute_notifications, compute_stats, Notification, TaskStats},
};
use crate::{
    auth::extractors::AuthUser,
    error::{AppError, AppResult},
    state::AppState,
};

pub fn task_routes() -> Router<AppState> {
    Router::new()
        .route("/api/tasks", get(list_tasks))
        .route("/api/tasks/status/:status", get(list_tasks_by_status))
        .route("/api/tasks/:id", put(update_task).delete(delete_task))
}

pub fn dashboard_routes() -> Router<AppState> {
    Router::new()
        .route("/api/task-stats", get(task_stats))
        .route("/api/notifications", get(notifications))
}

async fn load_board(state: &AppState, user_id: &str, filter: &TaskFilter) -> AppResult<Vec<Task>> {
    let mut tasks = state.tasks.list_by_user(user_id, filter).await?;
    sort_for_board(&mut tasks);
    Ok(tasks)
}

fn today_utc() -> time::Date {
    OffsetDateTime::now_utc().date()
}

#[instrument(skip(state))]
pub async fn list_tasks(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    WithRejection(Query(q), _): WithRejection<Query<TaskQuery>, AppError>,
) -> AppResult<Json<Vec<Task>>> {
    let tasks = load_board(&state, &user_id, &filter_from_query(q)).await?;
    Ok(Json(tasks))
}

#[instrument(skip(state))]
pub async fn list_tasks_by_status(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    WithRejection(Path(status), _): WithRejection<Path<String>, AppError>,
) -> AppResult<Json<Vec<Task>>> {
    let filter = TaskFilter {
        status: Some(TaskStatus::from(status)),
        priority: None,
    };
    let tasks = load_board(&state, &user_id, &filter).await?;
    Ok(Json(tasks))
}

#[instrument(skip(state, payload))]
pub async fn update_task(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    WithRejection(Path(task_id), _): WithRejection<Path<i64>, AppError>,
    WithRejection(Json(payload), _): WithRejection<Json<UpdateTaskRequest>, AppError>,
) -> AppResult<Json<SuccessResponse>> {
    let patch = validate_patch(payload)?;

    if !state.tasks.update(&user_id, task_id, &patch).await? {
        warn!(%user_id, task_id, "update on missing or foreign task");
        return Err(AppError::NotFound("Task"));
    }

    info!(%user_id, task_id, status = ?patch.status, priority = ?patch.priority, "task updated");
    Ok(Json(SuccessResponse { success: true }))
}

#[instrument(skip(state))]
pub async fn delete_task(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    WithRejection(Path(task_id), _): WithRejection<Path<i64>, AppError>,
) -> AppResult<Json<SuccessResponse>> {
    if !state.tasks.delete(&user_id, task_id).await? {
        warn!(%user_id, task_id, "delete on missing or foreign task");
        return Err(AppError::NotFound("Task"));
    }

    info!(%user_id, task_id, "task deleted");
    Ok(Json(SuccessResponse { success: true }))
}

#[instrument(skip(state))]
pub async fn task_stats(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<TaskStats>> {
    let tasks = state.tasks.list_by_user(&user_id, &TaskFilter::default()).await?;
    Ok(Json(compute_stats(&tasks, today_utc())))
}

#[instrument(skip(state))]
pub async fn notifications(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<Vec<Notification>>> {
    let tasks = state.tasks.list_by_user(&user_id, &TaskFilter::default()).await?;
    Ok(Json(compute_notifications(&tasks, today_utc())))
}
