use axum::{extract::State, Json};
use axum_extra::extract::WithRejection;
use serde::Deserialize;
use serde_json::Value;
use tracing::instrument;

use crate::{
    auth::{extractors::AuthUser, repo_types::PublicUser},
    error::{AppError, AppResult},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
}

#[instrument(skip(state, payload))]
pub async fn chat(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    WithRejection(Json(payload), _): WithRejection<Json<ChatRequest>, AppError>,
) -> AppResult<Json<Value>> {
    let user = state.users.find_by_id(&user_id).await?.map(PublicUser::from);
    let reply = state
        .chat
        .relay(&payload.message, &user_id, user.as_ref())
        .await?;
    Ok(Json(reply))
}
