use crate::state::AppState;
use axum::{routing::post, Router};

pub mod handlers;
pub mod relay;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/chat", post(handlers::chat))
}
