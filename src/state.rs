use std::sync::Arc;

use crate::auth::{
    google::GoogleVerifier,
    repo::{PgUserRepository, UserRepository},
    session::SessionKeys,
};
use crate::chat::relay::ChatRelay;
use crate::config::AppConfig;
use crate::db;
use crate::tasks::repo::{PgTaskRepository, TaskRepository};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub tasks: Arc<dyn TaskRepository>,
    pub users: Arc<dyn UserRepository>,
    pub sessions: SessionKeys,
    pub google: GoogleVerifier,
    pub chat: ChatRelay,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let pool = db::connect(&config).await?;
        db::migrate(&pool).await;

        let tasks = Arc::new(PgTaskRepository::new(pool.clone())) as Arc<dyn TaskRepository>;
        let users = Arc::new(PgUserRepository::new(pool)) as Arc<dyn UserRepository>;

        Self::from_parts(config, tasks, users)
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        tasks: Arc<dyn TaskRepository>,
        users: Arc<dyn UserRepository>,
    ) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            sessions: SessionKeys::new(&config.session),
            google: GoogleVerifier::new(http.clone(), &config.google),
            chat: ChatRelay::new(http, &config.chat),
            config,
            tasks,
            users,
        })
    }
}
