use async_trait::async_trait;
use sqlx::PgPool;

use crate::auth::repo_types::{GoogleProfile, NewUser, User};
use crate::error::{AppError, AppResult};

/// Access to the `task_users` table.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, user_id: &str) -> AppResult<Option<User>>;

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Insert a password account. A taken email surfaces as `AppError::DuplicateEmail`.
    async fn create(&self, new_user: &NewUser) -> AppResult<User>;

    /// Insert a Google account keyed by `sub`. A taken email surfaces as `AppError::DuplicateEmail`.
    async fn create_google(&self, profile: &GoogleProfile) -> AppResult<User>;

    /// Refresh name and picture from Google; the email too when `update_email` is set.
    async fn refresh_google_profile(
        &self,
        user_id: &str,
        profile: &GoogleProfile,
        update_email: bool,
    ) -> AppResult<User>;
}

#[derive(Clone)]
pub struct PgUserRepository {
    db: PgPool,
}

impl PgUserRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, user_id: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT user_id, name, email, picture, password, created_at
            FROM task_users
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT user_id, name, email, picture, password, created_at
            FROM task_users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn create(&self, new_user: &NewUser) -> AppResult<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO task_users (user_id, name, email, password)
            VALUES ($1, $2, $3, $4)
            RETURNING user_id, name, email, picture, password, created_at
            "#,
        )
        .bind(&new_user.user_id)
        .bind(&new_user.name)
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .fetch_one(&self.db)
        .await?;
        Ok(user)
    }

    async fn create_google(&self, profile: &GoogleProfile) -> AppResult<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO task_users (user_id, name, email, picture)
            VALUES ($1, $2, $3, $4)
            RETURNING user_id, name, email, picture, password, created_at
            "#,
        )
        .bind(&profile.sub)
        .bind(&profile.name)
        .bind(&profile.email)
        .bind(&profile.picture)
        .fetch_one(&self.db)
        .await?;
        Ok(user)
    }

    async fn refresh_google_profile(
        &self,
        user_id: &str,
        profile: &GoogleProfile,
        update_email: bool,
    ) -> AppResult<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE task_users
               SET name = $2,
                   picture = COALESCE($3, picture),
                   email = COALESCE($4, email)
             WHERE user_id = $1
            RETURNING user_id, name, email, picture, password, created_at
            "#,
        )
        .bind(user_id)
        .bind(&profile.name)
        .bind(&profile.picture)
        .bind(update_email.then_some(profile.email.as_str()))
        .fetch_optional(&self.db)
        .await?;
        user.ok_or(AppError::NotFound("User"))
    }
}
