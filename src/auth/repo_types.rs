use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

/// Row of the `task_users` table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub picture: Option<String>,
    #[serde(skip_serializing)]
    pub password: Option<String>, // Argon2 hash, NULL for Google-only accounts
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

/// Profile claims taken from a verified Google ID token.
#[derive(Debug, Clone)]
pub struct GoogleProfile {
    pub sub: String,
    pub name: String,
    pub email: String,
    pub picture: Option<String>,
}

/// Public part of the user returned to the client.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PublicUser {
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub picture: Option<String>,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            user_id: u.user_id,
            name: u.name,
            email: u.email,
            picture: u.picture,
        }
    }
}
