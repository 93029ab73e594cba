use lazy_static::lazy_static;
use regex::Regex;
use tracing::info;

use super::dto::RegisterRequest;
use super::repo::UserRepository;
use super::repo_types::{GoogleProfile, User};
use crate::error::{AppError, AppResult};

pub const MIN_PASSWORD_LEN: usize = 8;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Registration fields after validation; email normalized, name trimmed.
#[derive(Debug, PartialEq, Eq)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
}

pub fn validate_registration(req: RegisterRequest) -> AppResult<Registration> {
    let name = req.name.map(|n| n.trim().to_string()).unwrap_or_default();
    let email = req.email.as_deref().map(normalize_email).unwrap_or_default();
    let password = req.password.unwrap_or_default();

    if name.is_empty() || email.is_empty() || password.is_empty() {
        return Err(AppError::validation("Name, email and password are required"));
    }
    if !is_valid_email(&email) {
        return Err(AppError::validation("Invalid email"));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    Ok(Registration {
        name,
        email,
        password,
    })
}

/// Account for a verified Google profile. Known `sub` refreshes that account; otherwise an
/// account already holding the email is linked; otherwise a new account is created.
pub async fn resolve_google_user(
    users: &dyn UserRepository,
    profile: &GoogleProfile,
) -> AppResult<User> {
    if let Some(existing) = users.find_by_id(&profile.sub).await? {
        // the new email may already belong to a different account; keep the old one then
        let email_free = match users.find_by_email(&profile.email).await? {
            Some(holder) => holder.user_id == existing.user_id,
            None => true,
        };
        return users
            .refresh_google_profile(&existing.user_id, profile, email_free)
            .await;
    }

    if let Some(holder) = users.find_by_email(&profile.email).await? {
        info!(user_id = %holder.user_id, sub = %profile.sub, "linking google sign-in by email");
        return users
            .refresh_google_profile(&holder.user_id, profile, false)
            .await;
    }

    users.create_google(profile).await
}
