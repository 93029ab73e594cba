use anyhow::Context;
use serde::Deserialize;

pub const DEFAULT_TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_days: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GoogleConfig {
    /// When set, the `aud` claim of every ID token must match it.
    pub client_id: Option<String>,
    pub tokeninfo_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatConfig {
    pub webhook_url: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    pub session: SessionConfig,
    pub google: GoogleConfig,
    pub chat: ChatConfig,
    pub frontend_origin: Option<String>,
    /// Production turns on the `Secure` cookie attribute.
    pub production: bool,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let database_max_connections = parse_or("DATABASE_MAX_CONNECTIONS", 10);

        let session = SessionConfig {
            secret: std::env::var("SESSION_SECRET").context("SESSION_SECRET is not set")?,
            issuer: std::env::var("SESSION_ISSUER").unwrap_or_else(|_| "taskboard".into()),
            audience: std::env::var("SESSION_AUDIENCE")
                .unwrap_or_else(|_| "taskboard-web".into()),
            ttl_days: session_ttl_days(parse_or("SESSION_TTL_DAYS", 7))?,
        };

        let google = GoogleConfig {
            client_id: non_empty("GOOGLE_CLIENT_ID"),
            tokeninfo_url: non_empty("GOOGLE_TOKENINFO_URL")
                .unwrap_or_else(|| DEFAULT_TOKENINFO_URL.into()),
        };

        let chat = ChatConfig {
            webhook_url: non_empty("CHAT_WEBHOOK_URL"),
            timeout_secs: parse_or("CHAT_TIMEOUT_SECS", 10),
        };

        let production = std::env::var("APP_ENV")
            .map(|v| v.eq_ignore_ascii_case("production"))
            .unwrap_or(false);

        Ok(Self {
            database_url,
            database_max_connections,
            session,
            google,
            chat,
            frontend_origin: non_empty("FRONTEND_ORIGIN"),
            production,
        })
    }
}

pub const MAX_SESSION_TTL_DAYS: i64 = 365;

fn session_ttl_days(days: i64) -> anyhow::Result<i64> {
    anyhow::ensure!(
        (1..=MAX_SESSION_TTL_DAYS).contains(&days),
        "SESSION_TTL_DAYS must be between 1 and {MAX_SESSION_TTL_DAYS}, got {days}"
    );
    Ok(days)
}

fn non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}
