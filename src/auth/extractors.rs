use std::collections::HashMap;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts, Query},
    http::request::Parts,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use tracing::warn;

use super::session::{SessionKeys, SESSION_COOKIE};
use crate::error::AppError;

/// Identity of the caller, resolved from a verified session token.
#[derive(Debug, Clone)]
pub struct AuthUser(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    SessionKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = SessionKeys::from_ref(state);
        let token = session_token(parts).ok_or(AppError::Unauthenticated)?;

        let claims = keys.verify(&token).map_err(|e| {
            warn!(error = %e, "invalid or expired session");
            AppError::Unauthenticated
        })?;

        Ok(AuthUser(claims.sub))
    }
}

/// Cookie first; then `Authorization: Bearer`, then `?user_id=` for older clients.
fn session_token(parts: &Parts) -> Option<String> {
    let jar = CookieJar::from_headers(&parts.headers);
    if let Some(c) = jar.get(SESSION_COOKIE) {
        if !c.value().is_empty() {
            return Some(c.value().to_string());
        }
    }

    let bearer = parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer ").or_else(|| h.strip_prefix("bearer ")));
    if let Some(token) = bearer {
        return Some(token.trim().to_string());
    }

    Query::<HashMap<String, String>>::try_from_uri(&parts.uri)
        .ok()
        .and_then(|Query(mut q)| q.remove(SESSION_COOKIE))
        .filter(|v| !v.is_empty())
}

pub fn session_cookie(token: String, keys: &SessionKeys, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(keys.ttl())
        .build()
}

pub fn expired_session_cookie(secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::ZERO)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(req: Request<()>) -> Parts {
        req.into_parts().0
    }

    #[test]
    fn prefers_cookie_over_other_sources() {
        let p = parts(
            Request::builder()
                .uri("/api/tasks?user_id=from-query")
                .header("cookie", "theme=dark; user_id=from-cookie")
                .header("authorization", "Bearer from-header")
                .body(())
                .unwrap(),
        );
        assert_eq!(session_token(&p).as_deref(), Some("from-cookie"));
    }

    #[test]
    fn falls_back_to_bearer_then_query() {
        let p = parts(
            Request::builder()
                .uri("/api/tasks?user_id=from-query")
                .header("authorization", "Bearer from-header")
                .body(())
                .unwrap(),
        );
        assert_eq!(session_token(&p).as_deref(), Some("from-header"));

        let p = parts(
            Request::builder()
                .uri("/api/tasks?user_id=from-query")
                .body(())
                .unwrap(),
        );
        assert_eq!(session_token(&p).as_deref(), Some("from-query"));
    }

    #[test]
    fn no_source_yields_none() {
        let p = parts(Request::builder().uri("/api/tasks").body(()).unwrap());
        assert!(session_token(&p).is_none());
    }

    #[test]
    fn expired_cookie_clears_session() {
        let c = expired_session_cookie(true).to_string();
        assert!(c.starts_with("user_id=;"));
        assert!(c.contains("Max-Age=0"));
        assert!(c.contains("HttpOnly"));
        assert!(c.contains("Secure"));
    }
}
