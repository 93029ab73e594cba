use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::{cookie::CookieJar, WithRejection};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{
        dto::{
            AuthResponse, CheckAuthResponse, GoogleLoginRequest, LoginRequest, LogoutResponse,
            RegisterRequest, RegisterResponse,
        },
        extractors::{expired_session_cookie, session_cookie, AuthUser},
        password::{check_credentials, hash_password},
        repo_types::{NewUser, PublicUser},
        services::{normalize_email, resolve_google_user, validate_registration},
        session::SESSION_COOKIE,
    },
    error::{AppError, AppResult},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/google", post(google_login))
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/auth/logout", post(logout))
}

pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/api/check-auth", get(check_auth))
        .route("/api/me", get(get_me))
}

fn issue_session(state: &AppState, jar: CookieJar, user_id: &str) -> AppResult<CookieJar> {
    let token = state.sessions.sign(user_id).map_err(|e| {
        error!(error = %e, "session sign failed");
        AppError::Store(e)
    })?;
    Ok(jar.add(session_cookie(token, &state.sessions, state.config.production)))
}

#[instrument(skip(state, jar, payload))]
pub async fn google_login(
    State(state): State<AppState>,
    jar: CookieJar,
    WithRejection(Json(payload), _): WithRejection<Json<GoogleLoginRequest>, AppError>,
) -> AppResult<(CookieJar, Json<AuthResponse>)> {
    let id_token = payload
        .id_token
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| AppError::validation("id_token is required"))?;

    let profile = state.google.verify(&id_token).await?;
    let user = resolve_google_user(state.users.as_ref(), &profile).await?;

    let jar = issue_session(&state, jar, &user.user_id)?;
    info!(user_id = %user.user_id, "google login");
    Ok((
        jar,
        Json(AuthResponse {
            success: true,
            user: user.into(),
        }),
    ))
}

#[instrument(skip(state, jar, payload))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    WithRejection(Json(payload), _): WithRejection<Json<LoginRequest>, AppError>,
) -> AppResult<(CookieJar, Json<AuthResponse>)> {
    let (Some(email), Some(password)) = (payload.email, payload.password) else {
        return Err(AppError::validation("Email and password are required"));
    };
    let email = normalize_email(&email);

    let Some(user) = state.users.find_by_email(&email).await? else {
        warn!(%email, "login unknown email");
        return Err(AppError::InvalidCredentials);
    };

    check_credentials(&password, user.password.as_deref()).inspect_err(|_| {
        warn!(user_id = %user.user_id, "login rejected");
    })?;

    let jar = issue_session(&state, jar, &user.user_id)?;
    info!(user_id = %user.user_id, "user logged in");
    Ok((
        jar,
        Json(AuthResponse {
            success: true,
            user: user.into(),
        }),
    ))
}

#[instrument(skip(state, jar, payload))]
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    WithRejection(Json(payload), _): WithRejection<Json<RegisterRequest>, AppError>,
) -> AppResult<(CookieJar, Json<RegisterResponse>)> {
    let reg = validate_registration(payload)?;

    if state.users.find_by_email(&reg.email).await?.is_some() {
        warn!(email = %reg.email, "email already registered");
        return Err(AppError::DuplicateEmail);
    }

    let password_hash = hash_password(&reg.password)?;
    let user = state
        .users
        .create(&NewUser {
            user_id: Uuid::new_v4().to_string(),
            name: reg.name,
            email: reg.email,
            password_hash,
        })
        .await?;

    let jar = issue_session(&state, jar, &user.user_id)?;
    info!(user_id = %user.user_id, email = %user.email, "user registered");
    Ok((
        jar,
        Json(RegisterResponse {
            success: true,
            user_id: user.user_id.clone(),
            user: user.into(),
        }),
    ))
}

#[instrument(skip_all)]
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, Json<LogoutResponse>) {
    (
        jar.add(expired_session_cookie(state.config.production)),
        Json(LogoutResponse { success: true }),
    )
}

#[instrument(skip_all)]
pub async fn check_auth(State(state): State<AppState>, jar: CookieJar) -> Json<CheckAuthResponse> {
    let user_id = jar
        .get(SESSION_COOKIE)
        .and_then(|c| state.sessions.verify(c.value()).ok())
        .map(|claims| claims.sub);

    Json(CheckAuthResponse {
        authenticated: user_id.is_some(),
        user_id,
    })
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<PublicUser>> {
    let user = state.users.find_by_id(&user_id).await?.ok_or_else(|| {
        warn!(%user_id, "session user no longer exists");
        AppError::Unauthenticated
    })?;
    Ok(Json(user.into()))
}
