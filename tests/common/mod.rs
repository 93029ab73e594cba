#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, Response},
    Router,
};
use http_body_util::BodyExt;
use time::{Date, Duration, OffsetDateTime};
use tower::ServiceExt;

use taskboard::{
    app::build_app,
    auth::{
        repo::UserRepository,
        repo_types::{GoogleProfile, NewUser, User},
    },
    config::{AppConfig, ChatConfig, GoogleConfig, SessionConfig},
    error::{AppError, AppResult},
    state::AppState,
    tasks::{
        repo::TaskRepository,
        repo_types::{Task, TaskFilter, TaskPatch},
    },
};

pub const TEST_CLIENT_ID: &str = "test-client.apps.googleusercontent.com";

#[derive(Default)]
pub struct MemoryUsers {
    users: Mutex<Vec<User>>,
}

#[async_trait]
impl UserRepository for MemoryUsers {
    async fn find_by_id(&self, user_id: &str) -> AppResult<Option<User>> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.user_id == user_id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn create(&self, new_user: &NewUser) -> AppResult<User> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email == new_user.email) {
            return Err(AppError::DuplicateEmail);
        }
        let user = User {
            user_id: new_user.user_id.clone(),
            name: new_user.name.clone(),
            email: new_user.email.clone(),
            picture: None,
            password: Some(new_user.password_hash.clone()),
            created_at: OffsetDateTime::now_utc(),
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn create_google(&self, profile: &GoogleProfile) -> AppResult<User> {
        let mut users = self.users.lock().unwrap();
        // same unique constraint as task_users.email
        if users.iter().any(|u| u.email == profile.email) {
            return Err(AppError::DuplicateEmail);
        }
        let user = User {
            user_id: profile.sub.clone(),
            name: profile.name.clone(),
            email: profile.email.clone(),
            picture: profile.picture.clone(),
            password: None,
            created_at: OffsetDateTime::now_utc(),
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn refresh_google_profile(
        &self,
        user_id: &str,
        profile: &GoogleProfile,
        update_email: bool,
    ) -> AppResult<User> {
        let mut users = self.users.lock().unwrap();
        if update_email
            && users
                .iter()
                .any(|u| u.email == profile.email && u.user_id != user_id)
        {
            return Err(AppError::DuplicateEmail);
        }
        let user = users
            .iter_mut()
            .find(|u| u.user_id == user_id)
            .ok_or(AppError::NotFound("User"))?;
        user.name = profile.name.clone();
        if profile.picture.is_some() {
            user.picture = profile.picture.clone();
        }
        if update_email {
            user.email = profile.email.clone();
        }
        Ok(user.clone())
    }
}

#[derive(Default)]
pub struct MemoryTasks {
    tasks: Mutex<Vec<Task>>,
}

impl MemoryTasks {
    pub fn seed(
        &self,
        user_id: &str,
        title: &str,
        status: &str,
        priority: &str,
        due: Option<&str>,
    ) -> i64 {
        let mut tasks = self.tasks.lock().unwrap();
        let task_id = tasks.len() as i64 + 1;
        tasks.push(Task {
            task_id,
            user_id: user_id.into(),
            title: title.into(),
            description: None,
            status: status.to_string().into(),
            priority: priority.to_string().into(),
            due_date: due.map(str::to_string),
            created_at: OffsetDateTime::now_utc(),
        });
        task_id
    }

    pub fn get(&self, task_id: i64) -> Option<Task> {
        let tasks = self.tasks.lock().unwrap();
        tasks.iter().find(|t| t.task_id == task_id).cloned()
    }
}

#[async_trait]
impl TaskRepository for MemoryTasks {
    async fn list_by_user(&self, user_id: &str, filter: &TaskFilter) -> AppResult<Vec<Task>> {
        let tasks = self.tasks.lock().unwrap();
        Ok(tasks
            .iter()
            .filter(|t| t.user_id == user_id && filter.matches(t))
            .cloned()
            .collect())
    }

    async fn update(&self, user_id: &str, task_id: i64, patch: &TaskPatch) -> AppResult<bool> {
        let mut tasks = self.tasks.lock().unwrap();
        let Some(task) = tasks
            .iter_mut()
            .find(|t| t.task_id == task_id && t.user_id == user_id)
        else {
            return Ok(false);
        };
        if let Some(status) = &patch.status {
            task.status = status.clone();
        }
        if let Some(priority) = &patch.priority {
            task.priority = priority.clone();
        }
        Ok(true)
    }

    async fn delete(&self, user_id: &str, task_id: i64) -> AppResult<bool> {
        let mut tasks = self.tasks.lock().unwrap();
        let before = tasks.len();
        tasks.retain(|t| !(t.task_id == task_id && t.user_id == user_id));
        Ok(tasks.len() < before)
    }
}

pub struct TestApp {
    pub state: AppState,
    pub router: Router,
    pub tasks: Arc<MemoryTasks>,
    pub users: Arc<MemoryUsers>,
}

pub fn test_config(tokeninfo_url: Option<String>, chat_url: Option<String>) -> AppConfig {
    AppConfig {
        database_url: "postgres://unused@localhost/unused".into(),
        database_max_connections: 1,
        session: SessionConfig {
            secret: "test-secret".into(),
            issuer: "taskboard".into(),
            audience: "taskboard-web".into(),
            ttl_days: 7,
        },
        google: GoogleConfig {
            client_id: Some(TEST_CLIENT_ID.into()),
            tokeninfo_url: tokeninfo_url.unwrap_or_else(|| "http://127.0.0.1:9/tokeninfo".into()),
        },
        chat: ChatConfig {
            webhook_url: chat_url,
            timeout_secs: 1,
        },
        frontend_origin: None,
        production: false,
    }
}

pub fn test_app_with(config: AppConfig) -> TestApp {
    let tasks = Arc::new(MemoryTasks::default());
    let users = Arc::new(MemoryUsers::default());
    let state = AppState::from_parts(
        Arc::new(config),
        tasks.clone() as Arc<dyn TaskRepository>,
        users.clone() as Arc<dyn UserRepository>,
    )
    .expect("state builds");
    TestApp {
        router: build_app(state.clone()),
        state,
        tasks,
        users,
    }
}

pub fn test_app() -> TestApp {
    test_app_with(test_config(None, None))
}

impl TestApp {
    pub async fn send(&self, req: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(req).await.unwrap()
    }

    /// `Cookie` header value carrying a valid session for `user_id`.
    pub fn cookie_for(&self, user_id: &str) -> String {
        format!("user_id={}", self.state.sessions.sign(user_id).unwrap())
    }
}

pub fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn authed(method: &str, uri: &str, cookie: &str, body: Option<serde_json::Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::COOKIE, cookie);
    match body {
        Some(b) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(b.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn body_json(res: Response<Body>) -> serde_json::Value {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// The `Set-Cookie` header for the session cookie, if the response set one.
pub fn session_set_cookie(res: &Response<Body>) -> Option<String> {
    res.headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("user_id="))
        .map(str::to_string)
}

/// Turn a `Set-Cookie` value into the `Cookie` header a browser would send back.
pub fn cookie_pair(set_cookie: &str) -> String {
    set_cookie.split(';').next().unwrap_or_default().to_string()
}

pub fn today() -> Date {
    OffsetDateTime::now_utc().date()
}

pub fn day(offset: i64) -> String {
    (today() + Duration::days(offset)).to_string()
}

/// Serve `router` on an ephemeral local port and return its base URL.
pub async fn spawn_server(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}
