use serde::{Deserialize, Serialize};

/// Body of `PUT /api/tasks/:id`.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateTaskRequest {
    #[serde(rename = "Status", default)]
    pub status: Option<String>,
    #[serde(rename = "Priority", default)]
    pub priority: Option<String>,
}

/// Optional filters on `GET /api/tasks`.
#[derive(Debug, Default, Deserialize)]
pub struct TaskQuery {
    pub status: Option<String>,
    pub priority: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}
