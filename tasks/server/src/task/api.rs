use crate::task::{NewTask, Task, TaskChanges, TaskFilter, TaskPage, TaskService, TaskState};
use crate::web::api::{ApiError, ErrorResponse, MessageResponse, ValidationErrors};
use axum::{
    Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, ToSchema};

const TITLE_MAX_CHARS: usize = 200;
const DESCRIPTION_MAX_CHARS: usize = 1000;
const DEFAULT_LIMIT: i64 = 100;
const MAX_LIMIT: i64 = 1000;

/// JSON representation of a Task for API responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TaskJson {
    /// Unique identifier for the task
    pub id: i32,
    /// Task title
    pub title: String,
    /// Task description
    pub description: Option<String>,
    /// Completion status
    pub completed: bool,
    /// When the task was created (UTC)
    pub created_at: DateTime<Utc>,
    /// When the task was last changed (UTC)
    pub updated_at: DateTime<Utc>,
}

impl From<Task> for TaskJson {
    fn from(task: Task) -> Self {
        Self {
            id: task.id(),
            title: task.title().to_string(),
            description: task.description().map(str::to_string),
            completed: task.completed(),
            created_at: task.created_at(),
            updated_at: task.updated_at(),
        }
    }
}

/// API response for listing tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TaskListJson {
    /// The requested page of tasks
    pub items: Vec<TaskJson>,
    /// Number of tasks matching the filter, ignoring pagination
    pub total: u64,
}

impl From<TaskPage> for TaskListJson {
    fn from(page: TaskPage) -> Self {
        Self {
            items: page.items.into_iter().map(TaskJson::from).collect(),
            total: page.total,
        }
    }
}

/// Request body for creating a task.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTaskRequest {
    /// Task title, 1 to 200 characters
    pub title: String,
    /// Task description, at most 1000 characters
    #[serde(default)]
    pub description: Option<String>,
    /// Completion status
    #[serde(default)]
    pub completed: bool,
}

impl CreateTaskRequest {
    pub fn validate(self) -> Result<NewTask, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_title(&mut errors, &self.title);
        if let Some(description) = &self.description {
            check_description(&mut errors, description);
        }
        errors.into_result(NewTask {
            title: self.title,
            description: self.description,
            completed: self.completed,
        })
    }
}

/// Request body for updating a task. Only the fields present are changed.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateTaskRequest {
    /// New title, 1 to 200 characters
    #[serde(default)]
    pub title: Option<String>,
    /// New description; `null` clears it
    #[serde(default, deserialize_with = "present_or_null")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    /// New completion status
    #[serde(default)]
    pub completed: Option<bool>,
}

impl UpdateTaskRequest {
    pub fn validate(self) -> Result<TaskChanges, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Some(title) = &self.title {
            check_title(&mut errors, title);
        }
        if let Some(Some(description)) = &self.description {
            check_description(&mut errors, description);
        }
        errors.into_result(TaskChanges {
            title: self.title,
            description: self.description,
            completed: self.completed,
        })
    }
}

/// Distinguishes an explicit `null` from a missing field.
fn present_or_null<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

/// Accepts the usual spellings of a boolean query flag, ignoring case:
/// `true/false`, `1/0`, `yes/no`, `on/off`, `t/f` and `y/n`.
fn lenient_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" | "t" | "y" => Ok(Some(true)),
        "false" | "0" | "no" | "off" | "f" | "n" => Ok(Some(false)),
        _ => Err(serde::de::Error::custom(format!(
            "invalid boolean value `{}`",
            raw
        ))),
    }
}

/// Query parameters for listing tasks.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListTasksQuery {
    /// Number of records to skip
    #[serde(default)]
    pub skip: Option<i64>,
    /// Maximum number of records to return (1 to 1000)
    #[serde(default)]
    pub limit: Option<i64>,
    /// Filter by completion status
    #[serde(default, deserialize_with = "lenient_bool")]
    pub completed: Option<bool>,
}

impl ListTasksQuery {
    pub fn validate(self) -> Result<TaskFilter, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let skip = self.skip.unwrap_or(0);
        let limit = self.limit.unwrap_or(DEFAULT_LIMIT);
        if skip < 0 {
            errors.add("skip", "must be greater than or equal to 0");
        }
        if !(1..=MAX_LIMIT).contains(&limit) {
            errors.add("limit", format!("must be between 1 and {}", MAX_LIMIT));
        }
        errors.into_result(TaskFilter {
            skip: skip.max(0) as u64,
            limit: limit.clamp(1, MAX_LIMIT) as u64,
            completed: self.completed,
        })
    }
}

fn check_title(errors: &mut ValidationErrors, title: &str) {
    let length = title.chars().count();
    if length == 0 {
        errors.add("title", "must not be empty");
    } else if length > TITLE_MAX_CHARS {
        errors.add(
            "title",
            format!("must be at most {} characters", TITLE_MAX_CHARS),
        );
    }
}

fn check_description(errors: &mut ValidationErrors, description: &str) {
    if description.chars().count() > DESCRIPTION_MAX_CHARS {
        errors.add(
            "description",
            format!("must be at most {} characters", DESCRIPTION_MAX_CHARS),
        );
    }
}

/// Handler for POST /tasks - Creates a task.
#[tracing::instrument(skip(state, payload))]
#[utoipa::path(
    post,
    path = "/tasks",
    request_body = CreateTaskRequest,
    responses(
        (status = 201, description = "Task created", body = TaskJson),
        (status = 422, description = "Invalid request", body = ErrorResponse)
    ),
    tag = "tasks"
)]
pub async fn create_task_handler(
    State(state): State<TaskState>,
    payload: Result<Json<CreateTaskRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<TaskJson>), ApiError> {
    let Json(request) = payload?;
    let new_task = request.validate()?;

    let service = TaskService::new(state.repository.as_ref());
    let task = service.create_task(new_task).await?;
    Ok((StatusCode::CREATED, Json(TaskJson::from(task))))
}

/// Handler for GET /tasks - Lists tasks, newest first.
#[tracing::instrument(skip(state, query))]
#[utoipa::path(
    get,
    path = "/tasks",
    params(ListTasksQuery),
    responses(
        (status = 200, description = "Page of tasks with the filtered total", body = TaskListJson),
        (status = 422, description = "Invalid query parameters", body = ErrorResponse)
    ),
    tag = "tasks"
)]
pub async fn list_tasks_handler(
    State(state): State<TaskState>,
    query: Result<Query<ListTasksQuery>, QueryRejection>,
) -> Result<Json<TaskListJson>, ApiError> {
    let Query(query) = query?;
    let filter = query.validate()?;

    let service = TaskService::new(state.repository.as_ref());
    let page = service.list_tasks(filter).await?;
    Ok(Json(TaskListJson::from(page)))
}

/// Handler for GET /tasks/{task_id} - Returns one task.
#[tracing::instrument(skip(state, path))]
#[utoipa::path(
    get,
    path = "/tasks/{task_id}",
    params(("task_id" = i32, Path, description = "ID of the task")),
    responses(
        (status = 200, description = "The task", body = TaskJson),
        (status = 404, description = "Task not found", body = ErrorResponse)
    ),
    tag = "tasks"
)]
pub async fn get_task_handler(
    State(state): State<TaskState>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<Json<TaskJson>, ApiError> {
    let Path(task_id) = path?;

    let service = TaskService::new(state.repository.as_ref());
    let task = service
        .get_task(task_id)
        .await?
        .ok_or(ApiError::NotFound(task_id))?;
    Ok(Json(TaskJson::from(task)))
}

/// Handler for PUT /tasks/{task_id} - Changes the fields present in the body.
#[tracing::instrument(skip(state, path, payload))]
#[utoipa::path(
    put,
    path = "/tasks/{task_id}",
    params(("task_id" = i32, Path, description = "ID of the task")),
    request_body = UpdateTaskRequest,
    responses(
        (status = 200, description = "The updated task", body = TaskJson),
        (status = 404, description = "Task not found", body = ErrorResponse),
        (status = 422, description = "Invalid request", body = ErrorResponse)
    ),
    tag = "tasks"
)]
pub async fn update_task_handler(
    State(state): State<TaskState>,
    path: Result<Path<i32>, PathRejection>,
    payload: Result<Json<UpdateTaskRequest>, JsonRejection>,
) -> Result<Json<TaskJson>, ApiError> {
    let Path(task_id) = path?;
    let Json(request) = payload?;
    let changes = request.validate()?;

    let service = TaskService::new(state.repository.as_ref());
    let task = service
        .update_task(task_id, changes)
        .await?
        .ok_or(ApiError::NotFound(task_id))?;
    Ok(Json(TaskJson::from(task)))
}

/// Handler for DELETE /tasks/{task_id} - Permanently removes a task.
#[tracing::instrument(skip(state, path))]
#[utoipa::path(
    delete,
    path = "/tasks/{task_id}",
    params(("task_id" = i32, Path, description = "ID of the task")),
    responses(
        (status = 200, description = "Task deleted", body = MessageResponse),
        (status = 404, description = "Task not found", body = ErrorResponse)
    ),
    tag = "tasks"
)]
pub async fn delete_task_handler(
    State(state): State<TaskState>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Path(task_id) = path?;

    let service = TaskService::new(state.repository.as_ref());
    if !service.delete_task(task_id).await? {
        return Err(ApiError::NotFound(task_id));
    }
    Ok(Json(MessageResponse {
        message: format!("Task with id {} deleted successfully", task_id),
    }))
}

/// Handler for POST /tasks/{task_id}/complete.
#[tracing::instrument(skip(state, path))]
#[utoipa::path(
    post,
    path = "/tasks/{task_id}/complete",
    params(("task_id" = i32, Path, description = "ID of the task")),
    responses(
        (status = 200, description = "The completed task", body = TaskJson),
        (status = 404, description = "Task not found", body = ErrorResponse)
    ),
    tag = "tasks"
)]
pub async fn mark_complete_handler(
    State(state): State<TaskState>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<Json<TaskJson>, ApiError> {
    let Path(task_id) = path?;

    let service = TaskService::new(state.repository.as_ref());
    let task = service
        .mark_complete(task_id)
        .await?
        .ok_or(ApiError::NotFound(task_id))?;
    Ok(Json(TaskJson::from(task)))
}

/// Handler for POST /tasks/{task_id}/incomplete.
#[tracing::instrument(skip(state, path))]
#[utoipa::path(
    post,
    path = "/tasks/{task_id}/incomplete",
    params(("task_id" = i32, Path, description = "ID of the task")),
    responses(
        (status = 200, description = "The reopened task", body = TaskJson),
        (status = 404, description = "Task not found", body = ErrorResponse)
    ),
    tag = "tasks"
)]
pub async fn mark_incomplete_handler(
    State(state): State<TaskState>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<Json<TaskJson>, ApiError> {
    let Path(task_id) = path?;

    let service = TaskService::new(state.repository.as_ref());
    let task = service
        .mark_incomplete(task_id)
        .await?
        .ok_or(ApiError::NotFound(task_id))?;
    Ok(Json(TaskJson::from(task)))
}

/// Creates and returns the tasks API router.
pub fn create_task_router(state: TaskState) -> Router {
    Router::new()
        .route("/tasks", get(list_tasks_handler).post(create_task_handler))
        .route(
            "/tasks/{task_id}",
            get(get_task_handler)
                .put(update_task_handler)
                .delete(delete_task_handler),
        )
        .route("/tasks/{task_id}/complete", post(mark_complete_handler))
        .route("/tasks/{task_id}/incomplete", post(mark_incomplete_handler))
        .with_state(state)
}
