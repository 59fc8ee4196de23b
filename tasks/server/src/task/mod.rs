use crate::entities::task;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

pub mod api;
pub mod memory;
pub mod repository;
pub mod service;

pub use memory::InMemoryTaskRepository;
pub use repository::{RepositoryError, SeaOrmTaskRepository, TaskRepository};
pub use service::{TaskService, TaskServiceError};

/// A persisted task.
#[derive(Debug, PartialEq, Clone, Eq, Hash)]
pub struct Task {
    id: i32,
    title: String,
    description: Option<String>,
    completed: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Task {
    /// Returns the ID of the task.
    pub fn id(&self) -> i32 {
        self.id
    }

    /// Returns the title of the task.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the description of the task, if any.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns whether the task is completed.
    pub fn completed(&self) -> bool {
        self.completed
    }

    /// Returns when the task was created.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns when the task was last changed.
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn apply(&mut self, changes: TaskChanges, now: DateTime<Utc>) {
        if let Some(title) = changes.title {
            self.title = title;
        }
        if let Some(description) = changes.description {
            self.description = description;
        }
        if let Some(completed) = changes.completed {
            self.completed = completed;
        }
        self.updated_at = next_updated_at(self.updated_at, now);
    }
}

impl From<task::Model> for Task {
    fn from(model: task::Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            description: model.description,
            completed: model.completed,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Validated fields for creating a task.
#[derive(Debug, PartialEq, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
}

impl NewTask {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            completed: false,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_completed(mut self, completed: bool) -> Self {
        self.completed = completed;
        self
    }
}

/// Validated partial update. `None` leaves a field untouched; for
/// `description`, `Some(None)` clears it.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct TaskChanges {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub completed: Option<bool>,
}

impl TaskChanges {
    pub fn completed(completed: bool) -> Self {
        Self {
            completed: Some(completed),
            ..Default::default()
        }
    }
}

/// Pagination window and completion filter for listing tasks.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct TaskFilter {
    pub skip: u64,
    pub limit: u64,
    pub completed: Option<bool>,
}

impl Default for TaskFilter {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: 100,
            completed: None,
        }
    }
}

/// One page of tasks plus the number of tasks matching the filter.
#[derive(Debug, PartialEq, Clone)]
pub struct TaskPage {
    pub items: Vec<Task>,
    pub total: u64,
}

#[derive(Clone)]
pub struct TaskState {
    pub repository: Arc<dyn TaskRepository>,
}

impl TaskState {
    pub fn new(repository: impl TaskRepository + 'static) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }
}

/// Timestamp for a mutation of a row last changed at `previous`. Never goes
/// backwards, even when the wall clock does.
pub(crate) fn next_updated_at(previous: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    if now > previous {
        now
    } else {
        previous + Duration::microseconds(1)
    }
}
