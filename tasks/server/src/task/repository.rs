use super::{NewTask, Task, TaskChanges, TaskFilter, next_updated_at};
use crate::entities::task;
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::*;

/// Error type for task storage operations.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// Represents a database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Storage operations on tasks. Each call commits on its own; a missing row is
/// reported as `None`/`false`, never as an error.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Inserts a task and returns it with its generated ID and timestamps.
    async fn create(&self, new_task: NewTask) -> Result<Task, RepositoryError>;

    async fn get_by_id(&self, id: i32) -> Result<Option<Task>, RepositoryError>;

    /// Returns one page of tasks, newest first.
    async fn list(&self, filter: TaskFilter) -> Result<Vec<Task>, RepositoryError>;

    /// Applies the present fields of `changes` and bumps `updated_at`.
    async fn update(&self, id: i32, changes: TaskChanges) -> Result<Option<Task>, RepositoryError>;

    /// Deletes a task, returning whether it existed.
    async fn delete(&self, id: i32) -> Result<bool, RepositoryError>;

    /// Counts tasks matching `completed`, ignoring pagination.
    async fn count(&self, completed: Option<bool>) -> Result<u64, RepositoryError>;
}

/// Task repository backed by a sea-orm connection pool.
#[derive(Clone, Debug)]
pub struct SeaOrmTaskRepository {
    db: DatabaseConnection,
}

impl SeaOrmTaskRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn filtered(completed: Option<bool>) -> Select<task::Entity> {
        let query = task::Entity::find();
        match completed {
            Some(completed) => query.filter(task::Column::Completed.eq(completed)),
            None => query,
        }
    }
}

#[async_trait]
impl TaskRepository for SeaOrmTaskRepository {
    #[tracing::instrument(skip(self))]
    async fn create(&self, new_task: NewTask) -> Result<Task, RepositoryError> {
        let now = Utc::now();
        let active_model = task::ActiveModel {
            title: ActiveValue::Set(new_task.title),
            description: ActiveValue::Set(new_task.description),
            completed: ActiveValue::Set(new_task.completed),
            created_at: ActiveValue::Set(now),
            updated_at: ActiveValue::Set(now),
            ..Default::default()
        };
        let created_model = active_model.insert(&self.db).await?;
        Ok(Task::from(created_model))
    }

    #[tracing::instrument(skip(self))]
    async fn get_by_id(&self, id: i32) -> Result<Option<Task>, RepositoryError> {
        let task_model = task::Entity::find_by_id(id).one(&self.db).await?;
        Ok(task_model.map(Task::from))
    }

    #[tracing::instrument(skip(self))]
    async fn list(&self, filter: TaskFilter) -> Result<Vec<Task>, RepositoryError> {
        let tasks = Self::filtered(filter.completed)
            .order_by_desc(task::Column::CreatedAt)
            .order_by_desc(task::Column::Id)
            .offset(filter.skip)
            .limit(filter.limit)
            .all(&self.db)
            .await?
            .into_iter()
            .map(Task::from)
            .collect();
        Ok(tasks)
    }

    #[tracing::instrument(skip(self))]
    async fn update(
        &self,
        id: i32,
        changes: TaskChanges,
    ) -> Result<Option<Task>, RepositoryError> {
        let Some(task_to_update) = task::Entity::find_by_id(id).one(&self.db).await? else {
            return Ok(None);
        };

        let updated_at = next_updated_at(task_to_update.updated_at, Utc::now());
        let mut active_model: task::ActiveModel = task_to_update.into();
        if let Some(title) = changes.title {
            active_model.title = ActiveValue::Set(title);
        }
        if let Some(description) = changes.description {
            active_model.description = ActiveValue::Set(description);
        }
        if let Some(completed) = changes.completed {
            active_model.completed = ActiveValue::Set(completed);
        }
        active_model.updated_at = ActiveValue::Set(updated_at);

        let updated_model = active_model.update(&self.db).await?;
        Ok(Some(Task::from(updated_model)))
    }

    #[tracing::instrument(skip(self))]
    async fn delete(&self, id: i32) -> Result<bool, RepositoryError> {
        let result = task::Entity::delete_by_id(id).exec(&self.db).await?;
        Ok(result.rows_affected > 0)
    }

    #[tracing::instrument(skip(self))]
    async fn count(&self, completed: Option<bool>) -> Result<u64, RepositoryError> {
        let total = Self::filtered(completed).count(&self.db).await?;
        Ok(total)
    }
}
