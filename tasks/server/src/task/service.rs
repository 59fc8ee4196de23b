use super::{NewTask, RepositoryError, Task, TaskChanges, TaskFilter, TaskPage, TaskRepository};

/// Error type for TaskService operations.
#[derive(Debug, thiserror::Error)]
pub enum TaskServiceError {
    /// Represents a storage failure.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

pub struct TaskService<'a> {
    repository: &'a dyn TaskRepository,
}

impl<'a> TaskService<'a> {
    pub fn new(repository: &'a dyn TaskRepository) -> Self {
        TaskService { repository }
    }

    /// Creates a new task.
    ///
    /// # Arguments
    ///
    /// * `new_task` - The validated fields of the task.
    ///
    /// # Returns
    ///
    /// A `Result` containing the created `Task`, including its generated ID and timestamps.
    #[tracing::instrument(skip(self))]
    pub async fn create_task(&self, new_task: NewTask) -> Result<Task, TaskServiceError> {
        let task = self.repository.create(new_task).await?;
        tracing::info!("Created task {}", task.id());
        Ok(task)
    }

    /// Retrieves a task by its ID, or `None` if it does not exist.
    #[tracing::instrument(skip(self))]
    pub async fn get_task(&self, id: i32) -> Result<Option<Task>, TaskServiceError> {
        Ok(self.repository.get_by_id(id).await?)
    }

    /// Lists one page of tasks along with the total number of tasks matching
    /// the filter, regardless of the pagination window.
    #[tracing::instrument(skip(self))]
    pub async fn list_tasks(&self, filter: TaskFilter) -> Result<TaskPage, TaskServiceError> {
        let items = self.repository.list(filter).await?;
        let total = self.repository.count(filter.completed).await?;
        Ok(TaskPage { items, total })
    }

    /// Updates the fields present in `changes`.
    ///
    /// # Arguments
    ///
    /// * `id` - The ID of the task to update.
    /// * `changes` - The fields to change; absent fields keep their value.
    ///
    /// # Returns
    ///
    /// A `Result` containing the updated `Task`, or `None` if it does not exist.
    #[tracing::instrument(skip(self))]
    pub async fn update_task(
        &self,
        id: i32,
        changes: TaskChanges,
    ) -> Result<Option<Task>, TaskServiceError> {
        let task = self.repository.update(id, changes).await?;
        if task.is_none() {
            tracing::debug!("Task {} not found for update", id);
        }
        Ok(task)
    }

    /// Deletes a task, returning whether it existed.
    #[tracing::instrument(skip(self))]
    pub async fn delete_task(&self, id: i32) -> Result<bool, TaskServiceError> {
        let deleted = self.repository.delete(id).await?;
        if deleted {
            tracing::info!("Deleted task {}", id);
        }
        Ok(deleted)
    }

    /// Marks a task as completed. Calling it again still bumps `updated_at`.
    #[tracing::instrument(skip(self))]
    pub async fn mark_complete(&self, id: i32) -> Result<Option<Task>, TaskServiceError> {
        self.update_task(id, TaskChanges::completed(true)).await
    }

    /// Marks a task as not completed.
    #[tracing::instrument(skip(self))]
    pub async fn mark_incomplete(&self, id: i32) -> Result<Option<Task>, TaskServiceError> {
        self.update_task(id, TaskChanges::completed(false)).await
    }
}
