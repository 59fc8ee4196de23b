use super::{NewTask, RepositoryError, Task, TaskChanges, TaskFilter, TaskRepository};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Mutex;

/// Task repository that keeps everything in process memory. Used in tests
/// and anywhere a throwaway store is good enough.
#[derive(Debug)]
pub struct InMemoryTaskRepository {
    store: Mutex<Store>,
}

#[derive(Debug)]
struct Store {
    tasks: BTreeMap<i32, Task>,
    next_id: i32,
}

impl Default for InMemoryTaskRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryTaskRepository {
    pub fn new() -> Self {
        Self {
            store: Mutex::new(Store {
                tasks: BTreeMap::new(),
                next_id: 1,
            }),
        }
    }

    fn with_store<T>(&self, f: impl FnOnce(&mut Store) -> T) -> T {
        let mut store = self
            .store
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut store)
    }
}

impl Store {
    fn matching(&self, completed: Option<bool>) -> impl Iterator<Item = &Task> {
        self.tasks
            .values()
            .filter(move |task| completed.is_none_or(|completed| task.completed == completed))
    }
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn create(&self, new_task: NewTask) -> Result<Task, RepositoryError> {
        let now = Utc::now();
        Ok(self.with_store(|store| {
            let task = Task {
                id: store.next_id,
                title: new_task.title,
                description: new_task.description,
                completed: new_task.completed,
                created_at: now,
                updated_at: now,
            };
            store.tasks.insert(task.id, task.clone());
            store.next_id += 1;
            task
        }))
    }

    async fn get_by_id(&self, id: i32) -> Result<Option<Task>, RepositoryError> {
        Ok(self.with_store(|store| store.tasks.get(&id).cloned()))
    }

    async fn list(&self, filter: TaskFilter) -> Result<Vec<Task>, RepositoryError> {
        Ok(self.with_store(|store| {
            let mut tasks: Vec<Task> = store.matching(filter.completed).cloned().collect();
            tasks.sort_by(|a, b| {
                b.created_at
                    .cmp(&a.created_at)
                    .then_with(|| b.id.cmp(&a.id))
            });
            tasks
                .into_iter()
                .skip(usize::try_from(filter.skip).unwrap_or(usize::MAX))
                .take(usize::try_from(filter.limit).unwrap_or(usize::MAX))
                .collect()
        }))
    }

    async fn update(
        &self,
        id: i32,
        changes: TaskChanges,
    ) -> Result<Option<Task>, RepositoryError> {
        let now = Utc::now();
        Ok(self.with_store(|store| {
            store.tasks.get_mut(&id).map(|task| {
                task.apply(changes, now);
                task.clone()
            })
        }))
    }

    async fn delete(&self, id: i32) -> Result<bool, RepositoryError> {
        Ok(self.with_store(|store| store.tasks.remove(&id).is_some()))
    }

    async fn count(&self, completed: Option<bool>) -> Result<u64, RepositoryError> {
        Ok(self.with_store(|store| store.matching(completed).count() as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn can_assign_sequential_ids_starting_at_one() {
        let repo = InMemoryTaskRepository::new();

        let first = repo.create(NewTask::new("Task 1")).await.unwrap();
        let second = repo.create(NewTask::new("Task 2")).await.unwrap();

        assert_eq!(first.id(), 1);
        assert_eq!(second.id(), 2);
        assert_eq!(first.created_at(), first.updated_at());
    }

    #[tokio::test]
    async fn can_list_newest_first_with_pagination() {
        let repo = InMemoryTaskRepository::new();
        for title in ["Task 1", "Task 2", "Task 3"] {
            repo.create(NewTask::new(title)).await.unwrap();
        }

        let page = repo
            .list(TaskFilter {
                skip: 1,
                limit: 1,
                completed: None,
            })
            .await
            .unwrap();

        assert_eq!(page.len(), 1);
        assert_eq!(page[0].title(), "Task 2");
        assert_eq!(repo.count(None).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn can_filter_and_count_by_completion() {
        let repo = InMemoryTaskRepository::new();
        repo.create(NewTask::new("Buy milk")).await.unwrap();
        repo.create(NewTask::new("Walk dog").with_completed(true))
            .await
            .unwrap();

        let completed = repo
            .list(TaskFilter {
                completed: Some(true),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].title(), "Walk dog");
        assert_eq!(repo.count(Some(true)).await.unwrap(), 1);
        assert_eq!(repo.count(Some(false)).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn can_report_missing_rows_without_error() {
        let repo = InMemoryTaskRepository::new();

        assert_eq!(repo.get_by_id(42).await.unwrap(), None);
        assert_eq!(
            repo.update(42, TaskChanges::completed(true)).await.unwrap(),
            None
        );
        assert!(!repo.delete(42).await.unwrap());
    }

    #[tokio::test]
    async fn can_delete_task_permanently() {
        let repo = InMemoryTaskRepository::new();
        let task = repo.create(NewTask::new("To Delete")).await.unwrap();

        assert!(repo.delete(task.id()).await.unwrap());
        assert!(!repo.delete(task.id()).await.unwrap());
        assert_eq!(repo.get_by_id(task.id()).await.unwrap(), None);
    }
}
