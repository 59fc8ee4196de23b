use sea_orm::{ActiveModelTrait, ActiveValue};
use task_server::entities::task;
use task_server::task::{NewTask, SeaOrmTaskRepository, TaskChanges, TaskFilter, TaskRepository};

mod common;

async fn setup() -> SeaOrmTaskRepository {
    let db = common::setup_db()
        .await
        .expect("Failed to setup test database");
    SeaOrmTaskRepository::new(db)
}

#[tokio::test]
async fn can_create_task_with_generated_id_and_timestamps() {
    let repo = setup().await;

    let created = repo
        .create(NewTask::new("T"))
        .await
        .expect("Failed to create task");

    assert!(created.id() > 0);
    assert_eq!(created.title(), "T");
    assert_eq!(created.description(), None);
    assert!(!created.completed());
    assert_eq!(created.created_at(), created.updated_at());
}

#[tokio::test]
async fn can_get_task_equal_to_created_one() {
    let repo = setup().await;
    let created = repo
        .create(NewTask::new("Buy milk").with_description("Semi-skimmed"))
        .await
        .expect("Failed to create task");

    let fetched = repo
        .get_by_id(created.id())
        .await
        .expect("Failed to get task");

    assert_eq!(fetched, Some(created));
}

#[tokio::test]
async fn can_handle_get_when_task_not_found() {
    let repo = setup().await;

    let fetched = repo.get_by_id(999).await.expect("Failed to get task");

    assert_eq!(fetched, None);
}

#[tokio::test]
async fn can_update_only_present_fields() {
    let repo = setup().await;
    let created = repo
        .create(NewTask::new("Original Title").with_description("Keep me"))
        .await
        .expect("Failed to create task");

    let updated = repo
        .update(
            created.id(),
            TaskChanges {
                title: Some("Updated Title".to_string()),
                ..Default::default()
            },
        )
        .await
        .expect("Failed to update task")
        .expect("Task should exist");

    assert_eq!(updated.id(), created.id());
    assert_eq!(updated.title(), "Updated Title");
    assert_eq!(updated.description(), Some("Keep me"));
    assert!(!updated.completed());
    assert_eq!(updated.created_at(), created.created_at());
    assert!(updated.updated_at() > created.updated_at());
}

#[tokio::test]
async fn can_clear_description_on_update() {
    let repo = setup().await;
    let created = repo
        .create(NewTask::new("Task").with_description("Old"))
        .await
        .expect("Failed to create task");

    let updated = repo
        .update(
            created.id(),
            TaskChanges {
                description: Some(None),
                ..Default::default()
            },
        )
        .await
        .expect("Failed to update task")
        .expect("Task should exist");

    assert_eq!(updated.description(), None);
}

#[tokio::test]
async fn can_advance_updated_at_when_value_is_unchanged() {
    let repo = setup().await;
    let created = repo
        .create(NewTask::new("Task"))
        .await
        .expect("Failed to create task");

    let first = repo
        .update(created.id(), TaskChanges::completed(true))
        .await
        .expect("Failed to update task")
        .expect("Task should exist");
    let second = repo
        .update(created.id(), TaskChanges::completed(true))
        .await
        .expect("Failed to update task")
        .expect("Task should exist");

    assert!(first.completed());
    assert!(second.completed());
    assert!(second.updated_at() > first.updated_at());
}

#[tokio::test]
async fn can_handle_update_when_task_not_found() {
    let repo = setup().await;

    let result = repo
        .update(999, TaskChanges::completed(true))
        .await
        .expect("Failed to update task");

    assert_eq!(result, None);
}

#[tokio::test]
async fn can_delete_task_permanently() {
    let repo = setup().await;
    let created = repo
        .create(NewTask::new("To Delete"))
        .await
        .expect("Failed to create task");

    assert!(repo.delete(created.id()).await.expect("Failed to delete"));
    assert!(!repo.delete(created.id()).await.expect("Failed to delete"));
    assert_eq!(
        repo.get_by_id(created.id()).await.expect("Failed to get"),
        None
    );
}

#[tokio::test]
async fn can_list_newest_first() {
    let db = common::setup_db()
        .await
        .expect("Failed to setup test database");
    let repo = SeaOrmTaskRepository::new(db.clone());

    // Insert rows with explicit, out-of-order creation times.
    let base = chrono::Utc::now();
    for (title, offset) in [("middle", 10), ("oldest", 0), ("newest", 20)] {
        let at = base + chrono::Duration::seconds(offset);
        task::ActiveModel {
            title: ActiveValue::Set(title.to_string()),
            description: ActiveValue::Set(None),
            completed: ActiveValue::Set(false),
            created_at: ActiveValue::Set(at),
            updated_at: ActiveValue::Set(at),
            ..Default::default()
        }
        .insert(&db)
        .await
        .expect("Failed to insert task");
    }

    let tasks = repo
        .list(TaskFilter::default())
        .await
        .expect("Failed to list tasks");

    let titles: Vec<&str> = tasks.iter().map(|task| task.title()).collect();
    assert_eq!(titles, vec!["newest", "middle", "oldest"]);
}

#[tokio::test]
async fn can_paginate_without_changing_count() {
    let repo = setup().await;
    for i in 0..5 {
        repo.create(NewTask::new(format!("Task {}", i)))
            .await
            .expect("Failed to create task");
    }

    let page = repo
        .list(TaskFilter {
            skip: 1,
            limit: 2,
            completed: None,
        })
        .await
        .expect("Failed to list tasks");

    assert_eq!(page.len(), 2);
    assert_eq!(repo.count(None).await.expect("Failed to count"), 5);
}

#[tokio::test]
async fn can_filter_and_count_by_completion() {
    let repo = setup().await;
    repo.create(NewTask::new("Buy milk"))
        .await
        .expect("Failed to create task");
    repo.create(NewTask::new("Walk dog").with_completed(true))
        .await
        .expect("Failed to create task");

    let completed = repo
        .list(TaskFilter {
            completed: Some(true),
            ..Default::default()
        })
        .await
        .expect("Failed to list tasks");
    let incomplete = repo
        .list(TaskFilter {
            completed: Some(false),
            ..Default::default()
        })
        .await
        .expect("Failed to list tasks");

    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0].title(), "Walk dog");
    assert_eq!(incomplete.len(), 1);
    assert_eq!(incomplete[0].title(), "Buy milk");
    assert_eq!(repo.count(Some(true)).await.expect("Failed to count"), 1);
    assert_eq!(repo.count(Some(false)).await.expect("Failed to count"), 1);
}

#[tokio::test]
async fn can_handle_empty_task_list() {
    let repo = setup().await;

    let tasks = repo
        .list(TaskFilter::default())
        .await
        .expect("Failed to list tasks");

    assert!(tasks.is_empty());
    assert_eq!(repo.count(None).await.expect("Failed to count"), 0);
}
