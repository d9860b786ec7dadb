use chrono::Utc;

use task_tracker::jobs::{duplicate::duplicate_daily_tasks, run_job, JobKind};
use task_tracker::models::task::{Task, TaskPriority, TaskStatus, TaskType};
use task_tracker::persistence::task_repo::TaskRepo;

use super::test_helpers::{date, memory_db, seed_task};

#[tokio::test]
async fn copies_yesterdays_completed_daily_tasks() {
    let db = memory_db().await;
    let repo = TaskRepo::new(db.clone());
    let yesterday = date(2024, 1, 14);
    let today = date(2024, 1, 15);

    let mut source = Task::new("morning check-in".into(), TaskType::Daily, Some(yesterday));
    source.description = Some("reply in the team chat".into());
    source.assignee_id = Some("u-1".into());
    source.priority = TaskPriority::High;
    source.department = Some("support".into());
    source.creator_id = Some("u-9".into());
    source.complete(Utc::now());
    let source = repo.create(&source).await.expect("seed source");
    seed_task(&repo, "inbox zero", TaskType::Daily, TaskStatus::Completed, Some(yesterday)).await;

    // Not eligible: wrong day, wrong type, not completed.
    let older = Some(date(2024, 1, 13));
    seed_task(&repo, "older", TaskType::Daily, TaskStatus::Completed, older).await;
    seed_task(&repo, "one-off", TaskType::OneTime, TaskStatus::Completed, Some(yesterday)).await;
    seed_task(&repo, "open", TaskType::Daily, TaskStatus::Pending, Some(yesterday)).await;

    let outcome = duplicate_daily_tasks(&repo, today).await.expect("duplicate runs");
    assert_eq!(outcome.kind, JobKind::Duplicate);
    assert_eq!(outcome.count(), 2);
    assert_eq!(
        outcome.message,
        "Duplicated 2 daily tasks from 2024-01-14 to 2024-01-15"
    );

    let all = repo.list_all().await.expect("list");
    assert_eq!(all.len(), 7);
    let copies: Vec<_> = all.iter().filter(|t| t.due_date == Some(today)).collect();
    assert_eq!(copies.len(), 2);
    for copy in &copies {
        assert_eq!(copy.status, TaskStatus::Pending);
        assert!(copy.completed_at.is_none());
        assert_eq!(copy.task_type, TaskType::Daily);
    }

    let copy = copies
        .iter()
        .find(|t| t.title == "morning check-in")
        .expect("copy of first source");
    assert_ne!(copy.id, source.id);
    assert_eq!(copy.description, source.description);
    assert_eq!(copy.assignee_id, source.assignee_id);
    assert_eq!(copy.priority, TaskPriority::High);
    assert_eq!(copy.department, source.department);
    assert_eq!(copy.creator_id, source.creator_id);

    let original = repo.get_by_id(&source.id).await.expect("fetch").expect("exists");
    assert_eq!(original.status, TaskStatus::Completed, "sources are left as they were");
}

#[tokio::test]
async fn repeated_runs_create_repeated_copies() {
    let db = memory_db().await;
    let repo = TaskRepo::new(db.clone());
    let yesterday = date(2024, 1, 14);
    for title in ["a", "b", "c"] {
        seed_task(&repo, title, TaskType::Daily, TaskStatus::Completed, Some(yesterday)).await;
    }

    let today = date(2024, 1, 15);
    duplicate_daily_tasks(&repo, today).await.expect("first run");
    duplicate_daily_tasks(&repo, today).await.expect("second run");

    let copies = repo
        .list_all()
        .await
        .expect("list")
        .into_iter()
        .filter(|t| t.due_date == Some(today))
        .count();
    assert_eq!(copies, 6);
}

#[tokio::test]
async fn nothing_eligible_is_success_without_insert() {
    let db = memory_db().await;
    let repo = TaskRepo::new(db.clone());
    seed_task(&repo, "older", TaskType::Daily, TaskStatus::Completed, Some(date(2024, 1, 1))).await;

    let outcome = duplicate_daily_tasks(&repo, date(2024, 1, 15))
        .await
        .expect("duplicate runs");
    assert_eq!(outcome.count(), 0);
    assert!(outcome.tasks.is_empty());
    assert_eq!(outcome.message, "No completed daily tasks due 2024-01-14");
    assert_eq!(repo.list_all().await.expect("list").len(), 1);
}

#[tokio::test]
async fn yesterday_crosses_month_and_year() {
    let db = memory_db().await;
    let repo = TaskRepo::new(db.clone());
    seed_task(&repo, "nye", TaskType::Daily, TaskStatus::Completed, Some(date(2023, 12, 31))).await;

    let outcome = run_job(db, JobKind::Duplicate, date(2024, 1, 1))
        .await
        .expect("job runs");
    assert_eq!(outcome.count(), 1);
    assert_eq!(outcome.tasks[0].due_date, Some(date(2024, 1, 1)));
}
