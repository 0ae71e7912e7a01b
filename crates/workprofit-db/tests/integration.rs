//! Integration tests for workprofit-db
//!
//! Runs the schema against an in-memory SQLite database and checks the
//! foreign-key behaviour the API relies on.

use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, ModelTrait,
    PaginatorTrait, QueryFilter, Set, TransactionTrait,
};
use workprofit_core::{Department, ProjectStatus, Role, TaskPriority, TaskStatus};
use workprofit_db::entities::{label, project, project_member, task, task_label, user};
use workprofit_db::{
    append_members, connect, load_membership, migrate, remove_members, replace_members,
    replace_task_labels, task_label_ids,
};

async fn setup_test_db() -> DatabaseConnection {
    let db = connect("sqlite::memory:")
        .await
        .expect("Failed to connect to in-memory database");
    migrate(&db).await.expect("Failed to run migrations");
    db
}

async fn insert_user(db: &DatabaseConnection, email: &str, role: Role) -> user::Model {
    let department = if role.requires_department() {
        Some(Department::Developer)
    } else {
        None
    };
    user::ActiveModel {
        email: Set(email.to_string()),
        password_hash: Set("$argon2id$placeholder".to_string()),
        first_name: Set("Test".to_string()),
        last_name: Set("User".to_string()),
        phone_number: Set(None),
        role: Set(role),
        department: Set(department),
        avatar_url: Set(None),
        is_active: Set(true),
        last_login: Set(None),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to insert user")
}

async fn insert_project(
    db: &DatabaseConnection,
    team_lead_id: Option<i32>,
    client_id: Option<i32>,
) -> project::Model {
    project::ActiveModel {
        name: Set("Website relaunch".to_string()),
        description: Set(None),
        client_id: Set(client_id),
        team_lead_id: Set(team_lead_id),
        start_date: Set(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()),
        end_date: Set(NaiveDate::from_ymd_opt(2025, 6, 30).unwrap()),
        status: Set(ProjectStatus::Planning),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to insert project")
}

async fn insert_task(db: &DatabaseConnection, project_id: i32, assignee_id: Option<i32>) -> task::Model {
    let now = Utc::now();
    task::ActiveModel {
        title: Set("Draft copy".to_string()),
        description: Set(None),
        status: Set(TaskStatus::Todo),
        priority: Set(TaskPriority::Medium),
        due_date: Set(None),
        project_id: Set(project_id),
        assignee_id: Set(assignee_id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to insert task")
}

#[tokio::test]
async fn test_database_connection() {
    let db = connect("sqlite::memory:").await.expect("Failed to connect");
    assert!(matches!(
        db.get_database_backend(),
        sea_orm::DatabaseBackend::Sqlite
    ));
}

#[tokio::test]
async fn test_migrations_run_successfully() {
    let db = connect("sqlite::memory:").await.expect("Failed to connect");
    assert!(migrate(&db).await.is_ok());
}

#[tokio::test]
async fn test_enum_columns_round_trip() {
    let db = setup_test_db().await;
    let pm = insert_user(&db, "pm@example.com", Role::ProjectManager).await;

    let loaded = user::Entity::find_by_id(pm.id).one(&db).await.unwrap().unwrap();
    assert_eq!(loaded.role, Role::ProjectManager);
    assert_eq!(loaded.department, Some(Department::Developer));
}

#[tokio::test]
async fn test_duplicate_email_rejected() {
    let db = setup_test_db().await;
    insert_user(&db, "dup@example.com", Role::Client).await;

    let second = user::ActiveModel {
        email: Set("dup@example.com".to_string()),
        password_hash: Set("x".to_string()),
        first_name: Set("A".to_string()),
        last_name: Set("B".to_string()),
        phone_number: Set(None),
        role: Set(Role::Client),
        department: Set(None),
        avatar_url: Set(None),
        is_active: Set(true),
        last_login: Set(None),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&db)
    .await;
    assert!(second.is_err());
}

#[tokio::test]
async fn test_deleting_team_lead_and_client_nulls_references() {
    let db = setup_test_db().await;
    let lead = insert_user(&db, "lead@example.com", Role::TeamLead).await;
    let client = insert_user(&db, "client@example.com", Role::Client).await;
    let project = insert_project(&db, Some(lead.id), Some(client.id)).await;

    lead.delete(&db).await.unwrap();
    client.delete(&db).await.unwrap();

    let reloaded = project::Entity::find_by_id(project.id)
        .one(&db)
        .await
        .unwrap()
        .expect("project must survive user deletion");
    assert_eq!(reloaded.team_lead_id, None);
    assert_eq!(reloaded.client_id, None);
}

#[tokio::test]
async fn test_deleting_member_removes_membership_only() {
    let db = setup_test_db().await;
    let a = insert_user(&db, "a@example.com", Role::Staff).await;
    let b = insert_user(&db, "b@example.com", Role::Staff).await;
    let project = insert_project(&db, None, None).await;
    replace_members(&db, project.id, &[a.id, b.id]).await.unwrap();

    a.delete(&db).await.unwrap();

    let membership = load_membership(&db, &project).await.unwrap();
    assert_eq!(membership.member_ids, vec![b.id]);
    assert_eq!(project::Entity::find().count(&db).await.unwrap(), 1);
}

#[tokio::test]
async fn test_deleting_project_cascades_to_tasks_members_and_task_labels() {
    let db = setup_test_db().await;
    let staff = insert_user(&db, "s@example.com", Role::Staff).await;
    let project = insert_project(&db, None, None).await;
    replace_members(&db, project.id, &[staff.id]).await.unwrap();
    let task = insert_task(&db, project.id, Some(staff.id)).await;
    let bug = label::ActiveModel {
        name: Set("bug".to_string()),
        color: Set(label::DEFAULT_COLOR.to_string()),
        ..Default::default()
    }
    .insert(&db)
    .await
    .unwrap();
    replace_task_labels(&db, task.id, &[bug.id]).await.unwrap();

    project.delete(&db).await.unwrap();

    assert_eq!(task::Entity::find().count(&db).await.unwrap(), 0);
    assert_eq!(project_member::Entity::find().count(&db).await.unwrap(), 0);
    assert_eq!(task_label::Entity::find().count(&db).await.unwrap(), 0);
    assert_eq!(label::Entity::find().count(&db).await.unwrap(), 1);
}

#[tokio::test]
async fn test_deleting_assignee_nulls_task_assignee() {
    let db = setup_test_db().await;
    let staff = insert_user(&db, "assignee@example.com", Role::Staff).await;
    let project = insert_project(&db, None, None).await;
    let task = insert_task(&db, project.id, Some(staff.id)).await;

    staff.delete(&db).await.unwrap();

    let reloaded = task::Entity::find_by_id(task.id).one(&db).await.unwrap().unwrap();
    assert_eq!(reloaded.assignee_id, None);
}

#[tokio::test]
async fn test_member_order_is_preserved() {
    let db = setup_test_db().await;
    let a = insert_user(&db, "a@example.com", Role::Staff).await;
    let b = insert_user(&db, "b@example.com", Role::Staff).await;
    let c = insert_user(&db, "c@example.com", Role::Staff).await;
    let project = insert_project(&db, None, None).await;

    replace_members(&db, project.id, &[c.id, a.id]).await.unwrap();
    let added = append_members(&db, project.id, &[a.id, b.id]).await.unwrap();
    assert_eq!(added, vec![b.id]);

    let membership = load_membership(&db, &project).await.unwrap();
    assert_eq!(membership.member_ids, vec![c.id, a.id, b.id]);

    let removed = remove_members(&db, project.id, &[a.id]).await.unwrap();
    assert_eq!(removed, 1);
    let membership = load_membership(&db, &project).await.unwrap();
    assert_eq!(membership.member_ids, vec![c.id, b.id]);
}

#[tokio::test]
async fn test_duplicate_label_name_rejected() {
    let db = setup_test_db().await;
    let first = label::ActiveModel {
        name: Set("urgent".to_string()),
        color: Set("#FF0000".to_string()),
        ..Default::default()
    };
    first.insert(&db).await.unwrap();

    let second = label::ActiveModel {
        name: Set("urgent".to_string()),
        color: Set("#00FF00".to_string()),
        ..Default::default()
    };
    assert!(second.insert(&db).await.is_err());
}

#[tokio::test]
async fn test_rolled_back_transaction_leaves_no_rows() {
    let db = setup_test_db().await;
    let staff = insert_user(&db, "t@example.com", Role::Staff).await;
    let project = insert_project(&db, None, None).await;

    let txn = db.begin().await.unwrap();
    replace_members(&txn, project.id, &[staff.id]).await.unwrap();
    txn.rollback().await.unwrap();

    let count = project_member::Entity::find()
        .filter(project_member::Column::ProjectId.eq(project.id))
        .count(&db)
        .await
        .unwrap();
    assert_eq!(count, 0);
    assert!(task_label_ids(&db, 999).await.unwrap().is_empty());
}
