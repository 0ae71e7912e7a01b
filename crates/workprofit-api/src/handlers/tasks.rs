use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use sea_orm::{
    sea_query::Query as SqlQuery, ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait,
    EntityTrait, IntoActiveModel, ModelTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
};
use std::sync::Arc;
use tracing::{debug, info};
use workprofit_core::policy::{can_access_project, can_manage_project, visibility, Visibility};
use workprofit_core::validate::{check_assignee, check_not_blank};
use workprofit_core::{dedupe_ids, ProjectMembership, ValidationErrors};
use workprofit_db::entities::{project, project_member, task};
use workprofit_db::replace_task_labels;

use super::{find_project, find_task, find_user, resolve_labels, task_response};
use crate::error::{ApiError, ApiResult};
use crate::middleware::CurrentUser;
use crate::models::*;
use crate::AppState;

/// Assignee must exist and be on the project (or be ADMIN/PM).
async fn check_task_assignee<C: ConnectionTrait>(
    conn: &C,
    membership: &ProjectMembership,
    assignee_id: i32,
) -> ApiResult<()> {
    let assignee = find_user(conn, assignee_id).await?;
    check_assignee(membership, assignee.id, assignee.role)?;
    Ok(())
}

/// Tasks whose project is led by or includes `user_id`
fn scoped_to(user_id: i32) -> Condition {
    Condition::any()
        .add(
            task::Column::ProjectId.in_subquery(
                SqlQuery::select()
                    .column(project::Column::Id)
                    .from(project::Entity)
                    .and_where(project::Column::TeamLeadId.eq(user_id))
                    .to_owned(),
            ),
        )
        .add(
            task::Column::ProjectId.in_subquery(
                SqlQuery::select()
                    .column(project_member::Column::ProjectId)
                    .from(project_member::Entity)
                    .and_where(project_member::Column::UserId.eq(user_id))
                    .to_owned(),
            ),
        )
}

/// Create a task in a project the caller can access
#[utoipa::path(
    post,
    path = "/api/v1/tasks",
    request_body = CreateTaskRequest,
    responses(
        (status = 201, description = "Task created", body = TaskResponse),
        (status = 400, description = "Assignee is not on the project", body = ErrorResponse),
        (status = 403, description = "No access to the project", body = ErrorResponse),
        (status = 404, description = "Project, assignee or label not found", body = ErrorResponse),
        (status = 422, description = "Invalid fields", body = ErrorResponse)
    ),
    tag = "tasks"
)]
pub async fn create_task(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<TaskResponse>)> {
    let txn = state.db.begin().await?;
    let (_, membership) = find_project(&txn, req.project_id).await?;
    if !can_access_project(&membership, &current.actor()) {
        return Err(ApiError::forbidden("Not authorized to add tasks to this project"));
    }

    let mut errors = ValidationErrors::new();
    check_not_blank("title", &req.title, &mut errors);
    errors.into_result()?;

    if let Some(assignee_id) = req.assignee_id {
        check_task_assignee(&txn, &membership, assignee_id).await?;
    }
    let label_ids = dedupe_ids(&req.label_ids);
    resolve_labels(&txn, &label_ids).await?;

    let now = Utc::now();
    let created = task::ActiveModel {
        title: Set(req.title.trim().to_string()),
        description: Set(req.description),
        status: Set(req.status),
        priority: Set(req.priority),
        due_date: Set(req.due_date),
        project_id: Set(req.project_id),
        assignee_id: Set(req.assignee_id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    replace_task_labels(&txn, created.id, &label_ids).await?;
    let response = task_response(&txn, created).await?;
    txn.commit().await?;

    info!(
        "User {} created task {} in project {}",
        current.0.id, response.id, response.project_id
    );
    Ok((StatusCode::CREATED, Json(response)))
}

/// List visible tasks
#[utoipa::path(
    get,
    path = "/api/v1/tasks",
    params(TaskListQuery),
    responses(
        (status = 200, description = "Tasks", body = Vec<TaskResponse>)
    ),
    tag = "tasks"
)]
pub async fn list_tasks(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Query(query): Query<TaskListQuery>,
) -> ApiResult<Json<Vec<TaskResponse>>> {
    let scope = visibility(&current.actor());
    debug!("Listing tasks for user {} ({:?}): {:?}", current.0.id, scope, query);

    let mut select = task::Entity::find().order_by_asc(task::Column::Id);
    if let Visibility::Scoped(user_id) = scope {
        select = select.filter(scoped_to(user_id));
    }
    if let Some(project_id) = query.project_id {
        select = select.filter(task::Column::ProjectId.eq(project_id));
    }

    let page = PageQuery {
        skip: query.skip,
        limit: query.limit,
    };
    let tasks = select
        .offset(page.offset())
        .limit(page.limit())
        .all(&state.db)
        .await?;

    let mut out = Vec::with_capacity(tasks.len());
    for model in tasks {
        out.push(task_response(&state.db, model).await?);
    }
    Ok(Json(out))
}

/// Get a task
#[utoipa::path(
    get,
    path = "/api/v1/tasks/{id}",
    params(("id" = i32, Path, description = "Task ID")),
    responses(
        (status = 200, description = "Task", body = TaskResponse),
        (status = 403, description = "No access to the project", body = ErrorResponse),
        (status = 404, description = "Task not found", body = ErrorResponse)
    ),
    tag = "tasks"
)]
pub async fn get_task(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> ApiResult<Json<TaskResponse>> {
    let model = find_task(&state.db, id).await?;
    let (_, membership) = find_project(&state.db, model.project_id).await?;
    if !can_access_project(&membership, &current.actor()) {
        return Err(ApiError::forbidden("Not authorized to access this task"));
    }
    Ok(Json(task_response(&state.db, model).await?))
}

/// Update a task
///
/// Changing the assignee re-runs the membership check against the task's
/// project. `label_ids` replaces the whole label set.
#[utoipa::path(
    patch,
    path = "/api/v1/tasks/{id}",
    params(("id" = i32, Path, description = "Task ID")),
    request_body = UpdateTaskRequest,
    responses(
        (status = 200, description = "Task updated", body = TaskResponse),
        (status = 400, description = "Assignee is not on the project", body = ErrorResponse),
        (status = 403, description = "No access to the project", body = ErrorResponse),
        (status = 404, description = "Task, assignee or label not found", body = ErrorResponse),
        (status = 422, description = "Invalid fields", body = ErrorResponse)
    ),
    tag = "tasks"
)]
pub async fn update_task(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i32>,
    Json(req): Json<UpdateTaskRequest>,
) -> ApiResult<Json<TaskResponse>> {
    let txn = state.db.begin().await?;
    let existing = find_task(&txn, id).await?;
    let (_, membership) = find_project(&txn, existing.project_id).await?;
    if !can_access_project(&membership, &current.actor()) {
        return Err(ApiError::forbidden("Not authorized to access this task"));
    }

    let mut errors = ValidationErrors::new();
    if let Some(title) = &req.title {
        check_not_blank("title", title, &mut errors);
    }
    errors.into_result()?;

    if let Some(Some(assignee_id)) = req.assignee_id {
        check_task_assignee(&txn, &membership, assignee_id).await?;
    }
    let label_ids = req.label_ids.as_deref().map(dedupe_ids);
    if let Some(ids) = &label_ids {
        resolve_labels(&txn, ids).await?;
    }

    let mut active = existing.into_active_model();
    if let Some(title) = req.title {
        active.title = Set(title.trim().to_string());
    }
    if let Some(description) = req.description {
        active.description = Set(description);
    }
    if let Some(status) = req.status {
        active.status = Set(status);
    }
    if let Some(priority) = req.priority {
        active.priority = Set(priority);
    }
    if let Some(due_date) = req.due_date {
        active.due_date = Set(due_date);
    }
    if let Some(assignee_id) = req.assignee_id {
        active.assignee_id = Set(assignee_id);
    }
    active.updated_at = Set(Utc::now());
    let updated = active.update(&txn).await?;

    if let Some(ids) = &label_ids {
        replace_task_labels(&txn, updated.id, ids).await?;
    }
    let response = task_response(&txn, updated).await?;
    txn.commit().await?;

    info!("User {} updated task {}", current.0.id, id);
    Ok(Json(response))
}

/// Delete a task (project managers only)
#[utoipa::path(
    delete,
    path = "/api/v1/tasks/{id}",
    params(("id" = i32, Path, description = "Task ID")),
    responses(
        (status = 204, description = "Task deleted"),
        (status = 403, description = "Not allowed", body = ErrorResponse),
        (status = 404, description = "Task not found", body = ErrorResponse)
    ),
    tag = "tasks"
)]
pub async fn delete_task(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> ApiResult<StatusCode> {
    let txn = state.db.begin().await?;
    let existing = find_task(&txn, id).await?;
    let (_, membership) = find_project(&txn, existing.project_id).await?;
    if !can_manage_project(&membership, &current.actor()) {
        return Err(ApiError::forbidden("Not authorized to delete this task"));
    }

    existing.delete(&txn).await?;
    txn.commit().await?;

    info!("User {} deleted task {}", current.0.id, id);
    Ok(StatusCode::NO_CONTENT)
}
