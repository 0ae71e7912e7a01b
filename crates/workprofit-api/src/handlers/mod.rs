//! Request handlers, one module per resource.
//!
//! Mutating handlers open one transaction with `state.db.begin()` and use
//! only that handle until commit. Returning early drops it, which rolls
//! everything back.

pub mod auth;
pub mod files;
pub mod labels;
pub mod lookups;
pub mod projects;
pub mod system;
pub mod tasks;
pub mod users;

use chrono::{NaiveDate, Utc};
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, ModelTrait, QueryFilter, QueryOrder};
use workprofit_core::{missing_ids, ProjectMembership};
use workprofit_db::entities::{label, project, task, user};
use workprofit_db::load_membership;

use crate::error::{ApiError, ApiResult};
use crate::models::{ProjectResponse, TaskResponse};

pub(crate) fn today() -> NaiveDate {
    Utc::now().date_naive()
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub(crate) async fn find_user<C: ConnectionTrait>(conn: &C, id: i32) -> ApiResult<user::Model> {
    user::Entity::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| ApiError::not_found("User", id))
}

pub(crate) async fn find_project<C: ConnectionTrait>(
    conn: &C,
    id: i32,
) -> ApiResult<(project::Model, ProjectMembership)> {
    let model = project::Entity::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| ApiError::not_found("Project", id))?;
    let membership = load_membership(conn, &model).await?;
    Ok((model, membership))
}

pub(crate) async fn find_task<C: ConnectionTrait>(conn: &C, id: i32) -> ApiResult<task::Model> {
    task::Entity::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| ApiError::not_found("Task", id))
}

pub(crate) async fn find_label<C: ConnectionTrait>(conn: &C, id: i32) -> ApiResult<label::Model> {
    label::Entity::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| ApiError::not_found("Label", id))
}

/// Load every user in `ids`, or fail with one 404 naming all missing ids.
pub(crate) async fn resolve_users<C: ConnectionTrait>(
    conn: &C,
    ids: &[i32],
) -> ApiResult<Vec<user::Model>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let found = user::Entity::find()
        .filter(user::Column::Id.is_in(ids.iter().copied()))
        .all(conn)
        .await?;
    let found_ids: Vec<i32> = found.iter().map(|u| u.id).collect();
    let missing = missing_ids(ids, &found_ids);
    if !missing.is_empty() {
        return Err(ApiError::NotFound(format!("Users not found: {:?}", missing)));
    }
    Ok(found)
}

/// Same as [`resolve_users`] for labels.
pub(crate) async fn resolve_labels<C: ConnectionTrait>(conn: &C, ids: &[i32]) -> ApiResult<()> {
    if ids.is_empty() {
        return Ok(());
    }
    let found_ids: Vec<i32> = label::Entity::find()
        .filter(label::Column::Id.is_in(ids.iter().copied()))
        .all(conn)
        .await?
        .into_iter()
        .map(|l| l.id)
        .collect();
    let missing = missing_ids(ids, &found_ids);
    if !missing.is_empty() {
        return Err(ApiError::NotFound(format!("Labels not found: {:?}", missing)));
    }
    Ok(())
}

pub(crate) fn project_response(model: project::Model, membership: ProjectMembership) -> ProjectResponse {
    ProjectResponse::from_model(model, membership.member_ids, today())
}

pub(crate) async fn task_response<C: ConnectionTrait>(
    conn: &C,
    model: task::Model,
) -> ApiResult<TaskResponse> {
    let labels = model
        .find_related(label::Entity)
        .order_by_asc(label::Column::Id)
        .all(conn)
        .await?;
    Ok(TaskResponse::from_model(model, labels))
}
