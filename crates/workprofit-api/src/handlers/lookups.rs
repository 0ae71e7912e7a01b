//! Enumerations the frontend renders as dropdowns.

use axum::Json;
use workprofit_core::{Department, ProjectStatus, Role, TaskPriority, TaskStatus};

fn names<T>(all: &[T], as_str: fn(&T) -> &'static str) -> Json<Vec<String>> {
    Json(all.iter().map(|v| as_str(v).to_string()).collect())
}

#[utoipa::path(
    get,
    path = "/api/v1/roles",
    responses((status = 200, description = "Role names", body = Vec<String>)),
    tag = "lookups"
)]
pub async fn roles() -> Json<Vec<String>> {
    names(&Role::ALL, Role::as_str)
}

#[utoipa::path(
    get,
    path = "/api/v1/departments",
    responses((status = 200, description = "Department names", body = Vec<String>)),
    tag = "lookups"
)]
pub async fn departments() -> Json<Vec<String>> {
    names(&Department::ALL, Department::as_str)
}

/// Task statuses
#[utoipa::path(
    get,
    path = "/api/v1/statuses",
    responses((status = 200, description = "Task status names", body = Vec<String>)),
    tag = "lookups"
)]
pub async fn statuses() -> Json<Vec<String>> {
    names(&TaskStatus::ALL, TaskStatus::as_str)
}

#[utoipa::path(
    get,
    path = "/api/v1/priorities",
    responses((status = 200, description = "Task priority names", body = Vec<String>)),
    tag = "lookups"
)]
pub async fn priorities() -> Json<Vec<String>> {
    names(&TaskPriority::ALL, TaskPriority::as_str)
}

#[utoipa::path(
    get,
    path = "/api/v1/project-statuses",
    responses((status = 200, description = "Project status names", body = Vec<String>)),
    tag = "lookups"
)]
pub async fn project_statuses() -> Json<Vec<String>> {
    names(&ProjectStatus::ALL, ProjectStatus::as_str)
}
