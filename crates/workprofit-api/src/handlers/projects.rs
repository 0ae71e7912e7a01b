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
use workprofit_core::policy::{
    can_access_project, can_create_project, can_manage_project, visibility, Visibility,
};
use workprofit_core::validate::{
    check_client_role, check_field_locks, check_not_blank, check_team_lead_role, check_timeline,
    effective_timeline,
};
use workprofit_core::{dedupe_ids, ProjectMembership, ValidationErrors};
use workprofit_db::entities::{project, project_member, user};
use workprofit_db::{append_members, load_membership, remove_members, replace_members};

use super::{find_project, find_user, project_response, resolve_users};
use crate::error::{ApiError, ApiResult};
use crate::middleware::CurrentUser;
use crate::models::*;
use crate::AppState;

fn require_manage(membership: &ProjectMembership, current: &CurrentUser) -> ApiResult<()> {
    if can_manage_project(membership, &current.actor()) {
        Ok(())
    } else {
        Err(ApiError::forbidden("Not authorized to manage this project"))
    }
}

fn require_access(membership: &ProjectMembership, current: &CurrentUser) -> ApiResult<()> {
    if can_access_project(membership, &current.actor()) {
        Ok(())
    } else {
        Err(ApiError::forbidden("Not authorized to access this project"))
    }
}

/// Team lead must exist and hold TEAM_LEAD or STAFF.
async fn check_team_lead<C: ConnectionTrait>(conn: &C, id: i32) -> ApiResult<()> {
    let lead = find_user(conn, id).await?;
    check_team_lead_role(lead.id, lead.role)?;
    Ok(())
}

/// Client must exist and hold CLIENT.
async fn check_client<C: ConnectionTrait>(conn: &C, id: i32) -> ApiResult<()> {
    let client = find_user(conn, id).await?;
    check_client_role(client.id, client.role)?;
    Ok(())
}

/// Projects led by `user_id` or listing them as a member
fn scoped_to(user_id: i32) -> Condition {
    Condition::any()
        .add(project::Column::TeamLeadId.eq(user_id))
        .add(
            project::Column::Id.in_subquery(
                SqlQuery::select()
                    .column(project_member::Column::ProjectId)
                    .from(project_member::Entity)
                    .and_where(project_member::Column::UserId.eq(user_id))
                    .to_owned(),
            ),
        )
}

/// Create a project (ADMIN, PROJECT_MANAGER)
#[utoipa::path(
    post,
    path = "/api/v1/projects",
    request_body = CreateProjectRequest,
    responses(
        (status = 201, description = "Project created", body = ProjectResponse),
        (status = 400, description = "Team lead or client has the wrong role", body = ErrorResponse),
        (status = 403, description = "Role may not create projects", body = ErrorResponse),
        (status = 404, description = "Referenced user not found", body = ErrorResponse),
        (status = 422, description = "Invalid fields", body = ErrorResponse)
    ),
    tag = "projects"
)]
pub async fn create_project(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<CreateProjectRequest>,
) -> ApiResult<(StatusCode, Json<ProjectResponse>)> {
    if !can_create_project(&current.actor()) {
        return Err(ApiError::forbidden(
            "Only ADMIN or PROJECT_MANAGER can create projects",
        ));
    }

    let mut errors = ValidationErrors::new();
    check_not_blank("name", &req.name, &mut errors);
    check_timeline(req.start_date, req.end_date, &mut errors);
    errors.into_result()?;

    let txn = state.db.begin().await?;

    if let Some(id) = req.team_lead_id {
        check_team_lead(&txn, id).await?;
    }
    if let Some(id) = req.client_id {
        check_client(&txn, id).await?;
    }
    let member_ids = dedupe_ids(&req.member_ids);
    resolve_users(&txn, &member_ids).await?;

    let created = project::ActiveModel {
        name: Set(req.name.trim().to_string()),
        description: Set(req.description),
        client_id: Set(req.client_id),
        team_lead_id: Set(req.team_lead_id),
        start_date: Set(req.start_date),
        end_date: Set(req.end_date),
        status: Set(req.status),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    replace_members(&txn, created.id, &member_ids).await?;
    let membership = load_membership(&txn, &created).await?;
    txn.commit().await?;

    info!(
        "User {} created project {} with {} members",
        current.0.id,
        created.id,
        membership.member_ids.len()
    );
    Ok((
        StatusCode::CREATED,
        Json(project_response(created, membership)),
    ))
}

/// List visible projects
///
/// ADMIN and PROJECT_MANAGER see every project; everyone else sees the
/// projects they lead or belong to.
#[utoipa::path(
    get,
    path = "/api/v1/projects",
    params(PageQuery),
    responses(
        (status = 200, description = "Projects", body = Vec<ProjectResponse>)
    ),
    tag = "projects"
)]
pub async fn list_projects(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Query(page): Query<PageQuery>,
) -> ApiResult<Json<Vec<ProjectResponse>>> {
    let scope = visibility(&current.actor());
    debug!("Listing projects for user {} ({:?})", current.0.id, scope);

    let mut query = project::Entity::find().order_by_asc(project::Column::Id);
    if let Visibility::Scoped(user_id) = scope {
        query = query.filter(scoped_to(user_id));
    }
    let projects = query
        .offset(page.offset())
        .limit(page.limit())
        .all(&state.db)
        .await?;

    let mut out = Vec::with_capacity(projects.len());
    for model in projects {
        let membership = load_membership(&state.db, &model).await?;
        out.push(project_response(model, membership));
    }
    Ok(Json(out))
}

/// Get a project
#[utoipa::path(
    get,
    path = "/api/v1/projects/{id}",
    params(("id" = i32, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Project", body = ProjectResponse),
        (status = 403, description = "Not a member", body = ErrorResponse),
        (status = 404, description = "Project not found", body = ErrorResponse)
    ),
    tag = "projects"
)]
pub async fn get_project(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> ApiResult<Json<ProjectResponse>> {
    let (model, membership) = find_project(&state.db, id).await?;
    require_access(&membership, &current)?;
    Ok(Json(project_response(model, membership)))
}

/// Update a project
///
/// A team lead may edit their own project but not its team lead or client
/// (`FIELD_LOCKED`). Dates are re-checked only when one of them changes.
#[utoipa::path(
    patch,
    path = "/api/v1/projects/{id}",
    params(("id" = i32, Path, description = "Project ID")),
    request_body = UpdateProjectRequest,
    responses(
        (status = 200, description = "Project updated", body = ProjectResponse),
        (status = 400, description = "Team lead or client has the wrong role", body = ErrorResponse),
        (status = 403, description = "Not allowed, or field locked", body = ErrorResponse),
        (status = 404, description = "Project or referenced user not found", body = ErrorResponse),
        (status = 422, description = "Invalid fields", body = ErrorResponse)
    ),
    tag = "projects"
)]
pub async fn update_project(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i32>,
    Json(req): Json<UpdateProjectRequest>,
) -> ApiResult<Json<ProjectResponse>> {
    let txn = state.db.begin().await?;
    let (existing, membership) = find_project(&txn, id).await?;

    require_manage(&membership, &current)?;
    check_field_locks(&membership, &current.actor(), req.team_lead_id, req.client_id)?;

    let mut errors = ValidationErrors::new();
    if let Some(name) = &req.name {
        check_not_blank("name", name, &mut errors);
    }
    if let Some((start, end)) = effective_timeline(
        existing.start_date,
        existing.end_date,
        req.start_date,
        req.end_date,
    ) {
        check_timeline(start, end, &mut errors);
    }
    errors.into_result()?;

    if let Some(Some(lead_id)) = req.team_lead_id {
        check_team_lead(&txn, lead_id).await?;
    }
    if let Some(Some(client_id)) = req.client_id {
        check_client(&txn, client_id).await?;
    }
    let member_ids = req.member_ids.as_deref().map(dedupe_ids);
    if let Some(ids) = &member_ids {
        resolve_users(&txn, ids).await?;
    }

    let mut active = existing.into_active_model();
    if let Some(name) = req.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(description) = req.description {
        active.description = Set(description);
    }
    if let Some(team_lead_id) = req.team_lead_id {
        active.team_lead_id = Set(team_lead_id);
    }
    if let Some(client_id) = req.client_id {
        active.client_id = Set(client_id);
    }
    if let Some(start_date) = req.start_date {
        active.start_date = Set(start_date);
    }
    if let Some(end_date) = req.end_date {
        active.end_date = Set(end_date);
    }
    if let Some(status) = req.status {
        active.status = Set(status);
    }
    let updated = active.update(&txn).await?;

    if let Some(ids) = &member_ids {
        replace_members(&txn, updated.id, ids).await?;
    }
    let membership = load_membership(&txn, &updated).await?;
    txn.commit().await?;

    info!("User {} updated project {}", current.0.id, updated.id);
    Ok(Json(project_response(updated, membership)))
}

/// Delete a project and its tasks
#[utoipa::path(
    delete,
    path = "/api/v1/projects/{id}",
    params(("id" = i32, Path, description = "Project ID")),
    responses(
        (status = 204, description = "Project deleted"),
        (status = 403, description = "Not allowed", body = ErrorResponse),
        (status = 404, description = "Project not found", body = ErrorResponse)
    ),
    tag = "projects"
)]
pub async fn delete_project(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> ApiResult<StatusCode> {
    let txn = state.db.begin().await?;
    let (existing, membership) = find_project(&txn, id).await?;
    require_manage(&membership, &current)?;

    existing.delete(&txn).await?;
    txn.commit().await?;

    info!("User {} deleted project {}", current.0.id, id);
    Ok(StatusCode::NO_CONTENT)
}

/// List a project's members in join order
#[utoipa::path(
    get,
    path = "/api/v1/projects/{id}/members",
    params(("id" = i32, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Members", body = Vec<UserResponse>),
        (status = 403, description = "Not a member", body = ErrorResponse),
        (status = 404, description = "Project not found", body = ErrorResponse)
    ),
    tag = "projects"
)]
pub async fn list_members(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> ApiResult<Json<Vec<UserResponse>>> {
    let (_, membership) = find_project(&state.db, id).await?;
    require_access(&membership, &current)?;

    let mut users = user::Entity::find()
        .filter(user::Column::Id.is_in(membership.member_ids.iter().copied()))
        .all(&state.db)
        .await?;
    users.sort_by_key(|u| {
        membership
            .member_ids
            .iter()
            .position(|m| *m == u.id)
            .unwrap_or(usize::MAX)
    });

    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// Add members to a project
#[utoipa::path(
    post,
    path = "/api/v1/projects/{id}/members",
    params(("id" = i32, Path, description = "Project ID")),
    request_body = ProjectMembersRequest,
    responses(
        (status = 200, description = "Project with updated members", body = ProjectResponse),
        (status = 403, description = "Not allowed", body = ErrorResponse),
        (status = 404, description = "Project or users not found", body = ErrorResponse)
    ),
    tag = "projects"
)]
pub async fn add_members(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i32>,
    Json(req): Json<ProjectMembersRequest>,
) -> ApiResult<Json<ProjectResponse>> {
    let txn = state.db.begin().await?;
    let (existing, membership) = find_project(&txn, id).await?;
    require_manage(&membership, &current)?;

    let ids = dedupe_ids(&req.user_ids);
    resolve_users(&txn, &ids).await?;
    let added = append_members(&txn, id, &ids).await?;

    let membership = load_membership(&txn, &existing).await?;
    txn.commit().await?;

    info!("User {} added {:?} to project {}", current.0.id, added, id);
    Ok(Json(project_response(existing, membership)))
}

/// Remove members from a project
#[utoipa::path(
    delete,
    path = "/api/v1/projects/{id}/members",
    params(("id" = i32, Path, description = "Project ID")),
    request_body = ProjectMembersRequest,
    responses(
        (status = 200, description = "Project with updated members", body = ProjectResponse),
        (status = 403, description = "Not allowed", body = ErrorResponse),
        (status = 404, description = "Project not found", body = ErrorResponse)
    ),
    tag = "projects"
)]
pub async fn remove_project_members(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i32>,
    Json(req): Json<ProjectMembersRequest>,
) -> ApiResult<Json<ProjectResponse>> {
    let txn = state.db.begin().await?;
    let (existing, membership) = find_project(&txn, id).await?;
    require_manage(&membership, &current)?;

    let removed = remove_members(&txn, id, &dedupe_ids(&req.user_ids)).await?;
    let membership = load_membership(&txn, &existing).await?;
    txn.commit().await?;

    info!("User {} removed {} members from project {}", current.0.id, removed, id);
    Ok(Json(project_response(existing, membership)))
}
