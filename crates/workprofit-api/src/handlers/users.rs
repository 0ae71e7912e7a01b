use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use std::sync::Arc;
use tracing::{debug, info};
use workprofit_auth::hash_password;
use workprofit_core::policy::{can_administer_users, can_view_user};
use workprofit_core::validate::{check_department, check_email, check_not_blank};
use workprofit_core::ValidationErrors;
use workprofit_db::entities::user;

use super::{find_user, normalize_email};
use crate::error::{ApiError, ApiResult};
use crate::middleware::CurrentUser;
use crate::models::*;
use crate::AppState;

fn require_admin(current: &CurrentUser) -> ApiResult<()> {
    if can_administer_users(&current.actor()) {
        Ok(())
    } else {
        Err(ApiError::forbidden("The user doesn't have enough privileges"))
    }
}

/// List users (ADMIN)
#[utoipa::path(
    get,
    path = "/api/v1/users",
    params(PageQuery),
    responses(
        (status = 200, description = "Users", body = Vec<UserResponse>),
        (status = 403, description = "Not an admin", body = ErrorResponse)
    ),
    tag = "users"
)]
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Query(page): Query<PageQuery>,
) -> ApiResult<Json<Vec<UserResponse>>> {
    require_admin(&current)?;
    debug!("Listing users: {:?}", page);

    let users = user::Entity::find()
        .order_by_asc(user::Column::Id)
        .offset(page.offset())
        .limit(page.limit())
        .all(&state.db)
        .await?;

    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// Create a user of any role (ADMIN)
#[utoipa::path(
    post,
    path = "/api/v1/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 403, description = "Not an admin", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse),
        (status = 422, description = "Invalid fields", body = ErrorResponse)
    ),
    tag = "users"
)]
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    require_admin(&current)?;

    let email = normalize_email(&req.email);
    let mut errors = ValidationErrors::new();
    check_email(&email, &mut errors);
    check_not_blank("password", &req.password, &mut errors);
    check_not_blank("first_name", &req.first_name, &mut errors);
    check_not_blank("last_name", &req.last_name, &mut errors);
    check_department(req.role, req.department, &mut errors);
    errors.into_result()?;

    let password_hash =
        hash_password(&req.password).map_err(|e| ApiError::Internal(e.to_string()))?;

    let txn = state.db.begin().await?;

    if user::Entity::find()
        .filter(user::Column::Email.eq(email.as_str()))
        .one(&txn)
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict("Email already registered".to_string()));
    }

    let created = user::ActiveModel {
        email: Set(email),
        password_hash: Set(password_hash),
        first_name: Set(req.first_name.trim().to_string()),
        last_name: Set(req.last_name.trim().to_string()),
        phone_number: Set(req.phone_number),
        role: Set(req.role),
        department: Set(req.department),
        avatar_url: Set(req.avatar_url),
        is_active: Set(true),
        last_login: Set(None),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await
    .map_err(|e| ApiError::conflict_on_unique(e, "Email already registered"))?;

    txn.commit().await?;

    info!("Admin {} created user {} as {}", current.0.id, created.id, created.role);
    Ok((StatusCode::CREATED, Json(created.into())))
}

/// Get a user (self or ADMIN)
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "User", body = UserResponse),
        (status = 403, description = "Not allowed to view this profile", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    tag = "users"
)]
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> ApiResult<Json<UserResponse>> {
    if !can_view_user(&current.actor(), id) {
        return Err(ApiError::forbidden("Not authorized to view this profile"));
    }
    let found = find_user(&state.db, id).await?;
    Ok(Json(found.into()))
}

/// Update a user (ADMIN)
///
/// The department rule is checked against the role and department the
/// user will have after the update.
#[utoipa::path(
    patch,
    path = "/api/v1/users/{id}",
    params(("id" = i32, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 403, description = "Not an admin", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 422, description = "Invalid fields", body = ErrorResponse)
    ),
    tag = "users"
)]
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i32>,
    Json(req): Json<UpdateUserRequest>,
) -> ApiResult<Json<UserResponse>> {
    require_admin(&current)?;

    let txn = state.db.begin().await?;
    let existing = find_user(&txn, id).await?;

    let role = req.role.unwrap_or(existing.role);
    let department = req.department.unwrap_or(existing.department);

    let mut errors = ValidationErrors::new();
    if let Some(first_name) = &req.first_name {
        check_not_blank("first_name", first_name, &mut errors);
    }
    if let Some(last_name) = &req.last_name {
        check_not_blank("last_name", last_name, &mut errors);
    }
    if let Some(password) = &req.password {
        check_not_blank("password", password, &mut errors);
    }
    check_department(role, department, &mut errors);
    errors.into_result()?;

    let mut active = existing.into_active_model();
    if let Some(first_name) = req.first_name {
        active.first_name = Set(first_name.trim().to_string());
    }
    if let Some(last_name) = req.last_name {
        active.last_name = Set(last_name.trim().to_string());
    }
    if let Some(phone_number) = req.phone_number {
        active.phone_number = Set(phone_number);
    }
    if let Some(avatar_url) = req.avatar_url {
        active.avatar_url = Set(avatar_url);
    }
    if let Some(is_active) = req.is_active {
        active.is_active = Set(is_active);
    }
    if let Some(password) = req.password {
        let hash = hash_password(&password).map_err(|e| ApiError::Internal(e.to_string()))?;
        active.password_hash = Set(hash);
    }
    active.role = Set(role);
    active.department = Set(department);

    let updated = active.update(&txn).await?;
    txn.commit().await?;

    info!("Admin {} updated user {}", current.0.id, updated.id);
    Ok(Json(updated.into()))
}

/// Deactivate a user (ADMIN). Rows are never deleted.
#[utoipa::path(
    delete,
    path = "/api/v1/users/{id}",
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 204, description = "User deactivated"),
        (status = 403, description = "Not an admin", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    tag = "users"
)]
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> ApiResult<StatusCode> {
    require_admin(&current)?;

    let txn = state.db.begin().await?;
    let existing = find_user(&txn, id).await?;

    let mut active = existing.into_active_model();
    active.is_active = Set(false);
    active.update(&txn).await?;
    txn.commit().await?;

    info!("Admin {} deactivated user {}", current.0.id, id);
    Ok(StatusCode::NO_CONTENT)
}
