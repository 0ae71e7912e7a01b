use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, ModelTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use std::sync::Arc;
use tracing::info;
use workprofit_core::policy::can_manage_labels;
use workprofit_core::validate::check_not_blank;
use workprofit_core::ValidationErrors;
use workprofit_db::entities::label;

use super::find_label;
use crate::error::{ApiError, ApiResult};
use crate::middleware::CurrentUser;
use crate::models::*;
use crate::AppState;

const DUPLICATE: &str = "Label already exists";

fn require_label_admin(current: &CurrentUser) -> ApiResult<()> {
    if can_manage_labels(&current.actor()) {
        Ok(())
    } else {
        Err(ApiError::forbidden(
            "Only ADMIN or PROJECT_MANAGER can manage labels",
        ))
    }
}

/// Fails with 409 when another label already uses `name`.
async fn ensure_name_free<C: ConnectionTrait>(
    conn: &C,
    name: &str,
    except: Option<i32>,
) -> ApiResult<()> {
    let mut query = label::Entity::find().filter(label::Column::Name.eq(name));
    if let Some(id) = except {
        query = query.filter(label::Column::Id.ne(id));
    }
    if query.one(conn).await?.is_some() {
        return Err(ApiError::Conflict(DUPLICATE.to_string()));
    }
    Ok(())
}

/// List all labels by name
#[utoipa::path(
    get,
    path = "/api/v1/labels",
    responses(
        (status = 200, description = "Labels", body = Vec<LabelResponse>)
    ),
    tag = "labels"
)]
pub async fn list_labels(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<LabelResponse>>> {
    let labels = label::Entity::find()
        .order_by_asc(label::Column::Name)
        .all(&state.db)
        .await?;
    Ok(Json(labels.into_iter().map(LabelResponse::from).collect()))
}

/// Create a label (ADMIN, PROJECT_MANAGER)
#[utoipa::path(
    post,
    path = "/api/v1/labels",
    request_body = CreateLabelRequest,
    responses(
        (status = 201, description = "Label created", body = LabelResponse),
        (status = 403, description = "Not allowed", body = ErrorResponse),
        (status = 409, description = "Label already exists", body = ErrorResponse),
        (status = 422, description = "Invalid fields", body = ErrorResponse)
    ),
    tag = "labels"
)]
pub async fn create_label(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<CreateLabelRequest>,
) -> ApiResult<(StatusCode, Json<LabelResponse>)> {
    require_label_admin(&current)?;

    let mut errors = ValidationErrors::new();
    check_not_blank("name", &req.name, &mut errors);
    if let Some(color) = &req.color {
        check_not_blank("color", color, &mut errors);
    }
    errors.into_result()?;

    let name = req.name.trim().to_string();
    let txn = state.db.begin().await?;
    ensure_name_free(&txn, &name, None).await?;

    let created = label::ActiveModel {
        name: Set(name),
        color: Set(req
            .color
            .unwrap_or_else(|| label::DEFAULT_COLOR.to_string())),
        ..Default::default()
    }
    .insert(&txn)
    .await
    .map_err(|e| ApiError::conflict_on_unique(e, DUPLICATE))?;
    txn.commit().await?;

    info!("User {} created label {} ({})", current.0.id, created.id, created.name);
    Ok((StatusCode::CREATED, Json(created.into())))
}

/// Rename or recolor a label (ADMIN, PROJECT_MANAGER)
#[utoipa::path(
    patch,
    path = "/api/v1/labels/{id}",
    params(("id" = i32, Path, description = "Label ID")),
    request_body = UpdateLabelRequest,
    responses(
        (status = 200, description = "Label updated", body = LabelResponse),
        (status = 403, description = "Not allowed", body = ErrorResponse),
        (status = 404, description = "Label not found", body = ErrorResponse),
        (status = 409, description = "Label already exists", body = ErrorResponse),
        (status = 422, description = "Invalid fields", body = ErrorResponse)
    ),
    tag = "labels"
)]
pub async fn update_label(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i32>,
    Json(req): Json<UpdateLabelRequest>,
) -> ApiResult<Json<LabelResponse>> {
    require_label_admin(&current)?;

    let mut errors = ValidationErrors::new();
    if let Some(name) = &req.name {
        check_not_blank("name", name, &mut errors);
    }
    if let Some(color) = &req.color {
        check_not_blank("color", color, &mut errors);
    }
    errors.into_result()?;

    let txn = state.db.begin().await?;
    let existing = find_label(&txn, id).await?;

    let mut active = existing.into_active_model();
    if let Some(name) = req.name {
        let name = name.trim().to_string();
        ensure_name_free(&txn, &name, Some(id)).await?;
        active.name = Set(name);
    }
    if let Some(color) = req.color {
        active.color = Set(color);
    }
    let updated = active
        .update(&txn)
        .await
        .map_err(|e| ApiError::conflict_on_unique(e, DUPLICATE))?;
    txn.commit().await?;

    info!("User {} updated label {}", current.0.id, id);
    Ok(Json(updated.into()))
}

/// Delete a label; tasks lose it
#[utoipa::path(
    delete,
    path = "/api/v1/labels/{id}",
    params(("id" = i32, Path, description = "Label ID")),
    responses(
        (status = 204, description = "Label deleted"),
        (status = 403, description = "Not allowed", body = ErrorResponse),
        (status = 404, description = "Label not found", body = ErrorResponse)
    ),
    tag = "labels"
)]
pub async fn delete_label(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> ApiResult<StatusCode> {
    require_label_admin(&current)?;

    let txn = state.db.begin().await?;
    let existing = find_label(&txn, id).await?;
    existing.delete(&txn).await?;
    txn.commit().await?;

    info!("User {} deleted label {}", current.0.id, id);
    Ok(StatusCode::NO_CONTENT)
}
