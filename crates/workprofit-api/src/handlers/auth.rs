use axum::{extract::State, http::StatusCode, Extension, Json};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, QueryFilter, Set,
    TransactionTrait,
};
use std::sync::Arc;
use tracing::{info, warn};
use workprofit_auth::{hash_password, verify_password};
use workprofit_core::validate::{check_department, check_email, check_not_blank};
use workprofit_core::{Role, ValidationErrors};
use workprofit_db::entities::user;

use super::normalize_email;
use crate::error::{ApiError, ApiResult};
use crate::middleware::CurrentUser;
use crate::models::*;
use crate::AppState;

/// Register a new account
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = UserResponse),
        (status = 403, description = "Signup disabled or ADMIN requested", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse),
        (status = 422, description = "Invalid fields", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    if !state.allow_signup {
        return Err(ApiError::forbidden("Public registration is disabled"));
    }
    if req.role == Role::Admin {
        return Err(ApiError::forbidden("ADMIN accounts cannot be self-registered"));
    }

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

    let taken = user::Entity::find()
        .filter(user::Column::Email.eq(email.as_str()))
        .one(&txn)
        .await?
        .is_some();
    if taken {
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
        avatar_url: Set(None),
        is_active: Set(true),
        last_login: Set(None),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await
    .map_err(|e| ApiError::conflict_on_unique(e, "Email already registered"))?;

    txn.commit().await?;

    info!("Registered user {} ({}) as {}", created.id, created.email, created.role);
    Ok((StatusCode::CREATED, Json(created.into())))
}

/// Exchange credentials for a bearer token
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 401, description = "Incorrect email or password", body = ErrorResponse),
        (status = 403, description = "Account is inactive", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<TokenResponse>> {
    let email = normalize_email(&req.email);
    let bad_credentials = || ApiError::Unauthorized("Incorrect email or password".to_string());

    let txn = state.db.begin().await?;

    let account = user::Entity::find()
        .filter(user::Column::Email.eq(email.as_str()))
        .one(&txn)
        .await?
        .ok_or_else(bad_credentials)?;

    let matches = verify_password(&req.password, &account.password_hash).unwrap_or_else(|e| {
        warn!("Stored hash for user {} is unusable: {}", account.id, e);
        false
    });
    if !matches {
        return Err(bad_credentials());
    }

    if !account.is_active {
        return Err(ApiError::forbidden("User account is inactive"));
    }

    let mut active = account.into_active_model();
    active.last_login = Set(Some(Utc::now()));
    let account = active.update(&txn).await?;
    txn.commit().await?;

    let access_token = state
        .jwt
        .issue(&account.email)
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    info!("User {} logged in", account.id);
    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
    }))
}

/// The authenticated user's own record
#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn me(Extension(current): Extension<CurrentUser>) -> Json<UserResponse> {
    Json(current.0.into())
}
