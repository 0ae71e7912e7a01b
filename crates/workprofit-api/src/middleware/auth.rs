//! Bearer authentication middleware
//!
//! Validates the `Authorization: Bearer <token>` header, resolves the token
//! subject (an email) to an active user, and makes that user available to
//! handlers through [`CurrentUser`].

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use std::sync::Arc;
use tracing::{debug, warn};
use workprofit_core::Actor;
use workprofit_db::entities::user;

use crate::error::ApiError;
use crate::AppState;

/// The authenticated user, loaded fresh for each request
#[derive(Debug, Clone)]
pub struct CurrentUser(pub user::Model);

impl CurrentUser {
    pub fn actor(&self) -> Actor {
        Actor::new(self.0.id, self.0.role)
    }
}

fn bearer_token(request: &Request) -> Result<&str, ApiError> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".to_string()))?;

    auth_header
        .strip_prefix("Bearer ")
        .or_else(|| auth_header.strip_prefix("bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| {
            ApiError::Unauthorized(
                "Invalid Authorization header format. Expected 'Bearer <token>'".to_string(),
            )
        })
}

/// Rejects with 401 when the token is missing, malformed, expired or names
/// no user, and with 403 when the user has been deactivated.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(&request)?;

    let claims = state.jwt.validate(token).map_err(|e| {
        warn!("Rejected token: {}", e);
        ApiError::Unauthorized("Could not validate credentials".to_string())
    })?;

    let account = user::Entity::find()
        .filter(user::Column::Email.eq(claims.sub.as_str()))
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Could not validate credentials".to_string()))?;

    if !account.is_active {
        warn!("Inactive user {} presented a token", account.id);
        return Err(ApiError::forbidden("User account is inactive"));
    }

    debug!(user_id = account.id, role = %account.role, "Authenticated request");
    request.extensions_mut().insert(CurrentUser(account));

    Ok(next.run(request).await)
}
