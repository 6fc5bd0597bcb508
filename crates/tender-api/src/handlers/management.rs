// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Management handlers, reserved for administrators and the extension.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use tender_core::{Role, UserAccount, UserCheck, UserStatus};

use super::{parse_id, validate_new_account};
use crate::auth::hash_password_async;
use crate::error::{ApiError, ApiResult, ValidationErrors};
use crate::extractors::{Auth, ValidatedJson};
use crate::response::{LoginCodeResponse, MessageResponse, UserResponse};
use crate::state::AppState;

// =============================================================================
// Procurements
// =============================================================================

/// DELETE /api/v1/management/procurements/{id}
pub async fn delete_procurement(
    State(state): State<AppState>,
    Auth(ctx): Auth,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_id(&id)?;
    state.procurements().delete_by_id(id).await?;

    tracing::info!(user = %ctx.user_id, id = %id, "Procurement deleted by request");
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Users
// =============================================================================

/// Request body for creating an account with explicit roles.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    /// User name.
    #[serde(alias = "userName", alias = "username")]
    pub user_name: String,
    /// Contact email.
    pub email: String,
    /// Password.
    pub password: String,
    /// Role wire names; empty means `ROLE_USER`.
    #[serde(default)]
    pub roles: Vec<String>,
}

/// GET /api/v1/management/users
pub async fn list_users(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let users: Vec<UserResponse> = state
        .users()
        .list_all()
        .await?
        .into_iter()
        .map(UserResponse::from)
        .collect();
    Ok(Json(users))
}

/// POST /api/v1/management/users
///
/// Unlike public signup this accepts any role, but unknown role names are
/// rejected rather than dropped.
pub async fn create_user(
    State(state): State<AppState>,
    Auth(ctx): Auth,
    ValidatedJson(request): ValidatedJson<CreateUserRequest>,
) -> ApiResult<impl IntoResponse> {
    validate_new_account(&request.user_name, &request.email, &request.password)?;
    let roles = parse_requested_roles(&request.roles)?;

    let account = UserAccount::new(
        request.user_name.trim(),
        request.email.trim(),
        hash_password_async(&request.password).await?,
        roles,
    );
    let saved = state.users().insert(account).await?;

    tracing::info!(
        by = %ctx.user_id,
        user = %saved.user_name,
        roles = ?saved.roles,
        "Created user account"
    );
    Ok((StatusCode::CREATED, Json(UserResponse::from(saved))))
}

/// Request body for changing an account's status.
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    /// New status.
    pub status: UserStatus,
}

/// PUT /api/v1/management/users/{user_name}/status
pub async fn update_user_status(
    State(state): State<AppState>,
    Auth(ctx): Auth,
    Path(user_name): Path<String>,
    ValidatedJson(request): ValidatedJson<UpdateStatusRequest>,
) -> ApiResult<impl IntoResponse> {
    if !state.users().set_status(&user_name, request.status).await? {
        return Err(ApiError::not_found(format!("User '{user_name}' was not found")));
    }

    tracing::info!(by = %ctx.user_id, user = %user_name, status = ?request.status, "Changed user status");
    Ok(Json(MessageResponse::new(format!(
        "User '{user_name}' is now {}",
        request.status.as_str()
    ))))
}

fn parse_requested_roles(names: &[String]) -> ApiResult<Vec<Role>> {
    if names.is_empty() {
        return Ok(vec![Role::User]);
    }

    let mut errors = ValidationErrors::new();
    for name in names {
        if Role::parse(name).is_none() {
            errors.add("roles", format!("unknown role '{name}'"));
        }
    }
    errors.into_result(())?;

    Ok(Role::parse_all(names.iter().map(String::as_str)))
}

// =============================================================================
// Login codes
// =============================================================================

/// Request body for issuing a login code.
#[derive(Debug, Deserialize)]
pub struct IssueCodeRequest {
    /// Account the code signs in as.
    #[serde(alias = "userName", alias = "username")]
    pub user_name: String,
}

/// POST /api/v1/management/codes
pub async fn issue_login_code(
    State(state): State<AppState>,
    Auth(ctx): Auth,
    ValidatedJson(request): ValidatedJson<IssueCodeRequest>,
) -> ApiResult<impl IntoResponse> {
    let account = state
        .users()
        .find_by_name(request.user_name.trim())
        .await?
        .ok_or_else(|| ApiError::not_found(format!("User '{}' was not found", request.user_name)))?;

    if account.check() == UserCheck::Incorrected {
        return Err(ApiError::conflict(format!(
            "User '{}' is not active",
            account.user_name
        )));
    }

    state.login_codes().purge_expired();
    let issued = state.login_codes().issue(account.user_name);

    tracing::info!(by = %ctx.user_id, user = %issued.user_name, "Issued login code");
    Ok((
        StatusCode::CREATED,
        Json(LoginCodeResponse {
            code: issued.code,
            user_name: issued.user_name,
            expires_at: issued.expires_at,
        }),
    ))
}
