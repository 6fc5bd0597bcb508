// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Authentication handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use tender_core::{Role, UserAccount, UserCheck};

use crate::auth::{hash_password_async, verify_password_async};
use crate::error::{ApiError, ApiResult, ValidationErrors};
use crate::extractors::{Auth, ValidatedJson};
use crate::response::{AuthResponse, CurrentUserResponse, UserResponse};
use crate::state::AppState;

/// Minimum accepted password length.
pub const MIN_PASSWORD_LEN: usize = 8;

// =============================================================================
// Login
// =============================================================================

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// User name.
    #[serde(alias = "userName", alias = "username")]
    pub user_name: String,
    /// Password.
    pub password: String,
}

/// POST /v1/auth/login
///
/// Checks the credentials and returns a JWT.
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    if request.user_name.trim().is_empty() || request.password.is_empty() {
        return Err(ApiError::bad_request("User name and password are required"));
    }

    let found = state.users().find_by_name(request.user_name.trim()).await?;
    let verified = match &found {
        Some(account) => verify_password_async(&request.password, &account.password_hash).await,
        None => false,
    };
    let Some(account) = found.filter(|_| verified) else {
        tracing::info!(user = %request.user_name, "Rejected sign-in attempt");
        return Err(ApiError::unauthorized("Invalid user name or password"));
    };

    let response = issue_token(&state, &account)?;
    tracing::info!(user = %account.user_name, "User signed in");
    Ok(Json(response))
}

// =============================================================================
// Signup
// =============================================================================

/// Signup request body.
#[derive(Debug, Deserialize)]
pub struct SignUpRequest {
    /// Desired user name.
    #[serde(alias = "userName", alias = "username")]
    pub user_name: String,
    /// Contact email.
    pub email: String,
    /// Password.
    pub password: String,
}

/// POST /v1/auth/signup
///
/// Registers a `ROLE_USER` account. Role requests in the body are ignored;
/// administrators grant other roles through the management API.
pub async fn signup(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<SignUpRequest>,
) -> ApiResult<impl IntoResponse> {
    if !state.config.signup_enabled {
        return Err(ApiError::forbidden("Signup is disabled"));
    }

    validate_new_account(&request.user_name, &request.email, &request.password)?;

    let account = UserAccount::new(
        request.user_name.trim(),
        request.email.trim(),
        hash_password_async(&request.password).await?,
        vec![Role::User],
    );
    let saved = state.users().insert(account).await?;

    tracing::info!(user = %saved.user_name, "Registered new user");
    Ok((StatusCode::CREATED, Json(UserResponse::from(saved))))
}

/// Checks the fields of a new account, reporting every failure.
pub fn validate_new_account(user_name: &str, email: &str, password: &str) -> ApiResult<()> {
    let mut errors = ValidationErrors::new();

    if user_name.trim().is_empty() {
        errors.add("user_name", "must not be blank");
    } else if user_name.trim().chars().any(char::is_whitespace) {
        errors.add("user_name", "must not contain whitespace");
    }
    let email = email.trim();
    if !email.contains('@') || email.starts_with('@') || email.ends_with('@') {
        errors.add("email", "is not a valid address");
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        errors.add(
            "password",
            format!("must be at least {MIN_PASSWORD_LEN} characters"),
        );
    }

    errors.into_result(())
}

// =============================================================================
// One-time codes
// =============================================================================

/// GET /v1/auth/code/{code}
///
/// Trades a one-time login code for a token. The code is consumed even when
/// the account turns out to be unusable.
pub async fn redeem_code(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let user_name = state
        .login_codes()
        .redeem(&code)
        .ok_or_else(|| ApiError::unauthorized("Invalid or expired login code"))?;

    let account = state
        .users()
        .find_by_name(&user_name)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Login code refers to an unknown user"))?;

    let response = issue_token(&state, &account)?;
    tracing::info!(user = %account.user_name, "User signed in with login code");
    Ok(Json(response))
}

// =============================================================================
// Current principal
// =============================================================================

/// GET /v1/auth/me
pub async fn current_user(Auth(ctx): Auth) -> impl IntoResponse {
    Json(CurrentUserResponse {
        user_name: ctx.user_id,
        roles: ctx.roles,
    })
}

/// Token self-check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenCheckResponse {
    /// Always `true`; invalid tokens never reach the handler.
    pub valid: bool,
    /// Token subject.
    pub user_name: String,
}

/// GET /v1/auth/test/jwt
///
/// Lets the browser extension confirm its stored token still works.
pub async fn test_jwt(Auth(ctx): Auth) -> impl IntoResponse {
    Json(TokenCheckResponse {
        valid: true,
        user_name: ctx.user_id,
    })
}

// =============================================================================
// Helpers
// =============================================================================

/// Issues a token for an account that passed its credential check.
fn issue_token(state: &AppState, account: &UserAccount) -> ApiResult<AuthResponse> {
    if account.check() == UserCheck::Incorrected {
        tracing::info!(user = %account.user_name, status = ?account.status, "Refused token for inactive account");
        return Err(ApiError::forbidden("Account is not active"));
    }

    let token = state.jwt().create_access_token(&account.user_name, &account.roles)?;
    Ok(AuthResponse::new(
        token,
        state.jwt().expiration_secs(),
        account.user_name.clone(),
        account.roles.clone(),
    ))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_new_account() {
        assert!(validate_new_account("alice", "alice@example.org", "long-enough").is_ok());

        let Err(ApiError::Validation {
            errors: Some(errors),
            ..
        }) = validate_new_account(" ", "nope", "short")
        else {
            panic!("expected field errors");
        };
        assert!(errors.has_field("user_name"));
        assert!(errors.has_field("email"));
        assert!(errors.has_field("password"));

        assert!(validate_new_account("two words", "a@b", "long-enough").is_err());
    }
}
