//! Authentication endpoints: signup, login, self-profile.

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, CallerContext};
use crate::auth;
use crate::db::repository;
use crate::models::enums::{ProfileStatus, Role};
use crate::models::Profile;

#[derive(Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub phone: Option<String>,
    /// Shared secret mapping to a requested role; granted only on admin
    /// activation.
    pub registration_code: Option<String>,
}

#[derive(Serialize)]
pub struct SignupResponse {
    pub id: Uuid,
    pub status: ProfileStatus,
    pub requested_role: Option<Role>,
}

/// `POST /auth/signup` — create a pending account.
pub async fn signup(
    State(ctx): State<ApiContext>,
    Json(request): Json<SignupRequest>,
) -> Result<(StatusCode, Json<SignupResponse>), ApiError> {
    let email = request.email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(ApiError::Validation("a valid email is required".into()));
    }
    if request.password.len() < 8 {
        return Err(ApiError::Validation("password must be at least 8 characters".into()));
    }
    if request.full_name.trim().is_empty() {
        return Err(ApiError::Validation("full_name is required".into()));
    }

    let requested_role = match request.registration_code.as_deref() {
        Some(code) => Some(
            ctx.config
                .role_for_code(code)
                .ok_or_else(|| ApiError::Validation("unknown registration code".into()))?,
        ),
        None => None,
    };

    let password_hash = auth::hash_password(&request.password)?;
    let now = Utc::now();
    let profile = Profile {
        id: Uuid::new_v4(),
        email,
        password_hash,
        full_name: request.full_name.trim().to_string(),
        phone: request.phone,
        status: ProfileStatus::Pending,
        requested_role,
        created_at: now,
        updated_at: now,
    };

    {
        let conn = ctx.db()?;
        if repository::get_profile_by_email(&conn, &profile.email)?.is_some() {
            return Err(ApiError::Conflict("email already registered".into()));
        }
        repository::insert_profile(&conn, &profile)?;
    }

    tracing::info!(user_id = %profile.id, "new signup pending approval");

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            id: profile.id,
            status: profile.status,
            requested_role: profile.requested_role,
        }),
    ))
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub id: Uuid,
    pub full_name: String,
    pub roles: Vec<Role>,
}

/// `POST /auth/login` — issue a bearer token for an active account.
pub async fn login(
    State(ctx): State<ApiContext>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let (profile, roles) = {
        let conn = ctx.db()?;
        let profile = repository::get_profile_by_email(&conn, &request.email.trim().to_lowercase())?
            .ok_or(ApiError::Unauthenticated)?;
        let roles = repository::get_roles(&conn, &profile.id)?;
        (profile, roles)
    };

    if !auth::verify_password(&request.password, &profile.password_hash)? {
        return Err(ApiError::Unauthenticated);
    }
    if profile.status != ProfileStatus::Active {
        return Err(ApiError::Forbidden("account is awaiting activation".into()));
    }

    let token = auth::issue_token(
        ctx.config.jwt_secret.as_bytes(),
        &profile.id,
        ctx.config.token_ttl_secs,
    )?;

    Ok(Json(LoginResponse {
        token,
        id: profile.id,
        full_name: profile.full_name,
        roles,
    }))
}

#[derive(Serialize)]
pub struct MeResponse {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub roles: Vec<Role>,
    pub status: ProfileStatus,
    pub requested_role: Option<Role>,
}

/// `GET /auth/me` — caller identity, roles and status.
///
/// Mounted behind `require_session` (not `require_active`) so a pending
/// user can see their approval status.
pub async fn me(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
) -> Result<Json<MeResponse>, ApiError> {
    let profile = {
        let conn = ctx.db()?;
        repository::get_profile(&conn, &caller.id)?.ok_or(ApiError::Unauthenticated)?
    };

    Ok(Json(MeResponse {
        id: profile.id,
        email: profile.email,
        full_name: profile.full_name,
        phone: profile.phone,
        roles: caller.roles,
        status: profile.status,
        requested_role: profile.requested_role,
    }))
}
