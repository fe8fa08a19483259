//! Bearer token session middleware.
//!
//! Extracts `Authorization: Bearer <token>`, resolves the caller's profile
//! and roles from the database, and injects `CallerContext` into request
//! extensions for downstream handlers.
//!
//! Two gates: `require_session` admits any valid token (used by the
//! self-profile read so a pending user can see their approval status), and
//! `require_active` additionally demands an active profile.

use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, CallerContext};
use crate::auth;
use crate::db::repository;
use crate::models::enums::ProfileStatus;

/// Admit any authenticated caller, whatever their profile status.
pub async fn require_session(req: Request<axum::body::Body>, next: Next) -> Response {
    match resolve_caller(req).await {
        Ok((req, _)) => next.run(req).await,
        Err(err) => err.into_response(),
    }
}

/// Admit only callers with an active profile.
pub async fn require_active(req: Request<axum::body::Body>, next: Next) -> Response {
    match resolve_caller(req).await {
        Ok((req, caller)) => {
            if caller.status != ProfileStatus::Active {
                return ApiError::Forbidden("account is not active".into()).into_response();
            }
            next.run(req).await
        }
        Err(err) => err.into_response(),
    }
}

async fn resolve_caller(
    mut req: Request<axum::body::Body>,
) -> Result<(Request<axum::body::Body>, CallerContext), ApiError> {
    let ctx: ApiContext = req
        .extensions()
        .get::<ApiContext>()
        .cloned()
        .ok_or(ApiError::Internal("missing API context".into()))?;

    let token = req
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(ApiError::Unauthenticated)?
        .to_string();

    let user_id = auth::decode_token(ctx.config.jwt_secret.as_bytes(), &token)?;

    let caller = {
        let conn = ctx.db()?;
        let profile =
            repository::get_profile(&conn, &user_id)?.ok_or(ApiError::Unauthenticated)?;
        let roles = repository::get_roles(&conn, &user_id)?;
        CallerContext {
            id: profile.id,
            email: profile.email,
            roles,
            status: profile.status,
        }
    }; // MutexGuard dropped before any .await

    req.extensions_mut().insert(caller.clone());
    Ok((req, caller))
}
