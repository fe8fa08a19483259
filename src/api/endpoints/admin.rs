//! Admin endpoints: aggregates, user listings, activation.

use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, CallerContext};
use crate::db::repository::{self, AdminStats, Provider};
use crate::models::enums::{NotificationKind, Role};
use crate::models::Profile;

/// `GET /admin/stats` — aggregate counts for the dashboard.
pub async fn stats(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
) -> Result<Json<AdminStats>, ApiError> {
    caller.require_role(Role::Admin)?;
    let conn = ctx.db()?;
    Ok(Json(repository::admin_stats(&conn)?))
}

#[derive(Serialize)]
pub struct PendingUsersResponse {
    pub users: Vec<Profile>,
}

/// `GET /admin/users/pending` — accounts awaiting activation.
pub async fn pending_users(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
) -> Result<Json<PendingUsersResponse>, ApiError> {
    caller.require_role(Role::Admin)?;
    let conn = ctx.db()?;
    Ok(Json(PendingUsersResponse {
        users: repository::list_pending_profiles(&conn)?,
    }))
}

#[derive(Serialize)]
pub struct ProvidersResponse {
    pub providers: Vec<Provider>,
}

/// `GET /admin/users/providers` — active clinical staff with facility.
pub async fn providers(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
) -> Result<Json<ProvidersResponse>, ApiError> {
    caller.require_role(Role::Admin)?;
    let conn = ctx.db()?;
    Ok(Json(ProvidersResponse {
        providers: repository::list_providers(&conn)?,
    }))
}

#[derive(Deserialize, Default)]
pub struct ActivateRequest {
    /// Role to grant alongside activation; ignored when the user already
    /// holds one.
    pub role: Option<Role>,
}

/// `POST /admin/users/:id/activate` — set status=active and optionally
/// grant a first role, in one transaction.
pub async fn activate(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
    body: Option<Json<ActivateRequest>>,
) -> Result<Json<Profile>, ApiError> {
    caller.require_role(Role::Admin)?;
    let user_id = Uuid::parse_str(&id)
        .map_err(|e| ApiError::Validation(format!("invalid user id: {e}")))?;
    let role = body.map(|Json(b)| b.role).unwrap_or_default();

    let mut conn = ctx.db()?;
    let profile = repository::activate_profile(&mut conn, &user_id, role)?;

    if let Err(e) = repository::notify(
        &conn,
        &user_id,
        "Account activated",
        "Your AfyaLink account has been approved",
        NotificationKind::Account,
    ) {
        tracing::warn!(user_id = %user_id, "activation notification failed: {e}");
    }

    tracing::info!(user_id = %user_id, admin = %caller.id, "account activated");
    Ok(Json(profile))
}
