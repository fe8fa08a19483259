//! Notification endpoints: personal inbox plus admin broadcast.

use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, CallerContext};
use crate::db::repository;
use crate::models::enums::Role;
use crate::models::Notification;

#[derive(Serialize)]
pub struct InboxResponse {
    pub notifications: Vec<Notification>,
}

/// `GET /notifications` — the caller's inbox, newest first.
pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
) -> Result<Json<InboxResponse>, ApiError> {
    let conn = ctx.db()?;
    Ok(Json(InboxResponse {
        notifications: repository::list_notifications(&conn, &caller.id)?,
    }))
}

#[derive(Serialize)]
pub struct MarkReadResponse {
    pub updated: usize,
}

/// `PUT /notifications/:id/read` — 404 unless the row exists and belongs
/// to the caller.
pub async fn mark_read(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
) -> Result<Json<MarkReadResponse>, ApiError> {
    let id = Uuid::parse_str(&id)
        .map_err(|e| ApiError::Validation(format!("invalid notification id: {e}")))?;
    let conn = ctx.db()?;
    if !repository::mark_notification_read(&conn, &caller.id, &id)? {
        return Err(ApiError::NotFound("notification not found".into()));
    }
    Ok(Json(MarkReadResponse { updated: 1 }))
}

/// `PUT /notifications/read-all` — idempotent bulk read.
pub async fn mark_all_read(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
) -> Result<Json<MarkReadResponse>, ApiError> {
    let conn = ctx.db()?;
    let updated = repository::mark_all_notifications_read(&conn, &caller.id)?;
    Ok(Json(MarkReadResponse { updated }))
}

#[derive(Deserialize)]
pub struct BroadcastRequest {
    pub title: String,
    pub message: String,
    /// When set, only active holders of this role receive the message.
    pub role: Option<Role>,
}

#[derive(Serialize)]
pub struct BroadcastResponse {
    pub recipients: usize,
}

/// `POST /notifications/broadcast` — admin fanout to a role cohort or to
/// every active profile.
pub async fn broadcast(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
    Json(request): Json<BroadcastRequest>,
) -> Result<Json<BroadcastResponse>, ApiError> {
    caller.require_role(Role::Admin)?;
    if request.title.trim().is_empty() || request.message.trim().is_empty() {
        return Err(ApiError::Validation("title and message are required".into()));
    }

    let mut conn = ctx.db()?;
    let recipients = match request.role {
        Some(role) => repository::notify_role(&mut conn, role, &request.title, &request.message)?,
        None => repository::notify_all(&mut conn, &request.title, &request.message)?,
    };

    tracing::info!(recipients, admin = %caller.id, "broadcast sent");
    Ok(Json(BroadcastResponse { recipients }))
}
