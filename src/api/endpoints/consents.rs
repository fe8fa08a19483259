//! Consent endpoints. Patients record who may be involved in their care;
//! the records feed the audit trail rather than gating visibility.

use axum::extract::State;
use axum::{Extension, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, CallerContext};
use crate::db::repository;
use crate::models::enums::{ConsentStatus, Role};
use crate::models::Consent;

#[derive(Deserialize)]
pub struct UpsertConsentRequest {
    pub entity_type: String,
    pub entity_id: Uuid,
    pub entity_name: String,
    pub status: ConsentStatus,
}

/// `POST /consents` — grant or revoke; repeat calls overwrite the row.
/// The patient is always the caller.
pub async fn upsert(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
    Json(request): Json<UpsertConsentRequest>,
) -> Result<Json<Consent>, ApiError> {
    caller.require_role(Role::Patient)?;
    if request.entity_type.trim().is_empty() {
        return Err(ApiError::Validation("entity_type is required".into()));
    }

    let consent = Consent {
        patient_id: caller.id,
        entity_type: request.entity_type,
        entity_id: request.entity_id,
        entity_name: request.entity_name,
        status: request.status,
        updated_at: Utc::now(),
    };

    let conn = ctx.db()?;
    repository::upsert_consent(&conn, &consent)?;
    Ok(Json(consent))
}

#[derive(Serialize)]
pub struct ConsentsResponse {
    pub consents: Vec<Consent>,
}

/// `GET /consents` — the caller's own consent records.
pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
) -> Result<Json<ConsentsResponse>, ApiError> {
    let conn = ctx.db()?;
    Ok(Json(ConsentsResponse {
        consents: repository::list_consents(&conn, &caller.id)?,
    }))
}
