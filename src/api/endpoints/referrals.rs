//! Referral endpoints: list, direct fetch, create, whitelisted patch.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Serialize;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, CallerContext};
use crate::models::{Referral, ReferralView};
use crate::referrals::{self, CreateReferral, ReferralPatch};

#[derive(Serialize)]
pub struct ReferralListResponse {
    pub referrals: Vec<ReferralView>,
}

/// `GET /referrals` — the referrals visible to the caller, newest first.
pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
) -> Result<Json<ReferralListResponse>, ApiError> {
    let conn = ctx.db()?;
    let referrals = referrals::list_for(&conn, &caller.actor())?;
    Ok(Json(ReferralListResponse { referrals }))
}

/// `GET /referrals/:id` — direct fetch, gated by the same visibility scope
/// as the list.
pub async fn detail(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
) -> Result<Json<Referral>, ApiError> {
    let id = parse_id(&id)?;
    let conn = ctx.db()?;
    let referral = referrals::fetch_for(&conn, &caller.actor(), &id)?;
    Ok(Json(referral))
}

/// `POST /referrals` — create a referral; the caller becomes the referring
/// doctor.
pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
    Json(input): Json<CreateReferral>,
) -> Result<(StatusCode, Json<Referral>), ApiError> {
    let conn = ctx.db()?;
    let referral = referrals::create(&conn, &caller.actor(), input)?;
    Ok((StatusCode::CREATED, Json(referral)))
}

/// `PUT /referrals/:id` — whitelisted field patch. The body is parsed
/// through `ReferralPatch` so unknown keys fail with 400 before touching
/// SQL.
pub async fn update(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<Referral>, ApiError> {
    let id = parse_id(&id)?;
    let patch = ReferralPatch::from_value(body)?;
    let mut conn = ctx.db()?;
    let referral = referrals::apply_patch(&mut conn, &caller.actor(), &id, patch)?;
    Ok(Json(referral))
}

fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|e| ApiError::Validation(format!("invalid referral id: {e}")))
}
