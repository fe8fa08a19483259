//! Facility directory endpoints: reference data plus staff assignment.

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, CallerContext};
use crate::db::repository;
use crate::models::enums::{Role, StaffType};
use crate::models::{Facility, FacilityLevel, StaffAssignment};

#[derive(Serialize)]
pub struct LevelsResponse {
    pub levels: Vec<FacilityLevel>,
}

/// `GET /facility-levels` — the fixed six-tier taxonomy.
pub async fn levels(State(ctx): State<ApiContext>) -> Result<Json<LevelsResponse>, ApiError> {
    let conn = ctx.db()?;
    Ok(Json(LevelsResponse { levels: repository::list_levels(&conn)? }))
}

#[derive(Serialize)]
pub struct FacilitiesResponse {
    pub facilities: Vec<Facility>,
}

/// `GET /facilities` — facilities joined with level metadata.
pub async fn list(State(ctx): State<ApiContext>) -> Result<Json<FacilitiesResponse>, ApiError> {
    let conn = ctx.db()?;
    Ok(Json(FacilitiesResponse { facilities: repository::list_facilities(&conn)? }))
}

#[derive(Deserialize)]
pub struct CreateFacilityRequest {
    pub name: String,
    pub facility_type: String,
    pub level: i64,
    pub rating: Option<f64>,
}

/// `POST /facilities` — admin-only reference data creation.
pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
    Json(request): Json<CreateFacilityRequest>,
) -> Result<(StatusCode, Json<Facility>), ApiError> {
    caller.require_role(Role::Admin)?;
    if request.name.trim().is_empty() {
        return Err(ApiError::Validation("name is required".into()));
    }
    if !(1..=6).contains(&request.level) {
        return Err(ApiError::Validation("level must be between 1 and 6".into()));
    }

    let facility = Facility {
        id: Uuid::new_v4(),
        name: request.name.trim().to_string(),
        facility_type: request.facility_type,
        level: request.level,
        level_name: String::new(),
        status: "active".into(),
        rating: request.rating,
    };

    let conn = ctx.db()?;
    repository::insert_facility(&conn, &facility)?;
    let stored = repository::get_facility(&conn, &facility.id)?
        .ok_or_else(|| ApiError::Internal("facility vanished after insert".into()))?;
    Ok((StatusCode::CREATED, Json(stored)))
}

#[derive(Deserialize)]
pub struct AssignStaffRequest {
    pub user_id: Uuid,
    pub facility_id: Uuid,
    pub staff_type: StaffType,
}

/// `POST /staff-assignments` — upsert a staff member's (single) facility.
pub async fn assign_staff(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
    Json(request): Json<AssignStaffRequest>,
) -> Result<Json<StaffAssignment>, ApiError> {
    caller.require_role(Role::Admin)?;

    let conn = ctx.db()?;
    if repository::get_profile(&conn, &request.user_id)?.is_none() {
        return Err(ApiError::NotFound("user not found".into()));
    }
    if repository::get_facility(&conn, &request.facility_id)?.is_none() {
        return Err(ApiError::NotFound("facility not found".into()));
    }

    let assignment = StaffAssignment {
        user_id: request.user_id,
        facility_id: request.facility_id,
        staff_type: request.staff_type,
        status: "active".into(),
    };
    repository::upsert_staff_assignment(&conn, &assignment)?;
    Ok(Json(assignment))
}
