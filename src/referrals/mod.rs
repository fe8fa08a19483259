//! Referral lifecycle & access-control engine.
//!
//! The one piece of business logic with real invariants: who may see a
//! referral (visibility policy), which status transitions are legal
//! (lifecycle), and which fields an update may touch (patch whitelist).
//! Everything here is transport-agnostic; the API layer translates
//! `ReferralError` into HTTP statuses.

pub mod lifecycle;
pub mod patch;
pub mod visibility;

use chrono::Utc;
use rusqlite::Connection;
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use crate::db::{repository, DatabaseError};
use crate::models::enums::{NotificationKind, ReferralStatus, Role, Urgency};
use crate::models::{Referral, ReferralView};

pub use patch::ReferralPatch;
pub use visibility::{scope_for, ReferralScope};

#[derive(Debug, Error)]
pub enum ReferralError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("invalid field: {0}")]
    InvalidField(String),

    #[error("invalid status transition from {} to {}", .from.as_str(), .to.as_str())]
    InvalidTransition {
        from: ReferralStatus,
        to: ReferralStatus,
    },

    #[error("patient not found")]
    PatientNotFound,

    #[error("referral not found")]
    NotFound,

    #[error("not authorized for this referral")]
    Forbidden,

    #[error("assignment already taken by a concurrent update")]
    Conflict,

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// The authenticated principal acting on referrals.
#[derive(Debug, Clone)]
pub struct Actor {
    pub id: Uuid,
    pub roles: Vec<Role>,
}

impl Actor {
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin)
    }

    pub fn scope(&self) -> ReferralScope {
        scope_for(self.id, &self.roles)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateReferral {
    /// Patient by id, or by email lookup when id is absent.
    pub patient_id: Option<Uuid>,
    pub patient_email: Option<String>,
    pub facility_from: String,
    pub facility_to: String,
    pub reason: String,
    pub diagnosis: Option<String>,
    pub notes: Option<String>,
    pub urgency: Urgency,
}

/// Create a referral. The caller becomes the referring doctor; initial
/// status is `pending`.
pub fn create(
    conn: &Connection,
    actor: &Actor,
    input: CreateReferral,
) -> Result<Referral, ReferralError> {
    if !(actor.has_role(Role::Doctor) || actor.is_admin()) {
        return Err(ReferralError::Forbidden);
    }
    for (field, value) in [
        ("reason", &input.reason),
        ("facility_from", &input.facility_from),
        ("facility_to", &input.facility_to),
    ] {
        if value.trim().is_empty() {
            return Err(ReferralError::Validation(format!("{field} is required")));
        }
    }

    let patient = match (input.patient_id, input.patient_email.as_deref()) {
        (Some(id), _) => repository::get_profile(conn, &id)?,
        (None, Some(email)) => repository::get_profile_by_email(conn, email)?,
        (None, None) => {
            return Err(ReferralError::Validation(
                "patient_id or patient_email is required".into(),
            ))
        }
    }
    .ok_or(ReferralError::PatientNotFound)?;

    let now = Utc::now();
    let referral = Referral {
        id: Uuid::new_v4(),
        patient_id: patient.id,
        referring_doctor_id: actor.id,
        assigned_doctor_id: None,
        assigned_nurse_id: None,
        facility_from: input.facility_from,
        facility_to: input.facility_to,
        reason: input.reason,
        diagnosis: input.diagnosis,
        notes: input.notes,
        urgency: input.urgency,
        status: ReferralStatus::Pending,
        rejection_reason: None,
        created_at: now,
        updated_at: now,
    };
    repository::insert_referral(conn, &referral)?;

    notify_best_effort(
        conn,
        &referral.patient_id,
        "New referral",
        &format!("A referral to {} has been created for you", referral.facility_to),
    );

    Ok(referral)
}

/// List the referrals visible to the caller, newest first.
pub fn list_for(conn: &Connection, actor: &Actor) -> Result<Vec<ReferralView>, DatabaseError> {
    let (predicate, params) = actor.scope().predicate();
    repository::list_referrals_filtered(conn, predicate, &params)
}

/// Direct-by-id fetch, gated by the same scope as the list query. A
/// referral outside the caller's scope reads as absent.
pub fn fetch_for(conn: &Connection, actor: &Actor, id: &Uuid) -> Result<Referral, ReferralError> {
    let referral = repository::get_referral(conn, id)?.ok_or(ReferralError::NotFound)?;
    if !actor.scope().allows(&referral) {
        return Err(ReferralError::NotFound);
    }
    Ok(referral)
}

/// Apply a whitelisted patch inside one transaction: CAS assignment claims,
/// validated status transition, notes. Status changes trigger best-effort
/// notifications after commit.
pub fn apply_patch(
    conn: &mut Connection,
    actor: &Actor,
    id: &Uuid,
    patch: ReferralPatch,
) -> Result<Referral, ReferralError> {
    if patch.is_empty() {
        return Err(ReferralError::Validation("no fields to update".into()));
    }
    if patch.rejection_reason.is_some() && patch.status != Some(ReferralStatus::Rejected) {
        return Err(ReferralError::Validation(
            "rejection_reason is only valid with status=rejected".into(),
        ));
    }

    let (updated, status_change) = {
        let tx = conn.transaction().map_err(DatabaseError::from)?;

        let current = repository::get_referral(&tx, id)?.ok_or(ReferralError::NotFound)?;
        authorize_update(actor, &current, &patch)?;

        if let Some(doctor_id) = patch.assigned_doctor_id {
            match current.assigned_doctor_id {
                Some(existing) if existing == doctor_id => {}
                Some(_) => return Err(ReferralError::Conflict),
                None => {
                    if !repository::assign_doctor_if_unassigned(&tx, id, &doctor_id)? {
                        return Err(ReferralError::Conflict);
                    }
                }
            }
        }
        if let Some(nurse_id) = patch.assigned_nurse_id {
            match current.assigned_nurse_id {
                Some(existing) if existing == nurse_id => {}
                Some(_) => return Err(ReferralError::Conflict),
                None => {
                    if !repository::assign_nurse_if_unassigned(&tx, id, &nurse_id)? {
                        return Err(ReferralError::Conflict);
                    }
                }
            }
        }

        let mut status_change = None;
        if let Some(new_status) = patch.status {
            lifecycle::validate_transition(current.status, new_status)?;
            let reason = if new_status == ReferralStatus::Rejected {
                let reason = patch.rejection_reason.as_deref().map(str::trim).unwrap_or("");
                if reason.is_empty() {
                    return Err(ReferralError::Validation(
                        "rejecting a referral requires a non-empty rejection_reason".into(),
                    ));
                }
                Some(reason)
            } else {
                None
            };
            repository::set_referral_status(&tx, id, new_status, reason)?;
            status_change = Some(new_status);
        }

        if let Some(notes) = &patch.notes {
            repository::set_referral_notes(&tx, id, notes)?;
        }

        let updated = repository::get_referral(&tx, id)?.ok_or(ReferralError::NotFound)?;
        tx.commit().map_err(DatabaseError::from)?;
        (updated, status_change)
    };

    if let Some(new_status) = status_change {
        let message = format!("Referral to {} is now {}", updated.facility_to, new_status.as_str());
        notify_best_effort(conn, &updated.patient_id, "Referral update", &message);
        if updated.referring_doctor_id != actor.id {
            notify_best_effort(conn, &updated.referring_doctor_id, "Referral update", &message);
        }
    }

    Ok(updated)
}

/// Update authorization (visibility ≠ edit-right): admins and current
/// parties may edit; a non-party doctor/nurse may only claim an open
/// assignment slot for themselves.
fn authorize_update(
    actor: &Actor,
    current: &Referral,
    patch: &ReferralPatch,
) -> Result<(), ReferralError> {
    let is_party = actor.is_admin()
        || current.referring_doctor_id == actor.id
        || current.assigned_doctor_id == Some(actor.id)
        || current.assigned_nurse_id == Some(actor.id);
    if is_party {
        return Ok(());
    }

    let claims_doctor =
        patch.assigned_doctor_id == Some(actor.id) && actor.has_role(Role::Doctor);
    let claims_nurse = patch.assigned_nurse_id == Some(actor.id) && actor.has_role(Role::Nurse);
    let claim_only = (claims_doctor || claims_nurse)
        && patch.status.is_none()
        && patch.rejection_reason.is_none()
        && patch.notes.is_none()
        && (patch.assigned_doctor_id.is_none() || claims_doctor)
        && (patch.assigned_nurse_id.is_none() || claims_nurse);

    if claim_only {
        Ok(())
    } else {
        Err(ReferralError::Forbidden)
    }
}

fn notify_best_effort(conn: &Connection, user_id: &Uuid, title: &str, message: &str) {
    if let Err(e) = repository::notify(conn, user_id, title, message, NotificationKind::Referral) {
        tracing::warn!(user_id = %user_id, "notification write failed: {e}");
    }
}
