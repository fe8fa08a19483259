use std::str::FromStr;

use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::enums::{ReferralStatus, Urgency};
use crate::models::{Referral, ReferralView};

use super::{now_ts, parse_ts, parse_uuid};

const REFERRAL_COLUMNS: &str = "r.id, r.patient_id, r.referring_doctor_id, r.assigned_doctor_id, \
     r.assigned_nurse_id, r.facility_from, r.facility_to, r.reason, r.diagnosis, r.notes, \
     r.urgency, r.status, r.rejection_reason, r.created_at, r.updated_at";

pub fn insert_referral(conn: &Connection, referral: &Referral) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO referrals (id, patient_id, referring_doctor_id, assigned_doctor_id,
         assigned_nurse_id, facility_from, facility_to, reason, diagnosis, notes, urgency,
         status, rejection_reason, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
        params![
            referral.id.to_string(),
            referral.patient_id.to_string(),
            referral.referring_doctor_id.to_string(),
            referral.assigned_doctor_id.map(|id| id.to_string()),
            referral.assigned_nurse_id.map(|id| id.to_string()),
            referral.facility_from,
            referral.facility_to,
            referral.reason,
            referral.diagnosis,
            referral.notes,
            referral.urgency.as_str(),
            referral.status.as_str(),
            referral.rejection_reason,
            referral.created_at.to_rfc3339(),
            referral.updated_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

pub fn get_referral(conn: &Connection, id: &Uuid) -> Result<Option<Referral>, DatabaseError> {
    let row = conn
        .query_row(
            &format!("SELECT {REFERRAL_COLUMNS} FROM referrals r WHERE r.id = ?1"),
            params![id.to_string()],
            referral_row_from_rusqlite,
        )
        .optional()?;
    row.map(referral_from_row).transpose()
}

/// List referrals matching a visibility predicate, participant names joined
/// for display. Newest first, stable tie-break by id.
///
/// `predicate` is built by the visibility policy (never from client input);
/// its positional parameters are supplied through `predicate_params`.
pub fn list_referrals_filtered(
    conn: &Connection,
    predicate: &str,
    predicate_params: &[String],
) -> Result<Vec<ReferralView>, DatabaseError> {
    let sql = format!(
        "SELECT {REFERRAL_COLUMNS}, pp.full_name, rd.full_name, ad.full_name, an.full_name
         FROM referrals r
         JOIN profiles pp ON pp.id = r.patient_id
         JOIN profiles rd ON rd.id = r.referring_doctor_id
         LEFT JOIN profiles ad ON ad.id = r.assigned_doctor_id
         LEFT JOIN profiles an ON an.id = r.assigned_nurse_id
         WHERE {predicate}
         ORDER BY r.created_at DESC, r.id"
    );
    let mut stmt = conn.prepare(&sql)?;

    let rows = stmt.query_map(params_from_iter(predicate_params.iter()), |row| {
        let referral = referral_row_from_rusqlite(row)?;
        Ok((
            referral,
            row.get::<_, String>(15)?,
            row.get::<_, String>(16)?,
            row.get::<_, Option<String>>(17)?,
            row.get::<_, Option<String>>(18)?,
        ))
    })?;

    let mut views = Vec::new();
    for row in rows {
        let (raw, patient_name, referring_doctor_name, assigned_doctor_name, assigned_nurse_name) =
            row?;
        views.push(ReferralView {
            referral: referral_from_row(raw)?,
            patient_name,
            referring_doctor_name,
            assigned_doctor_name,
            assigned_nurse_name,
        });
    }
    Ok(views)
}

/// Record a status transition. Transition legality is validated by the
/// lifecycle module before this runs.
pub fn set_referral_status(
    conn: &Connection,
    id: &Uuid,
    status: ReferralStatus,
    rejection_reason: Option<&str>,
) -> Result<(), DatabaseError> {
    let updated = conn.execute(
        "UPDATE referrals SET status = ?2, rejection_reason = COALESCE(?3, rejection_reason),
         updated_at = ?4 WHERE id = ?1",
        params![id.to_string(), status.as_str(), rejection_reason, now_ts()],
    )?;
    if updated == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "referral".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

pub fn set_referral_notes(
    conn: &Connection,
    id: &Uuid,
    notes: &str,
) -> Result<(), DatabaseError> {
    let updated = conn.execute(
        "UPDATE referrals SET notes = ?2, updated_at = ?3 WHERE id = ?1",
        params![id.to_string(), notes, now_ts()],
    )?;
    if updated == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "referral".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

/// Compare-and-set doctor assignment: only writes when the slot is still
/// empty, so the first committed writer wins. Returns `false` when the slot
/// was already taken.
pub fn assign_doctor_if_unassigned(
    conn: &Connection,
    id: &Uuid,
    doctor_id: &Uuid,
) -> Result<bool, DatabaseError> {
    let updated = conn.execute(
        "UPDATE referrals SET assigned_doctor_id = ?2, updated_at = ?3
         WHERE id = ?1 AND assigned_doctor_id IS NULL",
        params![id.to_string(), doctor_id.to_string(), now_ts()],
    )?;
    Ok(updated == 1)
}

/// Compare-and-set nurse assignment; same semantics as the doctor variant.
pub fn assign_nurse_if_unassigned(
    conn: &Connection,
    id: &Uuid,
    nurse_id: &Uuid,
) -> Result<bool, DatabaseError> {
    let updated = conn.execute(
        "UPDATE referrals SET assigned_nurse_id = ?2, updated_at = ?3
         WHERE id = ?1 AND assigned_nurse_id IS NULL",
        params![id.to_string(), nurse_id.to_string(), now_ts()],
    )?;
    Ok(updated == 1)
}

struct ReferralRow {
    id: String,
    patient_id: String,
    referring_doctor_id: String,
    assigned_doctor_id: Option<String>,
    assigned_nurse_id: Option<String>,
    facility_from: String,
    facility_to: String,
    reason: String,
    diagnosis: Option<String>,
    notes: Option<String>,
    urgency: String,
    status: String,
    rejection_reason: Option<String>,
    created_at: String,
    updated_at: String,
}

fn referral_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<ReferralRow, rusqlite::Error> {
    Ok(ReferralRow {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        referring_doctor_id: row.get(2)?,
        assigned_doctor_id: row.get(3)?,
        assigned_nurse_id: row.get(4)?,
        facility_from: row.get(5)?,
        facility_to: row.get(6)?,
        reason: row.get(7)?,
        diagnosis: row.get(8)?,
        notes: row.get(9)?,
        urgency: row.get(10)?,
        status: row.get(11)?,
        rejection_reason: row.get(12)?,
        created_at: row.get(13)?,
        updated_at: row.get(14)?,
    })
}

fn referral_from_row(row: ReferralRow) -> Result<Referral, DatabaseError> {
    Ok(Referral {
        id: parse_uuid(&row.id)?,
        patient_id: parse_uuid(&row.patient_id)?,
        referring_doctor_id: parse_uuid(&row.referring_doctor_id)?,
        assigned_doctor_id: row.assigned_doctor_id.as_deref().map(parse_uuid).transpose()?,
        assigned_nurse_id: row.assigned_nurse_id.as_deref().map(parse_uuid).transpose()?,
        facility_from: row.facility_from,
        facility_to: row.facility_to,
        reason: row.reason,
        diagnosis: row.diagnosis,
        notes: row.notes,
        urgency: Urgency::from_str(&row.urgency)?,
        status: ReferralStatus::from_str(&row.status)?,
        rejection_reason: row.rejection_reason,
        created_at: parse_ts(&row.created_at)?,
        updated_at: parse_ts(&row.updated_at)?,
    })
}
