use std::str::FromStr;

use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::enums::ConsentStatus;
use crate::models::Consent;

use super::{now_ts, parse_ts, parse_uuid};

/// One row per (patient, entity) pair; a repeat call overwrites status and
/// the cached entity name. Consent is recorded for audit, not enforced as a
/// visibility gate.
pub fn upsert_consent(conn: &Connection, consent: &Consent) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO consents (patient_id, entity_type, entity_id, entity_name, status, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(patient_id, entity_type, entity_id) DO UPDATE SET
             entity_name = excluded.entity_name,
             status = excluded.status,
             updated_at = excluded.updated_at",
        params![
            consent.patient_id.to_string(),
            consent.entity_type,
            consent.entity_id.to_string(),
            consent.entity_name,
            consent.status.as_str(),
            now_ts(),
        ],
    )?;
    Ok(())
}

pub fn list_consents(conn: &Connection, patient_id: &Uuid) -> Result<Vec<Consent>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT patient_id, entity_type, entity_id, entity_name, status, updated_at
         FROM consents WHERE patient_id = ?1 ORDER BY updated_at DESC",
    )?;

    let rows = stmt.query_map(params![patient_id.to_string()], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, String>(4)?,
            row.get::<_, String>(5)?,
        ))
    })?;

    let mut consents = Vec::new();
    for row in rows {
        let (patient_id, entity_type, entity_id, entity_name, status, updated_at) = row?;
        consents.push(Consent {
            patient_id: parse_uuid(&patient_id)?,
            entity_type,
            entity_id: parse_uuid(&entity_id)?,
            entity_name,
            status: ConsentStatus::from_str(&status)?,
            updated_at: parse_ts(&updated_at)?,
        });
    }
    Ok(consents)
}
