use std::str::FromStr;

use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::enums::StaffType;
use crate::models::{Facility, FacilityLevel, StaffAssignment};

use super::parse_uuid;

pub fn list_levels(conn: &Connection) -> Result<Vec<FacilityLevel>, DatabaseError> {
    let mut stmt =
        conn.prepare("SELECT level, name, description FROM facility_levels ORDER BY level")?;
    let rows = stmt.query_map([], |row| {
        Ok(FacilityLevel {
            level: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
        })
    })?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

pub fn insert_facility(conn: &Connection, facility: &Facility) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO facilities (id, name, facility_type, level, status, rating)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            facility.id.to_string(),
            facility.name,
            facility.facility_type,
            facility.level,
            facility.status,
            facility.rating,
        ],
    )?;
    Ok(())
}

pub fn list_facilities(conn: &Connection) -> Result<Vec<Facility>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT f.id, f.name, f.facility_type, f.level, fl.name, f.status, f.rating
         FROM facilities f
         JOIN facility_levels fl ON fl.level = f.level
         ORDER BY f.level DESC, f.name",
    )?;

    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, i64>(3)?,
            row.get::<_, String>(4)?,
            row.get::<_, String>(5)?,
            row.get::<_, Option<f64>>(6)?,
        ))
    })?;

    let mut facilities = Vec::new();
    for row in rows {
        let (id, name, facility_type, level, level_name, status, rating) = row?;
        facilities.push(Facility {
            id: parse_uuid(&id)?,
            name,
            facility_type,
            level,
            level_name,
            status,
            rating,
        });
    }
    Ok(facilities)
}

pub fn get_facility(conn: &Connection, id: &Uuid) -> Result<Option<Facility>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT f.id, f.name, f.facility_type, f.level, fl.name, f.status, f.rating
             FROM facilities f
             JOIN facility_levels fl ON fl.level = f.level
             WHERE f.id = ?1",
            params![id.to_string()],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, Option<f64>>(6)?,
                ))
            },
        )
        .optional()?;

    match row {
        Some((id, name, facility_type, level, level_name, status, rating)) => Ok(Some(Facility {
            id: parse_uuid(&id)?,
            name,
            facility_type,
            level,
            level_name,
            status,
            rating,
        })),
        None => Ok(None),
    }
}

/// Assign a staff member to a facility. At most one facility per user:
/// a second assignment overwrites the first, it does not create history.
pub fn upsert_staff_assignment(
    conn: &Connection,
    assignment: &StaffAssignment,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO staff_assignments (user_id, facility_id, staff_type, status)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(user_id) DO UPDATE SET
             facility_id = excluded.facility_id,
             staff_type = excluded.staff_type,
             status = excluded.status",
        params![
            assignment.user_id.to_string(),
            assignment.facility_id.to_string(),
            assignment.staff_type.as_str(),
            assignment.status,
        ],
    )?;
    Ok(())
}

pub fn get_staff_assignment(
    conn: &Connection,
    user_id: &Uuid,
) -> Result<Option<StaffAssignment>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT user_id, facility_id, staff_type, status
             FROM staff_assignments WHERE user_id = ?1",
            params![user_id.to_string()],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            },
        )
        .optional()?;

    match row {
        Some((user_id, facility_id, staff_type, status)) => Ok(Some(StaffAssignment {
            user_id: parse_uuid(&user_id)?,
            facility_id: parse_uuid(&facility_id)?,
            staff_type: StaffType::from_str(&staff_type)?,
            status,
        })),
        None => Ok(None),
    }
}
