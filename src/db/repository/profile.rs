use std::str::FromStr;

use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::enums::{ProfileStatus, Role};
use crate::models::Profile;

use super::{now_ts, parse_ts, parse_uuid};

const PROFILE_COLUMNS: &str = "id, email, password_hash, full_name, phone, status, \
     requested_role, created_at, updated_at";

pub fn insert_profile(conn: &Connection, profile: &Profile) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO profiles (id, email, password_hash, full_name, phone, status,
         requested_role, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            profile.id.to_string(),
            profile.email,
            profile.password_hash,
            profile.full_name,
            profile.phone,
            profile.status.as_str(),
            profile.requested_role.map(|r| r.as_str()),
            profile.created_at.to_rfc3339(),
            profile.updated_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

pub fn get_profile(conn: &Connection, id: &Uuid) -> Result<Option<Profile>, DatabaseError> {
    let row = conn
        .query_row(
            &format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = ?1"),
            params![id.to_string()],
            profile_row_from_rusqlite,
        )
        .optional()?;
    row.map(profile_from_row).transpose()
}

pub fn get_profile_by_email(
    conn: &Connection,
    email: &str,
) -> Result<Option<Profile>, DatabaseError> {
    let row = conn
        .query_row(
            &format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE email = ?1"),
            params![email],
            profile_row_from_rusqlite,
        )
        .optional()?;
    row.map(profile_from_row).transpose()
}

pub fn get_roles(conn: &Connection, user_id: &Uuid) -> Result<Vec<Role>, DatabaseError> {
    let mut stmt = conn.prepare("SELECT role FROM user_roles WHERE user_id = ?1")?;
    let rows = stmt.query_map(params![user_id.to_string()], |row| row.get::<_, String>(0))?;

    let mut roles = Vec::new();
    for row in rows {
        roles.push(Role::from_str(&row?)?);
    }
    Ok(roles)
}

/// Role assignment is additive-only; repeat grants are a no-op.
pub fn add_role(conn: &Connection, user_id: &Uuid, role: Role) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT OR IGNORE INTO user_roles (user_id, role) VALUES (?1, ?2)",
        params![user_id.to_string(), role.as_str()],
    )?;
    Ok(())
}

/// Activate a pending profile, optionally granting a role.
///
/// One transaction: status becomes `active` (no-op if it already is), and
/// the role is inserted only when supplied and the user holds no role yet.
pub fn activate_profile(
    conn: &mut Connection,
    user_id: &Uuid,
    role: Option<Role>,
) -> Result<Profile, DatabaseError> {
    let tx = conn.transaction()?;

    let updated = tx.execute(
        "UPDATE profiles SET status = 'active', updated_at = ?2 WHERE id = ?1",
        params![user_id.to_string(), now_ts()],
    )?;
    if updated == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "profile".into(),
            id: user_id.to_string(),
        });
    }

    if let Some(role) = role {
        let held: i64 = tx.query_row(
            "SELECT COUNT(*) FROM user_roles WHERE user_id = ?1",
            params![user_id.to_string()],
            |row| row.get(0),
        )?;
        if held == 0 {
            tx.execute(
                "INSERT INTO user_roles (user_id, role) VALUES (?1, ?2)",
                params![user_id.to_string(), role.as_str()],
            )?;
        }
    }

    tx.commit()?;

    get_profile(conn, user_id)?.ok_or_else(|| DatabaseError::NotFound {
        entity_type: "profile".into(),
        id: user_id.to_string(),
    })
}

pub fn list_pending_profiles(conn: &Connection) -> Result<Vec<Profile>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PROFILE_COLUMNS} FROM profiles WHERE status = 'pending' ORDER BY created_at"
    ))?;
    let rows = stmt.query_map([], profile_row_from_rusqlite)?;

    let mut profiles = Vec::new();
    for row in rows {
        profiles.push(profile_from_row(row?)?);
    }
    Ok(profiles)
}

/// Active provider listing for the admin dashboard: staff roles joined with
/// the (at most one) facility assignment.
#[derive(Debug, Clone, Serialize)]
pub struct Provider {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub roles: Vec<Role>,
    pub facility_name: Option<String>,
}

pub fn list_providers(conn: &Connection) -> Result<Vec<Provider>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT p.id, p.email, p.full_name, f.name
         FROM profiles p
         JOIN user_roles ur ON ur.user_id = p.id
         LEFT JOIN staff_assignments sa ON sa.user_id = p.id
         LEFT JOIN facilities f ON f.id = sa.facility_id
         WHERE p.status = 'active'
           AND ur.role IN ('doctor', 'nurse', 'pharmacist', 'lab_technician')
         ORDER BY p.full_name",
    )?;

    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, Option<String>>(3)?,
        ))
    })?;

    let mut providers = Vec::new();
    for row in rows {
        let (id, email, full_name, facility_name) = row?;
        let id = parse_uuid(&id)?;
        let roles = get_roles(conn, &id)?;
        providers.push(Provider {
            id,
            email,
            full_name,
            roles,
            facility_name,
        });
    }
    Ok(providers)
}

struct ProfileRow {
    id: String,
    email: String,
    password_hash: String,
    full_name: String,
    phone: Option<String>,
    status: String,
    requested_role: Option<String>,
    created_at: String,
    updated_at: String,
}

fn profile_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<ProfileRow, rusqlite::Error> {
    Ok(ProfileRow {
        id: row.get(0)?,
        email: row.get(1)?,
        password_hash: row.get(2)?,
        full_name: row.get(3)?,
        phone: row.get(4)?,
        status: row.get(5)?,
        requested_role: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

fn profile_from_row(row: ProfileRow) -> Result<Profile, DatabaseError> {
    Ok(Profile {
        id: parse_uuid(&row.id)?,
        email: row.email,
        password_hash: row.password_hash,
        full_name: row.full_name,
        phone: row.phone,
        status: ProfileStatus::from_str(&row.status)?,
        requested_role: row.requested_role.as_deref().map(Role::from_str).transpose()?,
        created_at: parse_ts(&row.created_at)?,
        updated_at: parse_ts(&row.updated_at)?,
    })
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;

    #[test]
    fn profile_insert_and_retrieve() {
        let conn = test_db();
        let id = make_profile(&conn, "amina@example.org", ProfileStatus::Pending);

        let profile = get_profile(&conn, &id).unwrap().unwrap();
        assert_eq!(profile.email, "amina@example.org");
        assert_eq!(profile.status, ProfileStatus::Pending);
        assert!(profile.requested_role.is_none());

        let by_email = get_profile_by_email(&conn, "amina@example.org").unwrap().unwrap();
        assert_eq!(by_email.id, id);
        assert!(get_profile_by_email(&conn, "nobody@example.org").unwrap().is_none());
    }

    #[test]
    fn duplicate_email_rejected() {
        let conn = test_db();
        make_profile(&conn, "dup@example.org", ProfileStatus::Pending);
        let id = Uuid::new_v4();
        let result = insert_profile(
            &conn,
            &crate::models::Profile {
                id,
                email: "dup@example.org".into(),
                password_hash: "x".into(),
                full_name: "Dup".into(),
                phone: None,
                status: ProfileStatus::Pending,
                requested_role: None,
                created_at: chrono::Utc::now(),
                updated_at: chrono::Utc::now(),
            },
        );
        assert!(result.is_err());
    }

    #[test]
    fn activation_grants_role_once() {
        let mut conn = test_db();
        let id = make_profile(&conn, "nurse@example.org", ProfileStatus::Pending);

        let profile = activate_profile(&mut conn, &id, Some(Role::Nurse)).unwrap();
        assert_eq!(profile.status, ProfileStatus::Active);
        assert_eq!(get_roles(&conn, &id).unwrap(), vec![Role::Nurse]);

        // Re-activating with a different role must not stack roles
        let profile = activate_profile(&mut conn, &id, Some(Role::Doctor)).unwrap();
        assert_eq!(profile.status, ProfileStatus::Active);
        assert_eq!(get_roles(&conn, &id).unwrap(), vec![Role::Nurse]);
    }

    #[test]
    fn activation_of_missing_profile_fails() {
        let mut conn = test_db();
        let result = activate_profile(&mut conn, &Uuid::new_v4(), None);
        assert!(matches!(result, Err(DatabaseError::NotFound { .. })));
    }

    #[test]
    fn pending_listing_excludes_active() {
        let conn = test_db();
        make_profile(&conn, "pending@example.org", ProfileStatus::Pending);
        make_profile(&conn, "active@example.org", ProfileStatus::Active);

        let pending = list_pending_profiles(&conn).unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].email, "pending@example.org");
    }

    #[test]
    fn provider_listing_includes_staff_only() {
        let conn = test_db();
        make_user(&conn, "doc@example.org", Role::Doctor);
        make_user(&conn, "patient@example.org", Role::Patient);

        let providers = list_providers(&conn).unwrap();
        assert_eq!(providers.len(), 1);
        assert_eq!(providers[0].email, "doc@example.org");
        assert_eq!(providers[0].roles, vec![Role::Doctor]);
        assert!(providers[0].facility_name.is_none());
    }
}
