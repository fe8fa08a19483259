//! Repository layer — entity-scoped database operations.
//!
//! Each sub-module owns the SQL for one entity; all public functions are
//! re-exported here. Writes that span multiple rows (activation, broadcast
//! fan-out) take `&mut Connection` and run inside one transaction.

mod audit;
mod consent;
mod facility;
mod notification;
mod profile;
mod referral;
mod stats;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::DatabaseError;

pub use audit::*;
pub use consent::*;
pub use facility::*;
pub use notification::*;
pub use profile::*;
pub use referral::*;
pub use stats::*;

#[cfg(test)]
pub(crate) use referral::test_referrals;

pub(crate) fn parse_uuid(s: &str) -> Result<Uuid, DatabaseError> {
    Uuid::parse_str(s).map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))
}

pub(crate) fn parse_ts(s: &str) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(s)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))
}

pub(crate) fn now_ts() -> String {
    Utc::now().to_rfc3339()
}

#[cfg(test)]
pub(crate) mod test_support {
    use rusqlite::Connection;
    use uuid::Uuid;

    use crate::db::sqlite::open_memory_database;
    use crate::models::enums::{ProfileStatus, Role};
    use crate::models::Profile;

    pub fn test_db() -> Connection {
        open_memory_database().unwrap()
    }

    pub fn make_profile(conn: &Connection, email: &str, status: ProfileStatus) -> Uuid {
        let id = Uuid::new_v4();
        super::insert_profile(
            conn,
            &Profile {
                id,
                email: email.into(),
                password_hash: "x".into(),
                full_name: format!("User {email}"),
                phone: None,
                status,
                requested_role: None,
                created_at: chrono::Utc::now(),
                updated_at: chrono::Utc::now(),
            },
        )
        .unwrap();
        id
    }

    pub fn make_user(conn: &Connection, email: &str, role: Role) -> Uuid {
        let id = make_profile(conn, email, ProfileStatus::Active);
        super::add_role(conn, &id, role).unwrap();
        id
    }
}
