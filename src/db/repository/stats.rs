use rusqlite::Connection;
use serde::Serialize;

use crate::db::DatabaseError;

/// Aggregate counts for the admin dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct AdminStats {
    pub total_users: i64,
    pub pending_users: i64,
    pub active_users: i64,
    pub total_referrals: i64,
    pub pending_referrals: i64,
    pub completed_referrals: i64,
    pub rejected_referrals: i64,
    pub total_facilities: i64,
}

pub fn admin_stats(conn: &Connection) -> Result<AdminStats, DatabaseError> {
    let count = |sql: &str| -> Result<i64, DatabaseError> {
        Ok(conn.query_row(sql, [], |row| row.get(0))?)
    };

    Ok(AdminStats {
        total_users: count("SELECT COUNT(*) FROM profiles")?,
        pending_users: count("SELECT COUNT(*) FROM profiles WHERE status = 'pending'")?,
        active_users: count("SELECT COUNT(*) FROM profiles WHERE status = 'active'")?,
        total_referrals: count("SELECT COUNT(*) FROM referrals")?,
        pending_referrals: count("SELECT COUNT(*) FROM referrals WHERE status = 'pending'")?,
        completed_referrals: count("SELECT COUNT(*) FROM referrals WHERE status = 'completed'")?,
        rejected_referrals: count("SELECT COUNT(*) FROM referrals WHERE status = 'rejected'")?,
        total_facilities: count("SELECT COUNT(*) FROM facilities")?,
    })
}
