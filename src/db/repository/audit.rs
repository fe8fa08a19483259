use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;

/// Append an audit trail row. Called best-effort from the audit middleware;
/// failures are logged by the caller, never surfaced to the client.
pub fn record_audit(
    conn: &Connection,
    user_id: Option<&Uuid>,
    action: &str,
    detail: &str,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO audit_log (user_id, action, detail) VALUES (?1, ?2, ?3)",
        params![user_id.map(|id| id.to_string()), action, detail],
    )?;
    Ok(())
}

pub fn count_audit_entries(conn: &Connection) -> Result<i64, DatabaseError> {
    let count = conn.query_row("SELECT COUNT(*) FROM audit_log", [], |row| row.get(0))?;
    Ok(count)
}
