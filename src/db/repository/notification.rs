use std::str::FromStr;

use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::enums::{NotificationKind, Role};
use crate::models::Notification;

use super::{now_ts, parse_ts, parse_uuid};

/// Insert a single notification row.
///
/// Callers on the referral write path treat a failure here as best-effort:
/// logged, never propagated, never rolling back the triggering mutation.
pub fn notify(
    conn: &Connection,
    user_id: &Uuid,
    title: &str,
    message: &str,
    kind: NotificationKind,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO notifications (id, user_id, title, message, kind, is_read, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6)",
        params![
            Uuid::new_v4().to_string(),
            user_id.to_string(),
            title,
            message,
            kind.as_str(),
            now_ts(),
        ],
    )?;
    Ok(())
}

/// Broadcast to every active profile holding `role`, inside one transaction
/// so a crash mid-fanout cannot leave a partially-notified cohort.
/// Returns the number of recipients.
pub fn notify_role(
    conn: &mut Connection,
    role: Role,
    title: &str,
    message: &str,
) -> Result<usize, DatabaseError> {
    broadcast(
        conn,
        "SELECT p.id FROM profiles p
         JOIN user_roles ur ON ur.user_id = p.id
         WHERE p.status = 'active' AND ur.role = ?1",
        &[role.as_str()],
        title,
        message,
    )
}

/// Broadcast to every active profile. All-or-nothing per call.
pub fn notify_all(
    conn: &mut Connection,
    title: &str,
    message: &str,
) -> Result<usize, DatabaseError> {
    broadcast(
        conn,
        "SELECT id FROM profiles WHERE status = 'active'",
        &[],
        title,
        message,
    )
}

fn broadcast(
    conn: &mut Connection,
    recipient_sql: &str,
    recipient_params: &[&str],
    title: &str,
    message: &str,
) -> Result<usize, DatabaseError> {
    let tx = conn.transaction()?;
    let recipients: Vec<String> = {
        let mut stmt = tx.prepare(recipient_sql)?;
        let rows = stmt.query_map(rusqlite::params_from_iter(recipient_params.iter()), |row| {
            row.get::<_, String>(0)
        })?;
        rows.collect::<Result<_, _>>()?
    };

    for user_id in &recipients {
        tx.execute(
            "INSERT INTO notifications (id, user_id, title, message, kind, is_read, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6)",
            params![
                Uuid::new_v4().to_string(),
                user_id,
                title,
                message,
                NotificationKind::System.as_str(),
                now_ts(),
            ],
        )?;
    }

    tx.commit()?;
    Ok(recipients.len())
}

pub fn list_notifications(
    conn: &Connection,
    user_id: &Uuid,
) -> Result<Vec<Notification>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, title, message, kind, is_read, created_at
         FROM notifications WHERE user_id = ?1
         ORDER BY created_at DESC, id",
    )?;

    let rows = stmt.query_map(params![user_id.to_string()], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, String>(4)?,
            row.get::<_, i64>(5)?,
            row.get::<_, String>(6)?,
        ))
    })?;

    let mut notifications = Vec::new();
    for row in rows {
        let (id, user_id, title, message, kind, is_read, created_at) = row?;
        notifications.push(Notification {
            id: parse_uuid(&id)?,
            user_id: parse_uuid(&user_id)?,
            title,
            message,
            kind: NotificationKind::from_str(&kind)?,
            is_read: is_read != 0,
            created_at: parse_ts(&created_at)?,
        });
    }
    Ok(notifications)
}

/// Mark one of the caller's notifications read. Returns `false` when the
/// row does not exist or belongs to someone else.
pub fn mark_notification_read(
    conn: &Connection,
    user_id: &Uuid,
    id: &Uuid,
) -> Result<bool, DatabaseError> {
    let updated = conn.execute(
        "UPDATE notifications SET is_read = 1 WHERE id = ?1 AND user_id = ?2",
        params![id.to_string(), user_id.to_string()],
    )?;
    Ok(updated == 1)
}

/// Idempotent: a second call is a no-op on stored state.
pub fn mark_all_notifications_read(
    conn: &Connection,
    user_id: &Uuid,
) -> Result<usize, DatabaseError> {
    let updated = conn.execute(
        "UPDATE notifications SET is_read = 1 WHERE user_id = ?1 AND is_read = 0",
        params![user_id.to_string()],
    )?;
    Ok(updated)
}
