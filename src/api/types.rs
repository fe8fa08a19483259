//! Shared types for the API layer.

use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::Connection;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::config::Config;
use crate::models::enums::{ProfileStatus, Role};
use crate::referrals::Actor;

/// Shared context for all routes and middleware: the single-writer SQLite
/// connection plus server configuration.
///
/// Handlers are async but all database work is synchronous and short; the
/// guard is never held across an `.await`.
#[derive(Clone)]
pub struct ApiContext {
    db: Arc<Mutex<Connection>>,
    pub config: Arc<Config>,
}

impl ApiContext {
    pub fn new(conn: Connection, config: Config) -> Self {
        Self {
            db: Arc::new(Mutex::new(conn)),
            config: Arc::new(config),
        }
    }

    pub fn db(&self) -> Result<MutexGuard<'_, Connection>, ApiError> {
        self.db
            .lock()
            .map_err(|_| ApiError::Internal("database lock poisoned".into()))
    }
}

/// Authenticated caller, injected into request extensions by the session
/// middleware after token validation.
#[derive(Debug, Clone)]
pub struct CallerContext {
    pub id: Uuid,
    pub email: String,
    pub roles: Vec<Role>,
    pub status: ProfileStatus,
}

impl CallerContext {
    pub fn actor(&self) -> Actor {
        Actor {
            id: self.id,
            roles: self.roles.clone(),
        }
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// Gate for role-restricted handlers.
    pub fn require_role(&self, role: Role) -> Result<(), ApiError> {
        if self.has_role(role) {
            Ok(())
        } else {
            Err(ApiError::Forbidden(format!("{} role required", role.as_str())))
        }
    }
}
