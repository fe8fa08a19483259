//! Whitelisted referral update command.
//!
//! Replaces the legacy dynamic field-patch endpoint (arbitrary body keys
//! written as columns): only the fields named here are mutable, and any
//! unknown key in the request body is rejected before it reaches SQL.

use serde::Deserialize;
use uuid::Uuid;

use crate::models::enums::ReferralStatus;

use super::ReferralError;

/// Mutable referral fields. Everything else (participants, routing,
/// clinical reason, timestamps) is write-once at creation.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReferralPatch {
    pub status: Option<ReferralStatus>,
    pub assigned_doctor_id: Option<Uuid>,
    pub assigned_nurse_id: Option<Uuid>,
    pub rejection_reason: Option<String>,
    pub notes: Option<String>,
}

impl ReferralPatch {
    /// Parse a request body, turning unknown keys or malformed values into
    /// `InvalidField` instead of a generic deserialization failure.
    pub fn from_value(value: serde_json::Value) -> Result<Self, ReferralError> {
        serde_json::from_value(value).map_err(|e| ReferralError::InvalidField(e.to_string()))
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.assigned_doctor_id.is_none()
            && self.assigned_nurse_id.is_none()
            && self.rejection_reason.is_none()
            && self.notes.is_none()
    }
}
