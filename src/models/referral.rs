use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{ReferralStatus, Urgency};

/// The central entity: a request to transfer a patient's care from one
/// facility/doctor to another.
///
/// `facility_from`/`facility_to` are display strings, not foreign keys into
/// the facility directory (see DESIGN.md).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Referral {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub referring_doctor_id: Uuid,
    pub assigned_doctor_id: Option<Uuid>,
    pub assigned_nurse_id: Option<Uuid>,
    pub facility_from: String,
    pub facility_to: String,
    pub reason: String,
    pub diagnosis: Option<String>,
    pub notes: Option<String>,
    pub urgency: Urgency,
    pub status: ReferralStatus,
    /// Populated only when status is `rejected`.
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Referral joined with participant names for dashboard display.
#[derive(Debug, Clone, Serialize)]
pub struct ReferralView {
    #[serde(flatten)]
    pub referral: Referral,
    pub patient_name: String,
    pub referring_doctor_name: String,
    pub assigned_doctor_name: Option<String>,
    pub assigned_nurse_name: Option<String>,
}
