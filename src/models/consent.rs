use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::ConsentStatus;

/// Patient-granted visibility of their data to a specific doctor or
/// facility. Recorded for audit; not enforced as a visibility gate
/// (see DESIGN.md).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Consent {
    pub patient_id: Uuid,
    pub entity_type: String,
    pub entity_id: Uuid,
    pub entity_name: String,
    pub status: ConsentStatus,
    pub updated_at: DateTime<Utc>,
}
