use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::StaffType;

/// One tier of the fixed six-level facility taxonomy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FacilityLevel {
    pub level: i64,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Facility {
    pub id: Uuid,
    pub name: String,
    pub facility_type: String,
    pub level: i64,
    pub level_name: String,
    pub status: String,
    pub rating: Option<f64>,
}

/// At most one facility per user; assignment is an upsert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffAssignment {
    pub user_id: Uuid,
    pub facility_id: Uuid,
    pub staff_type: StaffType,
    pub status: String,
}
