//! Visibility policy — pure decision logic, no side effects.
//!
//! A caller's highest-precedence role (admin > doctor > nurse > patient)
//! selects exactly one scope over the referral set. Both the list query and
//! the direct-by-id fetch go through `ReferralScope`, so the two can never
//! disagree. The destination-facility-match heuristic is deliberately not
//! part of the enforced filter (DESIGN.md).

use uuid::Uuid;

use crate::models::enums::Role;
use crate::models::Referral;

/// Role precedence for dashboard/scope selection. Roles outside this order
/// (pharmacist, lab technician) grant no referral visibility.
const PRECEDENCE: [Role; 4] = [Role::Admin, Role::Doctor, Role::Nurse, Role::Patient];

/// The first matching role in priority order, if any.
pub fn primary_role(roles: &[Role]) -> Option<Role> {
    PRECEDENCE.into_iter().find(|r| roles.contains(r))
}

/// Filter over the referral set for one caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferralScope {
    /// Admin: every referral, unfiltered.
    All,
    /// Doctor: referrals they made or are assigned to.
    Doctor(Uuid),
    /// Nurse: referrals they are assigned to.
    Nurse(Uuid),
    /// Patient: their own referrals.
    Patient(Uuid),
    /// No qualifying role: empty set.
    None,
}

/// Total mapping from (caller id, held roles) to a scope.
pub fn scope_for(caller_id: Uuid, roles: &[Role]) -> ReferralScope {
    match primary_role(roles) {
        Some(Role::Admin) => ReferralScope::All,
        Some(Role::Doctor) => ReferralScope::Doctor(caller_id),
        Some(Role::Nurse) => ReferralScope::Nurse(caller_id),
        Some(Role::Patient) => ReferralScope::Patient(caller_id),
        _ => ReferralScope::None,
    }
}

impl ReferralScope {
    /// SQL predicate over the aliased `referrals r` table, plus its
    /// positional parameters.
    pub fn predicate(&self) -> (&'static str, Vec<String>) {
        match self {
            Self::All => ("1=1", vec![]),
            Self::Doctor(id) => (
                "(r.referring_doctor_id = ?1 OR r.assigned_doctor_id = ?1)",
                vec![id.to_string()],
            ),
            Self::Nurse(id) => ("r.assigned_nurse_id = ?1", vec![id.to_string()]),
            Self::Patient(id) => ("r.patient_id = ?1", vec![id.to_string()]),
            Self::None => ("1=0", vec![]),
        }
    }

    /// In-memory mirror of `predicate`, applied to direct-by-id fetches.
    pub fn allows(&self, referral: &Referral) -> bool {
        match self {
            Self::All => true,
            Self::Doctor(id) => {
                referral.referring_doctor_id == *id || referral.assigned_doctor_id == Some(*id)
            }
            Self::Nurse(id) => referral.assigned_nurse_id == Some(*id),
            Self::Patient(id) => referral.patient_id == *id,
            Self::None => false,
        }
    }
}
