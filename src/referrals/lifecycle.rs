//! Referral status state machine.
//!
//! ```text
//! pending --accept--> accepted --start--> in_progress --complete--> completed
//! pending --reject(reason)--> rejected                  [terminal]
//! accepted/in_progress --reject(reason)--> rejected     [escape hatch]
//! ```
//!
//! No transition leaves `completed` or `rejected`.

use crate::models::enums::ReferralStatus;

use super::ReferralError;

pub fn validate_transition(
    from: ReferralStatus,
    to: ReferralStatus,
) -> Result<(), ReferralError> {
    use ReferralStatus::*;

    let allowed = matches!(
        (from, to),
        (Pending, Accepted)
            | (Accepted, InProgress)
            | (InProgress, Completed)
            | (Pending, Rejected)
            | (Accepted, Rejected)
            | (InProgress, Rejected)
    );

    if allowed {
        Ok(())
    } else {
        Err(ReferralError::InvalidTransition { from, to })
    }
}
