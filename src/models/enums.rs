use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(ProfileStatus {
    Pending => "pending",
    Active => "active",
    Suspended => "suspended",
    Deactivated => "deactivated",
});

str_enum!(Role {
    Admin => "admin",
    Doctor => "doctor",
    Nurse => "nurse",
    Patient => "patient",
    Pharmacist => "pharmacist",
    LabTechnician => "lab_technician",
});

str_enum!(Urgency {
    Low => "low",
    Medium => "medium",
    High => "high",
    Critical => "critical",
});

str_enum!(ReferralStatus {
    Pending => "pending",
    Accepted => "accepted",
    InProgress => "in_progress",
    Completed => "completed",
    Rejected => "rejected",
});

str_enum!(StaffType {
    Doctor => "doctor",
    Nurse => "nurse",
    Pharmacist => "pharmacist",
    LabTechnician => "lab_technician",
});

str_enum!(ConsentStatus {
    Granted => "granted",
    Revoked => "revoked",
});

str_enum!(NotificationKind {
    Referral => "referral",
    Account => "account",
    System => "system",
});

impl ReferralStatus {
    /// Terminal states admit no further transition.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Rejected)
    }
}
