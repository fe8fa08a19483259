pub mod consent;
pub mod enums;
pub mod facility;
pub mod notification;
pub mod profile;
pub mod referral;

pub use consent::*;
pub use facility::*;
pub use notification::*;
pub use profile::*;
pub use referral::*;
