pub mod admin;
pub mod auth;
pub mod consents;
pub mod facilities;
pub mod health;
pub mod notifications;
pub mod referrals;
