//! AfyaLink — patient referral coordination service.
//!
//! A small REST API over SQLite that moves referrals through a fixed
//! lifecycle while enforcing role-based visibility: patients see their own
//! referrals, clinicians see the ones they are party to, admins see all.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod models;
pub mod referrals;
