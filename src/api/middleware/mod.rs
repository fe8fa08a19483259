//! Middleware: session authentication and audit logging.

pub mod audit;
pub mod auth;
