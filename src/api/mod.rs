//! HTTP API.
//!
//! Routes are grouped by auth level (open, session, active) and protected
//! by a middleware stack: Auth → Audit → Handler.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use router::api_router;
pub use server::{start_server, ApiServer};
pub use types::ApiContext;
