//! Audit logging middleware.
//!
//! Writes one audit row per request with the caller id (when the session
//! middleware has run), method, path, and response status. Best-effort:
//! an audit failure is logged, never surfaced.

use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;

use crate::api::types::{ApiContext, CallerContext};
use crate::db::repository;

pub async fn log_access(req: Request<axum::body::Body>, next: Next) -> Response {
    let method = req.method().to_string();
    let path = req.uri().path().to_string();

    let ctx = req.extensions().get::<ApiContext>().cloned();
    let caller_id = req.extensions().get::<CallerContext>().map(|c| c.id);

    let response = next.run(req).await;
    let status = response.status().as_u16();

    if let Some(ctx) = ctx {
        let result = ctx.db().and_then(|conn| {
            repository::record_audit(
                &conn,
                caller_id.as_ref(),
                &format!("{method} {path}"),
                &format!("status:{status}"),
            )
            .map_err(Into::into)
        });
        if let Err(e) = result {
            tracing::warn!("audit write failed: {e}");
        }
    }
    tracing::debug!(%method, %path, status, "request");

    response
}
