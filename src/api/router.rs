//! HTTP router.
//!
//! Three route groups by auth requirement:
//! 1. Open — signup, login, health.
//! 2. Session — any valid token (`/auth/me`, so pending users can poll
//!    their approval status).
//! 3. Active — valid token AND active account; everything else.
//!
//! Middleware uses `Extension<ApiContext>` (injected as the outermost
//! layer). Endpoint handlers use `State<ApiContext>` via `with_state`.

use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;
use crate::config::Config;
use rusqlite::Connection;

/// Build the full API router over an open database connection.
pub fn api_router(conn: Connection, config: Config) -> Router {
    build_router(ApiContext::new(conn, config))
}

/// Build router from a pre-constructed `ApiContext`.
///
/// Used by integration tests that need to seed the database through the
/// shared connection.
pub(crate) fn api_router_with_ctx(ctx: ApiContext) -> Router {
    build_router(ctx)
}

fn build_router(ctx: ApiContext) -> Router {
    // Layers apply bottom (innermost) to top (outermost):
    //   Extension → auth → audit → handler
    //
    // NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
    let active = Router::new()
        .route("/referrals", get(endpoints::referrals::list).post(endpoints::referrals::create))
        .route(
            "/referrals/:id",
            get(endpoints::referrals::detail).put(endpoints::referrals::update),
        )
        .route("/admin/stats", get(endpoints::admin::stats))
        .route("/admin/users/pending", get(endpoints::admin::pending_users))
        .route("/admin/users/providers", get(endpoints::admin::providers))
        .route("/admin/users/:id/activate", post(endpoints::admin::activate))
        .route("/facility-levels", get(endpoints::facilities::levels))
        .route(
            "/facilities",
            get(endpoints::facilities::list).post(endpoints::facilities::create),
        )
        .route("/staff-assignments", post(endpoints::facilities::assign_staff))
        .route("/notifications", get(endpoints::notifications::list))
        .route("/notifications/read-all", put(endpoints::notifications::mark_all_read))
        .route("/notifications/:id/read", put(endpoints::notifications::mark_read))
        .route("/notifications/broadcast", post(endpoints::notifications::broadcast))
        .route(
            "/consents",
            get(endpoints::consents::list).post(endpoints::consents::upsert),
        )
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::audit::log_access))
        .layer(axum::middleware::from_fn(middleware::auth::require_active))
        .layer(axum::Extension(ctx.clone()));

    // Any valid session, active or not
    let session = Router::new()
        .route("/auth/me", get(endpoints::auth::me))
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::audit::log_access))
        .layer(axum::middleware::from_fn(middleware::auth::require_session))
        .layer(axum::Extension(ctx.clone()));

    let open = Router::new()
        .route("/auth/signup", post(endpoints::auth::signup))
        .route("/auth/login", post(endpoints::auth::login))
        .route("/health", get(endpoints::health::check))
        .with_state(ctx);

    Router::new()
        .merge(active)
        .merge(session)
        .merge(open)
        .layer(CorsLayer::permissive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use chrono::Utc;
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::auth;
    use crate::db::repository;
    use crate::db::sqlite::open_memory_database;
    use crate::models::enums::{ProfileStatus, Role};
    use crate::models::Profile;

    fn test_ctx() -> ApiContext {
        ApiContext::new(open_memory_database().unwrap(), Config::for_tests())
    }

    /// Insert an active user with one role directly through the shared
    /// connection; returns the id.
    fn seed_user(ctx: &ApiContext, email: &str, password: &str, role: Role) -> Uuid {
        seed_profile(ctx, email, password, Some(role), ProfileStatus::Active)
    }

    fn seed_profile(
        ctx: &ApiContext,
        email: &str,
        password: &str,
        role: Option<Role>,
        status: ProfileStatus,
    ) -> Uuid {
        let now = Utc::now();
        let profile = Profile {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: auth::hash_password(password).unwrap(),
            full_name: format!("User {email}"),
            phone: None,
            status,
            requested_role: None,
            created_at: now,
            updated_at: now,
        };
        let conn = ctx.db().unwrap();
        repository::insert_profile(&conn, &profile).unwrap();
        if let Some(role) = role {
            repository::add_role(&conn, &profile.id, role).unwrap();
        }
        profile.id
    }

    fn json_request(method: &str, uri: &str, token: Option<&str>, body: &str) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("Content-Type", "application/json");
        if let Some(t) = token {
            builder = builder.header("Authorization", format!("Bearer {t}"));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(t) = token {
            builder = builder.header("Authorization", format!("Bearer {t}"));
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn response_json(response: axum::http::Response<Body>) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), 65536).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    async fn login(app: &Router, email: &str, password: &str) -> String {
        let body = serde_json::json!({ "email": email, "password": password }).to_string();
        let response = app
            .clone()
            .oneshot(json_request("POST", "/auth/login", None, &body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK, "login should succeed");
        response_json(response).await["token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn health_is_open() {
        let app = api_router_with_ctx(test_ctx());
        let response = app.oneshot(get_request("/health", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = response_json(response).await;
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn protected_routes_require_token() {
        let app = api_router_with_ctx(test_ctx());
        let response = app.clone().oneshot(get_request("/referrals", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app
            .oneshot(get_request("/referrals", Some("not-a-token")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn signup_activation_login_flow() {
        let ctx = test_ctx();
        seed_user(&ctx, "admin@afyalink.org", "admin-pass-1", Role::Admin);
        let app = api_router_with_ctx(ctx);

        // Signup with a registration code
        let body = serde_json::json!({
            "email": "Wanjiru@example.org",
            "password": "correct-horse",
            "full_name": "Wanjiru Kamau",
            "registration_code": "DOC-2024"
        })
        .to_string();
        let response = app
            .clone()
            .oneshot(json_request("POST", "/auth/signup", None, &body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let json = response_json(response).await;
        assert_eq!(json["status"], "pending");
        assert_eq!(json["requested_role"], "doctor");
        let user_id = json["id"].as_str().unwrap().to_string();

        // Login before activation: forbidden
        let login_body =
            serde_json::json!({ "email": "wanjiru@example.org", "password": "correct-horse" })
                .to_string();
        let response = app
            .clone()
            .oneshot(json_request("POST", "/auth/login", None, &login_body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        // But the pending user can check /auth/me... only with a token,
        // which login refuses to give. Admin activates with the requested role.
        let admin_token = login(&app, "admin@afyalink.org", "admin-pass-1").await;
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                &format!("/admin/users/{user_id}/activate"),
                Some(&admin_token),
                r#"{"role":"doctor"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = response_json(response).await;
        assert_eq!(json["status"], "active");

        // Now login succeeds and carries the granted role
        let response = app
            .clone()
            .oneshot(json_request("POST", "/auth/login", None, &login_body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = response_json(response).await;
        assert_eq!(json["roles"], serde_json::json!(["doctor"]));
    }

    #[tokio::test]
    async fn signup_rejects_unknown_registration_code() {
        let app = api_router_with_ctx(test_ctx());
        let body = serde_json::json!({
            "email": "x@example.org",
            "password": "long-enough-pass",
            "full_name": "X",
            "registration_code": "WRONG"
        })
        .to_string();
        let response = app
            .oneshot(json_request("POST", "/auth/signup", None, &body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn referral_visibility_is_scoped_per_role() {
        let ctx = test_ctx();
        let patient_a = seed_user(&ctx, "a@example.org", "password-aa", Role::Patient);
        seed_user(&ctx, "b@example.org", "password-bb", Role::Patient);
        seed_user(&ctx, "doc@example.org", "password-dd", Role::Doctor);
        let app = api_router_with_ctx(ctx);

        let doctor_token = login(&app, "doc@example.org", "password-dd").await;
        let create = serde_json::json!({
            "patient_id": patient_a,
            "facility_from": "Kitale County Referral",
            "facility_to": "Moi Teaching and Referral",
            "reason": "Cardiology consult",
            "urgency": "high"
        })
        .to_string();
        let response = app
            .clone()
            .oneshot(json_request("POST", "/referrals", Some(&doctor_token), &create))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let referral_id = response_json(response).await["id"].as_str().unwrap().to_string();

        // Patient A sees it
        let token_a = login(&app, "a@example.org", "password-aa").await;
        let response = app
            .clone()
            .oneshot(get_request("/referrals", Some(&token_a)))
            .await
            .unwrap();
        let json = response_json(response).await;
        assert_eq!(json["referrals"].as_array().unwrap().len(), 1);

        // Patient B sees nothing, and a direct fetch is a 404, not a 403
        let token_b = login(&app, "b@example.org", "password-bb").await;
        let response = app
            .clone()
            .oneshot(get_request("/referrals", Some(&token_b)))
            .await
            .unwrap();
        let json = response_json(response).await;
        assert!(json["referrals"].as_array().unwrap().is_empty());

        let response = app
            .oneshot(get_request(&format!("/referrals/{referral_id}"), Some(&token_b)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn referral_patch_rejects_unknown_fields() {
        let ctx = test_ctx();
        let patient = seed_user(&ctx, "p@example.org", "password-pp", Role::Patient);
        seed_user(&ctx, "doc@example.org", "password-dd", Role::Doctor);
        let app = api_router_with_ctx(ctx);

        let doctor_token = login(&app, "doc@example.org", "password-dd").await;
        let create = serde_json::json!({
            "patient_id": patient,
            "facility_from": "Dispensary",
            "facility_to": "County Hospital",
            "reason": "Fracture follow-up",
            "urgency": "low"
        })
        .to_string();
        let response = app
            .clone()
            .oneshot(json_request("POST", "/referrals", Some(&doctor_token), &create))
            .await
            .unwrap();
        let referral_id = response_json(response).await["id"].as_str().unwrap().to_string();

        // Attempt to rewrite a non-whitelisted column
        let response = app
            .clone()
            .oneshot(json_request(
                "PUT",
                &format!("/referrals/{referral_id}"),
                Some(&doctor_token),
                r#"{"referring_doctor_id":"00000000-0000-0000-0000-000000000000"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        // A whitelisted transition still works
        let response = app
            .oneshot(json_request(
                "PUT",
                &format!("/referrals/{referral_id}"),
                Some(&doctor_token),
                r#"{"status":"accepted"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = response_json(response).await;
        assert_eq!(json["status"], "accepted");
    }

    #[tokio::test]
    async fn invalid_transition_is_conflict() {
        let ctx = test_ctx();
        let patient = seed_user(&ctx, "p@example.org", "password-pp", Role::Patient);
        seed_user(&ctx, "doc@example.org", "password-dd", Role::Doctor);
        let app = api_router_with_ctx(ctx);

        let token = login(&app, "doc@example.org", "password-dd").await;
        let create = serde_json::json!({
            "patient_id": patient,
            "facility_from": "Health Centre",
            "facility_to": "Sub-County Hospital",
            "reason": "Imaging",
            "urgency": "low"
        })
        .to_string();
        let response = app
            .clone()
            .oneshot(json_request("POST", "/referrals", Some(&token), &create))
            .await
            .unwrap();
        let id = response_json(response).await["id"].as_str().unwrap().to_string();

        // pending → completed skips the chain
        let response = app
            .oneshot(json_request(
                "PUT",
                &format!("/referrals/{id}"),
                Some(&token),
                r#"{"status":"completed"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn pending_user_can_read_own_status_via_me() {
        let ctx = test_ctx();
        let id = seed_profile(&ctx, "pend@example.org", "password-xx", None, ProfileStatus::Pending);
        // Issue a token directly; login refuses pending accounts.
        let token = auth::issue_token(ctx.config.jwt_secret.as_bytes(), &id, 3600).unwrap();
        let app = api_router_with_ctx(ctx);

        let response = app.clone().oneshot(get_request("/auth/me", Some(&token))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = response_json(response).await;
        assert_eq!(json["status"], "pending");

        // But the active-only surface stays closed
        let response = app.oneshot(get_request("/referrals", Some(&token))).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn admin_surface_forbidden_for_non_admin() {
        let ctx = test_ctx();
        seed_user(&ctx, "doc@example.org", "password-dd", Role::Doctor);
        let app = api_router_with_ctx(ctx);

        let token = login(&app, "doc@example.org", "password-dd").await;
        let response = app.oneshot(get_request("/admin/stats", Some(&token))).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn notifications_inbox_round_trip() {
        let ctx = test_ctx();
        seed_user(&ctx, "admin@afyalink.org", "admin-pass-1", Role::Admin);
        seed_user(&ctx, "n@example.org", "password-nn", Role::Nurse);
        let app = api_router_with_ctx(ctx);

        let admin_token = login(&app, "admin@afyalink.org", "admin-pass-1").await;
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/notifications/broadcast",
                Some(&admin_token),
                r#"{"title":"Rota","message":"New on-call rota","role":"nurse"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = response_json(response).await;
        assert_eq!(json["recipients"], 1);

        let nurse_token = login(&app, "n@example.org", "password-nn").await;
        let response = app
            .clone()
            .oneshot(get_request("/notifications", Some(&nurse_token)))
            .await
            .unwrap();
        let json = response_json(response).await;
        let inbox = json["notifications"].as_array().unwrap();
        assert_eq!(inbox.len(), 1);
        let nid = inbox[0]["id"].as_str().unwrap().to_string();

        let response = app
            .clone()
            .oneshot(json_request(
                "PUT",
                &format!("/notifications/{nid}/read"),
                Some(&nurse_token),
                "",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        // Someone else's id: 404
        let response = app
            .oneshot(json_request(
                "PUT",
                &format!("/notifications/{}/read", Uuid::new_v4()),
                Some(&nurse_token),
                "",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let app = api_router_with_ctx(test_ctx());
        let response = app.oneshot(get_request("/nope", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
