// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::HeaderName,
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::{
        middleware::{authenticate, authorize},
        AuthenticatedUser, Role,
    },
    models::{
        AccountResponse, LoginRequest, LoginResponse, RegisterRequest, UpdateRoleRequest,
        UpdateStatusRequest,
    },
    state::AppState,
};

pub mod admin;
pub mod auth;
pub mod health;
pub mod users;

pub fn router(state: AppState) -> Router {
    let request_id = HeaderName::from_static("x-request-id");

    let v1_routes = Router::new()
        .route("/auth/login", post(auth::login))
        .route("/auth/register", post(auth::register))
        .route("/auth/logout", post(auth::logout))
        .route("/users/me", get(users::get_current_user))
        .route("/admin/accounts", get(admin::list_accounts))
        .route("/admin/accounts/{username}/role", put(admin::update_role))
        .route(
            "/admin/accounts/{username}/status",
            put(admin::update_status),
        );

    // Layers run bottom-up: the gate attaches the principal, then the policy
    // decides, then the handler runs.
    Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .nest("/v1", v1_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(middleware::from_fn_with_state(state.clone(), authorize))
        .layer(middleware::from_fn_with_state(state.clone(), authenticate))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        health::liveness,
        health::readiness,
        auth::login,
        auth::register,
        auth::logout,
        users::get_current_user,
        admin::list_accounts,
        admin::update_role,
        admin::update_status
    ),
    components(
        schemas(
            Role,
            AuthenticatedUser,
            AccountResponse,
            LoginRequest,
            LoginResponse,
            RegisterRequest,
            UpdateRoleRequest,
            UpdateStatusRequest,
            users::UserMeResponse,
            admin::AccountListResponse,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness and readiness probes"),
        (name = "Auth", description = "Login, registration and logout"),
        (name = "Users", description = "Current user"),
        (name = "Admin", description = "Account management (ADMIN only)")
    )
)]
struct ApiDoc;

/// Registers the `bearer` JWT scheme referenced by `security(("bearer" = []))`.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_support::{bearer, state};
    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
        response::Response,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        auth: Option<&str>,
        body: Option<Value>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(auth) = auth {
            builder = builder.header(header::AUTHORIZATION, auth);
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        app.clone().oneshot(builder.body(body).unwrap()).await.unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn login(app: &Router, username: &str, password: &str) -> Response {
        send(
            app,
            Method::POST,
            "/v1/auth/login",
            None,
            Some(json!({ "username": username, "password": password })),
        )
        .await
    }

    #[tokio::test]
    async fn router_builds_with_all_routes() {
        let app = router(state());
        let _ = app.into_make_service();
    }

    #[tokio::test]
    async fn health_is_public_and_tagged_with_request_id() {
        let app = router(state());
        let response = send(&app, Method::GET, "/health/live", None, None).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn openapi_declares_bearer_scheme() {
        let app = router(state());
        let response = send(&app, Method::GET, "/api-doc/openapi.json", None, None).await;
        assert_eq!(response.status(), StatusCode::OK);

        let doc = json_body(response).await;
        assert_eq!(doc["components"]["securitySchemes"]["bearer"]["scheme"], "bearer");
        assert!(doc["paths"]["/v1/auth/login"]["post"].is_object());
    }

    #[tokio::test]
    async fn login_then_me() {
        let app = router(state());

        let response = login(&app, "Driver", "password123").await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["token_type"], "Bearer");
        assert_eq!(body["subject"], "driver");
        assert_eq!(body["role"], "DRIVER");
        assert_eq!(body["expires_in"], 86_400);

        let auth = format!("Bearer {}", body["token"].as_str().unwrap());
        let response = send(&app, Method::GET, "/v1/users/me", Some(&auth), None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let me = json_body(response).await;
        assert_eq!(me["subject"], "driver");
        assert_eq!(me["role"], "DRIVER");
    }

    #[tokio::test]
    async fn login_failures_are_indistinguishable() {
        let app = router(state());

        let wrong_password = login(&app, "driver", "nope-nope").await;
        assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
        let wrong_password = json_body(wrong_password).await;

        let unknown_user = login(&app, "ghost", "password123").await;
        assert_eq!(unknown_user.status(), StatusCode::UNAUTHORIZED);
        let unknown_user = json_body(unknown_user).await;

        assert_eq!(wrong_password, unknown_user);
        assert_eq!(wrong_password["error_code"], "invalid_credentials");
    }

    #[tokio::test]
    async fn malformed_bodies_get_json_errors() {
        let state = state();
        let admin = bearer(&state, "admin");
        let app = router(state);

        for (method, uri, auth) in [
            (Method::POST, "/v1/auth/login", None),
            (Method::POST, "/v1/auth/register", None),
            (Method::PUT, "/v1/admin/accounts/driver/role", Some(admin.as_str())),
        ] {
            let mut builder = Request::builder()
                .method(method)
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json");
            if let Some(auth) = auth {
                builder = builder.header(header::AUTHORIZATION, auth);
            }
            let request = builder.body(Body::from("{username: 1}")).unwrap();
            let response = app.clone().oneshot(request).await.unwrap();

            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
            assert!(json_body(response).await["error"].is_string(), "{uri}");
        }

        let response = send(
            &app,
            Method::PUT,
            "/v1/admin/accounts/driver/role",
            Some(&admin),
            Some(json!({ "role": "OWNER" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(json_body(response).await["error"].is_string());
    }

    #[tokio::test]
    async fn health_shows_account_count_to_admin() {
        let state = state();
        let admin = bearer(&state, "admin");
        let driver = bearer(&state, "driver");
        let app = router(state);

        let response = send(&app, Method::GET, "/health", Some(&admin), None).await;
        assert_eq!(json_body(response).await["checks"]["accounts"], 4);

        for auth in [None, Some(driver.as_str())] {
            let response = send(&app, Method::GET, "/health", auth, None).await;
            assert_eq!(response.status(), StatusCode::OK);
            assert!(json_body(response).await["checks"].get("accounts").is_none());
        }
    }

    #[tokio::test]
    async fn login_requires_both_fields() {
        let app = router(state());
        let response = login(&app, "", "password123").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn disabled_account_cannot_log_in() {
        let state = state();
        state.store.write().await.set_enabled("employee", false).unwrap();
        let app = router(state);

        let response = login(&app, "employee", "password123").await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn register_creates_driver_and_rejects_duplicates() {
        let app = router(state());
        let body = json!({ "username": "New.Driver", "password": "longenough" });

        let response = send(&app, Method::POST, "/v1/auth/register", None, Some(body.clone())).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let account = json_body(response).await;
        assert_eq!(account["username"], "new.driver");
        assert_eq!(account["role"], "DRIVER");
        assert!(account.get("password_hash").is_none());

        let response = send(&app, Method::POST, "/v1/auth/register", None, Some(body)).await;
        assert_eq!(response.status(), StatusCode::CONFLICT);

        assert_eq!(login(&app, "new.driver", "longenough").await.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn register_validates_input() {
        let app = router(state());

        let short_password = json!({ "username": "someone", "password": "short" });
        let response = send(&app, Method::POST, "/v1/auth/register", None, Some(short_password)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bad_name = json!({ "username": "no spaces", "password": "longenough" });
        let response = send(&app, Method::POST, "/v1/auth/register", None, Some(bad_name)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn logout_requires_token() {
        let state = state();
        let auth = bearer(&state, "driver");
        let app = router(state);

        let response = send(&app, Method::POST, "/v1/auth/logout", None, None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = send(&app, Method::POST, "/v1/auth/logout", Some(&auth), None).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn admin_paths_by_role() {
        let state = state();
        let driver = bearer(&state, "driver");
        let admin = bearer(&state, "admin");
        let app = router(state);

        let response = send(&app, Method::GET, "/v1/admin/accounts", None, None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(response).await["error_code"], "unauthenticated");

        let response = send(&app, Method::GET, "/v1/admin/accounts", Some(&driver), None).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = send(&app, Method::GET, "/v1/admin/accounts", Some(&admin), None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["total"], 4);
        assert_eq!(body["accounts"][0]["username"], "admin");
    }

    #[tokio::test]
    async fn role_change_applies_to_existing_token() {
        let state = state();
        let admin = bearer(&state, "admin");
        let manager = bearer(&state, "manager");
        let app = router(state);

        let response = send(&app, Method::GET, "/v1/admin/accounts", Some(&manager), None).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = send(
            &app,
            Method::PUT,
            "/v1/admin/accounts/manager/role",
            Some(&admin),
            Some(json!({ "role": "ADMIN" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["role"], "ADMIN");

        let response = send(&app, Method::GET, "/v1/admin/accounts", Some(&manager), None).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn disabling_account_revokes_its_tokens() {
        let state = state();
        let admin = bearer(&state, "admin");
        let driver = bearer(&state, "driver");
        let app = router(state);

        let response = send(
            &app,
            Method::PUT,
            "/v1/admin/accounts/driver/status",
            Some(&admin),
            Some(json!({ "enabled": false })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = send(&app, Method::GET, "/v1/users/me", Some(&driver), None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(response).await["error_code"], "unknown_account");
    }

    #[tokio::test]
    async fn admin_cannot_demote_or_disable_self() {
        let state = state();
        let admin = bearer(&state, "admin");
        let app = router(state);

        let response = send(
            &app,
            Method::PUT,
            "/v1/admin/accounts/admin/role",
            Some(&admin),
            Some(json!({ "role": "DRIVER" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = send(
            &app,
            Method::PUT,
            "/v1/admin/accounts/admin/status",
            Some(&admin),
            Some(json!({ "enabled": false })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_account_update_is_not_found() {
        let state = state();
        let admin = bearer(&state, "admin");
        let app = router(state);

        let response = send(
            &app,
            Method::PUT,
            "/v1/admin/accounts/ghost/role",
            Some(&admin),
            Some(json!({ "role": "DRIVER" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn expired_token_reports_token_expired() {
        let state = state();
        let expired = state
            .tokens
            .issue_at("driver", chrono::Utc::now() - chrono::Duration::days(3))
            .unwrap();
        let auth = format!("Bearer {}", expired.token);
        let app = router(state);

        let response = send(&app, Method::GET, "/v1/users/me", Some(&auth), None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(response).await["error_code"], "token_expired");
    }
}
