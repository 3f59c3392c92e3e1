//! Diagnostic endpoints: error mapping, cache headers, CSP and role checks

use axum::{
    http::header,
    response::{Html, IntoResponse},
    routing::get,
    Json, Router,
};
use chrono::{SecondsFormat, Utc};

use super::AUTHORIZED_MESSAGE;
use crate::error::Error;
use crate::handlers::{CacheProfile, ProblemDetails, RequestContext};
use crate::middleware::{
    AdministratorOrAbove, Authenticated, Authorized, ModeratorOrAbove, SuperAdminOnly,
    SCRIPT_NONCE,
};
use crate::state::AppState;

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/error/test", get(internal_error))
        .route("/error/test/501", get(not_implemented))
        .route("/error/test/504", get(timeout))
        .route("/cod/test", get(client_check))
        .route("/cache/test/1", get(explicit_no_cache))
        .route("/cache/test/2", get(default_cache_control))
        .route("/auth/test/1", get(authenticated))
        .route("/auth/test/2", get(moderator))
        .route("/auth/test/3", get(administrator))
        .route("/auth/test/4", get(super_admin))
}

fn fail(err: Error, ctx: &RequestContext) -> (CacheProfile, ProblemDetails) {
    (CacheProfile::NoCache, ProblemDetails::from_error(&err, ctx))
}

async fn internal_error(ctx: RequestContext) -> impl IntoResponse {
    fail(Error::Internal("test".to_string()), &ctx)
}

async fn not_implemented(ctx: RequestContext) -> impl IntoResponse {
    fail(Error::NotImplemented("test 501".to_string()), &ctx)
}

async fn timeout(ctx: RequestContext) -> impl IntoResponse {
    fail(Error::Timeout("test 504".to_string()), &ctx)
}

/// Page whose inline script only runs when the CSP admits its nonce
async fn client_check() -> impl IntoResponse {
    let server_time = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);
    let page = format!(
        "<script nonce='{nonce}'>window.alert('Your client supports Javascript!\\r\\n\\r\\n\
         Server time (UTC): {server_time}\\r\\n\
         Client time (UTC): ' + new Date().toISOString());</script>\
         <noscript>Your client does not support Javascript</noscript>",
        nonce = SCRIPT_NONCE,
        server_time = server_time,
    );
    (CacheProfile::NoCache, Html(page))
}

async fn explicit_no_cache() -> impl IntoResponse {
    ([(header::CACHE_CONTROL, "no-cache, no-store")], Json(()))
}

async fn default_cache_control() -> impl IntoResponse {
    Json(())
}

async fn authenticated(_auth: Authorized<Authenticated>) -> impl IntoResponse {
    (CacheProfile::NoCache, Json(AUTHORIZED_MESSAGE))
}

async fn moderator(_auth: Authorized<ModeratorOrAbove>) -> impl IntoResponse {
    (CacheProfile::NoCache, Json(AUTHORIZED_MESSAGE))
}

async fn administrator(_auth: Authorized<AdministratorOrAbove>) -> impl IntoResponse {
    (CacheProfile::NoCache, Json(AUTHORIZED_MESSAGE))
}

async fn super_admin(_auth: Authorized<SuperAdminOnly>) -> impl IntoResponse {
    (CacheProfile::NoCache, Json(AUTHORIZED_MESSAGE))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{get, send, test_app, token};
    use super::*;
    use crate::handlers::problem_types;
    use axum::http::{Method, StatusCode};

    #[tokio::test]
    async fn test_error_probes_map_status_and_type() {
        let app = test_app().await;
        for (uri, status, type_uri) in [
            ("/error/test", StatusCode::INTERNAL_SERVER_ERROR, problem_types::INTERNAL_SERVER_ERROR),
            ("/error/test/501", StatusCode::NOT_IMPLEMENTED, problem_types::NOT_IMPLEMENTED),
            ("/error/test/504", StatusCode::GATEWAY_TIMEOUT, problem_types::GATEWAY_TIMEOUT),
        ] {
            let res = get(app.clone(), uri).await;
            assert_eq!(res.status, status, "{}", uri);
            assert_eq!(res.body["type"], type_uri);
            assert_eq!(res.headers[header::CACHE_CONTROL], "no-store");
            assert!(res.body["traceId"].as_str().is_some_and(|t| t.starts_with("req_")));
        }
    }

    #[tokio::test]
    async fn test_internal_error_detail_is_generic() {
        let res = get(test_app().await, "/error/test").await;
        let detail = res.body["detail"].as_str().unwrap_or_default();
        assert!(!detail.contains("test"));
    }

    #[tokio::test]
    async fn test_trace_id_prefers_traceparent() {
        let app = test_app().await;
        let traceparent = "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01";
        let response = tower::ServiceExt::oneshot(
            app,
            axum::http::Request::builder()
                .uri("/error/test/501")
                .header("traceparent", traceparent)
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["traceId"], traceparent);
    }

    #[tokio::test]
    async fn test_client_check_page_carries_nonce() {
        let res = get(test_app().await, "/cod/test").await;

        assert_eq!(res.status, StatusCode::OK);
        assert!(res.headers[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/html"));
        let html = res.body.as_str().unwrap();
        assert!(html.contains("<script nonce='23a98b38c'>"));
    }

    #[tokio::test]
    async fn test_cache_probes() {
        let app = test_app().await;
        let explicit = get(app.clone(), "/cache/test/1").await;
        assert_eq!(explicit.headers[header::CACHE_CONTROL], "no-cache, no-store");

        let default = get(app, "/cache/test/2").await;
        assert_eq!(default.headers[header::CACHE_CONTROL], "no-cache, no-store");
    }

    #[tokio::test]
    async fn test_auth_probes_enforce_tiers() {
        let app = test_app().await;
        let basic = token(&["Basic"]);
        let moderator = token(&["Moderator"]);
        let admin = token(&["Administrator"]);
        let super_admin = token(&["SuperAdmin", "Basic"]);

        let anonymous = get(app.clone(), "/auth/test/1").await;
        assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);

        let cases = [
            ("/auth/test/1", &basic, StatusCode::OK),
            ("/auth/test/2", &basic, StatusCode::FORBIDDEN),
            ("/auth/test/2", &moderator, StatusCode::OK),
            ("/auth/test/3", &moderator, StatusCode::FORBIDDEN),
            ("/auth/test/3", &admin, StatusCode::OK),
            ("/auth/test/4", &admin, StatusCode::FORBIDDEN),
            ("/auth/test/4", &super_admin, StatusCode::OK),
        ];
        for (uri, bearer, status) in cases {
            let res = send(app.clone(), Method::GET, uri, Some(bearer), None).await;
            assert_eq!(res.status, status, "{}", uri);
            if status == StatusCode::OK {
                assert_eq!(res.body, AUTHORIZED_MESSAGE);
            }
        }
    }

    #[tokio::test]
    async fn test_invalid_token_is_unauthorized_everywhere() {
        let res = send(
            test_app().await,
            Method::GET,
            "/BoardGames",
            Some("not-a-jwt"),
            None,
        )
        .await;

        assert_eq!(res.status, StatusCode::UNAUTHORIZED);
        assert_eq!(res.headers[header::CONTENT_TYPE], "application/problem+json");
    }
}
