mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::body::Body;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chemstore::middleware::context::RequestContext;
use chemstore::middleware::gate::guarded;
use chemstore::middleware::policy::{
    ALLOW_ALL, ANY_ROLE_VIEW, ASSISTANT_ONLY_API, ASSISTANT_ONLY_NO_XSRF, ASSISTANT_ONLY_VIEW,
    Settings, UNRESTRICTED,
};
use chemstore::state::AppState;
use chemstore_auth::{Claims, XSRF_HEADER, xsrf};
use chemstore_core::Role;
use common::{
    TEST_SECRET, access_cookie, fresh_token, read_json, renewal_eligible_token, request,
    test_state, unreachable_pool, with_token,
};
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

struct Harness {
    state: AppState,
    hits: Arc<AtomicUsize>,
}

impl Harness {
    fn new() -> Self {
        Self {
            state: test_state(unreachable_pool()),
            hits: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// `/echo` behind the gate, echoing the identity the handler received.
    fn app(&self, settings: Settings) -> Router {
        let hits = self.hits.clone();
        let handler = move |ctx: RequestContext| {
            let hits = hits.clone();
            async move {
                hits.fetch_add(1, Ordering::SeqCst);
                Json(json!({ "user_id": ctx.user_id, "role": ctx.role }))
            }
        };

        let router = Router::new().route("/echo", get(handler.clone()).post(handler));
        guarded(router, &self.state, settings).with_state(self.state.clone())
    }

    fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

#[tokio::test]
async fn test_forbidden_host() {
    let harness = Harness::new();

    let req = axum::http::Request::builder()
        .uri("/echo")
        .header("host", "evil.example.com")
        .body(Body::empty())
        .unwrap();
    let response = harness.app(UNRESTRICTED).oneshot(req).await.unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(harness.hits(), 0);
}

#[tokio::test]
async fn test_anonymous_on_optional_route() {
    let harness = Harness::new();

    let req = request("GET", "/echo").body(Body::empty()).unwrap();
    let response = harness.app(UNRESTRICTED).oneshot(req).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(access_cookie(&response).is_none());
    let body = read_json(response).await;
    assert_eq!(body, json!({ "user_id": null, "role": null }));
}

#[tokio::test]
async fn test_garbage_cookie_is_anonymous() {
    let harness = Harness::new();

    let req = with_token(request("GET", "/echo"), "not.a.token")
        .body(Body::empty())
        .unwrap();
    let response = harness.app(UNRESTRICTED).oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json(response).await["user_id"], Value::Null);

    let req = with_token(request("GET", "/echo"), "not.a.token")
        .body(Body::empty())
        .unwrap();
    let response = harness.app(ANY_ROLE_VIEW).oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(harness.hits(), 1);
}

#[tokio::test]
async fn test_missing_cookie_on_required_route() {
    let harness = Harness::new();

    let req = request("GET", "/echo").body(Body::empty()).unwrap();
    let response = harness.app(ANY_ROLE_VIEW).oneshot(req).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = read_json(response).await;
    assert_eq!(body, json!({ "error": "Unauthorized" }));
    assert_eq!(harness.hits(), 0);
}

#[tokio::test]
async fn test_renewal_trusts_claims_without_database() {
    let harness = Harness::new();
    let user_id = Uuid::new_v4();
    let old = renewal_eligible_token(&harness.state, user_id, Role::Assistant);

    let req = with_token(request("GET", "/echo"), &old.token)
        .body(Body::empty())
        .unwrap();
    let response = harness.app(ANY_ROLE_VIEW).oneshot(req).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let renewed = access_cookie(&response).expect("renewed cookie");
    let claims = harness.state.tokens.validate(&renewed).unwrap();
    assert_eq!(claims.sub, user_id.to_string());
    assert_eq!(claims.acr, "assistant");
    assert_eq!(claims.iat, old.claims.iat);
    assert!(claims.exp > old.claims.exp);

    let body = read_json(response).await;
    assert_eq!(
        body,
        json!({ "user_id": user_id.to_string(), "role": "assistant" })
    );
}

#[tokio::test]
async fn test_renewed_role_not_allowed() {
    let harness = Harness::new();
    let token = renewal_eligible_token(&harness.state, Uuid::new_v4(), Role::Unconfirmed);

    let req = with_token(request("GET", "/echo"), &token.token)
        .body(Body::empty())
        .unwrap();
    let response = harness.app(ASSISTANT_ONLY_VIEW).oneshot(req).await.unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(harness.hits(), 0);
    // The renewed cookie rides on the rejection too.
    assert!(access_cookie(&response).is_some());
}

#[tokio::test]
async fn test_cancelled_caller_lookup_is_anonymous() {
    let harness = Harness::new();
    // Too young for renewal, so the gate has to read the user record.
    let token = fresh_token(&harness.state, Uuid::new_v4(), Role::Assistant);

    let req = with_token(request("GET", "/echo"), &token.token)
        .body(Body::empty())
        .unwrap();
    let response = harness.app(ANY_ROLE_VIEW).oneshot(req).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(harness.hits(), 0);
    assert!(access_cookie(&response).is_none());
}

#[tokio::test]
async fn test_unknown_role_claim_is_anonymous() {
    let harness = Harness::new();
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: Uuid::new_v4().to_string(),
        acr: "root".to_string(),
        iat: now - 7200,
        exp: now + 600,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .unwrap();

    let req = with_token(request("GET", "/echo"), &token)
        .body(Body::empty())
        .unwrap();
    let response = harness.app(ANY_ROLE_VIEW).oneshot(req).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(access_cookie(&response).is_none());
}

#[tokio::test]
async fn test_unsafe_method_requires_xsrf() {
    let harness = Harness::new();
    let user_id = Uuid::new_v4();
    let token = renewal_eligible_token(&harness.state, user_id, Role::Assistant);

    let req = with_token(request("POST", "/echo"), &token.token)
        .body(Body::empty())
        .unwrap();
    let response = harness.app(ASSISTANT_ONLY_API).oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let wrong_path = xsrf::generate(TEST_SECRET, &user_id.to_string(), "/other");
    let req = with_token(request("POST", "/echo"), &token.token)
        .header(XSRF_HEADER, wrong_path)
        .body(Body::empty())
        .unwrap();
    let response = harness.app(ASSISTANT_ONLY_API).oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let wrong_subject = xsrf::generate(TEST_SECRET, &Uuid::new_v4().to_string(), "/echo");
    let req = with_token(request("POST", "/echo"), &token.token)
        .header(XSRF_HEADER, wrong_subject)
        .body(Body::empty())
        .unwrap();
    let response = harness.app(ASSISTANT_ONLY_API).oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(harness.hits(), 0);

    let valid = xsrf::generate(TEST_SECRET, &user_id.to_string(), "/echo");
    let req = with_token(request("POST", "/echo"), &token.token)
        .header(XSRF_HEADER, valid)
        .body(Body::empty())
        .unwrap();
    let response = harness.app(ASSISTANT_ONLY_API).oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(harness.hits(), 1);
}

#[tokio::test]
async fn test_safe_method_skips_xsrf() {
    let harness = Harness::new();
    let token = renewal_eligible_token(&harness.state, Uuid::new_v4(), Role::Assistant);

    let req = with_token(request("GET", "/echo"), &token.token)
        .body(Body::empty())
        .unwrap();
    let response = harness.app(ASSISTANT_ONLY_API).oneshot(req).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_xsrf_exempt_policy() {
    let harness = Harness::new();
    let token = renewal_eligible_token(&harness.state, Uuid::new_v4(), Role::Assistant);

    let req = with_token(request("POST", "/echo"), &token.token)
        .body(Body::empty())
        .unwrap();
    let response = harness.app(ASSISTANT_ONLY_NO_XSRF).oneshot(req).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_anonymous_xsrf_uses_nil_subject() {
    let harness = Harness::new();
    let settings = Settings {
        auth_required: false,
        auth_exempt: false,
        allowed_roles: ALLOW_ALL,
        xsrf_exempt: false,
    };

    let token = xsrf::generate(TEST_SECRET, &Uuid::nil().to_string(), "/echo?x=1");
    let req = request("POST", "/echo?x=1")
        .header(XSRF_HEADER, token)
        .body(Body::empty())
        .unwrap();
    let response = harness.app(settings).oneshot(req).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_auth_exempt_ignores_cookie() {
    let harness = Harness::new();
    let settings = Settings {
        auth_exempt: true,
        ..UNRESTRICTED
    };
    let token = renewal_eligible_token(&harness.state, Uuid::new_v4(), Role::Admin);

    let req = with_token(request("GET", "/echo"), &token.token)
        .body(Body::empty())
        .unwrap();
    let response = harness.app(settings).oneshot(req).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(access_cookie(&response).is_none());
    assert_eq!(read_json(response).await["user_id"], Value::Null);
}
