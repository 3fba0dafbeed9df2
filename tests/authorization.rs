//! End-to-end authorization scenarios
//!
//! Exercises the full path a deployment sees: mint a token, synthesize the
//! request identifier through the middleware, and evaluate grants against
//! it under an injected clock.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use turnstile::auth::tokens::{self, TokenClaims};
use turnstile::{
    AuthConfig, AuthError, Authorizer, FixedClock, Handler, MemoryTokenStore, RequestContext,
    RouterResource, TokenType, Uri,
};

const SECRET: &[u8] = b"integration-test-secret";
const NOW: i64 = 1_000;

fn authorizer_at(now: i64) -> Arc<Authorizer> {
    Arc::new(Authorizer::new(
        AuthConfig::new(SECRET).unwrap(),
        Arc::new(FixedClock(now)),
        Arc::new(MemoryTokenStore::new()),
    ))
}

fn uri(source: &str) -> Uri {
    Uri::parse(source).unwrap()
}

fn service_token(grants: &[&str]) -> String {
    service_token_expiring(grants, NOW + 10_000)
}

fn service_token_expiring(grants: &[&str], expires_at: i64) -> String {
    tokens::mint(
        &TokenClaims {
            id: "svc-1".to_string(),
            issued_at: NOW,
            expires_at,
            token_type: TokenType::Service,
            allowed_resources: grants.iter().map(|g| uri(g)).collect(),
        },
        SECRET,
    )
}

#[test]
fn exact_grant_admits_exact_request() {
    let authorizer = authorizer_at(NOW);
    let token = service_token(&["hs:hs_auth:api:v2:GetUser"]);

    let authorized = authorizer
        .authorized_resources(&token, vec![uri("hs:hs_auth:api:v2:GetUser")])
        .unwrap();
    assert_eq!(authorized, vec![uri("hs:hs_auth:api:v2:GetUser")]);
}

#[test]
fn namespace_grant_admits_request_beneath_it() {
    let authorizer = authorizer_at(NOW);
    let token = service_token(&["hs:hs_auth:api:v2"]);

    let authorized = authorizer
        .authorized_resources(&token, vec![uri("hs:hs_auth:api:v2:GetUser")])
        .unwrap();
    assert_eq!(authorized.len(), 1);
}

#[test]
fn argument_pattern_grant_admits_matching_value() {
    let authorizer = authorizer_at(NOW);
    let token = service_token(&[
        "hs:hs_auth:api:v2:provide_access_to_uri?allowed_uri%3Dhs%3Ahs_application%3A%2A",
    ]);

    let request = uri(
        "hs:hs_auth:api:v2:provide_access_to_uri?allowed_uri%3Dhs%3Ahs_application%3Acheckin%3A%2A",
    );
    let authorized = authorizer
        .authorized_resources(&token, vec![request])
        .unwrap();
    assert_eq!(authorized.len(), 1);
}

#[test]
fn empty_pattern_grant_forbids_the_argument() {
    let authorizer = authorizer_at(NOW);
    let token = service_token(&["hs:hs_auth:frontend:ResetPassword?postForm_userId%3D"]);

    // Request that leaves userId alone is admitted.
    let free = uri("hs:hs_auth:frontend:ResetPassword?postForm_password%3Dx");
    let authorized = authorizer.authorized_resources(&token, vec![free]).unwrap();
    assert_eq!(authorized.len(), 1);

    // Request that supplies userId is not.
    let pinned = uri("hs:hs_auth:frontend:ResetPassword?postForm_userId%3Du");
    let authorized = authorizer
        .authorized_resources(&token, vec![pinned])
        .unwrap();
    assert!(authorized.is_empty());
}

#[test]
fn time_bounded_grant_expires_with_the_clock() {
    let token = service_token(&["hs:hs_auth#before%3D1000"]);
    let request = vec![uri("hs:hs_auth:api:v2:GetUser")];

    let before = authorizer_at(500)
        .authorized_resources(&token, request.clone())
        .unwrap();
    assert_eq!(before.len(), 1);

    let after = authorizer_at(1_001)
        .authorized_resources(&token, request)
        .unwrap();
    assert!(after.is_empty());
}

#[test]
fn malformed_request_metadata_blames_the_caller() {
    let authorizer = authorizer_at(NOW);
    let token = service_token(&["hs:hs_auth"]);

    let result =
        authorizer.authorized_resources(&token, vec![uri("hs:hs_auth#before%3Dnotadate")]);
    assert!(matches!(result, Err(AuthError::InvalidUri(_))));
}

#[test]
fn malformed_token_metadata_blames_the_token() {
    let authorizer = authorizer_at(NOW);
    let token = service_token(&["hs:hs_auth#before%3Dnotadate"]);

    let result = authorizer.authorized_resources(&token, vec![uri("hs:hs_auth")]);
    assert!(matches!(result, Err(AuthError::InvalidToken(_))));
}

#[test]
fn expired_token_fails_every_query() {
    let authorizer = authorizer_at(NOW);
    let token = service_token_expiring(&["hs:hs_auth"], NOW - 5);

    let result = authorizer.authorized_resources(&token, vec![uri("hs:hs_auth")]);
    assert!(matches!(result, Err(AuthError::InvalidToken(_))));

    let result = authorizer.token_type_from_token(&token);
    assert!(matches!(result, Err(AuthError::InvalidToken(_))));
}

#[test]
fn user_id_lookup_demands_a_user_token() {
    let authorizer = authorizer_at(NOW);
    let token = service_token(&[]);

    let result = authorizer.user_id_from_token(&token);
    assert!(matches!(result, Err(AuthError::InvalidTokenType { .. })));
}

#[tokio::test]
async fn service_token_lifecycle_round_trip() {
    let store = Arc::new(MemoryTokenStore::new());
    let authorizer = Arc::new(Authorizer::new(
        AuthConfig::new(SECRET).unwrap(),
        Arc::new(FixedClock(NOW)),
        store.clone(),
    ));

    let token = authorizer
        .create_service_token("owner-1", vec![uri("hs:hs_auth:api:v2")], NOW + 10_000)
        .await
        .unwrap();
    assert_eq!(store.record_count(), 1);

    // The minted token authorizes requests under its grant.
    let authorized = authorizer
        .authorized_resources(&token, vec![uri("hs:hs_auth:api:v2:GetUser")])
        .unwrap();
    assert_eq!(authorized.len(), 1);

    authorizer.invalidate_service_token(&token).await.unwrap();
    assert_eq!(store.record_count(), 0);
}

struct TestRouter {
    token: String,
    unauthorized: AtomicUsize,
}

#[async_trait]
impl RouterResource for TestRouter {
    fn auth_token(&self, _ctx: &RequestContext) -> String {
        self.token.clone()
    }

    fn resource_path(&self) -> String {
        "hs:hs_auth:api:v2".to_string()
    }

    async fn handle_unauthorized(&self, _ctx: &RequestContext) {
        self.unauthorized.fetch_add(1, Ordering::SeqCst);
    }
}

struct GetUserHandler {
    called: AtomicBool,
}

#[async_trait]
impl Handler for GetUserHandler {
    fn name(&self) -> &str {
        "GetUser"
    }

    async fn handle(&self, _ctx: &RequestContext) {
        self.called.store(true, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn middleware_admits_granted_request_and_rejects_the_rest() {
    let granted = service_token(&["hs:hs_auth:api:v2"]);
    let denied = service_token(&["hs:hs_application"]);

    for (token, expect_admitted) in [(granted, true), (denied, false)] {
        let router = Arc::new(TestRouter {
            token,
            unauthorized: AtomicUsize::new(0),
        });
        let handler = GetUserHandler {
            called: AtomicBool::new(false),
        };

        let middleware = authorizer_at(NOW).with_auth_middleware(router.clone(), handler);
        middleware.handle(&RequestContext::default()).await;

        let admitted = router.unauthorized.load(Ordering::SeqCst) == 0;
        assert_eq!(admitted, expect_admitted);
    }
}

#[tokio::test]
async fn middleware_passes_request_parameters_into_the_decision() {
    let token = service_token(&["hs:hs_auth:api:v2:GetUser?path_id%3Dme"]);

    let mut ctx = RequestContext::default();
    ctx.params.path.insert("id".to_string(), "me".to_string());

    let router = Arc::new(TestRouter {
        token,
        unauthorized: AtomicUsize::new(0),
    });
    let handler = GetUserHandler {
        called: AtomicBool::new(false),
    };

    let middleware = authorizer_at(NOW).with_auth_middleware(router.clone(), handler);
    middleware.handle(&ctx).await;

    assert_eq!(router.unauthorized.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn concurrent_authorization_checks_share_one_authorizer() {
    let authorizer = authorizer_at(NOW);
    let token = service_token(&["hs:hs_auth:api:v2"]);

    let mut handles = vec![];
    for i in 0..100 {
        let authorizer = authorizer.clone();
        let token = token.clone();
        handles.push(tokio::spawn(async move {
            let request = uri(&format!("hs:hs_auth:api:v2:GetUser?path_id%3Du{i}"));
            authorizer
                .authorized_resources(&token, vec![request])
                .unwrap()
                .len()
        }));
    }

    let mut admitted = 0;
    for handle in handles {
        admitted += handle.await.unwrap();
    }

    assert_eq!(admitted, 100);
}
