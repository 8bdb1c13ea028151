//! End-to-end tests through the axum router.

use std::sync::atomic::AtomicU64;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chirpy_server::config::{AppState, ServerConfig};
use chirpy_server::router;
use chirpy_server::store::{ChirpStore, StoreOptions};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

const JWT_SECRET: &str = "test-jwt-secret";
const POLKA_KEY: &str = "test-polka-key";

async fn test_app() -> (Router, TempDir) {
    let dir = TempDir::new().unwrap();
    let config = ServerConfig {
        database_path: dir.path().join("database.json"),
        jwt_secret: JWT_SECRET.to_string(),
        polka_key: POLKA_KEY.to_string(),
        port: 0,
        debug: false,
        bcrypt_cost: 4,
    };
    let store = Arc::new(
        ChirpStore::open(
            &config.database_path,
            StoreOptions {
                debug: false,
                bcrypt_cost: config.bcrypt_cost,
            },
        )
        .await
        .unwrap(),
    );
    let state = AppState {
        store,
        config: Arc::new(config),
        fileserver_hits: Arc::new(AtomicU64::new(0)),
    };
    (router(state), dir)
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn authed_json_request(method: &str, uri: &str, token: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn healthz_answers_ok() {
    let (app, _dir) = test_app().await;
    let response = app
        .oneshot(Request::get("/api/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn signup_login_post_and_list_chirps() {
    let (app, _dir) = test_app().await;

    // Create the account.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/users",
            json!({"email": "a@x.com", "password": "secret"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let user = body_json(response).await;
    assert_eq!(user["id"], 1);
    assert_eq!(user["email"], "a@x.com");
    assert!(user.get("pss_hash").is_none());

    // Log in.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/login",
            json!({"email": "a@x.com", "password": "secret"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let login = body_json(response).await;
    let token = login["token"].as_str().unwrap().to_string();
    let refresh_token = login["refresh_token"].as_str().unwrap().to_string();
    assert_eq!(refresh_token.len(), 64);

    // Post a chirp; the profanity filter runs at write time.
    let response = app
        .clone()
        .oneshot(authed_json_request(
            "POST",
            "/api/chirps",
            &token,
            json!({"body": "a kerfuffle happened"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let chirp = body_json(response).await;
    assert_eq!(chirp["id"], 1);
    assert_eq!(chirp["body"], "a **** happened");
    assert_eq!(chirp["author_id"], 1);

    // List it back.
    let response = app
        .clone()
        .oneshot(Request::get("/api/chirps").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let chirps = body_json(response).await;
    assert_eq!(chirps.as_array().unwrap().len(), 1);

    // Refresh rotates a new access token.
    let response = app
        .clone()
        .oneshot(authed_json_request(
            "POST",
            "/api/refresh",
            &refresh_token,
            json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_json(response).await["token"].is_string());

    // Revoke, then refresh fails.
    let response = app
        .clone()
        .oneshot(authed_json_request(
            "POST",
            "/api/revoke",
            &refresh_token,
            json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .oneshot(authed_json_request(
            "POST",
            "/api/refresh",
            &refresh_token,
            json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn chirp_mutations_require_a_valid_token() {
    let (app, _dir) = test_app().await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/chirps",
            json!({"body": "hello"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .oneshot(authed_json_request(
            "POST",
            "/api/chirps",
            "not-a-jwt",
            json!({"body": "hello"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn invalid_query_params_report_field_errors() {
    let (app, _dir) = test_app().await;

    let response = app
        .oneshot(
            Request::get("/api/chirps?author_id=abc&sort=sideways")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["errors"]["author_id"].is_string());
    assert!(body["errors"]["sort"].is_string());
}

#[tokio::test]
async fn webhook_upgrades_only_with_the_right_key_and_event() {
    let (app, _dir) = test_app().await;

    app.clone()
        .oneshot(json_request(
            "POST",
            "/api/users",
            json!({"email": "a@x.com", "password": "secret"}),
        ))
        .await
        .unwrap();

    // Wrong key.
    let response = app
        .clone()
        .oneshot(
            Request::post("/api/polka/webhooks")
                .header(header::CONTENT_TYPE, "application/json")
                .header(header::AUTHORIZATION, "ApiKey wrong")
                .body(Body::from(
                    json!({"event": "user.upgraded", "data": {"user_id": 1}}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Unknown event: acknowledged, no effect.
    let response = app
        .clone()
        .oneshot(
            Request::post("/api/polka/webhooks")
                .header(header::CONTENT_TYPE, "application/json")
                .header(header::AUTHORIZATION, format!("ApiKey {POLKA_KEY}"))
                .body(Body::from(
                    json!({"event": "user.downgraded", "data": {"user_id": 1}}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // The real thing.
    let response = app
        .clone()
        .oneshot(
            Request::post("/api/polka/webhooks")
                .header(header::CONTENT_TYPE, "application/json")
                .header(header::AUTHORIZATION, format!("ApiKey {POLKA_KEY}"))
                .body(Body::from(
                    json!({"event": "user.upgraded", "data": {"user_id": 1}}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/login",
            json!({"email": "a@x.com", "password": "secret"}),
        ))
        .await
        .unwrap();
    let login = body_json(response).await;
    assert_eq!(login["is_chirpy_red"], true);
}

#[tokio::test]
async fn update_user_requires_ownership_token() {
    let (app, _dir) = test_app().await;

    app.clone()
        .oneshot(json_request(
            "POST",
            "/api/users",
            json!({"email": "a@x.com", "password": "secret"}),
        ))
        .await
        .unwrap();

    // No token.
    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/api/users",
            json!({"email": "b@x.com", "password": "new"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let token = chirpy_server::auth::create_token(1, JWT_SECRET).unwrap();
    let response = app
        .oneshot(authed_json_request(
            "PUT",
            "/api/users",
            &token,
            json!({"email": "b@x.com", "password": "new"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let user = body_json(response).await;
    assert_eq!(user["email"], "b@x.com");
}
