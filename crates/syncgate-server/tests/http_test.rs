//! HTTP-level tests: routing, status codes and body shapes.
mod common;

use std::time::Duration;

use axum::http::StatusCode;
use common::{
    DATA_FREE_URL, ISSUER, STANDARD_URL, get, post_json, provision, read_json, spawn_app,
};
use jsonwebtoken::jwk::Jwk;
use jsonwebtoken::{Algorithm, DecodingKey};
use serde_json::{Value, json};
use syncgate_auth::token::{SyncTokenClaims, decode_sync_token};
use syncgate_db::PoolOptions;
use syncgate_server::app::{
    HEALTH_ROUTE, JWKS_ROUTE, ORGANISATION_ID_ROUTE, PIN_ROUTE, TOKEN_ROUTE,
};
use tower::ServiceExt;

async fn call(app: &axum::Router, request: axum::http::Request<axum::body::Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    (status, read_json(response).await)
}

async fn verify(app: &axum::Router, token: &str) -> SyncTokenClaims {
    let (_, jwks) = call(app, get(JWKS_ROUTE)).await;
    let jwk: Jwk = serde_json::from_value(jwks["keys"][0].clone()).unwrap();
    let key = DecodingKey::from_jwk(&jwk).unwrap();
    decode_sync_token(token, &key, Algorithm::RS256, ISSUER, STANDARD_URL).unwrap()
}

#[tokio::test]
async fn pin_login_issues_token_with_organisation_claims() {
    let app = spawn_app(PoolOptions::default()).await;
    let org = provision(&app.repo, "Acme Farms", "AB123", false).await;

    let (status, body) = call(
        &app.router,
        post_json(PIN_ROUTE, r#"{"organisationPin":"AB123"}"#),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["powersync_url"], STANDARD_URL);
    assert!(body.get("data_free").is_none());

    let claims = verify(&app.router, body["token"].as_str().unwrap()).await;
    assert_eq!(claims.sub, org.id.to_string());
    assert_eq!(claims.custom["organisationId"], json!(org.id.to_string()));
    assert_eq!(claims.custom["organisationName"], json!("Acme Farms"));
}

#[tokio::test]
async fn organisation_id_login_selects_endpoint() {
    let app = spawn_app(PoolOptions::default()).await;
    let standard = provision(&app.repo, "Standard", "ST001", false).await;
    let data_free = provision(&app.repo, "Zero Rated", "ZR001", true).await;

    for (org, expected_url, expected_flag) in [
        (&standard, STANDARD_URL, false),
        (&data_free, DATA_FREE_URL, true),
    ] {
        let body = json!({ "organisationId": org.id.to_string() }).to_string();
        let (status, response) = call(&app.router, post_json(ORGANISATION_ID_ROUTE, &body)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(response["powersync_url"], expected_url);
        assert_eq!(response["data_free"], json!(expected_flag));

        let claims = verify(&app.router, response["token"].as_str().unwrap()).await;
        assert_eq!(claims.aud, STANDARD_URL);
        assert!(claims.custom.is_empty());
    }
}

#[tokio::test]
async fn combined_endpoint_accepts_either_shape() {
    let app = spawn_app(PoolOptions::default()).await;
    let org = provision(&app.repo, "Acme", "AC001", true).await;

    let (status, body) = call(&app.router, post_json(TOKEN_ROUTE, r#"{"organisationPin":"AC001"}"#)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["powersync_url"], STANDARD_URL);

    let by_id = json!({ "organisationId": org.id.to_string() }).to_string();
    let (status, body) = call(&app.router, post_json(TOKEN_ROUTE, &by_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["powersync_url"], DATA_FREE_URL);

    let both = json!({ "organisationId": org.id.to_string(), "organisationPin": "AC001" }).to_string();
    let (status, _) = call(&app.router, post_json(TOKEN_ROUTE, &both)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn invalid_input_is_a_bad_request() {
    let app = spawn_app(PoolOptions::default()).await;

    let cases = [
        (PIN_ROUTE, r#"{"organisationPin":"AB12"}"#, "organisationPin is required and must be 5 chars long"),
        (PIN_ROUTE, r#"{}"#, "organisationPin is required and must be 5 chars long"),
        (PIN_ROUTE, "not json", "organisationPin is required and must be 5 chars long"),
        (ORGANISATION_ID_ROUTE, r#"{"organisationId":"not-a-uuid"}"#, "Invalid organisationId"),
        (ORGANISATION_ID_ROUTE, r#"{"organisationPin":"AB123"}"#, "Invalid organisationId"),
    ];
    for (route, body, message) in cases {
        let (status, response) = call(&app.router, post_json(route, body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{route} {body}");
        assert_eq!(response, json!({ "message": message }), "{route} {body}");
    }
}

#[tokio::test]
async fn deleted_and_unknown_organisations_look_the_same() {
    let app = spawn_app(PoolOptions::default()).await;
    let org = provision(&app.repo, "Gone", "GN001", false).await;
    app.repo.soft_delete(org.id).await.unwrap();

    let deleted = call(&app.router, post_json(PIN_ROUTE, r#"{"organisationPin":"GN001"}"#)).await;
    let unknown = call(&app.router, post_json(PIN_ROUTE, r#"{"organisationPin":"ZZ999"}"#)).await;

    assert_eq!(deleted.0, StatusCode::NOT_FOUND);
    assert_eq!(deleted, unknown);
    assert_eq!(deleted.1, json!({ "message": "organisation not found" }));

    let by_id = json!({ "organisationId": org.id.to_string() }).to_string();
    let deleted_by_id = call(&app.router, post_json(ORGANISATION_ID_ROUTE, &by_id)).await;
    assert_eq!(deleted_by_id, deleted);
}

#[tokio::test]
async fn unknown_organisation_id_is_not_found() {
    let app = spawn_app(PoolOptions::default()).await;

    let body = r#"{"organisationId":"123e4567-e89b-12d3-a456-426614174000"}"#;
    let (status, response) = call(&app.router, post_json(ORGANISATION_ID_ROUTE, body)).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(response, json!({ "message": "organisation not found" }));
}

#[tokio::test]
async fn exhausted_pool_is_service_unavailable() {
    let app = spawn_app(PoolOptions {
        max_connections: 1,
        acquire_timeout: Duration::from_millis(50),
    })
    .await;
    provision(&app.repo, "Acme", "AC001", false).await;

    let held = app.pool.acquire().await.unwrap();
    let (status, body) = call(&app.router, post_json(PIN_ROUTE, r#"{"organisationPin":"AC001"}"#)).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body.get("message").is_some());

    drop(held);
    let (status, _) = call(&app.router, post_json(PIN_ROUTE, r#"{"organisationPin":"AC001"}"#)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn jwks_publishes_public_key_only() {
    let app = spawn_app(PoolOptions::default()).await;

    let (status, body) = call(&app.router, get(JWKS_ROUTE)).await;
    assert_eq!(status, StatusCode::OK);

    let keys = body["keys"].as_array().unwrap();
    assert_eq!(keys.len(), 1);
    assert_eq!(keys[0]["kid"], "syncgate-test-rsa");
    assert_eq!(keys[0]["alg"], "RS256");
    for private in ["d", "p", "q", "dp", "dq", "qi"] {
        assert!(keys[0].get(private).is_none(), "{private} leaked");
    }
}

#[tokio::test]
async fn health_reports_ok() {
    let app = spawn_app(PoolOptions::default()).await;

    let (status, body) = call(&app.router, get(HEALTH_ROUTE)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));
}

#[tokio::test]
async fn wrong_method_is_rejected() {
    let app = spawn_app(PoolOptions::default()).await;

    let response = app.router.clone().oneshot(get(PIN_ROUTE)).await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}
