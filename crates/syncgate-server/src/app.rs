//! HTTP application wiring: shared state and route table.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use syncgate_auth::{HandlerResponse, RequestMode, TokenService};
use syncgate_core::repository::OrganisationRepository;

/// Login by five-character organisation PIN.
pub const PIN_ROUTE: &str = "/powersync-auth-organisation";
/// Organisation-ID login with data-free endpoint selection.
pub const ORGANISATION_ID_ROUTE: &str = "/data-free-powersync-auth-organisation";
/// Combined endpoint accepting either request shape.
pub const TOKEN_ROUTE: &str = "/token";
pub const JWKS_ROUTE: &str = "/.well-known/jwks.json";
pub const HEALTH_ROUTE: &str = "/health";

pub struct AppState<R: OrganisationRepository> {
    pub service: Arc<TokenService<R>>,
}

impl<R: OrganisationRepository> Clone for AppState<R> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
        }
    }
}

impl<R: OrganisationRepository> AppState<R> {
    pub fn new(service: TokenService<R>) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

pub fn build_router<R>(state: AppState<R>) -> Router
where
    R: OrganisationRepository + 'static,
{
    Router::new()
        .route(PIN_ROUTE, post(issue_by_pin::<R>))
        .route(ORGANISATION_ID_ROUTE, post(issue_by_id::<R>))
        .route(TOKEN_ROUTE, post(issue_any::<R>))
        .route(JWKS_ROUTE, get(jwks::<R>))
        .route(HEALTH_ROUTE, get(health))
        .with_state(state)
}

struct ApiResponse(HandlerResponse);

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        (self.0.status, Json(self.0.body)).into_response()
    }
}

// Bodies are taken as raw bytes so malformed JSON gets the same
// `{message}` shape as every other client error.
async fn issue_by_pin<R: OrganisationRepository>(
    State(state): State<AppState<R>>,
    body: Bytes,
) -> ApiResponse {
    ApiResponse(state.service.handle(&body, RequestMode::ByPin).await)
}

async fn issue_by_id<R: OrganisationRepository>(
    State(state): State<AppState<R>>,
    body: Bytes,
) -> ApiResponse {
    ApiResponse(state.service.handle(&body, RequestMode::ById).await)
}

async fn issue_any<R: OrganisationRepository>(
    State(state): State<AppState<R>>,
    body: Bytes,
) -> ApiResponse {
    ApiResponse(state.service.handle(&body, RequestMode::Any).await)
}

async fn jwks<R: OrganisationRepository>(State(state): State<AppState<R>>) -> Json<Value> {
    Json(json!({ "keys": [state.service.signing_key().public_jwk()] }))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
