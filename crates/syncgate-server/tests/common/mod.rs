use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, header};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use syncgate_auth::{AuthConfig, SigningKey, TokenService};
use syncgate_core::models::organisation::{CreateOrganisation, Organisation};
use syncgate_db::repository::SurrealOrganisationRepository;
use syncgate_db::{DbPool, PoolOptions};
use syncgate_server::app::{AppState, build_router};

pub const STANDARD_URL: &str = "https://sync.example.com";
pub const DATA_FREE_URL: &str = "https://sync.datafree.example.com";
pub const ISSUER: &str = "https://project.supabase.co";

pub const RSA_JWK: &str = include_str!("../../../../testdata/keys/rsa_private.jwk.json");

pub type Repo = SurrealOrganisationRepository<Db>;

pub struct TestApp {
    pub router: Router,
    pub repo: Arc<Repo>,
    pub pool: DbPool<Db>,
}

pub async fn spawn_app(options: PoolOptions) -> TestApp {
    let db = Surreal::new::<Mem>(()).await.expect("mem db");
    db.use_ns("test").use_db("test").await.expect("ns");
    syncgate_db::run_migrations(&db).await.expect("migrations");

    let pool = DbPool::new(db, options);
    let repo = Arc::new(SurrealOrganisationRepository::new(pool.clone()));
    let key = SigningKey::load(&STANDARD.encode(RSA_JWK)).expect("key");
    let config = AuthConfig {
        powersync_url: STANDARD_URL.into(),
        powersync_data_free_url: Some(DATA_FREE_URL.into()),
        issuer_url: ISSUER.into(),
    };
    let service = TokenService::new(Arc::clone(&repo), Arc::new(key), config);

    TestApp {
        router: build_router(AppState::new(service)),
        repo,
        pool,
    }
}

pub async fn provision(repo: &Repo, name: &str, pin: &str, data_free_enabled: bool) -> Organisation {
    repo.create(CreateOrganisation {
        name: name.into(),
        pin: pin.into(),
        data_free_enabled,
    })
    .await
    .expect("create organisation")
}

pub fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

pub async fn read_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json")
}
