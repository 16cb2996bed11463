//! Tenant resolution: decides whether a token may be issued, which
//! sync endpoint the client should use and which claims the token
//! carries.
//!
//! Input is always validated before the store is touched.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};
use syncgate_core::error::{SyncgateError, SyncgateResult};
use syncgate_core::models::organisation::ORGANISATION_PIN_LEN;
use syncgate_core::models::resolution::ResolutionResult;
use syncgate_core::repository::OrganisationRepository;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::handler::TokenRequest;

pub const INVALID_ORGANISATION_ID: &str = "Invalid organisationId";
pub const INVALID_ORGANISATION_PIN: &str = "organisationPin is required and must be 5 chars long";

/// Canonical hyphenated UUID, versions 1–5, RFC 4122 variant.
static ORGANISATION_ID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^[0-9a-f]{8}-[0-9a-f]{4}-[1-5][0-9a-f]{3}-[89ab][0-9a-f]{3}-[0-9a-f]{12}$",
    )
    .expect("organisation id pattern is valid")
});

/// Check that `raw` is a canonical UUID and parse it.
pub fn parse_organisation_id(raw: &str) -> Result<Uuid, AuthError> {
    if !ORGANISATION_ID_PATTERN.is_match(raw) {
        return Err(AuthError::InvalidInput(INVALID_ORGANISATION_ID.into()));
    }
    Uuid::parse_str(raw).map_err(|_| AuthError::InvalidInput(INVALID_ORGANISATION_ID.into()))
}

/// Check that `raw` is exactly [`ORGANISATION_PIN_LEN`] characters.
pub fn validate_organisation_pin(raw: &str) -> Result<&str, AuthError> {
    if raw.chars().count() != ORGANISATION_PIN_LEN {
        return Err(AuthError::InvalidInput(INVALID_ORGANISATION_PIN.into()));
    }
    Ok(raw)
}

/// Resolves token requests against the organisation store.
///
/// Generic over the repository so the resolver has no dependency on
/// the database crate.
pub struct TenantResolver<R: OrganisationRepository> {
    repo: R,
    config: AuthConfig,
}

impl<R: OrganisationRepository> TenantResolver<R> {
    pub fn new(repo: R, config: AuthConfig) -> Self {
        Self { repo, config }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    pub async fn resolve(&self, request: &TokenRequest) -> SyncgateResult<ResolutionResult> {
        match request {
            TokenRequest::ById { organisation_id } => self.resolve_by_id(organisation_id).await,
            TokenRequest::ByPin { organisation_pin } => self.resolve_by_pin(organisation_pin).await,
        }
    }

    /// Resolve a trusted organisation-ID request.
    ///
    /// The endpoint follows the organisation's data-free flag; the
    /// audience is always the standard endpoint. Soft-deleted
    /// organisations are refused.
    pub async fn resolve_by_id(&self, organisation_id: &str) -> SyncgateResult<ResolutionResult> {
        let id = parse_organisation_id(organisation_id)?;

        let data_free_enabled = match self.repo.get_data_free_enabled(id).await {
            Ok(flag) => flag,
            Err(err @ SyncgateError::Unavailable(_)) => return Err(err),
            Err(SyncgateError::Deleted { .. }) => {
                info!(organisation_id = %id, "Token refused for deleted organisation");
                return Err(AuthError::OrganisationDeleted.into());
            }
            Err(err) => {
                debug!(organisation_id = %id, error = %err, "Organisation lookup failed");
                return Err(AuthError::OrganisationNotFound.into());
            }
        };

        let (endpoint_url, data_free) = match (data_free_enabled, &self.config.powersync_data_free_url) {
            (true, Some(url)) => (url.clone(), true),
            (true, None) => {
                warn!(
                    organisation_id = %id,
                    "Data-free routing enabled but no data-free endpoint configured"
                );
                (self.config.powersync_url.clone(), false)
            }
            (false, _) => (self.config.powersync_url.clone(), false),
        };

        Ok(ResolutionResult {
            subject: organisation_id.to_string(),
            audience_url: self.config.powersync_url.clone(),
            endpoint_url,
            claims: Map::new(),
            data_free: Some(data_free),
        })
    }

    /// Resolve an untrusted PIN login.
    pub async fn resolve_by_pin(&self, organisation_pin: &str) -> SyncgateResult<ResolutionResult> {
        let pin = validate_organisation_pin(organisation_pin)?;

        let organisation = self.repo.get_by_pin(pin).await.map_err(|err| match err {
            SyncgateError::NotFound { .. } => AuthError::OrganisationNotFound.into(),
            other => other,
        })?;

        if organisation.is_deleted() {
            info!(
                organisation_id = %organisation.id,
                "PIN login refused for deleted organisation"
            );
            return Err(AuthError::OrganisationDeleted.into());
        }

        let mut claims = Map::new();
        claims.insert(
            "organisationId".into(),
            Value::String(organisation.id.to_string()),
        );
        claims.insert(
            "organisationName".into(),
            Value::String(organisation.name.clone()),
        );

        Ok(ResolutionResult {
            subject: organisation.id.to_string(),
            audience_url: self.config.powersync_url.clone(),
            endpoint_url: self.config.powersync_url.clone(),
            claims,
            data_free: None,
        })
    }
}
