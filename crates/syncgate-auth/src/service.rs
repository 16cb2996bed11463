//! Token service: resolve, sign, respond.

use std::sync::Arc;

use syncgate_core::error::SyncgateResult;
use syncgate_core::repository::OrganisationRepository;
use tracing::{error, info, warn};

use crate::config::AuthConfig;
use crate::handler::{HandlerResponse, RequestMode, TokenRequest, TokenResponse};
use crate::key::SigningKey;
use crate::resolver::TenantResolver;
use crate::token;

/// Process-wide issuance context.
///
/// Built once at startup and shared by every request. Holds nothing
/// mutable: the key is read-only and the repository handles its own
/// concurrency.
pub struct TokenService<R: OrganisationRepository> {
    resolver: TenantResolver<R>,
    key: Arc<SigningKey>,
}

impl<R: OrganisationRepository> TokenService<R> {
    pub fn new(repo: R, key: Arc<SigningKey>, config: AuthConfig) -> Self {
        Self {
            resolver: TenantResolver::new(repo, config),
            key,
        }
    }

    pub fn signing_key(&self) -> &SigningKey {
        &self.key
    }

    pub fn config(&self) -> &AuthConfig {
        self.resolver.config()
    }

    /// Resolve `request` and issue a sync token for it.
    pub async fn issue(&self, request: &TokenRequest) -> SyncgateResult<TokenResponse> {
        let resolution = self.resolver.resolve(request).await?;
        let token =
            token::issue_sync_token(&resolution, &self.key, &self.resolver.config().issuer_url)?;

        info!(
            mode = request.mode_name(),
            organisation_id = %resolution.subject,
            data_free = ?resolution.data_free,
            "Issued sync token"
        );

        Ok(TokenResponse {
            token,
            powersync_url: resolution.endpoint_url,
            data_free: resolution.data_free,
        })
    }

    /// Full request cycle for a raw JSON body: parse, issue, map the
    /// outcome to a status and body.
    pub async fn handle(&self, body: &[u8], mode: RequestMode) -> HandlerResponse {
        let result = match TokenRequest::from_json(body, mode) {
            Ok(request) => self.issue(&request).await,
            Err(err) => Err(err.into()),
        };

        let response = HandlerResponse::from_result(&result);
        if let Err(err) = &result {
            if response.status.is_server_error() {
                error!(status = response.status.as_u16(), error = %err, "Token request failed");
            } else {
                warn!(status = response.status.as_u16(), error = %err, "Token request rejected");
            }
        }
        response
    }
}
