//! Authentication configuration.

/// Endpoints and identity used when issuing sync tokens.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Standard sync endpoint. Always the token audience (`aud`).
    pub powersync_url: String,
    /// Zero-rated sync endpoint for organisations with data-free
    /// routing enabled. When unset those organisations fall back to
    /// [`Self::powersync_url`].
    pub powersync_data_free_url: Option<String>,
    /// This service's own base URL (`iss` claim).
    pub issuer_url: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            powersync_url: "http://localhost:8080".into(),
            powersync_data_free_url: None,
            issuer_url: "http://localhost:54321".into(),
        }
    }
}
