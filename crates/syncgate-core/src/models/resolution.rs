//! Resolver output consumed by the token issuer.

use serde_json::{Map, Value};

/// Where a client should connect and how its token must be scoped.
///
/// Produced by the tenant resolver and consumed immediately by the
/// token issuer; never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionResult {
    /// `sub` claim: the organisation id.
    pub subject: String,
    /// `aud` claim: the authority that validates the token.
    pub audience_url: String,
    /// Sync endpoint the client connects to.
    pub endpoint_url: String,
    /// Extra claims merged into the token payload.
    pub claims: Map<String, Value>,
    /// Whether the data-free endpoint was selected. `None` when the
    /// resolution mode has no data-free branching.
    pub data_free: Option<bool>,
}
