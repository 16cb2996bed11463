//! Request handler contract: request parsing, response shapes and the
//! mapping from [`SyncgateError`] to HTTP status codes.
//!
//! Nothing here depends on a web framework; the server crate wraps
//! [`HandlerResponse`] into whatever its router expects.

use http::StatusCode;
use serde::Serialize;
use serde_json::{Value, json};
use syncgate_core::error::{SyncgateError, SyncgateResult};

use crate::error::AuthError;
use crate::resolver::{INVALID_ORGANISATION_ID, INVALID_ORGANISATION_PIN};

const ORGANISATION_ID_FIELD: &str = "organisationId";
const ORGANISATION_PIN_FIELD: &str = "organisationPin";

/// Message returned for both absent and deleted organisations.
pub const NOT_FOUND_MESSAGE: &str = "organisation not found";
const UNAVAILABLE_MESSAGE: &str = "service temporarily unavailable";

/// Which request variants an endpoint accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMode {
    /// `{organisationId}` only.
    ById,
    /// `{organisationPin}` only.
    ByPin,
    /// Either variant.
    Any,
}

/// A validated-shape token request. Exactly one variant per body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenRequest {
    ById { organisation_id: String },
    ByPin { organisation_pin: String },
}

impl TokenRequest {
    /// Parse a JSON request body for an endpoint accepting `mode`.
    ///
    /// Only the shape is checked here; identifier and PIN formats are
    /// validated by the resolver.
    pub fn from_json(body: &[u8], mode: RequestMode) -> Result<Self, AuthError> {
        let missing = || match mode {
            RequestMode::ById => AuthError::InvalidInput(INVALID_ORGANISATION_ID.into()),
            RequestMode::ByPin => AuthError::InvalidInput(INVALID_ORGANISATION_PIN.into()),
            RequestMode::Any => AuthError::InvalidInput(format!(
                "one of {ORGANISATION_ID_FIELD} or {ORGANISATION_PIN_FIELD} is required"
            )),
        };

        let value: Value = serde_json::from_slice(body).map_err(|_| missing())?;
        let Value::Object(fields) = value else {
            return Err(missing());
        };

        let id = present(fields.get(ORGANISATION_ID_FIELD));
        let pin = present(fields.get(ORGANISATION_PIN_FIELD));

        let request = match (id, pin) {
            (Some(_), Some(_)) => {
                return Err(AuthError::InvalidInput(format!(
                    "provide exactly one of {ORGANISATION_ID_FIELD} or {ORGANISATION_PIN_FIELD}"
                )));
            }
            (Some(Value::String(id)), None) => TokenRequest::ById {
                organisation_id: id.clone(),
            },
            (Some(_), None) => {
                return Err(AuthError::InvalidInput(INVALID_ORGANISATION_ID.into()));
            }
            (None, Some(Value::String(pin))) => TokenRequest::ByPin {
                organisation_pin: pin.clone(),
            },
            (None, Some(_)) => {
                return Err(AuthError::InvalidInput(INVALID_ORGANISATION_PIN.into()));
            }
            (None, None) => return Err(missing()),
        };

        match (mode, &request) {
            (RequestMode::Any, _)
            | (RequestMode::ById, TokenRequest::ById { .. })
            | (RequestMode::ByPin, TokenRequest::ByPin { .. }) => Ok(request),
            _ => Err(missing()),
        }
    }

    /// Short label for logs. Never includes the identifier or PIN.
    pub fn mode_name(&self) -> &'static str {
        match self {
            TokenRequest::ById { .. } => "organisation_id",
            TokenRequest::ByPin { .. } => "organisation_pin",
        }
    }
}

/// `null` and `""` count as absent.
fn present(value: Option<&Value>) -> Option<&Value> {
    match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.is_empty() => None,
        other => other,
    }
}

/// Successful token response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenResponse {
    pub token: String,
    pub powersync_url: String,
    /// Present only for organisation-ID requests.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_free: Option<bool>,
}

/// Map an error to its HTTP status.
pub fn status_for(err: &SyncgateError) -> StatusCode {
    match err {
        SyncgateError::Validation { .. } => StatusCode::BAD_REQUEST,
        SyncgateError::NotFound { .. } | SyncgateError::Deleted { .. } => StatusCode::NOT_FOUND,
        SyncgateError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        SyncgateError::KeyLoad(_)
        | SyncgateError::Signing(_)
        | SyncgateError::Database(_)
        | SyncgateError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Status plus JSON body, ready for any HTTP layer.
#[derive(Debug, Clone, PartialEq)]
pub struct HandlerResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl HandlerResponse {
    pub fn ok(response: &TokenResponse) -> Self {
        Self::success(response)
    }

    /// 200 with `value` as the body, or a 500 `{error}` body if it
    /// cannot be serialized.
    fn success<T: Serialize>(value: &T) -> Self {
        match serde_json::to_value(value) {
            Ok(body) => Self {
                status: StatusCode::OK,
                body,
            },
            Err(e) => Self::error(&SyncgateError::Internal(format!(
                "response serialization failed: {e}"
            ))),
        }
    }

    /// Error body for `err`.
    ///
    /// Client errors carry `{message}` with low detail; deleted and
    /// absent organisations produce identical bodies. Server errors
    /// carry `{error}` with the raw failure text.
    pub fn error(err: &SyncgateError) -> Self {
        let status = status_for(err);
        let body = match err {
            SyncgateError::Validation { message } => json!({ "message": message }),
            SyncgateError::NotFound { .. } | SyncgateError::Deleted { .. } => {
                json!({ "message": NOT_FOUND_MESSAGE })
            }
            SyncgateError::Unavailable(_) => json!({ "message": UNAVAILABLE_MESSAGE }),
            other => json!({ "error": other.to_string() }),
        };
        Self { status, body }
    }

    pub fn from_result(result: &SyncgateResult<TokenResponse>) -> Self {
        match result {
            Ok(response) => Self::ok(response),
            Err(err) => Self::error(err),
        }
    }
}
