//! Signing key loading.
//!
//! The key arrives as a base64-encoded private JSON Web Key. It is
//! decoded and converted to a [`jsonwebtoken::EncodingKey`] exactly once;
//! every later signature reuses the converted key.
//!
//! Supported keys:
//! - `kty: "RSA"` with `alg` one of RS256/RS384/RS512/PS256/PS384/PS512
//! - `kty: "OKP"`, `crv: "Ed25519"` with `alg: "EdDSA"`

use std::str::FromStr;

use base64::Engine;
use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, URL_SAFE_NO_PAD};
use base64::engine::DecodePaddingMode;
use ed25519_dalek::pkcs8::EncodePrivateKey;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use rsa::pkcs1::EncodeRsaPrivateKey;
use rsa::{BigUint, RsaPrivateKey};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::AuthError;

/// Standard alphabet, padding optional.
const CONFIG_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

const ED25519_KEY_LEN: usize = 32;

/// Install the RustCrypto backend as jsonwebtoken's process-wide
/// provider.
///
/// jsonwebtoken cannot pick a backend by itself once the build enables
/// more than one (the embedded SurrealDB engine brings in `aws_lc_rs`).
/// Idempotent: the first installed provider stays.
pub fn install_crypto_provider() {
    let _ = jsonwebtoken::crypto::rust_crypto::DEFAULT_PROVIDER.install_default();
}

/// Private JWK members this loader understands. Unknown members are
/// ignored.
#[derive(Deserialize)]
struct PrivateJwk {
    kty: String,
    alg: Option<String>,
    kid: Option<String>,
    crv: Option<String>,
    d: Option<String>,
    x: Option<String>,
    n: Option<String>,
    e: Option<String>,
    p: Option<String>,
    q: Option<String>,
}

/// The process-wide token signing key.
///
/// Immutable after [`SigningKey::load`]; share it behind an `Arc`.
pub struct SigningKey {
    algorithm: Algorithm,
    key_id: String,
    encoding_key: EncodingKey,
    public_jwk: Value,
}

impl SigningKey {
    /// Load a key from its base64-encoded JWK configuration value.
    pub fn load(encoded: &str) -> Result<Self, AuthError> {
        let trimmed = encoded.trim();
        if trimmed.is_empty() {
            return Err(AuthError::KeyLoad("key configuration is empty".into()));
        }
        let json = CONFIG_BASE64
            .decode(trimmed)
            .map_err(|e| AuthError::KeyLoad(format!("key is not valid base64: {e}")))?;
        Self::from_jwk_json(&json)
    }

    /// Load a key from raw JWK JSON.
    pub fn from_jwk_json(json: &[u8]) -> Result<Self, AuthError> {
        install_crypto_provider();
        let jwk: PrivateJwk = serde_json::from_slice(json)
            .map_err(|e| AuthError::KeyLoad(format!("key is not a JSON Web Key: {e}")))?;

        let alg = required(&jwk.alg, "alg")?;
        let algorithm = Algorithm::from_str(alg)
            .map_err(|_| AuthError::KeyLoad(format!("unsupported algorithm {alg}")))?;
        let key_id = required(&jwk.kid, "kid")?.to_string();

        let (encoding_key, public_jwk) = match jwk.kty.as_str() {
            "RSA" => rsa_key(&jwk, algorithm, &key_id)?,
            "OKP" => ed25519_key(&jwk, algorithm, &key_id)?,
            other => {
                return Err(AuthError::KeyLoad(format!("unsupported key type {other}")));
            }
        };

        Ok(Self {
            algorithm,
            key_id,
            encoding_key,
            public_jwk,
        })
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    /// Public half of the key as a JWK (`kid`, `alg`, `use: "sig"`).
    pub fn public_jwk(&self) -> &Value {
        &self.public_jwk
    }

    /// Sign `claims` as a compact JWS with header `{alg, kid}`.
    pub fn sign<T: Serialize>(&self, claims: &T) -> Result<String, AuthError> {
        install_crypto_provider();
        let mut header = Header::new(self.algorithm);
        header.typ = None;
        header.kid = Some(self.key_id.clone());
        jsonwebtoken::encode(&header, claims, &self.encoding_key)
            .map_err(|e| AuthError::Signing(e.to_string()))
    }
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKey")
            .field("algorithm", &self.algorithm)
            .field("key_id", &self.key_id)
            .field("key_material", &"[REDACTED]")
            .finish()
    }
}

fn required<'a>(member: &'a Option<String>, name: &str) -> Result<&'a str, AuthError> {
    member
        .as_deref()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AuthError::KeyLoad(format!("JWK is missing `{name}`")))
}

fn decode_member(member: &Option<String>, name: &str) -> Result<Vec<u8>, AuthError> {
    URL_SAFE_NO_PAD
        .decode(required(member, name)?)
        .map_err(|e| AuthError::KeyLoad(format!("JWK member `{name}` is not base64url: {e}")))
}

fn rsa_key(
    jwk: &PrivateJwk,
    algorithm: Algorithm,
    key_id: &str,
) -> Result<(EncodingKey, Value), AuthError> {
    if !matches!(
        algorithm,
        Algorithm::RS256
            | Algorithm::RS384
            | Algorithm::RS512
            | Algorithm::PS256
            | Algorithm::PS384
            | Algorithm::PS512
    ) {
        return Err(AuthError::KeyLoad(format!(
            "algorithm {algorithm:?} cannot be used with an RSA key"
        )));
    }

    let uint = |member: &Option<String>, name: &str| {
        decode_member(member, name).map(|bytes| BigUint::from_bytes_be(&bytes))
    };
    let n = uint(&jwk.n, "n")?;
    let e = uint(&jwk.e, "e")?;
    let d = uint(&jwk.d, "d")?;
    let p = uint(&jwk.p, "p")?;
    let q = uint(&jwk.q, "q")?;

    let key = RsaPrivateKey::from_components(n, e, d, vec![p, q])
        .map_err(|e| AuthError::KeyLoad(format!("invalid RSA key: {e}")))?;
    key.validate()
        .map_err(|e| AuthError::KeyLoad(format!("invalid RSA key: {e}")))?;
    let der = key
        .to_pkcs1_der()
        .map_err(|e| AuthError::KeyLoad(format!("encode RSA key: {e}")))?;

    let public_jwk = json!({
        "kty": "RSA",
        "kid": key_id,
        "alg": format!("{algorithm:?}"),
        "use": "sig",
        "n": required(&jwk.n, "n")?,
        "e": required(&jwk.e, "e")?,
    });

    Ok((EncodingKey::from_rsa_der(der.as_bytes()), public_jwk))
}

fn ed25519_key(
    jwk: &PrivateJwk,
    algorithm: Algorithm,
    key_id: &str,
) -> Result<(EncodingKey, Value), AuthError> {
    if algorithm != Algorithm::EdDSA {
        return Err(AuthError::KeyLoad(format!(
            "algorithm {algorithm:?} cannot be used with an OKP key"
        )));
    }
    match jwk.crv.as_deref() {
        Some("Ed25519") => {}
        other => {
            return Err(AuthError::KeyLoad(format!(
                "unsupported OKP curve {}",
                other.unwrap_or("<none>")
            )));
        }
    }

    let seed: [u8; ED25519_KEY_LEN] = decode_member(&jwk.d, "d")?
        .try_into()
        .map_err(|_| AuthError::KeyLoad("Ed25519 `d` must be 32 bytes".into()))?;
    let signing_key = ed25519_dalek::SigningKey::from_bytes(&seed);
    let public_key = signing_key.verifying_key().to_bytes();

    if jwk.x.is_some() && decode_member(&jwk.x, "x")? != public_key {
        return Err(AuthError::KeyLoad(
            "Ed25519 public key does not match private seed".into(),
        ));
    }

    let der = signing_key
        .to_pkcs8_der()
        .map_err(|e| AuthError::KeyLoad(format!("encode Ed25519 key: {e}")))?;

    let public_jwk = json!({
        "kty": "OKP",
        "crv": "Ed25519",
        "kid": key_id,
        "alg": "EdDSA",
        "use": "sig",
        "x": URL_SAFE_NO_PAD.encode(public_key),
    });

    Ok((EncodingKey::from_ed_der(der.as_bytes()), public_jwk))
}

#[cfg(test)]
mod tests {
    use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD};

    use super::*;

    const ED25519_JWK: &str = include_str!(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../../testdata/keys/ed25519_private.jwk.json"
    ));
    const RSA_JWK: &str = include_str!(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../../testdata/keys/rsa_private.jwk.json"
    ));

    fn with_member(jwk: &str, name: &str, value: Value) -> String {
        let mut parsed: Value = serde_json::from_str(jwk).unwrap();
        parsed[name] = value;
        STANDARD.encode(parsed.to_string())
    }

    fn without_member(jwk: &str, name: &str) -> String {
        let mut parsed: Value = serde_json::from_str(jwk).unwrap();
        parsed.as_object_mut().unwrap().remove(name);
        STANDARD.encode(parsed.to_string())
    }

    fn assert_key_load_err(result: Result<SigningKey, AuthError>) {
        match result {
            Err(AuthError::KeyLoad(_)) => {}
            Err(other) => panic!("expected KeyLoad, got {other:?}"),
            Ok(key) => panic!("expected KeyLoad, got {key:?}"),
        }
    }

    #[test]
    fn loads_ed25519_key() {
        let key = SigningKey::load(&STANDARD.encode(ED25519_JWK)).unwrap();
        assert_eq!(key.algorithm(), Algorithm::EdDSA);
        assert_eq!(key.key_id(), "syncgate-test-ed25519");
        assert_eq!(key.public_jwk()["kty"], "OKP");
        assert!(key.public_jwk().get("d").is_none());
    }

    #[test]
    fn loads_rsa_key() {
        let key = SigningKey::load(&STANDARD.encode(RSA_JWK)).unwrap();
        assert_eq!(key.algorithm(), Algorithm::RS256);
        assert_eq!(key.key_id(), "syncgate-test-rsa");

        let public = key.public_jwk();
        assert_eq!(public["alg"], "RS256");
        for private in ["d", "p", "q", "dp", "dq", "qi"] {
            assert!(public.get(private).is_none(), "leaked `{private}`");
        }
    }

    #[test]
    fn padding_and_whitespace_are_tolerated() {
        let encoded = format!("  {}\n", STANDARD_NO_PAD.encode(ED25519_JWK));
        assert!(SigningKey::load(&encoded).is_ok());
    }

    #[test]
    fn rejects_empty_configuration() {
        assert_key_load_err(SigningKey::load(""));
        assert_key_load_err(SigningKey::load("   "));
    }

    #[test]
    fn rejects_non_base64() {
        assert_key_load_err(SigningKey::load("not base64 at all!"));
    }

    #[test]
    fn rejects_non_jwk_json() {
        assert_key_load_err(SigningKey::load(&STANDARD.encode("[1, 2, 3]")));
        assert_key_load_err(SigningKey::load(&STANDARD.encode("plain text")));
    }

    #[test]
    fn rejects_missing_alg_or_kid() {
        assert_key_load_err(SigningKey::load(&without_member(ED25519_JWK, "alg")));
        assert_key_load_err(SigningKey::load(&without_member(ED25519_JWK, "kid")));
    }

    #[test]
    fn rejects_unsupported_key_type() {
        let oct = STANDARD.encode(r#"{"kty":"oct","alg":"HS256","kid":"k","k":"c2VjcmV0"}"#);
        assert_key_load_err(SigningKey::load(&oct));
    }

    #[test]
    fn rejects_algorithm_that_does_not_fit_key_type() {
        assert_key_load_err(SigningKey::load(&with_member(RSA_JWK, "alg", json!("EdDSA"))));
        assert_key_load_err(SigningKey::load(&with_member(
            ED25519_JWK,
            "alg",
            json!("RS256"),
        )));
        assert_key_load_err(SigningKey::load(&with_member(RSA_JWK, "alg", json!("HS256"))));
    }

    #[test]
    fn rejects_mismatched_ed25519_public_key() {
        let other_x = URL_SAFE_NO_PAD.encode([9u8; 32]);
        assert_key_load_err(SigningKey::load(&with_member(
            ED25519_JWK,
            "x",
            json!(other_x),
        )));
    }

    #[test]
    fn rejects_truncated_ed25519_seed() {
        let short = URL_SAFE_NO_PAD.encode([1u8; 16]);
        assert_key_load_err(SigningKey::load(&with_member(ED25519_JWK, "d", json!(short))));
    }

    #[test]
    fn rejects_rsa_key_without_private_exponent() {
        assert_key_load_err(SigningKey::load(&without_member(RSA_JWK, "d")));
    }

    #[test]
    fn debug_output_redacts_key_material() {
        let key = SigningKey::load(&STANDARD.encode(ED25519_JWK)).unwrap();
        let rendered = format!("{key:?}");
        assert!(rendered.contains("[REDACTED]"));
        let d: Value = serde_json::from_str::<Value>(ED25519_JWK).unwrap()["d"].clone();
        assert!(!rendered.contains(d.as_str().unwrap()));
    }

    #[test]
    fn signed_token_header_carries_alg_and_kid() {
        let key = SigningKey::load(&STANDARD.encode(RSA_JWK)).unwrap();
        let token = key.sign(&json!({ "sub": "x" })).unwrap();
        assert_eq!(token.split('.').count(), 3);

        let header = jsonwebtoken::decode_header(&token).unwrap();
        assert_eq!(header.alg, Algorithm::RS256);
        assert_eq!(header.kid.as_deref(), Some("syncgate-test-rsa"));
        assert!(header.typ.is_none());
    }

    #[test]
    fn every_supported_key_signs_with_embedded_store_backend_compiled_in() {
        // Dev builds enable SurrealDB's in-memory engine, which turns on a
        // second jsonwebtoken backend.
        install_crypto_provider();
        install_crypto_provider();

        for jwk in [RSA_JWK, ED25519_JWK] {
            let key = SigningKey::load(&STANDARD.encode(jwk)).unwrap();
            let token = key.sign(&json!({ "sub": "x" })).unwrap();
            assert_eq!(token.split('.').count(), 3);
        }
    }
}
