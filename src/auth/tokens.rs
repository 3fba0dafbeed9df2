//! Signed claim tokens
//!
//! A token is `<payload_b64>.<signature_b64>`: the base64url-encoded JSON
//! claims followed by an HMAC-SHA256 signature over the encoded payload,
//! truncated to 16 bytes. Verification is stateless; service-token
//! revocation records live behind the token store and are not consulted
//! here.

use crate::uri::Uri;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::fmt;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Signature length kept in the token, in bytes
const SIGNATURE_LEN: usize = 16;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("invalid token format")]
    InvalidFormat,

    #[error("invalid token signature")]
    InvalidSignature,

    #[error("token decode error: {0}")]
    DecodeError(String),

    #[error("token expired")]
    Expired,

    #[error("token carries malformed resource: {0}")]
    MalformedResource(String),
}

/// Who a token speaks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    /// Issued to an end user; `id` is the user's identifier
    User,
    /// Issued to a service; `id` names the revocable service-token record
    Service,
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenType::User => write!(f, "user"),
            TokenType::Service => write!(f, "service"),
        }
    }
}

/// Claim set carried inside a token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenClaims {
    pub id: String,
    pub issued_at: i64,
    pub expires_at: i64,
    #[serde(rename = "type")]
    pub token_type: TokenType,
    #[serde(default)]
    pub allowed_resources: Vec<Uri>,
}

/// Sign a claim set into its textual token form
pub fn mint(claims: &TokenClaims, secret: &[u8]) -> String {
    let payload_json = serde_json::to_vec(claims).expect("serialize claims");
    let payload_b64 = URL_SAFE_NO_PAD.encode(&payload_json);
    let signature_b64 = sign(payload_b64.as_bytes(), secret);

    format!("{payload_b64}.{signature_b64}")
}

/// Parse and verify a token against `secret` at time `now`
///
/// Rejects bad signatures, undecodable payloads (including unknown type
/// tags and malformed embedded URIs), and tokens past their expiry.
pub fn verify(token: &str, secret: &[u8], now: i64) -> Result<TokenClaims, TokenError> {
    let (payload_b64, signature_b64) = token.split_once('.').ok_or(TokenError::InvalidFormat)?;
    if payload_b64.is_empty() || signature_b64.contains('.') {
        return Err(TokenError::InvalidFormat);
    }

    if signature_b64 != sign(payload_b64.as_bytes(), secret) {
        return Err(TokenError::InvalidSignature);
    }

    let payload_json = URL_SAFE_NO_PAD
        .decode(payload_b64)
        .map_err(|e| TokenError::DecodeError(e.to_string()))?;
    let claims: TokenClaims = serde_json::from_slice(&payload_json)
        .map_err(|e| TokenError::DecodeError(e.to_string()))?;

    if now >= claims.expires_at {
        return Err(TokenError::Expired);
    }

    Ok(claims)
}

fn sign(payload: &[u8], secret: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(payload);
    let signature = mac.finalize().into_bytes();

    URL_SAFE_NO_PAD.encode(&signature[..SIGNATURE_LEN])
}
