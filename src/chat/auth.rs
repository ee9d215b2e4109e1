//! Token signing and webhook verification.
//!
//! Server requests authenticate with an HS256 JWT carrying `{"server": true}`,
//! signed with the API secret. User tokens are handed to frontend clients.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_derive::{Deserialize, Serialize};
use sha2::Sha256;

use crate::error::{Error, Result};

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct ServerClaims {
    pub server: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct UserClaims {
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

pub(crate) fn server_token(secret: &str) -> Result<String> {
    let key = EncodingKey::from_secret(secret.as_bytes());
    Ok(encode(&Header::default(), &ServerClaims { server: true }, &key)?)
}

pub(crate) fn user_token(secret: &str, user_id: &str, expire: Option<DateTime<Utc>>) -> Result<String> {
    if user_id.is_empty() {
        return Err(Error::invalid("user ID is empty"));
    }
    let claims = UserClaims {
        user_id: user_id.to_owned(),
        exp: expire.map(|t| t.timestamp()),
    };
    let key = EncodingKey::from_secret(secret.as_bytes());
    Ok(encode(&Header::default(), &claims, &key)?)
}

fn hmac_sha256(key: &[u8]) -> Result<HmacSha256> {
    <HmacSha256 as Mac>::new_from_slice(key).map_err(|e| Error::invalid(format!("webhook secret: {}", e)))
}

/// Hex-encoded HMAC-SHA256 of a webhook body, as sent in `X-Signature`.
pub(crate) fn webhook_signature(secret: &str, body: &[u8]) -> Result<String> {
    let mut mac = hmac_sha256(secret.as_bytes())?;
    mac.update(body);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

pub(crate) fn verify_webhook(secret: &str, body: &[u8], signature: &str) -> bool {
    let signature = match hex::decode(signature.trim()) {
        Ok(bytes) => bytes,
        Err(_) => return false,
    };
    match hmac_sha256(secret.as_bytes()) {
        Ok(mut mac) => {
            mac.update(body);
            mac.verify_slice(&signature).is_ok()
        }
        Err(_) => false,
    }
}
