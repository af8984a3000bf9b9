//! Master-key request signing

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use certvec_core::{Error, Result};

type HmacSha256 = Hmac<Sha256>;

/// Date in the RFC 1123 form the `x-ms-date` header expects
pub fn rfc1123_date(at: DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// URL-encoded `authorization` header value for one request.
///
/// The signed payload is the lowercase verb, lowercase resource type,
/// resource link, lowercase date and an empty line, each newline
/// terminated.
pub fn authorization_token(
    master_key: &str,
    verb: &str,
    resource_type: &str,
    resource_link: &str,
    date: &str,
) -> Result<String> {
    let key = STANDARD
        .decode(master_key.trim())
        .map_err(|e| Error::Configuration(format!("Cosmos DB key is not valid base64: {}", e)))?;

    let payload = format!(
        "{}\n{}\n{}\n{}\n\n",
        verb.to_lowercase(),
        resource_type.to_lowercase(),
        resource_link,
        date.to_lowercase()
    );

    let mut mac = HmacSha256::new_from_slice(&key)
        .map_err(|e| Error::Configuration(format!("Cosmos DB key rejected: {}", e)))?;
    mac.update(payload.as_bytes());
    let signature = STANDARD.encode(mac.finalize().into_bytes());

    let token = format!("type=master&ver=1.0&sig={}", signature);
    Ok(url::form_urlencoded::byte_serialize(token.as_bytes()).collect())
}
