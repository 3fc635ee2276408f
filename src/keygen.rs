//! Secured search keys.
//!
//! A secured key is derived offline from a parent search key and embeds the
//! restrictions the service enforces on every query made with it. The calendar
//! ships such a key so that only confirmed meetups are ever listed.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::digest::InvalidLength;
use hmac::{Hmac, Mac};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use sha2::Sha256;

pub const CONFIRMED_FILTER: &str = "status:\"✅ Confirmed\"";

/// Characters left alone by JavaScript's `encodeURIComponent`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Serializes restrictions as a query string, keys sorted.
pub fn serialize_restrictions(restrictions: &[(&str, &str)]) -> String {
    let mut pairs = restrictions.to_vec();
    pairs.sort_by(|a, b| a.0.cmp(b.0));
    pairs
        .iter()
        .map(|(key, value)| {
            format!(
                "{}={}",
                utf8_percent_encode(key, URI_COMPONENT),
                utf8_percent_encode(value, URI_COMPONENT)
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// `base64(hex(hmac_sha256(parent_key, params)) + params)`.
pub fn generate_secured_api_key(
    parent_key: &str,
    restrictions: &[(&str, &str)],
) -> Result<String, InvalidLength> {
    let params = serialize_restrictions(restrictions);
    let mut mac = Hmac::<Sha256>::new_from_slice(parent_key.as_bytes())?;
    mac.update(params.as_bytes());
    let digest = hex::encode(mac.finalize().into_bytes());
    Ok(STANDARD.encode(format!("{}{}", digest, params)))
}
