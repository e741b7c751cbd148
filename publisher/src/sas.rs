//! Shared access signature (SAS) tokens for Azure IoT Hub device auth.
//!
//! A token signs `<escaped resource>\n<expiry>` with HMAC-SHA256 under the
//! device's base64 key and is sent verbatim as the MQTT password.

use std::fmt;

use base64ct::{Base64, Encoding};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::warn;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::model::DeviceIdentity;

type HmacSha256 = Hmac<Sha256>;

/// Everything but alphanumerics and `-_.~` is escaped, as in URL query values.
const QUERY_ESCAPE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// How long a freshly generated token stays valid.
pub const TOKEN_TTL_SECS: i64 = 3600;

/// Outcome of decoding the device key before signing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyStatus {
    Decoded,
    /// Signed with an empty key; the broker will reject the token.
    Invalid(String),
}

/// A signed, expiring SAS credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    /// Query-escaped `host/devices/device`
    pub resource: String,
    /// Unix seconds
    pub expiry: i64,
    /// Query-escaped base64 HMAC-SHA256
    pub signature: String,
    pub key_status: KeyStatus,
}

impl Credential {
    /// Why the key could not be used, if it could not.
    pub fn key_error(&self) -> Option<&str> {
        match &self.key_status {
            KeyStatus::Decoded => None,
            KeyStatus::Invalid(reason) => Some(reason),
        }
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SharedAccessSignature sr={}&sig={}&se={}",
            self.resource, self.signature, self.expiry
        )
    }
}

/// Generates a token valid for one hour from now.
pub fn generate_token(identity: &DeviceIdentity) -> Credential {
    generate_token_at(identity, Utc::now())
}

/// Generates a token as of `now`. Never fails: an undecodable key is logged,
/// recorded in [`Credential::key_status`] and replaced by an empty key.
pub fn generate_token_at(identity: &DeviceIdentity, now: DateTime<Utc>) -> Credential {
    let expiry = (now + Duration::seconds(TOKEN_TTL_SECS)).timestamp();
    let resource = query_escape(&format!(
        "{}/devices/{}",
        identity.host, identity.device_name
    ));

    // Keys pasted from files or env often carry a trailing newline
    let (key, key_status) = match Base64::decode_vec(identity.secret_key.trim()) {
        Ok(key) if key.is_empty() => {
            warn!(device = %identity.device_name, "Device key is empty");
            (key, KeyStatus::Invalid("decoded key is empty".to_string()))
        }
        Ok(key) => (key, KeyStatus::Decoded),
        Err(e) => {
            warn!(device = %identity.device_name, "Failed to decode device key: {}", e);
            (Vec::new(), KeyStatus::Invalid(e.to_string()))
        }
    };

    let signature = query_escape(&Base64::encode_string(&sign(&key, &resource, expiry)));

    Credential {
        resource,
        expiry,
        signature,
        key_status,
    }
}

fn sign(key: &[u8], resource: &str, expiry: i64) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts keys of any length");
    mac.update(format!("{}\n{}", resource, expiry).as_bytes());
    mac.finalize().into_bytes().to_vec()
}

/// Query escaping with space as `+`. A literal `%` is always escaped, so
/// `%20` in the output can only come from a space.
fn query_escape(s: &str) -> String {
    utf8_percent_encode(s, QUERY_ESCAPE)
        .to_string()
        .replace("%20", "+")
}
