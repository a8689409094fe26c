//! URL-safe base64 codec and application server key normalization.
//!
//! All functions here are pure: no platform access, no shared state.

use base64::Engine as _;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use pushline_core::config::KeyPolicy;
use tracing::warn;

use crate::error::CodecError;

/// Length of raw `X ‖ Y` point coordinates without the format prefix.
pub const RAW_POINT_LEN: usize = 64;

/// Length of an uncompressed SEC1 point (`0x04 ‖ X ‖ Y`).
pub const UNCOMPRESSED_POINT_LEN: usize = 65;

/// Expected length of a subscription auth secret.
pub const AUTH_SECRET_LEN: usize = 16;

const UNCOMPRESSED_TAG: u8 = 0x04;

/// Application server key in the form handed to the platform subscribe call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationServerKey(Vec<u8>);

impl ApplicationServerKey {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether the buffer has the shape of an uncompressed point.
    pub fn is_uncompressed_point(&self) -> bool {
        self.0.len() == UNCOMPRESSED_POINT_LEN && self.0[0] == UNCOMPRESSED_TAG
    }
}

impl AsRef<[u8]> for ApplicationServerKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Decode a URL-safe base64 string, with or without trailing padding.
///
/// The URL-safe alphabet is mapped back to the standard one and the padding
/// (`(4 - len % 4) % 4` characters) restored before decoding.
pub fn decode_url_safe(input: &str) -> Result<Vec<u8>, CodecError> {
    let trimmed = input.trim().trim_end_matches('=');
    let pad = (4 - trimmed.len() % 4) % 4;

    let mut standard = String::with_capacity(trimmed.len() + pad);
    standard.extend(trimmed.chars().map(|c| match c {
        '-' => '+',
        '_' => '/',
        other => other,
    }));
    standard.extend(std::iter::repeat_n('=', pad));

    Ok(STANDARD.decode(standard)?)
}

/// Encode bytes as URL-safe base64 without padding.
pub fn encode_url_safe(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Prefix raw 64-byte coordinates with the uncompressed-point tag.
///
/// Every other length is returned unchanged.
pub fn normalize_point(bytes: Vec<u8>) -> Vec<u8> {
    if bytes.len() != RAW_POINT_LEN {
        return bytes;
    }
    let mut point = Vec::with_capacity(UNCOMPRESSED_POINT_LEN);
    point.push(UNCOMPRESSED_TAG);
    point.extend_from_slice(&bytes);
    point
}

/// Turn the registry's public key string into the platform key argument.
///
/// Under [`KeyPolicy::Lenient`] a buffer of unexpected length is passed
/// through and left to the platform to reject. [`KeyPolicy::Strict`] refuses
/// anything that is not a 65-byte point on P-256.
pub fn application_server_key(
    encoded: &str,
    policy: KeyPolicy,
) -> Result<ApplicationServerKey, CodecError> {
    let key = normalize_point(decode_url_safe(encoded)?);

    match policy {
        KeyPolicy::Lenient => {
            if key.len() != UNCOMPRESSED_POINT_LEN {
                warn!(
                    len = key.len(),
                    "Application server key has unexpected length; passing through"
                );
            }
        }
        KeyPolicy::Strict => {
            if key.len() != UNCOMPRESSED_POINT_LEN {
                return Err(CodecError::InvalidKeyLength {
                    expected: UNCOMPRESSED_POINT_LEN,
                    actual: key.len(),
                });
            }
            p256::PublicKey::from_sec1_bytes(&key).map_err(|_| CodecError::InvalidPoint)?;
        }
    }

    Ok(ApplicationServerKey(key))
}

/// Decode a subscription auth secret.
pub fn decode_auth_secret(encoded: &str) -> Result<Vec<u8>, CodecError> {
    let secret = decode_url_safe(encoded)?;
    if secret.len() != AUTH_SECRET_LEN {
        warn!(len = secret.len(), "Auth secret has unexpected length");
    }
    Ok(secret)
}
