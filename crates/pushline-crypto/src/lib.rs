//! Pushline key material library
//!
//! Turns the URL-safe base64 strings exchanged with the subscription
//! registry into the byte buffers the platform push subsystem accepts, and
//! back.
//!
//! ## Formats
//!
//! - **Application server key**: P-256 public key, 65-byte uncompressed
//!   SEC1 point (`0x04 ‖ X ‖ Y`). Raw 64-byte `X ‖ Y` input is prefixed.
//! - **p256dh / auth**: subscription keys, URL-safe base64 without padding.

pub mod codec;
pub mod error;

pub use codec::{
    AUTH_SECRET_LEN, ApplicationServerKey, RAW_POINT_LEN, UNCOMPRESSED_POINT_LEN,
    application_server_key, decode_auth_secret, decode_url_safe, encode_url_safe,
    normalize_point,
};
pub use error::CodecError;
