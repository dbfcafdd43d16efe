//! Base64 helpers.
//!
//! Ledger keys, entries, envelopes and result metadata all travel as
//! standard-alphabet base64 of their XDR bytes. These helpers keep the engine
//! choice in one place.

use base64::Engine;

/// Encode bytes to a standard base64 string.
pub fn base64_encode(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

/// Decode a base64 string, returning None on failure.
pub fn try_base64_decode(b64: &str) -> Option<Vec<u8>> {
    base64::engine::general_purpose::STANDARD
        .decode(b64.trim())
        .ok()
}
