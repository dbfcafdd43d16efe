//! Canonical ledger entry keys.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::encoding::{base64_encode, try_base64_decode};

/// Canonical textual form of a ledger entry key: standard base64 of the XDR
/// `LedgerKey` bytes.
///
/// Two keys are equal iff their encodings are equal, so the value can be used
/// directly as a map key for fetched entries, overrides and the cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordKey(String);

/// Deduplicated, ordered set of keys.
pub type KeySet = BTreeSet<RecordKey>;

impl RecordKey {
    /// Build a key from raw XDR bytes.
    pub fn from_xdr_bytes(bytes: &[u8]) -> Self {
        Self(base64_encode(bytes))
    }

    /// Wrap an already-encoded key.
    ///
    /// The input is trimmed but otherwise taken as-is; callers reading keys
    /// from files should prefer [`RecordKey::parse`].
    pub fn from_encoded(encoded: impl Into<String>) -> Self {
        let s: String = encoded.into();
        Self(s.trim().to_string())
    }

    /// Parse an encoded key, rejecting values that are not base64.
    ///
    /// The result is re-encoded so non-canonical padding collapses to the
    /// canonical form.
    pub fn parse(encoded: &str) -> Option<Self> {
        try_base64_decode(encoded).map(|bytes| Self::from_xdr_bytes(&bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decoded XDR bytes, if the key is valid base64.
    pub fn to_xdr_bytes(&self) -> Option<Vec<u8>> {
        try_base64_decode(&self.0)
    }
}

impl std::fmt::Display for RecordKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RecordKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<RecordKey> for String {
    fn from(key: RecordKey) -> Self {
        key.0
    }
}
