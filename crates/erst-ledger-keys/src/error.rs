//! Decode errors for transaction result metadata.

use std::fmt;

/// The result metadata could not be decoded.
///
/// Only structural failures of the container are reported here. Individual
/// change records that do not yield a key are skipped by the extractor.
#[derive(Debug)]
pub enum DecodeError {
    /// The payload is not standard base64.
    InvalidBase64(base64::DecodeError),
    /// The bytes are not a well-formed XDR `TransactionResultMeta`
    /// (malformed, truncated, trailing data or an unknown union arm).
    Xdr(stellar_xdr::curr::Error),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::InvalidBase64(e) => write!(f, "result meta is not valid base64: {}", e),
            DecodeError::Xdr(e) => write!(f, "result meta is not valid XDR: {}", e),
        }
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DecodeError::InvalidBase64(e) => Some(e),
            DecodeError::Xdr(e) => Some(e),
        }
    }
}

impl From<base64::DecodeError> for DecodeError {
    fn from(e: base64::DecodeError) -> Self {
        DecodeError::InvalidBase64(e)
    }
}

impl From<stellar_xdr::curr::Error> for DecodeError {
    fn from(e: stellar_xdr::curr::Error) -> Self {
        DecodeError::Xdr(e)
    }
}
