//! Key extraction from `TransactionResultMeta`.

use base64::Engine;
use stellar_xdr::curr::{LedgerEntryChange, LedgerEntryChanges, Limits, ReadXdr, TransactionResultMeta};
use tracing::{debug, warn};

use erst_types::{KeySet, RecordKey};

use crate::entry_key::{encode_key, ledger_key_for};
use crate::error::DecodeError;
use crate::meta::{change_lists, meta_version};

/// Keys plus counters describing the traversal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionReport {
    pub keys: KeySet,
    /// `TransactionMeta` version of `tx_apply_processing`
    pub meta_version: u32,
    /// Change records visited, fee processing included
    pub changes_seen: usize,
    /// Change records that produced no key
    pub skipped: usize,
}

/// Extract the deduplicated set of ledger keys touched by a transaction.
///
/// `meta_xdr` is standard base64 of an XDR `TransactionResultMeta`.
pub fn extract_keys(meta_xdr: &str) -> Result<KeySet, DecodeError> {
    extract_report(meta_xdr).map(|report| report.keys)
}

/// Same as [`extract_keys`] for already-decoded bytes.
pub fn extract_keys_from_bytes(bytes: &[u8]) -> Result<KeySet, DecodeError> {
    report_from_bytes(bytes).map(|report| report.keys)
}

/// Extract keys and traversal counters.
pub fn extract_report(meta_xdr: &str) -> Result<ExtractionReport, DecodeError> {
    let bytes = base64::engine::general_purpose::STANDARD.decode(meta_xdr.trim())?;
    report_from_bytes(&bytes)
}

fn report_from_bytes(bytes: &[u8]) -> Result<ExtractionReport, DecodeError> {
    let meta = TransactionResultMeta::from_xdr(bytes, Limits::none())?;
    Ok(collect(&meta))
}

/// Walk fee processing first, then the apply-phase lists of the meta version.
pub fn collect(meta: &TransactionResultMeta) -> ExtractionReport {
    let mut report = ExtractionReport {
        meta_version: meta_version(&meta.tx_apply_processing),
        ..Default::default()
    };

    collect_list(&meta.fee_processing, &mut report);
    for list in change_lists(&meta.tx_apply_processing) {
        collect_list(list, &mut report);
    }

    debug!(
        version = report.meta_version,
        changes = report.changes_seen,
        keys = report.keys.len(),
        skipped = report.skipped,
        "extracted ledger keys"
    );
    report
}

fn collect_list(list: &LedgerEntryChanges, report: &mut ExtractionReport) {
    for change in list.iter() {
        report.changes_seen += 1;
        match key_for_change(change) {
            Some(key) => {
                report.keys.insert(key);
            }
            None => {
                report.skipped += 1;
                warn!("skipping change record whose key could not be encoded");
            }
        }
    }
}

fn key_for_change(change: &LedgerEntryChange) -> Option<RecordKey> {
    match change {
        LedgerEntryChange::Created(entry)
        | LedgerEntryChange::Updated(entry)
        | LedgerEntryChange::State(entry)
        | LedgerEntryChange::Restored(entry) => encode_key(&ledger_key_for(entry)),
        LedgerEntryChange::Removed(key) => encode_key(key),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_base64_is_decode_error() {
        let err = extract_keys("***").unwrap_err();
        assert!(matches!(err, DecodeError::InvalidBase64(_)));
    }

    #[test]
    fn test_truncated_xdr_is_decode_error() {
        let err = extract_keys_from_bytes(&[0, 0, 0]).unwrap_err();
        assert!(matches!(err, DecodeError::Xdr(_)));
        assert!(err.to_string().contains("not valid XDR"));
    }

    #[test]
    fn test_empty_input_is_decode_error() {
        assert!(extract_keys("").is_err());
    }
}
