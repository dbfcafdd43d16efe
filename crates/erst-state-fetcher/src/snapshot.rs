//! Snapshot-backed entry source.
//!
//! A ledger snapshot is a JSON file holding the entries a transaction needs:
//!
//! ```json
//! {
//!   "ledger_sequence": 51234567,
//!   "ledger_entries": { "<base64 LedgerKey>": "<base64 LedgerEntry>" }
//! }
//! ```
//!
//! Used for offline replay and as a deterministic source in tests.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use erst_types::RecordKey;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::MAX_BATCH_SIZE;
use crate::source::LedgerEntrySource;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ledger_sequence: Option<u32>,
    #[serde(default)]
    pub ledger_entries: HashMap<RecordKey, String>,
}

impl SnapshotFile {
    /// Parse snapshot JSON, re-encoding every key in canonical form so it
    /// matches extracted keys.
    pub fn parse(json: &str) -> Result<Self> {
        let raw: SnapshotFile = serde_json::from_str(json)?;
        let ledger_entries = raw
            .ledger_entries
            .into_iter()
            .map(|(key, entry)| match RecordKey::parse(key.as_str()) {
                Some(canonical) => Ok((canonical, entry)),
                None => bail!("ledger key '{}' is not valid base64", key),
            })
            .collect::<Result<_>>()?;
        Ok(Self {
            ledger_sequence: raw.ledger_sequence,
            ledger_entries,
        })
    }
}

/// [`LedgerEntrySource`] over an in-memory snapshot.
#[derive(Debug, Clone)]
pub struct SnapshotSource {
    name: String,
    entries: HashMap<RecordKey, String>,
    ledger_sequence: Option<u32>,
    max_batch_size: usize,
}

impl SnapshotSource {
    pub fn from_entries(entries: HashMap<RecordKey, String>) -> Self {
        Self {
            name: "snapshot".to_string(),
            entries,
            ledger_sequence: None,
            max_batch_size: MAX_BATCH_SIZE,
        }
    }

    /// Load a snapshot file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
        let file = SnapshotFile::parse(&data)
            .with_context(|| format!("Failed to parse snapshot {}", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| PathBuf::from(path).display().to_string());

        debug!(
            snapshot = %name,
            entries = file.ledger_entries.len(),
            "loaded ledger snapshot"
        );
        Ok(Self {
            name,
            entries: file.ledger_entries,
            ledger_sequence: file.ledger_sequence,
            max_batch_size: MAX_BATCH_SIZE,
        })
    }

    pub fn with_max_batch_size(mut self, size: usize) -> Self {
        self.max_batch_size = size;
        self
    }

    pub fn ledger_sequence(&self) -> Option<u32> {
        self.ledger_sequence
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait::async_trait]
impl LedgerEntrySource for SnapshotSource {
    async fn fetch_batch(&self, keys: &[RecordKey]) -> Result<HashMap<RecordKey, String>> {
        if keys.len() > self.max_batch_size {
            bail!(
                "batch of {} keys exceeds snapshot limit of {}",
                keys.len(),
                self.max_batch_size
            );
        }
        Ok(keys
            .iter()
            .filter_map(|k| self.entries.get(k).map(|v| (k.clone(), v.clone())))
            .collect())
    }

    fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn key(n: u8) -> RecordKey {
        RecordKey::from_xdr_bytes(&[0, 0, 0, n])
    }

    #[tokio::test]
    async fn test_returns_only_known_keys() {
        let source = SnapshotSource::from_entries(HashMap::from([(key(1), "one".to_string())]));
        let got = source.fetch_batch(&[key(1), key(2)]).await.unwrap();
        assert_eq!(got.len(), 1);
        assert_eq!(got[&key(1)], "one");
    }

    #[tokio::test]
    async fn test_rejects_oversized_batch() {
        let source = SnapshotSource::from_entries(HashMap::new()).with_max_batch_size(2);
        let err = source
            .fetch_batch(&[key(1), key(2), key(3)])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("exceeds"));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"ledger_sequence": 42, "ledger_entries": {{"{}": "AAAA"}}}}"#,
            key(5)
        )
        .unwrap();

        let source = SnapshotSource::from_file(file.path()).unwrap();
        assert_eq!(source.len(), 1);
        assert_eq!(source.ledger_sequence(), Some(42));
    }

    #[test]
    fn test_parse_canonicalizes_keys() {
        let mut entries = serde_json::Map::new();
        entries.insert(format!(" {}\n", key(5)), "AAAA".into());
        let json = serde_json::json!({ "ledger_entries": entries }).to_string();

        let file = SnapshotFile::parse(&json).unwrap();
        assert_eq!(file.ledger_entries.get(&key(5)).map(String::as_str), Some("AAAA"));
    }

    #[test]
    fn test_parse_rejects_non_base64_key() {
        let json = r#"{"ledger_entries": {"not a key!": "AAAA"}}"#;
        let err = SnapshotFile::parse(json).unwrap_err();
        assert!(err.to_string().contains("not a key!"));
    }

    #[test]
    fn test_from_file_reports_path_on_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let err = SnapshotSource::from_file(file.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to parse snapshot"));
    }
}
