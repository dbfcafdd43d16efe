//! Ledger key extraction for transaction replay.
//!
//! Given the result metadata of an executed transaction, produce the minimal
//! set of ledger entry keys whose state is needed to re-execute it: every entry
//! created, updated, restored, removed, or snapshotted during fee processing
//! and transaction application.
//!
//! ```no_run
//! let keys = erst_ledger_keys::extract_keys("AAAAAA...").unwrap();
//! for key in &keys {
//!     println!("{key}");
//! }
//! ```
//!
//! Extraction is pure. Structural decode failures are reported as
//! [`DecodeError`]; individual records that cannot be keyed are skipped and
//! counted in [`ExtractionReport::skipped`].

pub mod entry_key;
pub mod error;
pub mod extract;
pub mod meta;

pub use entry_key::{encode_key, ledger_key_for};
pub use error::DecodeError;
pub use extract::{collect, extract_keys, extract_keys_from_bytes, extract_report, ExtractionReport};
