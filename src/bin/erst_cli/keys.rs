use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use erst_ledger_keys::extract_report;
use erst_types::TransactionRecord;

use super::CliContext;

#[derive(Parser, Debug)]
#[command(about = "Print the ledger keys a transaction touched")]
pub struct KeysCmd {
    /// Base64 XDR `TransactionResultMeta`
    meta_xdr: Option<String>,

    /// Read the metadata from a transaction JSON file instead
    #[arg(long, conflicts_with = "meta_xdr")]
    tx: Option<PathBuf>,
}

impl KeysCmd {
    pub fn execute(&self, ctx: &CliContext) -> Result<()> {
        let meta = match (&self.meta_xdr, &self.tx) {
            (Some(meta), _) => meta.clone(),
            (None, Some(path)) => TransactionRecord::load(path)?.result_meta_xdr,
            (None, None) => bail!("pass either META_XDR or --tx <file>"),
        };

        let report = extract_report(&meta).context("failed to decode result metadata")?;

        if ctx.json {
            let out = serde_json::json!({
                "meta_version": report.meta_version,
                "changes_seen": report.changes_seen,
                "skipped": report.skipped,
                "keys": report.keys,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        } else {
            for key in &report.keys {
                println!("{}", key);
            }
            eprintln!(
                "{} key(s) from {} change(s), meta v{}",
                report.keys.len(),
                report.changes_seen,
                report.meta_version
            );
        }
        Ok(())
    }
}
