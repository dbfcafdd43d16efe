//! Output formatting for the erst CLI.

use erst_core::{BranchRecord, ReplaySession};
use erst_types::ExecutionStatus;

/// Human-readable summary of one branch.
pub fn format_branch(record: &BranchRecord) -> String {
    let mut out = String::new();

    match &record.response {
        Some(response) => {
            let marker = match response.status {
                ExecutionStatus::Success => "\x1b[32m✓\x1b[0m",
                ExecutionStatus::Error => "\x1b[31m✗\x1b[0m",
                ExecutionStatus::Unknown => "?",
            };
            out.push_str(&format!(
                "{} [{}] {}\n",
                marker, record.label, response.status
            ));
            if let Some(error) = response.error.as_deref().filter(|e| !e.is_empty()) {
                out.push_str(&format!("  error: {}\n", error));
            }
            out.push_str(&format!(
                "  events: {}  logs: {}\n",
                response.events.len(),
                response.logs.len()
            ));
            for (i, event) in response.events.iter().enumerate() {
                out.push_str(&format!("  event[{}] {}\n", i, event));
            }
            for (i, log) in response.logs.iter().enumerate() {
                out.push_str(&format!("  log[{}] {}\n", i, log));
            }
        }
        None => {
            out.push_str(&format!(
                "\x1b[31m✗\x1b[0m [{}] replay failed ({})\n",
                record.label,
                record
                    .error_kind
                    .map(|k| k.to_string())
                    .unwrap_or_else(|| "unknown".to_string())
            ));
            if let Some(error) = &record.error {
                out.push_str(&format!("  {}\n", error));
            }
        }
    }
    out
}

/// Print a finished session either as JSON or as text.
pub fn print_session(session: &ReplaySession, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(session)?);
        return Ok(());
    }

    for record in &session.branches {
        print!("{}", format_branch(record));
    }
    if let (Some(comparison), [left, right, ..]) = (&session.comparison, session.branches.as_slice()) {
        println!();
        print!("{}", comparison.format_side_by_side(&left.label, &right.label));
    }
    Ok(())
}
