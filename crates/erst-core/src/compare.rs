//! Positional diff of two replay responses.
//!
//! Events and logs are aligned by index only. An insertion early in a
//! sequence therefore shows up as `modified` at every later index, which is
//! what a reader comparing emission order expects.

use erst_types::ReplayResponse;
use serde::{Deserialize, Serialize};

/// How one position compares across the two sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffKind {
    Unchanged,
    Modified,
    /// Present only on the right.
    Added,
    /// Present only on the left.
    Removed,
}

impl DiffKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiffKind::Unchanged => "unchanged",
            DiffKind::Modified => "modified",
            DiffKind::Added => "added",
            DiffKind::Removed => "removed",
        }
    }
}

impl std::fmt::Display for DiffKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffEntry {
    pub index: usize,
    pub left: Option<String>,
    pub right: Option<String>,
    pub kind: DiffKind,
}

impl DiffEntry {
    pub fn left_str(&self) -> &str {
        self.left.as_deref().unwrap_or("")
    }

    pub fn right_str(&self) -> &str {
        self.right.as_deref().unwrap_or("")
    }

    pub fn is_unchanged(&self) -> bool {
        self.kind == DiffKind::Unchanged
    }
}

/// Structured difference between two responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub status_changed: bool,
    pub error_changed: bool,
    pub event_diffs: Vec<DiffEntry>,
    pub log_diffs: Vec<DiffEntry>,
    pub summary: String,
}

/// Compare `left` against `right`. Pure and total.
pub fn compare(left: &ReplayResponse, right: &ReplayResponse) -> ComparisonResult {
    let mut result = ComparisonResult {
        status_changed: left.status != right.status,
        error_changed: left.error_text() != right.error_text(),
        event_diffs: diff_positional(&left.events, &right.events),
        log_diffs: diff_positional(&left.logs, &right.logs),
        summary: String::new(),
    };
    result.summary = result.build_summary();
    result
}

fn diff_positional(left: &[String], right: &[String]) -> Vec<DiffEntry> {
    let len = left.len().max(right.len());
    (0..len)
        .map(|index| {
            let l = left.get(index);
            let r = right.get(index);
            let kind = match (l, r) {
                (Some(a), Some(b)) if a == b => DiffKind::Unchanged,
                (Some(_), Some(_)) => DiffKind::Modified,
                (Some(_), None) => DiffKind::Removed,
                (None, _) => DiffKind::Added,
            };
            DiffEntry {
                index,
                left: l.cloned(),
                right: r.cloned(),
                kind,
            }
        })
        .collect()
}

fn count_changed(entries: &[DiffEntry]) -> usize {
    entries.iter().filter(|e| !e.is_unchanged()).count()
}

impl ComparisonResult {
    pub fn changed_events(&self) -> usize {
        count_changed(&self.event_diffs)
    }

    pub fn changed_logs(&self) -> usize {
        count_changed(&self.log_diffs)
    }

    pub fn has_differences(&self) -> bool {
        self.status_changed
            || self.error_changed
            || self.changed_events() > 0
            || self.changed_logs() > 0
    }

    fn build_summary(&self) -> String {
        let mut parts = Vec::new();
        if self.status_changed {
            parts.push("status changed".to_string());
        }
        if self.error_changed {
            parts.push("error changed".to_string());
        }
        let events = self.changed_events();
        if events > 0 {
            parts.push(format!("{} event(s) differ", events));
        }
        let logs = self.changed_logs();
        if logs > 0 {
            parts.push(format!("{} log(s) differ", logs));
        }

        if parts.is_empty() {
            "No differences found".to_string()
        } else {
            parts.join(", ")
        }
    }

    /// Human-readable rendering listing only the positions that differ.
    pub fn format_side_by_side(&self, left_label: &str, right_label: &str) -> String {
        let width = left_label.len().max(right_label.len()) + 1;
        let mut out = String::new();

        out.push_str("=== Comparison Summary ===\n");
        out.push_str(&self.summary);
        out.push_str("\n\n");

        render_section(&mut out, "Events", &self.event_diffs, left_label, right_label, width);
        render_section(&mut out, "Logs", &self.log_diffs, left_label, right_label, width);
        out
    }
}

fn render_section(
    out: &mut String,
    title: &str,
    entries: &[DiffEntry],
    left_label: &str,
    right_label: &str,
    width: usize,
) {
    if count_changed(entries) == 0 {
        return;
    }
    out.push_str(&format!("=== {} ===\n", title));
    for entry in entries.iter().filter(|e| !e.is_unchanged()) {
        out.push_str(&format!("[{}] {}\n", entry.index, entry.kind));
        if let Some(left) = entry.left.as_deref().filter(|v| !v.is_empty()) {
            let label = format!("{left_label}:");
            out.push_str(&format!("  {label:<width$} {left}\n", width = width));
        }
        if let Some(right) = entry.right.as_deref().filter(|v| !v.is_empty()) {
            let label = format!("{right_label}:");
            out.push_str(&format!("  {label:<width$} {right}\n", width = width));
        }
        out.push('\n');
    }
}
