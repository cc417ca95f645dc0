//! Chat announcements for merged tool results.

use contract_guard_core::{MergeEvent, Scope, ToolKind};

/// The chat line announcing `event`, or `None` when it should stay quiet.
///
/// Only the first merge of each kind in a run is announced.
pub fn announcement(event: MergeEvent, scope: &Scope) -> Option<String> {
    if !event.first_occurrence {
        return None;
    }
    let text = match event.kind {
        ToolKind::DetectorsCheck => {
            let checks = scope.detectors_checks();
            if checks.is_empty() {
                "🔎 Security scan finished, no detectors could be run on this contract.".to_string()
            } else {
                let issues = scope.issue_count();
                format!(
                    "🔎 Ran {} security detector{}: {} potential issue{} found.",
                    checks.len(),
                    plural(checks.len()),
                    issues,
                    plural(issues)
                )
            }
        }
        ToolKind::MintCheck => format!("🪙 Mint check: {}", scope.mint_check()?),
        ToolKind::UnprotectedFunc => {
            format!("🔐 Access control check: {}", scope.unprotected_func()?)
        }
        ToolKind::Skip => return None,
    };
    Some(text)
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}
