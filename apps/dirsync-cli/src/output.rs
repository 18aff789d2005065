//! Console rendering of reports, listings and intents.

use std::fmt::Write as _;
use std::path::Path;

use dirsync_provisioning::{Intent, MembershipView, Outcome, ReconciliationReport, User};

/// Human-readable report: one line per operation, then the summary.
pub fn format_report(report: &ReconciliationReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Run {}", report.id);

    for entry in &report.entries {
        let _ = writeln!(
            out,
            "  [{}] {:<45} {}",
            entry.intent + 1,
            entry.step.operation.to_string(),
            mark(&entry.step.outcome)
        );
    }

    let s = &report.summary;
    let _ = writeln!(
        out,
        "\n{} operation(s) for {} intent(s): {} created, {} already present, {} modified, {} unchanged, {} not found, {} failed",
        s.total, report.intents, s.created, s.already_present, s.modified, s.no_op, s.not_found, s.failed
    );
    if let Some(ms) = report.duration_ms() {
        let _ = writeln!(out, "Completed in {ms} ms");
    }
    out
}

fn mark(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Failed(_) | Outcome::NotFound(_) => format!("✗ {}", outcome),
        _ => format!("✓ {}", outcome),
    }
}

/// Every user, then every group with its members.
pub fn format_membership(view: &MembershipView) -> String {
    let mut out = String::new();

    if !view.users.is_empty() {
        let _ = writeln!(out, "All users:");
        for user in &view.users {
            let _ = writeln!(out, "  {}", user_line(user));
        }
        let _ = writeln!(out);
    }

    if view.groups.is_empty() {
        let _ = writeln!(out, "No groups found.");
    }

    for group in &view.groups {
        let _ = writeln!(out, "Group: '{}' - '{}'", group.identifier, group.description);
        let _ = writeln!(out, "Users:");
        for user in &group.members {
            let _ = writeln!(out, "  {}", user_line(user));
        }
        for dn in &group.unresolved {
            let _ = writeln!(out, "  (unresolved) {}", dn);
        }
        let _ = writeln!(out);
    }

    for failure in &view.failures {
        let _ = writeln!(out, "Warning: listing incomplete ({})", failure);
    }
    out
}

fn user_line(user: &User) -> String {
    format!("'{}' - '{}' - '{}'", user.full_name(), user.uid(), user.phone())
}

/// One line per extracted document.
pub fn format_intent(path: &Path, intent: &Intent) -> String {
    format!("{}: {}", path.display(), intent)
}
