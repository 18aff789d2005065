//! Apply change documents to the directory

use clap::Args;
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

use dirsync_provisioning::{Intent, MembershipView, ReconciliationReport};

use crate::commands::{close, engine, extract_all};
use crate::config::AppConfig;
use crate::error::{CliError, CliResult};
use crate::output::{format_membership, format_report};

/// Apply change documents in the order given
#[derive(Args, Debug)]
pub struct ApplyArgs {
    /// Change documents to apply
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Skip reading back users and groups after applying
    #[arg(long)]
    pub no_listing: bool,
}

#[derive(Serialize)]
struct ApplyOutput<'a> {
    report: &'a ReconciliationReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    membership: Option<&'a MembershipView>,
}

/// Execute the apply command
pub async fn execute(args: ApplyArgs, config: AppConfig) -> CliResult<()> {
    let intents: Vec<Intent> = extract_all(&args.files)?
        .into_iter()
        .map(|(_, intent)| intent)
        .collect();
    info!(documents = intents.len(), "Change documents loaded");

    let mut engine = engine(&config);
    let report = engine.apply(&intents).await;
    let membership = if args.no_listing {
        None
    } else {
        Some(engine.membership_view().await)
    };
    close(&mut engine).await;

    if args.json {
        let output = ApplyOutput {
            report: &report,
            membership: membership.as_ref(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print!("{}", format_report(&report));
        if let Some(view) = &membership {
            println!();
            print!("{}", format_membership(view));
        }
    }

    check_report(&report)
}

fn check_report(report: &ReconciliationReport) -> CliResult<()> {
    if report.has_failures() {
        return Err(CliError::OperationsFailed {
            failed: report.failed_entries().count(),
        });
    }
    Ok(())
}
