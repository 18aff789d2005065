//! Read users and groups back from the directory

use clap::Args;

use crate::commands::{close, engine};
use crate::config::AppConfig;
use crate::error::{CliError, CliResult};
use crate::output::format_membership;

/// List users and groups with their resolved members
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Execute the list command
pub async fn execute(args: ListArgs, config: AppConfig) -> CliResult<()> {
    let mut engine = engine(&config);
    engine
        .ensure_connected()
        .await
        .map_err(|e| CliError::Directory(e.to_string()))?;

    let view = engine.membership_view().await;
    close(&mut engine).await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        print!("{}", format_membership(&view));
    }

    if !view.failures.is_empty() {
        return Err(CliError::Listing(view.failures.join("; ")));
    }
    Ok(())
}
