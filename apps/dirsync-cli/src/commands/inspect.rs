//! Show what change documents would do, without touching the directory

use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

use dirsync_provisioning::Intent;

use crate::commands::extract_all;
use crate::error::CliResult;
use crate::output::format_intent;

/// Extract and print the intent of each change document
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Change documents to read
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct InspectedDocument {
    path: String,
    intent: Intent,
}

/// Execute the inspect command
pub async fn execute(args: InspectArgs) -> CliResult<()> {
    let intents = extract_all(&args.files)?;

    if args.json {
        let documents: Vec<InspectedDocument> = intents
            .into_iter()
            .map(|(path, intent)| InspectedDocument {
                path: path.display().to_string(),
                intent,
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&documents)?);
    } else {
        for (path, intent) in &intents {
            println!("{}", format_intent(path, intent));
        }
    }

    Ok(())
}
