//! # Concierge Classify Command
//!
//! File: cli/src/commands/classify.rs
//!
//! ## Overview
//!
//! Implements `concierge classify <QUERY>`: runs the screening rules on a
//! query without loading a model. Useful for checking a custom keyword table.
//!
//! ```bash
//! $ concierge classify "Is there a lawsuit pending?"
//! Sensitive category: Legal & Compliance Issues (matched 'lawsuit')
//!
//! $ concierge classify --json "hello"
//! {"verdict":"greeting"}
//! ```
//!
use crate::commands::options::ConfigArg;
use crate::common::reply::{screen, Verdict};
use crate::common::screening::Screening;
use crate::core::error::Result;
use anyhow::Context;
use clap::Parser;
use tracing::info;

/// Arguments for `concierge classify`.
#[derive(Parser, Debug)]
pub struct ClassifyArgs {
    /// The query to screen.
    pub query: String,

    /// Print the verdict as JSON.
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub config: ConfigArg,
}

pub async fn handle_classify(args: ClassifyArgs) -> Result<()> {
    info!("Handling classify command...");
    let cfg = args.config.load()?;
    let screening = Screening::from_config(&cfg.screening)?;
    let verdict = screen(&screening, &args.query)?;

    if args.json {
        let json = serde_json::to_string(&verdict).context("Failed to serialize verdict")?;
        println!("{}", json);
    } else {
        println!("{}", describe(&verdict));
    }
    Ok(())
}

fn describe(verdict: &Verdict) -> String {
    match verdict {
        Verdict::Greeting => "Greeting: answered with the fixed greeting reply.".to_string(),
        Verdict::Sensitive { category, keyword } => {
            format!("Sensitive category: {} (matched '{}')", category, keyword)
        }
        Verdict::NeedsModel => "No sensitive category found.".to_string(),
    }
}
