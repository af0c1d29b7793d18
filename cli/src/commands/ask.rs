//! # Concierge Ask Command
//!
//! File: cli/src/commands/ask.rs
//!
//! ## Overview
//!
//! Implements `concierge ask <QUERY>`: answers one query exactly as `POST /chat`
//! would and prints the JSON reply. Greetings and escalations are answered
//! without loading the model.
//!
//! ```bash
//! concierge ask --model-dir ~/models/tinyllama "What are your opening hours?"
//! ```
//!
use crate::commands::options::{ConfigArg, ModelArgs};
use crate::common::model::{GenerationParams, LlamaGenerator};
use crate::common::reply::{canned_reply, screen, Responder};
use crate::common::screening::Screening;
use crate::core::config::validate_model_section;
use crate::core::error::Result;
use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Arguments for `concierge ask`.
#[derive(Parser, Debug)]
pub struct AskArgs {
    /// The question to answer.
    pub query: String,

    #[command(flatten)]
    pub model: ModelArgs,

    #[command(flatten)]
    pub config: ConfigArg,
}

pub async fn handle_ask(args: AskArgs) -> Result<()> {
    info!("Handling ask command...");
    let cfg = args.config.load()?;
    let screening = Screening::from_config(&cfg.screening)?;

    let verdict = screen(&screening, &args.query)?;
    let reply = match canned_reply(&screening, &verdict) {
        Some(reply) => reply,
        None => {
            let mut model = cfg.model.clone();
            args.model.apply_to(&mut model);
            validate_model_section(&model)?;

            let model_dir = PathBuf::from(&model.directory);
            let device = model.device;
            let params = GenerationParams::from(&model);
            let query = args.query.clone();
            tokio::task::spawn_blocking(move || {
                let generator = LlamaGenerator::load(&model_dir, device, params)?;
                Responder::new(screening, Arc::new(generator)).respond(&query)
            })
            .await
            .context("Generation task failed")??
        }
    };

    let json = serde_json::to_string_pretty(&reply).context("Failed to serialize reply")?;
    println!("{}", json);
    Ok(())
}
