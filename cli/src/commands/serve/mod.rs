//! # Concierge Chat Service
//!
//! File: cli/src/commands/serve/mod.rs
//!
//! ## Overview
//!
//! This module runs the chatbot as an HTTP service with a single endpoint,
//! `POST /chat`. Each query is screened first; only queries that are neither
//! greetings nor sensitive reach the language model.
//!
//! ## Architecture
//!
//! - `config.rs`: argument/config-file merging and validation
//! - `handlers.rs`: the `/chat` handler and its error responses
//! - `server_logic.rs`: port selection, router, middleware and shutdown
//!
//! ## Examples
//!
//! ```bash
//! # Serve the model in ./model on 0.0.0.0:8000
//! concierge serve
//!
//! # Local-only, another port, model elsewhere
//! concierge serve --host 127.0.0.1 --port 9000 --model-dir ~/models/tinyllama
//! ```
//!
//! Server startup flow:
//! 1. Load and merge configuration from CLI args and config files
//! 2. Build the screening rules and load the model (failure aborts startup)
//! 3. Bind the port and serve until Ctrl+C/SIGTERM
//!
use crate::common::model::LlamaGenerator;
use crate::common::reply::Responder;
use crate::common::screening::Screening;
use crate::core::error::Result;
use anyhow::Context;
use std::sync::Arc;
use tracing::info;

pub use config::ServeArgs;

/// Handles configuration loading and merging for the chat service.
pub mod config;

/// `/chat` request handling.
pub mod handlers;

/// Contains the core Axum-based HTTP server implementation.
pub mod server_logic;

/// # Handle Serve Command (`handle_serve`)
///
/// Entry point for `concierge serve`.
///
/// 1. Loads the configuration files and merges `args` into them.
/// 2. Builds the screening rules from the `[screening]` section.
/// 3. Loads the model on a blocking thread.
/// 4. Runs the server via `server_logic::run_server`.
///
/// ## Errors
///
/// Fails if the configuration is invalid, the model cannot be loaded, or the
/// server cannot bind its address.
pub async fn handle_serve(args: ServeArgs) -> Result<()> {
    info!("Handling serve command with args: {:?}", args);

    let file_config = args.config.load()?;
    let config = config::load_and_merge_config(&args, &file_config).await?;
    info!("Effective server config: {:?}", config);

    let screening = Screening::from_config(&file_config.screening)?;
    info!(
        "Screening {} sensitive categories ({} keywords)",
        screening.topics().categories().len(),
        screening.topics().keyword_count()
    );

    let model_dir = config.model_dir.clone();
    let device = config.device;
    let params = config.generation.clone();
    info!("Loading model from {}", model_dir.display());
    let generator =
        tokio::task::spawn_blocking(move || LlamaGenerator::load(&model_dir, device, params))
            .await
            .context("Model loading task failed")??;

    let responder = Responder::new(screening, Arc::new(generator));
    server_logic::run_server(config, responder).await?;

    Ok(())
}
