//! # Concierge HTTP Server Configuration
//!
//! File: cli/src/commands/serve/config.rs
//!
//! ## Overview
//!
//! This module combines the `serve` command-line arguments with the loaded
//! configuration files into one `ServerConfig`. Settings come from:
//! 1. Command-line arguments (highest priority, when different from their defaults)
//! 2. `[server]` / `[model]` sections of the configuration file(s)
//! 3. Default values (lowest priority)
//!
//! ## Architecture
//!
//! 1. Parse command-line arguments
//! 2. Load configuration files (`core::config`)
//! 3. Merge settings (CLI args override file settings)
//! 4. Validate sampling parameters and resolve the model directory
//!
//! ## Examples
//!
//! ```rust
//! let file_config = args.config.load()?;
//! let config = load_and_merge_config(&args, &file_config).await?;
//! println!("Listening on: {}:{}", config.host, config.port);
//! ```
//!
use crate::commands::options::{ConfigArg, ModelArgs};
use crate::common::model::{DeviceKind, GenerationParams};
use crate::core::config::{validate_model_section, Config, ServerSection, DEFAULT_PORT};
use crate::core::error::Result;
use anyhow::Context;
use clap::Args;
use std::net::IpAddr;
use std::{env, path::PathBuf};
use tracing::debug;

/// # Serve Command Arguments (`ServeArgs`)
///
/// Command-line arguments accepted by `concierge serve`. Each overrides the
/// matching configuration file setting when it differs from its default.
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Network IP address to bind. `0.0.0.0` (the default) accepts connections on
    /// every interface; use `127.0.0.1` for local-only access.
    #[arg(long, default_value = "0.0.0.0")]
    pub host: IpAddr,

    /// Network port to listen on.
    #[arg(long, short, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Disables Cross-Origin Resource Sharing (CORS) headers.
    /// By default, permissive CORS headers are sent.
    #[arg(long)]
    pub no_cors: bool,

    /// Number of consecutive ports to try if the requested one is taken.
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(1..))]
    pub port_attempts: u8,

    #[command(flatten)]
    pub model: ModelArgs,

    #[command(flatten)]
    pub config: ConfigArg,
}

/// # Effective Server Configuration (`ServerConfig`)
///
/// The consolidated settings the server runs with, after merging arguments and
/// configuration files and resolving the model directory.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    pub enable_cors: bool,
    pub port_attempts: u8,
    /// Absolute, canonical path of the model directory.
    pub model_dir: PathBuf,
    pub device: DeviceKind,
    pub generation: GenerationParams,
}

/// # Load and Merge Server Configuration (`load_and_merge_config`)
///
/// Applies `args` on top of the `[server]` and `[model]` sections of `file`,
/// validates the sampling parameters, then resolves the model directory.
///
/// ## Errors
///
/// Returns an error if a sampling parameter is out of range or the model
/// directory does not exist or is not a directory.
pub async fn load_and_merge_config(args: &ServeArgs, file: &Config) -> Result<ServerConfig> {
    let mut config = merge(args, file)?;
    config.resolve_model_dir().await?;
    Ok(config)
}

/// Pure merge step of `load_and_merge_config`, without touching the filesystem.
fn merge(args: &ServeArgs, file: &Config) -> Result<ServerConfig> {
    let defaults = ServerSection::default();
    let mut server = file.server.clone();

    // Host/port/attempts: use the CLI value only if it was changed from its default.
    if args.host != defaults.host {
        server.host = args.host;
    }
    if args.port != defaults.port {
        server.port = args.port;
    }
    if args.port_attempts != defaults.port_attempts {
        server.port_attempts = args.port_attempts;
    }
    // CORS: --no-cors always wins over the file.
    if args.no_cors {
        server.enable_cors = false;
    }

    let mut model = file.model.clone();
    args.model.apply_to(&mut model);
    validate_model_section(&model)?;

    Ok(ServerConfig {
        host: server.host,
        port: server.port,
        enable_cors: server.enable_cors,
        port_attempts: server.port_attempts,
        model_dir: PathBuf::from(&model.directory),
        device: model.device,
        generation: GenerationParams::from(&model),
    })
}

impl ServerConfig {
    /// # Resolve and Validate Model Directory (`resolve_model_dir`)
    ///
    /// Makes `model_dir` absolute (relative to the working directory), canonicalizes
    /// it and checks that it is a directory.
    async fn resolve_model_dir(&mut self) -> Result<()> {
        let absolute_path = if self.model_dir.is_absolute() {
            self.model_dir.clone()
        } else {
            env::current_dir()
                .context("Failed to get current working directory")?
                .join(&self.model_dir)
        };

        let canonical_path = tokio::fs::canonicalize(&absolute_path)
            .await
            .with_context(|| {
                format!(
                    "Model directory '{}' could not be found or accessed",
                    absolute_path.display()
                )
            })?;
        let metadata = tokio::fs::metadata(&canonical_path)
            .await
            .with_context(|| format!("Failed to get metadata for '{}'", canonical_path.display()))?;
        if !metadata.is_dir() {
            anyhow::bail!("Model path is not a directory: {}", canonical_path.display());
        }

        self.model_dir = canonical_path;
        debug!("Resolved model directory to: {}", self.model_dir.display());
        Ok(())
    }
}
