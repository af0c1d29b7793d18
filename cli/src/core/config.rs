//! # Concierge Configuration System
//!
//! File: cli/src/core/config.rs
//!
//! ## Overview
//!
//! This module loads, merges and validates the Concierge configuration. Every
//! setting has a built-in default, so running without any file is valid.
//!
//! Configuration sources (in order of precedence):
//! 1. An explicit `--config FILE` (replaces the search below)
//! 2. Project-specific `.concierge.toml` in current directory or ancestors
//! 3. User-specific `<config dir>/concierge/config.toml`
//! 4. Default values defined in the code
//!
//! Command-line flags are applied on top of the result by the individual
//! commands (see `commands::serve::config`).
//!
//! ## Examples
//!
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 8000
//! enable_cors = true
//!
//! [model]
//! directory = "~/models/tinyllama"
//! temperature = 0.7
//!
//! [[screening.categories]]
//! name = "Financial & Business Information"
//! keywords = ["revenue", "budget"]
//! ```
//!
//! ```rust
//! let cfg = config::load_config(None)?;
//! let screening = Screening::from_config(&cfg.screening)?;
//! ```
//!
use crate::common::model::DeviceKind;
use crate::common::screening::{defaults, SensitiveTopics};
use crate::core::error::{ConciergeError, Result};
use anyhow::{anyhow, Context};
use directories::ProjectDirs;
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use std::{
    fs,
    path::{Path, PathBuf},
};
use toml::{Table, Value};
use tracing::{debug, info, warn};

/// Represents the main configuration structure, loaded from TOML files.
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub model: ModelSection,
    #[serde(default)]
    pub screening: ScreeningConfig,
}

/// `[server]`: where and how the HTTP service listens.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct ServerSection {
    /// Interface to bind. Defaults to all interfaces.
    pub host: IpAddr,
    pub port: u16,
    /// Send permissive CORS headers.
    pub enable_cors: bool,
    /// Number of consecutive ports to try, starting at `port`. 1 means no fallback.
    pub port_attempts: u8,
}

/// `[model]`: the language model and its sampling parameters.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct ModelSection {
    /// Directory holding config.json, tokenizer.json and *.safetensors (can use ~).
    pub directory: String,
    pub device: DeviceKind,
    pub max_new_tokens: usize,
    pub temperature: f64,
    pub top_p: f64,
    /// Fixed sampling seed. A fresh random seed is drawn per request when unset.
    pub seed: Option<u64>,
}

/// `[screening]`: greeting phrases, canned replies and the sensitive-topic table.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct ScreeningConfig {
    pub greetings: Vec<String>,
    pub greeting_reply: String,
    pub refusal_reply: String,
    /// Replaces the built-in table when non-empty. Order is scan order.
    pub categories: Vec<CategoryConfig>,
}

/// One `[[screening.categories]]` entry.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CategoryConfig {
    pub name: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_MODEL_DIR: &str = "./model";

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            enable_cors: true,
            port_attempts: 1,
        }
    }
}

impl Default for ModelSection {
    fn default() -> Self {
        Self {
            directory: DEFAULT_MODEL_DIR.to_string(),
            device: DeviceKind::Cpu,
            max_new_tokens: 100,
            temperature: 0.7,
            top_p: 0.9,
            seed: None,
        }
    }
}

impl Default for ScreeningConfig {
    fn default() -> Self {
        Self {
            greetings: defaults::GREETINGS.iter().map(|g| g.to_string()).collect(),
            greeting_reply: defaults::GREETING_REPLY.to_string(),
            refusal_reply: defaults::REFUSAL_REPLY.to_string(),
            categories: Vec::new(),
        }
    }
}

const PROJECT_CONFIG_FILENAME: &str = ".concierge.toml";

/// Loads the effective configuration.
///
/// With `explicit` set, only that file is read (and it must exist). Otherwise the
/// user and project files are looked up and merged, project winning for every
/// key it sets.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let mut config = match explicit {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            load_config_from_path(path)?
        }
        None => {
            let user_table = load_user_config()?;
            let project_table = load_project_config()?;
            let merged = merge_configs(user_table.unwrap_or_default(), project_table);
            config_from_table(merged).context("Failed to apply merged configuration")?
        }
    };
    expand_config_paths(&mut config);
    validate_config(&config).context("Configuration validation failed")?;
    debug!("Final loaded configuration: {:?}", config);
    Ok(config)
}

fn load_user_config() -> Result<Option<Table>> {
    if let Some(proj_dirs) = ProjectDirs::from("com", "Concierge", "concierge") {
        let config_path = proj_dirs.config_dir().join("config.toml");
        if config_path.exists() {
            info!("Loading user configuration from: {}", config_path.display());
            load_config_table(&config_path).map(Some)
        } else {
            debug!(
                "User configuration file not found at {}",
                config_path.display()
            );
            Ok(None)
        }
    } else {
        warn!("Could not determine user config directory.");
        Ok(None)
    }
}

fn load_project_config() -> Result<Option<Table>> {
    let current_dir = std::env::current_dir().context("Failed to get current directory")?;
    if let Some(project_config_path) = find_project_config_path(&current_dir) {
        info!(
            "Loading project configuration from: {}",
            project_config_path.display()
        );
        load_config_table(&project_config_path).map(Some)
    } else {
        debug!("No project configuration file ({PROJECT_CONFIG_FILENAME}) found.");
        Ok(None)
    }
}

/// Walks from `start` towards the root looking for `.concierge.toml`, stopping
/// at the first directory that contains `.git`.
fn find_project_config_path(start: &Path) -> Option<PathBuf> {
    let mut path = start;
    loop {
        let project_config = path.join(PROJECT_CONFIG_FILENAME);
        if project_config.is_file() {
            return Some(project_config);
        }
        if path.join(".git").is_dir() {
            debug!(
                "Found .git directory at {}, stopping project config search.",
                path.display()
            );
            return None;
        }
        path = path.parent()?;
    }
}

fn load_config_from_path(path: &Path) -> Result<Config> {
    let table = load_config_table(path)?;
    config_from_table(table)
        .with_context(|| format!("Invalid configuration in file: {}", path.display()))
}

/// Reads `path` as a raw TOML table. The table is also checked against the
/// `Config` schema so a bad key is reported against the file that holds it.
fn load_config_table(path: &Path) -> Result<Table> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;
    let table: Table = content
        .parse()
        .with_context(|| format!("Failed to parse TOML from file: {}", path.display()))?;
    config_from_table(table.clone())
        .with_context(|| format!("Invalid configuration in file: {}", path.display()))?;
    Ok(table)
}

fn config_from_table(table: Table) -> Result<Config> {
    Ok(Value::Table(table).try_into::<Config>()?)
}

/// Key-by-key merge of the raw files: every key present in `project` replaces the
/// user's value, tables merge recursively, arrays are replaced whole.
fn merge_configs(mut user: Table, project: Option<Table>) -> Table {
    if let Some(project) = project {
        merge_tables(&mut user, project);
    }
    user
}

fn merge_tables(base: &mut Table, overlay: Table) {
    for (key, value) in overlay {
        if let Value::Table(overlay_table) = value {
            if let Some(Value::Table(base_table)) = base.get_mut(&key) {
                merge_tables(base_table, overlay_table);
                continue;
            }
            base.insert(key, Value::Table(overlay_table));
        } else {
            base.insert(key, value);
        }
    }
}

fn expand_config_paths(config: &mut Config) {
    config.model.directory = shellexpand::tilde(&config.model.directory).into_owned();
    debug!("Expanded model directory: {}", config.model.directory);
}

fn validate_config(config: &Config) -> Result<()> {
    info!("Validating final configuration...");
    if config.server.port_attempts == 0 {
        return Err(anyhow!(ConciergeError::Config(
            "server.port_attempts must be at least 1.".to_string()
        )));
    }
    validate_model_section(&config.model)?;
    if !config.screening.categories.is_empty() {
        SensitiveTopics::from_categories(&config.screening.categories)?;
    }

    let model_dir = PathBuf::from(&config.model.directory);
    if !model_dir.exists() {
        info!(
            "Configured model directory '{}' does not exist.",
            model_dir.display()
        );
    } else if !model_dir.is_dir() {
        return Err(anyhow!(ConciergeError::Config(format!(
            "Configured model path '{}' exists but is not a directory.",
            model_dir.display()
        ))));
    }
    info!("Configuration validation successful.");
    Ok(())
}

/// Checks the sampling parameters. Also used after CLI overrides are applied.
pub fn validate_model_section(model: &ModelSection) -> Result<()> {
    if model.max_new_tokens == 0 {
        return Err(anyhow!(ConciergeError::Config(
            "model.max_new_tokens must be at least 1.".to_string()
        )));
    }
    if !(model.temperature.is_finite() && model.temperature > 0.0) {
        return Err(anyhow!(ConciergeError::Config(format!(
            "model.temperature must be a positive number, got {}.",
            model.temperature
        ))));
    }
    if !(model.top_p > 0.0 && model.top_p <= 1.0) {
        return Err(anyhow!(ConciergeError::Config(format!(
            "model.top_p must be in (0, 1], got {}.",
            model.top_p
        ))));
    }
    Ok(())
}
