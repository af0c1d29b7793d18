//! # Shared Command-Line Options
//!
//! File: cli/src/commands/options.rs
//!
//! Argument groups flattened into several subcommands:
//! - `ConfigArg`: `--config FILE`, used by every command.
//! - `ModelArgs`: model location and sampling flags, used by `serve` and `ask`.
//!
//! A model flag overrides the configuration file only when it differs from its
//! default value, the same rule `serve` applies to its server flags.
//!
use crate::common::model::DeviceKind;
use crate::core::config::{self, Config, ModelSection, DEFAULT_MODEL_DIR};
use crate::core::error::Result;
use clap::Args;
use std::path::PathBuf;

/// `--config FILE`
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArg {
    /// Read settings from this TOML file instead of searching for `.concierge.toml`.
    #[arg(long = "config", short = 'c', env = "CONCIERGE_CONFIG", value_name = "FILE")]
    pub path: Option<PathBuf>,
}

impl ConfigArg {
    /// Loads the effective configuration file(s).
    pub fn load(&self) -> Result<Config> {
        config::load_config(self.path.as_deref())
    }
}

/// Model location and sampling flags.
#[derive(Args, Debug, Clone)]
pub struct ModelArgs {
    /// Directory containing config.json, tokenizer.json and *.safetensors.
    #[arg(long, env = "CONCIERGE_MODEL_DIR", default_value = DEFAULT_MODEL_DIR)]
    pub model_dir: PathBuf,

    /// Device to run the model on.
    #[arg(long, value_enum, default_value_t = DeviceKind::Cpu)]
    pub device: DeviceKind,

    /// Maximum number of tokens generated per reply.
    #[arg(long, default_value_t = 100)]
    pub max_new_tokens: usize,

    /// Sampling temperature.
    #[arg(long, default_value_t = 0.7)]
    pub temperature: f64,

    /// Nucleus sampling probability mass.
    #[arg(long, default_value_t = 0.9)]
    pub top_p: f64,

    /// Fixed sampling seed (random per request when omitted).
    #[arg(long)]
    pub seed: Option<u64>,
}

impl Default for ModelArgs {
    fn default() -> Self {
        let defaults = ModelSection::default();
        Self {
            model_dir: PathBuf::from(defaults.directory),
            device: defaults.device,
            max_new_tokens: defaults.max_new_tokens,
            temperature: defaults.temperature,
            top_p: defaults.top_p,
            seed: None,
        }
    }
}

impl ModelArgs {
    /// Writes every flag that differs from its default into `section`.
    pub fn apply_to(&self, section: &mut ModelSection) {
        let defaults = ModelSection::default();

        // `~` is expanded here too; a quoted flag or the env var reaches us unexpanded.
        let model_dir = self.model_dir.to_string_lossy();
        if model_dir != defaults.directory {
            section.directory = shellexpand::tilde(&model_dir).into_owned();
        }
        if self.device != defaults.device {
            section.device = self.device;
        }
        if self.max_new_tokens != defaults.max_new_tokens {
            section.max_new_tokens = self.max_new_tokens;
        }
        if self.temperature != defaults.temperature {
            section.temperature = self.temperature;
        }
        if self.top_p != defaults.top_p {
            section.top_p = self.top_p;
        }
        if self.seed.is_some() {
            section.seed = self.seed;
        }
    }
}
