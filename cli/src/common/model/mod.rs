//! # Concierge Language Model
//!
//! File: cli/src/common/model/mod.rs
//!
//! ## Overview
//!
//! Text generation for queries that pass screening. The model is loaded once at
//! startup and then shared read-only; every call to `generate` owns its own KV
//! cache and sampler, so one instance can serve concurrent requests.
//!
//! ## Architecture
//!
//! - `TextGenerator`: the seam between the reply pipeline and the model, so the
//!   pipeline and HTTP layer can be exercised without weights on disk.
//! - `files`: locates `config.json`, `tokenizer.json` and `*.safetensors` in a model directory.
//! - `llama`: `LlamaGenerator`, a candle Llama-architecture causal LM with
//!   nucleus sampling.
//!
use crate::core::config::ModelSection;
use crate::core::error::Result;
use anyhow::Context;
use candle_core::Device;
use clap::ValueEnum;
use serde::Deserialize;

pub mod files;
pub mod llama;

pub use llama::LlamaGenerator;

/// Produces text from a prompt.
pub trait TextGenerator: Send + Sync {
    /// Returns the decoded prompt followed by the sampled continuation, with
    /// special tokens removed.
    fn generate(&self, prompt: &str) -> Result<String>;
}

/// Compute device the model is loaded onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    #[default]
    Cpu,
    Cuda,
    Metal,
}

impl DeviceKind {
    /// Opens the first device of this kind. CUDA and Metal fail unless candle
    /// was built with the matching backend.
    pub fn open(self) -> Result<Device> {
        match self {
            DeviceKind::Cpu => Ok(Device::Cpu),
            DeviceKind::Cuda => Device::new_cuda(0).context("Failed to open CUDA device 0"),
            DeviceKind::Metal => Device::new_metal(0).context("Failed to open Metal device 0"),
        }
    }
}

/// Sampling settings applied to every generation.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    pub max_new_tokens: usize,
    pub temperature: f64,
    pub top_p: f64,
    pub seed: Option<u64>,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self::from(&ModelSection::default())
    }
}

impl From<&ModelSection> for GenerationParams {
    fn from(section: &ModelSection) -> Self {
        Self {
            max_new_tokens: section.max_new_tokens,
            temperature: section.temperature,
            top_p: section.top_p,
            seed: section.seed,
        }
    }
}
