//! # Llama-architecture generator
//!
//! File: cli/src/common/model/llama.rs
//!
//! ## Overview
//!
//! Loads a Llama-family causal language model with candle and samples
//! continuations with temperature + nucleus (top-p) sampling.
//!
//! Weights are memory-mapped from the safetensors shards. F32 is used on the
//! CPU and F16 on accelerators.
//!
//! ## Generation
//!
//! 1. Encode the prompt (with the tokenizer's special tokens, e.g. BOS).
//! 2. If prompt + `max_new_tokens` would overflow the model's position
//!    embeddings, drop prompt tokens from the left.
//! 3. Feed the prompt once, then one token at a time through a per-call KV cache.
//! 4. Stop at an EOS token or after `max_new_tokens`.
//! 5. Decode prompt and continuation together, skipping special tokens.
//!
use super::files::locate_model_files;
use super::{DeviceKind, GenerationParams, TextGenerator};
use crate::core::error::{ConciergeError, Result};
use anyhow::Context;
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::generation::{LogitsProcessor, Sampling};
use candle_transformers::models::llama::{Cache, Config, Llama, LlamaConfig, LlamaEosToks};
use std::fs;
use std::path::Path;
use tokenizers::Tokenizer;
use tracing::{debug, info, warn};

/// Token strings tried when `config.json` does not name an EOS token.
const FALLBACK_EOS_TOKENS: &[&str] = &["</s>", "<|endoftext|>", "<|end_of_text|>", "<|eot_id|>"];

pub struct LlamaGenerator {
    model: Llama,
    tokenizer: Tokenizer,
    config: Config,
    device: Device,
    dtype: DType,
    eos_token_ids: Vec<u32>,
    params: GenerationParams,
}

impl LlamaGenerator {
    /// Loads the model in `model_dir` onto `device`.
    ///
    /// ## Errors
    ///
    /// Fails if files are missing (see `locate_model_files`), `config.json` is not a
    /// Llama config, the tokenizer cannot be parsed, or the weights do not match
    /// the config.
    pub fn load(model_dir: &Path, device: DeviceKind, params: GenerationParams) -> Result<Self> {
        let files = locate_model_files(model_dir)?;
        info!(
            "Loading model from {} ({} weight file(s)) on {:?}",
            model_dir.display(),
            files.weights.len(),
            device
        );

        let raw_config = fs::read_to_string(&files.config)
            .with_context(|| format!("Failed to read {}", files.config.display()))?;
        let llama_config: LlamaConfig =
            serde_json::from_str(&raw_config).map_err(|e| ConciergeError::ModelLoad {
                path: model_dir.display().to_string(),
                reason: format!("invalid config.json: {e}"),
            })?;
        let config = llama_config.into_config(false);

        let tokenizer = Tokenizer::from_file(&files.tokenizer)
            .map_err(|e| ConciergeError::Tokenizer(e.to_string()))?;

        let device = device.open()?;
        let dtype = if device.is_cpu() {
            DType::F32
        } else {
            DType::F16
        };

        // SAFETY: the shards are mapped read-only and must not be modified while loaded.
        let vb = unsafe { VarBuilder::from_mmaped_safetensors(files.weights.as_slice(), dtype, &device) }
            .map_err(ConciergeError::from)?;
        let model = Llama::load(vb, &config).map_err(|e| ConciergeError::ModelLoad {
            path: model_dir.display().to_string(),
            reason: e.to_string(),
        })?;

        let eos_token_ids = eos_token_ids(&config, &tokenizer);
        if eos_token_ids.is_empty() {
            warn!("No EOS token found; every reply will run to max_new_tokens.");
        }
        info!(
            "Model loaded: {} layers, vocab {}, context {}",
            config.num_hidden_layers, config.vocab_size, config.max_position_embeddings
        );

        Ok(Self {
            model,
            tokenizer,
            config,
            device,
            dtype,
            eos_token_ids,
            params,
        })
    }

    /// Appends up to `max_new_tokens` sampled tokens to `tokens`. Returns how many were added.
    fn sample_continuation(&self, tokens: &mut Vec<u32>) -> std::result::Result<usize, ConciergeError> {
        let mut cache = Cache::new(true, self.dtype, &self.config, &self.device)?;
        let seed = self.params.seed.unwrap_or_else(rand::random);
        let mut logits_processor = LogitsProcessor::from_sampling(
            seed,
            Sampling::TopP {
                p: self.params.top_p,
                temperature: self.params.temperature,
            },
        );

        let prompt_len = tokens.len();
        let mut index_pos = 0;
        for _ in 0..self.params.max_new_tokens {
            // First step feeds the whole prompt; afterwards the cache holds it.
            let context = if index_pos == 0 {
                &tokens[..]
            } else {
                &tokens[tokens.len() - 1..]
            };
            let input = Tensor::new(context, &self.device)?.unsqueeze(0)?;
            let logits = self.model.forward(&input, index_pos, &mut cache)?;
            let logits = logits.squeeze(0)?;
            index_pos += context.len();

            let next_token = logits_processor.sample(&logits)?;
            if self.eos_token_ids.contains(&next_token) {
                break;
            }
            tokens.push(next_token);
        }
        Ok(tokens.len() - prompt_len)
    }

    /// Encodes `prompt` and left-truncates it so `max_new_tokens` still fit in
    /// the context. A leading special token (BOS) survives truncation.
    fn prepare_prompt(&self, prompt: &str) -> std::result::Result<Vec<u32>, ConciergeError> {
        let encoding = self
            .tokenizer
            .encode(prompt, true)
            .map_err(|e| ConciergeError::Tokenizer(e.to_string()))?;
        let mut tokens = encoding.get_ids().to_vec();
        let starts_with_special = encoding.get_special_tokens_mask().first() == Some(&1);

        let budget = prompt_budget(self.config.max_position_embeddings, self.params.max_new_tokens)
            .ok_or_else(|| {
                ConciergeError::Generation(format!(
                    "max_new_tokens ({}) leaves no room for the prompt in a {}-token context",
                    self.params.max_new_tokens, self.config.max_position_embeddings
                ))
            })?;
        if tokens.len() > budget {
            warn!(
                "Prompt has {} tokens, keeping the last {}",
                tokens.len(),
                budget
            );
            truncate_prompt(&mut tokens, budget, starts_with_special);
        }
        Ok(tokens)
    }
}

impl TextGenerator for LlamaGenerator {
    fn generate(&self, prompt: &str) -> Result<String> {
        let mut tokens = self.prepare_prompt(prompt)?;

        let generated = self
            .sample_continuation(&mut tokens)
            .map_err(|e| ConciergeError::Generation(e.to_string()))?;
        debug!("Generated {} token(s)", generated);

        let text = self
            .tokenizer
            .decode(&tokens, true)
            .map_err(|e| ConciergeError::Tokenizer(e.to_string()))?;
        Ok(text)
    }
}

/// Drops tokens from the front until `budget` remain. With `keep_first`, the
/// first token stays and the cut starts right after it.
fn truncate_prompt(tokens: &mut Vec<u32>, budget: usize, keep_first: bool) {
    if tokens.len() <= budget {
        return;
    }
    let excess = tokens.len() - budget;
    let start = usize::from(keep_first && budget > 1);
    tokens.drain(start..start + excess);
}

/// Prompt tokens that fit alongside `max_new_tokens` in a context of `context_len`.
/// `None` when nothing fits.
fn prompt_budget(context_len: usize, max_new_tokens: usize) -> Option<usize> {
    context_len
        .checked_sub(max_new_tokens)
        .filter(|budget| *budget > 0)
}

/// EOS ids from the model config, falling back to well-known tokenizer entries.
fn eos_token_ids(config: &Config, tokenizer: &Tokenizer) -> Vec<u32> {
    match &config.eos_token_id {
        Some(LlamaEosToks::Single(id)) => vec![*id],
        Some(LlamaEosToks::Multiple(ids)) => ids.clone(),
        None => FALLBACK_EOS_TOKENS
            .iter()
            .filter_map(|token| tokenizer.token_to_id(token))
            .collect(),
    }
}
