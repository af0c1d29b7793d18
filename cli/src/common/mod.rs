//! # Concierge Common Building Blocks (`common`)
//!
//! File: cli/src/common/mod.rs
//!
//! ## Overview
//!
//! Shared logic used by more than one command. Command modules (`commands::`)
//! handle argument parsing and I/O; the question of *how to answer a query*
//! lives here so that `serve`, `ask` and `classify` agree on it.
//!
//! - **`screening`**: greeting detection and the sensitive-topic keyword table.
//! - **`model`**: the `TextGenerator` seam and the candle Llama implementation.
//! - **`reply`**: the pipeline combining both into a `ChatReply`.
//!
//! ## Usage
//!
//! ```rust
//! use crate::common::{model::LlamaGenerator, reply::Responder, screening::Screening};
//!
//! let screening = Screening::from_config(&cfg.screening)?;
//! let generator = LlamaGenerator::load(&model_dir, cfg.model.device, (&cfg.model).into())?;
//! let responder = Responder::new(screening, Arc::new(generator));
//! let reply = responder.respond("What are your opening hours?")?;
//! ```
//!

/// Language model loading and text generation.
pub mod model;
/// Query → `ChatReply` pipeline.
pub mod reply;
/// Greeting and sensitive-topic detection.
pub mod screening;
