//! # Concierge Error Types
//!
//! File: cli/src/core/error.rs
//!
//! ## Overview
//!
//! This module defines the error types used throughout Concierge. It follows a
//! two-layer approach:
//! - `ConciergeError`: a `thiserror` enum for the failures callers need to tell
//!   apart (e.g. an empty query must become HTTP 400, a generation failure HTTP 500).
//! - `Result<T>`: an alias for `anyhow::Result<T>` so any error can be propagated
//!   with `?` and enriched with `.context(..)`.
//!
//! ## Examples
//!
//! ```rust
//! // Return a specific error type
//! if query.trim().is_empty() {
//!     return Err(ConciergeError::EmptyQuery.into());
//! }
//!
//! // Pattern matching on error types after propagation through anyhow
//! match responder.respond(&query) {
//!     Ok(reply) => println!("{}", reply.response),
//!     Err(e) if matches!(e.downcast_ref::<ConciergeError>(), Some(ConciergeError::EmptyQuery)) => {
//!         println!("Nothing to answer.");
//!     }
//!     Err(e) => return Err(e),
//! }
//! ```
//!
use thiserror::Error;

/// Custom error type for the Concierge application.
#[derive(Error, Debug)]
pub enum ConciergeError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// The query was missing or blank after trimming. The message is the one
    /// returned to HTTP clients verbatim.
    #[error("Query is required")]
    EmptyQuery,

    #[error("Failed to load model from '{path}': {reason}")]
    ModelLoad { path: String, reason: String },

    #[error("Tokenizer error: {0}")]
    Tokenizer(String),

    #[error("Text generation failed: {0}")]
    Generation(String),

    #[error("Tensor operation failed: {source}")]
    Candle {
        #[from]
        source: candle_core::Error,
    },
}

/// Type alias for Result using anyhow::Error for broad compatibility.
pub type Result<T> = anyhow::Result<T>;
