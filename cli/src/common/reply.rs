//! # Concierge Reply Pipeline
//!
//! File: cli/src/common/reply.rs
//!
//! ## Overview
//!
//! Turns one user query into one `ChatReply`. Shared by the HTTP service
//! (`serve`) and the one-shot `ask` command so both answer identically.
//!
//! Steps, in order:
//! 1. Blank query → `ConciergeError::EmptyQuery`.
//! 2. Exact greeting → fixed greeting reply.
//! 3. Sensitive keyword → refusal, `escalated: true`, with the category name.
//! 4. Otherwise → `Question: {query}\nAnswer:` is sent to the model and the answer
//!    is cut out of the generated text.
//!
//! Steps 1-3 never touch the model.
//!
use crate::common::model::TextGenerator;
use crate::common::screening::Screening;
use crate::core::error::{ConciergeError, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// Marker the prompt ends with; the answer is whatever the model writes after it.
const ANSWER_MARKER: &str = "Answer:";

/// JSON body returned by `POST /chat` and printed by `ask`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub response: String,
    pub escalated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl ChatReply {
    pub fn answered(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            escalated: false,
            category: None,
        }
    }

    pub fn escalated(response: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            escalated: true,
            category: Some(category.into()),
        }
    }
}

/// The screening-only outcome of a query: everything decidable without the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Verdict {
    Greeting,
    Sensitive { category: String, keyword: String },
    NeedsModel,
}

/// Screening rules plus the model, shared read-only by every request.
pub struct Responder {
    screening: Screening,
    generator: Arc<dyn TextGenerator>,
}

impl Responder {
    pub fn new(screening: Screening, generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            screening,
            generator,
        }
    }

    /// Answers `query`. Blocks while the model generates, so async callers should
    /// run it on a blocking thread.
    pub fn respond(&self, query: &str) -> Result<ChatReply> {
        let query = query.trim();
        let verdict = screen(&self.screening, query)?;
        if let Some(reply) = canned_reply(&self.screening, &verdict) {
            return Ok(reply);
        }

        let prompt = build_prompt(query);
        debug!("Prompting model with {} chars", prompt.len());
        let generated = self.generator.generate(&prompt)?;
        Ok(ChatReply::answered(extract_answer(&generated)))
    }
}

/// The fixed reply for a greeting or escalation; `None` when the model must answer.
pub fn canned_reply(screening: &Screening, verdict: &Verdict) -> Option<ChatReply> {
    match verdict {
        Verdict::Greeting => {
            info!("Greeting received");
            Some(ChatReply::answered(screening.greeting_reply()))
        }
        Verdict::Sensitive { category, keyword } => {
            info!("Escalating query: category '{}' (keyword '{}')", category, keyword);
            Some(ChatReply::escalated(
                screening.refusal_reply(),
                category.as_str(),
            ))
        }
        Verdict::NeedsModel => None,
    }
}

/// Applies screening to `query` without calling the model.
pub fn screen(screening: &Screening, query: &str) -> Result<Verdict> {
    let query = query.trim();
    if query.is_empty() {
        return Err(ConciergeError::EmptyQuery.into());
    }
    if screening.is_greeting(query) {
        return Ok(Verdict::Greeting);
    }
    if let Some(found) = screening.find_sensitive(query) {
        return Ok(Verdict::Sensitive {
            category: found.category.to_string(),
            keyword: found.keyword.to_string(),
        });
    }
    Ok(Verdict::NeedsModel)
}

pub fn build_prompt(query: &str) -> String {
    format!("Question: {query}\n{ANSWER_MARKER}")
}

/// Text after the last `Answer:` (all of it if absent), trimmed, first line only.
pub fn extract_answer(generated: &str) -> String {
    let after_marker = generated
        .rsplit_once(ANSWER_MARKER)
        .map_or(generated, |(_, answer)| answer);
    after_marker
        .trim()
        .lines()
        .next()
        .unwrap_or_default()
        .to_string()
}
