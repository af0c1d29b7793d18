//! # Concierge Query Screening
//!
//! File: cli/src/common/screening/mod.rs
//!
//! ## Overview
//!
//! Decides, before any model call, whether a query should be answered at all:
//! - exact greetings get a fixed reply,
//! - queries mentioning a sensitive topic are refused and escalated to a human,
//! - everything else is left for the language model.
//!
//! The keyword table (`SensitiveTopics`) is an ordered list of categories. It is
//! built once at startup, either from the built-in defaults in `defaults.rs` or
//! from the `[screening]` section of the configuration, and never mutated.
//!
//! ## Matching rules
//!
//! - Keywords are lower-cased when the table is built; the query is lower-cased
//!   once per scan. A keyword matches if it is a substring of the query.
//! - Categories are scanned in table order and the first match wins.
//! - Greetings compare the whole trimmed, lower-cased query (no substring match),
//!   so "hi there" is not a greeting.
//!
use crate::core::config::{CategoryConfig, ScreeningConfig};
use crate::core::error::{ConciergeError, Result};
use tracing::debug;

pub mod defaults;

/// One named group of keyword phrases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub name: String,
    pub keywords: Vec<String>,
}

/// The category and keyword that caused a query to be flagged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopicMatch<'a> {
    pub category: &'a str,
    pub keyword: &'a str,
}

/// Ordered, immutable category-to-keyword table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensitiveTopics {
    categories: Vec<Category>,
}

impl SensitiveTopics {
    /// The built-in table of nine categories.
    pub fn builtin() -> Self {
        let categories = defaults::SENSITIVE_CATEGORIES
            .iter()
            .map(|(name, keywords)| Category {
                name: (*name).to_string(),
                keywords: normalize_keywords(keywords.iter().copied()),
            })
            .collect();
        Self { categories }
    }

    /// Builds a custom table, keeping the given category order.
    ///
    /// Keywords are trimmed, lower-cased and de-duplicated. Fails if the table is
    /// empty, a name is blank, or a category ends up with no keywords.
    pub fn from_categories(categories: &[CategoryConfig]) -> Result<Self> {
        if categories.is_empty() {
            return Err(ConciergeError::Config(
                "A custom keyword table must contain at least one category.".to_string(),
            )
            .into());
        }

        let mut built = Vec::with_capacity(categories.len());
        for category in categories {
            let name = category.name.trim();
            if name.is_empty() {
                return Err(ConciergeError::Config(
                    "Sensitive category names cannot be empty.".to_string(),
                )
                .into());
            }
            let keywords = normalize_keywords(category.keywords.iter().map(String::as_str));
            if keywords.is_empty() {
                return Err(ConciergeError::Config(format!(
                    "Sensitive category '{}' has no keywords.",
                    name
                ))
                .into());
            }
            built.push(Category {
                name: name.to_string(),
                keywords,
            });
        }

        Ok(Self { categories: built })
    }

    /// Returns the first category (in table order) with a keyword contained in `query`.
    pub fn find<'a>(&'a self, query: &str) -> Option<TopicMatch<'a>> {
        let query_lower = query.to_lowercase();
        self.categories.iter().find_map(|category| {
            category
                .keywords
                .iter()
                .find(|keyword| query_lower.contains(keyword.as_str()))
                .map(|keyword| TopicMatch {
                    category: &category.name,
                    keyword,
                })
        })
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn keyword_count(&self) -> usize {
        self.categories.iter().map(|c| c.keywords.len()).sum()
    }
}

impl Default for SensitiveTopics {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Trims, lower-cases and de-duplicates keywords, preserving first occurrence order.
fn normalize_keywords<'a>(keywords: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::new();
    for keyword in keywords {
        let keyword = keyword.trim().to_lowercase();
        if !keyword.is_empty() && !normalized.contains(&keyword) {
            normalized.push(keyword);
        }
    }
    normalized
}

/// Everything needed to answer or refuse a query without the model.
#[derive(Debug, Clone)]
pub struct Screening {
    topics: SensitiveTopics,
    greetings: Vec<String>,
    greeting_reply: String,
    refusal_reply: String,
}

impl Screening {
    /// Builds the screening rules from the `[screening]` config section.
    ///
    /// An empty `categories` list selects the built-in table.
    pub fn from_config(config: &ScreeningConfig) -> Result<Self> {
        let topics = if config.categories.is_empty() {
            SensitiveTopics::builtin()
        } else {
            SensitiveTopics::from_categories(&config.categories)?
        };
        debug!(
            "Screening with {} categories / {} keywords",
            topics.categories().len(),
            topics.keyword_count()
        );

        Ok(Self {
            topics,
            greetings: normalize_keywords(config.greetings.iter().map(String::as_str)),
            greeting_reply: config.greeting_reply.clone(),
            refusal_reply: config.refusal_reply.clone(),
        })
    }

    /// True if the whole query (trimmed, case-insensitive) is a greeting phrase.
    pub fn is_greeting(&self, query: &str) -> bool {
        let query_lower = query.trim().to_lowercase();
        self.greetings.iter().any(|g| *g == query_lower)
    }

    pub fn find_sensitive<'a>(&'a self, query: &str) -> Option<TopicMatch<'a>> {
        self.topics.find(query)
    }

    pub fn topics(&self) -> &SensitiveTopics {
        &self.topics
    }

    pub fn greeting_reply(&self) -> &str {
        &self.greeting_reply
    }

    pub fn refusal_reply(&self) -> &str {
        &self.refusal_reply
    }
}

impl Default for Screening {
    fn default() -> Self {
        Self {
            topics: SensitiveTopics::builtin(),
            greetings: normalize_keywords(defaults::GREETINGS.iter().copied()),
            greeting_reply: defaults::GREETING_REPLY.to_string(),
            refusal_reply: defaults::REFUSAL_REPLY.to_string(),
        }
    }
}
