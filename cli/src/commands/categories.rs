//! # Concierge Categories Command
//!
//! File: cli/src/commands/categories.rs
//!
//! ## Overview
//!
//! Implements `concierge categories`, which prints the active sensitive-topic
//! table: the built-in one, or the custom table from the `[screening]`
//! section of the configuration. Categories appear in scan order, which is
//! also the order that decides ties.
//!
//! ## Examples
//!
//! ```bash
//! concierge categories
//! concierge categories --keywords
//! ```
//!
//! Example output:
//!
//! ```
//! Sensitive categories (scanned in this order):
//!
//! #  | Category                                | Keywords
//! ---+-----------------------------------------+---------
//! 1  | Financial & Business Information        | 16
//! 2  | Legal & Compliance Issues               | 14
//! ...
//! ```
//!
use crate::commands::options::ConfigArg;
use crate::common::screening::{Category, Screening};
use crate::core::error::Result;
use clap::Parser;
use tracing::info;

/// Arguments for `concierge categories`.
#[derive(Parser, Debug)]
pub struct CategoriesArgs {
    /// Also print every keyword of each category.
    #[arg(long)]
    pub keywords: bool,

    #[command(flatten)]
    pub config: ConfigArg,
}

pub async fn handle_categories(args: CategoriesArgs) -> Result<()> {
    info!("Handling categories command...");
    let cfg = args.config.load()?;
    let screening = Screening::from_config(&cfg.screening)?;
    let categories = screening.topics().categories();

    println!("{}", render_table(categories));
    if args.keywords {
        for category in categories {
            println!("\n{}:", category.name);
            for keyword in &category.keywords {
                println!("  - {}", keyword);
            }
        }
    }
    println!(
        "\n{} categories, {} keywords.",
        categories.len(),
        screening.topics().keyword_count()
    );
    Ok(())
}

/// Formats `categories` as a numbered table of names and keyword counts.
fn render_table(categories: &[Category]) -> String {
    let name_width = categories
        .iter()
        .map(|c| c.name.chars().count())
        .max()
        .unwrap_or(8)
        .clamp(8, 60);

    let mut lines = vec![
        "Sensitive categories (scanned in this order):\n".to_string(),
        format!("{:<3}| {:<width$} | Keywords", "#", "Category", width = name_width),
        format!("{:-<3}+-{:-<width$}-+---------", "", "", width = name_width),
    ];
    for (index, category) in categories.iter().enumerate() {
        lines.push(format!(
            "{:<3}| {:<width$} | {}",
            index + 1,
            category.name,
            category.keywords.len(),
            width = name_width
        ));
    }
    lines.join("\n")
}
