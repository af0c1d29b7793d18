//! # Concierge Command Modules
//!
//! File: cli/src/commands/mod.rs
//!
//! ## Overview
//!
//! This module aggregates the subcommands of the `concierge` CLI and makes
//! them accessible to the main application entry point (`main.rs`). Each
//! command defines its own argument struct and an async `handle_*` function.
//!
//! ## Commands
//!
//! - `serve`: the HTTP chat service (`POST /chat`)
//! - `ask`: answer one query from the command line
//! - `classify`: screen a query without a model
//! - `categories`: list the sensitive-topic table
//!
//! Argument groups shared by several commands live in `options`.
//!

/// One-shot query through the full reply pipeline.
pub mod ask;
/// Lists the active sensitive-topic table.
pub mod categories;
/// Screening-only verdict for a query.
pub mod classify;
/// `--config` and model flags shared by several commands.
pub mod options;
/// The HTTP chat service.
pub mod serve;
