//! # Concierge CLI Integration Test Common Helpers
//!
//! File: cli/tests/common.rs
//!
//! ## Overview
//!
//! Shared helpers for the integration tests in `cli/tests/`. Every command is
//! run inside a temporary directory with `HOME` and `XDG_CONFIG_HOME` pointed at
//! it, so a developer's own `~/.config/concierge/config.toml` or a
//! `.concierge.toml` in the checkout never leaks into a test.
//!

// Different test files use different helpers.
#![allow(dead_code)]

pub use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// `assert_cmd::Command` for the compiled `concierge` binary.
pub fn concierge_cmd() -> Command {
    Command::cargo_bin("concierge").expect("Failed to find concierge binary for testing")
}

/// An isolated working directory for one test.
pub struct Sandbox {
    pub dir: TempDir,
}

impl Sandbox {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create sandbox directory"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// `concierge` running in the sandbox with no ambient configuration.
    pub fn cmd(&self) -> Command {
        let mut cmd = concierge_cmd();
        cmd.current_dir(self.path())
            .env("HOME", self.path())
            .env("XDG_CONFIG_HOME", self.path().join(".config"))
            .env_remove("CONCIERGE_CONFIG")
            .env_remove("CONCIERGE_MODEL_DIR")
            .env_remove("RUST_LOG");
        cmd
    }

    /// Writes `contents` to `name` inside the sandbox and returns its path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.path().join(name);
        fs::write(&path, contents).expect("Failed to write sandbox file");
        path
    }
}
