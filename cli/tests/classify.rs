//! # Concierge CLI Classify Integration Tests
//!
//! File: cli/tests/classify.rs
//!
//! `concierge classify` runs screening only, so these tests need no model.
//!
mod common;
use common::*;
use predicates::prelude::*;

#[test]
fn test_classify_sensitive_query() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .args(["classify", "What was last year's REVENUE?"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Sensitive category: Financial & Business Information (matched 'revenue')",
        ));
}

#[test]
fn test_classify_ordinary_query() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .args(["classify", "What are your opening hours?"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No sensitive category found."));
}

#[test]
fn test_classify_json_verdicts() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .args(["classify", "--json", "  Hello  "])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#"{"verdict":"greeting"}"#));

    sandbox
        .cmd()
        .args(["classify", "--json", "Was there a phishing attempt?"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            r#"{"verdict":"sensitive","category":"Security & Data Breach","keyword":"phishing"}"#,
        ));

    sandbox
        .cmd()
        .args(["classify", "--json", "hello there, how are you?"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#"{"verdict":"needs_model"}"#));
}

#[test]
fn test_classify_empty_query_fails() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .args(["classify", "   "])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Query is required"));
}

#[test]
fn test_classify_uses_explicit_config() {
    let sandbox = Sandbox::new();
    let config = sandbox.write(
        "custom.toml",
        r#"
[screening]
greetings = ["ahoy"]

[[screening.categories]]
name = "Pirates"
keywords = ["Treasure"]
"#,
    );
    let config = config.to_str().unwrap();

    sandbox
        .cmd()
        .args(["classify", "--config", config, "Where is the treasure?"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Sensitive category: Pirates (matched 'treasure')"));

    // The built-in table is replaced, not extended.
    sandbox
        .cmd()
        .args(["classify", "--config", config, "What is your revenue?"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No sensitive category found."));

    sandbox
        .cmd()
        .args(["classify", "--config", config, "--json", "Ahoy"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#"{"verdict":"greeting"}"#));
}

#[test]
fn test_classify_finds_project_config() {
    let sandbox = Sandbox::new();
    sandbox.write(
        ".concierge.toml",
        r#"
[[screening.categories]]
name = "Weather"
keywords = ["forecast"]
"#,
    );

    sandbox
        .cmd()
        .args(["classify", "What's the forecast?"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Sensitive category: Weather"));
}

#[test]
fn test_classify_rejects_invalid_config() {
    let sandbox = Sandbox::new();
    let config = sandbox.write("bad.toml", "[screening]\nunknown_field = 1\n");

    sandbox
        .cmd()
        .args(["classify", "--config", config.to_str().unwrap(), "hi"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn test_classify_missing_config_file_fails() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .args(["classify", "--config", "does-not-exist.toml", "hi"])
        .assert()
        .failure();
}
