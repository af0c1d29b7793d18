//! Model directory layout.
//!
//! File: cli/src/common/model/files.rs
//!
//! A model directory holds a Hugging Face style `config.json`, a `tokenizer.json`
//! and the weights as one or more `*.safetensors` shards at its top level.
use crate::core::error::{ConciergeError, Result};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

pub const CONFIG_FILE: &str = "config.json";
pub const TOKENIZER_FILE: &str = "tokenizer.json";

/// Paths of everything needed to load a model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelFiles {
    pub config: PathBuf,
    pub tokenizer: PathBuf,
    /// Weight shards, sorted by file name.
    pub weights: Vec<PathBuf>,
}

/// Finds the model files in `dir`.
///
/// ## Errors
///
/// Returns `ConciergeError::ModelLoad` if the directory, `config.json`,
/// `tokenizer.json` or every safetensors shard is missing.
pub fn locate_model_files(dir: &Path) -> Result<ModelFiles> {
    let load_error = |reason: String| ConciergeError::ModelLoad {
        path: dir.display().to_string(),
        reason,
    };

    if !dir.is_dir() {
        return Err(load_error("directory not found".to_string()).into());
    }

    let config = dir.join(CONFIG_FILE);
    if !config.is_file() {
        return Err(load_error(format!("{CONFIG_FILE} not found")).into());
    }
    let tokenizer = dir.join(TOKENIZER_FILE);
    if !tokenizer.is_file() {
        return Err(load_error(format!("{TOKENIZER_FILE} not found")).into());
    }

    let weights: Vec<PathBuf> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "safetensors"))
        .collect();
    if weights.is_empty() {
        return Err(load_error("no *.safetensors weight files found".to_string()).into());
    }
    debug!("Found {} weight file(s) in {}", weights.len(), dir.display());

    Ok(ModelFiles {
        config,
        tokenizer,
        weights,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn model_dir_with(files: &[&str]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for name in files {
            fs::write(dir.path().join(name), "").unwrap();
        }
        dir
    }

    #[test]
    fn test_locate_complete_directory() {
        let dir = model_dir_with(&[
            CONFIG_FILE,
            TOKENIZER_FILE,
            "model-00002-of-00002.safetensors",
            "model-00001-of-00002.safetensors",
            "README.md",
        ]);
        let files = locate_model_files(dir.path()).unwrap();
        assert_eq!(files.config, dir.path().join(CONFIG_FILE));
        assert_eq!(files.tokenizer, dir.path().join(TOKENIZER_FILE));
        assert_eq!(
            files.weights,
            vec![
                dir.path().join("model-00001-of-00002.safetensors"),
                dir.path().join("model-00002-of-00002.safetensors"),
            ]
        );
    }

    #[test]
    fn test_missing_directory() {
        let err = locate_model_files(Path::new("/path/that/does/not/exist")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConciergeError>(),
            Some(ConciergeError::ModelLoad { .. })
        ));
    }

    #[test]
    fn test_missing_pieces() {
        let no_tokenizer = model_dir_with(&[CONFIG_FILE, "model.safetensors"]);
        let err = locate_model_files(no_tokenizer.path()).unwrap_err();
        assert!(err.to_string().contains("tokenizer.json not found"));

        let no_weights = model_dir_with(&[CONFIG_FILE, TOKENIZER_FILE]);
        let err = locate_model_files(no_weights.path()).unwrap_err();
        assert!(err.to_string().contains("no *.safetensors"));
    }
}
