use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::classifier::ClassifierError;
use crate::models::BundledModel;

/// Environment variable overriding where bundled assets are looked up
pub const ASSETS_ENV_VAR: &str = "ASCLEPIUS_ASSETS";

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("Asset not bundled: {0}")]
    NotBundled(String),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Hash mismatch: expected {expected}, got {actual} for {file}")]
    HashMismatch {
        file: String,
        expected: String,
        actual: String,
    },
    #[error("Label file {0} contains no labels")]
    EmptyLabels(String),
}

impl From<AssetError> for ClassifierError {
    fn from(err: AssetError) -> Self {
        ClassifierError::ModelLoad(err.to_string())
    }
}

/// Locates and checks the read-only files that ship with the application.
#[derive(Debug, Clone)]
pub struct AssetManager {
    assets_dir: PathBuf,
}

impl AssetManager {
    /// Creates an AssetManager for the default assets directory
    pub fn new_default() -> Self {
        Self::new(Self::get_default_assets_dir())
    }

    /// Returns the default assets directory path
    pub fn get_default_assets_dir() -> PathBuf {
        // 1. Check environment variable
        if let Ok(path) = env::var(ASSETS_ENV_VAR) {
            return PathBuf::from(path);
        }

        // 2. Assets next to the working directory (development checkout)
        let local = PathBuf::from("assets");
        if local.is_dir() {
            return local;
        }

        // 3. Platform-specific data directory
        if let Some(data_dir) = dirs::data_dir() {
            return data_dir.join("asclepius").join("assets");
        }

        // 4. Fallback to user's home directory
        if let Some(home_dir) = dirs::home_dir() {
            return home_dir.join(".local").join("share").join("asclepius").join("assets");
        }

        env::temp_dir().join("asclepius").join("assets")
    }

    pub fn new<P: AsRef<Path>>(assets_dir: P) -> Self {
        Self {
            assets_dir: assets_dir.as_ref().to_path_buf(),
        }
    }

    pub fn assets_dir(&self) -> &Path {
        &self.assets_dir
    }

    pub fn get_model_path(&self, model: BundledModel) -> PathBuf {
        self.assets_dir.join(model.get_model_info().model_file)
    }

    pub fn get_labels_path(&self, model: BundledModel) -> PathBuf {
        self.assets_dir.join(model.get_model_info().labels_file)
    }

    pub fn is_model_bundled(&self, model: BundledModel) -> bool {
        let model_path = self.get_model_path(model);
        let labels_path = self.get_labels_path(model);
        log::debug!("Checking bundled model:");
        log::debug!("  Model path: {:?} (exists: {})", model_path, model_path.exists());
        log::debug!("  Labels path: {:?} (exists: {})", labels_path, labels_path.exists());
        model_path.exists() && labels_path.exists()
    }

    /// Checks the model file against its pinned digest.
    ///
    /// Returns `Ok(false)` when the file is missing or the digest differs.
    /// Models without a pinned digest only need to exist.
    pub fn verify_model(&self, model: BundledModel) -> Result<bool, AssetError> {
        let info = model.get_model_info();
        let model_path = self.get_model_path(model);
        if !model_path.exists() {
            return Ok(false);
        }
        match info.model_hash {
            Some(expected) => Ok(file_sha256(&model_path)? == expected),
            None => Ok(true),
        }
    }

    pub fn load_labels(&self, model: BundledModel) -> Result<Vec<String>, AssetError> {
        load_labels(&self.get_labels_path(model))
    }
}

/// Fails with `HashMismatch` unless the file's digest equals `expected_hash`
pub fn ensure_hash(path: &Path, expected_hash: &str) -> Result<(), AssetError> {
    let actual = file_sha256(path)?;
    if actual != expected_hash {
        log::error!("Hash mismatch for {:?}", path);
        return Err(AssetError::HashMismatch {
            file: path.display().to_string(),
            expected: expected_hash.to_string(),
            actual,
        });
    }
    Ok(())
}

pub(crate) fn file_sha256(path: &Path) -> Result<String, AssetError> {
    let bytes = fs::read(path)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    let hash = format!("{:x}", hasher.finalize());
    log::debug!("Calculated hash for {:?}: {}", path, hash);
    Ok(hash)
}

/// Reads a label file: one label per line, blank lines ignored.
pub fn load_labels(path: &Path) -> Result<Vec<String>, AssetError> {
    if !path.exists() {
        return Err(AssetError::NotBundled(path.display().to_string()));
    }
    let labels = parse_labels(&fs::read_to_string(path)?);
    if labels.is_empty() {
        return Err(AssetError::EmptyLabels(path.display().to_string()));
    }
    Ok(labels)
}

pub fn parse_labels(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
