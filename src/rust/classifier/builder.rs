use std::path::{Path, PathBuf};

use log::{error, info};

use super::acquire::{FileSystemResolver, MediaResolver};
use super::classifier::ImageClassifierHelper;
use super::error::ClassifierError;
use super::inference::ImageInference;
use super::model::ModelHandle;
use super::options::ClassifierOptions;
use crate::assets::{ensure_hash, load_labels, AssetManager};
use crate::models::{BundledModel, ModelCharacteristics};
use crate::runtime::RuntimeConfig;

/// A builder for constructing an [`ImageClassifierHelper`] with a fluent interface.
///
/// Exactly one model source must be chosen: a bundled model, a custom
/// model file, or a ready-made [`ImageInference`] backend.
pub struct ImageClassifierBuilder {
    model_path: Option<PathBuf>,
    model_hash: Option<String>,
    labels: Option<Vec<String>>,
    characteristics: Option<ModelCharacteristics>,
    backend: Option<Box<dyn ImageInference>>,
    resolver: Option<Box<dyn MediaResolver>>,
    options: ClassifierOptions,
    runtime_config: RuntimeConfig,
}

impl std::fmt::Debug for ImageClassifierBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageClassifierBuilder")
            .field("model_path", &self.model_path)
            .field("model_hash", &self.model_hash)
            .field("labels", &self.labels)
            .field("has_backend", &self.backend.is_some())
            .field("options", &self.options)
            .field("runtime_config", &self.runtime_config)
            .finish()
    }
}

impl Default for ImageClassifierBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageClassifierBuilder {
    /// Creates a new empty builder with the shipped default configuration
    ///
    /// # Example
    /// ```
    /// use asclepius::ImageClassifierBuilder;
    ///
    /// let builder = ImageClassifierBuilder::new();
    /// ```
    pub fn new() -> Self {
        Self {
            model_path: None,
            model_hash: None,
            labels: None,
            characteristics: None,
            backend: None,
            resolver: None,
            options: ClassifierOptions::default(),
            runtime_config: RuntimeConfig::default(),
        }
    }

    /// Sets the runtime configuration for ONNX model execution.
    ///
    /// The intra-op thread count is always taken from
    /// [`ClassifierOptions::num_threads`].
    pub fn with_runtime_config(mut self, config: RuntimeConfig) -> Self {
        self.runtime_config = config;
        self
    }

    pub fn with_options(mut self, options: ClassifierOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets how image references are opened. Defaults to [`FileSystemResolver`].
    pub fn with_resolver(mut self, resolver: impl MediaResolver + 'static) -> Self {
        self.resolver = Some(Box::new(resolver));
        self
    }

    fn ensure_model_unset(&self) -> Result<(), ClassifierError> {
        if self.model_path.is_some() || self.backend.is_some() {
            return Err(ClassifierError::BuildError("Model already set".to_string()));
        }
        Ok(())
    }

    /// Uses a model bundled in the assets directory
    ///
    /// # Errors
    /// - `BuildError` if a model was already set
    /// - `ModelLoad` if the model or its labels are not bundled, the model
    ///   fails its integrity check, or the label count is not the model's
    pub fn with_bundled_model(
        mut self,
        model: BundledModel,
        assets: &AssetManager,
    ) -> Result<Self, ClassifierError> {
        self.ensure_model_unset()?;

        if !assets.is_model_bundled(model) {
            error!("Model '{:?}' is not bundled in {:?}", model, assets.assets_dir());
            return Err(ClassifierError::ModelLoad(format!(
                "Model '{:?}' not found in {}",
                model,
                assets.assets_dir().display()
            )));
        }
        if !assets.verify_model(model)? {
            error!("Model '{:?}' failed verification", model);
            return Err(ClassifierError::ModelLoad(format!(
                "Model '{:?}' failed integrity check",
                model
            )));
        }

        let characteristics = model.characteristics();
        let labels = assets.load_labels(model)?;
        if labels.len() != characteristics.num_labels {
            return Err(ClassifierError::ModelLoad(format!(
                "Model '{:?}' reports {} labels, label file has {}",
                model,
                characteristics.num_labels,
                labels.len()
            )));
        }
        info!("Loaded {} labels for {:?}", labels.len(), model);

        self.model_path = Some(assets.get_model_path(model));
        self.labels = Some(labels);
        self.characteristics = Some(characteristics);
        Ok(self)
    }

    /// Uses a model file and label file outside the assets directory
    ///
    /// # Errors
    /// - `BuildError` if either path is empty or a model was already set
    /// - `ModelLoad` if the files do not exist or the label file is empty
    pub fn with_custom_model(
        mut self,
        model_path: impl AsRef<Path>,
        labels_path: impl AsRef<Path>,
    ) -> Result<Self, ClassifierError> {
        let (model_path, labels_path) = (model_path.as_ref(), labels_path.as_ref());
        if model_path.as_os_str().is_empty() || labels_path.as_os_str().is_empty() {
            return Err(ClassifierError::BuildError(
                "Model and label paths cannot be empty".to_string(),
            ));
        }
        self.ensure_model_unset()?;

        if !model_path.exists() {
            return Err(ClassifierError::ModelLoad(format!(
                "Model file not found: {}",
                model_path.display()
            )));
        }
        let labels = load_labels(labels_path)?;

        self.model_path = Some(model_path.to_path_buf());
        self.labels = Some(labels);
        Ok(self)
    }

    /// Pins the SHA-256 digest (lowercase hex) the model file must have.
    /// Checked by [`build`](Self::build) before the model is loaded.
    pub fn with_model_hash(mut self, expected: impl Into<String>) -> Self {
        self.model_hash = Some(expected.into());
        self
    }

    /// Uses a ready-made inference backend instead of an ONNX file
    pub fn with_backend(
        mut self,
        backend: impl ImageInference + 'static,
    ) -> Result<Self, ClassifierError> {
        self.ensure_model_unset()?;
        self.backend = Some(Box::new(backend));
        Ok(self)
    }

    /// Loads the model and returns the classifier
    ///
    /// # Errors
    /// - `BuildError` if no model was set
    /// - `BuildError` if a digest is pinned for a custom backend
    /// - `ValidationError` if the options are invalid or the input size
    ///   differs from the bundled model's
    /// - `ModelLoad` if the digest differs or the model cannot be loaded
    pub fn build(self) -> Result<ImageClassifierHelper, ClassifierError> {
        self.options.validate()?;
        if let Some(characteristics) = &self.characteristics {
            let expected = (characteristics.input_width, characteristics.input_height);
            if self.options.input_size != expected {
                return Err(ClassifierError::ValidationError(format!(
                    "Bundled model takes {}x{} input, configured for {}x{}",
                    expected.0, expected.1, self.options.input_size.0, self.options.input_size.1
                )));
            }
        }
        if self.backend.is_some() && self.model_hash.is_some() {
            return Err(ClassifierError::BuildError(
                "A model hash can only be pinned for a model file".to_string(),
            ));
        }

        let handle = match (self.backend, self.model_path) {
            (Some(backend), _) => ModelHandle::from_backend(backend, self.options)?,
            (None, Some(model_path)) => {
                if let Some(expected) = &self.model_hash {
                    ensure_hash(&model_path, expected)?;
                }
                let labels = self
                    .labels
                    .ok_or_else(|| ClassifierError::BuildError("Labels not loaded".into()))?;
                let runtime_config = RuntimeConfig {
                    intra_threads: self.options.num_threads,
                    ..self.runtime_config
                };
                ModelHandle::load(&model_path, labels, self.options, &runtime_config)?
            }
            (None, None) => {
                return Err(ClassifierError::BuildError("A model must be set".to_string()));
            }
        };

        let resolver = self
            .resolver
            .unwrap_or_else(|| Box::new(FileSystemResolver) as Box<dyn MediaResolver>);
        Ok(ImageClassifierHelper::from_parts(handle, resolver))
    }
}
