use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use log::{error, info};

use super::error::ClassifierError;
use super::inference::{ImageInference, OnnxInference};
use super::options::ClassifierOptions;
use crate::runtime::{create_session_builder, ensure_initialized, RuntimeConfig};

/// The loaded model together with the fixed options it was loaded with.
///
/// Created once and shared (read-only) by every classification call.
/// [`ModelHandle::close`] releases the inference resources; it is
/// idempotent and also happens on drop. Any call after `close` fails with
/// `ModelLoad`.
pub struct ModelHandle {
    backend: RwLock<Option<Box<dyn ImageInference>>>,
    options: ClassifierOptions,
    model_path: Option<PathBuf>,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<ModelHandle>();
    }
};

impl std::fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelHandle")
            .field("model_path", &self.model_path)
            .field("options", &self.options)
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl ModelHandle {
    /// Loads an ONNX model file into an inference-ready handle.
    ///
    /// # Errors
    /// - `ValidationError` if `options` are invalid
    /// - `ModelLoad` if the file is missing, the label list is empty, the
    ///   ONNX Runtime environment failed to start, ONNX Runtime rejects the
    ///   file or the model has the wrong structure
    pub fn load(
        model_path: &Path,
        labels: Vec<String>,
        options: ClassifierOptions,
        runtime_config: &RuntimeConfig,
    ) -> Result<Self, ClassifierError> {
        options.validate()?;
        if !model_path.exists() {
            error!("Model file not found: {:?}", model_path);
            return Err(ClassifierError::ModelLoad(format!(
                "Model file not found: {}",
                model_path.display()
            )));
        }
        if labels.is_empty() {
            return Err(ClassifierError::ModelLoad("Model has no labels".into()));
        }
        require_runtime(ensure_initialized())?;

        let session = create_session_builder(runtime_config)
            .and_then(|builder| builder.commit_from_file(model_path))
            .map_err(|e| {
                error!("Model loading failed: {}", e);
                ClassifierError::ModelLoad(format!("Cannot load {}: {}", model_path.display(), e))
            })?;

        let backend = OnnxInference::new(session, labels, options.input_size)?;
        info!("Model loaded from {:?}", model_path);

        Ok(Self {
            backend: RwLock::new(Some(Box::new(backend))),
            options,
            model_path: Some(model_path.to_path_buf()),
        })
    }

    /// Wraps an already constructed inference backend
    pub fn from_backend(
        backend: Box<dyn ImageInference>,
        options: ClassifierOptions,
    ) -> Result<Self, ClassifierError> {
        options.validate()?;
        Ok(Self {
            backend: RwLock::new(Some(backend)),
            options,
            model_path: None,
        })
    }

    pub fn options(&self) -> &ClassifierOptions {
        &self.options
    }

    pub fn model_path(&self) -> Option<&Path> {
        self.model_path.as_deref()
    }

    pub fn is_closed(&self) -> bool {
        self.backend
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    /// Number of labels the model reports, 0 once closed
    pub fn label_count(&self) -> usize {
        self.backend
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map_or(0, |backend| backend.labels().len())
    }

    /// Releases the model. Returns `true` if this call released it,
    /// `false` if it was already closed.
    pub fn close(&self) -> bool {
        let released = self
            .backend
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if released.is_some() {
            info!("Model released");
        }
        released.is_some()
    }

    /// Runs `f` with the backend, holding a shared lock so `close` waits
    /// for in-flight calls.
    pub(crate) fn with_backend<T>(
        &self,
        f: impl FnOnce(&dyn ImageInference) -> Result<T, ClassifierError>,
    ) -> Result<T, ClassifierError> {
        let guard = self.backend.read().unwrap_or_else(PoisonError::into_inner);
        let backend = guard
            .as_deref()
            .ok_or_else(|| ClassifierError::ModelLoad("Model is not initialized".into()))?;
        f(backend)
    }
}

fn require_runtime(status: Result<(), String>) -> Result<(), ClassifierError> {
    status.map_err(|e| {
        error!("ONNX Runtime environment unavailable: {}", e);
        ClassifierError::ModelLoad(format!("ONNX Runtime environment unavailable: {}", e))
    })
}
