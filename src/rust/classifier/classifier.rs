use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use log::{debug, error};

use super::acquire::{acquire, ImageReference, MediaResolver};
use super::builder::ImageClassifierBuilder;
use super::error::ClassifierError;
use super::inference::classify;
use super::model::ModelHandle;
use super::normalize::normalize;
use super::result::{format_error, format_result, ClassificationResult};
use super::ClassifierInfo;
use crate::assets::AssetManager;
use crate::models::BundledModel;

/// Classifies user-picked photos with an on-device model.
///
/// Each call runs the same linear pipeline: acquire the image, scale it
/// to the model input size and rotate it upright, run the model, and keep
/// the best category. Calls are independent and may run concurrently
/// against the shared, read-only model.
///
/// ```no_run
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use asclepius::{ImageClassifierHelper, ImageReference};
///
/// let helper = ImageClassifierHelper::bundled()?;
/// let text = helper.classify_static_image(&ImageReference::new("file:///sdcard/DCIM/mole.jpg"));
/// println!("{}", text); // e.g. "Non Cancer 91.3%"
/// helper.close();
/// # Ok(())
/// # }
/// ```
pub struct ImageClassifierHelper {
    handle: ModelHandle,
    resolver: Box<dyn MediaResolver>,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<ImageClassifierHelper>();
    }
};

impl std::fmt::Debug for ImageClassifierHelper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageClassifierHelper")
            .field("handle", &self.handle)
            .finish_non_exhaustive()
    }
}

impl ImageClassifierHelper {
    /// Creates a new ImageClassifierBuilder for fluent construction
    pub fn builder() -> ImageClassifierBuilder {
        ImageClassifierBuilder::new()
    }

    /// Loads the bundled cancer classification model from the default assets directory.
    ///
    /// A `ModelLoad` error here means classification must not be offered.
    pub fn bundled() -> Result<Self, ClassifierError> {
        Self::builder()
            .with_bundled_model(BundledModel::CancerClassification, &AssetManager::new_default())?
            .build()
    }

    pub(crate) fn from_parts(handle: ModelHandle, resolver: Box<dyn MediaResolver>) -> Self {
        Self { handle, resolver }
    }

    /// Returns information about the classifier's current state
    pub fn info(&self) -> ClassifierInfo {
        ClassifierInfo {
            model_path: self.handle.model_path().map(|path| path.to_path_buf()),
            num_labels: self.handle.label_count(),
            options: self.handle.options().clone(),
            closed: self.handle.is_closed(),
        }
    }

    pub fn handle(&self) -> &ModelHandle {
        &self.handle
    }

    /// Runs the full pipeline and returns the typed top result.
    ///
    /// # Errors
    /// - `ImageAcquisition` if the reference cannot be opened or decoded
    /// - `ModelLoad` if the model has been closed
    /// - `Inference` if the model fails
    /// - `NoResult` if no category clears the score threshold
    pub fn classify_image(
        &self,
        reference: &ImageReference,
    ) -> Result<ClassificationResult, ClassifierError> {
        let raster = acquire(self.resolver.as_ref(), reference)?;
        let normalized = normalize(raster, self.handle.options().input_size);
        classify(&normalized, &self.handle)
    }

    /// Classifies the image and renders the outcome for display.
    ///
    /// Never fails: every error, including a panic inside the pipeline,
    /// comes back as `"Error in classification: <cause>"`.
    pub fn classify_static_image(&self, reference: &ImageReference) -> String {
        match catch_unwind(AssertUnwindSafe(|| self.classify_image(reference))) {
            Ok(Ok(result)) => {
                debug!("Classified {}: {}", reference, format_result(&result));
                format_result(&result)
            }
            Ok(Err(e)) => {
                if e.is_fatal() {
                    error!("Classification of {} failed: {}", reference, e);
                } else {
                    debug!("Classification of {} failed: {}", reference, e);
                }
                format_error(&e)
            }
            Err(panic) => {
                let cause = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unexpected failure".to_string());
                error!("Classification of {} panicked: {}", reference, cause);
                format_error(&ClassifierError::Inference(cause))
            }
        }
    }

    /// Runs [`classify_static_image`](Self::classify_static_image) on the
    /// blocking thread pool so interactive tasks are not held up.
    pub async fn classify_static_image_async(self: Arc<Self>, reference: ImageReference) -> String {
        tokio::task::spawn_blocking(move || self.classify_static_image(&reference))
            .await
            .unwrap_or_else(|e| format_error(&ClassifierError::Inference(e.to_string())))
    }

    /// Releases the model. Safe to call more than once.
    pub fn close(&self) -> bool {
        self.handle.close()
    }
}
