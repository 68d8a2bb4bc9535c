use ort::Error as OrtError;
use image::ImageError;

/// Represents the different types of errors that can occur while classifying an image.
#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    /// The model file is missing, corrupted or could not be turned into a session.
    /// Fatal: a pipeline without a model must not offer classification.
    #[error("Model load error: {0}")]
    ModelLoad(String),
    /// The image reference could not be resolved or its bytes could not be decoded
    #[error("Image acquisition error: {0}")]
    ImageAcquisition(String),
    /// No candidate cleared the confidence threshold
    #[error("No results")]
    NoResult,
    /// Error occurred while preparing pixels for the model
    #[error("Normalization error: {0}")]
    Normalization(String),
    /// Error occurred while running the model or reading its output
    #[error("Inference error: {0}")]
    Inference(String),
    /// Error occurred during the build phase
    #[error("Build error: {0}")]
    BuildError(String),
    /// Error occurred due to invalid input parameters
    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl ClassifierError {
    /// Human readable cause, without the variant prefix.
    ///
    /// This is what ends up after `Error in classification: ` in the display string.
    pub fn cause(&self) -> String {
        match self {
            Self::ModelLoad(msg)
            | Self::ImageAcquisition(msg)
            | Self::Normalization(msg)
            | Self::Inference(msg)
            | Self::BuildError(msg)
            | Self::ValidationError(msg) => msg.clone(),
            Self::NoResult => "No results".to_string(),
        }
    }

    /// True for failures that make the whole pipeline unusable.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::ModelLoad(_))
    }
}

impl From<OrtError> for ClassifierError {
    fn from(err: OrtError) -> Self {
        ClassifierError::Inference(err.to_string())
    }
}

impl From<ImageError> for ClassifierError {
    fn from(err: ImageError) -> Self {
        ClassifierError::ImageAcquisition(err.to_string())
    }
}
