pub mod acquire;
pub mod builder;
mod classifier;
mod error;
pub mod inference;
mod model;
pub mod normalize;
pub mod options;
pub mod result;
pub mod tensor;

pub use acquire::{
    acquire, FileSystemResolver, ImageReference, InMemoryResolver, MediaResolver, RasterImage,
};
pub use builder::ImageClassifierBuilder;
pub use classifier::ImageClassifierHelper;
pub use error::ClassifierError;
pub use inference::{classify, ImageInference, OnnxInference};
pub use model::ModelHandle;
pub use normalize::{normalize, read_orientation, OrientationHint, OrientationTag};
pub use options::ClassifierOptions;
pub use result::{format_error, format_result, Category, ClassificationResult, ERROR_PREFIX};
pub use tensor::TensorLayout;

use std::path::PathBuf;

/// Information about the current state and configuration of a classifier
#[derive(Debug, Clone)]
pub struct ClassifierInfo {
    /// Path to the ONNX model file, `None` for custom backends
    pub model_path: Option<PathBuf>,
    /// Number of labels the model can report
    pub num_labels: usize,
    /// Options the model was loaded with
    pub options: ClassifierOptions,
    /// Whether the model has been released
    pub closed: bool,
}
