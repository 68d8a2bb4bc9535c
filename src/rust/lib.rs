//! On-device image classification for user-picked photos.
//!
//! A photo reference goes in, a display string comes out. In between the
//! image is decoded, scaled to the model input size, rotated upright from
//! its EXIF orientation and classified by a bundled ONNX model.
//!
//! # Basic Usage
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use asclepius::{AssetManager, BundledModel, ImageClassifierHelper, ImageReference};
//!
//! let helper = ImageClassifierHelper::builder()
//!     .with_bundled_model(BundledModel::CancerClassification, &AssetManager::new("assets"))?
//!     .build()?;
//!
//! let text = helper.classify_static_image(&ImageReference::new("photos/lesion.jpg"));
//! println!("{}", text);
//! helper.close();
//! # Ok(())
//! # }
//! ```
//!
//! # Thread Safety
//!
//! The helper is `Send + Sync`; share it with `Arc` and classify from as
//! many threads as needed. [`ImageClassifierHelper::classify_static_image_async`]
//! moves the work onto tokio's blocking pool.

pub mod assets;
pub mod classifier;
pub mod ffi;
pub mod models;
mod runtime;

pub use assets::{AssetError, AssetManager};
pub use classifier::{
    ClassificationResult, ClassifierError, ClassifierInfo, ClassifierOptions,
    ImageClassifierBuilder, ImageClassifierHelper, ImageInference, ImageReference,
    InMemoryResolver, MediaResolver, ModelHandle, OrientationHint, OrientationTag, RasterImage,
    TensorLayout,
};
pub use models::{BundledModel, ModelCharacteristics, ModelInfo};
pub use runtime::{create_session_builder, RuntimeConfig};

pub fn init_logger() {
    env_logger::init();
}
