use std::collections::HashMap;
use std::time::Instant;

use log::{debug, info};
use ndarray::Array4;
use ort::session::Session;
use ort::value::Tensor;

use super::acquire::RasterImage;
use super::error::ClassifierError;
use super::model::ModelHandle;
use super::result::{rank_categories, ClassificationResult};
use super::tensor::{image_to_tensor, TensorLayout};

/// Runs a classification model over a prepared image tensor.
///
/// Implementations must be usable from several threads at once: the
/// handle shares one backend across all concurrent calls.
pub trait ImageInference: Send + Sync {
    /// Layout of the tensor passed to [`ImageInference::run`]
    fn input_layout(&self) -> TensorLayout;

    /// Label for each output index, in model order
    fn labels(&self) -> &[String];

    /// Runs the model and returns one raw score per output index.
    fn run(&self, input: Array4<f32>) -> Result<Vec<f32>, ClassifierError>;
}

/// [`ImageInference`] backed by an ONNX Runtime session.
///
/// The model is expected to:
/// - take one rank-4 `f32` image input with 3 channels (NCHW or NHWC)
/// - produce a first output of shape `[1, num_labels]` (or anything that flattens to it)
#[derive(Debug)]
pub struct OnnxInference {
    session: Session,
    input_name: String,
    layout: TensorLayout,
    labels: Vec<String>,
}

impl OnnxInference {
    /// Wraps a session after checking it has the expected input/output structure.
    ///
    /// # Errors
    /// - `ModelLoad` if the model has no inputs or no outputs
    /// - `ModelLoad` if the first input is not a 3-channel rank-4 tensor
    /// - `ModelLoad` if the input declares a fixed size different from `input_size`
    pub fn new(
        session: Session,
        labels: Vec<String>,
        input_size: (u32, u32),
    ) -> Result<Self, ClassifierError> {
        let input = session
            .inputs
            .first()
            .ok_or_else(|| ClassifierError::ModelLoad("Model must have an image input".into()))?;
        if session.outputs.is_empty() {
            return Err(ClassifierError::ModelLoad(
                "Model must have at least 1 output for scores".into(),
            ));
        }

        let dimensions = input.input_type.tensor_dimensions().ok_or_else(|| {
            ClassifierError::ModelLoad(format!("Model input '{}' is not a tensor", input.name))
        })?;
        let layout = TensorLayout::from_input_shape(dimensions).ok_or_else(|| {
            ClassifierError::ModelLoad(format!(
                "Model input '{}' must be a rank-4 RGB image tensor, found shape {:?}",
                input.name, dimensions
            ))
        })?;
        if let Some(declared) = layout.spatial_size(dimensions) {
            if declared != input_size {
                return Err(ClassifierError::ModelLoad(format!(
                    "Model expects {}x{} input, configured for {}x{}",
                    declared.0, declared.1, input_size.0, input_size.1
                )));
            }
        }
        debug!("Model input '{}' uses {:?} layout", input.name, layout);
        let input_name = input.name.clone();

        Ok(Self {
            session,
            input_name,
            layout,
            labels,
        })
    }
}

impl ImageInference for OnnxInference {
    fn input_layout(&self) -> TensorLayout {
        self.layout
    }

    fn labels(&self) -> &[String] {
        &self.labels
    }

    fn run(&self, input: Array4<f32>) -> Result<Vec<f32>, ClassifierError> {
        let mut input_tensors = HashMap::new();
        input_tensors.insert(
            self.input_name.as_str(),
            Tensor::from_array(input).map_err(|e| {
                ClassifierError::Inference(format!("Failed to create input tensor: {}", e))
            })?,
        );

        let outputs = self
            .session
            .run(input_tensors)
            .map_err(|e| ClassifierError::Inference(format!("Failed to run model: {}", e)))?;
        let scores = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| {
                ClassifierError::Inference(format!("Failed to extract output tensor: {}", e))
            })?;

        Ok(scores.iter().cloned().collect())
    }
}

/// Runs one image through the model and returns its top category.
///
/// The image is re-oriented with the configured
/// [`OrientationHint`](super::normalize::OrientationHint) and turned into
/// a `[0, 1]` float tensor before the model runs. This hint is applied on
/// top of any EXIF rotation done by the normalizer.
///
/// # Errors
/// - `ModelLoad` if the handle has been closed
/// - `Inference` if the model fails
/// - `NoResult` if no category clears the score threshold
pub fn classify(
    image: &RasterImage,
    handle: &ModelHandle,
) -> Result<ClassificationResult, ClassifierError> {
    let options = handle.options();

    handle.with_backend(|backend| {
        let oriented = options.orientation_hint.apply(&image.pixels);
        let input = image_to_tensor(&oriented, options.input_size, backend.input_layout());

        let start = Instant::now();
        let scores = backend.run(input)?;
        let inference_time = start.elapsed();
        debug!("Inference time: {:.2?}", inference_time);

        let categories = rank_categories(&scores, backend.labels(), options);
        let top = categories.into_iter().next().ok_or_else(|| {
            info!("No category reached the {} score threshold", options.score_threshold);
            ClassifierError::NoResult
        })?;
        debug!("Top result: {} with confidence {:.1}%", top.label, top.score * 100.0);

        Ok(ClassificationResult {
            label: top.label,
            confidence: top.score,
            inference_time,
        })
    })
}
