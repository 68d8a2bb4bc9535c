use serde::{Deserialize, Serialize};

use super::error::ClassifierError;
use super::normalize::OrientationHint;

/// Default minimum score a category needs to be reported
pub const DEFAULT_SCORE_THRESHOLD: f32 = 0.2;
/// Default number of categories kept after ranking
pub const DEFAULT_MAX_RESULTS: usize = 3;
/// Default number of intra-op threads used by the inference engine
pub const DEFAULT_NUM_THREADS: usize = 4;
/// Fixed input edge of the bundled model
pub const DEFAULT_INPUT_SIZE: u32 = 224;

/// Inference parameters fixed at model load time.
///
/// The defaults are the values the application ships with; they are not
/// exposed to the end user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierOptions {
    /// Minimum score (inclusive) a category must reach to be returned
    pub score_threshold: f32,
    /// Maximum number of categories returned by a single inference
    pub max_results: usize,
    /// Threads the inference engine may use for one call
    pub num_threads: usize,
    /// Width and height the image is scaled to before inference
    pub input_size: (u32, u32),
    /// Orientation applied to the pixels right before the model runs
    pub orientation_hint: OrientationHint,
    /// Run a softmax over raw model output before thresholding.
    /// Leave off for models that already end in a softmax layer.
    pub apply_softmax: bool,
}

impl Default for ClassifierOptions {
    fn default() -> Self {
        Self {
            score_threshold: DEFAULT_SCORE_THRESHOLD,
            max_results: DEFAULT_MAX_RESULTS,
            num_threads: DEFAULT_NUM_THREADS,
            input_size: (DEFAULT_INPUT_SIZE, DEFAULT_INPUT_SIZE),
            orientation_hint: OrientationHint::RightTop,
            apply_softmax: false,
        }
    }
}

impl ClassifierOptions {
    pub fn with_score_threshold(mut self, threshold: f32) -> Self {
        self.score_threshold = threshold;
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn with_num_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = num_threads;
        self
    }

    pub fn with_input_size(mut self, width: u32, height: u32) -> Self {
        self.input_size = (width, height);
        self
    }

    pub fn with_orientation_hint(mut self, hint: OrientationHint) -> Self {
        self.orientation_hint = hint;
        self
    }

    pub fn with_softmax(mut self, apply_softmax: bool) -> Self {
        self.apply_softmax = apply_softmax;
        self
    }

    /// Checks that the options describe a usable configuration
    pub fn validate(&self) -> Result<(), ClassifierError> {
        if !(0.0..=1.0).contains(&self.score_threshold) {
            return Err(ClassifierError::ValidationError(format!(
                "Score threshold must be within [0, 1], got {}",
                self.score_threshold
            )));
        }
        if self.max_results == 0 {
            return Err(ClassifierError::ValidationError(
                "Max results must be at least 1".into(),
            ));
        }
        if self.num_threads == 0 {
            return Err(ClassifierError::ValidationError(
                "Thread count must be at least 1".into(),
            ));
        }
        if self.input_size.0 == 0 || self.input_size.1 == 0 {
            return Err(ClassifierError::ValidationError(format!(
                "Input size must be non-zero, got {}x{}",
                self.input_size.0, self.input_size.1
            )));
        }
        Ok(())
    }
}
