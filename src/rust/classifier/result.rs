use std::cmp::Ordering;
use std::time::Duration;

use super::error::ClassifierError;
use super::options::ClassifierOptions;
use super::tensor::softmax;

/// Prefix shared by every failure string handed back to the caller
pub const ERROR_PREFIX: &str = "Error in classification: ";

/// One scored label out of the model's output
#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub index: usize,
    pub label: String,
    pub score: f32,
}

/// The top category of a single classification call.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationResult {
    pub label: String,
    /// Score in [0, 1]
    pub confidence: f32,
    /// Wall-clock duration of the model invocation; diagnostic only
    pub inference_time: Duration,
}

impl ClassificationResult {
    /// Renders `"<label> <confidence * 100>%"` with one decimal, e.g. `benign 87.0%`
    pub fn display(&self) -> String {
        format_result(self)
    }
}

/// Turns raw model scores into the ranked list the model would report:
/// optional softmax, threshold filter, descending sort, truncation.
///
/// Ties keep model output order. Indices without a label are named by
/// their index.
pub fn rank_categories(
    scores: &[f32],
    labels: &[String],
    options: &ClassifierOptions,
) -> Vec<Category> {
    let scores = if options.apply_softmax {
        softmax(scores)
    } else {
        scores.to_vec()
    };

    let mut categories: Vec<Category> = scores
        .into_iter()
        .enumerate()
        .filter(|(_, score)| score.is_finite() && *score >= options.score_threshold)
        .map(|(index, score)| Category {
            index,
            label: labels.get(index).cloned().unwrap_or_else(|| index.to_string()),
            score,
        })
        .collect();

    categories.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    categories.truncate(options.max_results);
    categories
}

pub fn format_result(result: &ClassificationResult) -> String {
    format!("{} {:.1}%", result.label, result.confidence * 100.0)
}

pub fn format_error(error: &ClassifierError) -> String {
    format!("{}{}", ERROR_PREFIX, error.cause())
}
