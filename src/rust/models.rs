//! Models shipped alongside the application.

/// Static description of a bundled model's files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelInfo {
    pub name: String,
    pub model_file: String,
    pub labels_file: String,
    /// SHA-256 of the model file, when the build pins one
    pub model_hash: Option<String>,
}

/// What the model expects and produces
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelCharacteristics {
    pub input_width: u32,
    pub input_height: u32,
    pub num_labels: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BundledModel {
    /// Skin lesion classifier distinguishing cancerous from benign photos
    CancerClassification,
}

impl BundledModel {
    pub fn get_model_info(&self) -> ModelInfo {
        match self {
            BundledModel::CancerClassification => ModelInfo {
                name: "cancer_classification".to_string(),
                model_file: "cancer_classification.onnx".to_string(),
                labels_file: "cancer_classification.labels.txt".to_string(),
                model_hash: None,
            },
        }
    }

    pub fn characteristics(&self) -> ModelCharacteristics {
        match self {
            BundledModel::CancerClassification => ModelCharacteristics {
                input_width: 224,
                input_height: 224,
                num_labels: 2,
            },
        }
    }
}
