use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::imaging::ImageTensor;

/// Graph operation names used when the models were frozen.
pub const INPUT_OPERATION: &str = "x";
pub const OUTPUT_OPERATION: &str = "Identity";

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("invalid model artifact: {0}")]
    Artifact(String),
    #[error("expected {expected} features, got {actual}")]
    Shape { expected: usize, actual: usize },
    #[error("label {0} is not known to the label encoder")]
    UnknownLabel(usize),
    #[error("model produced no output")]
    EmptyOutput,
    #[error("inference failed: {0}")]
    Backend(String),
    #[error("{0} cannot be loaded: built without tensorflow support")]
    Unsupported(String),
}

#[cfg(feature = "tensorflow")]
impl From<tensorflow::Status> for ModelError {
    fn from(status: tensorflow::Status) -> Self {
        ModelError::Backend(status.to_string())
    }
}

/// A pretrained model that maps one feature row to an output row.
pub trait Predictor: Send + Sync {
    fn predict(&self, features: &[f32]) -> Result<Vec<f32>, ModelError>;
}

/// A pretrained model that labels the contents of an image.
pub trait ImageClassifier: Send + Sync {
    fn classify(&self, image: &ImageTensor) -> Result<Vec<Detection>, ModelError>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub class: String,
    pub probability: f32,
}

/// Turns raw class scores into labelled detections, highest first. Scores
/// that round to zero at four decimals are dropped.
pub fn rank_detections(scores: &[f32], labels: &[String]) -> Vec<Detection> {
    let mut detections: Vec<Detection> = scores
        .iter()
        .enumerate()
        .filter(|(_, &prob)| (prob * 10000.0).round() > 0.0)
        .map(|(i, &prob)| Detection {
            class: labels
                .get(i)
                .cloned()
                .unwrap_or_else(|| "Unknown".to_string()),
            probability: (prob * 100.0 * 100.0).round() / 100.0,
        })
        .collect();

    detections.sort_by(|a, b| {
        b.probability
            .partial_cmp(&a.probability)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    detections
}

pub fn load_labels(labels_path: &Path) -> Result<Vec<String>, ModelError> {
    let labels = std::fs::read_to_string(labels_path)
        .map_err(|e| ModelError::Artifact(format!("{}: {}", labels_path.display(), e)))?
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect();
    Ok(labels)
}

#[cfg(feature = "tensorflow")]
pub fn load_predictor(model_path: &Path) -> Result<Arc<dyn Predictor>, ModelError> {
    Ok(Arc::new(graph::GraphModel::new(model_path)?))
}

#[cfg(not(feature = "tensorflow"))]
pub fn load_predictor(model_path: &Path) -> Result<Arc<dyn Predictor>, ModelError> {
    Err(ModelError::Unsupported(model_path.display().to_string()))
}

#[cfg(feature = "tensorflow")]
pub fn load_image_classifier(
    model_path: &Path,
    labels_path: &Path,
) -> Result<Arc<dyn ImageClassifier>, ModelError> {
    let model = graph::GraphModel::new(model_path)?;
    let labels = load_labels(labels_path)?;
    Ok(Arc::new(graph::GraphImageClassifier { model, labels }))
}

#[cfg(not(feature = "tensorflow"))]
pub fn load_image_classifier(
    model_path: &Path,
    _labels_path: &Path,
) -> Result<Arc<dyn ImageClassifier>, ModelError> {
    Err(ModelError::Unsupported(model_path.display().to_string()))
}

#[cfg(feature = "tensorflow")]
mod graph {
    use std::fs::File;
    use std::io::Read;
    use std::path::Path;

    use tensorflow::{Graph, ImportGraphDefOptions, Session, SessionOptions, SessionRunArgs, Tensor};

    use super::{
        rank_detections, Detection, ImageClassifier, ModelError, Predictor, INPUT_OPERATION,
        OUTPUT_OPERATION,
    };
    use crate::imaging::ImageTensor;

    /// A frozen TensorFlow graph with one input and one output operation.
    pub struct GraphModel {
        session: Session,
        graph: Graph,
    }

    impl GraphModel {
        pub fn new(model_path: &Path) -> Result<Self, ModelError> {
            let mut graph = Graph::new();
            let mut model_bytes = Vec::new();
            File::open(model_path)
                .and_then(|mut file| file.read_to_end(&mut model_bytes))
                .map_err(|e| ModelError::Artifact(format!("{}: {}", model_path.display(), e)))?;

            graph.import_graph_def(&model_bytes, &ImportGraphDefOptions::new())?;
            let session = Session::new(&SessionOptions::new(), &graph)?;

            Ok(GraphModel { session, graph })
        }

        pub fn run(&self, dims: &[u64], values: &[f32]) -> Result<Vec<f32>, ModelError> {
            let mut input_tensor = Tensor::<f32>::new(dims);
            if input_tensor.len() != values.len() {
                return Err(ModelError::Shape {
                    expected: input_tensor.len(),
                    actual: values.len(),
                });
            }
            input_tensor.copy_from_slice(values);

            let input_operation = self
                .graph
                .operation_by_name(INPUT_OPERATION)?
                .ok_or_else(|| ModelError::Artifact(format!("operation '{}' not found in graph", INPUT_OPERATION)))?;
            let output_operation = self
                .graph
                .operation_by_name(OUTPUT_OPERATION)?
                .ok_or_else(|| ModelError::Artifact(format!("operation '{}' not found in graph", OUTPUT_OPERATION)))?;

            let mut args = SessionRunArgs::new();
            args.add_feed(&input_operation, 0, &input_tensor);
            let output_token = args.request_fetch(&output_operation, 0);
            self.session.run(&mut args)?;

            let output_tensor: Tensor<f32> = args.fetch(output_token)?;
            Ok(output_tensor.to_vec())
        }
    }

    impl Predictor for GraphModel {
        fn predict(&self, features: &[f32]) -> Result<Vec<f32>, ModelError> {
            self.run(&[1, features.len() as u64], features)
        }
    }

    pub struct GraphImageClassifier {
        pub model: GraphModel,
        pub labels: Vec<String>,
    }

    impl ImageClassifier for GraphImageClassifier {
        fn classify(&self, image: &ImageTensor) -> Result<Vec<Detection>, ModelError> {
            let scores = self.model.run(&image.dims, &image.data)?;
            Ok(rank_detections(&scores, &self.labels))
        }
    }
}
