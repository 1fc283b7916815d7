use std::path::Path;

use serde::Deserialize;

use crate::model::ModelError;

/// Fitted standardization parameters exported as `{"mean": [..], "scale": [..]}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let scaler: StandardScaler = read_json(path)?;
        if scaler.mean.len() != scaler.scale.len() {
            return Err(ModelError::Artifact(format!(
                "{}: mean has {} entries but scale has {}",
                path.display(),
                scaler.mean.len(),
                scaler.scale.len()
            )));
        }
        Ok(scaler)
    }

    pub fn transform(&self, features: &[f64]) -> Result<Vec<f32>, ModelError> {
        if features.len() != self.mean.len() {
            return Err(ModelError::Shape {
                expected: self.mean.len(),
                actual: features.len(),
            });
        }

        Ok(features
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (mean, scale))| {
                // zero-variance columns are only centered
                let scale = if *scale == 0.0 { 1.0 } else { *scale };
                ((x - mean) / scale) as f32
            })
            .collect())
    }
}

/// Class names in encoded order, exported as `{"classes": [..]}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LabelEncoder {
    pub classes: Vec<String>,
}

impl LabelEncoder {
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        read_json(path)
    }

    pub fn inverse_transform(&self, code: usize) -> Result<&str, ModelError> {
        self.classes
            .get(code)
            .map(String::as_str)
            .ok_or(ModelError::UnknownLabel(code))
    }
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, ModelError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| ModelError::Artifact(format!("{}: {}", path.display(), e)))?;
    serde_json::from_str(&raw).map_err(|e| ModelError::Artifact(format!("{}: {}", path.display(), e)))
}
