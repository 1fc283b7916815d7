use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use crate::model::{load_predictor, ModelError, Predictor};
use crate::scaler::{LabelEncoder, StandardScaler};

/// Percentages above this are reported as a diabetes risk.
pub const DIABETES_RISK_THRESHOLD: f64 = 18.0;

pub const PRONE_NOTE: &str = "The patient may be prone to diabetes. Please consult a doctor.";
pub const NOT_PRONE_NOTE: &str = "Patients may not be prone to diabetes.";

pub fn encode_gender(gender: &str) -> f64 {
    if gender.trim().eq_ignore_ascii_case("male") {
        1.0
    } else {
        0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmokingHistory {
    Never,
    Current,
    Former,
    Ever,
    NotCurrent,
}

impl SmokingHistory {
    pub fn code(self) -> f64 {
        match self {
            SmokingHistory::Never => 0.0,
            SmokingHistory::Current => 1.0,
            SmokingHistory::Former => 2.0,
            SmokingHistory::Ever => 3.0,
            SmokingHistory::NotCurrent => 4.0,
        }
    }
}

impl FromStr for SmokingHistory {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_lowercase().replace(['_', '-'], " ");
        match normalized.as_str() {
            // "No Info" rows were encoded together with "never" during training
            "never" | "no info" => Ok(SmokingHistory::Never),
            "current" => Ok(SmokingHistory::Current),
            "former" => Ok(SmokingHistory::Former),
            "ever" => Ok(SmokingHistory::Ever),
            "not current" => Ok(SmokingHistory::NotCurrent),
            _ => Err(format!(
                "unknown smoking_history {:?}, expected one of never, current, former, ever, not current",
                value
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DiabetesFeatures {
    pub gender: f64,
    pub age: f64,
    pub heart_disease: f64,
    pub smoking_history: SmokingHistory,
    pub bmi: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DiabetesAssessment {
    pub percentage: f64,
    pub note: &'static str,
}

impl DiabetesAssessment {
    pub fn from_probability(probability: f32) -> Self {
        let probability = f64::from(probability).clamp(0.0, 1.0);
        let percentage = round2(probability * 100.0);
        let note = if percentage > DIABETES_RISK_THRESHOLD {
            PRONE_NOTE
        } else {
            NOT_PRONE_NOTE
        };
        DiabetesAssessment { percentage, note }
    }
}

/// Diabetes risk classifier with its fitted scaler.
#[derive(Clone)]
pub struct DiabetesModel {
    pub scaler: StandardScaler,
    pub model: Arc<dyn Predictor>,
}

impl DiabetesModel {
    pub fn load(dir: &Path) -> Result<Self, ModelError> {
        Ok(DiabetesModel {
            scaler: StandardScaler::load(&dir.join("scaler.json"))?,
            model: load_predictor(&dir.join("diabetes_model.pb"))?,
        })
    }

    pub fn assess(&self, features: &DiabetesFeatures) -> Result<DiabetesAssessment, ModelError> {
        let row = [
            features.gender,
            features.age,
            features.heart_disease,
            features.smoking_history.code(),
            features.bmi,
        ];
        let scaled = self.scaler.transform(&row)?;
        let output = self.model.predict(&scaled)?;
        let probability = *output.first().ok_or(ModelError::EmptyOutput)?;
        if probability.is_nan() {
            return Err(ModelError::Backend("diabetes model returned NaN".into()));
        }
        Ok(DiabetesAssessment::from_probability(probability))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExerciseFeatures {
    pub gender: f64,
    pub age: f64,
    pub height: f64,
    pub diabetes: f64,
    pub bmi: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExercisePlan {
    pub calories_burned: f64,
    pub exercise_categories: Vec<String>,
    pub exercise_duration: f64,
}

/// Exercise regressor (calories, duration) and category classifier sharing
/// one scaler.
#[derive(Clone)]
pub struct ExerciseModel {
    pub scaler: StandardScaler,
    pub regressor: Arc<dyn Predictor>,
    pub classifier: Arc<dyn Predictor>,
    pub labels: LabelEncoder,
}

impl ExerciseModel {
    pub fn load(dir: &Path) -> Result<Self, ModelError> {
        Ok(ExerciseModel {
            scaler: StandardScaler::load(&dir.join("scaler.json"))?,
            regressor: load_predictor(&dir.join("regressor_model.pb"))?,
            classifier: load_predictor(&dir.join("classifier_model.pb"))?,
            labels: LabelEncoder::load(&dir.join("label_encoder.json"))?,
        })
    }

    pub fn recommend(&self, features: &ExerciseFeatures) -> Result<ExercisePlan, ModelError> {
        let row = [
            features.gender,
            features.age,
            features.height,
            features.diabetes,
            features.bmi,
        ];
        let scaled = self.scaler.transform(&row)?;

        let regression = self.regressor.predict(&scaled)?;
        let (calories_burned, duration) = match regression.as_slice() {
            [calories, duration, ..] => (f64::from(*calories), f64::from(*duration)),
            _ => return Err(ModelError::EmptyOutput),
        };

        let classification = self.classifier.predict(&scaled)?;
        let label = self.labels.inverse_transform(class_index(&classification)?)?;

        Ok(ExercisePlan {
            calories_burned,
            exercise_categories: split_categories(label),
            exercise_duration: round2(duration),
        })
    }
}

/// A single output is an encoded label, a longer one is a score per class.
fn class_index(output: &[f32]) -> Result<usize, ModelError> {
    match output {
        [] => Err(ModelError::EmptyOutput),
        [code] if code.is_finite() && *code >= 0.0 => Ok(code.round() as usize),
        [code] => Err(ModelError::Backend(format!("invalid class code {}", code))),
        scores => Ok(scores
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(i, _)| i)
            .unwrap_or(0)),
    }
}

/// Splits a label such as `"Walking or Yoga, Cycling."` into
/// `["Walking", "Yoga", "Cycling"]`.
pub fn split_categories(label: &str) -> Vec<String> {
    label
        .split(',')
        .flat_map(|part| {
            let words: Vec<&str> = part.split_whitespace().collect();
            words
                .split(|word| word.eq_ignore_ascii_case("or"))
                .map(|chunk| chunk.join(" "))
                .collect::<Vec<_>>()
        })
        .map(|category| capitalize(category.replace('.', "").trim()))
        .filter(|category| !category.is_empty())
        .collect()
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
