use serde::Serialize;

use crate::food::{DiabetesThresholds, NutritionRecord};
use crate::lookup::RawNutrition;
use crate::units::safe_convert;

/// Nutrient amounts per 100 g unless scaled.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NutrientValues {
    pub proteins: f64,
    pub calories: f64,
    pub carbohydrates: f64,
    pub fat: f64,
    pub sugar: f64,
}

impl NutrientValues {
    pub fn from_raw(raw: &RawNutrition) -> Self {
        NutrientValues {
            proteins: safe_convert(&raw.proteins, "g"),
            calories: safe_convert(&raw.calories, "kcal"),
            carbohydrates: safe_convert(&raw.carbohydrates, "g"),
            fat: safe_convert(&raw.fat, "g"),
            sugar: safe_convert(&raw.sugar, "g"),
        }
    }

    /// The nutrition table has no sugar column, so sugar is reported as zero.
    pub fn from_record(record: &NutritionRecord) -> Self {
        NutrientValues {
            proteins: record.proteins,
            calories: record.calories,
            carbohydrates: record.carbohydrate,
            fat: record.fat,
            sugar: 0.0,
        }
    }

    pub fn scaled(self, factor: f64) -> Self {
        NutrientValues {
            proteins: self.proteins * factor,
            calories: self.calories * factor,
            carbohydrates: self.carbohydrates * factor,
            fat: self.fat * factor,
            sugar: self.sugar * factor,
        }
    }

    fn is_empty(&self) -> bool {
        self.proteins == 0.0
            && self.calories == 0.0
            && self.carbohydrates == 0.0
            && self.fat == 0.0
            && self.sugar == 0.0
    }

    pub fn alert(&self, thresholds: &DiabetesThresholds) -> Alert {
        if self.is_empty() {
            Alert::NotFound
        } else if self.carbohydrates < thresholds.carbohydrate
            && self.calories < thresholds.calories
            && self.proteins < thresholds.protein
            && self.fat < thresholds.fat
        {
            Alert::Suitable
        } else {
            Alert::NotRecommended
        }
    }

    pub fn formatted(&self) -> NutritionInfo {
        NutritionInfo {
            proteins: format!("{:.2} g", self.proteins),
            calories: format!("{:.2} kcal", self.calories),
            carbohydrates: format!("{:.2} g", self.carbohydrates),
            fat: format!("{:.2} g", self.fat),
            sugar: format!("{:.2} g", self.sugar),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NutritionInfo {
    pub proteins: String,
    pub calories: String,
    pub carbohydrates: String,
    pub fat: String,
    pub sugar: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Alert {
    #[serde(rename = "Food not found")]
    NotFound,
    #[serde(rename = "Suitable for diabetes")]
    Suitable,
    #[serde(rename = "Not recommended for diabetes")]
    NotRecommended,
}

/// Factor that scales per-100 g values to `grams`; 1 when no volume is given.
pub fn volume_factor(grams: Option<f64>) -> f64 {
    grams.map_or(1.0, |grams| grams / 100.0)
}
