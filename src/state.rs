use std::sync::Arc;

use reqwest::Client;

use crate::config::Config;
use crate::food::FoodData;
use crate::inference::{DiabetesModel, ExerciseModel};
use crate::lookup::{NutritionLookup, SearchScraper};
use crate::model::{load_image_classifier, ImageClassifier, ModelError};

/// Everything a request handler may read. Built once before serving and
/// shared read-only.
#[derive(Clone)]
pub struct AppState {
    pub diabetes: DiabetesModel,
    pub exercise: ExerciseModel,
    pub food_classifier: Arc<dyn ImageClassifier>,
    /// `None` when the datasets were missing at startup.
    pub food_data: Option<Arc<FoodData>>,
    pub nutrition_lookup: Arc<dyn NutritionLookup>,
    pub http: Client,
    /// Largest image `/scan-food` will download.
    pub image_limit_bytes: usize,
}

impl AppState {
    pub fn load(config: &Config, http: Client) -> Result<Self, ModelError> {
        let model_dir = &config.model_dir;

        let diabetes = DiabetesModel::load(&model_dir.join("diabetes"))?;
        let exercise = ExerciseModel::load(&model_dir.join("exercise"))?;
        let food_classifier = load_image_classifier(
            &model_dir.join("food_classification/model.pb"),
            &model_dir.join("food_classification/class_list.txt"),
        )?;
        tracing::info!(dir = %model_dir.display(), "loaded model artifacts");

        let food_data = match FoodData::load(&config.data_dir) {
            Ok(data) => {
                tracing::info!(
                    foods = data.foods.len(),
                    thresholds = ?data.thresholds,
                    "loaded food datasets"
                );
                Some(Arc::new(data))
            }
            Err(err) => {
                tracing::warn!(error = %err, "food datasets unavailable, food endpoints will fail");
                None
            }
        };

        let nutrition_lookup = Arc::new(SearchScraper::new(http.clone(), config.search_url.clone()));

        Ok(AppState {
            diabetes,
            exercise,
            food_classifier,
            food_data,
            nutrition_lookup,
            http,
            image_limit_bytes: config.image_limit_bytes,
        })
    }
}
