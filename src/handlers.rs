use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::AppError;
use crate::food::{
    filter_food, generate_combinations, FoodData, NutritionRecord, DEFAULT_COMBINATIONS,
    DEFAULT_ITEMS_PER_COMBINATION,
};
use crate::imaging::{fetch_image, preprocess_image};
use crate::inference::{encode_gender, DiabetesFeatures, ExerciseFeatures, SmokingHistory};
use crate::model::Detection;
use crate::nutrition::{volume_factor, Alert, NutrientValues, NutritionInfo};
use crate::state::AppState;
use crate::units::convert_weight_to_grams;

type SharedState = Arc<AppState>;

/// Diabetes percentage from which food recommendations switch to the
/// diabetic menu.
pub const DIABETIC_MENU_THRESHOLD: f64 = 0.18;

pub fn router(state: AppState, body_limit_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
        .route("/diabetes_predict", post(diabetes_predict))
        .route("/exercise_recommendation", post(exercise_recommendation))
        .route("/food_recommendation", post(food_recommendation))
        .route("/scan-food", post(scan_food))
        .route("/food_nutritions", post(food_nutritions))
        .layer(DefaultBodyLimit::max(body_limit_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

fn required<T>(value: Option<T>, name: &'static str) -> Result<T, AppError> {
    value.ok_or(AppError::MissingField(name))
}

fn required_text(value: Option<String>, name: &'static str) -> Result<String, AppError> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .ok_or(AppError::MissingField(name))
}

async fn index() -> &'static str {
    "health service is running"
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "OK" }))
}

#[derive(Debug, Deserialize)]
pub struct DiabetesRequest {
    pub gender: Option<String>,
    pub age: Option<f64>,
    pub heart_disease: Option<f64>,
    pub smoking_history: Option<String>,
    pub bmi: Option<f64>,
}

impl DiabetesRequest {
    pub fn validate(self) -> Result<DiabetesFeatures, AppError> {
        let gender = required_text(self.gender, "gender")?;
        let age = required(self.age, "age")?;
        let heart_disease = required(self.heart_disease, "heart_disease")?;
        let smoking_history = required_text(self.smoking_history, "smoking_history")?
            .parse::<SmokingHistory>()
            .map_err(AppError::BadRequest)?;
        let bmi = required(self.bmi, "bmi")?;

        Ok(DiabetesFeatures {
            gender: encode_gender(&gender),
            age,
            heart_disease,
            smoking_history,
            bmi,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct DiabetesResponse {
    pub percentage: f64,
    pub note: &'static str,
}

async fn diabetes_predict(
    State(state): State<SharedState>,
    payload: Result<Json<DiabetesRequest>, JsonRejection>,
) -> Result<Json<DiabetesResponse>, AppError> {
    let Json(request) = payload?;
    let features = request.validate()?;

    let assessment = state.diabetes.assess(&features)?;
    tracing::debug!(percentage = assessment.percentage, "diabetes prediction");

    Ok(Json(DiabetesResponse {
        percentage: assessment.percentage,
        note: assessment.note,
    }))
}

#[derive(Debug, Deserialize)]
pub struct ExerciseRequest {
    pub gender: Option<String>,
    pub age: Option<f64>,
    pub height: Option<f64>,
    pub diabetes: Option<f64>,
    pub bmi: Option<f64>,
}

impl ExerciseRequest {
    pub fn validate(self) -> Result<ExerciseFeatures, AppError> {
        Ok(ExerciseFeatures {
            gender: encode_gender(&required_text(self.gender, "gender")?),
            age: required(self.age, "age")?,
            height: required(self.height, "height")?,
            diabetes: required(self.diabetes, "diabetes")?,
            bmi: required(self.bmi, "bmi")?,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct ExerciseResponse {
    pub calories_burned: f64,
    pub exercise_categories: Vec<String>,
    pub exercise_duration: f64,
}

async fn exercise_recommendation(
    State(state): State<SharedState>,
    payload: Result<Json<ExerciseRequest>, JsonRejection>,
) -> Result<Json<ExerciseResponse>, AppError> {
    let Json(request) = payload?;
    let features = request.validate()?;

    let plan = state.exercise.recommend(&features)?;

    Ok(Json(ExerciseResponse {
        calories_burned: plan.calories_burned,
        exercise_categories: plan.exercise_categories,
        exercise_duration: plan.exercise_duration,
    }))
}

#[derive(Debug, Deserialize)]
pub struct FoodRecommendationRequest {
    pub diabetes_percentage: Option<Value>,
}

impl FoodRecommendationRequest {
    /// Accepts a JSON number or a numeric string.
    pub fn validate(self) -> Result<f64, AppError> {
        let not_numeric =
            || AppError::BadRequest("The 'diabetes_percentage' field must be a numeric value".into());

        match self.diabetes_percentage {
            None | Some(Value::Null) => Err(AppError::MissingField("diabetes_percentage")),
            Some(Value::Number(number)) => number.as_f64().ok_or_else(not_numeric),
            Some(Value::String(text)) => text
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|value| value.is_finite())
                .ok_or_else(not_numeric),
            Some(_) => Err(not_numeric()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FoodRecommendationResponse {
    pub diabetes: bool,
    pub food_recommendation: Vec<Vec<NutritionRecord>>,
}

fn recommend_foods(data: &FoodData, diabetic: bool) -> Vec<Vec<NutritionRecord>> {
    let mut rng = rand::thread_rng();
    if diabetic {
        let suitable = filter_food(&data.foods, &data.thresholds.ceilings());
        generate_combinations(&suitable, DEFAULT_COMBINATIONS, DEFAULT_ITEMS_PER_COMBINATION, &mut rng)
    } else {
        generate_combinations(&data.foods, DEFAULT_COMBINATIONS, DEFAULT_ITEMS_PER_COMBINATION, &mut rng)
    }
}

async fn food_recommendation(
    State(state): State<SharedState>,
    payload: Result<Json<FoodRecommendationRequest>, JsonRejection>,
) -> Result<Json<FoodRecommendationResponse>, AppError> {
    let Json(request) = payload?;
    let percentage = request.validate()?;
    let diabetic = percentage / 100.0 >= DIABETIC_MENU_THRESHOLD;

    let data = state.food_data.as_deref().ok_or(AppError::DataUnavailable)?;

    Ok(Json(FoodRecommendationResponse {
        diabetes: diabetic,
        food_recommendation: recommend_foods(data, diabetic),
    }))
}

#[derive(Debug, Deserialize)]
pub struct ScanFoodRequest {
    pub image: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ScanFoodResponse {
    pub objects: Vec<Detection>,
}

async fn scan_food(
    State(state): State<SharedState>,
    payload: Result<Json<ScanFoodRequest>, JsonRejection>,
) -> Result<Json<ScanFoodResponse>, AppError> {
    let Json(request) = payload?;
    let url = required_text(request.image, "image")?;

    let image_data = fetch_image(&state.http, &url, state.image_limit_bytes).await?;
    let tensor = preprocess_image(&image_data)?;
    let objects = state.food_classifier.classify(&tensor)?;
    tracing::debug!(%url, detections = objects.len(), "scanned food image");

    Ok(Json(ScanFoodResponse { objects }))
}

#[derive(Debug, Deserialize)]
pub struct FoodNutritionRequest {
    pub name: Option<String>,
    pub volume: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FoodNutritionResponse {
    pub food_name: String,
    pub nutrition_info: NutritionInfo,
    pub alert: Alert,
    pub volume: String,
}

async fn food_nutritions(
    State(state): State<SharedState>,
    payload: Result<Json<FoodNutritionRequest>, JsonRejection>,
) -> Result<Json<FoodNutritionResponse>, AppError> {
    let Json(request) = payload?;
    // Lookups use the trimmed name; the response echoes what was sent.
    let food_name = required_text(request.name.clone(), "name")?;
    let grams = request
        .volume
        .as_deref()
        .map(convert_weight_to_grams)
        .transpose()?;

    let data = state.food_data.as_deref().ok_or(AppError::DataUnavailable)?;

    let per_100g = match data.find(&food_name) {
        Some(record) => NutrientValues::from_record(record),
        None => {
            tracing::debug!(food = %food_name, "not in nutrition table, searching");
            let raw = state
                .nutrition_lookup
                .lookup_nutrition(&food_name)
                .await
                .unwrap_or_default();
            NutrientValues::from_raw(&raw)
        }
    };
    let values = per_100g.scaled(volume_factor(grams));

    Ok(Json(FoodNutritionResponse {
        food_name: request.name.unwrap_or(food_name),
        nutrition_info: values.formatted(),
        alert: values.alert(&data.thresholds),
        volume: request.volume.unwrap_or_else(|| "100 g".to_string()),
    }))
}
