use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::{Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    middleware::RequestId,
    models::{
        DailyNutritionTotals, MealLogEntry, MealRecommendation, MealSlot, PreferenceUpdate,
        Season, UserPreferences, WeeklyNutritionTotals,
    },
    services::{PredictionRequest, TrainingSummary},
    storage,
};

use super::AppState;

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct TrainRequest {
    pub history: Vec<MealLogEntry>,
}

#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    /// Defaults to the server's local time
    pub date: Option<NaiveDateTime>,
    /// Most recent first
    pub previous_meals: Vec<String>,
    /// Intake so far today; derived from `meals_today` when absent
    pub daily_nutrition: Option<DailyNutritionTotals>,
    /// Intake so far this week; derived from `meals_this_week` when absent
    pub weekly_nutrition: Option<WeeklyNutritionTotals>,
    #[serde(default)]
    pub meals_today: Vec<String>,
    #[serde(default)]
    pub meals_this_week: Vec<String>,
    pub time_of_day: Option<MealSlot>,
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub model_id: Option<Uuid>,
    pub recommendations: Vec<MealRecommendation>,
}

#[derive(Debug, Serialize)]
pub struct PreferencesUpdated {
    pub updated: Vec<&'static str>,
    pub preferences: UserPreferences,
}

#[derive(Debug, Serialize)]
pub struct SuitabilityResponse {
    pub meal: String,
    pub suitable: bool,
}

#[derive(Debug, Deserialize)]
pub struct SeasonalQuery {
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct SeasonalResponse {
    pub date: NaiveDate,
    pub season: Season,
    pub ingredients: Vec<String>,
}

// Handlers

/// Health check endpoint, with the id of the installed model
pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let inner = state.inner.read().await;
    let model_id = inner.engine.model().map(|m| m.id);
    Json(json!({
        "status": "healthy",
        "model_trained": model_id.is_some(),
        "model_id": model_id,
    }))
}

/// Train a new model from a meal log and install it.
///
/// Fitting runs on a blocking thread without holding the state lock, so
/// predictions keep using the current model. The new model is persisted
/// before it is installed; if saving fails nothing changes.
pub async fn train(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(mut request): Json<TrainRequest>,
) -> AppResult<Json<TrainingSummary>> {
    tracing::info!(
        request_id = %request_id,
        entries = request.history.len(),
        "Processing training request"
    );

    request.history.sort_by_key(|e| e.date);

    let (trainer, model_path) = {
        let inner = state.inner.read().await;
        (inner.engine.trainer(), inner.model_path.clone())
    };

    let (model, summary) = tokio::task::spawn_blocking(move || {
        let (model, summary) = trainer.fit(&request.history)?;
        if let Some(path) = &model_path {
            storage::save_model(path, &model)?;
        }
        Ok::<_, AppError>((model, summary))
    })
    .await
    .map_err(|e| AppError::Internal(format!("training task failed: {}", e)))??;

    state.inner.write().await.engine.install_model(model);

    tracing::info!(
        request_id = %request_id,
        model_id = %summary.model_id,
        accuracy = summary.report.accuracy,
        "Training completed"
    );

    Ok(Json(summary))
}

/// Recommend the next meal
pub async fn predict(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<PredictRequest>,
) -> AppResult<Json<PredictResponse>> {
    let inner = state.inner.read().await;
    let catalog = inner.engine.catalog();

    let request = PredictionRequest {
        date: request.date.unwrap_or_else(|| Local::now().naive_local()),
        daily_nutrition: request
            .daily_nutrition
            .unwrap_or_else(|| catalog.daily_totals(&request.meals_today)),
        weekly_nutrition: request
            .weekly_nutrition
            .unwrap_or_else(|| catalog.weekly_totals(&request.meals_this_week)),
        previous_meals: request.previous_meals,
        time_of_day: request.time_of_day,
    };

    let recommendations = inner.engine.predict_next_meal(&request)?;

    tracing::info!(
        request_id = %request_id,
        date = %request.date,
        returned = recommendations.len(),
        "Prediction completed"
    );

    Ok(Json(PredictResponse {
        model_id: inner.engine.model().map(|m| m.id),
        recommendations,
    }))
}

/// Get user preferences
pub async fn get_preferences(State(state): State<AppState>) -> Json<UserPreferences> {
    let inner = state.inner.read().await;
    Json(inner.engine.preferences().clone())
}

/// Apply a partial preference update; rejected updates change nothing
pub async fn update_preferences(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> AppResult<Json<PreferencesUpdated>> {
    let update = PreferenceUpdate::from_value(body)?;

    let mut inner = state.inner.write().await;
    let updated = inner.engine.update_preferences(update)?;

    Ok(Json(PreferencesUpdated {
        updated,
        preferences: inner.engine.preferences().clone(),
    }))
}

/// Whether the user can eat a meal at all
pub async fn meal_suitability(
    State(state): State<AppState>,
    Path(meal): Path<String>,
) -> Json<SuitabilityResponse> {
    let inner = state.inner.read().await;
    let suitable = inner.engine.is_suitable_meal(&meal);
    Json(SuitabilityResponse { meal, suitable })
}

/// Ingredients in season on a date, today by default
pub async fn seasonal_ingredients(
    State(state): State<AppState>,
    Query(query): Query<SeasonalQuery>,
) -> Json<SeasonalResponse> {
    let date = query.date.unwrap_or_else(|| Local::now().date_naive());
    let inner = state.inner.read().await;
    Json(SeasonalResponse {
        date,
        season: Season::for_date(&date),
        ingredients: inner.engine.seasonal_ingredients(date),
    })
}
