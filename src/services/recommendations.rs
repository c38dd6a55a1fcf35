use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    catalog::{CategoryTable, HolidayCalendar, NutritionCatalog},
    error::{AppError, AppResult},
    models::{
        DailyNutritionTotals, MealLogEntry, MealRecommendation, MealSlot, PreferenceUpdate,
        Season, UserPreferences, WeeklyNutritionTotals,
    },
    services::{
        classifier::{ClassifierParams, LabelEncoder, MealClassifier, TrainingReport},
        features::{FeatureBuilder, FrequencyMode, HistoryContext, FEATURE_NAMES},
        nutritional::NutritionalScorer,
        preference::PreferenceScorer,
        seasonality::SeasonalityScorer,
        variety::VarietyScorer,
    },
};

/// Weights of the final score blend
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreWeights {
    pub base_probability: f64,
    pub nutritional: f64,
    pub variety: f64,
    pub seasonal: f64,
    pub preference: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            base_probability: 0.4,
            nutritional: 0.2,
            variety: 0.2,
            seasonal: 0.1,
            preference: 0.1,
        }
    }
}

impl ScoreWeights {
    pub fn combine(
        &self,
        base_probability: f64,
        nutritional: f64,
        variety: f64,
        seasonal: f64,
        preference: f64,
    ) -> f64 {
        base_probability * self.base_probability
            + nutritional * self.nutritional
            + variety * self.variety
            + seasonal * self.seasonal
            + preference * self.preference
    }
}

/// Engine configuration, fixed at construction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    pub weights: ScoreWeights,
    /// Number of recommendations returned
    pub top_n: usize,
    pub classifier: ClassifierParams,
    pub frequency_mode: FrequencyMode,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            weights: ScoreWeights::default(),
            top_n: 3,
            classifier: ClassifierParams::default(),
            frequency_mode: FrequencyMode::default(),
        }
    }
}

/// The rule-based scorers blended with the classifier
#[derive(Debug, Clone)]
pub struct Scorers {
    pub nutritional: NutritionalScorer,
    pub variety: VarietyScorer,
    pub seasonal: SeasonalityScorer,
    pub preference: PreferenceScorer,
}

impl Scorers {
    /// Scorers with their standard boosts and penalties
    pub fn standard(catalog: &Arc<NutritionCatalog>, categories: Arc<CategoryTable>) -> Self {
        Self {
            nutritional: NutritionalScorer::new(catalog.clone()),
            variety: VarietyScorer::new(categories),
            seasonal: SeasonalityScorer::new(catalog.clone()),
            preference: PreferenceScorer::new(catalog.clone()),
        }
    }
}

/// Everything needed to predict, as produced by one training run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrainedModel {
    pub id: Uuid,
    pub trained_at: DateTime<Utc>,
    pub classifier: MealClassifier,
    pub context: HistoryContext,
    /// Calendar the features were built with
    pub holidays: HolidayCalendar,
    pub frequency_mode: FrequencyMode,
}

/// Result of [`RecommendationEngine::train`]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrainingSummary {
    pub model_id: Uuid,
    #[serde(flatten)]
    pub report: TrainingReport,
}

/// Context for one next-meal prediction
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionRequest {
    pub date: NaiveDateTime,
    /// Most recent first
    pub previous_meals: Vec<String>,
    pub daily_nutrition: DailyNutritionTotals,
    pub weekly_nutrition: WeeklyNutritionTotals,
    pub time_of_day: Option<MealSlot>,
}

/// Fits a [`TrainedModel`] without touching any engine.
///
/// Owns shared handles only, so it can run on a blocking thread while the
/// engine keeps serving predictions from its current model.
#[derive(Debug, Clone)]
pub struct ModelTrainer {
    catalog: Arc<NutritionCatalog>,
    holidays: Arc<HolidayCalendar>,
    params: ClassifierParams,
    frequency_mode: FrequencyMode,
}

impl ModelTrainer {
    pub fn fit(&self, history: &[MealLogEntry]) -> AppResult<(TrainedModel, TrainingSummary)> {
        tracing::info!(rows = history.len(), "Training meal classifier");

        let builder = FeatureBuilder::new(&self.catalog, &self.holidays, self.frequency_mode);
        let table = builder.build(history)?;

        let encoder = LabelEncoder::fit(history.iter().map(|e| e.meal.as_str()));
        let mut rows = Vec::with_capacity(table.rows.len());
        let mut labels = Vec::with_capacity(table.rows.len());
        for row in &table.rows {
            rows.push(row.to_vector(&encoder)?);
            labels.push(encoder.encode(&row.meal)?);
        }

        let (classifier, report) =
            MealClassifier::train(encoder, &FEATURE_NAMES, &rows, &labels, &self.params)?;

        let model = TrainedModel {
            id: Uuid::new_v4(),
            trained_at: Utc::now(),
            classifier,
            context: table.context,
            holidays: (*self.holidays).clone(),
            frequency_mode: self.frequency_mode,
        };

        tracing::info!(
            model_id = %model.id,
            classes = model.classifier.classes().len(),
            accuracy = report.accuracy,
            test_size = report.test_size,
            "Meal classifier trained"
        );

        let summary = TrainingSummary {
            model_id: model.id,
            report,
        };
        Ok((model, summary))
    }
}

/// Sorts by score, highest first; equal scores keep class order
fn rank_candidates(scored: &mut [(&str, f64)]) {
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
}

/// Ranks next-meal candidates by blending classifier probability with
/// nutrition, variety, seasonality and preference scores
pub struct RecommendationEngine {
    catalog: Arc<NutritionCatalog>,
    holidays: Arc<HolidayCalendar>,
    scorers: Scorers,
    config: EngineConfig,
    preferences: UserPreferences,
    model: Option<TrainedModel>,
}

impl RecommendationEngine {
    pub fn new(
        catalog: Arc<NutritionCatalog>,
        holidays: Arc<HolidayCalendar>,
        scorers: Scorers,
        config: EngineConfig,
    ) -> Self {
        Self {
            catalog,
            holidays,
            scorers,
            config,
            preferences: UserPreferences::new(),
            model: None,
        }
    }

    /// Trainer sharing this engine's catalogs and configuration
    pub fn trainer(&self) -> ModelTrainer {
        ModelTrainer {
            catalog: self.catalog.clone(),
            holidays: self.holidays.clone(),
            params: self.config.classifier,
            frequency_mode: self.config.frequency_mode,
        }
    }

    /// Trains a classifier on a chronological meal log and installs it.
    ///
    /// The previous model stays in place if training fails.
    pub fn train(&mut self, history: &[MealLogEntry]) -> AppResult<TrainingSummary> {
        let (model, summary) = self.trainer().fit(history)?;
        self.model = Some(model);
        Ok(summary)
    }

    /// Replaces the current model, e.g. with one loaded from disk
    pub fn install_model(&mut self, model: TrainedModel) {
        tracing::info!(
            model_id = %model.id,
            trained_at = %model.trained_at,
            "Installing meal model"
        );
        self.model = Some(model);
    }

    pub fn model(&self) -> Option<&TrainedModel> {
        self.model.as_ref()
    }

    pub fn catalog(&self) -> &NutritionCatalog {
        &self.catalog
    }

    pub fn preferences(&self) -> &UserPreferences {
        &self.preferences
    }

    /// Applies a validated preference update; nothing changes on error
    pub fn update_preferences(
        &mut self,
        update: PreferenceUpdate,
    ) -> AppResult<Vec<&'static str>> {
        let changed = self.preferences.apply(update)?;
        tracing::info!(fields = ?changed, "Preferences updated");
        Ok(changed)
    }

    pub fn is_suitable_meal(&self, meal: &str) -> bool {
        self.scorers.preference.is_suitable(&self.preferences, meal)
    }

    /// Union of the catalog's seasonal ingredients for the season of `date`
    pub fn seasonal_ingredients(&self, date: NaiveDate) -> Vec<String> {
        let season = self.scorers.seasonal.season(&date);
        self.catalog.seasonal_ingredients(season).into_iter().collect()
    }

    /// Top-N next-meal suggestions.
    ///
    /// Meals the user cannot eat are dropped before scoring. An empty list
    /// is a valid result when every known meal is dropped.
    pub fn predict_next_meal(
        &self,
        request: &PredictionRequest,
    ) -> AppResult<Vec<MealRecommendation>> {
        let model = self.model.as_ref().ok_or(AppError::ModelNotTrained)?;

        let builder = FeatureBuilder::new(&self.catalog, &model.holidays, model.frequency_mode);
        let row = builder.prediction_row(
            request.date,
            &request.previous_meals,
            &request.daily_nutrition,
            &model.context,
        )?;
        let vector = row.to_vector(model.classifier.encoder())?;
        let probabilities = model.classifier.predict_proba(&vector)?;

        let mut scored: Vec<(&str, f64)> = Vec::with_capacity(probabilities.len());
        for (meal, base_probability) in model.classifier.classes().iter().zip(probabilities) {
            if !self.is_suitable_meal(meal) {
                continue;
            }

            let nutritional = self.scorers.nutritional.score(
                meal,
                &request.daily_nutrition,
                &request.weekly_nutrition,
            );
            let variety = self.scorers.variety.score(meal, &request.previous_meals);
            let seasonal = self.scorers.seasonal.score(meal, &request.date);
            let preference = self.scorers.preference.score(
                &self.preferences,
                meal,
                request.time_of_day,
                request.date.time(),
            );

            let score = self.config.weights.combine(
                base_probability,
                nutritional,
                variety,
                seasonal,
                preference,
            );
            scored.push((meal.as_str(), score));
        }

        tracing::debug!(
            candidates = scored.len(),
            filtered = model.classifier.classes().len() - scored.len(),
            "Scored meal candidates"
        );

        rank_candidates(&mut scored);

        let season = Season::for_date(&request.date);
        let recommendations = scored
            .into_iter()
            .take(self.config.top_n)
            .map(|(meal, score)| {
                let nutrition = self.catalog.lookup(meal).clone();
                MealRecommendation {
                    meal: meal.to_string(),
                    score,
                    seasonal_ingredients: nutrition.seasonal_for(season),
                    health_tags: nutrition.health_tags.iter().cloned().collect(),
                    nutrition,
                }
            })
            .collect();

        Ok(recommendations)
    }
}
