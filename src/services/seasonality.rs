use chrono::Datelike;
use std::sync::Arc;

use crate::{catalog::NutritionCatalog, models::Season};

const SEASONAL_BOOST: f64 = 1.3;
const OFFSEASON_PENALTY: f64 = 0.7;

/// Scores meals that list seasonal ingredients for the current season above
/// those that don't
#[derive(Debug, Clone)]
pub struct SeasonalityScorer {
    catalog: Arc<NutritionCatalog>,
    seasonal_boost: f64,
    offseason_penalty: f64,
}

impl SeasonalityScorer {
    pub fn new(catalog: Arc<NutritionCatalog>) -> Self {
        Self {
            catalog,
            seasonal_boost: SEASONAL_BOOST,
            offseason_penalty: OFFSEASON_PENALTY,
        }
    }

    pub fn season<D: Datelike>(&self, date: &D) -> Season {
        Season::for_date(date)
    }

    pub fn score<D: Datelike>(&self, meal: &str, date: &D) -> f64 {
        if self.catalog.lookup(meal).is_in_season(self.season(date)) {
            self.seasonal_boost
        } else {
            self.offseason_penalty
        }
    }
}
