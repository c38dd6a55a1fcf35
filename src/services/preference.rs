use chrono::{NaiveTime, Timelike};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::{
    catalog::NutritionCatalog,
    models::{user_preferences::HealthGoal, MealSize, MealSlot, UserPreferences},
};

const PREFERRED_MEAL_BOOST: f64 = 1.5;
const MEAL_SIZE_BOOST: f64 = 1.2;
const MEAL_TIME_BOOST: f64 = 1.2;
const SMALL_MEAL_MAX_CALORIES: f64 = 200.0;
const LARGE_MEAL_MIN_CALORIES: f64 = 400.0;

/// Scores meals against a user's declared preferences
#[derive(Debug, Clone)]
pub struct PreferenceScorer {
    catalog: Arc<NutritionCatalog>,
    goal_boosts: BTreeMap<HealthGoal, Vec<(String, f64)>>,
}

fn default_goal_boosts() -> BTreeMap<HealthGoal, Vec<(String, f64)>> {
    let boosts = |pairs: [(&str, f64); 2]| -> Vec<(String, f64)> {
        pairs.iter().map(|(tag, b)| (tag.to_string(), *b)).collect()
    };
    BTreeMap::from([
        (HealthGoal::WeightLoss, boosts([("low-calorie", 1.3), ("fiber-rich", 1.2)])),
        (HealthGoal::MuscleGain, boosts([("protein-rich", 1.3), ("balanced-meal", 1.2)])),
        (HealthGoal::DiabetesFriendly, boosts([("low-carb", 1.3), ("fiber-rich", 1.2)])),
        (HealthGoal::HeartHealthy, boosts([("low-fat", 1.3), ("omega-rich", 1.2)])),
    ])
}

impl PreferenceScorer {
    pub fn new(catalog: Arc<NutritionCatalog>) -> Self {
        Self {
            catalog,
            goal_boosts: default_goal_boosts(),
        }
    }

    /// False when the meal contains an allergen or is explicitly avoided
    pub fn is_suitable(&self, prefs: &UserPreferences, meal: &str) -> bool {
        let nutrition = self.catalog.lookup(meal);
        if prefs.allergies.iter().any(|a| nutrition.contains_ingredient(a)) {
            return false;
        }
        !prefs.avoided_meals.contains(meal)
    }

    /// Preference score of `meal`; 0 for unsuitable meals.
    ///
    /// `now` is matched to the minute against the preferred time of `slot`.
    pub fn score(
        &self,
        prefs: &UserPreferences,
        meal: &str,
        slot: Option<MealSlot>,
        now: NaiveTime,
    ) -> f64 {
        if !self.is_suitable(prefs, meal) {
            return 0.0;
        }

        let nutrition = self.catalog.lookup(meal);
        let mut score = 1.0;

        if prefs.preferred_meals.contains(meal) {
            score *= PREFERRED_MEAL_BOOST;
        }

        for goal in &prefs.health_goals {
            for (tag, boost) in self.goal_boosts.get(goal).into_iter().flatten() {
                if nutrition.has_tag(tag) {
                    score *= boost;
                }
            }
        }

        match prefs.meal_size_preference {
            MealSize::Small if nutrition.calories < SMALL_MEAL_MAX_CALORIES => {
                score *= MEAL_SIZE_BOOST
            }
            MealSize::Large if nutrition.calories > LARGE_MEAL_MIN_CALORIES => {
                score *= MEAL_SIZE_BOOST
            }
            _ => {}
        }

        let on_time = slot
            .and_then(|s| prefs.preferred_meal_times.get(&s))
            .is_some_and(|t| t.hour() == now.hour() && t.minute() == now.minute());
        if on_time {
            score *= MEAL_TIME_BOOST;
        }

        score
    }
}
