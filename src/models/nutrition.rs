use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::Season;

/// The four macronutrients tracked against daily targets
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Nutrient {
    Calories,
    Protein,
    Carbs,
    Fiber,
}

impl Nutrient {
    pub const ALL: [Nutrient; 4] = [
        Nutrient::Calories,
        Nutrient::Protein,
        Nutrient::Carbs,
        Nutrient::Fiber,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Nutrient::Calories => "calories",
            Nutrient::Protein => "protein",
            Nutrient::Carbs => "carbs",
            Nutrient::Fiber => "fiber",
        }
    }
}

/// Nutrition facts for one meal
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NutritionRecord {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fiber: f64,
    pub vitamins: BTreeSet<String>,
    pub minerals: BTreeSet<String>,
    pub ingredients: BTreeSet<String>,
    /// Ingredients that are in season, per season
    pub seasonal_ingredients: BTreeMap<Season, BTreeSet<String>>,
    pub health_tags: BTreeSet<String>,
}

fn to_set(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl NutritionRecord {
    /// Creates a record with the given macros and no micronutrients, ingredients or tags
    pub fn new(calories: f64, protein: f64, carbs: f64, fiber: f64) -> Self {
        Self {
            calories,
            protein,
            carbs,
            fiber,
            vitamins: BTreeSet::new(),
            minerals: BTreeSet::new(),
            ingredients: BTreeSet::new(),
            seasonal_ingredients: BTreeMap::new(),
            health_tags: BTreeSet::new(),
        }
    }

    pub fn with_vitamins(mut self, vitamins: &[&str]) -> Self {
        self.vitamins = to_set(vitamins);
        self
    }

    pub fn with_minerals(mut self, minerals: &[&str]) -> Self {
        self.minerals = to_set(minerals);
        self
    }

    pub fn with_ingredients(mut self, ingredients: &[&str]) -> Self {
        self.ingredients = to_set(ingredients);
        self
    }

    pub fn with_seasonal(mut self, season: Season, ingredients: &[&str]) -> Self {
        self.seasonal_ingredients.insert(season, to_set(ingredients));
        self
    }

    pub fn with_health_tags(mut self, tags: &[&str]) -> Self {
        self.health_tags = to_set(tags);
        self
    }

    /// Amount of a macronutrient in one serving
    pub fn amount(&self, nutrient: Nutrient) -> f64 {
        match nutrient {
            Nutrient::Calories => self.calories,
            Nutrient::Protein => self.protein,
            Nutrient::Carbs => self.carbs,
            Nutrient::Fiber => self.fiber,
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.health_tags.contains(tag)
    }

    pub fn contains_ingredient(&self, ingredient: &str) -> bool {
        self.ingredients.contains(ingredient)
    }

    pub fn is_in_season(&self, season: Season) -> bool {
        self.seasonal_ingredients.contains_key(&season)
    }

    /// Seasonal ingredients for `season`, empty when the meal lists none
    pub fn seasonal_for(&self, season: Season) -> Vec<String> {
        self.seasonal_ingredients
            .get(&season)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }
}

/// Macronutrients consumed so far in a day
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DailyNutritionTotals {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fiber: f64,
}

impl DailyNutritionTotals {
    pub fn get(&self, nutrient: Nutrient) -> f64 {
        match nutrient {
            Nutrient::Calories => self.calories,
            Nutrient::Protein => self.protein,
            Nutrient::Carbs => self.carbs,
            Nutrient::Fiber => self.fiber,
        }
    }

    /// Adds one serving of `record`
    pub fn add(&mut self, record: &NutritionRecord) {
        self.calories += record.calories;
        self.protein += record.protein;
        self.carbs += record.carbs;
        self.fiber += record.fiber;
    }
}

/// Servings of each vitamin and mineral consumed so far in a week
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WeeklyNutritionTotals {
    pub vitamins: BTreeMap<String, u32>,
    pub minerals: BTreeMap<String, u32>,
}

impl WeeklyNutritionTotals {
    pub fn vitamin_count(&self, vitamin: &str) -> u32 {
        self.vitamins.get(vitamin).copied().unwrap_or(0)
    }

    pub fn mineral_count(&self, mineral: &str) -> u32 {
        self.minerals.get(mineral).copied().unwrap_or(0)
    }

    /// Counts every vitamin and mineral `record` provides once
    pub fn add(&mut self, record: &NutritionRecord) {
        for vitamin in &record.vitamins {
            *self.vitamins.entry(vitamin.clone()).or_insert(0) += 1;
        }
        for mineral in &record.minerals {
            *self.minerals.entry(mineral.clone()).or_insert(0) += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> NutritionRecord {
        NutritionRecord::new(250.0, 6.0, 45.0, 4.0)
            .with_vitamins(&["A", "C"])
            .with_minerals(&["Iron"])
            .with_ingredients(&["rice", "tomato"])
            .with_seasonal(Season::Summer, &["tomato"])
            .with_health_tags(&["fiber-rich"])
    }

    #[test]
    fn test_amount_matches_fields() {
        let record = sample();
        let amounts: Vec<f64> = Nutrient::ALL.iter().map(|n| record.amount(*n)).collect();
        assert_eq!(amounts, vec![250.0, 6.0, 45.0, 4.0]);
    }

    #[test]
    fn test_seasonal_for_missing_season_is_empty() {
        let record = sample();
        assert_eq!(record.seasonal_for(Season::Summer), vec!["tomato".to_string()]);
        assert!(record.seasonal_for(Season::Monsoon).is_empty());
        assert!(record.is_in_season(Season::Summer));
        assert!(!record.is_in_season(Season::Winter));
    }

    #[test]
    fn test_daily_totals_accumulate() {
        let mut totals = DailyNutritionTotals::default();
        totals.add(&sample());
        totals.add(&sample());
        assert_eq!(totals.get(Nutrient::Calories), 500.0);
        assert_eq!(totals.get(Nutrient::Fiber), 8.0);
    }

    #[test]
    fn test_weekly_totals_count_servings() {
        let mut totals = WeeklyNutritionTotals::default();
        totals.add(&sample());
        totals.add(&sample());
        assert_eq!(totals.vitamin_count("A"), 2);
        assert_eq!(totals.mineral_count("Iron"), 2);
        assert_eq!(totals.vitamin_count("D"), 0);
    }

    #[test]
    fn test_weekly_totals_deserialize_partial() {
        let totals: WeeklyNutritionTotals =
            serde_json::from_str(r#"{"vitamins": {"B12": 1}}"#).unwrap();
        assert_eq!(totals.vitamin_count("B12"), 1);
        assert!(totals.minerals.is_empty());
    }
}
