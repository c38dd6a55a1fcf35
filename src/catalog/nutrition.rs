use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use crate::models::{
    DailyNutritionTotals, NutritionRecord, Season, WeeklyNutritionTotals,
};

/// Nutrition facts keyed by meal name, with a fallback for unknown meals.
///
/// Lookups never fail: a meal missing from the catalog resolves to the
/// default record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NutritionCatalog {
    records: HashMap<String, NutritionRecord>,
    default: NutritionRecord,
}

impl NutritionCatalog {
    pub fn new(records: HashMap<String, NutritionRecord>, default: NutritionRecord) -> Self {
        Self { records, default }
    }

    /// The built-in South Indian meal catalog
    pub fn builtin() -> Self {
        let records = [
            (
                "Sambar Rice",
                NutritionRecord::new(250.0, 6.0, 45.0, 4.0)
                    .with_vitamins(&["A", "C", "B6"])
                    .with_minerals(&["Iron", "Potassium"])
                    .with_ingredients(&["rice", "toor dal", "tomato", "carrot", "drumstick"])
                    .with_seasonal(Season::Summer, &["drumstick", "tomato"])
                    .with_seasonal(Season::Winter, &["carrot", "spinach"])
                    .with_seasonal(Season::Monsoon, &["onion", "potato"])
                    .with_seasonal(Season::PostMonsoon, &["tomato", "carrot"])
                    .with_health_tags(&["protein-rich", "fiber-rich", "balanced-meal"]),
            ),
            (
                "Dosa",
                NutritionRecord::new(120.0, 3.0, 20.0, 1.0)
                    .with_vitamins(&["B12", "D"])
                    .with_minerals(&["Iron", "Calcium"])
                    .with_ingredients(&["rice", "urad dal", "fenugreek"])
                    .with_seasonal(Season::Summer, &["coconut chutney"])
                    .with_seasonal(Season::Winter, &["tomato chutney"])
                    .with_seasonal(Season::Monsoon, &["mint chutney"])
                    .with_seasonal(Season::PostMonsoon, &["peanut chutney"])
                    .with_health_tags(&["fermented", "probiotic"]),
            ),
            (
                "Idli",
                NutritionRecord::new(80.0, 2.0, 15.0, 1.0)
                    .with_vitamins(&["B12", "D"])
                    .with_minerals(&["Iron", "Calcium"])
                    .with_ingredients(&["rice", "urad dal", "fenugreek"])
                    .with_seasonal(Season::Summer, &["coconut chutney"])
                    .with_seasonal(Season::Winter, &["tomato chutney"])
                    .with_seasonal(Season::Monsoon, &["mint chutney"])
                    .with_seasonal(Season::PostMonsoon, &["peanut chutney"])
                    .with_health_tags(&["fermented", "probiotic", "low-calorie"]),
            ),
            (
                "biryani",
                NutritionRecord::new(400.0, 15.0, 50.0, 3.0)
                    .with_vitamins(&["A", "B12", "D"])
                    .with_minerals(&["Iron", "Zinc"])
                    .with_ingredients(&["rice", "vegetables", "spices"])
                    .with_seasonal(Season::Summer, &["mint", "cucumber raita"])
                    .with_seasonal(Season::Winter, &["potato", "cauliflower"])
                    .with_seasonal(Season::Monsoon, &["mushroom"])
                    .with_seasonal(Season::PostMonsoon, &["green peas"])
                    .with_health_tags(&["protein-rich", "complete-meal"]),
            ),
        ]
        .into_iter()
        .map(|(name, record)| (name.to_string(), record))
        .collect();

        let default = NutritionRecord::new(250.0, 6.0, 40.0, 3.0)
            .with_vitamins(&["B12"])
            .with_minerals(&["Iron"])
            .with_ingredients(&["mixed"])
            .with_health_tags(&["balanced"]);

        Self::new(records, default)
    }

    /// Record for `meal`, or the default record when the meal is not listed
    pub fn lookup(&self, meal: &str) -> &NutritionRecord {
        self.records.get(meal).unwrap_or(&self.default)
    }

    pub fn contains(&self, meal: &str) -> bool {
        self.records.contains_key(meal)
    }

    pub fn default_record(&self) -> &NutritionRecord {
        &self.default
    }

    /// Listed meal names, sorted
    pub fn meals(&self) -> Vec<&str> {
        let mut meals: Vec<&str> = self.records.keys().map(String::as_str).collect();
        meals.sort_unstable();
        meals
    }

    /// Macronutrient totals of the given meals
    pub fn daily_totals<S: AsRef<str>>(&self, meals: &[S]) -> DailyNutritionTotals {
        let mut totals = DailyNutritionTotals::default();
        for meal in meals {
            totals.add(self.lookup(meal.as_ref()));
        }
        totals
    }

    /// Vitamin and mineral serving counts of the given meals
    pub fn weekly_totals<S: AsRef<str>>(&self, meals: &[S]) -> WeeklyNutritionTotals {
        let mut totals = WeeklyNutritionTotals::default();
        for meal in meals {
            totals.add(self.lookup(meal.as_ref()));
        }
        totals
    }

    /// Every seasonal ingredient listed for `season` across the catalog
    pub fn seasonal_ingredients(&self, season: Season) -> BTreeSet<String> {
        self.records
            .values()
            .filter_map(|record| record.seasonal_ingredients.get(&season))
            .flat_map(|set| set.iter().cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Nutrient;
    use proptest::prelude::*;

    #[test]
    fn test_lookup_known_meal() {
        let catalog = NutritionCatalog::builtin();
        let record = catalog.lookup("Sambar Rice");
        assert_eq!(record.calories, 250.0);
        assert!(record.contains_ingredient("tomato"));
    }

    #[test]
    fn test_lookup_unknown_meal_falls_back() {
        let catalog = NutritionCatalog::builtin();
        let record = catalog.lookup("Pizza");
        assert_eq!(record, catalog.default_record());
        assert!(record.seasonal_ingredients.is_empty());
        assert!(!catalog.contains("Pizza"));
    }

    #[test]
    fn test_daily_totals_use_default_for_unknown() {
        let catalog = NutritionCatalog::builtin();
        let totals = catalog.daily_totals(&["Dosa", "Idli", "Pizza"]);
        assert_eq!(totals.calories, 120.0 + 80.0 + 250.0);
        assert_eq!(totals.protein, 3.0 + 2.0 + 6.0);
    }

    #[test]
    fn test_weekly_totals() {
        let catalog = NutritionCatalog::builtin();
        let totals = catalog.weekly_totals(&["Dosa", "Idli", "Sambar Rice"]);
        assert_eq!(totals.vitamin_count("B12"), 2);
        assert_eq!(totals.vitamin_count("C"), 1);
        assert_eq!(totals.mineral_count("Iron"), 3);
    }

    #[test]
    fn test_seasonal_ingredients_union() {
        let catalog = NutritionCatalog::builtin();
        let monsoon = catalog.seasonal_ingredients(Season::Monsoon);
        assert!(monsoon.contains("mushroom"));
        assert!(monsoon.contains("mint chutney"));
        assert!(monsoon.contains("potato"));
        assert_eq!(monsoon.len(), 4);
    }

    #[test]
    fn test_meals_sorted() {
        let catalog = NutritionCatalog::builtin();
        assert_eq!(catalog.meals(), vec!["Dosa", "Idli", "Sambar Rice", "biryani"]);
    }

    proptest! {
        #[test]
        fn prop_lookup_is_total_and_non_negative(meal in ".{0,24}") {
            let catalog = NutritionCatalog::builtin();
            let record = catalog.lookup(&meal);
            for nutrient in Nutrient::ALL {
                prop_assert!(record.amount(nutrient) >= 0.0);
            }
        }
    }
}
