use std::collections::BTreeMap;
use std::sync::Arc;

use crate::{
    catalog::NutritionCatalog,
    models::{DailyNutritionTotals, Nutrient, WeeklyNutritionTotals},
};

const OVER_MAX_PENALTY: f64 = 0.5;
const UNDER_MIN_BOOST: f64 = 1.2;
const MICRONUTRIENT_BOOST: f64 = 1.1;

/// Inclusive daily range for one macronutrient
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyRange {
    pub min: f64,
    pub max: f64,
}

/// Daily macro ranges and weekly vitamin/mineral serving targets
#[derive(Debug, Clone, PartialEq)]
pub struct NutritionTargets {
    pub daily: BTreeMap<Nutrient, DailyRange>,
    pub weekly_vitamins: BTreeMap<String, u32>,
    pub weekly_minerals: BTreeMap<String, u32>,
}

impl Default for NutritionTargets {
    fn default() -> Self {
        let range = |min, max| DailyRange { min, max };
        let counts = |pairs: &[(&str, u32)]| -> BTreeMap<String, u32> {
            pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
        };

        Self {
            daily: BTreeMap::from([
                (Nutrient::Calories, range(1800.0, 2200.0)),
                (Nutrient::Protein, range(50.0, 70.0)),
                (Nutrient::Carbs, range(225.0, 325.0)),
                (Nutrient::Fiber, range(25.0, 35.0)),
            ]),
            weekly_vitamins: counts(&[("A", 2), ("B12", 3), ("C", 4), ("D", 2), ("B6", 3)]),
            weekly_minerals: counts(&[("Iron", 3), ("Calcium", 4), ("Zinc", 2), ("Potassium", 3)]),
        }
    }
}

/// Scores a meal against what is left of today's macro budget and this
/// week's micronutrient targets
#[derive(Debug, Clone)]
pub struct NutritionalScorer {
    catalog: Arc<NutritionCatalog>,
    targets: NutritionTargets,
}

impl NutritionalScorer {
    pub fn new(catalog: Arc<NutritionCatalog>) -> Self {
        Self::with_targets(catalog, NutritionTargets::default())
    }

    pub fn with_targets(catalog: Arc<NutritionCatalog>, targets: NutritionTargets) -> Self {
        Self { catalog, targets }
    }

    pub fn score(
        &self,
        meal: &str,
        daily: &DailyNutritionTotals,
        weekly: &WeeklyNutritionTotals,
    ) -> f64 {
        let nutrition = self.catalog.lookup(meal);
        let mut score = 1.0;

        for (nutrient, range) in &self.targets.daily {
            let current = daily.get(*nutrient);
            let amount = nutrition.amount(*nutrient);
            if current + amount > range.max {
                score *= OVER_MAX_PENALTY;
            } else if current < range.min && amount > 0.0 {
                score *= UNDER_MIN_BOOST;
            }
        }

        // Micronutrients without a target never boost
        for vitamin in &nutrition.vitamins {
            let target = self.targets.weekly_vitamins.get(vitamin).copied().unwrap_or(0);
            if weekly.vitamin_count(vitamin) < target {
                score *= MICRONUTRIENT_BOOST;
            }
        }
        for mineral in &nutrition.minerals {
            let target = self.targets.weekly_minerals.get(mineral).copied().unwrap_or(0);
            if weekly.mineral_count(mineral) < target {
                score *= MICRONUTRIENT_BOOST;
            }
        }

        score
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NutritionRecord;
    use std::collections::HashMap;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn catalog_with(meal: &str, record: NutritionRecord) -> Arc<NutritionCatalog> {
        let records = HashMap::from([(meal.to_string(), record)]);
        Arc::new(NutritionCatalog::new(records, NutritionRecord::new(0.0, 0.0, 0.0, 0.0)))
    }

    fn at_minimum() -> DailyNutritionTotals {
        DailyNutritionTotals {
            calories: 1800.0,
            protein: 50.0,
            carbs: 225.0,
            fiber: 25.0,
        }
    }

    #[test]
    fn test_zero_meal_at_minimum_is_neutral() {
        let scorer = NutritionalScorer::new(catalog_with(
            "Water",
            NutritionRecord::new(0.0, 0.0, 0.0, 0.0),
        ));
        let score = scorer.score("Water", &at_minimum(), &WeeklyNutritionTotals::default());
        assert_eq!(score, 1.0);
    }

    #[test]
    fn test_empty_day_boosts_every_macro() {
        let scorer = NutritionalScorer::new(catalog_with(
            "Plain",
            NutritionRecord::new(100.0, 5.0, 20.0, 2.0),
        ));
        let score = scorer.score(
            "Plain",
            &DailyNutritionTotals::default(),
            &WeeklyNutritionTotals::default(),
        );
        assert!(approx(score, 1.2_f64.powi(4)));
    }

    #[test]
    fn test_exceeding_max_penalizes() {
        let scorer = NutritionalScorer::new(catalog_with(
            "Feast",
            NutritionRecord::new(500.0, 0.0, 0.0, 0.0),
        ));
        let daily = DailyNutritionTotals {
            calories: 2000.0,
            ..at_minimum()
        };
        let score = scorer.score("Feast", &daily, &WeeklyNutritionTotals::default());
        assert!(approx(score, 0.5));
    }

    #[test]
    fn test_under_target_micronutrients_boost() {
        let scorer = NutritionalScorer::new(Arc::new(NutritionCatalog::builtin()));
        let mut weekly = WeeklyNutritionTotals::default();
        weekly.vitamins.insert("B12".to_string(), 3);
        weekly.minerals.insert("Calcium".to_string(), 4);

        // Dosa: B12 and Calcium met; D and Iron under target
        let score = scorer.score("Dosa", &at_minimum(), &weekly);
        assert!(approx(score, 1.1 * 1.1));
    }

    #[test]
    fn test_sambar_rice_on_empty_week() {
        let scorer = NutritionalScorer::new(Arc::new(NutritionCatalog::builtin()));
        let score = scorer.score(
            "Sambar Rice",
            &DailyNutritionTotals::default(),
            &WeeklyNutritionTotals::default(),
        );
        // four macro boosts, three vitamins, two minerals
        assert!(approx(score, 1.2_f64.powi(4) * 1.1_f64.powi(5)));
    }
}
