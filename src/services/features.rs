//! Feature engineering over a meal log.
//!
//! Each [`MealLogEntry`] becomes one [`FeatureRow`] of calendar, holiday,
//! nutrition and meal-pattern signals. Rows are fully determined by the log,
//! the nutrition catalog and the holiday calendar.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::f64::consts::PI;

use crate::{
    catalog::{HolidayCalendar, NutritionCatalog},
    error::{AppError, AppResult},
    models::{DailyNutritionTotals, MealLogEntry, Nutrient, Season},
    services::classifier::LabelEncoder,
};

/// Number of previous meals carried on each row
pub const PREVIOUS_MEALS: usize = 3;

/// Divisors for the percent-of-daily-target features
const PERCENT_TARGETS: DailyNutritionTotals = DailyNutritionTotals {
    calories: 2000.0,
    protein: 60.0,
    carbs: 2000.0,
    fiber: 2000.0,
};

/// Day of year at which the temperature proxy crosses zero on its way up
const TEMPERATURE_PHASE_DAY: f64 = 45.0;

/// Columns of the classifier's feature vector, in order
pub const FEATURE_NAMES: [&str; 21] = [
    "day_of_week",
    "month",
    "is_weekend",
    "day_of_month",
    "is_holiday",
    "days_to_next_holiday",
    "meal_frequency",
    "unique_meals_last_3",
    "temp_factor",
    "calories_percent",
    "protein_percent",
    "carbs_percent",
    "fiber_percent",
    "transition_strength",
    "season_winter",
    "season_summer",
    "season_monsoon",
    "season_post_monsoon",
    "prev_meal_1",
    "prev_meal_2",
    "prev_meal_3",
];

/// How `meal_frequency` counts a meal's occurrences
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FrequencyMode {
    /// Occurrences across the whole log, later rows included
    #[default]
    Global,
    /// Occurrences strictly before the row
    Historical,
}

/// "Meal A followed by meal B" counts, within a calendar day
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TransitionTable {
    counts: BTreeMap<String, BTreeMap<String, u32>>,
}

impl TransitionTable {
    /// Counts adjacent pairs within each calendar day of `history`
    pub fn from_history(history: &[MealLogEntry]) -> Self {
        let mut by_day: BTreeMap<NaiveDate, Vec<&str>> = BTreeMap::new();
        for entry in history {
            by_day
                .entry(entry.date.date())
                .or_default()
                .push(entry.meal.as_str());
        }

        let mut counts: BTreeMap<String, BTreeMap<String, u32>> = BTreeMap::new();
        for meals in by_day.values() {
            for pair in meals.windows(2) {
                *counts
                    .entry(pair[0].to_string())
                    .or_default()
                    .entry(pair[1].to_string())
                    .or_insert(0) += 1;
            }
        }

        Self { counts }
    }

    pub fn count(&self, from: &str, to: &str) -> u32 {
        self.counts
            .get(from)
            .and_then(|next| next.get(to))
            .copied()
            .unwrap_or(0)
    }

    /// Highest count from `meal` to any following meal; 0 if it was never followed
    pub fn strength(&self, meal: &str) -> u32 {
        self.counts
            .get(meal)
            .and_then(|next| next.values().max())
            .copied()
            .unwrap_or(0)
    }
}

/// Whole-log statistics shared by every row and kept for inference
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryContext {
    pub frequencies: BTreeMap<String, usize>,
    pub transitions: TransitionTable,
    /// Most frequent meal; ties go to the alphabetically first
    pub mode_meal: String,
}

impl HistoryContext {
    pub fn from_history(history: &[MealLogEntry]) -> AppResult<Self> {
        let mut frequencies: BTreeMap<String, usize> = BTreeMap::new();
        for entry in history {
            *frequencies.entry(entry.meal.clone()).or_insert(0) += 1;
        }

        let mut mode: Option<(&String, usize)> = None;
        for (meal, &count) in &frequencies {
            if mode.map_or(true, |(_, best)| count > best) {
                mode = Some((meal, count));
            }
        }
        let mode_meal = mode.map(|(meal, _)| meal.clone()).ok_or(AppError::EmptyHistory)?;

        Ok(Self {
            transitions: TransitionTable::from_history(history),
            frequencies,
            mode_meal,
        })
    }

    pub fn frequency(&self, meal: &str) -> usize {
        self.frequencies.get(meal).copied().unwrap_or(0)
    }
}

/// Binary indicators for the tracked health tags
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthTagFlags {
    pub protein_rich: bool,
    pub fiber_rich: bool,
    pub low_calorie: bool,
    pub balanced_meal: bool,
}

/// Macronutrient features of one row
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct NutrientFeatures {
    /// This meal's own contribution
    pub meal: DailyNutritionTotals,
    /// Running total for the row's calendar day, this meal included
    pub daily: DailyNutritionTotals,
    /// `daily` over the fixed daily targets
    pub percent: DailyNutritionTotals,
}

/// Engineered features for one log entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeatureRow {
    pub date: NaiveDateTime,
    pub meal: String,
    /// Monday = 0
    pub day_of_week: u32,
    pub month: u32,
    pub day_of_month: u32,
    pub hour: u32,
    pub is_weekend: bool,
    pub season: Season,
    /// Smooth yearly heat signal in [-1, 1]
    pub temp_factor: f64,
    pub is_holiday: bool,
    pub days_to_next_holiday: i64,
    pub meal_frequency: usize,
    /// Most recent first, backfilled with the log's most frequent meal
    pub previous_meals: [String; PREVIOUS_MEALS],
    pub unique_previous_meals: usize,
    pub nutrients: NutrientFeatures,
    pub health_tags: HealthTagFlags,
    pub transition_strength: u32,
}

impl FeatureRow {
    /// Numeric vector in [`FEATURE_NAMES`] order.
    ///
    /// Fails with [`AppError::UnknownLabel`] if a previous meal was not seen
    /// in training.
    pub fn to_vector(&self, encoder: &LabelEncoder) -> AppResult<Vec<f64>> {
        let flag = |b: bool| if b { 1.0 } else { 0.0 };
        let mut vector = vec![
            self.day_of_week as f64,
            self.month as f64,
            flag(self.is_weekend),
            self.day_of_month as f64,
            flag(self.is_holiday),
            self.days_to_next_holiday as f64,
            self.meal_frequency as f64,
            self.unique_previous_meals as f64,
            self.temp_factor,
            self.nutrients.percent.calories,
            self.nutrients.percent.protein,
            self.nutrients.percent.carbs,
            self.nutrients.percent.fiber,
            self.transition_strength as f64,
        ];
        vector.extend(Season::ALL.iter().map(|s| flag(*s == self.season)));
        for meal in &self.previous_meals {
            vector.push(encoder.encode(meal)? as f64);
        }
        Ok(vector)
    }
}

/// Engineered rows plus the whole-log statistics they were built from
#[derive(Debug, Clone)]
pub struct FeatureTable {
    pub rows: Vec<FeatureRow>,
    pub context: HistoryContext,
}

/// Turns a meal log into feature rows
pub struct FeatureBuilder<'a> {
    catalog: &'a NutritionCatalog,
    holidays: &'a HolidayCalendar,
    frequency_mode: FrequencyMode,
}

impl<'a> FeatureBuilder<'a> {
    pub fn new(
        catalog: &'a NutritionCatalog,
        holidays: &'a HolidayCalendar,
        frequency_mode: FrequencyMode,
    ) -> Self {
        Self {
            catalog,
            holidays,
            frequency_mode,
        }
    }

    /// Builds one row per entry of a chronological log
    pub fn build(&self, history: &[MealLogEntry]) -> AppResult<FeatureTable> {
        if history.is_empty() {
            return Err(AppError::EmptyHistory);
        }

        let context = HistoryContext::from_history(history)?;
        let mut daily_totals: HashMap<NaiveDate, DailyNutritionTotals> = HashMap::new();
        let mut seen: HashMap<&str, usize> = HashMap::new();
        let mut rows = Vec::with_capacity(history.len());

        for (i, entry) in history.iter().enumerate() {
            let previous: [String; PREVIOUS_MEALS] = std::array::from_fn(|k| {
                i.checked_sub(k + 1)
                    .map(|j| history[j].meal.clone())
                    .unwrap_or_else(|| context.mode_meal.clone())
            });

            let daily = daily_totals.entry(entry.date.date()).or_default();
            daily.add(self.catalog.lookup(&entry.meal));

            let seen_before = seen.entry(entry.meal.as_str()).or_insert(0);
            let meal_frequency = match self.frequency_mode {
                FrequencyMode::Global => context.frequency(&entry.meal),
                FrequencyMode::Historical => *seen_before,
            };
            *seen_before += 1;

            rows.push(self.row(
                entry.date,
                &entry.meal,
                previous,
                *daily,
                meal_frequency,
                &context,
            ));
        }

        tracing::debug!(
            rows = rows.len(),
            distinct_meals = context.frequencies.len(),
            "Built feature table"
        );

        Ok(FeatureTable { rows, context })
    }

    /// Builds the row for the point being predicted.
    ///
    /// `previous_meals` is most recent first and is padded with the training
    /// log's most frequent meal. Meal-specific features describe the most
    /// recent meal, and the nutrient features reflect `daily`, the intake so
    /// far today.
    pub fn prediction_row(
        &self,
        date: NaiveDateTime,
        previous_meals: &[String],
        daily: &DailyNutritionTotals,
        context: &HistoryContext,
    ) -> AppResult<FeatureRow> {
        let anchor = previous_meals.first().ok_or(AppError::EmptyHistory)?;
        let previous: [String; PREVIOUS_MEALS] = std::array::from_fn(|k| {
            previous_meals
                .get(k)
                .cloned()
                .unwrap_or_else(|| context.mode_meal.clone())
        });

        Ok(self.row(
            date,
            anchor,
            previous,
            *daily,
            context.frequency(anchor),
            context,
        ))
    }

    fn row(
        &self,
        date: NaiveDateTime,
        meal: &str,
        previous_meals: [String; PREVIOUS_MEALS],
        daily: DailyNutritionTotals,
        meal_frequency: usize,
        context: &HistoryContext,
    ) -> FeatureRow {
        let nutrition = self.catalog.lookup(meal);
        let day = date.date();
        let day_of_week = date.weekday().num_days_from_monday();

        let mut meal_amounts = DailyNutritionTotals::default();
        meal_amounts.add(nutrition);
        let percent = DailyNutritionTotals {
            calories: daily.get(Nutrient::Calories) / PERCENT_TARGETS.calories,
            protein: daily.get(Nutrient::Protein) / PERCENT_TARGETS.protein,
            carbs: daily.get(Nutrient::Carbs) / PERCENT_TARGETS.carbs,
            fiber: daily.get(Nutrient::Fiber) / PERCENT_TARGETS.fiber,
        };

        let mut distinct: Vec<&String> = previous_meals.iter().collect();
        distinct.sort();
        distinct.dedup();
        let unique_previous_meals = distinct.len();

        FeatureRow {
            date,
            meal: meal.to_string(),
            day_of_week,
            month: date.month(),
            day_of_month: date.day(),
            hour: date.hour(),
            is_weekend: day_of_week >= 5,
            season: Season::for_date(&date),
            temp_factor: temperature_factor(day),
            is_holiday: self.holidays.is_holiday(day),
            days_to_next_holiday: self.holidays.days_to_next(day),
            meal_frequency,
            previous_meals,
            unique_previous_meals,
            nutrients: NutrientFeatures {
                meal: meal_amounts,
                daily,
                percent,
            },
            health_tags: HealthTagFlags {
                protein_rich: nutrition.has_tag("protein-rich"),
                fiber_rich: nutrition.has_tag("fiber-rich"),
                low_calorie: nutrition.has_tag("low-calorie"),
                balanced_meal: nutrition.has_tag("balanced-meal"),
            },
            transition_strength: context.transitions.strength(meal),
        }
    }
}

/// Sinusoidal heat proxy over the day of the year
pub fn temperature_factor(date: NaiveDate) -> f64 {
    let day = date.ordinal() as f64;
    (2.0 * PI * (day - TEMPERATURE_PHASE_DAY) / 365.0).sin()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn history() -> Vec<MealLogEntry> {
        vec![
            MealLogEntry::new(at(2024, 8, 14, 8), "Idli"),
            MealLogEntry::new(at(2024, 8, 14, 13), "Sambar Rice"),
            MealLogEntry::new(at(2024, 8, 14, 20), "Dosa"),
            MealLogEntry::new(at(2024, 8, 15, 8), "Idli"),
            MealLogEntry::new(at(2024, 8, 15, 13), "Sambar Rice"),
            MealLogEntry::new(at(2024, 8, 17, 9), "Idli"),
        ]
    }

    fn build(mode: FrequencyMode) -> FeatureTable {
        let catalog = NutritionCatalog::builtin();
        let holidays = HolidayCalendar::for_region("IN").unwrap();
        FeatureBuilder::new(&catalog, &holidays, mode)
            .build(&history())
            .unwrap()
    }

    #[test]
    fn test_empty_history() {
        let catalog = NutritionCatalog::builtin();
        let holidays = HolidayCalendar::for_region("IN").unwrap();
        let result = FeatureBuilder::new(&catalog, &holidays, FrequencyMode::Global).build(&[]);
        assert!(matches!(result, Err(AppError::EmptyHistory)));
    }

    #[test]
    fn test_date_and_holiday_features() {
        let table = build(FrequencyMode::Global);
        let independence_day = &table.rows[3];
        assert_eq!(independence_day.day_of_week, 3); // Thursday
        assert_eq!(independence_day.month, 8);
        assert_eq!(independence_day.day_of_month, 15);
        assert_eq!(independence_day.hour, 8);
        assert!(independence_day.is_holiday);
        assert_eq!(independence_day.days_to_next_holiday, 48);
        assert_eq!(independence_day.season, Season::Monsoon);

        let saturday = &table.rows[5];
        assert!(saturday.is_weekend);
        assert!(!saturday.is_holiday);
    }

    #[test]
    fn test_previous_meals_backfilled_with_mode() {
        let table = build(FrequencyMode::Global);
        assert_eq!(table.context.mode_meal, "Idli");
        assert_eq!(table.rows[0].previous_meals, ["Idli", "Idli", "Idli"].map(String::from));
        assert_eq!(table.rows[0].unique_previous_meals, 1);
        assert_eq!(
            table.rows[1].previous_meals,
            ["Idli", "Idli", "Idli"].map(String::from)
        );
        assert_eq!(
            table.rows[3].previous_meals,
            ["Dosa", "Sambar Rice", "Idli"].map(String::from)
        );
        assert_eq!(table.rows[3].unique_previous_meals, 3);
    }

    #[test]
    fn test_daily_totals_reset_each_day() {
        let table = build(FrequencyMode::Global);
        assert_eq!(table.rows[0].nutrients.daily.calories, 80.0);
        assert_eq!(table.rows[2].nutrients.daily.calories, 80.0 + 250.0 + 120.0);
        assert_eq!(table.rows[3].nutrients.daily.calories, 80.0);
        assert_eq!(table.rows[2].nutrients.percent.calories, 450.0 / 2000.0);
        assert_eq!(table.rows[1].nutrients.meal.protein, 6.0);
        assert_eq!(table.rows[1].nutrients.percent.protein, 8.0 / 60.0);
    }

    #[test]
    fn test_frequency_modes() {
        let global = build(FrequencyMode::Global);
        let counts: Vec<usize> = global.rows.iter().map(|r| r.meal_frequency).collect();
        assert_eq!(counts, vec![3, 2, 1, 3, 2, 3]);

        let historical = build(FrequencyMode::Historical);
        let counts: Vec<usize> = historical.rows.iter().map(|r| r.meal_frequency).collect();
        assert_eq!(counts, vec![0, 0, 0, 1, 1, 2]);
    }

    #[test]
    fn test_transitions_stay_within_a_day() {
        let table = build(FrequencyMode::Global);
        let transitions = &table.context.transitions;
        assert_eq!(transitions.count("Idli", "Sambar Rice"), 2);
        assert_eq!(transitions.count("Sambar Rice", "Dosa"), 1);
        // Dosa on the 14th is followed by Idli on the 15th: a different day
        assert_eq!(transitions.count("Dosa", "Idli"), 0);
        assert_eq!(transitions.count("Sambar Rice", "Idli"), 0);
        assert_eq!(table.rows[0].transition_strength, 2);
        assert_eq!(table.rows[2].transition_strength, 0);
    }

    #[test]
    fn test_health_tag_flags() {
        let table = build(FrequencyMode::Global);
        let sambar = table.rows[1].health_tags;
        assert!(sambar.protein_rich && sambar.fiber_rich && sambar.balanced_meal);
        assert!(!sambar.low_calorie);
        assert!(table.rows[0].health_tags.low_calorie);
    }

    #[test]
    fn test_temperature_factor_cycle() {
        let peak = temperature_factor(NaiveDate::from_ymd_opt(2023, 5, 16).unwrap());
        let trough = temperature_factor(NaiveDate::from_ymd_opt(2023, 11, 15).unwrap());
        assert!(peak > 0.99);
        assert!(trough < -0.99);
        assert!(temperature_factor(NaiveDate::from_ymd_opt(2023, 2, 14).unwrap()).abs() < 1e-9);
    }

    #[test]
    fn test_vector_layout_and_unknown_label() {
        let table = build(FrequencyMode::Global);
        let encoder = LabelEncoder::fit(history().iter().map(|e| e.meal.as_str()));
        let vector = table.rows[3].to_vector(&encoder).unwrap();
        assert_eq!(vector.len(), FEATURE_NAMES.len());
        // Monsoon one-hot
        assert_eq!(&vector[14..18], &[0.0, 0.0, 1.0, 0.0]);
        // Dosa, Sambar Rice, Idli
        assert_eq!(&vector[18..], &[0.0, 2.0, 1.0]);

        let mut row = table.rows[3].clone();
        row.previous_meals[0] = "Pizza".to_string();
        assert!(matches!(row.to_vector(&encoder), Err(AppError::UnknownLabel(m)) if m == "Pizza"));
    }

    #[test]
    fn test_prediction_row_pads_and_anchors() {
        let table = build(FrequencyMode::Global);
        let catalog = NutritionCatalog::builtin();
        let holidays = HolidayCalendar::for_region("IN").unwrap();
        let builder = FeatureBuilder::new(&catalog, &holidays, FrequencyMode::Global);
        let daily = DailyNutritionTotals {
            calories: 1000.0,
            ..DailyNutritionTotals::default()
        };

        let previous = ["Sambar Rice".to_string()];
        let row = builder
            .prediction_row(at(2024, 8, 18, 8), &previous, &daily, &table.context)
            .unwrap();
        assert_eq!(row.meal, "Sambar Rice");
        assert_eq!(row.previous_meals, ["Sambar Rice", "Idli", "Idli"].map(String::from));
        assert_eq!(row.meal_frequency, 2);
        assert_eq!(row.nutrients.percent.calories, 0.5);

        let empty = builder.prediction_row(at(2024, 8, 18, 8), &[], &daily, &table.context);
        assert!(matches!(empty, Err(AppError::EmptyHistory)));
    }
}
