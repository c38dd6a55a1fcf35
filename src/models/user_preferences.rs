use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Display;

use crate::error::{AppError, AppResult};

const TIME_FORMAT: &str = "%H:%M";

/// How spicy the user likes their food
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SpiceLevel {
    Mild,
    Medium,
    Hot,
}

/// Preferred portion size
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MealSize {
    Small,
    Medium,
    Large,
}

/// Meal slot of the day
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum MealSlot {
    Breakfast,
    Lunch,
    Dinner,
}

impl Display for MealSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MealSlot::Breakfast => write!(f, "breakfast"),
            MealSlot::Lunch => write!(f, "lunch"),
            MealSlot::Dinner => write!(f, "dinner"),
        }
    }
}

/// Health goals that map to health-tag boosts
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum HealthGoal {
    WeightLoss,
    MuscleGain,
    DiabetesFriendly,
    HeartHealthy,
}

/// Preferences of the single user this engine serves
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserPreferences {
    pub vegetarian: bool,
    pub spice_level: SpiceLevel,
    pub calorie_target: f64,
    pub protein_target: f64,
    pub preferred_meals: BTreeSet<String>,
    pub avoided_meals: BTreeSet<String>,
    /// Ingredients that make a meal unsuitable
    pub allergies: BTreeSet<String>,
    pub health_goals: BTreeSet<HealthGoal>,
    pub meal_size_preference: MealSize,
    #[serde(with = "meal_times")]
    pub preferred_meal_times: BTreeMap<MealSlot, NaiveTime>,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self::new()
    }
}

impl UserPreferences {
    /// Creates the default preferences: vegetarian, medium spice and portions,
    /// breakfast at 08:00, lunch at 13:00 and dinner at 20:00
    pub fn new() -> Self {
        let preferred_meal_times = [
            (MealSlot::Breakfast, NaiveTime::from_hms_opt(8, 0, 0)),
            (MealSlot::Lunch, NaiveTime::from_hms_opt(13, 0, 0)),
            (MealSlot::Dinner, NaiveTime::from_hms_opt(20, 0, 0)),
        ]
        .into_iter()
        .filter_map(|(slot, time)| time.map(|t| (slot, t)))
        .collect();

        Self {
            vegetarian: true,
            spice_level: SpiceLevel::Medium,
            calorie_target: 2000.0,
            protein_target: 60.0,
            preferred_meals: BTreeSet::new(),
            avoided_meals: BTreeSet::new(),
            allergies: BTreeSet::new(),
            health_goals: BTreeSet::new(),
            meal_size_preference: MealSize::Medium,
            preferred_meal_times,
        }
    }

    /// Validates every field of `update` and applies it only if all pass.
    ///
    /// Returns the names of the fields that were set.
    pub fn apply(&mut self, update: PreferenceUpdate) -> AppResult<Vec<&'static str>> {
        let mut errors = Vec::new();

        if let Some(target) = update.calorie_target {
            check_target("calorie_target", target, &mut errors);
        }
        if let Some(target) = update.protein_target {
            check_target("protein_target", target, &mut errors);
        }
        for (field, names) in [
            ("preferred_meals", &update.preferred_meals),
            ("avoided_meals", &update.avoided_meals),
            ("allergies", &update.allergies),
        ] {
            if let Some(names) = names {
                if names.iter().any(|n| n.trim().is_empty()) {
                    errors.push(format!("{}: entries must not be blank", field));
                }
            }
        }

        let mut meal_times = BTreeMap::new();
        if let Some(times) = &update.preferred_meal_times {
            for (slot, raw) in times {
                match NaiveTime::parse_from_str(raw, TIME_FORMAT) {
                    Ok(time) => {
                        meal_times.insert(*slot, time);
                    }
                    Err(_) => errors.push(format!(
                        "preferred_meal_times.{}: expected HH:MM, got {:?}",
                        slot, raw
                    )),
                }
            }
        }

        if !errors.is_empty() {
            return Err(AppError::InvalidPreferences(errors));
        }

        let mut changed = Vec::new();
        if let Some(vegetarian) = update.vegetarian {
            self.vegetarian = vegetarian;
            changed.push("vegetarian");
        }
        if let Some(spice_level) = update.spice_level {
            self.spice_level = spice_level;
            changed.push("spice_level");
        }
        if let Some(target) = update.calorie_target {
            self.calorie_target = target;
            changed.push("calorie_target");
        }
        if let Some(target) = update.protein_target {
            self.protein_target = target;
            changed.push("protein_target");
        }
        if let Some(meals) = update.preferred_meals {
            self.preferred_meals = meals;
            changed.push("preferred_meals");
        }
        if let Some(meals) = update.avoided_meals {
            self.avoided_meals = meals;
            changed.push("avoided_meals");
        }
        if let Some(allergies) = update.allergies {
            self.allergies = allergies;
            changed.push("allergies");
        }
        if let Some(goals) = update.health_goals {
            self.health_goals = goals;
            changed.push("health_goals");
        }
        if let Some(size) = update.meal_size_preference {
            self.meal_size_preference = size;
            changed.push("meal_size_preference");
        }
        if update.preferred_meal_times.is_some() {
            self.preferred_meal_times = meal_times;
            changed.push("preferred_meal_times");
        }

        Ok(changed)
    }
}

fn check_target(field: &str, value: f64, errors: &mut Vec<String>) {
    if !value.is_finite() || value <= 0.0 {
        errors.push(format!("{}: must be a positive number, got {}", field, value));
    }
}

/// A partial preference update; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PreferenceUpdate {
    pub vegetarian: Option<bool>,
    pub spice_level: Option<SpiceLevel>,
    pub calorie_target: Option<f64>,
    pub protein_target: Option<f64>,
    pub preferred_meals: Option<BTreeSet<String>>,
    pub avoided_meals: Option<BTreeSet<String>>,
    pub allergies: Option<BTreeSet<String>>,
    pub health_goals: Option<BTreeSet<HealthGoal>>,
    pub meal_size_preference: Option<MealSize>,
    /// Slot to `HH:MM`
    pub preferred_meal_times: Option<BTreeMap<MealSlot, String>>,
}

impl PreferenceUpdate {
    /// Parses an update from untyped JSON, rejecting unrecognized keys
    pub fn from_value(value: serde_json::Value) -> AppResult<Self> {
        serde_json::from_value(value).map_err(|e| AppError::InvalidPreferences(vec![e.to_string()]))
    }
}

mod meal_times {
    use super::{MealSlot, TIME_FORMAT};
    use chrono::NaiveTime;
    use serde::{de::Error, ser::SerializeMap, Deserialize, Deserializer, Serializer};
    use std::collections::BTreeMap;

    pub fn serialize<S: Serializer>(
        times: &BTreeMap<MealSlot, NaiveTime>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(times.len()))?;
        for (slot, time) in times {
            map.serialize_entry(slot, &time.format(TIME_FORMAT).to_string())?;
        }
        map.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<MealSlot, NaiveTime>, D::Error> {
        BTreeMap::<MealSlot, String>::deserialize(deserializer)?
            .into_iter()
            .map(|(slot, raw)| {
                NaiveTime::parse_from_str(&raw, TIME_FORMAT)
                    .map(|time| (slot, time))
                    .map_err(|e| D::Error::custom(format!("{}: {}", slot, e)))
            })
            .collect()
    }
}
