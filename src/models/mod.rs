use chrono::{Datelike, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

pub mod nutrition;
pub mod user_preferences;

pub use nutrition::{DailyNutritionTotals, Nutrient, NutritionRecord, WeeklyNutritionTotals};
pub use user_preferences::{
    HealthGoal, MealSize, MealSlot, PreferenceUpdate, SpiceLevel, UserPreferences,
};

/// Calendar season used to gate seasonal scoring
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Season {
    /// December to February
    Winter,
    /// March to May
    Summer,
    /// June to September
    Monsoon,
    /// October and November
    #[serde(rename = "Post-Monsoon")]
    PostMonsoon,
}

impl Season {
    pub const ALL: [Season; 4] = [
        Season::Winter,
        Season::Summer,
        Season::Monsoon,
        Season::PostMonsoon,
    ];

    /// Season of a calendar month (1-12)
    pub fn from_month(month: u32) -> Self {
        match month {
            12 | 1 | 2 => Season::Winter,
            3..=5 => Season::Summer,
            6..=9 => Season::Monsoon,
            _ => Season::PostMonsoon,
        }
    }

    pub fn for_date<D: Datelike>(date: &D) -> Self {
        Self::from_month(date.month())
    }
}

impl Display for Season {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Season::Winter => write!(f, "Winter"),
            Season::Summer => write!(f, "Summer"),
            Season::Monsoon => write!(f, "Monsoon"),
            Season::PostMonsoon => write!(f, "Post-Monsoon"),
        }
    }
}

/// One meal eaten at a point in time
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MealLogEntry {
    pub date: NaiveDateTime,
    pub meal: String,
}

impl MealLogEntry {
    pub fn new(date: NaiveDateTime, meal: impl Into<String>) -> Self {
        Self {
            date,
            meal: meal.into(),
        }
    }
}

/// A ranked meal suggestion returned to the client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MealRecommendation {
    pub meal: String,
    /// Weighted blend of classifier probability and rule-based scores
    pub score: f64,
    pub nutrition: NutritionRecord,
    /// Seasonal ingredients for the season of the prediction date
    pub seasonal_ingredients: Vec<String>,
    pub health_tags: Vec<String>,
}
