use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Variety category of a meal
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum MealCategory {
    GrainBased,
    ProteinRich,
    FiberRich,
}

/// Fixed grouping of meals used to penalize repetitive categories
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoryTable {
    categories: BTreeMap<MealCategory, BTreeSet<String>>,
}

impl CategoryTable {
    pub fn new(categories: BTreeMap<MealCategory, BTreeSet<String>>) -> Self {
        Self { categories }
    }

    /// The built-in table. Fermented-batter dishes (dosa, idli) are left
    /// uncategorized.
    pub fn builtin() -> Self {
        let group = |meals: &[&str]| -> BTreeSet<String> {
            meals.iter().map(|m| m.to_string()).collect()
        };
        Self::new(BTreeMap::from([
            (MealCategory::GrainBased, group(&["Rice", "Pongal"])),
            (MealCategory::ProteinRich, group(&["biryani", "chole bhathure"])),
            (MealCategory::FiberRich, group(&["Sambar Rice", "Vegetable Kurma"])),
        ]))
    }

    /// Category of `meal`; `None` for meals absent from the table
    pub fn category_of(&self, meal: &str) -> Option<MealCategory> {
        self.categories
            .iter()
            .find(|(_, meals)| meals.contains(meal))
            .map(|(category, _)| *category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_lookup() {
        let table = CategoryTable::builtin();
        assert_eq!(table.category_of("biryani"), Some(MealCategory::ProteinRich));
        assert_eq!(table.category_of("Sambar Rice"), Some(MealCategory::FiberRich));
    }

    #[test]
    fn test_uncategorized_meals() {
        let table = CategoryTable::builtin();
        assert_eq!(table.category_of("Dosa"), None);
        assert_eq!(table.category_of("Idli"), None);
        assert_eq!(table.category_of("Pizza"), None);
    }
}
