use std::sync::Arc;

use crate::catalog::CategoryTable;

const LOOK_BACK: usize = 3;
const REPEAT_PENALTY: f64 = 0.6;
const CATEGORY_PENALTY: f64 = 0.8;

/// Penalizes meals that repeat recent history, or its category
#[derive(Debug, Clone)]
pub struct VarietyScorer {
    categories: Arc<CategoryTable>,
    look_back: usize,
    repeat_penalty: f64,
    category_penalty: f64,
}

impl VarietyScorer {
    pub fn new(categories: Arc<CategoryTable>) -> Self {
        Self {
            categories,
            look_back: LOOK_BACK,
            repeat_penalty: REPEAT_PENALTY,
            category_penalty: CATEGORY_PENALTY,
        }
    }

    /// Scores `meal` against `history`, most recent first.
    ///
    /// Only the first `look_back` entries count. The repeat penalty applies
    /// once if the meal itself is there; the category penalty applies once if
    /// any entry shares the meal's category.
    pub fn score<S: AsRef<str>>(&self, meal: &str, history: &[S]) -> f64 {
        let window = &history[..history.len().min(self.look_back)];
        let mut score = 1.0;

        if window.iter().any(|h| h.as_ref() == meal) {
            score *= self.repeat_penalty;
        }

        if let Some(category) = self.categories.category_of(meal) {
            let shares_category = window
                .iter()
                .any(|h| self.categories.category_of(h.as_ref()) == Some(category));
            if shares_category {
                score *= self.category_penalty;
            }
        }

        score
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn scorer() -> VarietyScorer {
        VarietyScorer::new(Arc::new(CategoryTable::builtin()))
    }

    #[test]
    fn test_repeat_without_category() {
        let score = scorer().score("Dosa", &["Dosa", "Idli", "Dosa"]);
        assert_eq!(score, 0.6);
    }

    #[test]
    fn test_fresh_meal_scores_one() {
        assert_eq!(scorer().score("biryani", &["Dosa", "Idli"]), 1.0);
        assert_eq!(scorer().score("Dosa", &[] as &[&str]), 1.0);
    }

    #[test]
    fn test_category_penalty_applies_once() {
        let score = scorer().score("biryani", &["chole bhathure", "chole bhathure", "Idli"]);
        assert_eq!(score, 0.8);
    }

    #[test]
    fn test_repeat_and_category_compound() {
        let score = scorer().score("biryani", &["biryani", "Dosa"]);
        assert!((score - 0.6 * 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_outside_window_ignored() {
        let score = scorer().score("biryani", &["Dosa", "Idli", "Dosa", "biryani"]);
        assert_eq!(score, 1.0);
    }

    proptest! {
        #[test]
        fn prop_more_repetition_never_raises_score(
            history in proptest::collection::vec(
                prop_oneof![
                    Just("Dosa"), Just("Idli"), Just("biryani"),
                    Just("chole bhathure"), Just("Sambar Rice"),
                ],
                0..4,
            ),
            candidate in prop_oneof![Just("Dosa"), Just("biryani"), Just("Sambar Rice")],
            slot in 0usize..3,
        ) {
            let scorer = scorer();
            let before = scorer.score(candidate, &history);
            let mut repeated = history.clone();
            let at = slot.min(repeated.len());
            repeated.insert(at, candidate);
            repeated.truncate(3);
            let after = scorer.score(candidate, &repeated);
            prop_assert!(after <= before + 1e-12);
        }
    }
}
