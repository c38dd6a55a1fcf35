use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Indian public holidays, 2022 to 2026
#[rustfmt::skip]
const INDIA: &[(i32, u32, u32)] = &[
    (2022, 1, 26), (2022, 3, 18), (2022, 4, 14), (2022, 4, 15), (2022, 5, 3),
    (2022, 7, 10), (2022, 8, 15), (2022, 10, 2), (2022, 10, 5), (2022, 10, 24),
    (2022, 12, 25),
    (2023, 1, 26), (2023, 3, 8), (2023, 4, 7), (2023, 4, 14), (2023, 4, 22),
    (2023, 6, 29), (2023, 8, 15), (2023, 10, 2), (2023, 10, 24), (2023, 11, 12),
    (2023, 12, 25),
    (2024, 1, 26), (2024, 3, 25), (2024, 3, 29), (2024, 4, 11), (2024, 4, 14),
    (2024, 6, 17), (2024, 8, 15), (2024, 10, 2), (2024, 10, 12), (2024, 10, 31),
    (2024, 12, 25),
    (2025, 1, 26), (2025, 3, 14), (2025, 3, 31), (2025, 4, 14), (2025, 4, 18),
    (2025, 6, 7), (2025, 8, 15), (2025, 10, 2), (2025, 10, 20), (2025, 12, 25),
    (2026, 1, 26), (2026, 3, 4), (2026, 3, 21), (2026, 4, 3), (2026, 4, 14),
    (2026, 5, 27), (2026, 8, 15), (2026, 10, 2), (2026, 10, 20), (2026, 11, 8),
    (2026, 12, 25),
];

/// Fixed public holiday calendar for one region
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HolidayCalendar {
    region: String,
    dates: BTreeSet<NaiveDate>,
}

impl HolidayCalendar {
    pub fn new(region: impl Into<String>, dates: impl IntoIterator<Item = NaiveDate>) -> Self {
        Self {
            region: region.into(),
            dates: dates.into_iter().collect(),
        }
    }

    /// Built-in calendar for a region code (case-insensitive), if one exists
    pub fn for_region(region: &str) -> Option<Self> {
        let table = match region.to_ascii_uppercase().as_str() {
            "IN" => INDIA,
            _ => return None,
        };
        let dates = table
            .iter()
            .filter_map(|&(y, m, d)| NaiveDate::from_ymd_opt(y, m, d));
        Some(Self::new(region.to_ascii_uppercase(), dates))
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.dates.contains(&date)
    }

    /// Days from `date` to the first holiday strictly after it.
    ///
    /// Returns 0 when the calendar has no later holiday.
    pub fn days_to_next(&self, date: NaiveDate) -> i64 {
        use std::ops::Bound::{Excluded, Unbounded};

        self.dates
            .range((Excluded(date), Unbounded))
            .next()
            .map(|next| (*next - date).num_days())
            .unwrap_or(0)
    }
}
