//! Static reference data injected into the scorers and the feature builder.

pub mod categories;
pub mod holidays;
pub mod nutrition;

pub use categories::{CategoryTable, MealCategory};
pub use holidays::HolidayCalendar;
pub use nutrition::NutritionCatalog;
