use std::{path::PathBuf, sync::Arc};

use tokio::sync::RwLock;

use crate::{
    catalog::{CategoryTable, HolidayCalendar, NutritionCatalog},
    services::{EngineConfig, RecommendationEngine, Scorers},
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub inner: Arc<RwLock<AppStateInner>>,
}

/// Inner state that can be modified
pub struct AppStateInner {
    pub engine: RecommendationEngine,
    /// Where a freshly trained model is written, if anywhere
    pub model_path: Option<PathBuf>,
}

impl AppState {
    pub fn new(engine: RecommendationEngine, model_path: Option<PathBuf>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(AppStateInner { engine, model_path })),
        }
    }

    /// Untrained engine over the built-in catalogs, nothing persisted
    pub fn with_builtin_catalogs(holidays: HolidayCalendar, config: EngineConfig) -> Self {
        let catalog = Arc::new(NutritionCatalog::builtin());
        let scorers = Scorers::standard(&catalog, Arc::new(CategoryTable::builtin()));
        let engine = RecommendationEngine::new(catalog, Arc::new(holidays), scorers, config);
        Self::new(engine, None)
    }
}
