pub mod classifier;
pub mod features;
pub mod nutritional;
pub mod preference;
pub mod recommendations;
pub mod seasonality;
pub mod variety;

pub use classifier::{ClassifierParams, MealClassifier, TrainingReport};
pub use features::{FeatureBuilder, FrequencyMode};
pub use nutritional::NutritionalScorer;
pub use preference::PreferenceScorer;
pub use recommendations::{
    EngineConfig, ModelTrainer, PredictionRequest, RecommendationEngine, Scorers, TrainedModel,
    TrainingSummary,
};
pub use seasonality::SeasonalityScorer;
pub use variety::VarietyScorer;
