use std::path::PathBuf;

use anyhow::Context;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use meal_recommender::{
    api::{create_router, AppState},
    catalog::HolidayCalendar,
    config::Config,
    storage,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "meal_recommender=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let holidays = HolidayCalendar::for_region(&config.holiday_region)
        .with_context(|| format!("No holiday calendar for region {}", config.holiday_region))?;

    let state = AppState::with_builtin_catalogs(holidays, config.engine_config());
    {
        let model_path = config.model_path.as_ref().map(PathBuf::from);
        let mut inner = state.inner.write().await;
        inner.model_path = model_path.clone();

        match (&model_path, &config.history_path) {
            (Some(path), _) if path.exists() => {
                let model = storage::load_model(path)?;
                inner.engine.install_model(model);
            }
            (_, Some(history_path)) => {
                let history = storage::load_history(history_path)?;
                let (model, summary) = inner.engine.trainer().fit(&history)?;
                tracing::info!(
                    accuracy = summary.report.accuracy,
                    "Classification report:\n{}",
                    summary.report.report
                );
                if let Some(path) = &model_path {
                    storage::save_model(path, &model)?;
                }
                inner.engine.install_model(model);
            }
            _ => tracing::warn!("No model or history configured; POST /train before predicting"),
        }
    }

    let app = create_router(state).layer(CorsLayer::permissive());

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Server running on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
