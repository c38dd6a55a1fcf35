use std::{fs, path::Path};

use crate::{error::AppResult, services::recommendations::TrainedModel};

/// Writes the model as JSON, creating parent directories as needed
pub fn save_model(path: impl AsRef<Path>, model: &TrainedModel) -> AppResult<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_vec(model)?)?;
    tracing::info!(path = %path.display(), model_id = %model.id, "Saved meal model");
    Ok(())
}

pub fn load_model(path: impl AsRef<Path>) -> AppResult<TrainedModel> {
    let path = path.as_ref();
    let model: TrainedModel = serde_json::from_slice(&fs::read(path)?)?;
    tracing::info!(path = %path.display(), model_id = %model.id, "Loaded meal model");
    Ok(model)
}
