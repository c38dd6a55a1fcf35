//! Loading meal logs and persisting trained models.

pub mod history_csv;
pub mod model_file;

pub use history_csv::{load_history, read_history};
pub use model_file::{load_model, save_model};
