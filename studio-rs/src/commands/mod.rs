//! Command implementations

pub mod info;
pub mod pose;

use anyhow::{Context, Result};
use std::path::Path;
use studio_mdl::StudioModel;

/// Load a model and point its sequence group resolver at the model's directory
pub fn load_model(path: &Path) -> Result<StudioModel> {
    log::info!("Loading studio model: {}", path.display());
    StudioModel::load(path).with_context(|| format!("Failed to load model from {}", path.display()))
}

/// Resolve a sequence given either its index or its label
pub fn find_sequence(model: &StudioModel, query: &str) -> Result<usize> {
    if let Ok(index) = query.parse::<usize>() {
        anyhow::ensure!(
            index < model.sequences.len(),
            "Sequence index {index} out of range, model has {} sequences",
            model.sequences.len()
        );
        return Ok(index);
    }

    model
        .sequences
        .iter()
        .position(|s| s.label.eq_ignore_ascii_case(query))
        .with_context(|| format!("No sequence named '{query}'"))
}
