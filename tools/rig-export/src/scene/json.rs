//! JSON scene descriptions
//!
//! The JSON form is a direct serialization of [`Scene`].

use anyhow::{Context, Result};
use std::path::Path;

use super::Scene;

pub fn load_json_scene(path: &Path) -> Result<Scene> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read scene: {:?}", path))?;
    parse_json_scene(&text).with_context(|| format!("Invalid scene: {:?}", path))
}

pub fn parse_json_scene(text: &str) -> Result<Scene> {
    let mut scene: Scene = serde_json::from_str(text)?;
    scene.validate()?;
    Ok(scene)
}
