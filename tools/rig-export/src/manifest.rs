//! rig-export.toml manifest parsing
//!
//! A manifest lists the scenes to export and the shared export settings.
//! Relative paths are resolved against the manifest's directory.

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::export::{
    ExportFailure, ExportOptions, ExportReport, export_animations, export_meshes,
};
use crate::scene::Scene;
use crate::scene::gltf::DEFAULT_FPS;
use crate::transform::{Axis, AxisPair};

/// Default manifest file name
pub const MANIFEST_NAME: &str = "rig-export.toml";

/// rig-export.toml manifest structure
#[derive(Debug, Deserialize)]
pub struct ExportManifest {
    #[serde(default)]
    pub export: ExportSection,
    #[serde(default)]
    pub scenes: Vec<SceneEntry>,
}

/// Export settings shared by all scenes
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ExportSection {
    /// Export path; files land in its directory.
    /// Default: "out/" (relative to the manifest)
    pub output: PathBuf,

    /// Only export selected objects.
    /// Default: true
    pub use_selection: bool,

    /// Bake object transforms into the output.
    /// Default: true
    pub apply_transform: bool,

    /// Sample over each action's keyed range instead of the scene range.
    /// Default: false
    pub use_action_frame_range: bool,

    /// Convert into the `axis_forward` / `axis_up` convention.
    /// Default: true
    pub convert_axes: bool,

    /// Default: "-Z"
    pub axis_forward: String,

    /// Default: "Y"
    pub axis_up: String,

    /// Objects to mark as selected. Empty keeps the scene's own selection.
    pub selection: Vec<String>,

    /// Sampling rate for glTF animation time.
    /// Default: 24
    pub fps: f32,

    /// Export this action instead of each armature's active one
    pub action: Option<String>,
}

impl Default for ExportSection {
    fn default() -> Self {
        Self {
            output: PathBuf::from("out/"),
            use_selection: true,
            apply_transform: true,
            use_action_frame_range: false,
            convert_axes: true,
            axis_forward: "-Z".to_string(),
            axis_up: "Y".to_string(),
            selection: Vec::new(),
            fps: DEFAULT_FPS,
            action: None,
        }
    }
}

/// Single scene entry
#[derive(Debug, Deserialize)]
pub struct SceneEntry {
    pub path: PathBuf,

    /// Export mesh objects (default: true)
    #[serde(default = "default_true")]
    pub meshes: bool,

    /// Export animations (default: true)
    #[serde(default = "default_true")]
    pub animations: bool,
}

fn default_true() -> bool {
    true
}

impl ExportManifest {
    /// Load manifest from file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest: {}", path.display()))?;
        Self::parse(&content)
    }

    /// Parse manifest from string
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse rig-export.toml")
    }

    /// Validate manifest fields
    pub fn validate(&self) -> Result<()> {
        if self.scenes.is_empty() {
            bail!("No scenes listed in rig-export.toml (add a [[scenes]] entry)");
        }
        if !(self.export.fps.is_finite() && self.export.fps > 0.0) {
            bail!(
                "Invalid fps {} in rig-export.toml (must be positive)",
                self.export.fps
            );
        }
        self.axes()?;
        for entry in &self.scenes {
            if !entry.meshes && !entry.animations {
                warn!(
                    "Scene {} has both meshes and animations disabled",
                    entry.path.display()
                );
            }
        }
        Ok(())
    }

    /// Target axis convention, `None` if conversion is disabled
    pub fn axes(&self) -> Result<Option<AxisPair>> {
        if !self.export.convert_axes {
            return Ok(None);
        }
        let forward: Axis = self
            .export
            .axis_forward
            .parse()
            .context("Invalid axis_forward in rig-export.toml")?;
        let up: Axis = self
            .export
            .axis_up
            .parse()
            .context("Invalid axis_up in rig-export.toml")?;
        Ok(Some(
            AxisPair::new(forward, up).context("Invalid axes in rig-export.toml")?,
        ))
    }

    /// Export options with the output path resolved against `base_dir`
    pub fn to_options(&self, base_dir: &Path) -> Result<ExportOptions> {
        Ok(ExportOptions {
            output: base_dir.join(&self.export.output),
            use_selection: self.export.use_selection,
            apply_transform: self.export.apply_transform,
            use_action_frame_range: self.export.use_action_frame_range,
            axes: self.axes()?,
            action: self.export.action.clone(),
        })
    }

    /// Export every listed scene.
    ///
    /// A scene that fails to load is recorded as a failure and the remaining
    /// scenes are still exported.
    pub fn build_all(&self, base_dir: &Path, options: &ExportOptions) -> ExportReport {
        let mut report = ExportReport::default();
        for entry in &self.scenes {
            let path = base_dir.join(&entry.path);
            info!("Exporting scene {}", path.display());
            match self.load_scene(&path) {
                Ok(mut scene) => {
                    if entry.meshes {
                        report.merge(export_meshes(&scene, options));
                    }
                    if entry.animations {
                        report.merge(export_animations(&mut scene, options));
                    }
                }
                Err(err) => {
                    error!("{:#}", err);
                    report.failures.push(ExportFailure {
                        object: path.display().to_string(),
                        error: err,
                    });
                }
            }
        }
        report
    }

    fn load_scene(&self, path: &Path) -> Result<Scene> {
        let mut scene = Scene::load(path, self.export.fps)?;
        if !self.export.selection.is_empty() {
            for name in scene.select_only(&self.export.selection) {
                warn!("Selected object {:?} not found in {}", name, path.display());
            }
        }
        Ok(scene)
    }
}
