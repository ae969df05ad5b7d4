//! rig-export - skinned mesh and sampled animation exporter
//!
//! Converts glTF/GLB or JSON scenes into `.mesh` and `.anim` text files.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

use rig_common::{Mesh, SampledAnimation, TextFormat};
use rig_export::export::{self, ExportOptions};
use rig_export::manifest::{ExportManifest, MANIFEST_NAME};
use rig_export::scene::gltf::DEFAULT_FPS;
use rig_export::scene::{ObjectData, Scene};
use rig_export::transform::{Axis, AxisPair};

#[derive(Parser)]
#[command(name = "rig-export")]
#[command(about = "Skinned mesh and sampled animation exporter")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export mesh objects of a scene to .mesh files
    Mesh {
        /// Input scene (glTF/GLB/JSON)
        scene: PathBuf,

        /// Export path; files are named after the objects and written to its directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        export: ExportArgs,
    },

    /// Export armature actions of a scene to .anim files
    Anim {
        /// Input scene (glTF/GLB/JSON)
        scene: PathBuf,

        /// Export path; files are named after the actions and written to its directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Export this action instead of each armature's active one
        #[arg(short, long)]
        action: Option<String>,

        /// Sample over the action's keyed range instead of the scene range
        #[arg(long)]
        use_action_frame_range: bool,

        #[command(flatten)]
        export: ExportArgs,
    },

    /// Export every scene listed in a manifest file
    Build {
        /// Path to rig-export.toml manifest
        #[arg(default_value = MANIFEST_NAME)]
        manifest: PathBuf,

        /// Export path (overrides manifest)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Validate manifest without exporting
    Check {
        /// Path to rig-export.toml manifest
        #[arg(default_value = MANIFEST_NAME)]
        manifest: PathBuf,
    },

    /// Parse a .mesh or .anim file and print a summary
    Inspect {
        /// Input .mesh or .anim file
        file: PathBuf,
    },

    /// List the objects and actions of a scene
    List {
        /// Input scene (glTF/GLB/JSON)
        scene: PathBuf,

        /// Frame rate for glTF animation time
        #[arg(long, default_value_t = DEFAULT_FPS)]
        fps: f32,
    },
}

/// Options shared by the mesh and anim commands
#[derive(Args)]
struct ExportArgs {
    /// Export every object, not only the selected ones
    #[arg(long)]
    all: bool,

    /// Mark only these objects as selected (repeatable)
    #[arg(long = "select", value_name = "OBJECT")]
    select: Vec<String>,

    /// Keep objects in their own space instead of baking the world transform
    #[arg(long)]
    no_apply_transform: bool,

    /// Target forward axis (X, Y, Z, -X, -Y, -Z)
    #[arg(long, default_value = "-Z", allow_hyphen_values = true)]
    forward: Axis,

    /// Target up axis (X, Y, Z, -X, -Y, -Z)
    #[arg(long, default_value = "Y", allow_hyphen_values = true)]
    up: Axis,

    /// Keep the scene's axis convention
    #[arg(long)]
    no_axis_conversion: bool,

    /// Frame rate for glTF animation time
    #[arg(long, default_value_t = DEFAULT_FPS)]
    fps: f32,
}

impl ExportArgs {
    fn options(&self, output: PathBuf) -> Result<ExportOptions> {
        let axes = if self.no_axis_conversion {
            None
        } else {
            Some(AxisPair::new(self.forward, self.up)?)
        };
        Ok(ExportOptions {
            output,
            use_selection: !self.all,
            apply_transform: !self.no_apply_transform,
            use_action_frame_range: false,
            axes,
            action: None,
        })
    }

    fn load_scene(&self, path: &Path) -> Result<Scene> {
        let mut scene = Scene::load(path, self.fps)?;
        if !self.select.is_empty() {
            for name in scene.select_only(&self.select) {
                tracing::warn!("Selected object {:?} not found in {:?}", name, path);
            }
        }
        Ok(scene)
    }
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Mesh {
            scene,
            output,
            export: args,
        } => {
            let options = args.options(output.unwrap_or_else(|| scene.clone()))?;
            tracing::info!("Exporting meshes {:?} -> {:?}", scene, options.output);
            let scene = args.load_scene(&scene)?;
            let written = export::export_meshes(&scene, &options).into_result()?;
            tracing::info!("Done! {} file(s) written", written.len());
        }

        Commands::Anim {
            scene,
            output,
            action,
            use_action_frame_range,
            export: args,
        } => {
            let mut options = args.options(output.unwrap_or_else(|| scene.clone()))?;
            options.action = action;
            options.use_action_frame_range = use_action_frame_range;
            tracing::info!("Exporting animations {:?} -> {:?}", scene, options.output);
            let mut scene = args.load_scene(&scene)?;
            let written = export::export_animations(&mut scene, &options).into_result()?;
            tracing::info!("Done! {} file(s) written", written.len());
        }

        Commands::Build {
            manifest,
            output,
            verbose,
        } => {
            if verbose {
                tracing::info!("Building from {:?}", manifest);
            }
            let config = ExportManifest::load(&manifest)?;
            config.validate()?;
            let base_dir = manifest.parent().unwrap_or(Path::new(""));
            let mut options = config.to_options(base_dir)?;
            if let Some(output) = output {
                options.output = output;
            }
            if verbose {
                tracing::info!("Export options: {:?}", options);
            }
            let written = config.build_all(base_dir, &options).into_result()?;
            tracing::info!("Build complete! {} file(s) written", written.len());
        }

        Commands::Check { manifest } => {
            tracing::info!("Checking manifest {:?}", manifest);
            let config = ExportManifest::load(&manifest)?;
            config.validate()?;
            tracing::info!("Manifest is valid!");
        }

        Commands::Inspect { file } => inspect(&file)?,

        Commands::List { scene, fps } => list(&scene, fps)?,
    }

    Ok(())
}

fn inspect(path: &Path) -> Result<()> {
    let text =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|s| format!(".{}", s.to_lowercase()))
        .unwrap_or_default();

    if ext == Mesh::EXTENSION {
        let mesh = Mesh::parse_text(&text).with_context(|| format!("Invalid mesh {:?}", path))?;
        let skinned = mesh
            .vertices
            .iter()
            .filter(|v| v.influence_count() > 0)
            .count();
        tracing::info!(
            "{:?}: {} joints, {} vertices ({} skinned), {} triangles",
            path,
            mesh.joints.len(),
            mesh.vertices.len(),
            skinned,
            mesh.triangles.len()
        );
        for (i, joint) in mesh.joints.iter().enumerate() {
            tracing::info!("  [{}] '{}' parent {}", i, joint.name, joint.parent_index);
        }
    } else if ext == SampledAnimation::EXTENSION {
        let anim = SampledAnimation::parse_text(&text)
            .with_context(|| format!("Invalid animation {:?}", path))?;
        tracing::info!(
            "{:?}: {} joints, {} samples",
            path,
            anim.joints.len(),
            anim.sample_count
        );
        for joint in &anim.joints {
            tracing::info!("  '{}'", joint.name);
        }
    } else {
        anyhow::bail!("Unsupported file: {:?} (use .mesh or .anim)", path);
    }
    Ok(())
}

fn list(path: &Path, fps: f32) -> Result<()> {
    let scene = Scene::load(path, fps)?;
    tracing::info!(
        "Objects in {:?} (frames {}..{}):",
        path,
        scene.frame_start,
        scene.frame_end
    );
    for object in &scene.objects {
        let marker = if object.selected { "*" } else { " " };
        match &object.data {
            ObjectData::Mesh(mesh) => tracing::info!(
                " {} mesh '{}': {} vertices, {} polygons, armature {:?}",
                marker,
                object.name,
                mesh.mesh.vertices.len(),
                mesh.mesh.polygons.len(),
                mesh.armature
            ),
            ObjectData::Armature(arm) => tracing::info!(
                " {} armature '{}': {} bones, action {:?}",
                marker,
                object.name,
                arm.armature.bones.len(),
                arm.action
            ),
            ObjectData::Empty => tracing::info!(" {} empty '{}'", marker, object.name),
        }
    }
    for action in &scene.actions {
        let (start, end) = action.frame_range();
        tracing::info!(
            "  action '{}': {} channels, frames {}..{}",
            action.name,
            action.channels.len(),
            start,
            end
        );
    }
    Ok(())
}
