//! Plain-text interchange formats
//!
//! Both formats start with a version line (`[1]`) followed by whitespace
//! delimited records. Every float is written with exactly six decimal digits,
//! so identical inputs always produce byte-identical files.
//!
//! All top-level data types implement the [`TextFormat`] trait for consistent
//! writing and parsing.

pub mod animation;
mod error;
pub mod mesh;
mod reader;

pub use animation::{parse_animation, write_animation};
pub use error::FormatError;
pub use mesh::{parse_mesh, write_mesh};

use std::io::{self, Write};

/// Current version of both text formats
pub const FORMAT_VERSION: u32 = 1;

/// File extension for skinned meshes
pub const MESH_EXT: &str = ".mesh";

/// File extension for sampled animations
pub const ANIM_EXT: &str = ".anim";

/// Trait for types stored in one of the text formats.
///
/// # Example
///
/// ```
/// use rig_common::{Mesh, TextFormat};
///
/// let mesh = Mesh::default();
/// let mut text = Vec::new();
/// mesh.write_text(&mut text).unwrap();
/// let parsed = Mesh::parse_text(std::str::from_utf8(&text).unwrap()).unwrap();
/// assert_eq!(parsed.vertices.len(), 0);
/// ```
pub trait TextFormat: Sized {
    /// File extension including the leading dot
    const EXTENSION: &'static str;

    /// Write the text representation.
    fn write_text<W: Write>(&self, w: &mut W) -> io::Result<()>;

    /// Parse the text representation.
    fn parse_text(text: &str) -> Result<Self, FormatError>;
}

impl TextFormat for crate::Mesh {
    const EXTENSION: &'static str = MESH_EXT;

    fn write_text<W: Write>(&self, w: &mut W) -> io::Result<()> {
        write_mesh(w, self)
    }

    fn parse_text(text: &str) -> Result<Self, FormatError> {
        parse_mesh(text)
    }
}

impl TextFormat for crate::SampledAnimation {
    const EXTENSION: &'static str = ANIM_EXT;

    fn write_text<W: Write>(&self, w: &mut W) -> io::Result<()> {
        write_animation(w, self)
    }

    fn parse_text(text: &str) -> Result<Self, FormatError> {
        parse_animation(text)
    }
}

/// Write the `[version]` line and the blank line after it
fn write_version<W: Write>(w: &mut W) -> io::Result<()> {
    write!(w, "[{}]\n\n", FORMAT_VERSION)
}

fn write_vec3<W: Write>(w: &mut W, v: glam::Vec3) -> io::Result<()> {
    writeln!(w, "{:.6} {:.6} {:.6}", v.x, v.y, v.z)
}

fn write_vec4<W: Write>(w: &mut W, v: glam::Vec4) -> io::Result<()> {
    writeln!(w, "{:.6} {:.6} {:.6} {:.6}", v.x, v.y, v.z, v.w)
}
