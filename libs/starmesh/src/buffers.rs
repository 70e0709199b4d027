//! # Geometry Buffers
//!
//! Plain buffer exchange format between the mesh toolkit and the host
//! renderer/physics collaborator. The toolkit never draws or simulates; it
//! only ingests and emits these buffers.

use glam::{DVec2, DVec3, DVec4};
use serde::{Deserialize, Serialize};

use crate::error::{MeshError, MeshResult};

/// A triangulated surface as flat attribute buffers.
///
/// `uvs`, `tangents` and `colors` may be empty (defaults are substituted on
/// ingest); when present they must match `positions` in length.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshBuffers {
    /// Vertex positions.
    pub positions: Vec<DVec3>,
    /// Texture coordinates, one per vertex or empty.
    pub uvs: Vec<DVec2>,
    /// Tangents, one per vertex or empty.
    pub tangents: Vec<DVec4>,
    /// Vertex colors (RGBA), one per vertex or empty.
    pub colors: Vec<[f32; 4]>,
    /// Triangle corner index triples.
    pub indices: Vec<[u32; 3]>,
}

impl MeshBuffers {
    /// Creates empty buffers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.indices.len()
    }

    /// Validates attribute lengths and index ranges.
    pub fn validate(&self) -> MeshResult<()> {
        let n = self.positions.len();
        if !self.uvs.is_empty() && self.uvs.len() != n {
            return Err(MeshError::invalid_buffers(format!(
                "uv count {} does not match vertex count {n}",
                self.uvs.len()
            )));
        }
        if !self.tangents.is_empty() && self.tangents.len() != n {
            return Err(MeshError::invalid_buffers(format!(
                "tangent count {} does not match vertex count {n}",
                self.tangents.len()
            )));
        }
        if !self.colors.is_empty() && self.colors.len() != n {
            return Err(MeshError::invalid_buffers(format!(
                "color count {} does not match vertex count {n}",
                self.colors.len()
            )));
        }
        for (t, tri) in self.indices.iter().enumerate() {
            for &corner in tri {
                if corner as usize >= n {
                    return Err(MeshError::invalid_buffers(format!(
                        "triangle {t} references vertex {corner}, but only {n} exist"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Host-side receiver for finished geometry.
///
/// Implemented by the renderer/physics collaborator; the toolkit hands the
/// rebuilt buffers over and stays ignorant of what happens next.
pub trait GeometrySink {
    /// Replaces the sink's geometry with the given buffers.
    fn set_geometry(&mut self, geometry: &MeshBuffers);

    /// Attaches (or refreshes) a collider built from the given buffers.
    fn attach_collider(&mut self, geometry: &MeshBuffers);
}
