//! # Custom Mesh
//!
//! An index-addressed triangle mesh that takes the bookkeeping out of
//! building geometry by hand.
//!
//! Use it as follows:
//! - create a [`CustomMesh`] (empty, from buffers, or by cloning),
//! - add vertices with [`CustomMesh::add_vertex`],
//! - add triangles with [`CustomMesh::add_triangle`] or
//!   [`CustomMesh::add_quadrangle`], referencing vertices by index,
//! - hand the result to the host with [`CustomMesh::attach_to`] and
//!   optionally [`CustomMesh::add_collider`].

pub mod interlinked;
pub mod triangle;
pub mod vertex;

pub use interlinked::InterlinkedMesh;
pub use triangle::Triangle;
pub use vertex::Vertex;

use glam::DVec3;

use crate::buffers::{GeometrySink, MeshBuffers};
use crate::error::{MeshError, MeshResult};

/// An index-addressed triangle mesh.
///
/// Vertices and triangles live in owning vectors; every element's stored
/// index equals its slot. Removal uses swap-with-last and fixes the moved
/// element's index, so the invariant holds across any sequence of adds and
/// removes.
#[derive(Debug, Clone, Default)]
pub struct CustomMesh {
    vertices: Vec<Vertex>,
    triangles: Vec<Triangle>,
}

impl CustomMesh {
    /// Creates an empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ingests a mesh from plain geometry buffers.
    ///
    /// Missing attribute buffers are filled with defaults; mismatched
    /// lengths or out-of-range indices are rejected.
    pub fn from_buffers(buffers: &MeshBuffers) -> MeshResult<Self> {
        buffers.validate()?;

        let mut mesh = Self::new();
        for (i, &position) in buffers.positions.iter().enumerate() {
            let v = mesh.add_vertex(position);
            let vertex = &mut mesh.vertices[v as usize];
            if let Some(&uv) = buffers.uvs.get(i) {
                vertex.uv = uv;
            }
            if let Some(&tangent) = buffers.tangents.get(i) {
                vertex.tangent = tangent;
            }
            if let Some(&color) = buffers.colors.get(i) {
                vertex.color = color;
            }
        }
        for &[a, b, c] in &buffers.indices {
            mesh.add_triangle(a, b, c, false);
        }
        Ok(mesh)
    }

    /// Clones another custom mesh 1:1.
    ///
    /// Vertex and triangle indices correspond between original and clone.
    pub fn clone_of(original: &CustomMesh) -> Self {
        let mut mesh = Self::new();
        for vertex in &original.vertices {
            mesh.add_vertex_like(vertex);
        }
        for triangle in &original.triangles {
            mesh.add_triangle(triangle.a, triangle.b, triangle.c, false);
        }
        mesh
    }

    /// Clones another custom mesh shifted by an offset, optionally flipped.
    pub fn clone_with_offset(original: &CustomMesh, offset: DVec3, flipped: bool) -> Self {
        let mut mesh = Self::new();
        for (i, vertex) in original.vertices.iter().enumerate() {
            debug_assert_eq!(vertex.index() as usize, i);
            let v = mesh.add_vertex(vertex.position + offset);
            mesh.vertices[v as usize].uv = vertex.uv;
        }
        for triangle in &original.triangles {
            mesh.add_triangle(triangle.a, triangle.b, triangle.c, flipped);
        }
        mesh
    }

    // =========================================================================
    // VERTICES
    // =========================================================================

    /// Number of vertices.
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of triangles.
    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Returns the vertex buffer.
    #[inline]
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Returns the triangle buffer.
    #[inline]
    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    /// Returns a vertex by index.
    #[inline]
    pub fn vertex(&self, v: u32) -> &Vertex {
        &self.vertices[v as usize]
    }

    /// Returns a vertex mutably.
    ///
    /// Moving a vertex does NOT refresh cached triangle geometry; call
    /// [`CustomMesh::rebuild_triangle`] on affected triangles afterwards.
    #[inline]
    pub fn vertex_mut(&mut self, v: u32) -> &mut Vertex {
        &mut self.vertices[v as usize]
    }

    /// Returns a triangle by index.
    #[inline]
    pub fn triangle(&self, t: u32) -> &Triangle {
        &self.triangles[t as usize]
    }

    /// Adds a vertex at a position and returns its index.
    pub fn add_vertex(&mut self, position: DVec3) -> u32 {
        let index = self.vertices.len() as u32;
        self.vertices.push(Vertex::new(position, index));
        index
    }

    /// Adds a vertex copying another vertex's attributes.
    pub fn add_vertex_like(&mut self, original: &Vertex) -> u32 {
        let index = self.vertices.len() as u32;
        self.vertices.push(Vertex::like(original, index));
        index
    }

    /// Finds the most recently added vertex sitting under a point in XZ.
    pub fn find_vertex_under(&self, position: DVec3) -> Option<u32> {
        self.vertices
            .iter()
            .rev()
            .find(|vertex| vertex.is_under(position))
            .map(Vertex::index)
    }

    // =========================================================================
    // TRIANGLES
    // =========================================================================

    /// Adds a triangle over three vertices and returns its index.
    ///
    /// `inverted` swaps the second and third corner, flipping the winding.
    pub fn add_triangle(&mut self, a: u32, b: u32, c: u32, inverted: bool) -> u32 {
        let (b, c) = if inverted { (c, b) } else { (b, c) };
        let index = self.triangles.len() as u32;
        self.triangles
            .push(Triangle::new(&self.vertices, a, b, c, index));
        index
    }

    /// Adds two triangles forming a quadrangle with diagonal A-C.
    pub fn add_quadrangle(&mut self, a: u32, b: u32, c: u32, d: u32, inverted: bool) {
        self.add_triangle(a, b, c, inverted);
        self.add_triangle(a, c, d, inverted);
    }

    /// Removes a triangle by index.
    ///
    /// Swap-with-last: the former last triangle moves into the freed slot
    /// and its stored index is fixed up.
    pub fn remove_triangle(&mut self, t: u32) {
        self.triangles.swap_remove(t as usize);
        if let Some(moved) = self.triangles.get_mut(t as usize) {
            moved.set_index(t);
        }
    }

    /// Recomputes a triangle's cached bounding box and half-plane normals
    /// from the current corner positions.
    pub fn rebuild_triangle(&mut self, t: u32) {
        let old = &self.triangles[t as usize];
        let rebuilt = Triangle::new(&self.vertices, old.a, old.b, old.c, old.index());
        self.triangles[t as usize] = rebuilt;
    }

    // =========================================================================
    // OUTPUT
    // =========================================================================

    /// Rebuilds the plain geometry buffers from the current mesh state.
    pub fn buffers(&self) -> MeshBuffers {
        let mut buffers = MeshBuffers {
            positions: Vec::with_capacity(self.vertices.len()),
            uvs: Vec::with_capacity(self.vertices.len()),
            tangents: Vec::with_capacity(self.vertices.len()),
            colors: Vec::with_capacity(self.vertices.len()),
            indices: Vec::with_capacity(self.triangles.len()),
        };
        for vertex in &self.vertices {
            buffers.positions.push(vertex.position);
            buffers.uvs.push(vertex.uv);
            buffers.tangents.push(vertex.tangent);
            buffers.colors.push(vertex.color);
        }
        for triangle in &self.triangles {
            buffers.indices.push(triangle.corners());
        }
        buffers
    }

    /// Hands the rebuilt buffers to a host geometry sink.
    pub fn attach_to(&self, sink: &mut dyn GeometrySink) {
        sink.set_geometry(&self.buffers());
    }

    /// Asks the host to build a collider from the rebuilt buffers.
    pub fn add_collider(&self, sink: &mut dyn GeometrySink) {
        sink.attach_collider(&self.buffers());
    }

    /// Checks the index-discipline invariant; used by tests and debugging.
    pub fn check_indices(&self) -> MeshResult<()> {
        for (i, vertex) in self.vertices.iter().enumerate() {
            if vertex.index() as usize != i {
                return Err(MeshError::invalid_topology(format!(
                    "vertex at slot {i} carries index {}",
                    vertex.index()
                )));
            }
        }
        for (t, triangle) in self.triangles.iter().enumerate() {
            if triangle.index() as usize != t {
                return Err(MeshError::invalid_topology(format!(
                    "triangle at slot {t} carries index {}",
                    triangle.index()
                )));
            }
            for corner in triangle.corners() {
                if corner as usize >= self.vertices.len() {
                    return Err(MeshError::invalid_topology(format!(
                        "triangle {t} references missing vertex {corner}"
                    )));
                }
            }
        }
        Ok(())
    }
}
