//! # Interlinked Mesh
//!
//! A [`CustomMesh`] extended with vertex-to-triangle adjacency, enabling
//! local topology walks: which triangles touch a vertex, which vertex lies
//! in a given direction, which triangle sits behind an edge.
//!
//! The adjacency lists are maintained incrementally by
//! [`InterlinkedMesh::add_triangle`] and [`InterlinkedMesh::remove_triangle`];
//! the discipline that every triangle's stored index equals its slot is
//! preserved across removals by patching the moved triangle's entries.

use std::ops::Deref;

use config::constants::COINCIDENT_XZ_EPSILON;
use glam::{DVec3, DVec4};

use crate::buffers::MeshBuffers;
use crate::error::MeshResult;
use crate::geometry::XzPolygon;
use crate::mesh::{CustomMesh, Vertex};

/// A custom mesh with per-vertex triangle adjacency.
///
/// Dereferences to [`CustomMesh`] for read access; all mutation goes through
/// the methods here so the adjacency lists stay consistent.
#[derive(Debug, Clone, Default)]
pub struct InterlinkedMesh {
    mesh: CustomMesh,
    /// For each vertex, the indices of the triangles using it as a corner.
    adjacency: Vec<Vec<u32>>,
}

impl Deref for InterlinkedMesh {
    type Target = CustomMesh;

    fn deref(&self) -> &CustomMesh {
        &self.mesh
    }
}

impl InterlinkedMesh {
    /// Creates an empty interlinked mesh.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the adjacency lists for an existing mesh.
    pub fn from_mesh(mesh: CustomMesh) -> Self {
        let mut adjacency = vec![Vec::new(); mesh.vertex_count()];
        for triangle in mesh.triangles() {
            for corner in triangle.corners() {
                adjacency[corner as usize].push(triangle.index());
            }
        }
        Self { mesh, adjacency }
    }

    /// Ingests geometry buffers and links them up.
    pub fn from_buffers(buffers: &MeshBuffers) -> MeshResult<Self> {
        Ok(Self::from_mesh(CustomMesh::from_buffers(buffers)?))
    }

    /// Consumes self, returning the plain mesh.
    pub fn into_mesh(self) -> CustomMesh {
        self.mesh
    }

    /// Returns a vertex mutably.
    ///
    /// Moving a vertex does NOT refresh cached triangle geometry; call
    /// [`CustomMesh::rebuild_triangle`] via [`InterlinkedMesh::rebuild_triangle`]
    /// on the triangles listed by [`InterlinkedMesh::triangles_at`] afterwards.
    #[inline]
    pub fn vertex_mut(&mut self, v: u32) -> &mut Vertex {
        self.mesh.vertex_mut(v)
    }

    /// Recomputes a triangle's cached geometry. See
    /// [`CustomMesh::rebuild_triangle`].
    #[inline]
    pub fn rebuild_triangle(&mut self, t: u32) {
        self.mesh.rebuild_triangle(t);
    }

    /// The triangles using a vertex as a corner.
    #[inline]
    pub fn triangles_at(&self, v: u32) -> &[u32] {
        &self.adjacency[v as usize]
    }

    /// Adds a vertex; starts with an empty adjacency list.
    pub fn add_vertex(&mut self, position: DVec3) -> u32 {
        self.adjacency.push(Vec::new());
        self.mesh.add_vertex(position)
    }

    /// Adds a vertex copying another vertex's attributes.
    pub fn add_vertex_like(&mut self, original: &Vertex) -> u32 {
        self.adjacency.push(Vec::new());
        self.mesh.add_vertex_like(original)
    }

    /// Adds a triangle and links it into its corners' adjacency lists.
    pub fn add_triangle(&mut self, a: u32, b: u32, c: u32, inverted: bool) -> u32 {
        let t = self.mesh.add_triangle(a, b, c, inverted);
        for corner in self.mesh.triangle(t).corners() {
            self.adjacency[corner as usize].push(t);
        }
        t
    }

    /// Removes a triangle and unlinks it everywhere.
    ///
    /// The former last triangle moves into the freed slot; its adjacency
    /// entries are patched to the new index.
    pub fn remove_triangle(&mut self, t: u32) {
        for corner in self.mesh.triangle(t).corners() {
            self.adjacency[corner as usize].retain(|&linked| linked != t);
        }
        let moved_from = self.mesh.triangle_count() as u32 - 1;
        self.mesh.remove_triangle(t);
        if t != moved_from {
            for corner in self.mesh.triangle(t).corners() {
                for linked in &mut self.adjacency[corner as usize] {
                    if *linked == moved_from {
                        *linked = t;
                    }
                }
            }
        }
    }

    // =========================================================================
    // TOPOLOGY WALKS
    // =========================================================================

    /// Whether two vertices share a triangle.
    pub fn are_neighbours(&self, v: u32, w: u32) -> bool {
        self.adjacency[v as usize]
            .iter()
            .any(|&t| self.mesh.triangle(t).has_corner(w))
    }

    /// Finds the nearest neighbouring vertex lying in a direction from `v`,
    /// measured in the XZ plane.
    ///
    /// A neighbour counts when its arm points the direction's way and is
    /// parallel to it within [`COINCIDENT_XZ_EPSILON`]. Returns `None` when
    /// no edge at `v` runs that way.
    pub fn neighbour_in_direction(&self, v: u32, direction: DVec3) -> Option<u32> {
        // The parallelism band is angular; reduce the direction to XZ unit
        // length so the answer does not depend on the caller's vector scale.
        let direction_length = (direction.x * direction.x + direction.z * direction.z).sqrt();
        if direction_length <= 0.0 {
            return None;
        }
        let dir_x = direction.x / direction_length;
        let dir_z = direction.z / direction_length;

        let origin = self.mesh.vertex(v).position;
        let mut best: Option<(u32, f64)> = None;
        for &t in &self.adjacency[v as usize] {
            for corner in self.mesh.triangle(t).corners() {
                if corner == v {
                    continue;
                }
                let arm = self.mesh.vertex(corner).position - origin;
                let length = (arm.x * arm.x + arm.z * arm.z).sqrt();
                if length <= 0.0 {
                    continue;
                }
                let unit = arm / length;
                let dot = dir_x * unit.x + dir_z * unit.z;
                let cross = dir_x * unit.z - dir_z * unit.x;
                if dot <= 0.0 || cross.abs() > COINCIDENT_XZ_EPSILON {
                    continue;
                }
                match best {
                    Some((_, best_length)) if best_length <= length => {}
                    _ => best = Some((corner, length)),
                }
            }
        }
        best.map(|(corner, _)| corner)
    }

    /// Finds the triangle at `v` whose far edge spans a direction from `v`,
    /// measured in the XZ plane.
    ///
    /// Returns the triangle together with its two other corners `(p, q)`,
    /// ordered so that `p` sits on the non-negative side of the direction's
    /// XZ perpendicular `(dir.z, 0, -dir.x)`.
    /// Returns `None` when the direction leaves the mesh or runs exactly
    /// along an edge (use [`InterlinkedMesh::neighbour_in_direction`] first).
    pub fn adjacent_triangle_in_direction(
        &self,
        v: u32,
        direction: DVec3,
    ) -> Option<(u32, u32, u32)> {
        let origin = self.mesh.vertex(v).position;
        // Perpendicular of the direction in XZ.
        let normal = DVec3::new(direction.z, 0.0, -direction.x);
        for &t in &self.adjacency[v as usize] {
            let triangle = self.mesh.triangle(t);
            let [a, b, c] = triangle.corners();
            let (w1, w2) = if a == v {
                (b, c)
            } else if b == v {
                (c, a)
            } else {
                (a, b)
            };
            let arm1 = self.mesh.vertex(w1).position - origin;
            let arm2 = self.mesh.vertex(w2).position - origin;
            // The "ahead" vote must weigh both arms equally regardless of
            // edge length, so it sums the XZ unit arms.
            let length1 = (arm1.x * arm1.x + arm1.z * arm1.z).sqrt();
            let length2 = (arm2.x * arm2.x + arm2.z * arm2.z).sqrt();
            let (unit1_x, unit1_z) = if length1 > 0.0 {
                (arm1.x / length1, arm1.z / length1)
            } else {
                (0.0, 0.0)
            };
            let (unit2_x, unit2_z) = if length2 > 0.0 {
                (arm2.x / length2, arm2.z / length2)
            } else {
                (0.0, 0.0)
            };
            let ahead = direction.x * (unit1_x + unit2_x) + direction.z * (unit1_z + unit2_z);
            let side1 = normal.x * arm1.x + normal.z * arm1.z;
            let side2 = normal.x * arm2.x + normal.z * arm2.z;
            if ahead > 0.0 && side1 * side2 <= 0.0 {
                let (p, q) = if side1 >= 0.0 { (w1, w2) } else { (w2, w1) };
                return Some((t, p, q));
            }
        }
        None
    }

    /// The triangle on the other side of the edge `p`-`q` from triangle `t`.
    pub fn triangle_behind(&self, t: u32, p: u32, q: u32) -> Option<u32> {
        self.adjacency[p as usize]
            .iter()
            .copied()
            .find(|&other| other != t && self.mesh.triangle(other).has_corner(q))
    }

    /// Finds any triangle using the edge `p`-`q`.
    pub fn find_triangle_with_edge(&self, p: u32, q: u32) -> Option<u32> {
        self.adjacency[p as usize]
            .iter()
            .copied()
            .find(|&t| self.mesh.triangle(t).has_corner(q))
    }

    // =========================================================================
    // BULK ATTRIBUTE PASSES
    // =========================================================================

    /// Flags every vertex lying inside a polygon's XZ footprint.
    pub fn mark_interior(&mut self, polygon: &XzPolygon) {
        for v in 0..self.mesh.vertex_count() as u32 {
            let inside = polygon.contains(self.mesh.vertex(v).position);
            self.mesh.vertex_mut(v).is_inside = inside;
        }
    }

    /// Computes per-vertex tangents from the average normal of the adjacent
    /// triangles.
    ///
    /// Each tangent is perpendicular to the averaged normal and, where
    /// possible, to the world Z axis; vertices whose normals line up with Z
    /// fall back to being perpendicular to the world X axis. Unused vertices
    /// keep their current tangent.
    pub fn compute_smooth_tangents(&mut self) {
        for v in 0..self.mesh.vertex_count() as u32 {
            let mut normal_sum = DVec3::ZERO;
            for &t in &self.adjacency[v as usize] {
                normal_sum += self.mesh.triangle(t).normal(self.mesh.vertices());
            }
            if normal_sum == DVec3::ZERO {
                continue;
            }
            let mut tangent = DVec3::Z.cross(normal_sum).normalize_or_zero();
            if tangent == DVec3::ZERO {
                tangent = DVec3::X.cross(normal_sum).normalize_or_zero();
            }
            self.mesh.vertex_mut(v).tangent = DVec4::new(tangent.x, tangent.y, tangent.z, 1.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// A 2x2 quad grid over [0,2]x[0,2] in XZ, wound clockwise seen from
    /// above (+Y normals). Vertex v(i,j) = j * 3 + i at (i, 0, j).
    fn grid_mesh() -> InterlinkedMesh {
        let mut mesh = InterlinkedMesh::new();
        for j in 0..3 {
            for i in 0..3 {
                mesh.add_vertex(DVec3::new(i as f64, 0.0, j as f64));
            }
        }
        for j in 0..2u32 {
            for i in 0..2u32 {
                let a = j * 3 + i;
                mesh.add_triangle(a, a + 3, a + 4, false);
                mesh.add_triangle(a, a + 4, a + 1, false);
            }
        }
        mesh
    }

    #[test]
    fn test_adjacency_counts() {
        let mesh = grid_mesh();
        assert_eq!(mesh.triangle_count(), 8);
        // Corner vertex 0 sits on two triangles, the centre vertex on six.
        assert_eq!(mesh.triangles_at(0).len(), 2);
        assert_eq!(mesh.triangles_at(4).len(), 6);
    }

    #[test]
    fn test_from_mesh_rebuilds_links() {
        let grid = grid_mesh();
        let relinked = InterlinkedMesh::from_mesh(grid.clone().into_mesh());
        for v in 0..grid.vertex_count() as u32 {
            let mut a: Vec<u32> = grid.triangles_at(v).to_vec();
            let mut b: Vec<u32> = relinked.triangles_at(v).to_vec();
            a.sort_unstable();
            b.sort_unstable();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_remove_triangle_patches_moved_links() {
        let mut mesh = grid_mesh();
        let last = mesh.triangle_count() as u32 - 1;
        let moved_corners = mesh.triangle(last).corners();
        mesh.remove_triangle(0);
        mesh.check_indices().unwrap();
        // The former last triangle now answers to index 0 everywhere.
        for corner in moved_corners {
            assert!(mesh.triangles_at(corner).contains(&0));
            assert!(!mesh.triangles_at(corner).contains(&last));
        }
        // And no list still references the removed slot's old tenant.
        for v in 0..mesh.vertex_count() as u32 {
            for &t in mesh.triangles_at(v) {
                assert!(mesh.triangle(t).has_corner(v));
            }
        }
    }

    #[test]
    fn test_are_neighbours() {
        let mesh = grid_mesh();
        assert!(mesh.are_neighbours(0, 1));
        assert!(mesh.are_neighbours(0, 4));
        assert!(!mesh.are_neighbours(0, 8));
        assert!(!mesh.are_neighbours(2, 6));
    }

    #[test]
    fn test_neighbour_in_direction() {
        let mesh = grid_mesh();
        // From the centre vertex, +X leads to vertex 5, -Z to vertex 1.
        assert_eq!(mesh.neighbour_in_direction(4, DVec3::X), Some(5));
        assert_eq!(
            mesh.neighbour_in_direction(4, DVec3::new(0.0, 0.0, -1.0)),
            Some(1)
        );
        // The quad diagonals run towards (±1, 0, ±1).
        assert_eq!(
            mesh.neighbour_in_direction(4, DVec3::new(1.0, 0.0, 1.0).normalize()),
            Some(8)
        );
        assert_eq!(
            mesh.neighbour_in_direction(4, DVec3::new(-1.0, 0.0, -1.0).normalize()),
            Some(0)
        );
        // No edge leaves vertex 0 towards -X.
        assert_eq!(mesh.neighbour_in_direction(0, DVec3::NEG_X), None);
    }

    #[test]
    fn test_neighbour_in_direction_prefers_nearest() {
        let mut mesh = InterlinkedMesh::new();
        let v = mesh.add_vertex(DVec3::ZERO);
        let near = mesh.add_vertex(DVec3::new(1.0, 0.0, 0.0));
        let far = mesh.add_vertex(DVec3::new(3.0, 0.0, 0.0));
        let side = mesh.add_vertex(DVec3::new(0.0, 0.0, 1.0));
        mesh.add_triangle(v, side, far, false);
        mesh.add_triangle(v, near, side, false);
        assert_eq!(mesh.neighbour_in_direction(v, DVec3::X), Some(near));
    }

    #[test]
    fn test_neighbour_in_direction_ignores_direction_scale() {
        // The parallelism band is angular, so scaling the query vector must
        // not change the answer.
        let mut mesh = InterlinkedMesh::new();
        let v = mesh.add_vertex(DVec3::ZERO);
        // 2e-5 radians off +X, well inside the tolerance band.
        let near = mesh.add_vertex(DVec3::new(1.0, 0.0, 2e-5));
        let side = mesh.add_vertex(DVec3::new(0.0, 0.0, 1.0));
        mesh.add_triangle(v, side, near, false);
        assert_eq!(mesh.neighbour_in_direction(v, DVec3::X), Some(near));
        assert_eq!(
            mesh.neighbour_in_direction(v, DVec3::X * 1000.0),
            Some(near)
        );
        assert_eq!(mesh.neighbour_in_direction(v, DVec3::X * 1e-3), Some(near));
    }

    #[test]
    fn test_adjacent_triangle_in_direction() {
        let mesh = grid_mesh();
        // From vertex 0, the ray towards (1, 0, 0.5) runs between the arms
        // to vertex 1 and to vertex 4, so it enters triangle 1 and leaves
        // through the edge 1-4.
        let direction = DVec3::new(1.0, 0.0, 0.5).normalize();
        let (t, p, q) = mesh.adjacent_triangle_in_direction(0, direction).unwrap();
        assert_eq!(t, 1);
        assert_eq!((p, q), (1, 4));

        // Leaving the mesh finds nothing.
        assert!(mesh
            .adjacent_triangle_in_direction(0, DVec3::NEG_X)
            .is_none());
    }

    #[test]
    fn test_adjacent_triangle_in_direction_lopsided_wedge() {
        // A long arm pointing nearly backwards must not outvote a short arm
        // pointing nearly forwards: the wedge spans 175 degrees and contains
        // +X, so +X has to find the triangle.
        let mut mesh = InterlinkedMesh::new();
        let v = mesh.add_vertex(DVec3::ZERO);
        let back = 170f64.to_radians();
        let front = (-5f64).to_radians();
        let w1 = mesh.add_vertex(DVec3::new(10.0 * back.cos(), 0.0, 10.0 * back.sin()));
        let w2 = mesh.add_vertex(DVec3::new(0.5 * front.cos(), 0.0, 0.5 * front.sin()));
        mesh.add_triangle(v, w1, w2, false);

        let (t, p, q) = mesh.adjacent_triangle_in_direction(v, DVec3::X).unwrap();
        assert_eq!(t, 0);
        // w2 sits on the non-negative side of the perpendicular (0, 0, -1).
        assert_eq!((p, q), (w2, w1));
    }

    #[test]
    fn test_triangle_behind_and_find_edge() {
        let mesh = grid_mesh();
        // Triangles 0 (0,3,4) and 1 (0,4,1) share the edge 0-4.
        assert_eq!(mesh.triangle_behind(0, 0, 4), Some(1));
        assert_eq!(mesh.triangle_behind(1, 0, 4), Some(0));
        // The boundary edge 0-3 has only triangle 0.
        assert_eq!(mesh.triangle_behind(0, 0, 3), None);
        assert_eq!(mesh.find_triangle_with_edge(0, 3), Some(0));
        assert_eq!(mesh.find_triangle_with_edge(0, 8), None);
    }

    #[test]
    fn test_mark_interior() {
        let mut mesh = grid_mesh();
        let polygon = XzPolygon::new(vec![
            DVec3::new(0.5, 0.0, 0.5),
            DVec3::new(0.5, 0.0, 1.5),
            DVec3::new(1.5, 0.0, 1.5),
            DVec3::new(1.5, 0.0, 0.5),
        ]);
        mesh.mark_interior(&polygon);
        for v in 0..mesh.vertex_count() as u32 {
            assert_eq!(mesh.vertex(v).is_inside, v == 4, "vertex {v}");
        }
    }

    #[test]
    fn test_compute_smooth_tangents_on_flat_grid() {
        let mut mesh = grid_mesh();
        mesh.compute_smooth_tangents();
        // All face normals point +Y, so every tangent is Z x Y = -X, w = 1.
        for vertex in mesh.vertices() {
            assert_relative_eq!(vertex.tangent.x, -1.0, epsilon = 1e-12);
            assert_relative_eq!(vertex.tangent.y, 0.0, epsilon = 1e-12);
            assert_relative_eq!(vertex.tangent.z, 0.0, epsilon = 1e-12);
            assert_relative_eq!(vertex.tangent.w, 1.0, epsilon = 1e-12);
        }
    }
}
