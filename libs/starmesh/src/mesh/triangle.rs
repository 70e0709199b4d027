//! # Triangle
//!
//! An ordered corner triple with cached XZ bounding box and half-plane
//! normals for fast point and edge tests.

use config::constants::COINCIDENT_XZ_EPSILON;
use glam::DVec3;

use crate::geometry::{is_over_segment, segments_intersect_xz};
use crate::mesh::vertex::Vertex;

/// A mesh triangle referencing three vertices by index.
///
/// The XZ bounding box and the three inward half-plane normals are computed
/// once at construction from the corner positions at that time. They are NOT
/// refreshed when a corner vertex later moves; callers that move vertices
/// must rebuild the triangle explicitly (see
/// [`CustomMesh::rebuild_triangle`](crate::mesh::CustomMesh::rebuild_triangle)).
#[derive(Debug, Clone)]
pub struct Triangle {
    /// First corner (vertex index).
    pub a: u32,
    /// Second corner (vertex index).
    pub b: u32,
    /// Third corner (vertex index).
    pub c: u32,
    /// Slot in the owning triangle buffer.
    index: u32,

    x_min: f64,
    x_max: f64,
    z_min: f64,
    z_max: f64,

    // Inward XZ normals of the edges CA, AB and BC respectively.
    xz_normal_a: DVec3,
    xz_normal_b: DVec3,
    xz_normal_c: DVec3,
}

impl Triangle {
    /// Creates a triangle over three vertices of `vertices`.
    pub fn new(vertices: &[Vertex], a: u32, b: u32, c: u32, index: u32) -> Self {
        let pa = vertices[a as usize].position;
        let pb = vertices[b as usize].position;
        let pc = vertices[c as usize].position;

        Self {
            a,
            b,
            c,
            index,
            x_min: pa.x.min(pb.x).min(pc.x),
            x_max: pa.x.max(pb.x).max(pc.x),
            z_min: pa.z.min(pb.z).min(pc.z),
            z_max: pa.z.max(pb.z).max(pc.z),
            xz_normal_a: DVec3::new(pa.z - pc.z, 0.0, pc.x - pa.x),
            xz_normal_b: DVec3::new(pb.z - pa.z, 0.0, pa.x - pb.x),
            xz_normal_c: DVec3::new(pc.z - pb.z, 0.0, pb.x - pc.x),
        }
    }

    /// Slot in the owning triangle buffer.
    #[inline]
    pub fn index(&self) -> u32 {
        self.index
    }

    #[inline]
    pub(crate) fn set_index(&mut self, index: u32) {
        self.index = index;
    }

    /// Corner indices in order.
    #[inline]
    pub fn corners(&self) -> [u32; 3] {
        [self.a, self.b, self.c]
    }

    /// Tests whether the triangle references a vertex as a corner.
    pub fn has_corner(&self, v: u32) -> bool {
        v == self.a || v == self.b || v == self.c
    }

    /// Returns the corner that is neither of the two given ones.
    ///
    /// Precondition: both arguments are corners of this triangle.
    pub fn third_corner(&self, not_this: u32, nor_this: u32) -> u32 {
        if not_this == self.a {
            if nor_this == self.b {
                self.c
            } else {
                self.b
            }
        } else if not_this == self.b {
            if nor_this == self.a {
                self.c
            } else {
                self.a
            }
        } else if nor_this == self.b {
            self.a
        } else {
            self.b
        }
    }

    /// Quick bounding-box rejection in the XZ-plane.
    pub fn is_far_from_xz(&self, point: DVec3) -> bool {
        point.x < self.x_min - COINCIDENT_XZ_EPSILON
            || point.x > self.x_max + COINCIDENT_XZ_EPSILON
            || point.z < self.z_min - COINCIDENT_XZ_EPSILON
            || point.z > self.z_max + COINCIDENT_XZ_EPSILON
    }

    /// Tests whether a point lies strictly inside the triangle in XZ.
    ///
    /// True iff the point is on the inward side of all three cached
    /// half-planes; points on an edge report false.
    pub fn contains_xz(&self, vertices: &[Vertex], point: DVec3) -> bool {
        let pa = vertices[self.a as usize].position;
        let pb = vertices[self.b as usize].position;
        let pc = vertices[self.c as usize].position;

        (point - pa).dot(self.xz_normal_a) > 0.0
            && (point - pb).dot(self.xz_normal_b) > 0.0
            && (point - pc).dot(self.xz_normal_c) > 0.0
    }

    /// Tests whether a point lies on one of the triangle's open edges in XZ.
    ///
    /// Returns the edge's endpoints as an ordered vertex-index pair.
    pub fn border_contains_xz(&self, vertices: &[Vertex], point: DVec3) -> Option<(u32, u32)> {
        let pa = vertices[self.a as usize].position;
        let pb = vertices[self.b as usize].position;
        let pc = vertices[self.c as usize].position;

        if is_over_segment(point, pa, pb) {
            return Some((self.a, self.b));
        }
        if is_over_segment(point, pa, pc) {
            return Some((self.a, self.c));
        }
        if is_over_segment(point, pb, pc) {
            return Some((self.b, self.c));
        }
        None
    }

    /// Tests whether segment PQ crosses any triangle side in XZ.
    pub fn intersects_xz(&self, vertices: &[Vertex], p: DVec3, q: DVec3) -> bool {
        let pa = vertices[self.a as usize].position;
        let pb = vertices[self.b as usize].position;
        let pc = vertices[self.c as usize].position;

        segments_intersect_xz(p, q, pa, pb)
            || segments_intersect_xz(p, q, pa, pc)
            || segments_intersect_xz(p, q, pb, pc)
    }

    /// Unit face normal from the current corner positions.
    pub fn normal(&self, vertices: &[Vertex]) -> DVec3 {
        let pa = vertices[self.a as usize].position;
        let pb = vertices[self.b as usize].position;
        let pc = vertices[self.c as usize].position;
        (pb - pa).cross(pc - pa).normalize_or_zero()
    }

    /// Centroid of the current corner positions.
    pub fn centroid(&self, vertices: &[Vertex]) -> DVec3 {
        let pa = vertices[self.a as usize].position;
        let pb = vertices[self.b as usize].position;
        let pc = vertices[self.c as usize].position;
        (pa + pb + pc) / 3.0
    }

    /// Number of corners whose `is_inside` scratch flag is set.
    pub fn corners_with_inside_flag(&self, vertices: &[Vertex]) -> u32 {
        [self.a, self.b, self.c]
            .into_iter()
            .filter(|&v| vertices[v as usize].is_inside)
            .count() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verts(points: &[DVec3]) -> Vec<Vertex> {
        points
            .iter()
            .enumerate()
            .map(|(i, &p)| Vertex::new(p, i as u32))
            .collect()
    }

    /// Corner order matters for `contains_xz`: the half-plane normals point
    /// inward when the corners run clockwise in the XZ-plane (upward-facing
    /// surface winding).
    fn upward_triangle() -> (Vec<Vertex>, Triangle) {
        let vertices = verts(&[
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(0.0, 0.0, 2.0),
            DVec3::new(2.0, 0.0, 0.0),
        ]);
        let triangle = Triangle::new(&vertices, 0, 1, 2, 0);
        (vertices, triangle)
    }

    #[test]
    fn test_contains_xz_centroid() {
        let (vertices, triangle) = upward_triangle();
        let centroid = triangle.centroid(&vertices);
        assert!(triangle.contains_xz(&vertices, centroid));
        assert!(!triangle.is_far_from_xz(centroid));
    }

    #[test]
    fn test_contains_xz_rejects_outside_and_edges() {
        let (vertices, triangle) = upward_triangle();
        assert!(!triangle.contains_xz(&vertices, DVec3::new(1.5, 0.0, 1.5)));
        // On an edge: strictly-inside test is false, border test is true.
        let on_edge = DVec3::new(1.0, 0.0, 0.0);
        assert!(!triangle.contains_xz(&vertices, on_edge));
        assert_eq!(
            triangle.border_contains_xz(&vertices, on_edge),
            Some((0, 2))
        );
    }

    #[test]
    fn test_is_far_from_xz() {
        let (_, triangle) = upward_triangle();
        assert!(triangle.is_far_from_xz(DVec3::new(5.0, 0.0, 0.0)));
        assert!(triangle.is_far_from_xz(DVec3::new(0.0, 0.0, -1.0)));
        assert!(!triangle.is_far_from_xz(DVec3::new(2.0, 0.0, 0.0)));
    }

    #[test]
    fn test_third_corner() {
        let (_, triangle) = upward_triangle();
        assert_eq!(triangle.third_corner(0, 1), 2);
        assert_eq!(triangle.third_corner(1, 0), 2);
        assert_eq!(triangle.third_corner(0, 2), 1);
        assert_eq!(triangle.third_corner(2, 1), 0);
    }

    #[test]
    fn test_intersects_xz() {
        let (vertices, triangle) = upward_triangle();
        assert!(triangle.intersects_xz(
            &vertices,
            DVec3::new(-1.0, 0.0, 0.5),
            DVec3::new(3.0, 0.0, 0.5)
        ));
        assert!(!triangle.intersects_xz(
            &vertices,
            DVec3::new(3.0, 0.0, 3.0),
            DVec3::new(4.0, 0.0, 4.0)
        ));
    }

    #[test]
    fn test_corners_with_inside_flag() {
        let (mut vertices, triangle) = upward_triangle();
        assert_eq!(triangle.corners_with_inside_flag(&vertices), 0);
        vertices[0].is_inside = true;
        vertices[2].is_inside = true;
        assert_eq!(triangle.corners_with_inside_flag(&vertices), 2);
    }

    #[test]
    fn test_cached_geometry_is_not_live() {
        let (mut vertices, triangle) = upward_triangle();
        let centroid = triangle.centroid(&vertices);
        vertices[0].position = DVec3::new(100.0, 0.0, 100.0);
        // The cached bounding box still reflects construction time.
        assert!(!triangle.is_far_from_xz(centroid));
        // A rebuilt triangle picks up the move.
        let rebuilt = Triangle::new(&vertices, 0, 1, 2, 0);
        assert!(rebuilt.is_far_from_xz(DVec3::new(-5.0, 0.0, -5.0)));
        assert!(!rebuilt.is_far_from_xz(DVec3::new(50.0, 0.0, 50.0)));
    }
}
