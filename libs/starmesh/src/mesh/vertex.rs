//! # Vertex
//!
//! A mesh point with render attributes and scratch state.

use config::constants::COINCIDENT_XZ_EPSILON;
use glam::{DVec2, DVec3, DVec4};

/// Default vertex color (opaque white).
pub const DEFAULT_COLOR: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

/// A mesh vertex.
///
/// Owned by a [`CustomMesh`](crate::mesh::CustomMesh) or a
/// [`CrossSection`](crate::cross_section::CrossSection); `index` always
/// equals the vertex's slot in the owning buffer.
#[derive(Debug, Clone)]
pub struct Vertex {
    /// Position, in the owner's frame of reference.
    pub position: DVec3,
    /// Texture coordinates.
    pub uv: DVec2,
    /// Tangent (xyz direction, w handedness).
    pub tangent: DVec4,
    /// Vertex color (RGBA).
    pub color: [f32; 4],
    /// Slot in the owning buffer.
    index: u32,
    /// Scratch flag for region classification passes.
    pub is_inside: bool,
    /// Scratch original-to-copy correlation, set on the *source* vertex by
    /// copy operations and valid until the next copy.
    pub copy_link: Option<u32>,
}

impl Vertex {
    /// Creates a vertex at a position.
    pub fn new(position: DVec3, index: u32) -> Self {
        Self {
            position,
            uv: DVec2::ZERO,
            tangent: DVec4::ZERO,
            color: DEFAULT_COLOR,
            index,
            is_inside: false,
            copy_link: None,
        }
    }

    /// Creates a vertex copying another vertex's attributes.
    pub fn like(original: &Vertex, index: u32) -> Self {
        Self {
            position: original.position,
            uv: original.uv,
            tangent: original.tangent,
            color: original.color,
            index,
            is_inside: false,
            copy_link: None,
        }
    }

    /// Slot in the owning buffer.
    #[inline]
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Tests whether a point sits over this vertex in the XZ-plane, by
    /// Manhattan distance.
    pub fn is_under(&self, point: DVec3) -> bool {
        (point.x - self.position.x).abs() + (point.z - self.position.z).abs()
            < COINCIDENT_XZ_EPSILON
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_under_manhattan_band() {
        let v = Vertex::new(DVec3::new(1.0, 5.0, 2.0), 0);
        assert!(v.is_under(DVec3::new(1.0, -3.0, 2.0)));
        assert!(v.is_under(DVec3::new(1.00004, 0.0, 2.00004)));
        assert!(!v.is_under(DVec3::new(1.1, 0.0, 2.0)));
        assert!(!v.is_under(DVec3::new(1.00006, 0.0, 2.00006)));
    }

    #[test]
    fn test_like_copies_attributes_not_scratch() {
        let mut original = Vertex::new(DVec3::ONE, 3);
        original.uv = DVec2::new(0.25, 0.75);
        original.tangent = DVec4::new(1.0, 0.0, 0.0, 1.0);
        original.is_inside = true;
        original.copy_link = Some(7);

        let copy = Vertex::like(&original, 9);
        assert_eq!(copy.position, original.position);
        assert_eq!(copy.uv, original.uv);
        assert_eq!(copy.tangent, original.tangent);
        assert_eq!(copy.index(), 9);
        assert!(!copy.is_inside);
        assert!(copy.copy_link.is_none());
    }
}
