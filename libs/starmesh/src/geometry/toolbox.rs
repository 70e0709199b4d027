//! # Geometry Toolbox
//!
//! Stateless 2D intersection and containment primitives in the XZ-plane.
//!
//! All predicates project onto XZ but interpolate in full 3D, so a cut point
//! stays on its 3D segment even when the cutting line lies above or below it.

use config::constants::{COLLINEAR_EPSILON, SAME_SIDE_EPSILON};
use glam::DVec3;

use crate::error::{MeshError, MeshResult};

/// Flattens a vector onto the XZ-plane.
#[inline]
pub(crate) fn flatten_xz(v: DVec3) -> DVec3 {
    DVec3::new(v.x, 0.0, v.z)
}

/// Cuts segment AB by the infinite line through P and Q.
///
/// Returns the cut point (on the 3D segment AB) and the interpolation ratio
/// along AB (0 = A, 1 = B). The line is treated as vertical: only its XZ
/// footprint matters.
///
/// # Errors
///
/// - [`MeshError::DegenerateSegment`] when `a == b`
/// - [`MeshError::DegenerateLine`] when `p == q`
/// - [`MeshError::LineDoesNotSeparate`] when both endpoints lie strictly on
///   the same side of the line
///
/// When the whole segment lies on the line, the midpoint with ratio 0.5 is
/// returned as the defined fallback.
///
/// # Example
///
/// ```rust
/// use glam::DVec3;
/// use starmesh::geometry::cut_segment_by_line;
///
/// let (point, ratio) = cut_segment_by_line(
///     DVec3::new(0.0, 0.0, 0.0),
///     DVec3::new(2.0, 0.0, 0.0),
///     DVec3::new(1.0, 0.0, -1.0),
///     DVec3::new(1.0, 0.0, 1.0),
/// )
/// .unwrap();
/// assert!((point - DVec3::new(1.0, 0.0, 0.0)).length() < 1e-9);
/// assert!((ratio - 0.5).abs() < 1e-9);
/// ```
pub fn cut_segment_by_line(a: DVec3, b: DVec3, p: DVec3, q: DVec3) -> MeshResult<(DVec3, f64)> {
    if a == b {
        return Err(MeshError::DegenerateSegment {
            x: a.x,
            y: a.y,
            z: a.z,
        });
    }
    if p == q {
        return Err(MeshError::DegenerateLine {
            x: p.x,
            y: p.y,
            z: p.z,
        });
    }

    let normal_to_line = DVec3::new(q.z - p.z, 0.0, p.x - q.x).normalize();
    let dist_a = normal_to_line.dot(a - p);
    let dist_b = normal_to_line.dot(b - p);

    if dist_a * dist_b > SAME_SIDE_EPSILON {
        // Same sign, not ~0: both endpoints on the same side of the line.
        return Err(MeshError::LineDoesNotSeparate { dist_a, dist_b });
    }
    if dist_a.abs() < SAME_SIDE_EPSILON && dist_b.abs() < SAME_SIDE_EPSILON {
        // Whole segment lies on the line; the midpoint is the defined fallback.
        return Ok((a.lerp(b, 0.5), 0.5));
    }

    let dist_a = dist_a.abs();
    let dist_b = dist_b.abs();
    let cut_ratio = dist_a / (dist_a + dist_b);
    Ok((a.lerp(b, cut_ratio), cut_ratio))
}

/// Tests whether point P lies on the open segment AB in the XZ-plane.
///
/// Endpoints are excluded: the collinearity test uses the 2D cross product
/// and the confinement test rejects P at or beyond either endpoint.
pub fn is_over_segment(p: DVec3, a: DVec3, b: DVec3) -> bool {
    let ab = flatten_xz(b - a);
    let ap = flatten_xz(p - a);

    if (ab.x * ap.z - ab.z * ap.x).abs() > COLLINEAR_EPSILON {
        // Not aligned.
        return false;
    }

    if ab.dot(ap) <= 0.0 {
        // P is behind A.
        return false;
    }

    if ab.length() <= ap.length() {
        // P is at or beyond B.
        return false;
    }

    true
}

/// Tests whether segments P1-P2 and Q1-Q2 intersect in the XZ-plane.
///
/// Parallel and collinear segments (zero denominator) report no
/// intersection.
pub fn segments_intersect_xz(p1: DVec3, p2: DVec3, q1: DVec3, q2: DVec3) -> bool {
    let a = (p2.x - p1.x, p2.z - p1.z);
    let b = (q1.x - q2.x, q1.z - q2.z);
    let c = (p1.x - q1.x, p1.z - q1.z);

    let alpha_numerator = b.1 * c.0 - b.0 * c.1;
    let beta_numerator = a.0 * c.1 - a.1 * c.0;
    let denominator = a.1 * b.0 - a.0 * b.1;

    if denominator == 0.0 {
        return false;
    }

    let in_range = |numerator: f64| {
        if denominator > 0.0 {
            numerator >= 0.0 && numerator <= denominator
        } else {
            numerator <= 0.0 && numerator >= denominator
        }
    };

    in_range(alpha_numerator) && in_range(beta_numerator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_cut_vertical_line_at_half() {
        let (point, ratio) = cut_segment_by_line(
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(2.0, 0.0, 0.0),
            DVec3::new(1.0, 0.0, -1.0),
            DVec3::new(1.0, 0.0, 1.0),
        )
        .unwrap();
        assert_relative_eq!(point.x, 1.0, epsilon = 1e-9);
        assert_relative_eq!(point.z, 0.0, epsilon = 1e-9);
        assert_relative_eq!(ratio, 0.5, epsilon = 1e-9);
    }

    #[test]
    fn test_cut_preserves_segment_height() {
        // The line has no height; the cut point must stay on the 3D segment.
        let (point, ratio) = cut_segment_by_line(
            DVec3::new(0.0, 1.0, 0.0),
            DVec3::new(4.0, 3.0, 0.0),
            DVec3::new(1.0, 0.0, -5.0),
            DVec3::new(1.0, 0.0, 5.0),
        )
        .unwrap();
        assert_relative_eq!(ratio, 0.25, epsilon = 1e-9);
        assert_relative_eq!(point.y, 1.5, epsilon = 1e-9);
    }

    #[test]
    fn test_cut_rejects_degenerate_segment() {
        let a = DVec3::new(1.0, 2.0, 3.0);
        let err = cut_segment_by_line(a, a, DVec3::ZERO, DVec3::X).unwrap_err();
        assert!(matches!(err, MeshError::DegenerateSegment { .. }));
    }

    #[test]
    fn test_cut_rejects_degenerate_line() {
        let p = DVec3::new(1.0, 0.0, 1.0);
        let err = cut_segment_by_line(DVec3::ZERO, DVec3::X, p, p).unwrap_err();
        assert!(matches!(err, MeshError::DegenerateLine { .. }));
    }

    #[test]
    fn test_cut_rejects_non_separating_line() {
        // Segment entirely on the positive-x side of the line x = 0.
        let err = cut_segment_by_line(
            DVec3::new(1.0, 0.0, 0.0),
            DVec3::new(2.0, 0.0, 0.0),
            DVec3::new(0.0, 0.0, -1.0),
            DVec3::new(0.0, 0.0, 1.0),
        )
        .unwrap_err();
        assert!(matches!(err, MeshError::LineDoesNotSeparate { .. }));
    }

    #[test]
    fn test_cut_segment_on_line_falls_back_to_midpoint() {
        // Segment collinear with the line: defined fallback, not an error.
        let (point, ratio) = cut_segment_by_line(
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(0.0, 0.0, 2.0),
            DVec3::new(0.0, 0.0, -10.0),
            DVec3::new(0.0, 0.0, 10.0),
        )
        .unwrap();
        assert_relative_eq!(point.z, 1.0, epsilon = 1e-9);
        assert_relative_eq!(ratio, 0.5, epsilon = 1e-9);
    }

    #[test]
    fn test_is_over_segment_interior_point() {
        let a = DVec3::new(0.0, 0.0, 0.0);
        let b = DVec3::new(4.0, 0.0, 0.0);
        assert!(is_over_segment(DVec3::new(2.0, 0.0, 0.0), a, b));
        // Height is ignored.
        assert!(is_over_segment(DVec3::new(2.0, 7.0, 0.0), a, b));
    }

    #[test]
    fn test_is_over_segment_excludes_endpoints() {
        let a = DVec3::new(0.0, 0.0, 0.0);
        let b = DVec3::new(4.0, 0.0, 0.0);
        assert!(!is_over_segment(a, a, b));
        assert!(!is_over_segment(b, a, b));
    }

    #[test]
    fn test_is_over_segment_rejects_offset_and_beyond() {
        let a = DVec3::new(0.0, 0.0, 0.0);
        let b = DVec3::new(4.0, 0.0, 0.0);
        assert!(!is_over_segment(DVec3::new(2.0, 0.0, 0.5), a, b));
        assert!(!is_over_segment(DVec3::new(5.0, 0.0, 0.0), a, b));
        assert!(!is_over_segment(DVec3::new(-1.0, 0.0, 0.0), a, b));
    }

    #[test]
    fn test_segments_intersect_crossing() {
        assert!(segments_intersect_xz(
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(2.0, 0.0, 2.0),
            DVec3::new(0.0, 0.0, 2.0),
            DVec3::new(2.0, 0.0, 0.0),
        ));
    }

    #[test]
    fn test_segments_intersect_disjoint() {
        assert!(!segments_intersect_xz(
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(1.0, 0.0, 0.0),
            DVec3::new(0.0, 0.0, 1.0),
            DVec3::new(1.0, 0.0, 1.0),
        ));
    }

    #[test]
    fn test_segments_intersect_parallel_is_false() {
        // Collinear overlapping segments: zero denominator, defined as no
        // intersection.
        assert!(!segments_intersect_xz(
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(2.0, 0.0, 0.0),
            DVec3::new(1.0, 0.0, 0.0),
            DVec3::new(3.0, 0.0, 0.0),
        ));
    }
}
