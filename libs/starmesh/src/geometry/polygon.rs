//! # XZ Polygon
//!
//! A closed polyline in the XZ-plane with a cached bounding box and a
//! ray-casting containment test.

use glam::DVec3;

/// Closed polygon in the XZ-plane.
///
/// The point sequence is always closed (first point repeated at the end) and
/// flattened to Y = 0. Containment uses a leftward ray cast whose boundary
/// rules are deliberately asymmetric; see [`XzPolygon::contains`].
#[derive(Debug, Clone, PartialEq)]
pub struct XzPolygon {
    points: Vec<DVec3>,
    x_min: f64,
    x_max: f64,
    z_min: f64,
    z_max: f64,
}

impl XzPolygon {
    /// Creates a polygon from an ordered point list.
    ///
    /// If the polyline is open it is closed by repeating the first point.
    /// Y components are zeroed.
    pub fn new(mut points: Vec<DVec3>) -> Self {
        if let (Some(&first), Some(&last)) = (points.first(), points.last()) {
            if first != last {
                points.push(first);
            }
        }
        for p in &mut points {
            p.y = 0.0;
        }

        let mut polygon = Self {
            points,
            x_min: f64::INFINITY,
            x_max: f64::NEG_INFINITY,
            z_min: f64::INFINITY,
            z_max: f64::NEG_INFINITY,
        };
        polygon.compute_bounding_box();
        polygon
    }

    /// Creates a triangle polygon.
    pub fn from_triangle(a: DVec3, b: DVec3, c: DVec3) -> Self {
        Self::new(vec![a, b, c])
    }

    /// Returns the closed point sequence (first point == last point).
    pub fn points(&self) -> &[DVec3] {
        &self.points
    }

    /// Number of distinct corners (the closing point is not counted).
    pub fn corner_count(&self) -> usize {
        self.points.len().saturating_sub(1)
    }

    /// Returns the XZ bounding box as `(x_min, x_max, z_min, z_max)`.
    pub fn bounding_box(&self) -> (f64, f64, f64, f64) {
        (self.x_min, self.x_max, self.z_min, self.z_max)
    }

    /// Recomputes the cached bounding box from the point sequence.
    pub fn compute_bounding_box(&mut self) {
        self.x_min = f64::INFINITY;
        self.x_max = f64::NEG_INFINITY;
        self.z_min = f64::INFINITY;
        self.z_max = f64::NEG_INFINITY;
        for p in &self.points {
            self.x_min = self.x_min.min(p.x);
            self.x_max = self.x_max.max(p.x);
            self.z_min = self.z_min.min(p.z);
            self.z_max = self.z_max.max(p.z);
        }
    }

    /// Tests whether a point is inside the polygon, projected onto XZ.
    ///
    /// Counts how many edges cross the leftward ray through the point; the
    /// point is inside iff the count is odd. Boundary rules, kept exactly as
    /// calibrated:
    ///
    /// - horizontal edges are ignored,
    /// - an edge's upper endpoint counts, its lower endpoint does not
    ///   (avoids double-counting edges that meet exactly on the ray),
    /// - the bounding-box pre-check is half-open on the max edges, so a point
    ///   touching the right or top boundary reports outside.
    pub fn contains(&self, point: DVec3) -> bool {
        // Cheap rejection first.
        if point.x < self.x_min
            || point.x >= self.x_max
            || point.z < self.z_min
            || point.z >= self.z_max
        {
            return false;
        }

        let mut intersections = 0u32;

        for window in self.points.windows(2) {
            let (mut a, mut b) = (window[0], window[1]);

            // Make A the upper endpoint.
            if a.z < b.z {
                std::mem::swap(&mut a, &mut b);
            }

            // Ignore horizontal edges.
            if a.z == b.z {
                continue;
            }

            // Edge entirely above the ray (lower endpoint inclusive).
            if b.z >= point.z {
                continue;
            }

            // Edge entirely below the ray (upper endpoint exclusive).
            if a.z < point.z {
                continue;
            }

            // Edge entirely right of the point: no crossing.
            if a.x >= point.x && b.x >= point.x {
                continue;
            }

            // Edge entirely left of the point: guaranteed crossing.
            if a.x <= point.x && b.x <= point.x {
                intersections += 1;
                continue;
            }

            // Mixed case: compute the exact crossing X at the ray height.
            let cut_ratio = (point.z - b.z) / (a.z - b.z);
            let crossing = b.lerp(a, cut_ratio);
            if crossing.x < point.x {
                intersections += 1;
            }
        }

        intersections % 2 == 1
    }
}
