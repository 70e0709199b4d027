//! # Configuration Constants
//!
//! Centralized constants for the starmesh geometry pipeline. All tolerances
//! used by the XZ-plane predicates, the cross-section matching and the
//! punch-out tracing loop are defined here.
//!
//! ## Categories
//!
//! - **Precision**: Floating-point comparison tolerances
//! - **Matching**: Near-point and snapping bands
//! - **Limits**: Iteration caps for runaway-loop protection
//! - **Scheduling**: Cooperative time-slice budget

// =============================================================================
// PRECISION CONSTANTS
// =============================================================================

/// Tolerance for the "both endpoints on the same side" test when cutting a
/// segment by a line.
///
/// The product of the two signed perpendicular distances must exceed this
/// value before the cut is rejected as non-separating; values within the band
/// are treated as touching the line.
///
/// # Example
///
/// ```rust
/// use config::constants::SAME_SIDE_EPSILON;
///
/// let dist_a = 0.5_f64;
/// let dist_b = 0.00001_f64;
/// let same_side = dist_a * dist_b > SAME_SIDE_EPSILON;
/// assert!(!same_side);
/// ```
pub const SAME_SIDE_EPSILON: f64 = 1e-4;

/// Tolerance on the 2D cross product when testing whether a point lies on a
/// segment in the XZ-plane.
///
/// Below this value the three points are considered collinear.
pub const COLLINEAR_EPSILON: f64 = 1e-5;

/// Manhattan-distance tolerance for "this vertex sits under that point"
/// checks in the XZ-plane.
///
/// Used when snapping polygon points onto existing mesh vertices and when
/// deciding that a trace has arrived at a polygon corner.
pub const COINCIDENT_XZ_EPSILON: f64 = 1e-4;

// =============================================================================
// MATCHING CONSTANTS
// =============================================================================

/// Euclidean near-point tolerance for cross-section vertex matching.
///
/// Two positions closer than this are considered the same point when
/// stitching segment soups into polylines and when cancelling shared edges
/// in common-border extraction.
pub const NEAR_POINT_EPSILON: f64 = 1e-3;

/// Default width of the dot-product band used by border extraction.
///
/// A vertex belongs to the border along a direction when its dot product
/// with that direction is within this tolerance of the maximum over the
/// whole mesh.
pub const BORDER_TOLERANCE: f64 = 1e-3;

/// Snap band for edge-cut ratios during polygon-edge tracing.
///
/// A cut ratio below this value (or above one minus it) reuses the existing
/// edge endpoint instead of creating a near-duplicate vertex.
pub const CUT_RATIO_SNAP: f64 = 1e-3;

/// Distance below which the trace cursor is considered to already sit on an
/// edge endpoint it has just split.
pub const TRACE_VERTEX_SNAP: f64 = 1e-5;

// =============================================================================
// LIMITS
// =============================================================================

/// Hard cap on trace steps per polygon during punch-out phase 2.
///
/// Exceeding the cap abandons the current polygon with a reported error
/// instead of spinning forever on malformed input.
pub const MAX_TRACE_STEPS: u32 = 10_000;

// =============================================================================
// SCHEDULING
// =============================================================================

/// Default wall-clock budget, in milliseconds, for one cooperative step of a
/// long-running mesh operation.
///
/// The punch-out pipeline checks elapsed time against this budget at the top
/// of each unit of work and yields back to the host scheduler once it is
/// spent.
pub const STEP_TIME_BUDGET_MS: u64 = 30;
