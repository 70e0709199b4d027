//! # Geometry Primitives
//!
//! Stateless XZ-plane predicates and the polygon type built on them.
//!
//! Everything in this module projects 3D points onto the XZ-plane; the Y
//! component only survives through interpolation, never through the
//! predicates themselves.

pub mod polygon;
pub mod toolbox;

pub use polygon::XzPolygon;
pub use toolbox::{cut_segment_by_line, is_over_segment, segments_intersect_xz};
