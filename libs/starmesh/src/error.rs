//! # Error Types
//!
//! Error types for mesh and geometry operations.
//!
//! ## Error Policy
//!
//! - Degenerate inputs to the low-level predicates are explicit errors,
//!   never panics.
//! - The long-running punch-out pipeline converts these errors into
//!   diagnostics plus a defined fallback so one malformed polygon cannot
//!   abort a whole batch.

use thiserror::Error;

/// Errors that can occur during mesh and geometry operations.
#[derive(Debug, Error)]
pub enum MeshError {
    /// A segment's endpoints coincide.
    #[error("Degenerate segment: endpoints coincide at ({x}, {y}, {z})")]
    DegenerateSegment { x: f64, y: f64, z: f64 },

    /// A line's defining points coincide.
    #[error("Degenerate line: defining points coincide at ({x}, {y}, {z})")]
    DegenerateLine { x: f64, y: f64, z: f64 },

    /// Both segment endpoints lie strictly on the same side of the cutting
    /// line.
    #[error("Line does not separate segment endpoints (distances {dist_a}, {dist_b})")]
    LineDoesNotSeparate { dist_a: f64, dist_b: f64 },

    /// Input geometry buffers are inconsistent.
    #[error("Invalid buffers: {0}")]
    InvalidBuffers(String),

    /// Mesh connectivity is inconsistent.
    #[error("Invalid topology: {0}")]
    InvalidTopology(String),
}

impl MeshError {
    /// Creates an invalid-buffers error.
    pub fn invalid_buffers(message: impl Into<String>) -> Self {
        Self::InvalidBuffers(message.into())
    }

    /// Creates an invalid-topology error.
    pub fn invalid_topology(message: impl Into<String>) -> Self {
        Self::InvalidTopology(message.into())
    }
}

/// Result type alias for mesh operations.
pub type MeshResult<T> = Result<T, MeshError>;
