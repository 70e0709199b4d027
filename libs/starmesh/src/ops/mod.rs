//! # Mesh Operations
//!
//! Higher-level operations over meshes and cross sections: extrusion of new
//! geometry and the time-sliced polygon punch-out pipeline.

pub mod extrude;
pub mod punch_out;

pub use extrude::{
    extrude_along_cross_section, extrude_constant_thickness, extrude_towards_plane,
};
pub use punch_out::{PunchOut, StepStatus};
