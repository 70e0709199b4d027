//! # starmesh
//!
//! A custom mesh and cross-section toolkit for building and cutting
//! triangulated surfaces at runtime.
//!
//! ## Architecture
//!
//! ```text
//! host buffers (MeshBuffers) → CustomMesh / InterlinkedMesh
//!                                   │
//!                 CrossSection ◄────┤ border extraction
//!                       │           │
//!                  ops::extrude ────┤ new geometry
//!                  ops::punch_out ──┘ polygon holes
//!                                   │
//!                        GeometrySink (back to the host)
//! ```
//!
//! ## Modules
//!
//! - [`geometry`] — XZ-plane predicates and [`geometry::XzPolygon`]
//!   containment;
//! - [`mesh`] — the index-addressed [`mesh::CustomMesh`] and the
//!   adjacency-aware [`mesh::InterlinkedMesh`];
//! - [`cross_section`] — border polylines extracted from meshes;
//! - [`ops`] — extrusion and the time-sliced [`ops::PunchOut`] pipeline;
//! - [`buffers`] — the plain-data boundary to the host renderer;
//! - [`diagnostics`] — caller-injected sink for non-fatal geometry
//!   degeneracies.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use starmesh::{InterlinkedMesh, PunchOut, XzPolygon};
//!
//! let mut mesh = InterlinkedMesh::from_buffers(&buffers)?;
//! let mut task = PunchOut::new(vec![polygon], false);
//! task.run_to_completion(&mut mesh, &mut diagnostics);
//! mesh.attach_to(&mut sink);
//! ```

pub mod buffers;
pub mod cross_section;
pub mod diagnostics;
pub mod error;
pub mod geometry;
pub mod mesh;
pub mod ops;

pub use buffers::{GeometrySink, MeshBuffers};
pub use cross_section::CrossSection;
pub use diagnostics::{CollectingDiagnostics, Diagnostics, LogDiagnostics, NullDiagnostics};
pub use error::{MeshError, MeshResult};
pub use geometry::XzPolygon;
pub use mesh::{CustomMesh, InterlinkedMesh, Triangle, Vertex};
pub use ops::{PunchOut, StepStatus};
