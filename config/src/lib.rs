//! # Config Crate
//!
//! Centralized configuration constants for the starmesh geometry pipeline.
//! All tolerances, iteration caps and time budgets used by the mesh-editing
//! code are defined here to ensure consistency across crates and easy
//! configuration management.
//!
//! ## Usage
//!
//! ```rust
//! use config::constants::{COLLINEAR_EPSILON, MAX_TRACE_STEPS};
//!
//! let determinant: f64 = 0.000001;
//! let is_collinear = determinant.abs() < COLLINEAR_EPSILON;
//! assert!(is_collinear);
//! assert!(MAX_TRACE_STEPS >= 1000);
//! ```
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: All constants defined once, used everywhere
//! - **Well-Documented**: Every constant has clear documentation
//! - **Test-Guarded**: Relative ordering of the tolerances is unit-tested

pub mod constants;
