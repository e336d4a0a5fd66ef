//! Procedural terrain: noise, spline sampling, line sources and the
//! streaming segment generator.

pub mod noise_field;
pub mod source;
pub mod spline;
pub mod terrain;

pub use noise_field::NoiseField;
pub use source::*;
pub use spline::{interpolate, interpolate_closed, OUTLINE_SAMPLE_SPACING, TERRAIN_SAMPLE_SPACING};
pub use terrain::*;
