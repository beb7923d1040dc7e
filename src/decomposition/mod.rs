//! Reynolds-style decomposition and staggered-grid interpolation of flow fields
//!
//! # Organization
//!
//! - [`operations`]: the triple decomposition and the fluctuation-from-mean helper
//! - [`interpolation`]: moving staggered components to cell centres
//! - [`magnitude`]: vector magnitudes of the decomposition terms

pub mod interpolation;
pub mod magnitude;
pub mod operations;

pub use interpolation::{interpolate_staggered, Interpolated};
pub use magnitude::{MagnitudeAccumulator, Magnitudes};
pub use operations::{decompose, prime_component, Decomposition};
