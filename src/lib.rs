//! flowdecomp: decomposition and interpolation of staggered-grid flow fields
//!
//! A Rust library and command line tool for post-processing atmospheric and
//! urban flow simulations (PALM-style output) stored in NetCDF, and for
//! turning raster topography into tile archives.
//!
//! ## Key Features
//!
//! - **Triple Decomposition**: `q = <q> + q~(x) + q'(x,t)` for every vector component
//! - **Staggered Grid Interpolation**: move `u`, `v`, `w` onto a common cell-centre grid
//! - **Trimmed Reads**: time skipping, offset trimming and coarsening while reading NetCDF
//! - **Raster Tiles**: GeoTIFF/ASCII rasters to `.npz` tiles, and tiles to 3-D obstacle masks
//!
//! ## Module Organization
//!
//! - [`decomposition`]: the numerical core
//! - [`grid`]: `Field`, `StaggerAxis` and coordinates
//! - [`netcdf_io`]: NetCDF reader and writer
//! - [`raster`]: raster loading, tile archives, topography masks
//! - [`commands`]: the batch pipelines behind each subcommand
//! - [`parallel`]: thread pool configuration
//! - [`errors`]: centralized error handling
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use flowdecomp::prelude::*;
//!
//! let ds = open_dataset("palm_3d.nc").unwrap();
//! let names = ["u".to_string(), "v".to_string(), "w".to_string()];
//! let data = read_vector_components(&ds, &names, &ReadOptions::default()).unwrap();
//!
//! let [u, _, _] = data.components;
//! let d = decompose(u).unwrap();
//! println!("<u> = {}", d.double_average);
//! ```

pub mod cli;
pub mod commands;
pub mod decomposition;
pub mod errors;
pub mod grid;
pub mod netcdf_io;
pub mod parallel;
pub mod raster;
pub mod utils;

pub use errors::*;

// High-level convenience API
pub mod prelude {
    //! Commonly used imports for convenience
    pub use crate::decomposition::{
        decompose, interpolate_staggered, prime_component, Decomposition, Interpolated,
        MagnitudeAccumulator, Magnitudes,
    };
    pub use crate::errors::{FlowError, Result};
    pub use crate::grid::{Coordinates, Field, StaggerAxis};
    pub use crate::netcdf_io::{
        open_dataset, read_3d_variable, read_vector_components, NetCDFWriter, ReadOptions,
    };
    pub use crate::parallel::ParallelConfig;
    pub use crate::raster::TileBundle;
}
