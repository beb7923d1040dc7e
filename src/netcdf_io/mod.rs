//! NetCDF I/O: reading trimmed and coarsened variables, writing results
//!
//! - [`reader`]: dataset inspection and variable extraction with offset and
//!   coarsening controls
//! - [`writer`]: creation of output dimensions and variables

pub mod reader;
pub mod writer;

pub use reader::{
    open_dataset, read_1d_variable, read_3d_variable, read_variable_with_dims,
    read_vector_components, Dataset, ReadOptions, VectorData,
};
pub use writer::{coordinate_axis, NetCDFWriter};
