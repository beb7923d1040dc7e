//! Centralized error handling for flowdecomp
//!
//! Every fallible operation in the crate returns [`Result`], so the command
//! line entry point has a single place to report a failure and pick the exit
//! code.

use thiserror::Error;

/// Main error type for flowdecomp operations
#[derive(Debug, Error)]
pub enum FlowError {
    /// NetCDF file operation errors
    #[error("NetCDF error: {0}")]
    NetCDFError(#[from] netcdf::Error),

    /// I/O operation errors
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Array shape or dimension error
    #[error("Array error: {0}")]
    ArrayError(#[from] ndarray::ShapeError),

    /// TIFF decoding errors
    #[error("TIFF error: {0}")]
    TiffError(#[from] tiff::TiffError),

    /// Writing a tile archive failed
    #[error("Tile archive write error: {0}")]
    NpzWriteError(#[from] ndarray_npy::WriteNpzError),

    /// Reading a tile archive failed
    #[error("Tile archive read error: {0}")]
    NpzReadError(#[from] ndarray_npy::ReadNpzError),

    /// Run log serialization errors
    #[error("Run log error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Variable requested but absent from the dataset's name list
    #[error("Variable '{var}' not in list {available:?}")]
    VariableNotFound { var: String, available: Vec<String> },

    /// Dataset without variables or dimensions
    #[error("Dataset has zero {what}")]
    EmptyDataset { what: String },

    /// Offsets or stride that do not fit the variable
    #[error("Invalid slice specification: {message}")]
    InvalidSlice { message: String },

    /// Unrecognized staggered component designator
    #[error("Invalid component string: '{designator}' (expected one of x, y, z, i, j, k)")]
    InvalidComponent { designator: String },

    /// Array too small or of the wrong rank for the operation
    #[error("Invalid array shape: {message}")]
    InvalidShape { message: String },

    /// Argument outside its valid range
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// Two arrays that must agree in shape do not
    #[error("Shape mismatch: expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        found: Vec<usize>,
    },

    /// Averaging over an empty field
    #[error("Cannot average an empty field of shape {shape:?}")]
    EmptyField { shape: Vec<usize> },

    /// Malformed raster input
    #[error("Raster format error: {message}")]
    RasterFormat { message: String },

    /// Neither the command line nor the raster provides a pixel spacing
    #[error("No resolution given and the raster carries no pixel scale")]
    MissingResolution,

    /// Thread pool configuration error
    #[error("Thread pool error: {0}")]
    ThreadPoolError(String),

    /// Generic error
    #[error("{0}")]
    Generic(String),
}

impl From<String> for FlowError {
    fn from(error: String) -> Self {
        FlowError::Generic(error)
    }
}

impl From<&str> for FlowError {
    fn from(error: &str) -> Self {
        FlowError::Generic(error.to_string())
    }
}

/// Result type alias for flowdecomp operations
pub type Result<T> = std::result::Result<T, FlowError>;
