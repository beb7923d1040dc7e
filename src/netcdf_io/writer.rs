//! Writing computed fields to a new NetCDF file
//!
//! Data is stored as single precision (`f4`). A variable created with
//! `is_dimension` set also creates the dimension of the same name, which is
//! how coordinate axes and the short parameter vectors (`uda`, `Uda`) are
//! declared.

use crate::errors::Result;
use chrono::Utc;
use ndarray::{Array1, Array3, ArrayViewD};
use netcdf::FileMut;
use std::{
    fs,
    path::{Path, PathBuf},
};

const DEFLATE_LEVEL: i32 = 4;

/// NetCDF output dataset
pub struct NetCDFWriter {
    file: FileMut,
    path: PathBuf,
    compress: bool,
}

impl NetCDFWriter {
    /// Create a new output file, replacing any existing one, and stamp its history.
    pub fn create(path: &Path, compress: bool) -> Result<Self> {
        if path.exists() {
            fs::remove_file(path)?;
        }

        let mut file = netcdf::create(path)?;
        file.add_attribute(
            "history",
            format!("Created by flowdecomp on {}", Utc::now().to_rfc3339()),
        )?;

        Ok(Self {
            file,
            path: path.to_path_buf(),
            compress,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `data` as variable `name` over the dimensions `dims`.
    ///
    /// With `is_dimension` the dimension `name` of length `len` is created first;
    /// otherwise `dims` must already exist and `len` is ignored.
    pub fn create_variable(
        &mut self,
        data: ArrayViewD<'_, f64>,
        name: &str,
        len: usize,
        units: &str,
        dims: &[&str],
        is_dimension: bool,
    ) -> Result<()> {
        if is_dimension {
            self.file.add_dimension(name, len)?;
        }

        let mut var = self.file.add_variable::<f32>(name, dims)?;
        if self.compress {
            var.set_compression(DEFLATE_LEVEL, true)?;
        }
        var.put_attribute("units", units)?;

        #[allow(clippy::cast_possible_truncation)]
        let values = data.mapv(|v| v as f32);
        var.put(values.view(), ..)?;

        let kind = if is_dimension { "parameter" } else { "variable" };
        log::info!("✅ NetCDF {kind} {name} successfully created");

        Ok(())
    }

    /// Write a one-dimensional parameter together with its own dimension.
    pub fn create_parameter(&mut self, data: &Array1<f64>, name: &str, units: &str) -> Result<()> {
        self.create_variable(data.view().into_dyn(), name, data.len(), units, &[name], true)
    }

    /// Write an evenly spaced coordinate axis `[0, d, 2d, ...]` of `n` points.
    pub fn create_coordinate_axis(
        &mut self,
        n: usize,
        spacing: f64,
        name: &str,
        units: &str,
    ) -> Result<()> {
        let axis = coordinate_axis(n, spacing);
        self.create_parameter(&axis, name, units)
    }

    /// Write a 3-D byte mask over existing dimensions.
    pub fn create_mask_variable(&mut self, data: &Array3<i8>, name: &str, dims: &[&str]) -> Result<()> {
        let mut var = self.file.add_variable::<i8>(name, dims)?;
        if self.compress {
            var.set_compression(DEFLATE_LEVEL, true)?;
        }
        var.put_attribute("units", "1")?;
        var.put(data.view(), ..)?;

        log::info!("✅ NetCDF variable {name} successfully created");
        Ok(())
    }

    /// Flush and close the file.
    pub fn finish(self) -> Result<()> {
        log::info!("Writing of output data {} ....", self.path.display());
        drop(self.file);
        log::info!(" ... done. File closed.");
        Ok(())
    }
}

/// Evenly spaced axis `[0, d, 2d, ...]` with `n` points.
#[must_use]
pub fn coordinate_axis(n: usize, spacing: f64) -> Array1<f64> {
    Array1::from_iter((0..n).map(|i| i as f64 * spacing))
}
