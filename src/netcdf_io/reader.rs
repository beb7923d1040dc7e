//! Reading NetCDF variables with offset trimming and coarsening
//!
//! Every read takes the list of names it is allowed to touch. A name missing
//! from that list fails with [`FlowError::VariableNotFound`] before the file
//! is accessed.

use crate::errors::{FlowError, Result};
use crate::grid::{Coordinates, Field};
use ndarray::{Array1, ArrayD, Ix1, Ix4};
use netcdf::{Extent, File};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// An open NetCDF file together with its variable and dimension names.
pub struct Dataset {
    file: File,
    path: PathBuf,
    pub variables: Vec<String>,
    pub dimensions: Vec<String>,
}

impl Dataset {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file(&self) -> &File {
        &self.file
    }

    /// Dimension names of a variable, outermost first.
    pub fn dimension_names(&self, var_name: &str) -> Result<Vec<String>> {
        let var = self.variable(var_name)?;
        Ok(var
            .dimensions()
            .iter()
            .map(|d| d.name().to_string())
            .collect())
    }

    fn variable(&self, var_name: &str) -> Result<netcdf::Variable<'_>> {
        self.file
            .variable(var_name)
            .ok_or_else(|| FlowError::VariableNotFound {
                var: var_name.to_string(),
                available: self.variables.clone(),
            })
    }

    /// Extent of every dimension of a variable.
    fn shape(&self, var_name: &str) -> Result<Vec<usize>> {
        let var = self.variable(var_name)?;
        Ok(var
            .dimensions()
            .iter()
            .map(netcdf::Dimension::len)
            .collect())
    }

    /// Reads the hyperslab selected by `ranges`, one per dimension, as `f64`.
    fn read_ranges(&self, var_name: &str, ranges: &[AxisRange]) -> Result<ArrayD<f64>> {
        let var = self.variable(var_name)?;
        let shape: Vec<usize> = ranges.iter().map(|r| r.count).collect();
        if shape.contains(&0) {
            return Ok(ArrayD::zeros(shape));
        }

        let extents: Vec<Extent> = ranges.iter().map(|r| r.extent()).collect();
        let values = var.get_values::<f64, _>(extents)?;
        Ok(ArrayD::from_shape_vec(shape, values)?)
    }

    /// Reads a whole variable as `f64`.
    fn read_raw(&self, var_name: &str) -> Result<ArrayD<f64>> {
        let ranges: Vec<AxisRange> = self
            .shape(var_name)?
            .into_iter()
            .map(AxisRange::full)
            .collect();
        self.read_ranges(var_name, &ranges)
    }

    /// The coordinate values of `dim_name` selected by `range`, or the matching
    /// indices when the file has no coordinate variable.
    fn coordinate_or_index(&self, dim_name: &str, range: AxisRange) -> Result<Array1<f64>> {
        if self.variables.iter().any(|v| v == dim_name) {
            Ok(self
                .read_ranges(dim_name, &[range])?
                .into_dimensionality::<Ix1>()?)
        } else {
            log::warn!("⚠ No coordinate variable for dimension '{dim_name}', using indices");
            Ok(Array1::from_iter(
                (0..range.count).map(|i| (range.start + i * range.stride) as f64),
            ))
        }
    }
}

/// Selected indices `start, start + stride, ...` of one dimension, `count` of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct AxisRange {
    start: usize,
    count: usize,
    stride: usize,
}

impl AxisRange {
    fn full(len: usize) -> Self {
        Self {
            start: 0,
            count: len,
            stride: 1,
        }
    }

    fn extent(self) -> Extent {
        Extent::SliceCount {
            start: self.start,
            count: self.count,
            stride: isize::try_from(self.stride).unwrap_or(isize::MAX),
        }
    }
}

/// Trimming and coarsening applied when reading a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadOptions {
    /// Leading time steps to skip
    pub time_offset: usize,
    /// Leading indices dropped from each spatial axis
    pub left_offset: usize,
    /// Trailing indices dropped from each spatial axis
    pub right_offset: usize,
    /// Keep every n-th spatial index
    pub coarsen: usize,
    /// The variable is a time mean without a time axis, `(z, y, x)`
    pub mean_only: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            time_offset: 0,
            left_offset: 0,
            right_offset: 0,
            coarsen: 1,
            mean_only: false,
        }
    }
}

impl ReadOptions {
    fn spatial_range(&self, len: usize, label: &str) -> Result<AxisRange> {
        axis_range(len, self.left_offset, self.right_offset, self.coarsen, label)
    }

    fn time_range(&self, len: usize) -> Result<AxisRange> {
        axis_range(len, self.time_offset, 0, 1, "time")
    }

    /// Ranges for every axis of a variable of the given shape.
    fn ranges(&self, shape: &[usize], var_name: &str) -> Result<Vec<AxisRange>> {
        shape
            .iter()
            .enumerate()
            .map(|(axis, &len)| {
                if axis == 0 && !self.mean_only {
                    self.time_range(len)
                } else {
                    self.spatial_range(len, &format!("{var_name}[{axis}]"))
                }
            })
            .collect()
    }
}

fn axis_range(len: usize, start: usize, right: usize, step: usize, label: &str) -> Result<AxisRange> {
    if step == 0 {
        return Err(FlowError::InvalidSlice {
            message: "coarsening level must be at least 1".to_string(),
        });
    }
    if start + right > len {
        return Err(FlowError::InvalidSlice {
            message: format!(
                "offsets {start} (left) and {right} (right) exceed the {len} points of axis '{label}'"
            ),
        });
    }

    Ok(AxisRange {
        start,
        count: (len - right - start).div_ceil(step),
        stride: step,
    })
}

fn check_listed(var_name: &str, check_list: &[String]) -> Result<()> {
    if check_list.iter().any(|v| v == var_name) {
        Ok(())
    } else {
        Err(FlowError::VariableNotFound {
            var: var_name.to_string(),
            available: check_list.to_vec(),
        })
    }
}

/// Opens a NetCDF file and records its variable and dimension names.
///
/// # Errors
///
/// Fails when the file cannot be opened or lists no variables or no dimensions.
pub fn open_dataset(path: impl AsRef<Path>) -> Result<Dataset> {
    let path = path.as_ref();
    let file = netcdf::open(path)?;

    let variables: Vec<String> = file.variables().map(|v| v.name().to_string()).collect();
    let dimensions: Vec<String> = file.dimensions().map(|d| d.name().to_string()).collect();

    if variables.is_empty() {
        return Err(FlowError::EmptyDataset {
            what: "variables".to_string(),
        });
    }
    if dimensions.is_empty() {
        return Err(FlowError::EmptyDataset {
            what: "dimensions".to_string(),
        });
    }

    log::info!("Successfully opened NetCDF file: {}", path.display());
    log::debug!(" Variable List : {variables:?}");
    log::debug!(" Dimension List : {dimensions:?}");

    Ok(Dataset {
        file,
        path: path.to_path_buf(),
        variables,
        dimensions,
    })
}

/// Reads a 1-D variable, dropping `left` leading and `right` trailing points
/// and keeping every `coarsen`-th of the rest.
pub fn read_1d_variable(
    ds: &Dataset,
    var_name: &str,
    check_list: &[String],
    left: usize,
    right: usize,
    coarsen: usize,
) -> Result<Array1<f64>> {
    check_listed(var_name, check_list)?;

    log::info!(" Reading variable {var_name} ...");
    let shape = ds.shape(var_name)?;
    let &[len] = shape.as_slice() else {
        return Err(FlowError::InvalidShape {
            message: format!("variable '{var_name}' has {} dimensions, expected 1", shape.len()),
        });
    };
    let range = axis_range(len, left, right, coarsen, var_name)?;

    Ok(ds.read_ranges(var_name, &[range])?.into_dimensionality::<Ix1>()?)
}

/// Reads a variable in full together with the coordinate arrays of its dimensions.
pub fn read_variable_with_dims(
    ds: &Dataset,
    var_name: &str,
    check_list: &[String],
) -> Result<(ArrayD<f64>, BTreeMap<String, Array1<f64>>)> {
    check_listed(var_name, check_list)?;

    let var = ds.read_raw(var_name)?;
    let mut coords = BTreeMap::new();
    for (dim_name, &len) in ds.dimension_names(var_name)?.into_iter().zip(var.shape()) {
        let coord = ds.coordinate_or_index(&dim_name, AxisRange::full(len))?;
        coords.insert(dim_name, coord);
    }

    Ok((var, coords))
}

/// Reads a `(time, z, y, x)` variable, or a `(z, y, x)` one in mean-only mode,
/// applying the offsets and spatial coarsening of `opts`.
///
/// # Errors
///
/// - [`FlowError::VariableNotFound`] if `var_name` is not in `check_list`
/// - [`FlowError::InvalidShape`] if the variable has the wrong rank
/// - [`FlowError::InvalidSlice`] if the offsets do not fit
pub fn read_3d_variable(
    ds: &Dataset,
    var_name: &str,
    check_list: &[String],
    opts: &ReadOptions,
) -> Result<ArrayD<f64>> {
    check_listed(var_name, check_list)?;

    log::info!(" Reading variable {var_name} ...");
    let shape = ds.shape(var_name)?;

    let expected_rank = if opts.mean_only { 3 } else { 4 };
    if shape.len() != expected_rank {
        return Err(FlowError::InvalidShape {
            message: format!(
                "variable '{var_name}' has {} dimensions, expected {expected_rank}",
                shape.len()
            ),
        });
    }

    let ranges = opts.ranges(&shape, var_name)?;
    let trimmed = ds.read_ranges(var_name, &ranges)?;
    log::debug!(" ... done, shape {:?}", trimmed.shape());

    Ok(trimmed)
}

/// Three vector components on a shared grid plus the coordinates of the first.
#[derive(Debug, Clone)]
pub struct VectorData {
    pub components: [Field; 3],
    pub coords: Coordinates,
}

/// Reads the three components named in `names` with the same trimming, and
/// the coordinates of the first component's dimensions.
///
/// # Errors
///
/// Besides the errors of [`read_3d_variable`], returns
/// [`FlowError::ShapeMismatch`] when the components differ in shape.
pub fn read_vector_components(
    ds: &Dataset,
    names: &[String; 3],
    opts: &ReadOptions,
) -> Result<VectorData> {
    let opts = ReadOptions {
        mean_only: false,
        ..*opts
    };

    let read = |name: &String| -> Result<Field> {
        Ok(read_3d_variable(ds, name, &ds.variables, &opts)?.into_dimensionality::<Ix4>()?)
    };
    let components = [read(&names[0])?, read(&names[1])?, read(&names[2])?];

    for c in &components[1..] {
        if c.shape() != components[0].shape() {
            return Err(FlowError::ShapeMismatch {
                expected: components[0].shape().to_vec(),
                found: c.shape().to_vec(),
            });
        }
    }

    let dims = ds.dimension_names(&names[0])?;
    let ranges = opts.ranges(&ds.shape(&names[0])?, &names[0])?;

    let axes = dims
        .iter()
        .zip(ranges)
        .map(|(dim_name, range)| ds.coordinate_or_index(dim_name, range))
        .collect::<Result<Vec<Array1<f64>>>>()?;

    let [time, z, y, x]: [Array1<f64>; 4] = axes.try_into().map_err(|_| FlowError::InvalidShape {
        message: format!("variable '{}' does not have four dimensions", names[0]),
    })?;
    let coords = Coordinates { time, z, y, x };

    if coords.shape().as_slice() != components[0].shape() {
        return Err(FlowError::ShapeMismatch {
            expected: components[0].shape().to_vec(),
            found: coords.shape().to_vec(),
        });
    }

    Ok(VectorData { components, coords })
}
