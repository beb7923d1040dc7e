//! Raster topography: loading, tile archives and 3-D obstacle masks
//!
//! A raster is a 2-D grid of heights with row 0 at the top (north) edge, as
//! GeoTIFF images and ASCII topography files store it. A [`TileBundle`]
//! couples the raster with its georeferencing and is persisted as a `.npz`
//! archive with the keys `R`, `GlobOrig`, `gridRot` and `dPx`, so it loads
//! directly with `numpy.load`.

use crate::errors::{FlowError, Result};
use ndarray::{arr0, arr1, s, Array1, Array2, Array3, ArrayView2, Ix0, Ix1, Ix2, OwnedRepr};
use ndarray_npy::{NpzReader, NpzWriter};
use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::tags::Tag;
use tiff::ColorType;

/// A 2-D raster and the pixel spacing stored with it, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    /// Values indexed `(row, column)`
    pub data: Array2<f64>,
    /// GeoTIFF `ModelPixelScale` `[dx, dy]`
    pub pixel_scale: Option<[f64; 2]>,
}

impl Raster {
    /// Shape, extrema and mean of the finite values.
    #[must_use]
    pub fn summary(&self) -> RasterSummary {
        let finite: Vec<f64> = self.data.iter().copied().filter(|v| v.is_finite()).collect();
        let (min, max, mean) = if finite.is_empty() {
            (f64::NAN, f64::NAN, f64::NAN)
        } else {
            (
                finite.iter().copied().fold(f64::INFINITY, f64::min),
                finite.iter().copied().fold(f64::NEG_INFINITY, f64::max),
                finite.iter().sum::<f64>() / finite.len() as f64,
            )
        };

        RasterSummary {
            rows: self.data.nrows(),
            cols: self.data.ncols(),
            min,
            max,
            mean,
            valid: finite.len(),
        }
    }
}

/// Quick statistics of a raster
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterSummary {
    pub rows: usize,
    pub cols: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub valid: usize,
}

impl RasterSummary {
    pub fn log(&self) {
        log::info!(" Raster shape: ({} × {})", self.rows, self.cols);
        log::info!("    Min: {:.2}", self.min);
        log::info!("    Max: {:.2}", self.max);
        log::info!("    Mean: {:.2}", self.mean);
        log::info!("    Valid elements: {} / {}", self.valid, self.rows * self.cols);
    }
}

/// Reads the first image of a single-band (grey scale) TIFF/GeoTIFF.
///
/// # Errors
///
/// Fails on unreadable files, multi-band images and unsupported sample types.
pub fn load_geotiff(path: impl AsRef<Path>) -> Result<Raster> {
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);
    let mut decoder = Decoder::new(reader)?;

    if !matches!(decoder.colortype()?, ColorType::Gray(_)) {
        return Err(FlowError::RasterFormat {
            message: format!("{} is not a single-band raster", path.display()),
        });
    }

    let (width, height) = decoder.dimensions()?;

    let pixel_scale = decoder
        .get_tag_f64_vec(Tag::ModelPixelScaleTag)
        .ok()
        .and_then(|v| match v.as_slice() {
            [dx, dy, ..] => Some([*dx, *dy]),
            _ => None,
        });

    let values: Vec<f64> = match decoder.read_image()? {
        DecodingResult::U8(data) => data.into_iter().map(f64::from).collect(),
        DecodingResult::U16(data) => data.into_iter().map(f64::from).collect(),
        DecodingResult::U32(data) => data.into_iter().map(f64::from).collect(),
        DecodingResult::I8(data) => data.into_iter().map(f64::from).collect(),
        DecodingResult::I16(data) => data.into_iter().map(f64::from).collect(),
        DecodingResult::I32(data) => data.into_iter().map(f64::from).collect(),
        DecodingResult::F32(data) => data.into_iter().map(f64::from).collect(),
        DecodingResult::F64(data) => data,
        _ => {
            return Err(FlowError::RasterFormat {
                message: "Unsupported pixel format".to_string(),
            })
        }
    };

    let data = Array2::from_shape_vec((height as usize, width as usize), values)?;
    log::info!(
        "Read GeoTIFF {} ({height} × {width})",
        path.display()
    );

    Ok(Raster { data, pixel_scale })
}

/// Reads a plain ASCII raster: whitespace-separated numbers, one row per line.
///
/// Blank lines and lines starting with `#` are skipped.
///
/// # Errors
///
/// Fails on unparsable numbers, rows of differing length, or an empty file.
pub fn load_ascii_raster(path: impl AsRef<Path>) -> Result<Raster> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;
    let data = parse_ascii_raster(&text)?;
    log::info!(
        "Read ASCII raster {} ({} × {})",
        path.display(),
        data.nrows(),
        data.ncols()
    );

    Ok(Raster {
        data,
        pixel_scale: None,
    })
}

/// Parses the contents of an ASCII raster.
pub fn parse_ascii_raster(text: &str) -> Result<Array2<f64>> {
    let mut values = Vec::new();
    let mut cols = None;
    let mut rows = 0;

    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let row = line
            .split_whitespace()
            .map(|tok| {
                tok.parse::<f64>().map_err(|_| FlowError::RasterFormat {
                    message: format!("line {}: cannot parse '{tok}' as a number", lineno + 1),
                })
            })
            .collect::<Result<Vec<f64>>>()?;

        match cols {
            None => cols = Some(row.len()),
            Some(n) if n != row.len() => {
                return Err(FlowError::RasterFormat {
                    message: format!(
                        "line {}: expected {n} values, found {}",
                        lineno + 1,
                        row.len()
                    ),
                })
            }
            Some(_) => {}
        }

        values.extend(row);
        rows += 1;
    }

    let cols = cols.ok_or_else(|| FlowError::RasterFormat {
        message: "no data rows".to_string(),
    })?;

    Ok(Array2::from_shape_vec((rows, cols), values)?)
}

/// A raster tile with its georeferencing.
#[derive(Debug, Clone, PartialEq)]
pub struct TileBundle {
    /// Raster values, `R`
    pub raster: Array2<f64>,
    /// Top-left corner `[N, E]`, `GlobOrig`
    pub global_origin: [f64; 2],
    /// Grid rotation angle, `gridRot`
    pub grid_rotation: f64,
    /// Pixel spacing, `dPx`
    pub pixel_spacing: [f64; 2],
}

impl TileBundle {
    /// Bundles a raster; the pixel spacing is `scale * resolution`.
    #[must_use]
    pub fn new(raster: Array2<f64>, origin: [f64; 2], resolution: [f64; 2], scale: f64) -> Self {
        Self {
            raster,
            global_origin: origin,
            grid_rotation: 0.0,
            pixel_spacing: [scale * resolution[0], scale * resolution[1]],
        }
    }

    /// Writes the bundle as a compressed `.npz` archive.
    pub fn save_npz(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        log::info!(" Writing file {} ... ", path.display());

        let mut npz = NpzWriter::new_compressed(File::create(path)?);
        npz.add_array("R", &self.raster)?;
        npz.add_array("GlobOrig", &arr1(&self.global_origin))?;
        npz.add_array("gridRot", &arr0(self.grid_rotation))?;
        npz.add_array("dPx", &arr1(&self.pixel_spacing))?;
        npz.finish()?;

        log::info!(" ... done! ");
        Ok(())
    }

    /// Reads a bundle written by [`save_npz`](Self::save_npz) or by `numpy.savez`.
    pub fn load_npz(path: impl AsRef<Path>) -> Result<Self> {
        let mut npz = NpzReader::new(File::open(path.as_ref())?)?;
        let names = npz.names()?;
        let entry = |key: &str| -> Result<String> {
            names
                .iter()
                .find(|n| *n == key || n.strip_suffix(".npy") == Some(key))
                .cloned()
                .ok_or_else(|| FlowError::VariableNotFound {
                    var: key.to_string(),
                    available: names.clone(),
                })
        };

        let raster: Array2<f64> = npz.by_name::<OwnedRepr<f64>, Ix2>(&entry("R")?)?;
        let origin: Array1<f64> = npz.by_name::<OwnedRepr<f64>, Ix1>(&entry("GlobOrig")?)?;
        let rotation = npz.by_name::<OwnedRepr<f64>, Ix0>(&entry("gridRot")?)?;
        let spacing: Array1<f64> = npz.by_name::<OwnedRepr<f64>, Ix1>(&entry("dPx")?)?;

        Ok(Self {
            raster,
            global_origin: pair(&origin, "GlobOrig")?,
            grid_rotation: rotation[()],
            pixel_spacing: pair(&spacing, "dPx")?,
        })
    }
}

fn pair(values: &Array1<f64>, key: &str) -> Result<[f64; 2]> {
    match values.as_slice() {
        Some(&[a, b]) => Ok([a, b]),
        _ => Err(FlowError::InvalidShape {
            message: format!("'{key}' must hold two values, found {}", values.len()),
        }),
    }
}

/// Largest mask, in cells, that [`fill_topography_array`] will allocate.
pub const MAX_MASK_CELLS: usize = 1_000_000_000;

fn check_spacing(dz: f64) -> Result<()> {
    if dz.is_finite() && dz > 0.0 {
        Ok(())
    } else {
        Err(FlowError::InvalidArgument {
            message: format!("vertical spacing must be positive, got {dz}"),
        })
    }
}

/// Fills a `(z, y, x)` mask with 1 below the terrain height of every column.
///
/// Raster rows are flipped so that `y = 0` is the southern (bottom) edge. A
/// column of height `h` fills the cells `0..round(h / dz)`, clamped to `nz`;
/// non-positive and missing heights leave the column empty.
///
/// # Errors
///
/// Returns [`FlowError::InvalidArgument`] unless `dz` is positive and finite,
/// or when the mask would exceed [`MAX_MASK_CELLS`].
pub fn fill_topography_array(raster: ArrayView2<f64>, nz: usize, dz: f64) -> Result<Array3<i8>> {
    check_spacing(dz)?;

    let (ny, nx) = raster.dim();
    let cells = nz
        .checked_mul(ny)
        .and_then(|n| n.checked_mul(nx))
        .filter(|&n| n <= MAX_MASK_CELLS)
        .ok_or_else(|| FlowError::InvalidArgument {
            message: format!(
                "mask of [{nz}, {ny}, {nx}] cells exceeds the limit of {MAX_MASK_CELLS}"
            ),
        })?;

    log::info!(" Filling 3D array from topography data...");
    log::info!(" Dimensions [z,y,x]: [{nz}, {ny}, {nx}]");
    log::debug!(" Total number of data points: {cells}");

    let mut topo = Array3::<i8>::zeros((nz, ny, nx));
    for x in 0..nx {
        for y in 0..ny {
            let height = raster[[ny - 1 - y, x]];
            let top = (height / dz).round().max(0.0).min(nz as f64) as usize;
            topo.slice_mut(s![..top, y, x]).fill(1);
        }
    }

    Ok(topo)
}

/// Smallest number of levels that holds the tallest column of `raster`, at least one.
///
/// # Errors
///
/// Returns [`FlowError::InvalidArgument`] unless `dz` is positive and finite,
/// or when the columns of the mask alone would exceed [`MAX_MASK_CELLS`].
pub fn levels_for(raster: ArrayView2<f64>, dz: f64) -> Result<usize> {
    check_spacing(dz)?;

    let max = raster
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(0.0_f64, f64::max);
    let levels = (max / dz).round();
    if levels > MAX_MASK_CELLS as f64 {
        return Err(FlowError::InvalidArgument {
            message: format!(
                "a {max} m column at dz = {dz} needs {levels} levels, above the limit of {MAX_MASK_CELLS}"
            ),
        });
    }

    Ok((levels as usize).max(1))
}
