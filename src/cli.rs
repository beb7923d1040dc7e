//! Defines command-line interface options using `clap` for the flowdecomp application.

use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

use crate::errors::{FlowError, Result};
use crate::netcdf_io::ReadOptions;

/// Decompose, interpolate and convert flow-model output
#[derive(Parser, Debug)]
#[command(
    name = "flowdecomp",
    version,
    about = "Triple decomposition of NetCDF vector fields and raster topography tools"
)]
pub struct Args {
    /// Enable verbose output.
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    /// Number of threads to use for parallel processing. Defaults to number of CPU cores.
    #[arg(short = 't', long, global = true)]
    pub threads: Option<usize>,

    /// Append a JSON record of this invocation to the given file.
    #[arg(long, global = true)]
    pub run_log: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Vector decomposition U = <U> + U~(x) + U'(x,t)
    Decompose(DecomposeArgs),
    /// Interpolate staggered vector components to cell centres
    Interpolate(InterpolateArgs),
    /// Convert a GeoTIFF or ASCII raster into a tile archive (.npz)
    Tile(TileArgs),
    /// Build a 3-D topography mask (NetCDF) from a tile archive
    Mask(MaskArgs),
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Decompose(_) => "decompose",
            Command::Interpolate(_) => "interpolate",
            Command::Tile(_) => "tile",
            Command::Mask(_) => "mask",
        }
    }
}

/// Input selection shared by the NetCDF commands
#[derive(ClapArgs, Debug, Clone)]
pub struct FieldInput {
    /// Name of input NetCDF file.
    #[arg(short, long)]
    pub filename: PathBuf,

    /// Names of the vector components in (x,y,z)-order.
    #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"], default_values = ["u", "v", "w"])]
    pub vnames: Vec<String>,

    /// Skip <NTIMESKIP> number of time steps.
    #[arg(short, long, default_value_t = 0)]
    pub ntimeskip: usize,

    /// Coarsening level, keep every n-th grid point.
    #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..))]
    pub coarse: u64,

    /// Compress output variables (zlib).
    #[arg(long, default_value_t = false)]
    pub compress: bool,
}

impl FieldInput {
    pub fn read_options(&self) -> ReadOptions {
        ReadOptions {
            time_offset: self.ntimeskip,
            coarsen: usize::try_from(self.coarse).unwrap_or(usize::MAX),
            ..ReadOptions::default()
        }
    }

    /// Component names as an `(x, y, z)` triple.
    pub fn component_names(&self) -> Result<[String; 3]> {
        <[String; 3]>::try_from(self.vnames.clone()).map_err(|names| FlowError::InvalidArgument {
            message: format!("expected three component names, got {names:?}"),
        })
    }
}

#[derive(ClapArgs, Debug, Clone)]
pub struct DecomposeArgs {
    #[command(flatten)]
    pub input: FieldInput,

    /// Name of output NetCDF file.
    #[arg(short = 'o', long, default_value = "Vd.nc")]
    pub fileout: PathBuf,

    /// Compute and write magnitudes of each decomposition component.
    #[arg(short, long, default_value_t = false)]
    pub mags: bool,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct InterpolateArgs {
    #[command(flatten)]
    pub input: FieldInput,

    /// Name of output NetCDF file.
    #[arg(short = 'o', long, default_value = "Vc.nc")]
    pub fileout: PathBuf,

    /// Also write the time mean of each interpolated component.
    #[arg(long, default_value_t = false)]
    pub means: bool,

    /// Also write the fluctuation about the time mean (implies --means).
    #[arg(long, default_value_t = false)]
    pub primes: bool,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct TileArgs {
    /// Input raster file name.
    #[arg(short, long)]
    pub filename: PathBuf,

    /// Output npz file name. Defaults to the input name with an .npz extension.
    #[arg(short = 'o', long)]
    pub fileout: Option<PathBuf>,

    /// Resolution of the raster [Dx Dy]. Defaults to the GeoTIFF pixel scale.
    #[arg(short, long, num_args = 2, value_names = ["DX", "DY"], allow_negative_numbers = true)]
    pub reso: Option<Vec<f64>>,

    /// Coords [N E] of the raster's top-left corner.
    #[arg(short = 'x', long, num_args = 2, value_names = ["N", "E"], default_values_t = [0.0, 0.0], allow_negative_numbers = true)]
    pub xorig: Vec<f64>,

    /// Scale factor for the output.
    #[arg(short, long, default_value_t = 1.0)]
    pub scale: f64,

    /// Input is an ASCII-formatted raster with no metadata (such as TOPOGRAPHY_DATA).
    #[arg(short, long, default_value_t = false)]
    pub ascii: bool,

    /// Print a summary of the raster data.
    #[arg(short, long, default_value_t = false)]
    pub print: bool,

    /// Only print the summary, don't save.
    #[arg(long, default_value_t = false)]
    pub print_only: bool,
}

impl TileArgs {
    pub fn output_path(&self) -> PathBuf {
        self.fileout
            .clone()
            .unwrap_or_else(|| self.filename.with_extension("npz"))
    }
}

#[derive(ClapArgs, Debug, Clone)]
pub struct MaskArgs {
    /// Input tile archive (.npz).
    #[arg(short, long)]
    pub filename: PathBuf,

    /// Name of output NetCDF file.
    #[arg(short = 'o', long, default_value = "topo.nc")]
    pub fileout: PathBuf,

    /// Vertical grid spacing.
    #[arg(long)]
    pub dz: f64,

    /// Number of vertical levels. Defaults to the tallest column.
    #[arg(long)]
    pub nz: Option<usize>,

    /// Compress the output mask (zlib).
    #[arg(long, default_value_t = false)]
    pub compress: bool,
}
