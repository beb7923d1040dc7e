//! The four batch commands: read, transform, write.

use crate::cli::{DecomposeArgs, InterpolateArgs, MaskArgs, TileArgs};
use crate::decomposition::{decompose, interpolate_staggered, prime_component, MagnitudeAccumulator};
use crate::errors::{FlowError, Result};
use crate::grid::{Coordinates, StaggerAxis};
use crate::netcdf_io::{open_dataset, read_vector_components, NetCDFWriter, VectorData};
use crate::raster::{fill_topography_array, levels_for, load_ascii_raster, load_geotiff, TileBundle};

const VELOCITY_UNITS: &str = "m s^(-1)";
const SPATIAL_DIMS: [&str; 3] = ["z", "y", "x"];
const FIELD_DIMS: [&str; 4] = ["time", "z", "y", "x"];

fn write_coordinates(out: &mut NetCDFWriter, coords: &Coordinates) -> Result<()> {
    out.create_parameter(&coords.time, "time", "s")?;
    out.create_parameter(&coords.x, "x", "m")?;
    out.create_parameter(&coords.y, "y", "m")?;
    out.create_parameter(&coords.z, "z", "m")?;
    Ok(())
}

/// Decomposes each vector component and writes `<c>da`, `<c>tilde` and `<c>p`,
/// plus the magnitudes `Uda`, `Utilde` and `Up` when requested.
pub fn run_decomposition(args: &DecomposeArgs) -> Result<()> {
    let names = args.input.component_names()?;
    let VectorData { components, coords } = {
        let ds = open_dataset(&args.input.filename)?;
        read_vector_components(&ds, &names, &args.input.read_options())?
    };
    let nt = coords.time.len();

    let mut out = NetCDFWriter::create(&args.fileout, args.input.compress)?;
    write_coordinates(&mut out, &coords)?;

    let mut magnitudes = args.mags.then(MagnitudeAccumulator::new);

    for (name, field) in names.iter().zip(components) {
        log::info!("🚀 Decomposing {name} with shape {:?}", field.shape());
        let d = decompose(field)?;

        out.create_parameter(&d.double_average_array(), &format!("{name}da"), VELOCITY_UNITS)?;
        out.create_variable(
            d.mean_deviation.view().into_dyn(),
            &format!("{name}tilde"),
            nt,
            VELOCITY_UNITS,
            &SPATIAL_DIMS,
            false,
        )?;
        out.create_variable(
            d.fluctuation.view().into_dyn(),
            &format!("{name}p"),
            nt,
            VELOCITY_UNITS,
            &FIELD_DIMS,
            false,
        )?;

        if let Some(acc) = magnitudes.as_mut() {
            acc.add(&d)?;
        }
    }

    if let Some(acc) = magnitudes {
        let m = acc.finish()?;
        out.create_parameter(&m.double_average, "Uda", VELOCITY_UNITS)?;
        out.create_variable(
            m.mean_deviation.view().into_dyn(),
            "Utilde",
            nt,
            VELOCITY_UNITS,
            &SPATIAL_DIMS,
            false,
        )?;
        out.create_variable(
            m.fluctuation.view().into_dyn(),
            "Up",
            nt,
            VELOCITY_UNITS,
            &FIELD_DIMS,
            false,
        )?;
    }

    out.finish()
}

/// Moves each component to cell centres and writes `<c>c`, plus the time
/// mean `<c>m` and fluctuation `<c>p` when requested.
pub fn run_interpolation(args: &InterpolateArgs) -> Result<()> {
    let names = args.input.component_names()?;
    let VectorData { components, coords } = {
        let ds = open_dataset(&args.input.filename)?;
        read_vector_components(&ds, &names, &args.input.read_options())?
    };
    let centered = coords.cell_centered(StaggerAxis::X)?;
    let nt = centered.time.len();

    let mut out = NetCDFWriter::create(&args.fileout, args.input.compress)?;
    write_coordinates(&mut out, &centered)?;

    let mean_on = args.means || args.primes;

    for ((axis, name), field) in StaggerAxis::ALL.into_iter().zip(&names).zip(components) {
        let interpolated = interpolate_staggered(&field, axis, mean_on)?;

        out.create_variable(
            interpolated.field.view().into_dyn(),
            &format!("{name}c"),
            nt,
            VELOCITY_UNITS,
            &FIELD_DIMS,
            false,
        )?;

        if let Some(vm) = &interpolated.mean {
            out.create_variable(
                vm.view().into_dyn(),
                &format!("{name}m"),
                nt,
                VELOCITY_UNITS,
                &SPATIAL_DIMS,
                false,
            )?;

            if args.primes {
                let vp = prime_component(&interpolated.field, vm)?;
                out.create_variable(
                    vp.view().into_dyn(),
                    &format!("{name}p"),
                    nt,
                    VELOCITY_UNITS,
                    &FIELD_DIMS,
                    false,
                )?;
            }
        }
    }

    out.finish()
}

/// Loads a raster and writes it as a tile archive unless only printing was asked for.
pub fn run_tile_conversion(args: &TileArgs) -> Result<TileBundle> {
    let raster = if args.ascii {
        load_ascii_raster(&args.filename)?
    } else {
        load_geotiff(&args.filename)?
    };

    let resolution = match args.reso.as_deref() {
        Some(&[dx, dy]) => [dx, dy],
        Some(other) => {
            return Err(FlowError::InvalidArgument {
                message: format!("resolution needs two values, got {}", other.len()),
            })
        }
        None => raster.pixel_scale.ok_or(FlowError::MissingResolution)?,
    };
    let origin = match args.xorig.as_slice() {
        &[n, e] => [n, e],
        other => {
            return Err(FlowError::InvalidArgument {
                message: format!("origin needs two values, got {}", other.len()),
            })
        }
    };

    if args.print || args.print_only {
        raster.summary().log();
    }

    let bundle = TileBundle::new(raster.data, origin, resolution, args.scale);
    if !args.print_only {
        bundle.save_npz(args.output_path())?;
    }

    Ok(bundle)
}

/// Fills a 3-D obstacle mask from a tile archive and writes it with its axes.
pub fn run_topography_mask(args: &MaskArgs) -> Result<()> {
    let tile = TileBundle::load_npz(&args.filename)?;
    let nz = match args.nz {
        Some(nz) => nz,
        None => levels_for(tile.raster.view(), args.dz)?,
    };
    let topo = fill_topography_array(tile.raster.view(), nz, args.dz)?;
    let (_, ny, nx) = topo.dim();

    let mut out = NetCDFWriter::create(&args.fileout, args.compress)?;
    out.create_coordinate_axis(nx, tile.pixel_spacing[0], "x", "m")?;
    out.create_coordinate_axis(ny, tile.pixel_spacing[1], "y", "m")?;
    out.create_coordinate_axis(nz, args.dz, "z", "m")?;
    out.create_mask_variable(&topo, "topo", &SPATIAL_DIMS)?;

    out.finish()
}
