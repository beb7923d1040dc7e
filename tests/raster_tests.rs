//! Tile conversion and topography masks.

use approx::assert_abs_diff_eq;
use clap::Parser;
use flowdecomp::{
    cli::{Args, Command, MaskArgs, TileArgs},
    commands::{run_tile_conversion, run_topography_mask},
    errors::{FlowError, Result},
    raster::{fill_topography_array, levels_for, load_geotiff, TileBundle, MAX_MASK_CELLS},
};
use ndarray::{array, s, Array3};
use std::fs::{self, File};
use std::path::Path;
use tempfile::tempdir;
use tiff::encoder::{colortype, TiffEncoder};
use tiff::tags::Tag;

fn tile_args(argv: &[&str]) -> TileArgs {
    let mut full = vec!["flowdecomp", "tile"];
    full.extend_from_slice(argv);
    match Args::try_parse_from(full).expect("valid arguments").command {
        Command::Tile(args) => args,
        _ => panic!("Expected tile subcommand"),
    }
}

fn mask_args(argv: &[&str]) -> MaskArgs {
    let mut full = vec!["flowdecomp", "mask"];
    full.extend_from_slice(argv);
    match Args::try_parse_from(full).expect("valid arguments").command {
        Command::Mask(args) => args,
        _ => panic!("Expected mask subcommand"),
    }
}

fn write_geotiff(path: &Path, width: u32, height: u32, values: &[f32], scale: Option<[f64; 3]>) {
    let file = File::create(path).expect("create tiff");
    let mut encoder = TiffEncoder::new(file).expect("tiff encoder");
    let mut image = encoder
        .new_image::<colortype::Gray32Float>(width, height)
        .expect("tiff image");
    if let Some(scale) = scale {
        image
            .encoder()
            .write_tag(Tag::ModelPixelScaleTag, &scale[..])
            .expect("pixel scale tag");
    }
    image.write_data(values).expect("tiff data");
}

#[test]
fn test_ascii_tile_round_trip() -> Result<()> {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let input = temp_dir.path().join("topo.txt");
    fs::write(&input, "# heights\n1 2 3\n4 5 6\n")?;

    let args = tile_args(&[
        "-f",
        input.to_str().unwrap(),
        "-a",
        "-r",
        "2.0",
        "4.0",
        "-x",
        "6700000",
        "380000",
        "-s",
        "0.5",
    ]);
    let bundle = run_tile_conversion(&args)?;

    let output = temp_dir.path().join("topo.npz");
    assert!(output.exists());

    let loaded = TileBundle::load_npz(&output)?;
    assert_eq!(loaded, bundle);
    assert_eq!(loaded.raster, array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]);
    assert_eq!(loaded.global_origin, [6_700_000.0, 380_000.0]);
    assert_eq!(loaded.pixel_spacing, [1.0, 2.0]);
    assert_eq!(loaded.grid_rotation, 0.0);

    Ok(())
}

#[test]
fn test_print_only_writes_nothing() -> Result<()> {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let input = temp_dir.path().join("topo.txt");
    let output = temp_dir.path().join("out.npz");
    fs::write(&input, "0 1\n1 0\n")?;

    let args = tile_args(&[
        "-f",
        input.to_str().unwrap(),
        "-o",
        output.to_str().unwrap(),
        "-a",
        "-r",
        "1",
        "1",
        "--print-only",
    ]);
    let bundle = run_tile_conversion(&args)?;

    assert!(!output.exists());
    assert_eq!(bundle.raster.dim(), (2, 2));

    Ok(())
}

#[test]
fn test_ascii_without_resolution_fails() -> Result<()> {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let input = temp_dir.path().join("topo.txt");
    fs::write(&input, "1 2\n3 4\n")?;

    let args = tile_args(&["-f", input.to_str().unwrap(), "-a"]);
    assert!(matches!(
        run_tile_conversion(&args),
        Err(FlowError::MissingResolution)
    ));

    Ok(())
}

#[test]
fn test_geotiff_pixel_scale_fallback() -> Result<()> {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let input = temp_dir.path().join("dem.tif");
    let values: Vec<f32> = (0..12).map(|v| v as f32 * 0.5).collect();
    write_geotiff(&input, 4, 3, &values, Some([2.0, 3.0, 0.0]));

    let raster = load_geotiff(&input)?;
    assert_eq!(raster.data.dim(), (3, 4));
    assert_eq!(raster.data[[1, 2]], 3.0);
    assert_eq!(raster.pixel_scale, Some([2.0, 3.0]));

    let summary = raster.summary();
    assert_eq!(summary.valid, 12);
    assert_abs_diff_eq!(summary.max, 5.5);
    assert_abs_diff_eq!(summary.mean, 2.75);

    // No -r: the spacing comes from ModelPixelScale
    let args = tile_args(&["-f", input.to_str().unwrap(), "-s", "2"]);
    let bundle = run_tile_conversion(&args)?;
    assert_eq!(bundle.pixel_spacing, [4.0, 6.0]);
    assert!(temp_dir.path().join("dem.npz").exists());

    Ok(())
}

#[test]
fn test_geotiff_without_scale_needs_resolution() -> Result<()> {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let input = temp_dir.path().join("plain.tif");
    write_geotiff(&input, 2, 2, &[1.0, 2.0, 3.0, 4.0], None);

    assert_eq!(load_geotiff(&input)?.pixel_scale, None);
    let args = tile_args(&["-f", input.to_str().unwrap(), "-p"]);
    assert!(matches!(
        run_tile_conversion(&args),
        Err(FlowError::MissingResolution)
    ));

    Ok(())
}

#[test]
fn test_fill_topography_array() -> Result<()> {
    // Row 0 is north; after the flip it becomes y = 1
    let raster = array![[0.0, 2.0], [4.0, 1.0]];
    let topo = fill_topography_array(raster.view(), 4, 1.0)?;

    assert_eq!(topo.dim(), (4, 2, 2));
    assert_eq!(topo.slice(s![.., 0, 0]).to_vec(), vec![1, 1, 1, 1]);
    assert_eq!(topo.slice(s![.., 0, 1]).to_vec(), vec![1, 0, 0, 0]);
    assert_eq!(topo.slice(s![.., 1, 0]).to_vec(), vec![0, 0, 0, 0]);
    assert_eq!(topo.slice(s![.., 1, 1]).to_vec(), vec![1, 1, 0, 0]);

    // Filled cells are always a contiguous run from the ground
    for column in topo.lanes(ndarray::Axis(0)) {
        let filled = column.iter().filter(|&&v| v == 1).count();
        assert!(column.iter().take(filled).all(|&v| v == 1));
    }

    Ok(())
}

#[test]
fn test_fill_topography_edge_cases() -> Result<()> {
    // Taller than the domain, negative, missing, rounding to nearest
    let raster = array![[10.0, -3.0, f64::NAN, 2.6]];
    let topo = fill_topography_array(raster.view(), 3, 2.0)?;

    assert_eq!(topo.slice(s![.., 0, 0]).to_vec(), vec![1, 1, 1]);
    assert_eq!(topo.slice(s![.., 0, 1]).to_vec(), vec![0, 0, 0]);
    assert_eq!(topo.slice(s![.., 0, 2]).to_vec(), vec![0, 0, 0]);
    assert_eq!(topo.slice(s![.., 0, 3]).to_vec(), vec![1, 0, 0]);

    assert!(matches!(
        fill_topography_array(raster.view(), 3, 0.0),
        Err(FlowError::InvalidArgument { .. })
    ));
    assert!(fill_topography_array(raster.view(), 3, f64::NAN).is_err());

    assert_eq!(levels_for(raster.view(), 2.0)?, 5);
    assert_eq!(levels_for(array![[0.0, -1.0]].view(), 1.0)?, 1);

    Ok(())
}

#[test]
fn test_mask_size_is_bounded() -> Result<()> {
    let raster = array![[10.0, 0.0], [0.0, 0.0]];

    // A vanishing spacing would ask for ten trillion levels
    assert!(matches!(
        levels_for(raster.view(), 1e-12),
        Err(FlowError::InvalidArgument { .. })
    ));
    assert!(levels_for(raster.view(), 0.0).is_err());
    assert!(levels_for(raster.view(), -1.0).is_err());

    // An explicit level count is checked before allocating
    assert!(matches!(
        fill_topography_array(raster.view(), MAX_MASK_CELLS, 1.0),
        Err(FlowError::InvalidArgument { .. })
    ));
    assert!(fill_topography_array(raster.view(), usize::MAX, 1.0).is_err());
    assert_eq!(fill_topography_array(raster.view(), 5, 2.0)?.dim(), (5, 2, 2));

    Ok(())
}

#[test]
fn test_mask_command_rejects_tiny_spacing() -> Result<()> {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let tile_path = temp_dir.path().join("tile.npz");
    let output = temp_dir.path().join("topo.nc");
    TileBundle::new(array![[10.0, 0.0]], [0.0, 0.0], [1.0, 1.0], 1.0).save_npz(&tile_path)?;

    let args = mask_args(&[
        "-f",
        tile_path.to_str().unwrap(),
        "-o",
        output.to_str().unwrap(),
        "--dz",
        "1e-12",
    ]);
    assert!(matches!(
        run_topography_mask(&args),
        Err(FlowError::InvalidArgument { .. })
    ));
    assert!(!output.exists());

    Ok(())
}

#[test]
fn test_mask_command() -> Result<()> {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let tile_path = temp_dir.path().join("tile.npz");
    let output = temp_dir.path().join("topo.nc");

    let bundle = TileBundle::new(array![[0.0, 2.0, 4.0], [6.0, 0.0, 0.0]], [0.0, 0.0], [2.0, 3.0], 1.0);
    bundle.save_npz(&tile_path)?;

    let args = mask_args(&[
        "-f",
        tile_path.to_str().unwrap(),
        "-o",
        output.to_str().unwrap(),
        "--dz",
        "2",
    ]);
    run_topography_mask(&args)?;

    let file = netcdf::open(&output)?;
    let topo_var = file.variable("topo").expect("topo variable");
    let dims: Vec<String> = topo_var.dimensions().iter().map(|d| d.name().to_string()).collect();
    assert_eq!(dims, vec!["z", "y", "x"]);

    // Tallest column is 6 m at dz = 2, so three levels
    let values = topo_var.get_values::<i8, _>(..)?;
    let topo = Array3::from_shape_vec((3, 2, 3), values)?;
    assert_eq!(topo.slice(s![.., 0, 0]).to_vec(), vec![1, 1, 1]);
    assert_eq!(topo.slice(s![.., 1, 2]).to_vec(), vec![1, 1, 0]);
    assert_eq!(topo.slice(s![.., 0, 1]).to_vec(), vec![0, 0, 0]);

    let x = file.variable("x").expect("x axis").get_values::<f32, _>(..)?;
    let y = file.variable("y").expect("y axis").get_values::<f32, _>(..)?;
    let z = file.variable("z").expect("z axis").get_values::<f32, _>(..)?;
    assert_eq!(x, vec![0.0, 2.0, 4.0]);
    assert_eq!(y, vec![0.0, 3.0]);
    assert_eq!(z, vec![0.0, 2.0, 4.0]);

    Ok(())
}
