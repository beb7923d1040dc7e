//! Staggered-grid to cell-centre interpolation
//!
//! On a staggered (Arakawa-C) grid each velocity component lives on the face
//! normal to its own axis. Averaging neighbouring faces along that axis and
//! trimming one index from the other two axes puts all three components on a
//! common cell-centre grid of shape `(T, Z-1, Y-1, X-1)`.

use crate::errors::{FlowError, Result};
use crate::grid::{Field, StaggerAxis};
use ndarray::{s, Array3, Array4, ArrayView3, ArrayViewMut3, Axis, Zip};

/// A cell-centred field and, when requested, its time mean.
#[derive(Debug, Clone)]
pub struct Interpolated {
    pub field: Field,
    /// `None` unless the mean was requested
    pub mean: Option<Array3<f64>>,
}

/// Moves a component staggered along `axis` to cell centres.
///
/// | axis | averaged along | trimmed                     |
/// |------|----------------|-----------------------------|
/// | X    | x              | z drops first, y drops last |
/// | Y    | y              | z drops first, x drops last |
/// | Z    | z              | y drops last, x drops last  |
///
/// Time slices are independent and are interpolated in parallel.
///
/// # Errors
///
/// Returns [`FlowError::InvalidShape`] when there are no time steps or a
/// spatial axis has fewer than two points.
pub fn interpolate_staggered(v0: &Field, axis: StaggerAxis, mean_on: bool) -> Result<Interpolated> {
    let (nt, nz, ny, nx) = v0.dim();
    if nt == 0 || nz < 2 || ny < 2 || nx < 2 {
        return Err(FlowError::InvalidShape {
            message: format!(
                "cannot interpolate field of shape {:?}: need at least one time step and two points per spatial axis",
                v0.shape()
            ),
        });
    }

    let mut vc = Array4::<f64>::zeros((nt, nz - 1, ny - 1, nx - 1));

    Zip::from(vc.axis_iter_mut(Axis(0)))
        .and(v0.axis_iter(Axis(0)))
        .par_for_each(|out, src| interpolate_slice(out, src, axis));

    let mean = if mean_on {
        let vm = vc.mean_axis(Axis(0)).ok_or_else(|| FlowError::EmptyField {
            shape: vc.shape().to_vec(),
        })?;
        Some(vm)
    } else {
        None
    };

    log::info!("✅ Interpolation along the {axis}-direction completed");

    Ok(Interpolated { field: vc, mean })
}

fn interpolate_slice(out: ArrayViewMut3<f64>, src: ArrayView3<f64>, axis: StaggerAxis) {
    let (left, right) = match axis {
        StaggerAxis::X => (src.slice(s![1.., ..-1, ..-1]), src.slice(s![1.., ..-1, 1..])),
        StaggerAxis::Y => (src.slice(s![1.., ..-1, ..-1]), src.slice(s![1.., 1.., ..-1])),
        StaggerAxis::Z => (src.slice(s![..-1, ..-1, ..-1]), src.slice(s![1.., ..-1, ..-1])),
    };

    Zip::from(out)
        .and(&left)
        .and(&right)
        .for_each(|o, &l, &r| *o = (l + r) * 0.5);
}
