//! Triple decomposition `q = <q> + q~(x) + q'(x, t)` and the fluctuation-from-mean helper.

use crate::errors::{FlowError, Result};
use crate::grid::Field;
use ndarray::{arr1, Array1, Array3, Axis, Zip};

/// The three terms of a decomposed field.
///
/// `field[t, z, y, x] == double_average + mean_deviation[z, y, x] + fluctuation[t, z, y, x]`
/// up to floating point rounding.
#[derive(Debug, Clone)]
pub struct Decomposition {
    /// Spatial mean of the time mean
    pub double_average: f64,
    /// Time mean with the double average removed, `(z, y, x)`
    pub mean_deviation: Array3<f64>,
    /// Deviation from the local time mean, `(time, z, y, x)`
    pub fluctuation: Field,
}

impl Decomposition {
    /// The double average wrapped as a one-element array, the form it is written in.
    #[must_use]
    pub fn double_average_array(&self) -> Array1<f64> {
        arr1(&[self.double_average])
    }

    /// Local time mean, `mean_deviation + double_average`.
    #[must_use]
    pub fn time_mean(&self) -> Array3<f64> {
        &self.mean_deviation + self.double_average
    }

    /// Sums the three terms back into the original field.
    #[must_use]
    pub fn reconstruct(&self) -> Field {
        let time_mean = self.time_mean();
        let mut field = self.fluctuation.clone();
        for mut slice in field.axis_iter_mut(Axis(0)) {
            slice += &time_mean;
        }
        field
    }
}

/// Decomposes `q` into its double average, mean deviation and fluctuation.
///
/// The field is consumed; its buffer is reused for the fluctuation. The
/// fluctuation is taken relative to the local time mean, not to the mean
/// deviation, so `double_average + mean_deviation` must be added back
/// together to recover the time mean.
///
/// # Errors
///
/// Returns [`FlowError::EmptyField`] when any axis of `q` has length zero.
pub fn decompose(mut q: Field) -> Result<Decomposition> {
    if q.is_empty() {
        return Err(FlowError::EmptyField {
            shape: q.shape().to_vec(),
        });
    }

    let time_mean = q.mean_axis(Axis(0)).ok_or_else(|| FlowError::EmptyField {
        shape: q.shape().to_vec(),
    })?;
    let double_average = time_mean.mean().ok_or_else(|| FlowError::EmptyField {
        shape: q.shape().to_vec(),
    })?;

    Zip::from(q.axis_iter_mut(Axis(0))).par_for_each(|mut slice| slice -= &time_mean);

    Ok(Decomposition {
        double_average,
        mean_deviation: time_mean - double_average,
        fluctuation: q,
    })
}

/// Subtracts the time mean `vm` from every time slice of `vc`.
///
/// # Errors
///
/// Returns [`FlowError::ShapeMismatch`] when the spatial extents of `vc` and `vm` differ.
pub fn prime_component(vc: &Field, vm: &Array3<f64>) -> Result<Field> {
    let spatial = &vc.shape()[1..];
    if spatial != vm.shape() {
        return Err(FlowError::ShapeMismatch {
            expected: spatial.to_vec(),
            found: vm.shape().to_vec(),
        });
    }

    log::info!("⚡ Computing primes for {} times", vc.len_of(Axis(0)));

    let mut vp = vc.clone();
    Zip::from(vp.axis_iter_mut(Axis(0))).par_for_each(|mut slice| slice -= vm);

    Ok(vp)
}
