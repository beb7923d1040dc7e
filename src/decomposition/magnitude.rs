//! Vector magnitudes of the decomposition terms.

use super::operations::Decomposition;
use crate::errors::{FlowError, Result};
use crate::grid::Field;
use ndarray::{arr1, Array1, Array3, Zip};

/// Magnitudes of the three decomposition terms of a vector field.
#[derive(Debug, Clone)]
pub struct Magnitudes {
    /// `[|<U>|, mean(|U~|), mean(|U'|)]`
    pub double_average: Array1<f64>,
    /// `|U~|` over `(z, y, x)`
    pub mean_deviation: Array3<f64>,
    /// `|U'|` over `(time, z, y, x)`
    pub fluctuation: Field,
}

/// Accumulates squared decomposition terms one component at a time.
///
/// Feed each component's [`Decomposition`] with [`add`](Self::add) before its
/// arrays are dropped, then call [`finish`](Self::finish).
#[derive(Debug, Default)]
pub struct MagnitudeAccumulator {
    double_average: f64,
    mean_deviation: Option<Array3<f64>>,
    fluctuation: Option<Field>,
}

impl MagnitudeAccumulator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the squares of one component's terms.
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::ShapeMismatch`] when the component's extents
    /// differ from the ones already accumulated.
    pub fn add(&mut self, d: &Decomposition) -> Result<()> {
        self.double_average += d.double_average * d.double_average;

        match &mut self.mean_deviation {
            Some(acc) => {
                check_shape(acc.shape(), d.mean_deviation.shape())?;
                Zip::from(acc)
                    .and(&d.mean_deviation)
                    .par_for_each(|a, &q| *a += q * q);
            }
            None => self.mean_deviation = Some(d.mean_deviation.mapv(|q| q * q)),
        }

        match &mut self.fluctuation {
            Some(acc) => {
                check_shape(acc.shape(), d.fluctuation.shape())?;
                Zip::from(acc)
                    .and(&d.fluctuation)
                    .par_for_each(|a, &q| *a += q * q);
            }
            None => self.fluctuation = Some(d.fluctuation.mapv(|q| q * q)),
        }

        Ok(())
    }

    /// Takes square roots and appends the spatial means of the two field magnitudes.
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::EmptyField`] when no component was added.
    pub fn finish(self) -> Result<Magnitudes> {
        let (Some(mut mean_deviation), Some(mut fluctuation)) =
            (self.mean_deviation, self.fluctuation)
        else {
            return Err(FlowError::EmptyField { shape: Vec::new() });
        };

        mean_deviation.par_mapv_inplace(f64::sqrt);
        fluctuation.par_mapv_inplace(f64::sqrt);

        let empty = || FlowError::EmptyField {
            shape: fluctuation.shape().to_vec(),
        };
        let tilde_mean = mean_deviation.mean().ok_or_else(empty)?;
        let prime_mean = fluctuation.mean().ok_or_else(empty)?;

        Ok(Magnitudes {
            double_average: arr1(&[self.double_average.sqrt(), tilde_mean, prime_mean]),
            mean_deviation,
            fluctuation,
        })
    }
}

fn check_shape(expected: &[usize], found: &[usize]) -> Result<()> {
    if expected == found {
        Ok(())
    } else {
        Err(FlowError::ShapeMismatch {
            expected: expected.to_vec(),
            found: found.to_vec(),
        })
    }
}
