//! Dataset assembly: join the value composite, its timestamps and the optional
//! uncertainty composite into one `Cube` of `{min, mean, max}`.
use chrono::NaiveDate;
use ndarray::{Array3, Zip};
use tracing::{debug, info};

use crate::core::cube::{Composite, Cube};
use crate::error::{Error, Result};

/// Largest coordinate difference, in degrees, still treated as the same pixel centre
const GRID_TOLERANCE: f64 = 1e-9;

/// Uncertainty source for one parameter
#[derive(Debug, Clone)]
pub enum Uncertainty {
    /// Read from `_unc` files, with its own band-ordered timestamps
    Composite {
        composite: Composite,
        times: Vec<NaiveDate>,
    },
    /// No `_unc` files: a fixed fraction of the value at every cell
    Fraction(f64),
}

/// Build the untransformed cube. `min = value - unc`, `max = value + unc`.
pub fn assemble_cube(
    parameter: &str,
    value: Composite,
    times: Vec<NaiveDate>,
    uncertainty: Uncertainty,
) -> Result<Cube> {
    if value.band_count() != times.len() {
        return Err(Error::alignment(
            parameter,
            format!(
                "value composite has {} bands but {} timestamps",
                value.band_count(),
                times.len()
            ),
        ));
    }
    let (rows, cols) = value.spatial_shape();
    if value.grid.shape() != (rows, cols) {
        return Err(Error::alignment(
            parameter,
            format!(
                "grid of {:?} does not match pixel shape {:?}",
                value.grid.shape(),
                (rows, cols)
            ),
        ));
    }

    let unc: Array3<f64> = match uncertainty {
        Uncertainty::Composite {
            composite,
            times: unc_times,
        } => {
            if unc_times.len() != times.len() || composite.band_count() != times.len() {
                return Err(Error::alignment(
                    parameter,
                    format!(
                        "uncertainty has {} timestamps ({} bands), value has {}",
                        unc_times.len(),
                        composite.band_count(),
                        times.len()
                    ),
                ));
            }
            if unc_times != times {
                return Err(Error::alignment(
                    parameter,
                    "uncertainty timestamps differ from value timestamps",
                ));
            }
            if composite.spatial_shape() != (rows, cols) {
                return Err(Error::alignment(
                    parameter,
                    format!(
                        "uncertainty grid is {:?}, value grid is {:?}",
                        composite.spatial_shape(),
                        (rows, cols)
                    ),
                ));
            }
            if !composite.grid.approx_eq(&value.grid, GRID_TOLERANCE) {
                return Err(Error::alignment(
                    parameter,
                    "uncertainty grid coordinates differ from value grid coordinates",
                ));
            }
            debug!("Using uncertainty composite for {}", parameter);
            composite.data
        }
        Uncertainty::Fraction(fraction) => {
            info!(
                "No uncertainty files for {}; using {}% of the value",
                parameter,
                fraction * 100.0
            );
            value.data.mapv(|v| v * fraction)
        }
    };

    let mut min = Array3::<f64>::zeros(value.data.dim());
    let mut max = Array3::<f64>::zeros(value.data.dim());
    Zip::from(&mut min)
        .and(&mut max)
        .and(&value.data)
        .and(&unc)
        .for_each(|lo, hi, &v, &u| {
            *lo = v - u;
            *hi = v + u;
        });

    Ok(Cube {
        times,
        grid: value.grid,
        min,
        mean: value.data,
        max,
    })
}
