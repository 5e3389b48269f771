//! Conversion of stored magnitudes into physical units.
//!
//! `linear` is exact. `log-inverse` maps each of min, mean and max through
//! `c * ln(x)` on its own; the resulting bracket is not a propagated
//! uncertainty, only the image of the stored one. When the function is
//! decreasing the transformed min and max trade places, so the arrays are
//! swapped back to keep `min <= mean <= max`. Only a negative coefficient
//! triggers the swap; older dashboards swapped log-inverse brackets
//! unconditionally, which inverted them for positive coefficients.
use tracing::debug;

use crate::core::cube::Cube;
use crate::types::{TransformKind, TransformSpec};

#[inline]
pub fn linear(x: f64, coefficient: f64) -> f64 {
    coefficient * x
}

/// Non-positive inputs give NaN or -inf, which later reductions skip
#[inline]
pub fn log_inverse(x: f64, coefficient: f64) -> f64 {
    coefficient * x.ln()
}

/// Apply `spec` to every cell of `cube`
pub fn transform_cube(mut cube: Cube, spec: &TransformSpec) -> Cube {
    let c = spec.coefficient;
    let f: fn(f64, f64) -> f64 = match spec.kind {
        TransformKind::None => return cube,
        TransformKind::Linear => linear,
        TransformKind::LogInverse => log_inverse,
    };

    for arr in [&mut cube.min, &mut cube.mean, &mut cube.max] {
        arr.mapv_inplace(|x| f(x, c));
    }

    if spec.is_decreasing() {
        debug!("Swapping min/max after decreasing {} transform", spec.kind);
        std::mem::swap(&mut cube.min, &mut cube.max);
    }
    cube
}
