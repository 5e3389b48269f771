use ndarray::{Array3, Zip};
use serde::Serialize;
use tracing::debug;

use crate::core::cube::Cube;

/// Global summary of one array, over finite cells only
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Summary {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// Population standard deviation
    pub std: f64,
    /// Number of finite cells that contributed
    pub count: usize,
}

impl Summary {
    /// Summary of no values: every statistic is NaN
    pub const EMPTY: Summary = Summary {
        min: f64::NAN,
        max: f64::NAN,
        mean: f64::NAN,
        std: f64::NAN,
        count: 0,
    };

    /// Single pass min/max plus Welford mean/variance. NaN and ±inf are skipped.
    pub fn of<'a, I>(values: I) -> Summary
    where
        I: IntoIterator<Item = &'a f64>,
    {
        let mut count: u64 = 0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut mean = 0.0_f64;
        let mut m2 = 0.0_f64;

        for &v in values {
            if !v.is_finite() {
                continue;
            }
            count += 1;
            if v < min {
                min = v;
            }
            if v > max {
                max = v;
            }
            let delta = v - mean;
            mean += delta / (count as f64);
            m2 += delta * (v - mean);
        }

        if count == 0 {
            return Summary::EMPTY;
        }
        Summary {
            min,
            max,
            mean,
            std: (m2 / count as f64).sqrt(),
            count: count as usize,
        }
    }
}

/// Statistics used for default display scaling of a parameter
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VisStats {
    /// Over the `mean` array
    pub core: Summary,
    /// Over `|max - min|`
    pub unc_range: Summary,
}

impl VisStats {
    pub fn compute(cube: &Cube) -> Self {
        let core = Summary::of(cube.mean.iter());

        let mut range = Array3::<f64>::zeros(cube.max.dim());
        Zip::from(&mut range)
            .and(&cube.max)
            .and(&cube.min)
            .for_each(|r, &hi, &lo| *r = (hi - lo).abs());
        let unc_range = Summary::of(range.iter());

        debug!(
            "Vis stats: core {:.4}..{:.4} (mean {:.4}, std {:.4}, n={}), unc range max {:.4}",
            core.min, core.max, core.mean, core.std, core.count, unc_range.max
        );
        Self { core, unc_range }
    }

    /// Colour ramp bounds for the value map: `mean ± 2 std`, narrowed to the
    /// observed range
    pub fn core_colorscale(&self) -> (f64, f64) {
        let c = &self.core;
        if c.count == 0 {
            return (f64::NAN, f64::NAN);
        }
        let lo = (c.mean - 2.0 * c.std).max(c.min);
        let hi = (c.mean + 2.0 * c.std).min(c.max);
        (lo, hi)
    }

    /// Colour ramp bounds for the uncertainty map
    pub fn uncertainty_colorscale(&self) -> (f64, f64) {
        (0.0, self.unc_range.max)
    }
}
