//! In-memory data cube: `min`, `mean` and `max` arrays over
//! `(time, latitude, longitude)` sharing one timestamp axis and one grid.
use chrono::NaiveDate;
use ndarray::{Array3, ArrayView2};
use serde::Serialize;

/// Pixel-centre coordinates of a north-up raster
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Grid {
    /// One entry per row
    pub latitudes: Vec<f64>,
    /// One entry per column
    pub longitudes: Vec<f64>,
}

impl Grid {
    pub fn new(latitudes: Vec<f64>, longitudes: Vec<f64>) -> Self {
        Self {
            latitudes,
            longitudes,
        }
    }

    /// Pixel centres of a raster described by a GDAL geotransform
    pub fn from_geotransform(gt: &[f64; 6], rows: usize, cols: usize) -> Self {
        let longitudes = (0..cols).map(|j| gt[0] + (j as f64 + 0.5) * gt[1]).collect();
        let latitudes = (0..rows).map(|i| gt[3] + (i as f64 + 0.5) * gt[5]).collect();
        Self {
            latitudes,
            longitudes,
        }
    }

    /// (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        (self.latitudes.len(), self.longitudes.len())
    }

    /// Same shape, and every pixel centre within `tolerance` of its counterpart
    pub fn approx_eq(&self, other: &Grid, tolerance: f64) -> bool {
        fn axis_eq(a: &[f64], b: &[f64], tolerance: f64) -> bool {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| (x - y).abs() <= tolerance)
        }
        axis_eq(&self.latitudes, &other.latitudes, tolerance)
            && axis_eq(&self.longitudes, &other.longitudes, tolerance)
    }

    /// Index of the row whose centre is closest to `lat`
    pub fn nearest_row(&self, lat: f64) -> Option<usize> {
        nearest_index(&self.latitudes, lat)
    }

    /// Index of the column whose centre is closest to `lon`
    pub fn nearest_col(&self, lon: f64) -> Option<usize> {
        nearest_index(&self.longitudes, lon)
    }
}

fn nearest_index(axis: &[f64], target: f64) -> Option<usize> {
    if !target.is_finite() {
        return None;
    }
    axis.iter()
        .enumerate()
        .filter(|(_, c)| c.is_finite())
        .min_by(|(_, a), (_, b)| {
            (*a - target)
                .abs()
                .total_cmp(&(*b - target).abs())
        })
        .map(|(idx, _)| idx)
}

/// One reprojected multi-band composite read into memory
#[derive(Debug, Clone)]
pub struct Composite {
    pub grid: Grid,
    /// `(band, row, col)`
    pub data: Array3<f64>,
}

impl Composite {
    pub fn new(grid: Grid, data: Array3<f64>) -> Self {
        Self { grid, data }
    }

    pub fn band_count(&self) -> usize {
        self.data.dim().0
    }

    /// (rows, cols) of the pixel data
    pub fn spatial_shape(&self) -> (usize, usize) {
        let (_, rows, cols) = self.data.dim();
        (rows, cols)
    }
}

/// Which of the three cube arrays to address
#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Band {
    Min,
    Mean,
    Max,
}

#[derive(Debug, Clone)]
pub struct Cube {
    pub times: Vec<NaiveDate>,
    pub grid: Grid,
    pub min: Array3<f64>,
    pub mean: Array3<f64>,
    pub max: Array3<f64>,
}

impl Cube {
    /// (time, rows, cols)
    pub fn dim(&self) -> (usize, usize, usize) {
        self.mean.dim()
    }

    pub fn band(&self, band: Band) -> &Array3<f64> {
        match band {
            Band::Min => &self.min,
            Band::Mean => &self.mean,
            Band::Max => &self.max,
        }
    }

    pub fn time_index(&self, time: NaiveDate) -> Option<usize> {
        self.times.binary_search(&time).ok()
    }

    /// 2D view of one band at one timestep
    pub fn slice(&self, band: Band, t: usize) -> ArrayView2<'_, f64> {
        self.band(band).index_axis(ndarray::Axis(0), t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geotransform_gives_pixel_centres() {
        let grid = Grid::from_geotransform(&[10.0, 0.5, 0.0, 50.0, 0.0, -0.5], 2, 3);
        assert_eq!(grid.longitudes, vec![10.25, 10.75, 11.25]);
        assert_eq!(grid.latitudes, vec![49.75, 49.25]);
        assert_eq!(grid.shape(), (2, 3));
    }

    #[test]
    fn nearest_pixel_snaps_and_clamps() {
        let grid = Grid::new(vec![49.75, 49.25], vec![10.25, 10.75, 11.25]);
        assert_eq!(grid.nearest_row(49.3), Some(1));
        assert_eq!(grid.nearest_col(10.6), Some(1));
        assert_eq!(grid.nearest_col(40.0), Some(2));
        assert_eq!(grid.nearest_row(f64::NAN), None);
    }

    #[test]
    fn grids_compare_by_pixel_centres() {
        let a = Grid::new(vec![40.5, 39.5], vec![-3.5, -2.5]);
        let nudged = Grid::new(vec![40.5 + 1e-12, 39.5], vec![-3.5, -2.5]);
        let moved = Grid::new(vec![10.5, 9.5], vec![100.5, 101.5]);
        assert!(a.approx_eq(&nudged, 1e-9));
        assert!(!a.approx_eq(&moved, 1e-9));
        assert!(!a.approx_eq(&Grid::new(vec![40.5], vec![-3.5, -2.5]), 1e-9));
    }
}
