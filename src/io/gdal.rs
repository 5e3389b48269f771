use gdal::raster::ResampleAlg;
use gdal::{Dataset, errors::GdalError as GdalCrateError};
use ndarray::Array3;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

use crate::core::cube::{Composite, Grid};

/// Errors encountered when reading composites or running GDAL utilities
#[derive(Debug, Error)]
pub enum GdalError {
    #[error("GDAL error: {0}")]
    Gdal(#[from] GdalCrateError),
    #[error("Unsupported raster: {0}")]
    UnsupportedFormat(String),
    #[error("Dimension mismatch: expected {0}x{1}, got {2} values")]
    DimensionMismatch(usize, usize, usize),
    #[error("{tool} failed: {detail}")]
    Tool { tool: &'static str, detail: String },
}

/// Metadata of an opened composite
#[derive(Debug, Clone)]
pub struct RasterMetadata {
    /// Width (pixels) of the raster
    pub size_x: usize,
    /// Height (lines) of the raster
    pub size_y: usize,
    /// Number of raster bands
    pub bands: usize,
    /// Affine geotransform coefficients
    /// (`[origin_x, pixel_width, rot_x, origin_y, rot_y, pixel_height]`)
    pub geotransform: [f64; 6],
    /// Projection in WKT format
    pub projection: String,
}

/// Reader for a (warped) multi-band composite
pub struct RasterReader {
    pub dataset: Dataset,
    pub metadata: RasterMetadata,
}

impl RasterReader {
    /// Open any GDAL-supported raster (VRT, GeoTIFF, ...)
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, GdalError> {
        let dataset = Dataset::open(path.as_ref())?;
        let (size_x, size_y) = dataset.raster_size();
        let bands = dataset.raster_count() as usize;
        if bands == 0 {
            return Err(GdalError::UnsupportedFormat("No raster bands found".into()));
        }
        let geotransform = dataset.geo_transform()?;
        if geotransform[2] != 0.0 || geotransform[4] != 0.0 {
            return Err(GdalError::UnsupportedFormat(format!(
                "rotated geotransform {:?} in {}",
                geotransform,
                path.as_ref().display()
            )));
        }
        let projection = dataset.projection();
        Ok(RasterReader {
            dataset,
            metadata: RasterMetadata {
                size_x: size_x as usize,
                size_y: size_y as usize,
                bands,
                geotransform,
                projection,
            },
        })
    }

    /// Pixel-centre latitude/longitude of every row and column
    pub fn grid(&self) -> Grid {
        Grid::from_geotransform(
            &self.metadata.geotransform,
            self.metadata.size_y,
            self.metadata.size_x,
        )
    }

    /// Read one band (1-based index) as f64 values in row-major order, with the
    /// band's nodata value replaced by NaN
    pub fn read_band(&self, index: usize) -> Result<Vec<f64>, GdalError> {
        if index == 0 || index > self.metadata.bands {
            return Err(GdalError::UnsupportedFormat(format!(
                "Band index {} out of range",
                index
            )));
        }
        let band = self.dataset.rasterband(index)?;
        let window = (self.metadata.size_x, self.metadata.size_y);
        let buf = band.read_as::<f64>((0, 0), window, window, Some(ResampleAlg::NearestNeighbour))?;
        let mut data = buf.data().to_vec();
        if let Some(nodata) = band.no_data_value().filter(|v| !v.is_nan()) {
            data.iter_mut()
                .filter(|v| **v == nodata)
                .for_each(|v| *v = f64::NAN);
        }
        Ok(data)
    }

    /// Read every band into a `(band, row, col)` composite
    pub fn read_composite(&self) -> Result<Composite, GdalError> {
        let (rows, cols, bands) = (self.metadata.size_y, self.metadata.size_x, self.metadata.bands);
        let mut values = Vec::with_capacity(bands * rows * cols);
        for idx in 1..=bands {
            values.extend(self.read_band(idx)?);
        }
        let got = values.len();
        let data = Array3::from_shape_vec((bands, rows, cols), values)
            .map_err(|_| GdalError::DimensionMismatch(cols, rows, got))?;
        debug!("Read composite of {} bands, {}x{} pixels", bands, cols, rows);
        Ok(Composite::new(self.grid(), data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gdal::DriverManager;
    use gdal::raster::Buffer;

    #[test]
    fn reads_bands_with_nodata_as_nan() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("two_band.tif");
        {
            let driver = DriverManager::get_driver_by_name("GTiff").unwrap();
            let mut ds = driver
                .create_with_band_type::<f64, _>(&path, 3, 2, 2)
                .unwrap();
            ds.set_geo_transform(&[-1.0, 1.0, 0.0, 40.0, 0.0, -0.5]).unwrap();
            for (idx, offset) in [(1usize, 0.0), (2usize, 100.0)] {
                let mut band = ds.rasterband(idx).unwrap();
                band.set_no_data_value(Some(-9999.0)).unwrap();
                let mut values: Vec<f64> = (0..6).map(|v| v as f64 + offset).collect();
                values[4] = -9999.0;
                let mut buf = Buffer::new((3, 2), values);
                band.write((0, 0), (3, 2), &mut buf).unwrap();
            }
        }

        let reader = RasterReader::open(&path).unwrap();
        assert_eq!(reader.metadata.bands, 2);
        let composite = reader.read_composite().unwrap();
        assert_eq!(composite.data.dim(), (2, 2, 3));
        assert_eq!(composite.data[[0, 0, 1]], 1.0);
        assert_eq!(composite.data[[1, 1, 2]], 105.0);
        assert!(composite.data[[0, 1, 1]].is_nan());
        assert!(composite.data[[1, 1, 1]].is_nan());
        assert_eq!(composite.grid.longitudes, vec![-0.5, 0.5, 1.5]);
        assert_eq!(composite.grid.latitudes, vec![39.75, 39.25]);
    }
}
