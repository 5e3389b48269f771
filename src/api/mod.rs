//! High-level library API: load every parameter of a source directory into an
//! immutable `Engine`, then answer slice, timeseries, area and statistics
//! queries against it. Prefer these entrypoints over the low-level `core` and
//! `io` modules when integrating rastercube.
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, error, info, warn};

use crate::core::assemble::{Uncertainty, assemble_cube};
use crate::core::cube::{Band, Cube};
use crate::core::params::EngineParams;
use crate::core::stats::VisStats;
use crate::core::transform::transform_cube;
use crate::error::{Error, Result};
use crate::io::RasterReader;
use crate::io::discovery::discover_parameters;
use crate::io::mosaic::build_mosaic;
use crate::types::{TransformSpec, Variant};

pub mod query;
pub use query::{
    AreaAggregate, CellValues, Query, QueryResponse, Timeseries, TimeseriesPoint, TimestepSlice,
};

/// A loaded parameter: its cube in physical units plus cached statistics
#[derive(Debug, Clone)]
pub struct ParameterData {
    pub name: String,
    pub transform: TransformSpec,
    pub cube: Cube,
    pub vis_stats: VisStats,
}

impl ParameterData {
    /// Transform a freshly assembled cube and compute its statistics
    pub fn from_raw_cube(name: &str, transform: TransformSpec, raw: Cube) -> Self {
        let cube = transform_cube(raw, &transform);
        let vis_stats = VisStats::compute(&cube);
        Self {
            name: name.to_string(),
            transform,
            cube,
            vis_stats,
        }
    }
}

/// A parameter that could not be loaded, kept for the operator
#[derive(Debug)]
pub struct LoadFailure {
    pub parameter: String,
    pub error: Error,
}

/// Run the whole load pipeline for one parameter of `dir`
pub fn load_parameter(dir: &Path, parameter: &str, params: &EngineParams) -> Result<ParameterData> {
    let transform = params.transform_for(parameter)?;

    let value = build_mosaic(dir, parameter, Variant::Value, params)?.ok_or_else(|| {
        Error::NoData {
            parameter: parameter.to_string(),
            variant: "value",
            dir: dir.to_path_buf(),
        }
    })?;
    let value_composite = RasterReader::open(&value.warped)?.read_composite()?;

    let uncertainty = match build_mosaic(dir, parameter, Variant::Uncertainty, params)? {
        Some(unc) => Uncertainty::Composite {
            composite: RasterReader::open(&unc.warped)?.read_composite()?,
            times: unc.times,
        },
        None => Uncertainty::Fraction(params.uncertainty_fraction),
    };

    let raw = assemble_cube(parameter, value_composite, value.times, uncertainty)?;
    Ok(ParameterData::from_raw_cube(parameter, transform, raw))
}

/// Read-only query engine over loaded parameters.
///
/// Loaded data sits behind `Arc` and is never mutated, so `&Engine` can be
/// shared across threads. `reload` needs `&mut Engine`.
#[derive(Debug, Default)]
pub struct Engine {
    source_dir: Option<PathBuf>,
    params: EngineParams,
    parameters: BTreeMap<String, Arc<ParameterData>>,
    load_failures: Vec<LoadFailure>,
}

impl Engine {
    /// Discover and load every parameter in `dir`. A parameter that fails to
    /// load is logged, recorded in `load_failures` and left out.
    pub fn open(dir: &Path, params: EngineParams) -> Result<Self> {
        let names = discover_parameters(dir, &params.raster_extension)?;
        info!("Found {} parameters in {}: {:?}", names.len(), dir.display(), names);

        let mut engine = Engine {
            source_dir: Some(dir.to_path_buf()),
            params,
            ..Default::default()
        };
        for name in names {
            match load_parameter(dir, &name, &engine.params) {
                Ok(data) => {
                    let (t, rows, cols) = data.cube.dim();
                    info!("Loaded {}: {} timesteps on a {}x{} grid", name, t, cols, rows);
                    engine.parameters.insert(name, Arc::new(data));
                }
                Err(e) => {
                    error!("Failed to load parameter {}: {}", name, e);
                    engine.load_failures.push(LoadFailure {
                        parameter: name,
                        error: e,
                    });
                }
            }
        }
        Ok(engine)
    }

    /// Engine over already-built parameters, with no source directory
    pub fn from_parameters<I>(parameters: I) -> Self
    where
        I: IntoIterator<Item = ParameterData>,
    {
        Engine {
            parameters: parameters
                .into_iter()
                .map(|p| (p.name.clone(), Arc::new(p)))
                .collect(),
            ..Default::default()
        }
    }

    pub fn load_failures(&self) -> &[LoadFailure] {
        &self.load_failures
    }

    /// Rebuild one parameter from the source directory. The current data stays
    /// in place until the new cube is complete; on failure it is kept.
    pub fn reload(&mut self, parameter: &str) -> Result<()> {
        let dir = self.source_dir.clone().ok_or_else(|| {
            Error::NotFound("source directory (engine was built in memory)".to_string())
        })?;
        let data = load_parameter(&dir, parameter, &self.params).inspect_err(|e| {
            warn!("Reload of {} failed, keeping previous data: {}", parameter, e);
        })?;
        self.parameters.insert(parameter.to_string(), Arc::new(data));
        self.load_failures.retain(|f| f.parameter != parameter);
        info!("Reloaded {}", parameter);
        Ok(())
    }

    pub fn parameter(&self, parameter: &str) -> Result<Arc<ParameterData>> {
        self.parameters
            .get(parameter)
            .cloned()
            .ok_or_else(|| Error::unknown_parameter(parameter))
    }

    fn cube(&self, parameter: &str) -> Result<&Cube> {
        self.parameters
            .get(parameter)
            .map(|p| &p.cube)
            .ok_or_else(|| Error::unknown_parameter(parameter))
    }

    /// Sorted names of the loaded parameters
    pub fn list_parameters(&self) -> Vec<String> {
        self.parameters.keys().cloned().collect()
    }

    pub fn get_timesteps(&self, parameter: &str) -> Result<Vec<NaiveDate>> {
        Ok(self.cube(parameter)?.times.clone())
    }

    /// Slice at exactly `time`; there is no snapping to a neighbouring date
    pub fn get_timestep(&self, parameter: &str, time: NaiveDate) -> Result<TimestepSlice> {
        let cube = self.cube(parameter)?;
        let t = cube.time_index(time).ok_or_else(|| {
            Error::NotFound(format!("timestep {} for parameter `{}`", time, parameter))
        })?;
        Ok(slice_at(cube, t))
    }

    /// Slice at band position `index`
    pub fn get_timestep_at(&self, parameter: &str, index: usize) -> Result<TimestepSlice> {
        let cube = self.cube(parameter)?;
        if index >= cube.times.len() {
            return Err(Error::NotFound(format!(
                "timestep index {} for parameter `{}` ({} timesteps)",
                index,
                parameter,
                cube.times.len()
            )));
        }
        Ok(slice_at(cube, index))
    }

    /// Series of the pixel whose centre is nearest to (`lat`, `lon`)
    pub fn get_timeseries(&self, parameter: &str, lat: f64, lon: f64) -> Result<Timeseries> {
        let cube = self.cube(parameter)?;
        let (row, col) = cube
            .grid
            .nearest_row(lat)
            .zip(cube.grid.nearest_col(lon))
            .ok_or_else(|| {
                Error::NotFound(format!(
                    "pixel near ({}, {}) for parameter `{}`",
                    lat, lon, parameter
                ))
            })?;

        let points = cube
            .times
            .iter()
            .enumerate()
            .map(|(t, &time)| TimeseriesPoint {
                time,
                min: cube.min[[t, row, col]],
                mean: cube.mean[[t, row, col]],
                max: cube.max[[t, row, col]],
            })
            .collect();
        Ok(Timeseries {
            latitude: cube.grid.latitudes[row],
            longitude: cube.grid.longitudes[col],
            points,
        })
    }

    /// Per-timestep mean of the finite cells whose centres lie inside the box.
    /// Range bounds are inclusive and may be given in either order.
    pub fn get_area_aggregate(
        &self,
        parameter: &str,
        lat_range: (f64, f64),
        lon_range: (f64, f64),
    ) -> Result<AreaAggregate> {
        let cube = self.cube(parameter)?;
        let rows = indices_within(&cube.grid.latitudes, lat_range);
        let cols = indices_within(&cube.grid.longitudes, lon_range);
        if rows.is_empty() || cols.is_empty() {
            return Err(Error::NotFound(format!(
                "pixels in lat {:?} lon {:?} for parameter `{}`",
                lat_range, lon_range, parameter
            )));
        }

        let n = cube.times.len();
        let mut out = AreaAggregate {
            times: cube.times.clone(),
            min: Vec::with_capacity(n),
            mean: Vec::with_capacity(n),
            max: Vec::with_capacity(n),
            cell_counts: Vec::with_capacity(n),
        };
        for t in 0..n {
            let (min, _) = finite_mean(cube, Band::Min, t, &rows, &cols);
            let (mean, count) = finite_mean(cube, Band::Mean, t, &rows, &cols);
            let (max, _) = finite_mean(cube, Band::Max, t, &rows, &cols);
            out.min.push(min);
            out.mean.push(mean);
            out.max.push(max);
            out.cell_counts.push(count);
        }
        Ok(out)
    }

    pub fn get_vis_stats(&self, parameter: &str) -> Result<VisStats> {
        self.parameters
            .get(parameter)
            .map(|p| p.vis_stats)
            .ok_or_else(|| Error::unknown_parameter(parameter))
    }

    /// Answer one tagged request
    pub fn handle(&self, query: &Query) -> Result<QueryResponse> {
        self.dispatch(query).inspect_err(|e| {
            debug!(
                "Query {} on {} failed: {}",
                query.kind(),
                query.parameter().unwrap_or("-"),
                e
            );
        })
    }

    fn dispatch(&self, query: &Query) -> Result<QueryResponse> {
        Ok(match query {
            Query::ListParameters => QueryResponse::Parameters(self.list_parameters()),
            Query::Timesteps { parameter } => {
                QueryResponse::Timesteps(self.get_timesteps(parameter)?)
            }
            Query::Timestep { parameter, time } => {
                QueryResponse::Timestep(self.get_timestep(parameter, *time)?)
            }
            Query::Timeseries {
                parameter,
                lat,
                lon,
            } => QueryResponse::Timeseries(self.get_timeseries(parameter, *lat, *lon)?),
            Query::AreaAggregate {
                parameter,
                lat_range,
                lon_range,
            } => QueryResponse::AreaAggregate(self.get_area_aggregate(
                parameter,
                *lat_range,
                *lon_range,
            )?),
            Query::VisStats { parameter } => {
                QueryResponse::VisStats(self.get_vis_stats(parameter)?)
            }
        })
    }
}

fn slice_at(cube: &Cube, t: usize) -> TimestepSlice {
    let (min, mean, max) = (
        cube.slice(Band::Min, t),
        cube.slice(Band::Mean, t),
        cube.slice(Band::Max, t),
    );
    let mut cells = Vec::with_capacity(mean.len());
    for (i, &latitude) in cube.grid.latitudes.iter().enumerate() {
        for (j, &longitude) in cube.grid.longitudes.iter().enumerate() {
            cells.push(CellValues {
                latitude,
                longitude,
                min: min[[i, j]],
                mean: mean[[i, j]],
                max: max[[i, j]],
            });
        }
    }
    TimestepSlice {
        time: cube.times[t],
        cells,
    }
}

fn indices_within(axis: &[f64], (a, b): (f64, f64)) -> Vec<usize> {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    axis.iter()
        .enumerate()
        .filter(|(_, c)| **c >= lo && **c <= hi)
        .map(|(i, _)| i)
        .collect()
}

/// Mean over finite cells at (`t`, rows x cols), with the number of cells used
fn finite_mean(cube: &Cube, band: Band, t: usize, rows: &[usize], cols: &[usize]) -> (f64, usize) {
    let slice = cube.slice(band, t);
    let (sum, count) = rows
        .iter()
        .flat_map(|&i| cols.iter().map(move |&j| (i, j)))
        .map(|(i, j)| slice[[i, j]])
        .filter(|v| v.is_finite())
        .fold((0.0_f64, 0usize), |(s, n), v| (s + v, n + 1));
    if count == 0 {
        (f64::NAN, 0)
    } else {
        (sum / count as f64, count)
    }
}
