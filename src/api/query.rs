//! Request and response shapes exchanged with the visualisation layer.
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core::stats::VisStats;

/// One request from the visualisation layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Query {
    ListParameters,
    Timesteps {
        parameter: String,
    },
    Timestep {
        parameter: String,
        time: NaiveDate,
    },
    Timeseries {
        parameter: String,
        lat: f64,
        lon: f64,
    },
    AreaAggregate {
        parameter: String,
        lat_range: (f64, f64),
        lon_range: (f64, f64),
    },
    VisStats {
        parameter: String,
    },
}

impl Query {
    /// The `kind` tag this request is serialized with
    pub fn kind(&self) -> &'static str {
        match self {
            Query::ListParameters => "list_parameters",
            Query::Timesteps { .. } => "timesteps",
            Query::Timestep { .. } => "timestep",
            Query::Timeseries { .. } => "timeseries",
            Query::AreaAggregate { .. } => "area_aggregate",
            Query::VisStats { .. } => "vis_stats",
        }
    }

    /// Parameter the request targets, if any
    pub fn parameter(&self) -> Option<&str> {
        match self {
            Query::ListParameters => None,
            Query::Timesteps { parameter }
            | Query::Timestep { parameter, .. }
            | Query::Timeseries { parameter, .. }
            | Query::AreaAggregate { parameter, .. }
            | Query::VisStats { parameter } => Some(parameter.as_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum QueryResponse {
    Parameters(Vec<String>),
    Timesteps(Vec<NaiveDate>),
    Timestep(TimestepSlice),
    Timeseries(Timeseries),
    AreaAggregate(AreaAggregate),
    VisStats(VisStats),
}

/// Values of one grid cell
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CellValues {
    pub latitude: f64,
    pub longitude: f64,
    pub min: f64,
    pub mean: f64,
    pub max: f64,
}

/// Every cell of one timestep, row-major over the grid
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimestepSlice {
    pub time: NaiveDate,
    pub cells: Vec<CellValues>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimeseriesPoint {
    pub time: NaiveDate,
    pub min: f64,
    pub mean: f64,
    pub max: f64,
}

/// Full series of the pixel nearest to the requested location
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Timeseries {
    /// Pixel centre actually used
    pub latitude: f64,
    pub longitude: f64,
    pub points: Vec<TimeseriesPoint>,
}

/// Per-timestep spatial means over a lat/lon box, one series per band
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AreaAggregate {
    pub times: Vec<NaiveDate>,
    pub min: Vec<f64>,
    pub mean: Vec<f64>,
    pub max: Vec<f64>,
    /// Finite `mean` cells behind each timestep
    pub cell_counts: Vec<usize>,
}
