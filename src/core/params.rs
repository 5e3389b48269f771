use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::TransformSpec;

/// Geographic lon/lat on WGS84, the grid every parameter is warped onto
pub const DEFAULT_TARGET_SRS: &str = "+proj=longlat +ellps=WGS84 +datum=WGS84 +no_defs";

/// Transform entry as written in a config file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformEntry {
    pub t_type: String,
    #[serde(default = "default_coefficient")]
    pub t_coeff: f64,
}

fn default_coefficient() -> f64 {
    1.0
}

/// Engine parameters suitable for config files
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineParams {
    /// Extension of the per-date source rasters, without the dot
    pub raster_extension: String,
    /// Fraction of the value used as uncertainty when no `_unc` files exist
    pub uncertainty_fraction: f64,
    /// SRS handed to `gdalwarp -t_srs`
    pub target_srs: String,
    /// Resampling method handed to `gdalwarp -r`
    pub resample_alg: String,
    /// Reuse existing composites whenever both artifacts exist, without
    /// checking the source manifest
    pub reuse_stale_composites: bool,
    pub transforms: BTreeMap<String, TransformEntry>,
}

impl Default for EngineParams {
    fn default() -> Self {
        Self {
            raster_extension: "tif".to_string(),
            uncertainty_fraction: 0.2,
            target_srs: DEFAULT_TARGET_SRS.to_string(),
            resample_alg: "near".to_string(),
            reuse_stale_composites: false,
            transforms: BTreeMap::new(),
        }
    }
}

impl EngineParams {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn with_transform(mut self, parameter: &str, t_type: &str, t_coeff: f64) -> Self {
        self.transforms.insert(
            parameter.to_string(),
            TransformEntry {
                t_type: t_type.to_string(),
                t_coeff,
            },
        );
        self
    }

    /// Resolve and validate the transform configured for `parameter`
    pub fn transform_for(&self, parameter: &str) -> Result<TransformSpec> {
        let entry = self
            .transforms
            .get(parameter)
            .ok_or_else(|| Error::config(parameter, "no transform configured"))?;
        TransformSpec::parse(parameter, &entry.t_type, entry.t_coeff)
    }
}
