//! Crate-level error type and `Result` alias.
//! Load-time failures (missing sources, unparseable dates, misaligned composites,
//! bad transform configuration) and query-time failures share one enum so callers
//! can match on the variant that matters to them.
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("No {variant} source files for parameter `{parameter}` in {dir}")]
    NoData {
        parameter: String,
        variant: &'static str,
        dir: PathBuf,
    },

    #[error("Unable to determine date for parameter `{parameter}` from file `{file}`")]
    DateParse { parameter: String, file: String },

    #[error("Alignment error for parameter `{parameter}`: {reason}")]
    Alignment { parameter: String, reason: String },

    #[error("Transform configuration error for parameter `{parameter}`: {reason}")]
    Config { parameter: String, reason: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("GDAL error: {0}")]
    Gdal(#[from] crate::io::GdalError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn alignment(parameter: &str, reason: impl Into<String>) -> Self {
        Error::Alignment {
            parameter: parameter.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn config(parameter: &str, reason: impl Into<String>) -> Self {
        Error::Config {
            parameter: parameter.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn unknown_parameter(parameter: &str) -> Self {
        Error::NotFound(format!("parameter `{}`", parameter))
    }
}
