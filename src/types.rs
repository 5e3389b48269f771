//! Shared types and enums used across rastercube.
//! Includes the source `Variant` (value or uncertainty), `TransformKind` and the
//! validated per-parameter `TransformSpec`.
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Which of the two per-date raster series a file belongs to
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum Variant {
    Value,
    Uncertainty,
}

impl Variant {
    /// Suffix appended to the parameter name in source files and derived artifacts
    pub fn suffix(self) -> &'static str {
        match self {
            Variant::Value => "",
            Variant::Uncertainty => "_unc",
        }
    }
}

impl std::fmt::Display for Variant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Variant::Value => write!(f, "value"),
            Variant::Uncertainty => write!(f, "uncertainty"),
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransformKind {
    None,
    Linear,
    LogInverse,
}

impl TransformKind {
    /// Parse a configured transform name. `simple` and `exponential` are the
    /// historical names of `linear` and `log-inverse`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "none" => Some(TransformKind::None),
            "linear" | "simple" => Some(TransformKind::Linear),
            "log-inverse" | "log_inverse" | "exponential" => Some(TransformKind::LogInverse),
            _ => None,
        }
    }
}

impl std::fmt::Display for TransformKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransformKind::None => write!(f, "none"),
            TransformKind::Linear => write!(f, "linear"),
            TransformKind::LogInverse => write!(f, "log-inverse"),
        }
    }
}

/// Validated transform for one parameter
#[derive(Copy, Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct TransformSpec {
    pub kind: TransformKind,
    pub coefficient: f64,
}

impl TransformSpec {
    pub const IDENTITY: TransformSpec = TransformSpec {
        kind: TransformKind::None,
        coefficient: 1.0,
    };

    pub fn new(kind: TransformKind, coefficient: f64) -> Self {
        Self { kind, coefficient }
    }

    /// Build a spec from configured strings, naming `parameter` in any failure.
    /// The coefficient of `none` is ignored and may be any number.
    pub fn parse(parameter: &str, kind: &str, coefficient: f64) -> Result<Self> {
        let kind = TransformKind::from_name(kind).ok_or_else(|| {
            Error::config(parameter, format!("unrecognised transform type `{}`", kind))
        })?;
        if kind != TransformKind::None && !coefficient.is_finite() {
            return Err(Error::config(
                parameter,
                format!("coefficient must be finite, got {}", coefficient),
            ));
        }
        Ok(Self { kind, coefficient })
    }

    /// True when the transform reverses the order of its inputs
    pub fn is_decreasing(&self) -> bool {
        match self.kind {
            TransformKind::None => false,
            TransformKind::Linear | TransformKind::LogInverse => self.coefficient < 0.0,
        }
    }
}
