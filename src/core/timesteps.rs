//! Band-ordered timestamps for a composite.
//!
//! Dates come from the very file list the composite was built from, in that
//! order, so band `i` and timestamp `i` always describe the same source file.
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use tracing::debug;

use crate::error::{Error, Result};

/// `_AYYYYDDD`, optionally followed by `_unc`, right before the extension
fn date_token() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"_A(\d{7})(?:_unc)?\.[^.]*$").expect("static regex"))
}

/// Convert a `YYYYDDD` token into a calendar date
pub fn parse_year_day(token: &str) -> Option<NaiveDate> {
    if token.len() != 7 || !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year: i32 = token[..4].parse().ok()?;
    let ordinal: u32 = token[4..].parse().ok()?;
    NaiveDate::from_yo_opt(year, ordinal)
}

/// Date encoded by the `_AYYYYDDD` token in the file name of `path`
pub fn date_from_filename(parameter: &str, path: &Path) -> Result<NaiveDate> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    date_token()
        .captures(&name)
        .and_then(|c| c.get(1))
        .and_then(|m| parse_year_day(m.as_str()))
        .ok_or_else(|| Error::DateParse {
            parameter: parameter.to_string(),
            file: name.clone(),
        })
}

/// Timestamps for `files`, positionally matched to the composite's bands.
/// Fails unless the result is strictly increasing.
pub fn extract_timesteps(parameter: &str, files: &[PathBuf]) -> Result<Vec<NaiveDate>> {
    let times = files
        .iter()
        .map(|f| date_from_filename(parameter, f))
        .collect::<Result<Vec<_>>>()?;

    if let Some(pair) = times.windows(2).find(|w| w[0] >= w[1]) {
        return Err(Error::alignment(
            parameter,
            format!(
                "source dates are not strictly increasing in band order ({} then {})",
                pair[0], pair[1]
            ),
        ));
    }
    debug!(
        "Extracted {} timesteps for {} ({:?} .. {:?})",
        times.len(),
        parameter,
        times.first(),
        times.last()
    );
    Ok(times)
}
