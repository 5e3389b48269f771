use std::path::{Path, PathBuf};
use std::process::Command;

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::core::params::EngineParams;
use crate::core::timesteps::extract_timesteps;
use crate::error::{Error, Result};
use crate::io::cache::BuildManifest;
use crate::io::discovery::find_sources;
use crate::io::gdal::GdalError;
use crate::types::Variant;

/// Composite artifacts of one parameter/variant
#[derive(Debug, Clone)]
pub struct Mosaic {
    pub variant: Variant,
    /// Source files in band order: band `i + 1` is `sources[i]`
    pub sources: Vec<PathBuf>,
    /// Date of each source, so `times[i]` labels band `i + 1`
    pub times: Vec<NaiveDate>,
    /// `<parameter>[_unc].vrt`, one band per source
    pub composite: PathBuf,
    /// `<parameter>[_unc]_warped.vrt`, the composite on the target grid
    pub warped: PathBuf,
}

/// Paths of the derived artifacts for `parameter`/`variant` in `dir`
pub fn artifact_paths(
    dir: &Path,
    parameter: &str,
    variant: Variant,
) -> (PathBuf, PathBuf, PathBuf) {
    let stem = format!("{}{}", parameter, variant.suffix());
    (
        dir.join(format!("{}.vrt", stem)),
        dir.join(format!("{}_warped.vrt", stem)),
        dir.join(format!("{}.sources.json", stem)),
    )
}

fn run_tool(tool: &'static str, args: &[String]) -> Result<()> {
    debug!("Running {} {}", tool, args.join(" "));
    let output = Command::new(tool)
        .args(args)
        .output()
        .map_err(|e| GdalError::Tool {
            tool,
            detail: format!("could not execute: {}", e),
        })?;
    if !output.status.success() {
        return Err(GdalError::Tool {
            tool,
            detail: format!(
                "{} ({})",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        }
        .into());
    }
    Ok(())
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Stack `sources` as separate bands of a VRT, in the given order
fn build_composite(sources: &[PathBuf], composite: &Path) -> Result<()> {
    let mut args: Vec<String> = vec!["-q".into(), "-overwrite".into(), "-separate".into()];
    args.push(path_arg(composite));
    args.extend(sources.iter().map(|p| path_arg(p)));
    run_tool("gdalbuildvrt", &args)
}

/// Reproject `composite` into a VRT on `params.target_srs`
fn build_warped(composite: &Path, warped: &Path, params: &EngineParams) -> Result<()> {
    let args: Vec<String> = vec![
        "-q".into(),
        "-overwrite".into(),
        "-of".into(),
        "VRT".into(),
        "-r".into(),
        params.resample_alg.clone(),
        "-t_srs".into(),
        params.target_srs.clone(),
        path_arg(composite),
        path_arg(warped),
    ];
    run_tool("gdalwarp", &args)
}

/// Locate the sources of `parameter`/`variant` and make sure both composites
/// are built for them.
///
/// Returns `Ok(None)` when there are no uncertainty sources and `NoData` when
/// there are no value sources. Source dates are checked before any GDAL
/// utility runs, so an undated file never leaves a composite behind.
pub fn build_mosaic(
    dir: &Path,
    parameter: &str,
    variant: Variant,
    params: &EngineParams,
) -> Result<Option<Mosaic>> {
    let sources = find_sources(dir, parameter, variant, &params.raster_extension)?;
    if sources.is_empty() {
        return match variant {
            Variant::Uncertainty => Ok(None),
            Variant::Value => Err(Error::NoData {
                parameter: parameter.to_string(),
                variant: "value",
                dir: dir.to_path_buf(),
            }),
        };
    }
    let times = extract_timesteps(parameter, &sources)?;

    let (composite, warped, manifest_path) = artifact_paths(dir, parameter, variant);
    let artifacts_exist = composite.is_file() && warped.is_file();
    let manifest = BuildManifest::compute(&sources, &params.target_srs, &params.resample_alg)?;

    let reusable = artifacts_exist
        && (params.reuse_stale_composites
            || manifest.matches(BuildManifest::load(&manifest_path).as_ref()));

    if reusable {
        info!(
            "Reusing {} composite for {} ({} sources)",
            variant,
            parameter,
            sources.len()
        );
    } else {
        info!(
            "Building {} composite for {} from {} sources",
            variant,
            parameter,
            sources.len()
        );
        build_composite(&sources, &composite)?;
        build_warped(&composite, &warped, params)?;
        manifest.store(&manifest_path)?;
    }

    Ok(Some(Mosaic {
        variant,
        sources,
        times,
        composite,
        warped,
    }))
}
