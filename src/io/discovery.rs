use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use glob::Pattern;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::types::Variant;

fn glob_paths(pattern: &str) -> Result<Vec<PathBuf>> {
    let paths = glob::glob(pattern).map_err(|e| {
        Error::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("bad glob pattern `{}`: {}", pattern, e),
        ))
    })?;
    let mut out = Vec::new();
    for entry in paths {
        match entry {
            Ok(path) if path.is_file() => out.push(path),
            Ok(_) => {}
            Err(e) => warn!("Skipping unreadable entry: {}", e),
        }
    }
    Ok(out)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Per-date source rasters of `parameter`/`variant`, sorted by file name.
/// The zero-padded `YYYYDDD` token makes this chronological.
pub fn find_sources(
    dir: &Path,
    parameter: &str,
    variant: Variant,
    extension: &str,
) -> Result<Vec<PathBuf>> {
    let pattern = format!(
        "{}/{}*_A???????{}.{}",
        Pattern::escape(&dir.to_string_lossy()),
        Pattern::escape(parameter),
        variant.suffix(),
        Pattern::escape(extension)
    );
    let mut files = glob_paths(&pattern)?;
    files.sort_by_key(|p| file_name(p));
    debug!("{} matched {} files", pattern, files.len());
    Ok(files)
}

/// Parameter names present in `dir`: the prefix before the first `_` of every
/// value source file
pub fn discover_parameters(dir: &Path, extension: &str) -> Result<BTreeSet<String>> {
    if !dir.is_dir() {
        return Err(Error::NotFound(format!("source directory {}", dir.display())));
    }
    let pattern = format!(
        "{}/*_A???????.{}",
        Pattern::escape(&dir.to_string_lossy()),
        Pattern::escape(extension)
    );
    Ok(glob_paths(&pattern)?
        .iter()
        .filter_map(|p| {
            let name = file_name(p);
            name.split('_').next().filter(|s| !s.is_empty()).map(str::to_string)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    fn touch(dir: &Path, names: &[&str]) {
        for n in names {
            File::create(dir.join(n)).unwrap();
        }
    }

    #[test]
    fn splits_value_and_uncertainty_sources() {
        let dir = tempfile::tempdir().unwrap();
        touch(
            dir.path(),
            &[
                "lai_A2017011.tif",
                "lai_A2017001.tif",
                "lai_A2017006.tif",
                "lai_A2017001_unc.tif",
                "cab_A2017001.tif",
                "lai.vrt",
                "lai_A2017001.tif.aux.xml",
            ],
        );

        let values = find_sources(dir.path(), "lai", Variant::Value, "tif").unwrap();
        let names: Vec<String> = values.iter().map(|p| file_name(p)).collect();
        assert_eq!(
            names,
            vec!["lai_A2017001.tif", "lai_A2017006.tif", "lai_A2017011.tif"]
        );

        let unc = find_sources(dir.path(), "lai", Variant::Uncertainty, "tif").unwrap();
        assert_eq!(unc.len(), 1);
        assert!(find_sources(dir.path(), "cab", Variant::Uncertainty, "tif")
            .unwrap()
            .is_empty());
    }

    #[test]
    fn discovers_sorted_unique_parameters() {
        let dir = tempfile::tempdir().unwrap();
        touch(
            dir.path(),
            &[
                "lai_A2017001.tif",
                "lai_A2017006.tif",
                "cw_A2017001.tif",
                "cab_A2017001_unc.tif",
                "notes.txt",
            ],
        );
        let params = discover_parameters(dir.path(), "tif").unwrap();
        assert_eq!(params.into_iter().collect::<Vec<_>>(), vec!["cw", "lai"]);
    }

    #[test]
    fn missing_directory_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            discover_parameters(&dir.path().join("absent"), "tif"),
            Err(Error::NotFound(_))
        ));
    }
}
