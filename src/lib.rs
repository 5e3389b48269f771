#![doc = r#"
rastercube — time-indexed value/uncertainty cubes from per-date rasters.

This crate loads per-date, single-band rasters of retrieved geophysical
parameters (plus optional per-date uncertainty rasters), stacks them into
multi-band composites, reprojects them onto a common geographic grid, and keeps
each parameter in memory as an immutable `{min, mean, max}` cube over
`(time, latitude, longitude)` in physical units. A read-only `Engine` answers
the queries a dashboard needs: timestep slices, pixel timeseries, area
aggregates and colour-scale statistics.

Requirements
------------
- GDAL development headers and runtime available on your system.
- The `gdalbuildvrt` and `gdalwarp` utilities on `PATH` (composites are built
  with them and persisted next to the sources).

Source layout
-------------
```text
data/
  lai_A2017156.tif        value, 2017 day 156
  lai_A2017156_unc.tif    optional uncertainty for the same date
  lai_A2017161.tif
  ...
```
Derived artifacts `lai.vrt`, `lai_warped.vrt` and `lai.sources.json` (and their
`_unc` counterparts) are written into the same directory and rebuilt whenever
the recorded source list changes.

Quick start
-----------
```rust,no_run
use std::path::Path;
use rastercube::{Engine, EngineParams};

fn main() -> rastercube::Result<()> {
    rastercube::logging::init(false);

    let params = EngineParams::default()
        .with_transform("lai", "log-inverse", -2.0)
        .with_transform("cab", "linear", -100.0);
    let engine = Engine::open(Path::new("/data/multiply"), params)?;

    for failure in engine.load_failures() {
        eprintln!("{} not loaded: {}", failure.parameter, failure.error);
    }

    let times = engine.get_timesteps("lai")?;
    let slice = engine.get_timestep("lai", times[0])?;
    let series = engine.get_timeseries("lai", 39.06, -2.1)?;
    let area = engine.get_area_aggregate("lai", (39.0, 39.1), (-2.2, -2.0))?;
    let (cmin, cmax) = engine.get_vis_stats("lai")?.core_colorscale();

    println!("{} cells, {} points, {} area steps, colour {cmin}..{cmax}",
        slice.cells.len(), series.points.len(), area.times.len());
    Ok(())
}
```

Error handling
--------------
All fallible functions return `rastercube::Result<T>`; match on
`rastercube::Error` to distinguish missing data, unparseable dates, misaligned
composites, transform configuration problems and unknown query targets.

Useful modules
--------------
- [`api`] — `Engine`, the load pipeline and query types.
- [`core`] — cube model, assembly, transforms and statistics.
- [`io`] — source discovery, composite building and the GDAL reader.
- [`error`] — crate-level `Error` and `Result`.
"#]

pub mod api;
pub mod core;
pub mod error;
pub mod io;
pub mod logging;
pub mod types;

// Types
pub use crate::core::cube::{Band, Composite, Cube, Grid};
pub use crate::core::params::{EngineParams, TransformEntry};
pub use crate::core::stats::{Summary, VisStats};
pub use error::{Error, Result};
pub use types::{TransformKind, TransformSpec, Variant};

// Readers
pub use io::gdal::{GdalError, RasterMetadata, RasterReader};

// High-level API
pub use api::{
    AreaAggregate, CellValues, Engine, LoadFailure, ParameterData, Query, QueryResponse,
    Timeseries, TimeseriesPoint, TimestepSlice, load_parameter,
};
