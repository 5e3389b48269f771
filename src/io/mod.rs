//! I/O layer: source file discovery, composite (VRT) building and
//! reprojection through the GDAL utilities, the build manifest that guards
//! reuse of persisted composites, and the GDAL-backed composite reader.
pub mod cache;
pub mod discovery;
pub mod mosaic;

pub mod gdal;
pub use gdal::{GdalError, RasterMetadata, RasterReader};
