//! Core building blocks: the `Cube` model, timestamp extraction, dataset
//! assembly, value transforms and display statistics. These are in-memory
//! primitives consumed by the high-level `api` module.
pub mod assemble;
pub mod cube;
pub mod params;
pub mod stats;
pub mod timesteps;
pub mod transform;
