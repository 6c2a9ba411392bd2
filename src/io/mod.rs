//! File formats on either side of the conversion.
//!
//! - [`parquet`] decodes columnar input files in-process.
//! - [`json`] writes and reads the pretty-printed JSON row arrays.

pub mod json;
pub mod parquet;
