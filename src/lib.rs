//! SADAR: Snow, water and vegetation indices from multispectral GeoTIFFs
//!
//! Computes normalized-difference indices (NDSI, NDWI, NDVI) from two bands of
//! a multispectral image, classifies pixels against a threshold and exports
//! georeferenced rasters, colour-mapped previews and text reports.

pub mod types;
pub mod config;
pub mod core;
pub mod io;
pub mod session;

#[cfg(feature = "python")]
mod python;

// Re-export main types and functions for easier access
pub use types::{
    IndexType, SpectralBand, RasterBand, IndexGrid, GeoProfile, GeoTransform,
    SadarError, SadarResult
};

pub use config::{ExportConfig, ProcessingConfig};
pub use crate::core::{BandSelector, BandPairSelection, IndexEngine, IndexResult, BatchRunner, BatchResult, BandSource};
pub use io::{GeoTiffReader, GeoTiffWriter, Exporter, OutputNaming};
pub use session::{Calculation, Session};
