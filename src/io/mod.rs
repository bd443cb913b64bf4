//! I/O modules for reading imagery and writing rasters, previews and reports

pub mod geotiff;
pub mod folder;
pub mod preview;
pub mod report;
pub mod export;

pub use geotiff::{GeoTiffReader, GeoTiffWriter, ImageSummary};
pub use folder::scan_folder;
pub use export::{Exporter, OutputNaming};
