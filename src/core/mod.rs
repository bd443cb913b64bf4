//! Spectral index computation: band selection, the normalized-difference engine
//! and the three-index batch

pub mod band_selector;
pub mod index_engine;
pub mod batch;
pub mod source;

// Re-export main types
pub use band_selector::{BandSelector, BandPairSelection, SelectionMode, FULL_PRODUCT_MIN_BANDS};
pub use index_engine::{
    normalized_difference, normalized_ratio, IndexEngine, IndexResult, PixelCounts,
    SummaryStatistics, ValueHistogram, HISTOGRAM_EDGES,
};
pub use batch::{BatchBands, BatchResult, BatchRunner, Composite, DEFAULT_BATCH_THRESHOLD};
pub use source::{BandSource, MemoryRaster};
