use crate::core::band_selector::SelectionMode;
use crate::core::index_engine::{IndexEngine, IndexResult};
use crate::core::source::BandSource;
use crate::types::{IndexCube, IndexType, RasterBand, SadarError, SadarResult, SpectralBand};
use ndarray::Axis;

/// Threshold shared by all three indices in batch mode
pub const DEFAULT_BATCH_THRESHOLD: f64 = 0.4;

/// Bands the three indices draw from, each read once
#[derive(Debug, Clone)]
pub enum BatchBands {
    /// B3, B4, B8 and B11 of a full multispectral product
    Full {
        green: RasterBand,
        red: RasterBand,
        nir: RasterBand,
        swir: RasterBand,
    },
    /// Bands 1 and 2, used as (minuend, subtrahend) by every index
    TwoBand { band1: RasterBand, band2: RasterBand },
}

impl BatchBands {
    /// Read each needed band once.
    ///
    /// Full products give B3, B4, B8 and B11. Smaller images give bands 1
    /// and 2, which every index then uses in that order.
    pub fn read<S: BandSource + ?Sized>(source: &S) -> SadarResult<Self> {
        let band_count = source.band_count();

        match SelectionMode::for_band_count(band_count)? {
            SelectionMode::FullProduct => {
                log::info!("Reading B3, B4, B8, B11 from {}-band image", band_count);
                Ok(BatchBands::Full {
                    green: source.read_band(SpectralBand::Green.product_band())?,
                    red: source.read_band(SpectralBand::Red.product_band())?,
                    nir: source.read_band(SpectralBand::Nir.product_band())?,
                    swir: source.read_band(SpectralBand::Swir.product_band())?,
                })
            }
            SelectionMode::TwoBandFallback => {
                log::info!(
                    "Reading bands 1 and 2 from {}-band image (reused for all indices)",
                    band_count
                );
                Ok(BatchBands::TwoBand {
                    band1: source.read_band(1)?,
                    band2: source.read_band(2)?,
                })
            }
        }
    }

    pub fn mode(&self) -> SelectionMode {
        match self {
            BatchBands::Full { .. } => SelectionMode::FullProduct,
            BatchBands::TwoBand { .. } => SelectionMode::TwoBandFallback,
        }
    }

    /// Minuend and subtrahend for `index_type`
    pub fn pair(&self, index_type: IndexType) -> (&RasterBand, &RasterBand) {
        match self {
            BatchBands::Full { green, red, nir, swir } => {
                let band = |role: SpectralBand| match role {
                    SpectralBand::Green => green,
                    SpectralBand::Red => red,
                    SpectralBand::Nir => nir,
                    SpectralBand::Swir => swir,
                };
                let (first, second) = index_type.band_roles();
                (band(first), band(second))
            }
            BatchBands::TwoBand { band1, band2 } => (band1, band2),
        }
    }
}

/// Three-band stack of the index grids, NDSI, NDWI, NDVI
#[derive(Debug, Clone)]
pub struct Composite {
    pub data: IndexCube,
    pub labels: [&'static str; 3],
}

/// NDSI, NDWI and NDVI from one image
#[derive(Debug, Clone)]
pub struct BatchResult {
    pub ndsi: IndexResult,
    pub ndwi: IndexResult,
    pub ndvi: IndexResult,
    pub mode: SelectionMode,
}

impl BatchResult {
    pub fn get(&self, index_type: IndexType) -> &IndexResult {
        match index_type {
            IndexType::Ndsi => &self.ndsi,
            IndexType::Ndwi => &self.ndwi,
            IndexType::Ndvi => &self.ndvi,
        }
    }

    /// Results in composite band order
    pub fn iter(&self) -> impl Iterator<Item = &IndexResult> {
        IndexType::ALL.into_iter().map(move |t| self.get(t))
    }

    /// Stack the three value grids along a new leading band axis
    pub fn composite(&self) -> SadarResult<Composite> {
        let views: Vec<_> = self.iter().map(|r| r.values().view()).collect();
        let data = ndarray::stack(Axis(0), &views)
            .map_err(|e| SadarError::Processing(format!("Failed to stack composite: {}", e)))?;

        Ok(Composite {
            data,
            labels: IndexType::ALL.map(|t| t.description()),
        })
    }
}

/// Runs all three indices over one image with a single threshold
///
/// The same threshold splits positive/negative classes for every index, even
/// though NDSI, NDWI and NDVI each have their own conventional default
/// (see [`IndexType::default_threshold`]). This is kept as is.
pub struct BatchRunner {
    threshold: f64,
}

impl Default for BatchRunner {
    fn default() -> Self {
        Self::new(DEFAULT_BATCH_THRESHOLD)
    }
}

impl BatchRunner {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Read the needed bands from `source` and compute all three indices.
    /// Any failure is reported as [`SadarError::BatchComputation`].
    pub fn run_all<S: BandSource + ?Sized>(&self, source: &S) -> SadarResult<BatchResult> {
        let bands = BatchBands::read(source).map_err(SadarError::batch)?;
        self.run_bands(&bands)
    }

    /// Compute all three indices from bands already in memory
    pub fn run_bands(&self, bands: &BatchBands) -> SadarResult<BatchResult> {
        log::debug!(
            "Batch threshold {:.2} applied to NDSI, NDWI and NDVI alike",
            self.threshold
        );

        let compute = |index_type: IndexType| {
            let (band1, band2) = bands.pair(index_type);
            IndexEngine::new(index_type).compute(band1, band2, self.threshold)
        };

        #[cfg(feature = "parallel")]
        let (ndsi, (ndwi, ndvi)) = rayon::join(
            || compute(IndexType::Ndsi),
            || rayon::join(|| compute(IndexType::Ndwi), || compute(IndexType::Ndvi)),
        );

        #[cfg(not(feature = "parallel"))]
        let (ndsi, ndwi, ndvi) = (
            compute(IndexType::Ndsi),
            compute(IndexType::Ndwi),
            compute(IndexType::Ndvi),
        );

        Ok(BatchResult {
            ndsi: ndsi.map_err(SadarError::batch)?,
            ndwi: ndwi.map_err(SadarError::batch)?,
            ndvi: ndvi.map_err(SadarError::batch)?,
            mode: bands.mode(),
        })
    }
}
