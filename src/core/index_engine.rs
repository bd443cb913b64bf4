use crate::core::band_selector::{BandPairSelection, BandSelector};
use crate::core::source::BandSource;
use crate::types::{ClassLabels, IndexGrid, IndexType, RasterBand, SadarError, SadarResult};
use ndarray::Zip;
use serde::{Deserialize, Serialize};

/// Boundaries of the four distribution buckets; the last bucket is closed at 1.0
pub const HISTOGRAM_EDGES: [f64; 5] = [-1.0, -0.5, 0.0, 0.5, 1.0];

/// Min, max, mean and population standard deviation over valid cells.
/// All fields are NaN when there is no valid cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SummaryStatistics {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std: f64,
}

impl SummaryStatistics {
    /// Statistics over the finite cells of `values`, NaN cells skipped
    pub fn from_values(values: &IndexGrid) -> Self {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0f64;
        let mut count = 0usize;

        for &v in values.iter().filter(|v| !v.is_nan()) {
            min = min.min(v);
            max = max.max(v);
            sum += v;
            count += 1;
        }

        if count == 0 {
            return Self {
                min: f64::NAN,
                max: f64::NAN,
                mean: f64::NAN,
                std: f64::NAN,
            };
        }

        let mean = sum / count as f64;
        let variance = values
            .iter()
            .filter(|v| !v.is_nan())
            .map(|&v| (v - mean).powi(2))
            .sum::<f64>()
            / count as f64;

        Self {
            min,
            max,
            mean,
            std: variance.sqrt(),
        }
    }
}

/// Pixel tallies of one index computation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelCounts {
    pub total: usize,
    pub valid: usize,
    pub nodata: usize,
    /// Valid cells with value >= threshold
    pub positive: usize,
    /// Valid cells with value < threshold
    pub negative: usize,
}

impl PixelCounts {
    fn percentage_of_total(&self, count: usize) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            count as f64 / self.total as f64 * 100.0
        }
    }

    pub fn positive_percentage(&self) -> f64 {
        self.percentage_of_total(self.positive)
    }

    pub fn negative_percentage(&self) -> f64 {
        self.percentage_of_total(self.negative)
    }

    pub fn nodata_percentage(&self) -> f64 {
        self.percentage_of_total(self.nodata)
    }
}

/// Counts of valid cells in [-1,-0.5), [-0.5,0), [0,0.5) and [0.5,1]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ValueHistogram {
    pub buckets: [usize; 4],
}

impl ValueHistogram {
    fn bucket_of(value: f64) -> Option<usize> {
        if value < HISTOGRAM_EDGES[0] || value > HISTOGRAM_EDGES[4] {
            None
        } else if value < HISTOGRAM_EDGES[1] {
            Some(0)
        } else if value < HISTOGRAM_EDGES[2] {
            Some(1)
        } else if value < HISTOGRAM_EDGES[3] {
            Some(2)
        } else {
            Some(3)
        }
    }

    pub fn total(&self) -> usize {
        self.buckets.iter().sum()
    }

    /// Human-readable bucket ranges, in bucket order
    pub fn labels() -> [&'static str; 4] {
        ["[-1.0, -0.5)", "[-0.5, 0.0)", "[0.0, 0.5)", "[0.5, 1.0]"]
    }
}

/// Outcome of one index computation. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexResult {
    index_type: IndexType,
    threshold: f64,
    values: IndexGrid,
    statistics: SummaryStatistics,
    pixel_counts: PixelCounts,
    histogram: ValueHistogram,
    class_labels: ClassLabels,
}

impl IndexResult {
    pub fn index_type(&self) -> IndexType {
        self.index_type
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn values(&self) -> &IndexGrid {
        &self.values
    }

    pub fn statistics(&self) -> &SummaryStatistics {
        &self.statistics
    }

    pub fn pixel_counts(&self) -> &PixelCounts {
        &self.pixel_counts
    }

    pub fn histogram(&self) -> &ValueHistogram {
        &self.histogram
    }

    pub fn class_labels(&self) -> &ClassLabels {
        &self.class_labels
    }

    /// Grid shape as (rows, cols)
    pub fn dim(&self) -> (usize, usize) {
        self.values.dim()
    }
}

/// Normalized difference of one cell.
///
/// A zero denominator yields NaN whatever the numerator, and so does an
/// undefined ratio such as inf/inf or a NaN sum of opposite infinities.
/// Everything else, an overflowed numerator included, is clipped to [-1, 1].
#[inline]
pub fn normalized_ratio(a: f64, b: f64) -> f64 {
    let denom = a + b;
    if denom == 0.0 {
        return f64::NAN;
    }
    ((a - b) / denom).clamp(-1.0, 1.0)
}

/// Element-wise `(band1 - band2) / (band1 + band2)` with no-data and clipping rules
pub fn normalized_difference(band1: &RasterBand, band2: &RasterBand) -> SadarResult<IndexGrid> {
    if band1.dim() != band2.dim() {
        return Err(SadarError::ShapeMismatch {
            first: band1.dim(),
            second: band2.dim(),
        });
    }

    #[cfg(feature = "parallel")]
    let values = Zip::from(band1)
        .and(band2)
        .par_map_collect(|&a, &b| normalized_ratio(a, b));

    #[cfg(not(feature = "parallel"))]
    let values = Zip::from(band1)
        .and(band2)
        .map_collect(|&a, &b| normalized_ratio(a, b));

    Ok(values)
}

/// Normalized-difference engine for one index type
pub struct IndexEngine {
    index_type: IndexType,
}

impl IndexEngine {
    pub fn new(index_type: IndexType) -> Self {
        Self { index_type }
    }

    pub fn index_type(&self) -> IndexType {
        self.index_type
    }

    /// Compute the index from two equal-shape bands and classify against `threshold`
    ///
    /// # Arguments
    /// * `band1` - Minuend band (Green for NDSI/NDWI, NIR for NDVI)
    /// * `band2` - Subtrahend band (SWIR, NIR or Red)
    /// * `threshold` - Cells with value >= threshold count as the positive class
    pub fn compute(
        &self,
        band1: &RasterBand,
        band2: &RasterBand,
        threshold: f64,
    ) -> SadarResult<IndexResult> {
        let (rows, cols) = band1.dim();
        log::debug!(
            "Computing {} on {}x{} bands, threshold {:.2}",
            self.index_type,
            rows,
            cols,
            threshold
        );

        let values = normalized_difference(band1, band2)?;

        let total = values.len();
        let mut valid = 0usize;
        let mut positive = 0usize;
        let mut histogram = ValueHistogram::default();

        for &v in values.iter().filter(|v| !v.is_nan()) {
            valid += 1;
            if v >= threshold {
                positive += 1;
            }
            if let Some(bucket) = ValueHistogram::bucket_of(v) {
                histogram.buckets[bucket] += 1;
            }
        }

        let pixel_counts = PixelCounts {
            total,
            valid,
            nodata: total - valid,
            positive,
            negative: valid - positive,
        };
        let statistics = SummaryStatistics::from_values(&values);

        log::info!(
            "{}: {} valid / {} pixels, mean {:.4}, {} {:.1}%",
            self.index_type,
            valid,
            total,
            statistics.mean,
            self.index_type.class_labels().positive,
            pixel_counts.positive_percentage()
        );

        Ok(IndexResult {
            index_type: self.index_type,
            threshold,
            values,
            statistics,
            pixel_counts,
            histogram,
            class_labels: self.index_type.class_labels(),
        })
    }

    /// Select, read and compute the band pair of this index from `source`
    pub fn compute_from_source<S: BandSource + ?Sized>(
        &self,
        source: &S,
        threshold: f64,
    ) -> SadarResult<(BandPairSelection, IndexResult)> {
        let selection = BandSelector::select(self.index_type, source.band_count())?;
        let band1 = source.read_band(selection.band_index1)?;
        let band2 = source.read_band(selection.band_index2)?;
        let result = self.compute(&band1, &band2, threshold)?;
        Ok((selection, result))
    }
}
